//! Domain entities for the Messaging domain
//!
//! Conversations connect exactly one buyer and one seller, optionally anchored
//! to a marketplace book. Messages are directed from one participant to the
//! other and carry a delivery status.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use unimarket_common::{Error, Result};

use super::validation::{
    check_optional_text, check_price, require_conversation_id, require_id, require_text,
    MAX_BODY_LENGTH, MAX_KIND_LENGTH, MAX_NAME_LENGTH, MAX_TITLE_LENGTH,
};

/// Kind tag used when the sender does not classify a message
pub const DEFAULT_MESSAGE_KIND: &str = "text";

/// Kind tag of the opening message of a purchase conversation
pub const PURCHASE_INQUIRY_KIND: &str = "purchase_inquiry";

/// Display names used when the sender omits them
pub const DEFAULT_SENDER_NAME: &str = "User";
pub const DEFAULT_RECEIVER_NAME: &str = "Unknown recipient";

/// Display names stamped on a seed message
pub const BUYER_DISPLAY_NAME: &str = "Buyer";
pub const SELLER_DISPLAY_NAME: &str = "Seller";

/// Shown in a conversation summary before any message exists
pub const NO_MESSAGES_PLACEHOLDER: &str = "No messages yet";

/// Message delivery status
///
/// Variants are declared in delivery order so `Ord` follows progress.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
    Default,
)]
#[sqlx(type_name = "message_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    #[default]
    Sent,
    Delivered,
    Read,
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageStatus::Sent => write!(f, "sent"),
            MessageStatus::Delivered => write!(f, "delivered"),
            MessageStatus::Read => write!(f, "read"),
        }
    }
}

/// Role a user plays in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    Buyer,
    Seller,
}

impl ParticipantRole {
    /// Label shown for the other side of the conversation.
    ///
    /// Counterpart names are not resolved here; the buyer sees "seller" and
    /// the seller sees "buyer".
    pub fn counterpart_label(&self) -> &'static str {
        match self {
            ParticipantRole::Buyer => "seller",
            ParticipantRole::Seller => "buyer",
        }
    }
}

/// Conversation entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Conversation {
    pub id: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub book_title: Option<String>,
    pub book_price: Option<Decimal>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new conversation under a caller-supplied identifier
    pub fn new(
        id: String,
        buyer_id: String,
        seller_id: String,
        book_title: Option<String>,
        book_price: Option<Decimal>,
    ) -> Result<Self> {
        require_conversation_id(&id)?;
        require_id("buyer_id", &buyer_id)?;
        require_id("seller_id", &seller_id)?;

        if buyer_id == seller_id {
            return Err(Error::Validation(
                "buyer_id and seller_id must be different users".to_string(),
            ));
        }

        check_optional_text("book_title", book_title.as_deref(), MAX_TITLE_LENGTH)?;
        check_price(book_price)?;

        Ok(Conversation {
            id,
            buyer_id,
            seller_id,
            book_title,
            book_price,
            last_message_at: None,
            created_at: Utc::now(),
        })
    }

    /// Role of `user_id` in this conversation, if any
    pub fn role_of(&self, user_id: &str) -> Option<ParticipantRole> {
        if self.buyer_id == user_id {
            Some(ParticipantRole::Buyer)
        } else if self.seller_id == user_id {
            Some(ParticipantRole::Seller)
        } else {
            None
        }
    }

    pub fn is_participant(&self, user_id: &str) -> bool {
        self.role_of(user_id).is_some()
    }

    /// The participant on the other side from `user_id`
    pub fn other_participant(&self, user_id: &str) -> Option<&str> {
        match self.role_of(user_id)? {
            ParticipantRole::Buyer => Some(&self.seller_id),
            ParticipantRole::Seller => Some(&self.buyer_id),
        }
    }

    /// True when the stored roles are exactly `buyer_id` / `seller_id`
    pub fn has_participants(&self, buyer_id: &str, seller_id: &str) -> bool {
        self.buyer_id == buyer_id && self.seller_id == seller_id
    }

    /// True when `a` and `b` are the two participants, in either direction
    pub fn connects(&self, a: &str, b: &str) -> bool {
        self.has_participants(a, b) || self.has_participants(b, a)
    }

    /// Advance `last_message_at`, never moving it backwards
    pub fn record_message_at(&mut self, at: DateTime<Utc>) {
        self.last_message_at = Some(match self.last_message_at {
            Some(current) if current > at => current,
            _ => at,
        });
    }
}

/// Input for a new message, before defaults and validation are applied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewMessage {
    pub conversation_id: String,
    pub sender_id: String,
    pub sender_name: Option<String>,
    pub receiver_id: String,
    pub receiver_name: Option<String>,
    pub body: String,
    pub kind: Option<String>,
    pub book_title: Option<String>,
    pub book_price: Option<Decimal>,
}

/// Message entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub receiver_id: String,
    pub receiver_name: String,
    pub body: String,
    pub kind: String,
    pub book_title: Option<String>,
    pub book_price: Option<Decimal>,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a new message in the `sent` state
    pub fn new(draft: NewMessage) -> Result<Self> {
        require_conversation_id(&draft.conversation_id)?;
        require_id("sender_id", &draft.sender_id)?;
        require_id("receiver_id", &draft.receiver_id)?;

        if draft.sender_id == draft.receiver_id {
            return Err(Error::Validation(
                "sender_id and receiver_id must be different users".to_string(),
            ));
        }

        Self::validate_body(&draft.body)?;

        let sender_name = non_blank_or(draft.sender_name, DEFAULT_SENDER_NAME);
        let receiver_name = non_blank_or(draft.receiver_name, DEFAULT_RECEIVER_NAME);
        let kind = non_blank_or(draft.kind, DEFAULT_MESSAGE_KIND);

        check_optional_text("sender_name", Some(&sender_name), MAX_NAME_LENGTH)?;
        check_optional_text("receiver_name", Some(&receiver_name), MAX_NAME_LENGTH)?;
        check_optional_text("kind", Some(&kind), MAX_KIND_LENGTH)?;
        check_optional_text("book_title", draft.book_title.as_deref(), MAX_TITLE_LENGTH)?;
        check_price(draft.book_price)?;

        Ok(Message {
            id: Uuid::new_v4(),
            conversation_id: draft.conversation_id,
            sender_id: draft.sender_id,
            sender_name,
            receiver_id: draft.receiver_id,
            receiver_name,
            body: draft.body,
            kind,
            book_title: draft.book_title,
            book_price: draft.book_price,
            status: MessageStatus::Sent,
            created_at: Utc::now(),
        })
    }

    /// Opening message of a purchase conversation: buyer to seller, with the
    /// book snapshot copied from the conversation
    pub fn purchase_inquiry(conversation: &Conversation, body: String) -> Result<Self> {
        Self::new(NewMessage {
            conversation_id: conversation.id.clone(),
            sender_id: conversation.buyer_id.clone(),
            sender_name: Some(BUYER_DISPLAY_NAME.to_string()),
            receiver_id: conversation.seller_id.clone(),
            receiver_name: Some(SELLER_DISPLAY_NAME.to_string()),
            body,
            kind: Some(PURCHASE_INQUIRY_KIND.to_string()),
            book_title: conversation.book_title.clone(),
            book_price: conversation.book_price,
        })
    }

    /// True when this message still counts as unread for `user_id`
    pub fn is_unread_for(&self, user_id: &str) -> bool {
        self.receiver_id == user_id && self.status != MessageStatus::Read
    }

    /// Validate message body (CHECK (length(trim(body)) > 0))
    fn validate_body(body: &str) -> Result<()> {
        require_text("body", body, MAX_BODY_LENGTH)
    }
}

fn non_blank_or(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => default.to_string(),
    }
}

/// Derive the identifier of a purchase conversation.
///
/// One conversation exists per buyer, seller and book; whitespace runs in the
/// title collapse to a single underscore.
pub fn purchase_conversation_id(buyer_id: &str, seller_id: &str, book_title: &str) -> String {
    let title = book_title.split_whitespace().collect::<Vec<_>>().join("_");
    format!("{}_{}_{}", buyer_id, seller_id, title)
}

/// Store-level read model: a conversation with its latest body and the
/// viewer's unread count
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ConversationOverview {
    #[sqlx(flatten)]
    pub conversation: Conversation,
    pub last_message: Option<String>,
    pub unread_count: i64,
}

/// A conversation as listed for one of its participants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub role: ParticipantRole,
    pub other_participant_id: String,
    pub other_participant_label: String,
    pub book_title: Option<String>,
    pub book_price: Option<Decimal>,
    pub last_message: String,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread_count: i64,
}

impl ConversationSummary {
    /// Build the summary seen by `viewer_id`; `None` when the viewer is not
    /// a participant
    pub fn for_viewer(overview: ConversationOverview, viewer_id: &str) -> Option<Self> {
        let ConversationOverview {
            conversation,
            last_message,
            unread_count,
        } = overview;

        let role = conversation.role_of(viewer_id)?;
        let other_participant_id = conversation.other_participant(viewer_id)?.to_string();

        Some(ConversationSummary {
            conversation_id: conversation.id,
            role,
            other_participant_id,
            other_participant_label: role.counterpart_label().to_string(),
            book_title: conversation.book_title,
            book_price: conversation.book_price,
            last_message: last_message.unwrap_or_else(|| NO_MESSAGES_PLACEHOLDER.to_string()),
            last_message_at: conversation.last_message_at,
            unread_count,
        })
    }
}
