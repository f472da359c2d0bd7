//! Messaging operations
//!
//! `MessagingService` validates input, enforces participant rules and bounds
//! every store call with a timeout. It is transport-agnostic; the HTTP
//! handlers and the unread poller both call into it.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::entities::{
    purchase_conversation_id, Conversation, ConversationSummary, Message, MessageStatus,
    NewMessage,
};
use crate::domain::validation::{
    require_conversation_id, require_id, require_text, MAX_BODY_LENGTH, MAX_TITLE_LENGTH,
};
use crate::repository::{ConversationInsert, MessagingStore};
use unimarket_common::{with_timeout, Error, Result};

/// Default upper bound on a single store call
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Input for `ensure_conversation`
#[derive(Debug, Clone, Default)]
pub struct EnsureConversation {
    pub conversation_id: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub book_title: Option<String>,
    pub book_price: Option<Decimal>,
    pub seed_message: Option<String>,
}

/// Input for `start_purchase_inquiry`
#[derive(Debug, Clone, Default)]
pub struct PurchaseInquiry {
    pub buyer_id: String,
    pub seller_id: String,
    pub book_title: String,
    pub book_price: Option<Decimal>,
    pub message: String,
}

/// Input for `reply`: the receiver is whoever else is in the conversation
#[derive(Debug, Clone, Default)]
pub struct Reply {
    pub conversation_id: String,
    pub sender_id: String,
    pub sender_name: Option<String>,
    pub receiver_name: Option<String>,
    pub body: String,
    pub kind: Option<String>,
    pub book_title: Option<String>,
    pub book_price: Option<Decimal>,
}

/// A conversation together with its ordered messages
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationThread {
    pub conversation: Conversation,
    pub messages: Vec<Message>,
    /// True when this call created the conversation
    pub created: bool,
}

#[derive(Clone)]
pub struct MessagingService {
    store: Arc<dyn MessagingStore>,
    timeout: Duration,
}

impl MessagingService {
    pub fn new(store: Arc<dyn MessagingStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Find or create a conversation under a caller-supplied id.
    ///
    /// Safe to repeat: only the call that creates the conversation writes the
    /// seed message. An existing conversation with other participants is a
    /// conflict and is never overwritten.
    pub async fn ensure_conversation(&self, input: EnsureConversation) -> Result<ConversationThread> {
        let mut conversation = Conversation::new(
            input.conversation_id,
            input.buyer_id,
            input.seller_id,
            input.book_title,
            input.book_price,
        )?;

        let seed = match input.seed_message {
            Some(body) => {
                let message = Message::purchase_inquiry(&conversation, body)?;
                conversation.record_message_at(message.created_at);
                Some(message)
            }
            None => None,
        };

        let inserted = with_timeout(
            self.timeout,
            self.store
                .insert_conversation_if_absent(&conversation, seed.as_ref()),
        )
        .await?;

        match inserted {
            ConversationInsert::Created { conversation, seed } => {
                tracing::info!(
                    conversation_id = %conversation.id,
                    buyer_id = %conversation.buyer_id,
                    seller_id = %conversation.seller_id,
                    seeded = seed.is_some(),
                    "Conversation created"
                );
                Ok(ConversationThread {
                    conversation,
                    messages: seed.into_iter().collect(),
                    created: true,
                })
            }
            ConversationInsert::Existing(existing) => {
                if !existing.has_participants(&conversation.buyer_id, &conversation.seller_id) {
                    tracing::warn!(
                        conversation_id = %existing.id,
                        "Conversation id reused with different participants"
                    );
                    return Err(Error::Conflict(format!(
                        "Conversation {} already exists with different participants",
                        existing.id
                    )));
                }

                let messages =
                    with_timeout(self.timeout, self.store.list_messages(&existing.id)).await?;
                Ok(ConversationThread {
                    conversation: existing,
                    messages,
                    created: false,
                })
            }
        }
    }

    /// Open (or reopen) the conversation for a buyer's inquiry about a book
    pub async fn start_purchase_inquiry(&self, input: PurchaseInquiry) -> Result<ConversationThread> {
        require_id("buyer_id", &input.buyer_id)?;
        require_id("seller_id", &input.seller_id)?;
        require_text("book_title", &input.book_title, MAX_TITLE_LENGTH)?;

        let conversation_id =
            purchase_conversation_id(&input.buyer_id, &input.seller_id, &input.book_title);

        self.ensure_conversation(EnsureConversation {
            conversation_id,
            buyer_id: input.buyer_id,
            seller_id: input.seller_id,
            book_title: Some(input.book_title),
            book_price: input.book_price,
            seed_message: Some(input.message),
        })
        .await
    }

    /// Append a message to an existing conversation
    pub async fn send_message(&self, draft: NewMessage) -> Result<Message> {
        let message = Message::new(draft)?;

        let conversation = self.require_conversation(&message.conversation_id).await?;
        if !conversation.connects(&message.sender_id, &message.receiver_id) {
            return Err(Error::Validation(
                "sender_id and receiver_id must be the participants of the conversation"
                    .to_string(),
            ));
        }

        self.append(message).await
    }

    /// Send from one participant to the other, resolving the receiver from
    /// the conversation. Non-participants get `NotFound`.
    pub async fn reply(&self, input: Reply) -> Result<Message> {
        require_id("sender_id", &input.sender_id)?;
        require_text("body", &input.body, MAX_BODY_LENGTH)?;

        let conversation = self.require_conversation(&input.conversation_id).await?;
        let receiver_id = conversation
            .other_participant(&input.sender_id)
            .ok_or_else(|| conversation_not_found(&conversation.id))?
            .to_string();

        let message = Message::new(NewMessage {
            conversation_id: input.conversation_id,
            sender_id: input.sender_id,
            sender_name: input.sender_name,
            receiver_id,
            receiver_name: input.receiver_name,
            body: input.body,
            kind: input.kind,
            book_title: input.book_title,
            book_price: input.book_price,
        })?;

        self.append(message).await
    }

    /// Move a message from `sent` to `delivered`; a no-op for messages that
    /// are already further along. Returns the status after the call.
    pub async fn mark_delivered(&self, message_id: Uuid) -> Result<MessageStatus> {
        with_timeout(self.timeout, self.store.mark_delivered(message_id))
            .await?
            .ok_or_else(|| Error::NotFound(format!("Message {} not found", message_id)))
    }

    /// Mark every message addressed to `reader_id` in the conversation as
    /// read. Returns how many messages changed; non-participants get
    /// `NotFound`.
    pub async fn mark_conversation_read(&self, conversation_id: &str, reader_id: &str) -> Result<u64> {
        require_id("reader_id", reader_id)?;

        let conversation = self.require_conversation(conversation_id).await?;
        if !conversation.is_participant(reader_id) {
            return Err(conversation_not_found(conversation_id));
        }

        let changed = with_timeout(
            self.timeout,
            self.store.mark_conversation_read(conversation_id, reader_id),
        )
        .await?;

        if changed > 0 {
            tracing::debug!(conversation_id, reader_id, changed, "Messages marked read");
        }
        Ok(changed)
    }

    pub async fn count_unread_for_user(&self, user_id: &str) -> Result<i64> {
        require_id("user_id", user_id)?;
        Ok(with_timeout(self.timeout, self.store.count_unread(user_id)).await?)
    }

    /// Summaries of every conversation the user takes part in, most recently
    /// active first
    pub async fn list_conversations_for_user(&self, user_id: &str) -> Result<Vec<ConversationSummary>> {
        require_id("user_id", user_id)?;

        let overviews = with_timeout(
            self.timeout,
            self.store.list_conversation_overviews(user_id),
        )
        .await?;

        Ok(overviews
            .into_iter()
            .filter_map(|overview| ConversationSummary::for_viewer(overview, user_id))
            .collect())
    }

    /// Ordered messages of a conversation, visible to its participants only
    pub async fn list_messages(&self, conversation_id: &str, viewer_id: &str) -> Result<Vec<Message>> {
        require_id("viewer_id", viewer_id)?;

        let conversation = self.require_conversation(conversation_id).await?;
        if !conversation.is_participant(viewer_id) {
            return Err(conversation_not_found(conversation_id));
        }

        Ok(with_timeout(self.timeout, self.store.list_messages(conversation_id)).await?)
    }

    /// Mark the reader's incoming messages read, then return the thread
    pub async fn open_conversation(&self, conversation_id: &str, reader_id: &str) -> Result<Vec<Message>> {
        require_id("reader_id", reader_id)?;

        let conversation = self.require_conversation(conversation_id).await?;
        if !conversation.is_participant(reader_id) {
            return Err(conversation_not_found(conversation_id));
        }

        with_timeout(
            self.timeout,
            self.store.mark_conversation_read(conversation_id, reader_id),
        )
        .await?;

        Ok(with_timeout(self.timeout, self.store.list_messages(conversation_id)).await?)
    }

    pub async fn find_conversation(&self, conversation_id: &str) -> Result<Option<Conversation>> {
        Ok(with_timeout(self.timeout, self.store.find_conversation(conversation_id)).await?)
    }

    pub async fn find_message(&self, message_id: Uuid) -> Result<Option<Message>> {
        Ok(with_timeout(self.timeout, self.store.find_message(message_id)).await?)
    }

    async fn append(&self, message: Message) -> Result<Message> {
        let message = with_timeout(self.timeout, self.store.append_message(&message))
            .await
            .map_err(|e| match Error::from(e) {
                // Conversation vanished between the check and the insert
                Error::NotFound(_) => conversation_not_found(&message.conversation_id),
                other => other,
            })?;

        tracing::debug!(
            message_id = %message.id,
            conversation_id = %message.conversation_id,
            kind = %message.kind,
            "Message sent"
        );
        Ok(message)
    }

    async fn require_conversation(&self, conversation_id: &str) -> Result<Conversation> {
        require_conversation_id(conversation_id)?;
        self.find_conversation(conversation_id)
            .await?
            .ok_or_else(|| conversation_not_found(conversation_id))
    }
}

fn conversation_not_found(conversation_id: &str) -> Error {
    Error::NotFound(format!("Conversation {} not found", conversation_id))
}
