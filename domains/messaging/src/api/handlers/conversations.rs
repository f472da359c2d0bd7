//! Conversation API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use unimarket_auth::AuthUser;
use unimarket_common::{Error, Result, ValidatedJson};
use validator::Validate;

use super::messages::MessageResponse;
use crate::api::middleware::MessagingState;
use crate::domain::entities::{Conversation, ConversationSummary};
use crate::service::{ConversationThread, EnsureConversation, PurchaseInquiry};

/// Request for finding or creating a conversation
#[derive(Debug, Deserialize, Validate)]
pub struct EnsureConversationRequest {
    /// Caller-supplied identifier; retries reuse it
    #[validate(length(min = 1, max = 602))]
    pub conversation_id: String,

    #[validate(length(min = 1, max = 200))]
    pub buyer_id: String,

    #[validate(length(min = 1, max = 200))]
    pub seller_id: String,

    #[validate(length(max = 200))]
    pub book_title: Option<String>,

    pub book_price: Option<Decimal>,

    /// Opening message, written only when the conversation is created
    #[validate(length(max = 5000))]
    pub seed_message: Option<String>,
}

/// Request for opening a purchase conversation about a book
#[derive(Debug, Deserialize, Validate)]
pub struct PurchaseInquiryRequest {
    #[validate(length(min = 1, max = 200))]
    pub seller_id: String,

    #[validate(length(min = 1, max = 200))]
    pub book_title: String,

    pub book_price: Option<Decimal>,

    #[validate(length(min = 1, max = 5000))]
    pub message: String,
}

/// Conversation response DTO
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub id: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub book_title: Option<String>,
    pub book_price: Option<Decimal>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Conversation> for ConversationResponse {
    fn from(c: Conversation) -> Self {
        Self {
            id: c.id,
            buyer_id: c.buyer_id,
            seller_id: c.seller_id,
            book_title: c.book_title,
            book_price: c.book_price,
            last_message_at: c.last_message_at,
            created_at: c.created_at,
        }
    }
}

/// A conversation with its ordered messages
#[derive(Debug, Serialize)]
pub struct ThreadResponse {
    pub conversation: ConversationResponse,
    pub messages: Vec<MessageResponse>,
}

impl From<ConversationThread> for ThreadResponse {
    fn from(thread: ConversationThread) -> Self {
        Self {
            conversation: thread.conversation.into(),
            messages: thread.messages.into_iter().map(Into::into).collect(),
        }
    }
}

/// Result of marking a conversation read
#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub conversation_id: String,
    pub marked_read: u64,
}

fn thread_status(thread: &ConversationThread) -> StatusCode {
    if thread.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    }
}

/// Find or create a conversation (201 when created, 200 when it existed)
pub async fn ensure_conversation(
    AuthUser(ctx): AuthUser,
    State(state): State<MessagingState>,
    ValidatedJson(req): ValidatedJson<EnsureConversationRequest>,
) -> Result<(StatusCode, Json<ThreadResponse>)> {
    if !ctx.is(&req.buyer_id) && !ctx.is(&req.seller_id) {
        return Err(Error::Authorization(
            "Caller must be the buyer or the seller of the conversation".to_string(),
        ));
    }

    let thread = state
        .service
        .ensure_conversation(EnsureConversation {
            conversation_id: req.conversation_id,
            buyer_id: req.buyer_id,
            seller_id: req.seller_id,
            book_title: req.book_title,
            book_price: req.book_price,
            seed_message: req.seed_message,
        })
        .await?;

    Ok((thread_status(&thread), Json(thread.into())))
}

/// Start (or resume) the caller's purchase conversation about a book
pub async fn start_purchase_inquiry(
    AuthUser(ctx): AuthUser,
    State(state): State<MessagingState>,
    ValidatedJson(req): ValidatedJson<PurchaseInquiryRequest>,
) -> Result<(StatusCode, Json<ThreadResponse>)> {
    let thread = state
        .service
        .start_purchase_inquiry(PurchaseInquiry {
            buyer_id: ctx.user_id,
            seller_id: req.seller_id,
            book_title: req.book_title,
            book_price: req.book_price,
            message: req.message,
        })
        .await?;

    Ok((thread_status(&thread), Json(thread.into())))
}

/// List the caller's conversations, most recently active first
pub async fn list_conversations(
    AuthUser(ctx): AuthUser,
    State(state): State<MessagingState>,
) -> Result<Json<Vec<ConversationSummary>>> {
    let summaries = state
        .service
        .list_conversations_for_user(&ctx.user_id)
        .await?;
    Ok(Json(summaries))
}

/// Mark the caller's incoming messages read and return the thread
pub async fn open_conversation(
    AuthUser(ctx): AuthUser,
    State(state): State<MessagingState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<MessageResponse>>> {
    let messages = state.service.open_conversation(&id, &ctx.user_id).await?;
    Ok(Json(messages.into_iter().map(Into::into).collect()))
}

/// Mark every message addressed to the caller in a conversation as read
pub async fn mark_conversation_read(
    AuthUser(ctx): AuthUser,
    State(state): State<MessagingState>,
    Path(id): Path<String>,
) -> Result<Json<MarkReadResponse>> {
    let marked_read = state
        .service
        .mark_conversation_read(&id, &ctx.user_id)
        .await?;

    Ok(Json(MarkReadResponse {
        conversation_id: id,
        marked_read,
    }))
}
