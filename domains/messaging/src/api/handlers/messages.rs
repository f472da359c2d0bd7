//! Message API handlers

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
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::MessagingState;
use crate::domain::entities::{Message, MessageStatus};
use crate::service::Reply;

/// Request for sending a message; the caller is the sender and the other
/// participant is the receiver
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 5000))]
    pub body: String,

    #[validate(length(max = 100))]
    pub sender_name: Option<String>,

    #[validate(length(max = 100))]
    pub receiver_name: Option<String>,

    /// Free-form tag, `text` when omitted
    #[validate(length(max = 50))]
    pub kind: Option<String>,

    #[validate(length(max = 200))]
    pub book_title: Option<String>,

    pub book_price: Option<Decimal>,
}

/// Message response DTO
#[derive(Debug, Serialize)]
pub struct MessageResponse {
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

impl From<Message> for MessageResponse {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            conversation_id: m.conversation_id,
            sender_id: m.sender_id,
            sender_name: m.sender_name,
            receiver_id: m.receiver_id,
            receiver_name: m.receiver_name,
            body: m.body,
            kind: m.kind,
            book_title: m.book_title,
            book_price: m.book_price,
            status: m.status,
            created_at: m.created_at,
        }
    }
}

/// Status of a message after a delivery receipt
#[derive(Debug, Serialize)]
pub struct DeliveryResponse {
    pub id: Uuid,
    pub status: MessageStatus,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}

/// Send a message to a conversation
pub async fn send_message(
    AuthUser(ctx): AuthUser,
    State(state): State<MessagingState>,
    Path(conversation_id): Path<String>,
    ValidatedJson(req): ValidatedJson<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let message = state
        .service
        .reply(Reply {
            conversation_id,
            sender_id: ctx.user_id,
            sender_name: req.sender_name,
            receiver_name: req.receiver_name,
            body: req.body,
            kind: req.kind,
            book_title: req.book_title,
            book_price: req.book_price,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(message.into())))
}

/// List messages in a conversation, oldest first
pub async fn list_messages(
    AuthUser(ctx): AuthUser,
    State(state): State<MessagingState>,
    Path(conversation_id): Path<String>,
) -> Result<Json<Vec<MessageResponse>>> {
    let messages = state
        .service
        .list_messages(&conversation_id, &ctx.user_id)
        .await?;
    Ok(Json(messages.into_iter().map(Into::into).collect()))
}

/// Acknowledge delivery of a message to the caller
pub async fn mark_delivered(
    AuthUser(ctx): AuthUser,
    State(state): State<MessagingState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeliveryResponse>> {
    let message = state
        .service
        .find_message(id)
        .await?
        .ok_or_else(|| Error::NotFound("Message not found".to_string()))?;

    if ctx.is(&message.sender_id) {
        return Err(Error::Authorization(
            "Only the receiver can acknowledge delivery".to_string(),
        ));
    }
    if !ctx.is(&message.receiver_id) {
        return Err(Error::NotFound("Message not found".to_string()));
    }

    let status = state.service.mark_delivered(id).await?;
    Ok(Json(DeliveryResponse { id, status }))
}

/// Count the caller's unread messages across all conversations
pub async fn unread_count(
    AuthUser(ctx): AuthUser,
    State(state): State<MessagingState>,
) -> Result<Json<UnreadCountResponse>> {
    let unread_count = state.service.count_unread_for_user(&ctx.user_id).await?;
    Ok(Json(UnreadCountResponse { unread_count }))
}
