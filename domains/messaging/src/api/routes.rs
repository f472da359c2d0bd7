//! Route definitions for Messaging domain API

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{conversations, messages};
use super::middleware::MessagingState;

/// Create conversation routes
fn conversation_routes() -> Router<MessagingState> {
    Router::new()
        .route(
            "/v1/conversations",
            get(conversations::list_conversations).post(conversations::ensure_conversation),
        )
        .route(
            "/v1/conversations/purchase",
            post(conversations::start_purchase_inquiry),
        )
        .route(
            "/v1/conversations/{id}/open",
            post(conversations::open_conversation),
        )
        .route(
            "/v1/conversations/{id}/read",
            post(conversations::mark_conversation_read),
        )
}

/// Create message routes
fn message_routes() -> Router<MessagingState> {
    Router::new()
        .route(
            "/v1/conversations/{id}/messages",
            get(messages::list_messages).post(messages::send_message),
        )
        .route(
            "/v1/messages/{id}/delivered",
            post(messages::mark_delivered),
        )
        .route("/v1/messages/unread-count", get(messages::unread_count))
}

/// Create all Messaging domain API routes
pub fn routes() -> Router<MessagingState> {
    Router::new()
        .merge(conversation_routes())
        .merge(message_routes())
}
