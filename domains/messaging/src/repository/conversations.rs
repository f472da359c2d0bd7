//! Conversation repository

use crate::domain::entities::{Conversation, ConversationOverview};
use sqlx::PgPool;
use unimarket_common::RepositoryError;

#[derive(Clone)]
pub struct ConversationRepository {
    pool: PgPool,
}

impl ConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find conversation by ID
    pub async fn find(&self, id: &str) -> Result<Option<Conversation>, RepositoryError> {
        let conv = sqlx::query_as::<_, Conversation>(
            r#"
            SELECT id, buyer_id, seller_id, book_title, book_price,
                   last_message_at, created_at
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(conv)
    }

    /// List conversations a user takes part in, with the latest message body
    /// and the user's unread count for each
    pub async fn list_overviews_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<ConversationOverview>, RepositoryError> {
        let overviews = sqlx::query_as::<_, ConversationOverview>(
            r#"
            SELECT c.id, c.buyer_id, c.seller_id, c.book_title, c.book_price,
                   c.last_message_at, c.created_at,
                   latest.body AS last_message,
                   (
                       SELECT COUNT(*)
                       FROM messages m
                       WHERE m.conversation_id = c.id
                         AND m.receiver_id = $1
                         AND m.status <> 'read'
                   ) AS unread_count
            FROM conversations c
            LEFT JOIN LATERAL (
                SELECT body
                FROM messages
                WHERE conversation_id = c.id
                ORDER BY created_at DESC, id DESC
                LIMIT 1
            ) latest ON TRUE
            WHERE c.buyer_id = $1 OR c.seller_id = $1
            ORDER BY c.last_message_at DESC NULLS LAST, c.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(overviews)
    }
}
