//! Message repository

use crate::domain::entities::{Message, MessageStatus};
use sqlx::PgPool;
use unimarket_common::RepositoryError;
use uuid::Uuid;

#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List messages for a conversation, oldest first
    pub async fn list_by_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<Message>, RepositoryError> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, conversation_id, sender_id, sender_name,
                   receiver_id, receiver_name, body, kind,
                   book_title, book_price, status, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    /// Find message by ID
    pub async fn find(&self, id: Uuid) -> Result<Option<Message>, RepositoryError> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, conversation_id, sender_id, sender_name,
                   receiver_id, receiver_name, body, kind,
                   book_title, book_price, status, created_at
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(message)
    }

    /// Move a message from `sent` to `delivered`.
    ///
    /// Messages already delivered or read keep their status. Returns the
    /// status after the update, or `None` if the message does not exist.
    pub async fn mark_delivered(
        &self,
        id: Uuid,
    ) -> Result<Option<MessageStatus>, RepositoryError> {
        let updated = sqlx::query_scalar::<_, MessageStatus>(
            r#"
            UPDATE messages SET status = 'delivered'
            WHERE id = $1 AND status = 'sent'
            RETURNING status
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        if updated.is_some() {
            return Ok(updated);
        }

        let current =
            sqlx::query_scalar::<_, MessageStatus>("SELECT status FROM messages WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(current)
    }

    /// Mark all unread messages addressed to `reader_id` in a conversation
    /// as read, returning how many changed
    pub async fn mark_conversation_read(
        &self,
        conversation_id: &str,
        reader_id: &str,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE messages SET status = 'read'
            WHERE conversation_id = $1
              AND receiver_id = $2
              AND status <> 'read'
            "#,
        )
        .bind(conversation_id)
        .bind(reader_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Count messages addressed to a user that are not yet read
    pub async fn count_unread(&self, user_id: &str) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM messages
            WHERE receiver_id = $1 AND status <> 'read'
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
