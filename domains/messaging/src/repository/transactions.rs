//! Transactional free functions for Messaging domain (Zero2Prod pattern)

use crate::domain::entities::{Conversation, Message};
use sqlx::{Postgres, Transaction};
use unimarket_common::RepositoryError;

/// Insert a conversation unless its id already exists.
///
/// Returns the inserted row, or `None` when another writer got there first.
pub async fn insert_conversation_if_absent_tx(
    transaction: &mut Transaction<'_, Postgres>,
    conversation: &Conversation,
) -> Result<Option<Conversation>, sqlx::Error> {
    let created = sqlx::query_as::<_, Conversation>(
        r#"
        INSERT INTO conversations (
            id, buyer_id, seller_id, book_title, book_price,
            last_message_at, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (id) DO NOTHING
        RETURNING id, buyer_id, seller_id, book_title, book_price,
                  last_message_at, created_at
        "#,
    )
    .bind(&conversation.id)
    .bind(&conversation.buyer_id)
    .bind(&conversation.seller_id)
    .bind(&conversation.book_title)
    .bind(conversation.book_price)
    .bind(conversation.last_message_at)
    .bind(conversation.created_at)
    .fetch_optional(&mut **transaction)
    .await?;
    Ok(created)
}

/// Find a conversation within an existing transaction.
pub async fn find_conversation_tx(
    transaction: &mut Transaction<'_, Postgres>,
    id: &str,
) -> Result<Option<Conversation>, sqlx::Error> {
    let conv = sqlx::query_as::<_, Conversation>(
        r#"
        SELECT id, buyer_id, seller_id, book_title, book_price,
               last_message_at, created_at
        FROM conversations
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **transaction)
    .await?;
    Ok(conv)
}

/// Advance a conversation's `last_message_at` within an existing transaction.
///
/// The timestamp never moves backwards. Returns `RepositoryError::NotFound`
/// if the conversation does not exist.
pub async fn touch_last_message_at_tx(
    transaction: &mut Transaction<'_, Postgres>,
    conversation_id: &str,
    at: chrono::DateTime<chrono::Utc>,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r#"
        UPDATE conversations
        SET last_message_at = GREATEST(last_message_at, $2)
        WHERE id = $1
        "#,
    )
    .bind(conversation_id)
    .bind(at)
    .execute(&mut **transaction)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

/// Create a message within an existing transaction.
pub async fn create_message_tx(
    transaction: &mut Transaction<'_, Postgres>,
    message: &Message,
) -> Result<Message, sqlx::Error> {
    let created = sqlx::query_as::<_, Message>(
        r#"
        INSERT INTO messages (
            id, conversation_id, sender_id, sender_name,
            receiver_id, receiver_name, body, kind,
            book_title, book_price, status, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING id, conversation_id, sender_id, sender_name,
                  receiver_id, receiver_name, body, kind,
                  book_title, book_price, status, created_at
        "#,
    )
    .bind(message.id)
    .bind(&message.conversation_id)
    .bind(&message.sender_id)
    .bind(&message.sender_name)
    .bind(&message.receiver_id)
    .bind(&message.receiver_name)
    .bind(&message.body)
    .bind(&message.kind)
    .bind(&message.book_title)
    .bind(message.book_price)
    .bind(message.status)
    .bind(message.created_at)
    .fetch_one(&mut **transaction)
    .await?;
    Ok(created)
}
