//! Postgres-backed messaging store

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::transactions::{
    create_message_tx, find_conversation_tx, insert_conversation_if_absent_tx,
    touch_last_message_at_tx,
};
use super::{ConversationInsert, ConversationRepository, MessageRepository, MessagingStore};
use crate::domain::entities::{Conversation, ConversationOverview, Message, MessageStatus};
use unimarket_common::RepositoryError;

/// Combined repository access for the Messaging domain
#[derive(Clone)]
pub struct PgMessagingStore {
    pool: PgPool,
    pub conversations: ConversationRepository,
    pub messages: MessageRepository,
}

impl PgMessagingStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            conversations: ConversationRepository::new(pool.clone()),
            messages: MessageRepository::new(pool.clone()),
            pool,
        }
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MessagingStore for PgMessagingStore {
    async fn insert_conversation_if_absent(
        &self,
        conversation: &Conversation,
        seed: Option<&Message>,
    ) -> Result<ConversationInsert, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // A concurrent insert of the same id blocks here until the other
        // transaction commits, then reports no row.
        match insert_conversation_if_absent_tx(&mut tx, conversation).await? {
            Some(created) => {
                let seed = match seed {
                    Some(message) => Some(create_message_tx(&mut tx, message).await?),
                    None => None,
                };
                tx.commit().await?;

                tracing::debug!(
                    conversation_id = %created.id,
                    seeded = seed.is_some(),
                    "Conversation created"
                );
                Ok(ConversationInsert::Created {
                    conversation: created,
                    seed,
                })
            }
            None => {
                let existing = find_conversation_tx(&mut tx, &conversation.id)
                    .await?
                    .ok_or_else(|| {
                        RepositoryError::InvalidData(format!(
                            "conversation {} conflicted on insert but could not be read",
                            conversation.id
                        ))
                    })?;
                tx.commit().await?;
                Ok(ConversationInsert::Existing(existing))
            }
        }
    }

    async fn find_conversation(&self, id: &str) -> Result<Option<Conversation>, RepositoryError> {
        self.conversations.find(id).await
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, RepositoryError> {
        self.messages.list_by_conversation(conversation_id).await
    }

    async fn find_message(&self, id: Uuid) -> Result<Option<Message>, RepositoryError> {
        self.messages.find(id).await
    }

    async fn append_message(&self, message: &Message) -> Result<Message, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Bump first so the conversation row lock orders concurrent senders.
        touch_last_message_at_tx(&mut tx, &message.conversation_id, message.created_at).await?;
        let created = create_message_tx(&mut tx, message).await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn mark_delivered(
        &self,
        message_id: Uuid,
    ) -> Result<Option<MessageStatus>, RepositoryError> {
        self.messages.mark_delivered(message_id).await
    }

    async fn mark_conversation_read(
        &self,
        conversation_id: &str,
        reader_id: &str,
    ) -> Result<u64, RepositoryError> {
        self.messages
            .mark_conversation_read(conversation_id, reader_id)
            .await
    }

    async fn count_unread(&self, user_id: &str) -> Result<i64, RepositoryError> {
        self.messages.count_unread(user_id).await
    }

    async fn list_conversation_overviews(
        &self,
        user_id: &str,
    ) -> Result<Vec<ConversationOverview>, RepositoryError> {
        self.conversations.list_overviews_for_user(user_id).await
    }
}
