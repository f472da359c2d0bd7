//! In-memory messaging store
//!
//! Holds conversations and messages behind a single async lock, so every
//! operation is atomic with respect to the others. Used for local development
//! and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{ConversationInsert, MessagingStore};
use crate::domain::entities::{Conversation, ConversationOverview, Message, MessageStatus};
use crate::domain::state::{DeliveryEvent, DeliveryStateMachine};
use unimarket_common::RepositoryError;

#[derive(Debug, Default)]
struct StoreData {
    conversations: HashMap<String, Conversation>,
    /// Insertion order; callers stamp `created_at` before taking the lock,
    /// so reads sort by `(created_at, id)`
    messages: Vec<Message>,
}

impl StoreData {
    /// Messages of one conversation, ordered by `(created_at, id)`
    fn thread(&self, conversation_id: &str) -> Vec<&Message> {
        let mut thread: Vec<&Message> = self
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .collect();
        thread.sort_by_key(|m| (m.created_at, m.id));
        thread
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryMessagingStore {
    data: Arc<Mutex<StoreData>>,
}

impl InMemoryMessagingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored conversations
    pub async fn conversation_count(&self) -> usize {
        self.data.lock().await.conversations.len()
    }

    /// Number of stored messages across all conversations
    pub async fn message_count(&self) -> usize {
        self.data.lock().await.messages.len()
    }
}

#[async_trait]
impl MessagingStore for InMemoryMessagingStore {
    async fn insert_conversation_if_absent(
        &self,
        conversation: &Conversation,
        seed: Option<&Message>,
    ) -> Result<ConversationInsert, RepositoryError> {
        let mut data = self.data.lock().await;

        if let Some(existing) = data.conversations.get(&conversation.id) {
            return Ok(ConversationInsert::Existing(existing.clone()));
        }

        data.conversations
            .insert(conversation.id.clone(), conversation.clone());
        if let Some(message) = seed {
            data.messages.push(message.clone());
        }

        Ok(ConversationInsert::Created {
            conversation: conversation.clone(),
            seed: seed.cloned(),
        })
    }

    async fn find_conversation(&self, id: &str) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self.data.lock().await.conversations.get(id).cloned())
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, RepositoryError> {
        let data = self.data.lock().await;
        Ok(data.thread(conversation_id).into_iter().cloned().collect())
    }

    async fn find_message(&self, id: Uuid) -> Result<Option<Message>, RepositoryError> {
        let data = self.data.lock().await;
        Ok(data.messages.iter().find(|m| m.id == id).cloned())
    }

    async fn append_message(&self, message: &Message) -> Result<Message, RepositoryError> {
        let mut data = self.data.lock().await;

        let conversation = data
            .conversations
            .get_mut(&message.conversation_id)
            .ok_or(RepositoryError::NotFound)?;
        conversation.record_message_at(message.created_at);

        data.messages.push(message.clone());
        Ok(message.clone())
    }

    async fn mark_delivered(
        &self,
        message_id: Uuid,
    ) -> Result<Option<MessageStatus>, RepositoryError> {
        let mut data = self.data.lock().await;
        Ok(data
            .messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .map(|m| {
                m.status = DeliveryStateMachine::apply(m.status, DeliveryEvent::Deliver);
                m.status
            }))
    }

    async fn mark_conversation_read(
        &self,
        conversation_id: &str,
        reader_id: &str,
    ) -> Result<u64, RepositoryError> {
        let mut data = self.data.lock().await;
        let mut changed = 0;
        for message in data
            .messages
            .iter_mut()
            .filter(|m| m.conversation_id == conversation_id && m.is_unread_for(reader_id))
        {
            message.status = DeliveryStateMachine::apply(message.status, DeliveryEvent::Read);
            changed += 1;
        }
        Ok(changed)
    }

    async fn count_unread(&self, user_id: &str) -> Result<i64, RepositoryError> {
        let data = self.data.lock().await;
        Ok(data
            .messages
            .iter()
            .filter(|m| m.is_unread_for(user_id))
            .count() as i64)
    }

    async fn list_conversation_overviews(
        &self,
        user_id: &str,
    ) -> Result<Vec<ConversationOverview>, RepositoryError> {
        let data = self.data.lock().await;

        let mut overviews: Vec<ConversationOverview> = data
            .conversations
            .values()
            .filter(|c| c.is_participant(user_id))
            .map(|c| {
                let messages = data.thread(&c.id);
                ConversationOverview {
                    conversation: c.clone(),
                    last_message: messages.last().map(|m| m.body.clone()),
                    unread_count: messages.iter().filter(|m| m.is_unread_for(user_id)).count()
                        as i64,
                }
            })
            .collect();

        // last_message_at DESC NULLS LAST, then created_at DESC
        overviews.sort_by(|a, b| {
            let (a, b) = (&a.conversation, &b.conversation);
            let by_activity = match (a.last_message_at, b.last_message_at) {
                (Some(x), Some(y)) => y.cmp(&x),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            };
            by_activity.then_with(|| b.created_at.cmp(&a.created_at))
        });

        Ok(overviews)
    }
}
