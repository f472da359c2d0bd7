//! Storage for the Messaging domain
//!
//! `MessagingStore` is the seam between the service and persistence.
//! `PgMessagingStore` backs production; `InMemoryMessagingStore` backs local
//! development and tests.

pub mod conversations;
pub mod memory;
pub mod messages;
pub mod postgres;
pub mod transactions;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::{Conversation, ConversationOverview, Message, MessageStatus};
use unimarket_common::RepositoryError;

pub use conversations::ConversationRepository;
pub use memory::InMemoryMessagingStore;
pub use messages::MessageRepository;
pub use postgres::PgMessagingStore;

/// Outcome of an insert-if-absent on a conversation id
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationInsert {
    /// This call created the conversation (and its seed message, if any)
    Created {
        conversation: Conversation,
        seed: Option<Message>,
    },
    /// A conversation with the same id already existed and was left untouched
    Existing(Conversation),
}

/// Persistence contract for conversations and messages.
///
/// Implementations must ensure:
/// - At most one conversation per id, even under concurrent inserts
/// - A seed message is written only by the call that creates its conversation
/// - A message and its conversation's `last_message_at` bump commit together
/// - Status updates never move a message backwards
#[async_trait]
pub trait MessagingStore: Send + Sync {
    /// Insert `conversation` unless its id is taken, together with an
    /// optional seed message.
    async fn insert_conversation_if_absent(
        &self,
        conversation: &Conversation,
        seed: Option<&Message>,
    ) -> Result<ConversationInsert, RepositoryError>;

    async fn find_conversation(&self, id: &str) -> Result<Option<Conversation>, RepositoryError>;

    /// Messages of a conversation in creation order
    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, RepositoryError>;

    async fn find_message(&self, id: Uuid) -> Result<Option<Message>, RepositoryError>;

    /// Append a message and advance its conversation's `last_message_at`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the conversation does not exist
    async fn append_message(&self, message: &Message) -> Result<Message, RepositoryError>;

    /// Move a `sent` message to `delivered`. Returns the status after the
    /// call, or `None` when the message does not exist.
    async fn mark_delivered(&self, message_id: Uuid)
        -> Result<Option<MessageStatus>, RepositoryError>;

    /// Mark every message addressed to `reader_id` in the conversation as
    /// read. Returns how many messages changed.
    async fn mark_conversation_read(
        &self,
        conversation_id: &str,
        reader_id: &str,
    ) -> Result<u64, RepositoryError>;

    /// Messages addressed to `user_id` that are not yet read, across all
    /// conversations
    async fn count_unread(&self, user_id: &str) -> Result<i64, RepositoryError>;

    /// Conversations where `user_id` is buyer or seller, most recently
    /// active first
    async fn list_conversation_overviews(
        &self,
        user_id: &str,
    ) -> Result<Vec<ConversationOverview>, RepositoryError>;
}
