//! Messaging domain: buyer/seller conversations, delivery state, unread counts

pub mod api;
pub mod domain;
pub mod poller;
pub mod repository;
pub mod service;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{
    purchase_conversation_id, Conversation, ConversationOverview, ConversationSummary, Message,
    MessageStatus, NewMessage, ParticipantRole,
};
pub use domain::state::{DeliveryEvent, DeliveryStateMachine, StateError};

// Re-export repository types
pub use repository::{
    ConversationInsert, InMemoryMessagingStore, MessagingStore, PgMessagingStore,
};

// Re-export service and poller types
pub use poller::{
    HttpUnreadSource, PollError, ServiceUnreadSource, UnreadCountSource, UnreadPoller,
    UnreadPollerConfig,
};
pub use service::{
    ConversationThread, EnsureConversation, MessagingService, PurchaseInquiry, Reply,
    DEFAULT_STORE_TIMEOUT,
};

// Re-export API types
pub use api::routes;
pub use api::MessagingState;
