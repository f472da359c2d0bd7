//! Request handlers for the Messaging API

pub mod conversations;
pub mod messages;
