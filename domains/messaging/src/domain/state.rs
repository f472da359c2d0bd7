//! State machine for message delivery status
//!
//! Message states: Sent → Delivered → Read (forward only, Read is terminal).
//! Sent may jump straight to Read when the receiver opens the conversation.

pub use unimarket_common::StateError;

use super::entities::MessageStatus;

impl MessageStatus {
    /// Get all valid next states from current state
    pub fn valid_transitions(&self) -> &'static [MessageStatus] {
        match self {
            Self::Sent => &[Self::Delivered, Self::Read],
            Self::Delivered => &[Self::Read],
            Self::Read => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Read)
    }
}

/// Events that trigger delivery status transitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeliveryEvent {
    /// The receiver's client fetched the message
    Deliver,
    /// The receiver opened the conversation
    Read,
}

impl DeliveryEvent {
    /// Status a message ends up in after this event
    pub fn target(&self) -> MessageStatus {
        match self {
            Self::Deliver => MessageStatus::Delivered,
            Self::Read => MessageStatus::Read,
        }
    }
}

impl std::fmt::Display for DeliveryEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deliver => write!(f, "deliver"),
            Self::Read => write!(f, "read"),
        }
    }
}

/// Delivery state machine
pub struct DeliveryStateMachine;

impl DeliveryStateMachine {
    /// Attempt a state transition
    pub fn transition(
        current: MessageStatus,
        event: DeliveryEvent,
    ) -> Result<MessageStatus, StateError> {
        if current.is_terminal() {
            return Err(StateError::TerminalState(current.to_string()));
        }

        let next = event.target();
        if !current.valid_transitions().contains(&next) {
            return Err(StateError::InvalidTransition {
                from: current.to_string(),
                event: event.to_string(),
            });
        }

        Ok(next)
    }

    /// Apply an event, leaving the status unchanged when the transition is
    /// not allowed. Delivery receipts and read marks are idempotent.
    pub fn apply(current: MessageStatus, event: DeliveryEvent) -> MessageStatus {
        Self::transition(current, event).unwrap_or(current)
    }
}
