//! Domain layer for Messaging: entities, delivery state machine, validation

pub mod entities;
pub mod state;
pub mod validation;
