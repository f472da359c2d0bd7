//! Shared utilities, configuration, and error handling for Unimarket
//!
//! This crate provides common functionality used across the Unimarket services:
//! - Configuration management following 12-factor principles
//! - Error types and their HTTP mapping
//! - Database pool and store-timeout helpers
//! - Request extractors

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod state;

pub use config::{Config, StorageBackend};
pub use db::{create_pool, with_timeout, RepositoryError};
pub use error::{Error, Result};
pub use extractors::ValidatedJson;
pub use state::StateError;
