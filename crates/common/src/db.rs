//! Shared database types for Unimarket
//!
//! This module provides the repository error type, pool construction and the
//! timeout guard applied at every store boundary.

use std::future::Future;
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;

use crate::error::Error;

/// Database-specific error types
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Store did not respond within {0:?}")]
    Timeout(Duration),
}

impl From<RepositoryError> for Error {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Error::NotFound("Record not found".to_string()),
            RepositoryError::Connection(e) => Error::Database(e),
            RepositoryError::InvalidData(msg) => Error::Internal(msg),
            RepositoryError::Timeout(limit) => {
                Error::Timeout(format!("store did not respond within {:?}", limit))
            }
        }
    }
}

/// Run a store future with an upper bound on its duration.
///
/// Expiry drops the future and yields `RepositoryError::Timeout`. Postgres
/// rolls back any transaction left open by the dropped future.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> std::result::Result<T, RepositoryError>
where
    F: Future<Output = std::result::Result<T, RepositoryError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(timeout_ms = limit.as_millis() as u64, "Store call timed out");
            Err(RepositoryError::Timeout(limit))
        }
    }
}

/// Build a Postgres connection pool
pub async fn create_pool(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> std::result::Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await
}
