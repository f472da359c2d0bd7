//! Identity provider adapter for the Unimarket API
//!
//! Validates Supabase-issued JWTs and exposes the caller's user id through
//! axum extractors that work with any state implementing `FromRef<S>` for
//! `AuthBackend`. The user id is trusted as-is once the token verifies.

mod backend;
mod claims;
mod config;
mod context;
mod error;
mod extractors;
mod jwt;

pub use backend::AuthBackend;
pub use claims::SupabaseClaims;
pub use config::AuthConfig;
pub use context::AuthContext;
pub use error::AuthError;
pub use extractors::AuthUser;
