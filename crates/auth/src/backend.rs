//! Concrete authentication backend
//!
//! The marketplace's users live in the hosted identity service; this backend
//! only verifies the token it issued and turns the claims into a context.

use crate::config::AuthConfig;
use crate::context::AuthContext;
use crate::error::AuthError;

/// Concrete authentication backend.
///
/// Domain states expose this via `FromRef`:
/// ```ignore
/// impl FromRef<MyDomainState> for AuthBackend {
///     fn from_ref(state: &MyDomainState) -> Self {
///         state.auth.clone()
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthBackend {
    config: AuthConfig,
}

impl AuthBackend {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Validate a bearer token and build the caller's context
    pub(crate) fn authenticate_jwt(&self, token: &str) -> Result<AuthContext, AuthError> {
        let claims = crate::jwt::validate_jwt_token(token, &self.config)?;

        let user_id = claims.sub.trim();
        if user_id.is_empty() {
            return Err(AuthError::InvalidUserId);
        }

        tracing::debug!(user_id = %user_id, "Caller authenticated");

        Ok(AuthContext::new(user_id.to_string(), claims.email))
    }
}
