//! Authenticated caller context

/// Represents an authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// Stable user identifier from the identity provider (JWT `sub`)
    pub user_id: String,
    pub email: Option<String>,
}

impl AuthContext {
    pub fn new(user_id: String, email: Option<String>) -> Self {
        Self { user_id, email }
    }

    /// Check whether the caller is the given user
    pub fn is(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}
