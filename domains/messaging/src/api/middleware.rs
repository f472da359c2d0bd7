//! Messaging domain state and auth backend integration

use crate::service::MessagingService;
use axum::extract::FromRef;
use unimarket_auth::AuthBackend;

/// Application state for the Messaging domain
#[derive(Clone)]
pub struct MessagingState {
    pub service: MessagingService,
    pub auth: AuthBackend,
}

impl MessagingState {
    pub fn new(service: MessagingService, auth: AuthBackend) -> Self {
        Self { service, auth }
    }
}

impl FromRef<MessagingState> for AuthBackend {
    fn from_ref(state: &MessagingState) -> Self {
        state.auth.clone()
    }
}
