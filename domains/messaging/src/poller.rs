//! Unread badge poller
//!
//! Clients are not pushed new messages; they refresh an unread count on a
//! fixed interval. `UnreadPoller` runs that loop against any
//! `UnreadCountSource` and publishes the latest value on a watch channel.
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `poll_interval` | 5s | Time between polls |
//! | HTTP request timeout | 10s | Upper bound on one `HttpUnreadSource` call |
//!
//! A failed poll is logged and the previously published count is kept. A
//! shutdown signal interrupts a poll that is still in flight.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time;

use crate::service::MessagingService;

/// Default time between polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default upper bound on one unread-count request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum PollError {
    #[error("Unread count request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unread count endpoint returned status {0}")]
    Status(u16),

    #[error(transparent)]
    Service(#[from] unimarket_common::Error),
}

/// Anything that can report a user's unread message count
#[async_trait]
pub trait UnreadCountSource: Send + Sync {
    async fn unread_count(&self) -> Result<i64, PollError>;
}

/// Reads the count straight from an in-process service
pub struct ServiceUnreadSource {
    service: MessagingService,
    user_id: String,
}

impl ServiceUnreadSource {
    pub fn new(service: MessagingService, user_id: impl Into<String>) -> Self {
        Self {
            service,
            user_id: user_id.into(),
        }
    }
}

#[async_trait]
impl UnreadCountSource for ServiceUnreadSource {
    async fn unread_count(&self) -> Result<i64, PollError> {
        Ok(self.service.count_unread_for_user(&self.user_id).await?)
    }
}

#[derive(Debug, Deserialize)]
struct UnreadCountBody {
    unread_count: i64,
}

/// Reads the count from `GET /v1/messages/unread-count` on a remote server
pub struct HttpUnreadSource {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl HttpUnreadSource {
    pub fn new(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self, PollError> {
        Self::with_timeout(base_url, access_token, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Source whose requests give up after `timeout`
    pub fn with_timeout(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PollError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, access_token))
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }
}

#[async_trait]
impl UnreadCountSource for HttpUnreadSource {
    async fn unread_count(&self) -> Result<i64, PollError> {
        let response = self
            .client
            .get(format!("{}/v1/messages/unread-count", self.base_url))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PollError::Status(status.as_u16()));
        }

        let body: UnreadCountBody = response.json().await?;
        Ok(body.unread_count)
    }
}

/// Configuration for the UnreadPoller.
#[derive(Debug, Clone)]
pub struct UnreadPollerConfig {
    pub poll_interval: Duration,
}

impl Default for UnreadPollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl UnreadPollerConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

pub struct UnreadPoller {
    source: Arc<dyn UnreadCountSource>,
    config: UnreadPollerConfig,
    count: watch::Sender<i64>,
}

impl UnreadPoller {
    /// Create a poller; the count starts at zero until the first poll lands
    pub fn new(source: Arc<dyn UnreadCountSource>, config: UnreadPollerConfig) -> Self {
        let (count, _) = watch::channel(0);
        Self {
            source,
            config,
            count,
        }
    }

    /// Receiver that always holds the latest known count
    pub fn subscribe(&self) -> watch::Receiver<i64> {
        self.count.subscribe()
    }

    /// Poll once and publish the result
    pub async fn poll_once(&self) -> Result<i64, PollError> {
        let count = self.source.unread_count().await?;
        self.count.send_replace(count);
        Ok(count)
    }

    /// Poll on the configured interval until `shutdown` flips to true.
    #[mutants::skip] // Loop timing only; poll_once carries the logic
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

        tracing::info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "Unread poller started"
        );

        'poll: loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break 'poll;
                    }
                }

                _ = interval.tick() => {
                    tokio::select! {
                        result = self.poll_once() => match result {
                            Ok(count) => tracing::trace!(unread_count = count, "Unread count refreshed"),
                            Err(e) => tracing::warn!(error = %e, "Unread poll failed, keeping previous count"),
                        },
                        changed = shutdown.changed() => {
                            if changed.is_err() || *shutdown.borrow() {
                                tracing::debug!("Abandoning in-flight unread poll");
                                break 'poll;
                            }
                        }
                    }
                }
            }
        }

        tracing::info!("Unread poller shutting down");
    }
}
