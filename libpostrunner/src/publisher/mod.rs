//! Platform publisher abstraction and implementations
//!
//! Each social platform gets one `Publisher` implementation; the
//! `PublisherRegistry` selects the adapter by `Platform` value, resolves the
//! owning user's stored connection, and normalizes every outcome (including
//! timeouts and adapter errors) into a `DeliveryOutcome`. The registry makes
//! exactly one publish attempt per call; retry policy lives with the user,
//! not here.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::db::Database;
use crate::error::{PublishError, Result};
use crate::types::{DeliveryOutcome, Platform, PublishPayload};

pub mod instagram;
pub mod linkedin;
pub mod tiktok;
pub mod twitter;
pub mod youtube;

// Mock publisher is available for all builds to support integration tests
pub mod mock;

/// A platform-specific publisher.
///
/// Implementations perform the actual network call against the platform API
/// and return the platform's identifier for the created post. They must not
/// loop on failure: one invocation, one attempt.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// The platform this publisher serves.
    fn platform(&self) -> Platform;

    /// Maximum characters the platform accepts, if it has a hard limit.
    fn character_limit(&self) -> Option<usize> {
        None
    }

    /// Check content against platform rules before any network call.
    fn validate_content(&self, content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(PublishError::Validation("Content cannot be empty".to_string()).into());
        }
        if let Some(limit) = self.character_limit() {
            let chars = content.chars().count();
            if chars > limit {
                return Err(PublishError::Validation(format!(
                    "Content exceeds {}'s {} character limit (current: {} characters)",
                    self.platform(),
                    limit,
                    chars
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Publish the payload, returning the platform-specific post id.
    async fn publish(&self, access_token: &str, payload: &PublishPayload) -> Result<String>;
}

/// Registry of publishers keyed by platform.
pub struct PublisherRegistry {
    publishers: HashMap<Platform, Box<dyn Publisher>>,
    publish_timeout: Duration,
}

impl PublisherRegistry {
    /// An empty registry. Adapters are added with [`register`](Self::register).
    pub fn new(publish_timeout: Duration) -> Self {
        Self {
            publishers: HashMap::new(),
            publish_timeout,
        }
    }

    /// A registry with the real HTTP adapters for every supported platform.
    pub fn with_default_publishers(publish_timeout: Duration) -> Self {
        let mut registry = Self::new(publish_timeout);
        registry.register(Box::new(instagram::InstagramPublisher::new()));
        registry.register(Box::new(twitter::TwitterPublisher::new()));
        registry.register(Box::new(linkedin::LinkedinPublisher::new()));
        registry.register(Box::new(tiktok::TiktokPublisher::new()));
        registry.register(Box::new(youtube::YoutubePublisher::new()));
        registry
    }

    /// Add or replace the publisher for its platform.
    pub fn register(&mut self, publisher: Box<dyn Publisher>) {
        self.publishers.insert(publisher.platform(), publisher);
    }

    /// Publish on behalf of `user_id` to `platform`.
    ///
    /// Resolves the user's stored connection first; missing or inactive
    /// credentials short-circuit to a failure outcome without any network
    /// call. Every failure mode -- bad credentials, platform API errors,
    /// adapter errors, timeout -- comes back as a `DeliveryOutcome`; this
    /// method never returns `Err`, so one post's trouble cannot take down a
    /// dispatch pass.
    pub async fn publish(
        &self,
        db: &Database,
        user_id: &str,
        platform: Platform,
        payload: &PublishPayload,
    ) -> DeliveryOutcome {
        let connection = match db.get_connection(user_id, platform).await {
            Ok(Some(conn)) if conn.active => conn,
            Ok(_) => {
                debug!(user_id, %platform, "no active connection, skipping network call");
                return DeliveryOutcome::failure("not connected");
            }
            Err(e) => {
                warn!(user_id, %platform, "connection lookup failed: {}", e);
                return DeliveryOutcome::failure(e.to_string());
            }
        };

        let Some(publisher) = self.publishers.get(&platform) else {
            return DeliveryOutcome::failure(
                PublishError::Unsupported(platform.to_string()).to_string(),
            );
        };

        if let Err(e) = publisher.validate_content(&payload.content) {
            return DeliveryOutcome::failure(e.to_string());
        }

        match tokio::time::timeout(
            self.publish_timeout,
            publisher.publish(&connection.access_token, payload),
        )
        .await
        {
            Ok(Ok(platform_post_id)) => DeliveryOutcome::success(platform_post_id),
            Ok(Err(e)) => DeliveryOutcome::failure(e.to_string()),
            Err(_) => DeliveryOutcome::failure(
                PublishError::Timeout(self.publish_timeout.as_secs()).to_string(),
            ),
        }
    }

    /// Platforms this registry can deliver to.
    pub fn platforms(&self) -> Vec<Platform> {
        self.publishers.keys().copied().collect()
    }
}

/// Map a non-success HTTP response to the matching publish error.
pub(crate) fn api_error(status: reqwest::StatusCode, body: &str) -> PublishError {
    match status.as_u16() {
        401 | 403 => PublishError::Authentication(format!("HTTP {}: {}", status.as_u16(), body)),
        429 => PublishError::RateLimit(body.to_string()),
        code => PublishError::Api(format!("HTTP {}: {}", code, body)),
    }
}

/// Map a reqwest transport error to a publish error.
pub(crate) fn transport_error(e: reqwest::Error) -> PublishError {
    if e.is_timeout() {
        PublishError::Network(format!("request timed out: {}", e))
    } else {
        PublishError::Network(e.to_string())
    }
}
