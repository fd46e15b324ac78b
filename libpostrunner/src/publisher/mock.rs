//! Configurable in-memory publisher for tests

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{PublishError, Result};
use crate::types::{Platform, PublishPayload};

use super::Publisher;

/// Behavior knobs for a [`MockPublisher`].
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub platform: Platform,
    /// Whether publish calls succeed.
    pub publish_succeeds: bool,
    /// Error message returned when `publish_succeeds` is false.
    pub publish_error: String,
    /// Fail only for content containing this substring; other content
    /// succeeds regardless of `publish_succeeds`.
    pub fail_for_content: Option<String>,
    /// Artificial latency before responding.
    pub delay: Option<Duration>,
    pub character_limit: Option<usize>,
}

impl MockConfig {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            publish_succeeds: true,
            publish_error: "mock publish failed".to_string(),
            fail_for_content: None,
            delay: None,
            character_limit: None,
        }
    }
}

/// A publisher that records every call and answers according to its config.
pub struct MockPublisher {
    config: MockConfig,
    call_count: Arc<Mutex<u32>>,
    published_payloads: Arc<Mutex<Vec<PublishPayload>>>,
    next_id: Arc<Mutex<u32>>,
}

impl MockPublisher {
    pub fn new(config: MockConfig) -> Self {
        Self {
            config,
            call_count: Arc::new(Mutex::new(0)),
            published_payloads: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(Mutex::new(1)),
        }
    }

    /// A publisher that always succeeds.
    pub fn success(platform: Platform) -> Self {
        Self::new(MockConfig::new(platform))
    }

    /// A publisher that always fails with `error`.
    pub fn failure(platform: Platform, error: &str) -> Self {
        let mut config = MockConfig::new(platform);
        config.publish_succeeds = false;
        config.publish_error = error.to_string();
        Self::new(config)
    }

    /// A publisher that succeeds except for content containing `needle`.
    pub fn failing_on(platform: Platform, needle: &str, error: &str) -> Self {
        let mut config = MockConfig::new(platform);
        config.fail_for_content = Some(needle.to_string());
        config.publish_error = error.to_string();
        Self::new(config)
    }

    /// A publisher that sleeps before answering.
    pub fn with_delay(platform: Platform, delay: Duration) -> Self {
        let mut config = MockConfig::new(platform);
        config.delay = Some(delay);
        Self::new(config)
    }

    pub fn call_count(&self) -> u32 {
        *self.call_count.lock().unwrap()
    }

    /// Shared handle to the call counter, usable after the publisher has been
    /// boxed into a registry.
    pub fn call_count_handle(&self) -> Arc<Mutex<u32>> {
        Arc::clone(&self.call_count)
    }

    pub fn published_payloads(&self) -> Vec<PublishPayload> {
        self.published_payloads.lock().unwrap().clone()
    }

    /// Shared handle to the captured payloads.
    pub fn payloads_handle(&self) -> Arc<Mutex<Vec<PublishPayload>>> {
        Arc::clone(&self.published_payloads)
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    fn platform(&self) -> Platform {
        self.config.platform
    }

    fn character_limit(&self) -> Option<usize> {
        self.config.character_limit
    }

    async fn publish(&self, _access_token: &str, payload: &PublishPayload) -> Result<String> {
        *self.call_count.lock().unwrap() += 1;

        if let Some(delay) = self.config.delay {
            tokio::time::sleep(delay).await;
        }

        let should_fail = match &self.config.fail_for_content {
            Some(needle) => payload.content.contains(needle),
            None => !self.config.publish_succeeds,
        };
        if should_fail {
            return Err(PublishError::Api(self.config.publish_error.clone()).into());
        }

        self.published_payloads.lock().unwrap().push(payload.clone());

        let mut next = self.next_id.lock().unwrap();
        let id = format!("mock-{}-{}", self.config.platform, *next);
        *next += 1;
        Ok(id)
    }
}
