//! YouTube publisher placeholder
//!
//! YouTube has no public API for creating community posts, and scheduled
//! text posts have nowhere else to land. The adapter exists so the platform
//! stays registered and posts targeting it fail with a clear message instead
//! of an "unsupported platform" lookup miss.

use async_trait::async_trait;

use crate::error::{PublishError, Result};
use crate::types::{Platform, PublishPayload};

use super::Publisher;

pub struct YoutubePublisher;

impl YoutubePublisher {
    pub fn new() -> Self {
        Self
    }
}

impl Default for YoutubePublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Publisher for YoutubePublisher {
    fn platform(&self) -> Platform {
        Platform::Youtube
    }

    async fn publish(&self, _access_token: &str, _payload: &PublishPayload) -> Result<String> {
        Err(PublishError::Unsupported(
            "youtube community posts have no publishing API".to_string(),
        )
        .into())
    }
}
