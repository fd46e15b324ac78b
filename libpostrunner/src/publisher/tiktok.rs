//! TikTok publisher using the Content Posting API
//!
//! Text and photo posts go through the direct-post content init endpoint.
//! TikTok processes the upload asynchronously; the publish id it returns is
//! what we record as the platform post id.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{PublishError, Result};
use crate::types::{Platform, PublishPayload};

use super::{api_error, transport_error, Publisher};

const DEFAULT_API_BASE: &str = "https://open.tiktokapis.com";
const TITLE_LIMIT: usize = 2200;

pub struct TiktokPublisher {
    client: reqwest::Client,
    api_base: String,
}

#[derive(Deserialize)]
struct ContentInitResponse {
    data: ContentInitData,
}

#[derive(Deserialize)]
struct ContentInitData {
    publish_id: String,
}

impl TiktokPublisher {
    pub fn new() -> Self {
        Self::with_api_base(DEFAULT_API_BASE)
    }

    pub fn with_api_base(api_base: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for TiktokPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Publisher for TiktokPublisher {
    fn platform(&self) -> Platform {
        Platform::Tiktok
    }

    fn character_limit(&self) -> Option<usize> {
        Some(TITLE_LIMIT)
    }

    async fn publish(&self, access_token: &str, payload: &PublishPayload) -> Result<String> {
        let body = json!({
            "post_info": {
                "title": payload.content,
                "privacy_level": "PUBLIC_TO_EVERYONE",
            },
            "source_info": {
                "source": "PULL_FROM_URL",
                "photo_cover_index": 0,
                "photo_images": payload.media_urls,
            },
            "post_mode": "DIRECT_POST",
            "media_type": "PHOTO",
        });

        let url = format!("{}/v2/post/publish/content/init/", self.api_base);
        debug!(%url, "initializing tiktok content post");

        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body).into());
        }

        let init: ContentInitResponse = response
            .json()
            .await
            .map_err(|e| PublishError::Api(format!("unexpected init response: {}", e)))?;

        Ok(init.data.publish_id)
    }
}
