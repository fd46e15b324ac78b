//! LinkedIn publisher using the REST posts API
//!
//! The author URN is resolved from the token via the OpenID `userinfo`
//! endpoint, then the post is created against `/rest/posts`. LinkedIn
//! returns the new post's URN in the `x-restli-id` response header rather
//! than the body.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{PublishError, Result};
use crate::types::{Platform, PublishPayload};

use super::{api_error, transport_error, Publisher};

const DEFAULT_API_BASE: &str = "https://api.linkedin.com";
const CHARACTER_LIMIT: usize = 3000;

pub struct LinkedinPublisher {
    client: reqwest::Client,
    api_base: String,
}

#[derive(Deserialize)]
struct UserInfo {
    sub: String,
}

impl LinkedinPublisher {
    pub fn new() -> Self {
        Self::with_api_base(DEFAULT_API_BASE)
    }

    pub fn with_api_base(api_base: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    async fn resolve_author_urn(&self, access_token: &str) -> Result<String> {
        let url = format!("{}/v2/userinfo", self.api_base);
        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body).into());
        }

        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| PublishError::Api(format!("unexpected userinfo response: {}", e)))?;
        Ok(format!("urn:li:person:{}", info.sub))
    }
}

impl Default for LinkedinPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Publisher for LinkedinPublisher {
    fn platform(&self) -> Platform {
        Platform::Linkedin
    }

    fn character_limit(&self) -> Option<usize> {
        Some(CHARACTER_LIMIT)
    }

    async fn publish(&self, access_token: &str, payload: &PublishPayload) -> Result<String> {
        let author = self.resolve_author_urn(access_token).await?;
        debug!(author, "resolved author urn");

        let body = json!({
            "author": author,
            "commentary": payload.content,
            "visibility": "PUBLIC",
            "distribution": {
                "feedDistribution": "MAIN_FEED",
                "targetEntities": [],
                "thirdPartyDistributionChannels": []
            },
            "lifecycleState": "PUBLISHED",
            "isReshareDisabledByAuthor": false
        });

        let url = format!("{}/rest/posts", self.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .header("LinkedIn-Version", "202401")
            .header("X-Restli-Protocol-Version", "2.0.0")
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body).into());
        }

        response
            .headers()
            .get("x-restli-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                PublishError::Api("response missing x-restli-id header".to_string()).into()
            })
    }
}
