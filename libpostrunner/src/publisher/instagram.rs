//! Instagram publisher using the Graph API
//!
//! Instagram publishing is a two-step flow: create a media container, then
//! publish it. Both steps happen inside a single `publish` call, so the
//! dispatch layer still sees one attempt.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{PublishError, Result};
use crate::types::{Platform, PublishPayload};

use super::{api_error, transport_error, Publisher};

const DEFAULT_API_BASE: &str = "https://graph.instagram.com";
const CAPTION_LIMIT: usize = 2200;

pub struct InstagramPublisher {
    client: reqwest::Client,
    api_base: String,
}

#[derive(Deserialize)]
struct IdResponse {
    id: String,
}

impl InstagramPublisher {
    pub fn new() -> Self {
        Self::with_api_base(DEFAULT_API_BASE)
    }

    pub fn with_api_base(api_base: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    async fn create_container(
        &self,
        access_token: &str,
        payload: &PublishPayload,
    ) -> Result<String> {
        let mut params = vec![("caption", payload.content.clone())];
        if let Some(url) = payload.media_urls.first() {
            params.push(("image_url", url.clone()));
        }
        params.push(("access_token", access_token.to_string()));

        let url = format!("{}/me/media", self.api_base);
        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body).into());
        }

        let container: IdResponse = response
            .json()
            .await
            .map_err(|e| PublishError::Api(format!("unexpected container response: {}", e)))?;
        Ok(container.id)
    }

    async fn publish_container(&self, access_token: &str, container_id: &str) -> Result<String> {
        let url = format!("{}/me/media_publish", self.api_base);
        let response = self
            .client
            .post(&url)
            .form(&[
                ("creation_id", container_id),
                ("access_token", access_token),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body).into());
        }

        let media: IdResponse = response
            .json()
            .await
            .map_err(|e| PublishError::Api(format!("unexpected publish response: {}", e)))?;
        Ok(media.id)
    }
}

impl Default for InstagramPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Publisher for InstagramPublisher {
    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    fn character_limit(&self) -> Option<usize> {
        Some(CAPTION_LIMIT)
    }

    async fn publish(&self, access_token: &str, payload: &PublishPayload) -> Result<String> {
        let container_id = self.create_container(access_token, payload).await?;
        debug!(container_id, "created media container");
        self.publish_container(access_token, &container_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn payload(content: &str) -> PublishPayload {
        PublishPayload {
            content: content.to_string(),
            media_urls: vec!["https://example.com/photo.jpg".to_string()],
            scheduled_at: 0,
        }
    }

    #[tokio::test]
    async fn test_publish_runs_container_then_publish() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/me/media"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "container-1" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/me/media_publish"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "media-99" })))
            .expect(1)
            .mount(&server)
            .await;

        let publisher = InstagramPublisher::with_api_base(&server.uri());
        let id = publisher.publish("tok", &payload("caption")).await.unwrap();
        assert_eq!(id, "media-99");
    }

    #[tokio::test]
    async fn test_container_failure_skips_publish_step() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/me/media"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad image_url"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/me/media_publish"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "media-99" })))
            .expect(0)
            .mount(&server)
            .await;

        let publisher = InstagramPublisher::with_api_base(&server.uri());
        let err = publisher.publish("tok", &payload("caption")).await.unwrap_err();
        assert!(err.to_string().contains("bad image_url"));
    }

    #[test]
    fn test_caption_limit() {
        let publisher = InstagramPublisher::new();
        assert!(publisher.validate_content(&"x".repeat(2200)).is_ok());
        assert!(publisher.validate_content(&"x".repeat(2201)).is_err());
    }
}
