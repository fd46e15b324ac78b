//! Twitter/X publisher using the v2 API

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{PublishError, Result};
use crate::types::{Platform, PublishPayload};

use super::{api_error, transport_error, Publisher};

const DEFAULT_API_BASE: &str = "https://api.twitter.com";
const CHARACTER_LIMIT: usize = 280;

pub struct TwitterPublisher {
    client: reqwest::Client,
    api_base: String,
}

#[derive(Deserialize)]
struct TweetResponse {
    data: TweetData,
}

#[derive(Deserialize)]
struct TweetData {
    id: String,
}

impl TwitterPublisher {
    pub fn new() -> Self {
        Self::with_api_base(DEFAULT_API_BASE)
    }

    /// Point the adapter at a different API host. Used by tests.
    pub fn with_api_base(api_base: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for TwitterPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Publisher for TwitterPublisher {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    fn character_limit(&self) -> Option<usize> {
        Some(CHARACTER_LIMIT)
    }

    async fn publish(&self, access_token: &str, payload: &PublishPayload) -> Result<String> {
        let url = format!("{}/2/tweets", self.api_base);
        debug!(%url, "posting tweet");

        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .json(&json!({ "text": payload.content }))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body).into());
        }

        let tweet: TweetResponse = response
            .json()
            .await
            .map_err(|e| PublishError::Api(format!("unexpected response body: {}", e)))?;

        Ok(tweet.data.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{bearer_token, body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn payload(content: &str) -> PublishPayload {
        PublishPayload {
            content: content.to_string(),
            media_urls: vec![],
            scheduled_at: 0,
        }
    }

    #[tokio::test]
    async fn test_publish_returns_tweet_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .and(bearer_token("tok"))
            .and(body_json(json!({ "text": "hello world" })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({ "data": { "id": "1234567890" } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let publisher = TwitterPublisher::with_api_base(&server.uri());
        let id = publisher.publish("tok", &payload("hello world")).await.unwrap();
        assert_eq!(id, "1234567890");
    }

    #[tokio::test]
    async fn test_publish_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
            .mount(&server)
            .await;

        let publisher = TwitterPublisher::with_api_base(&server.uri());
        let err = publisher.publish("tok", &payload("hello")).await.unwrap_err();
        assert!(err.to_string().contains("Rate limit"));
    }

    #[tokio::test]
    async fn test_publish_expired_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let publisher = TwitterPublisher::with_api_base(&server.uri());
        let err = publisher.publish("expired", &payload("hello")).await.unwrap_err();
        assert!(err.to_string().contains("Authentication"));
    }

    #[test]
    fn test_character_limit() {
        let publisher = TwitterPublisher::new();
        assert_eq!(publisher.character_limit(), Some(280));
        assert!(publisher.validate_content(&"x".repeat(280)).is_ok());
        assert!(publisher.validate_content(&"x".repeat(281)).is_err());
    }
}
