//! Core types for Postrunner

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Social platform a post is delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Twitter,
    Linkedin,
    Tiktok,
    Youtube,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Twitter => "twitter",
            Platform::Linkedin => "linkedin",
            Platform::Tiktok => "tiktok",
            Platform::Youtube => "youtube",
        }
    }

    /// All platforms the dispatch registry knows about.
    pub fn all() -> &'static [Platform] {
        &[
            Platform::Instagram,
            Platform::Twitter,
            Platform::Linkedin,
            Platform::Tiktok,
            Platform::Youtube,
        ]
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "instagram" => Ok(Platform::Instagram),
            "twitter" | "x" => Ok(Platform::Twitter),
            "linkedin" => Ok(Platform::Linkedin),
            "tiktok" => Ok(Platform::Tiktok),
            "youtube" => Ok(Platform::Youtube),
            _ => Err(format!(
                "Unknown platform: '{}'. Valid options: instagram, twitter, linkedin, tiktok, youtube",
                s
            )),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle state of a scheduled post.
///
/// Posts enter the scheduler as `Scheduled`; `Published` and `Failed` are
/// terminal for a delivery attempt. There is deliberately no in-flight
/// state: the conditional write out of `Scheduled` is the only claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Scheduled,
    Published,
    Failed,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Scheduled => "scheduled",
            PostStatus::Published => "published",
            PostStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> PostStatus {
        match s {
            "draft" => PostStatus::Draft,
            "published" => PostStatus::Published,
            "failed" => PostStatus::Failed,
            _ => PostStatus::Scheduled,
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The unit of work: one post bound for one platform at one time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledPost {
    pub id: String,
    pub user_id: String,
    pub platform: Platform,
    pub content: String,
    /// Ordered media references, possibly empty.
    pub media_urls: Vec<String>,
    /// Earliest time delivery may occur (unix seconds).
    pub scheduled_at: i64,
    pub status: PostStatus,
    /// Platform's identifier for the created post; set on success.
    pub platform_post_id: Option<String>,
    pub published_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ScheduledPost {
    /// Create a new post scheduled for `scheduled_at`.
    pub fn new(user_id: &str, platform: Platform, content: &str, scheduled_at: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            platform,
            content: content.to_string(),
            media_urls: Vec::new(),
            scheduled_at,
            status: PostStatus::Scheduled,
            platform_post_id: None,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_media(mut self, media_urls: Vec<String>) -> Self {
        self.media_urls = media_urls;
        self
    }
}

/// What a publisher actually sends: the post minus its bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishPayload {
    pub content: String,
    pub media_urls: Vec<String>,
    pub scheduled_at: i64,
}

impl From<&ScheduledPost> for PublishPayload {
    fn from(post: &ScheduledPost) -> Self {
        Self {
            content: post.content.clone(),
            media_urls: post.media_urls.clone(),
            scheduled_at: post.scheduled_at,
        }
    }
}

/// Normalized result of a single publish attempt.
///
/// Ephemeral: folded into the post row on write-back, never stored as its
/// own entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub success: bool,
    pub platform_post_id: Option<String>,
    pub error: Option<String>,
}

impl DeliveryOutcome {
    pub fn success(platform_post_id: String) -> Self {
        Self {
            success: true,
            platform_post_id: Some(platform_post_id),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            platform_post_id: None,
            error: Some(error.into()),
        }
    }
}

/// A user's stored credentials for one platform.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: Option<i64>,
    pub user_id: String,
    pub platform: Platform,
    pub access_token: String,
    pub active: bool,
}
