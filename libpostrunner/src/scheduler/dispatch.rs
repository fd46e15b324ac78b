//! Dispatch coordination
//!
//! A dispatch pass polls for due posts and walks them sequentially. Each
//! post gets one publish attempt; its result is written back with a
//! conditional update so that only one concurrent pass can record the
//! transition. One post failing never stops the rest of the batch.

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::SchedulerConfig;
use crate::db::Database;
use crate::error::Result;
use crate::publisher::PublisherRegistry;
use crate::scheduler::Poller;
use crate::types::{PublishPayload, ScheduledPost};

/// Summary of one dispatch pass.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BatchResult {
    /// Posts the pass attempted, regardless of outcome.
    pub processed: u32,
    pub succeeded: u32,
    pub failed: u32,
    /// One `"{platform}: {message}"` entry per failed post, in batch order.
    pub errors: Vec<String>,
}

impl BatchResult {
    fn empty() -> Self {
        Self {
            processed: 0,
            succeeded: 0,
            failed: 0,
            errors: Vec::new(),
        }
    }
}

/// Runs dispatch passes over due posts.
pub struct DispatchCoordinator {
    db: Database,
    registry: PublisherRegistry,
    poller: Poller,
}

impl DispatchCoordinator {
    pub fn new(db: Database, registry: PublisherRegistry, config: &SchedulerConfig) -> Self {
        let poller = Poller::new(db.clone(), config.lookback_secs, config.batch_limit);
        Self {
            db,
            registry,
            poller,
        }
    }

    /// Poll and process one batch using the current wall clock.
    pub async fn run_once(&self) -> Result<BatchResult> {
        self.run_once_at(Utc::now().timestamp()).await
    }

    /// Poll and process one batch as of `now`.
    pub async fn run_once_at(&self, now: i64) -> Result<BatchResult> {
        let posts = self.poller.poll(now).await?;
        self.process_batch(now, posts).await
    }

    /// Process an already-selected batch.
    ///
    /// Posts are handled strictly in order. Publish failures are folded into
    /// the result; only a state-store write failure aborts the pass, since
    /// continuing without being able to record outcomes would re-deliver
    /// everything on the next pass.
    pub async fn process_batch(
        &self,
        now: i64,
        posts: Vec<ScheduledPost>,
    ) -> Result<BatchResult> {
        let mut result = BatchResult::empty();

        for post in posts {
            result.processed += 1;

            let payload = PublishPayload::from(&post);
            let outcome = self
                .registry
                .publish(&self.db, &post.user_id, post.platform, &payload)
                .await;

            if outcome.success {
                let platform_post_id = outcome.platform_post_id.unwrap_or_default();
                let updated = self
                    .db
                    .mark_published(&post.id, &platform_post_id, now)
                    .await?;
                if !updated {
                    // Another pass already recorded an outcome for this post;
                    // the platform saw our delivery too, so the post may have
                    // gone out more than once.
                    warn!(post_id = %post.id, "lost publish race after delivery");
                }
                result.succeeded += 1;
                info!(post_id = %post.id, platform = %post.platform, platform_post_id, "post published");
            } else {
                let message = outcome.error.unwrap_or_else(|| "unknown error".to_string());
                self.db.mark_failed(&post.id, now).await?;
                result.failed += 1;
                warn!(post_id = %post.id, platform = %post.platform, error = %message, "post failed");
                result.errors.push(format!("{}: {}", post.platform, message));
            }
        }

        if result.processed > 0 {
            info!(
                processed = result.processed,
                succeeded = result.succeeded,
                failed = result.failed,
                "dispatch pass complete"
            );
        }
        Ok(result)
    }
}
