//! Due-post selection
//!
//! The poller is a pure read: it never mutates post state, so any number of
//! concurrent invocations may see the same due posts. The dispatch layer's
//! conditional updates decide which invocation actually delivers each one.

use tracing::debug;

use crate::db::Database;
use crate::error::Result;
use crate::types::ScheduledPost;

/// Selects posts whose scheduled time has arrived.
pub struct Poller {
    db: Database,
    /// How far behind `now` a post may be and still get picked up, seconds.
    lookback_secs: i64,
    /// Maximum posts returned per poll.
    limit: i64,
}

impl Poller {
    pub fn new(db: Database, lookback_secs: i64, limit: i64) -> Self {
        Self {
            db,
            lookback_secs,
            limit,
        }
    }

    /// Posts with `status = scheduled` and `scheduled_at` inside the window
    /// `[now - lookback, now]`, oldest first. Posts older than the window are
    /// deliberately left alone; publishing something hours late is worse than
    /// not publishing it.
    pub async fn poll(&self, now: i64) -> Result<Vec<ScheduledPost>> {
        let posts = self
            .db
            .select_due_posts(now, self.lookback_secs, self.limit)
            .await?;
        debug!(due = posts.len(), now, "polled for due posts");
        Ok(posts)
    }
}
