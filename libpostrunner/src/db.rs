//! Database operations for Postrunner
//!
//! The posts table is the single shared mutable resource of the scheduler.
//! Transitions out of `scheduled` go through conditional updates
//! (`WHERE id = ? AND status = 'scheduled'`) so that overlapping dispatch
//! passes cannot clobber a terminal state; the guard is the whole of the
//! subsystem's concurrency control.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;

use crate::error::{DbError, Result};
use crate::types::{Connection, Platform, PostStatus, ScheduledPost};

/// Per-status row counts, for the queue CLI.
#[derive(Debug, Clone, Default)]
pub struct QueueStats {
    pub draft: i64,
    pub scheduled: i64,
    pub published: i64,
    pub failed: i64,
}

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if necessary) the database at `db_path` and run
    /// migrations. `:memory:` opens an in-memory database for tests.
    pub async fn new(db_path: &str) -> Result<Self> {
        let pool = if db_path == ":memory:" {
            // In-memory sqlite exists per connection, so the pool must hold
            // exactly one connection and never recycle it.
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect("sqlite::memory:")
                .await
                .map_err(DbError::SqlxError)?
        } else {
            let expanded_path = shellexpand::tilde(db_path).to_string();
            let path = Path::new(&expanded_path);

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(DbError::IoError)?;
            }

            // Forward slashes for the SQLite URL; mode=rwc creates the file.
            let db_url = format!("sqlite://{}?mode=rwc", expanded_path.replace('\\', "/"));

            SqlitePool::connect(&db_url)
                .await
                .map_err(DbError::SqlxError)?
        };

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(DbError::MigrationError)?;

        Ok(Self { pool })
    }

    /// Insert a new post.
    pub async fn create_post(&self, post: &ScheduledPost) -> Result<()> {
        let media_urls = serde_json::to_string(&post.media_urls)
            .map_err(|e| crate::error::PostrunnerError::InvalidInput(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO posts (id, user_id, platform, content, media_urls,
                               scheduled_at, status, platform_post_id,
                               published_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.id)
        .bind(&post.user_id)
        .bind(post.platform.as_str())
        .bind(&post.content)
        .bind(media_urls)
        .bind(post.scheduled_at)
        .bind(post.status.as_str())
        .bind(&post.platform_post_id)
        .bind(post.published_at)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// Get a post by ID.
    pub async fn get_post(&self, post_id: &str) -> Result<Option<ScheduledPost>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, platform, content, media_urls, scheduled_at,
                   status, platform_post_id, published_at, created_at, updated_at
            FROM posts WHERE id = ?
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        row.map(post_from_row).transpose()
    }

    /// Select the batch of due posts: still `scheduled`, past due, and not
    /// older than the lookback window. Pure read; no claim is taken here.
    /// Ordered earliest-due-first, capped at `limit`.
    pub async fn select_due_posts(
        &self,
        now: i64,
        lookback_secs: i64,
        limit: i64,
    ) -> Result<Vec<ScheduledPost>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, platform, content, media_urls, scheduled_at,
                   status, platform_post_id, published_at, created_at, updated_at
            FROM posts
            WHERE status = 'scheduled'
              AND scheduled_at <= ?
              AND scheduled_at >= ?
            ORDER BY scheduled_at ASC
            LIMIT ?
            "#,
        )
        .bind(now)
        .bind(now - lookback_secs)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        rows.into_iter().map(post_from_row).collect()
    }

    /// Transition `scheduled -> published`, recording the platform's post id
    /// and the publish time. Returns `true` if this call won the transition;
    /// `false` means the row was no longer `scheduled` (already moved by a
    /// concurrent pass) and nothing was written.
    pub async fn mark_published(
        &self,
        post_id: &str,
        platform_post_id: &str,
        now: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET status = 'published', platform_post_id = ?, published_at = ?,
                updated_at = ?
            WHERE id = ? AND status = 'scheduled'
            "#,
        )
        .bind(platform_post_id)
        .bind(now)
        .bind(now)
        .bind(post_id)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected() == 1)
    }

    /// Transition `scheduled -> failed`. Same conditional guard as
    /// `mark_published`: a second call for the same outcome is a no-op that
    /// returns `false` without error.
    pub async fn mark_failed(&self, post_id: &str, now: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET status = 'failed', updated_at = ?
            WHERE id = ? AND status = 'scheduled'
            "#,
        )
        .bind(now)
        .bind(post_id)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected() == 1)
    }

    /// Revert a not-yet-delivered post to draft. Only allowed while the post
    /// is still `scheduled`; returns `false` if delivery already claimed it.
    pub async fn cancel_post(&self, post_id: &str, now: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET status = 'draft', updated_at = ?
            WHERE id = ? AND status = 'scheduled'
            "#,
        )
        .bind(now)
        .bind(post_id)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected() == 1)
    }

    /// All posts currently waiting in the queue, earliest first.
    pub async fn get_scheduled_posts(&self) -> Result<Vec<ScheduledPost>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, platform, content, media_urls, scheduled_at,
                   status, platform_post_id, published_at, created_at, updated_at
            FROM posts
            WHERE status = 'scheduled'
            ORDER BY scheduled_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        rows.into_iter().map(post_from_row).collect()
    }

    /// Per-status counts.
    pub async fn queue_stats(&self) -> Result<QueueStats> {
        let rows = sqlx::query("SELECT status, COUNT(*) AS n FROM posts GROUP BY status")
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        let mut stats = QueueStats::default();
        for row in rows {
            let status: String = row.get("status");
            let n: i64 = row.get("n");
            match status.as_str() {
                "draft" => stats.draft = n,
                "scheduled" => stats.scheduled = n,
                "published" => stats.published = n,
                "failed" => stats.failed = n,
                _ => {}
            }
        }
        Ok(stats)
    }

    /// Look up a user's connection for a platform.
    pub async fn get_connection(
        &self,
        user_id: &str,
        platform: Platform,
    ) -> Result<Option<Connection>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, platform, access_token, active
            FROM connections
            WHERE user_id = ? AND platform = ?
            "#,
        )
        .bind(user_id)
        .bind(platform.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(row.map(|r| Connection {
            id: r.get("id"),
            user_id: r.get("user_id"),
            platform,
            access_token: r.get("access_token"),
            active: r.get::<i64, _>("active") != 0,
        }))
    }

    /// Insert or replace a user's connection for a platform.
    pub async fn upsert_connection(&self, conn: &Connection) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO connections (user_id, platform, access_token, active)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (user_id, platform)
            DO UPDATE SET access_token = excluded.access_token,
                          active = excluded.active
            "#,
        )
        .bind(&conn.user_id)
        .bind(conn.platform.as_str())
        .bind(&conn.access_token)
        .bind(if conn.active { 1 } else { 0 })
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }
}

fn post_from_row(row: sqlx::sqlite::SqliteRow) -> Result<ScheduledPost> {
    let platform_str: String = row.get("platform");
    let platform = platform_str
        .parse::<Platform>()
        .map_err(crate::error::PostrunnerError::InvalidInput)?;

    let media_urls: String = row.get("media_urls");
    let media_urls: Vec<String> = serde_json::from_str(&media_urls).unwrap_or_default();

    Ok(ScheduledPost {
        id: row.get("id"),
        user_id: row.get("user_id"),
        platform,
        content: row.get("content"),
        media_urls,
        scheduled_at: row.get("scheduled_at"),
        status: PostStatus::parse(&row.get::<String, _>("status")),
        platform_post_id: row.get("platform_post_id"),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
