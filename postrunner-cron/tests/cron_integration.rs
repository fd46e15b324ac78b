//! Integration tests for the postrunner-cron binary

use assert_cmd::Command;
use libpostrunner::{Database, Platform, PostStatus, ScheduledPost};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

async fn setup_test_env() -> (TempDir, String, String) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    let db_path = temp_dir.path().join("test.db");

    let config_content = format!(
        r#"
[database]
path = "{}"

[scheduler]
lookback_secs = 3600
batch_limit = 10
publish_timeout_secs = 5
"#,
        db_path.display().to_string().replace('\\', "/")
    );
    fs::write(&config_path, config_content).unwrap();

    // Initialize the database file up front
    let _db = Database::new(db_path.to_str().unwrap()).await.unwrap();

    (
        temp_dir,
        config_path.to_str().unwrap().to_string(),
        db_path.to_str().unwrap().to_string(),
    )
}

/// A due post with no platform connection; dispatch marks it failed
/// without any network traffic.
async fn create_due_post(db_path: &str) -> String {
    let db = Database::new(db_path).await.unwrap();
    let now = chrono::Utc::now().timestamp();

    let mut post = ScheduledPost::new("user-1", Platform::Twitter, "due post", now - 10);
    post.status = PostStatus::Scheduled;
    let post_id = post.id.clone();
    db.create_post(&post).await.unwrap();
    post_id
}

#[tokio::test]
async fn test_once_exits_cleanly_on_empty_queue() {
    let (_temp_dir, config_path, _db_path) = setup_test_env().await;

    let mut cmd = Command::cargo_bin("postrunner-cron").unwrap();
    cmd.env("POSTRUNNER_CONFIG", &config_path)
        .arg("--once")
        .assert()
        .success()
        .stderr(predicate::str::contains("postrunner-cron starting"))
        .stderr(predicate::str::contains("one-shot dispatch complete"));
}

#[tokio::test]
async fn test_once_processes_due_post() {
    let (_temp_dir, config_path, db_path) = setup_test_env().await;
    let post_id = create_due_post(&db_path).await;

    let mut cmd = Command::cargo_bin("postrunner-cron").unwrap();
    cmd.env("POSTRUNNER_CONFIG", &config_path)
        .arg("--once")
        .assert()
        .success()
        .stderr(predicate::str::contains("post failed"));

    // Unconnected platform means the post lands in failed, not scheduled
    let db = Database::new(&db_path).await.unwrap();
    let stored = db.get_post(&post_id).await.unwrap().unwrap();
    assert_eq!(stored.status, PostStatus::Failed);
}

#[tokio::test]
async fn test_invalid_config_fails() {
    let temp_dir = TempDir::new().unwrap();
    let invalid_config = temp_dir.path().join("invalid.toml");
    fs::write(&invalid_config, "invalid toml content [[[").unwrap();

    let mut cmd = Command::cargo_bin("postrunner-cron").unwrap();
    cmd.env("POSTRUNNER_CONFIG", invalid_config.to_str().unwrap())
        .arg("--once")
        .assert()
        .failure()
        .code(2);
}

#[tokio::test]
async fn test_missing_config_fails() {
    let temp_dir = TempDir::new().unwrap();
    let nonexistent = temp_dir.path().join("nonexistent.toml");

    let mut cmd = Command::cargo_bin("postrunner-cron").unwrap();
    cmd.env("POSTRUNNER_CONFIG", nonexistent.to_str().unwrap())
        .arg("--once")
        .assert()
        .failure();
}

#[tokio::test]
async fn test_verbose_flag() {
    let (_temp_dir, config_path, _db_path) = setup_test_env().await;

    let mut cmd = Command::cargo_bin("postrunner-cron").unwrap();
    cmd.env("POSTRUNNER_CONFIG", &config_path)
        .arg("--once")
        .arg("--verbose")
        .assert()
        .success();
}
