//! Integration tests for `postrunner-queue list`

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
        "[database]\npath = \"{}\"\n",
        db_path.display().to_string().replace('\\', "/")
    );
    fs::write(&config_path, config_content).unwrap();

    let _db = Database::new(db_path.to_str().unwrap()).await.unwrap();

    (
        temp_dir,
        config_path.to_str().unwrap().to_string(),
        db_path.to_str().unwrap().to_string(),
    )
}

async fn create_scheduled_post(db_path: &str, platform: Platform, content: &str) -> String {
    let db = Database::new(db_path).await.unwrap();
    let now = chrono::Utc::now().timestamp();

    let mut post = ScheduledPost::new("user-1", platform, content, now + 3600);
    post.status = PostStatus::Scheduled;
    let post_id = post.id.clone();
    db.create_post(&post).await.unwrap();
    post_id
}

#[tokio::test]
async fn test_list_empty_queue() {
    let (_temp_dir, config_path, _db_path) = setup_test_env().await;

    let mut cmd = Command::cargo_bin("postrunner-queue").unwrap();
    cmd.env("POSTRUNNER_CONFIG", &config_path)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[tokio::test]
async fn test_list_shows_scheduled_posts() {
    let (_temp_dir, config_path, db_path) = setup_test_env().await;
    let post_id = create_scheduled_post(&db_path, Platform::Twitter, "upcoming post").await;

    let mut cmd = Command::cargo_bin("postrunner-queue").unwrap();
    cmd.env("POSTRUNNER_CONFIG", &config_path)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains(&post_id))
        .stdout(predicate::str::contains("upcoming post"))
        .stdout(predicate::str::contains("in 1 hour").or(predicate::str::contains("in 59 minute")));
}

#[tokio::test]
async fn test_list_json_format() {
    let (_temp_dir, config_path, db_path) = setup_test_env().await;
    let post_id = create_scheduled_post(&db_path, Platform::Instagram, "json post").await;

    let output = Command::cargo_bin("postrunner-queue")
        .unwrap()
        .env("POSTRUNNER_CONFIG", &config_path)
        .arg("list")
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let posts = parsed.as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["id"], post_id);
    assert_eq!(posts[0]["platform"], "instagram");
    assert_eq!(posts[0]["status"], "scheduled");
}

#[tokio::test]
async fn test_list_platform_filter() {
    let (_temp_dir, config_path, db_path) = setup_test_env().await;
    create_scheduled_post(&db_path, Platform::Twitter, "tweet").await;
    create_scheduled_post(&db_path, Platform::Linkedin, "article").await;

    let mut cmd = Command::cargo_bin("postrunner-queue").unwrap();
    cmd.env("POSTRUNNER_CONFIG", &config_path)
        .arg("list")
        .arg("--platform")
        .arg("linkedin")
        .assert()
        .success()
        .stdout(predicate::str::contains("article"))
        .stdout(predicate::str::contains("tweet").not());
}

#[tokio::test]
async fn test_list_rejects_unknown_platform() {
    let (_temp_dir, config_path, _db_path) = setup_test_env().await;

    let mut cmd = Command::cargo_bin("postrunner-queue").unwrap();
    cmd.env("POSTRUNNER_CONFIG", &config_path)
        .arg("list")
        .arg("--platform")
        .arg("myspace")
        .assert()
        .failure()
        .code(3);
}

#[tokio::test]
async fn test_list_rejects_unknown_format() {
    let (_temp_dir, config_path, _db_path) = setup_test_env().await;

    let mut cmd = Command::cargo_bin("postrunner-queue").unwrap();
    cmd.env("POSTRUNNER_CONFIG", &config_path)
        .arg("list")
        .arg("--format")
        .arg("yaml")
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("Invalid format"));
}
