//! postrunner-cron - Trigger server for scheduled post dispatch
//!
//! Serves the HTTP endpoint an external cron service hits to run a dispatch
//! pass, or runs a single pass directly with --once.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use libpostrunner::logging::{LogFormat, LoggingConfig};
use libpostrunner::{Config, Database, DispatchCoordinator, PublisherRegistry, Result};
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "postrunner-cron")]
#[command(version)]
#[command(about = "Trigger server for scheduled post dispatch")]
#[command(long_about = "\
postrunner-cron - Trigger server for scheduled post dispatch

DESCRIPTION:
    postrunner-cron exposes the endpoint an external scheduler (cron,
    systemd timer, hosted cron service) calls to process due posts. Each
    call polls the queue for posts whose scheduled time has arrived,
    publishes them to their platforms, and records the outcome.

    Overlapping calls are safe; conditional status updates in the store
    ensure each post's outcome is recorded exactly once.

USAGE:
    # Serve the trigger endpoint (default)
    postrunner-cron

    # Bind somewhere else
    postrunner-cron --bind 0.0.0.0:9000

    # Run one dispatch pass and exit
    postrunner-cron --once

ENDPOINTS:
    GET /scheduled-posts/process - run a dispatch pass
    GET /health                  - liveness probe

    When [server] cron_secret is set in the config, the process endpoint
    requires 'Authorization: Bearer <secret>'.

SIGNALS:
    SIGTERM, SIGINT - Graceful shutdown (in-flight pass completes)

CONFIGURATION:
    Configuration file: ~/.config/postrunner/config.toml
    Database location:  ~/.local/share/postrunner/posts.db

    [scheduler]
    lookback_secs = 3600        # how stale a due post may be
    batch_limit = 50            # posts per pass
    publish_timeout_secs = 30   # per-publish upper bound

    [server]
    bind = \"127.0.0.1:8787\"
    cron_secret = \"...\"         # optional bearer secret

EXIT CODES:
    0 - Clean shutdown
    1 - Runtime error
    2 - Configuration error
")]
struct Cli {
    /// Bind address for the trigger server (overrides config)
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Run one dispatch pass and exit instead of serving
    #[arg(long)]
    once: bool,
}

#[derive(Clone)]
struct AppState {
    coordinator: Arc<DispatchCoordinator>,
    cron_secret: Option<String>,
}

#[derive(Serialize)]
struct ProcessResponse {
    success: bool,
    processed: u32,
    succeeded: u32,
    failed: u32,
    errors: Vec<String>,
    timestamp: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("postrunner-cron failed: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let db = Database::new(&config.database.path).await?;
    let registry = PublisherRegistry::with_default_publishers(Duration::from_secs(
        config.scheduler.publish_timeout_secs,
    ));
    let coordinator = Arc::new(DispatchCoordinator::new(db, registry, &config.scheduler));

    info!("postrunner-cron starting");

    if cli.once {
        let result = coordinator.run_once().await?;
        info!(
            processed = result.processed,
            succeeded = result.succeeded,
            failed = result.failed,
            "one-shot dispatch complete, exiting"
        );
        return Ok(());
    }

    let bind = cli.bind.unwrap_or_else(|| config.server.bind.clone());
    let state = AppState {
        coordinator,
        cron_secret: config.server.cron_secret.clone(),
    };

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .map_err(|e| libpostrunner::PostrunnerError::InvalidInput(format!(
            "cannot bind {}: {}",
            bind, e
        )))?;
    info!("listening on {}", bind);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| libpostrunner::PostrunnerError::InvalidInput(format!("server error: {}", e)))?;

    info!("postrunner-cron stopped");
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/scheduled-posts/process", get(process_scheduled))
        .route("/health", get(health))
        .with_state(state)
}

async fn process_scheduled(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(secret) = &state.cron_secret {
        let authorized = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == secret);
        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "unauthorized" })),
            )
                .into_response();
        }
    }

    match state.coordinator.run_once().await {
        Ok(result) => (
            StatusCode::OK,
            Json(ProcessResponse {
                success: true,
                processed: result.processed,
                succeeded: result.succeeded,
                failed: result.failed,
                errors: result.errors,
                timestamp: chrono::Utc::now().to_rfc3339(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("dispatch pass failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

fn init_logging(verbose: bool) {
    let format = std::env::var("POSTRUNNER_LOG_FORMAT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(LogFormat::Text);
    let level = if verbose {
        "debug".to_string()
    } else {
        std::env::var("POSTRUNNER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
    };
    LoggingConfig::new(format, level, verbose).init();
}

/// Resolve when SIGINT or SIGTERM arrives. Bridged from a signal-hook
/// iterator thread so axum can drain in-flight requests before exiting.
async fn shutdown_signal() {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    std::thread::spawn(move || {
        let mut signals = match Signals::new([SIGINT, SIGTERM]) {
            Ok(signals) => signals,
            Err(e) => {
                error!("signal setup failed: {}", e);
                return;
            }
        };
        if signals.forever().next().is_some() {
            info!("received shutdown signal, stopping gracefully");
            let _ = tx.send(());
        }
    });
    let _ = rx.await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use libpostrunner::publisher::mock::MockPublisher;
    use libpostrunner::{Connection, Platform, PostStatus, ScheduledPost, SchedulerConfig};

    async fn state_with(secret: Option<&str>, due_posts: usize) -> AppState {
        let db = Database::new(":memory:").await.unwrap();
        db.upsert_connection(&Connection {
            id: None,
            user_id: "user-1".to_string(),
            platform: Platform::Twitter,
            access_token: "tok".to_string(),
            active: true,
        })
        .await
        .unwrap();

        let now = chrono::Utc::now().timestamp();
        for i in 0..due_posts {
            let mut post = ScheduledPost::new(
                "user-1",
                Platform::Twitter,
                &format!("post {}", i),
                now - 10,
            );
            post.status = PostStatus::Scheduled;
            db.create_post(&post).await.unwrap();
        }

        let mut registry = PublisherRegistry::new(Duration::from_secs(5));
        registry.register(Box::new(MockPublisher::success(Platform::Twitter)));
        let coordinator = Arc::new(DispatchCoordinator::new(
            db,
            registry,
            &SchedulerConfig::default(),
        ));
        AppState {
            coordinator,
            cron_secret: secret.map(str::to_string),
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_process_without_secret_is_open() {
        let state = state_with(None, 2).await;
        let response = process_scheduled(State(state), HeaderMap::new()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["processed"], 2);
        assert_eq!(body["succeeded"], 2);
        assert_eq!(body["failed"], 0);
    }

    #[tokio::test]
    async fn test_process_rejects_missing_token() {
        let state = state_with(Some("s3cret"), 1).await;
        let response = process_scheduled(State(state), HeaderMap::new()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_process_rejects_wrong_token() {
        let state = state_with(Some("s3cret"), 1).await;
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer nope".parse().unwrap());
        let response = process_scheduled(State(state), headers).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_process_accepts_correct_token() {
        let state = state_with(Some("s3cret"), 1).await;
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer s3cret".parse().unwrap());
        let response = process_scheduled(State(state), headers).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["processed"], 1);
    }

    #[tokio::test]
    async fn test_process_empty_queue() {
        let state = state_with(None, 0).await;
        let response = process_scheduled(State(state), HeaderMap::new()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["processed"], 0);
        assert_eq!(body["errors"], json!([]));
    }

    #[tokio::test]
    async fn test_health() {
        let response = health().await;
        assert_eq!(response.0["status"], "ok");
    }
}
