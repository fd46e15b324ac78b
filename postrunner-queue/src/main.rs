//! postrunner-queue - Manage scheduled posts
//!
//! Unix-style tool for inspecting and managing the scheduled post queue.

use clap::{Parser, Subcommand};
use libpostrunner::{Config, Database, Platform, PostrunnerError, Result, ScheduledPost};

#[derive(Parser, Debug)]
#[command(name = "postrunner-queue")]
#[command(version)]
#[command(about = "Manage scheduled posts")]
#[command(long_about = "\
postrunner-queue - Manage scheduled posts

DESCRIPTION:
    postrunner-queue is a Unix-style tool for inspecting the scheduled
    post queue. Use it to list upcoming posts, cancel one before the
    dispatcher picks it up, or view per-status counts.

COMMANDS:
    list        List scheduled posts
    cancel      Cancel a scheduled post (back to draft)
    stats       Show per-status queue counts

USAGE EXAMPLES:
    # List all scheduled posts
    postrunner-queue list

    # List posts in JSON format
    postrunner-queue list --format json

    # Only posts targeting one platform
    postrunner-queue list --platform twitter

    # Cancel a specific post
    postrunner-queue cancel <POST_ID>

    # View queue statistics
    postrunner-queue stats

CONFIGURATION:
    Configuration file: ~/.config/postrunner/config.toml
    Database location:  ~/.local/share/postrunner/posts.db

    Override with environment variables:
        POSTRUNNER_CONFIG - Path to config file

EXIT CODES:
    0 - Success
    1 - Operation failed
    2 - Database or configuration error
    3 - Invalid input (bad post ID, unknown platform, etc.)
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List scheduled posts
    List {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Filter by platform
        #[arg(short, long)]
        platform: Option<String>,
    },

    /// Cancel a scheduled post
    Cancel {
        /// Post ID to cancel
        post_id: String,
    },

    /// Show queue statistics
    Stats {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "error" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let db = Database::new(&config.database.path).await?;

    match cli.command {
        Commands::List { format, platform } => {
            cmd_list(&db, &format, platform.as_deref()).await?;
        }
        Commands::Cancel { post_id } => {
            cmd_cancel(&db, &post_id).await?;
        }
        Commands::Stats { format } => {
            cmd_stats(&db, &format).await?;
        }
    }

    Ok(())
}

fn validate_format(format: &str) -> Result<()> {
    if format != "text" && format != "json" {
        return Err(PostrunnerError::InvalidInput(format!(
            "Invalid format '{}'. Must be 'text' or 'json'",
            format
        )));
    }
    Ok(())
}

/// List scheduled posts
async fn cmd_list(db: &Database, format: &str, platform: Option<&str>) -> Result<()> {
    validate_format(format)?;

    let platform_filter = platform
        .map(|p| {
            p.parse::<Platform>()
                .map_err(PostrunnerError::InvalidInput)
        })
        .transpose()?;

    let mut posts = db.get_scheduled_posts().await?;
    if let Some(wanted) = platform_filter {
        posts.retain(|p| p.platform == wanted);
    }

    if format == "json" {
        output_list_json(&posts);
    } else {
        output_list_text(&posts);
    }

    Ok(())
}

/// Output posts as JSON
fn output_list_json(posts: &[ScheduledPost]) {
    let json: Vec<serde_json::Value> = posts
        .iter()
        .map(|p| {
            serde_json::json!({
                "id": p.id,
                "user_id": p.user_id,
                "platform": p.platform.as_str(),
                "content": p.content,
                "scheduled_at": p.scheduled_at,
                "status": p.status.as_str(),
            })
        })
        .collect();

    println!(
        "{}",
        serde_json::to_string_pretty(&json).unwrap_or_else(|_| "[]".to_string())
    );
}

/// Output posts as human-readable text
fn output_list_text(posts: &[ScheduledPost]) {
    if posts.is_empty() {
        return;
    }

    let now = chrono::Utc::now().timestamp();

    for post in posts {
        let content_preview = truncate_content(&post.content, 50);
        let time_until = format_time_until(now, post.scheduled_at);
        println!(
            "{} | {} | {} | {}",
            post.id, post.platform, content_preview, time_until
        );
    }
}

/// Truncate content to max length with ellipsis
fn truncate_content(content: &str, max_len: usize) -> String {
    if content.chars().count() <= max_len {
        content.to_string()
    } else {
        let truncated: String = content.chars().take(max_len).collect();
        format!("{}...", truncated)
    }
}

/// Format time until scheduled time in human-readable form
fn format_time_until(now: i64, scheduled_at: i64) -> String {
    let diff = scheduled_at - now;

    if diff < 0 {
        return "overdue".to_string();
    }

    let minutes = diff / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("in {} day{}", days, if days == 1 { "" } else { "s" })
    } else if hours > 0 {
        format!("in {} hour{}", hours, if hours == 1 { "" } else { "s" })
    } else if minutes > 0 {
        format!("in {} minute{}", minutes, if minutes == 1 { "" } else { "s" })
    } else {
        "in <1 minute".to_string()
    }
}

/// Cancel a scheduled post; it goes back to draft
async fn cmd_cancel(db: &Database, post_id: &str) -> Result<()> {
    let post = db.get_post(post_id).await?.ok_or_else(|| {
        PostrunnerError::InvalidInput(format!("No post with ID '{}'", post_id))
    })?;

    let cancelled = db
        .cancel_post(post_id, chrono::Utc::now().timestamp())
        .await?;
    if !cancelled {
        return Err(PostrunnerError::InvalidInput(format!(
            "Post '{}' is not scheduled (status: {})",
            post_id,
            post.status.as_str()
        )));
    }

    println!("Cancelled post {}", post_id);
    Ok(())
}

/// Show queue statistics
async fn cmd_stats(db: &Database, format: &str) -> Result<()> {
    validate_format(format)?;

    let stats = db.queue_stats().await?;

    if format == "json" {
        let json = serde_json::json!({
            "draft": stats.draft,
            "scheduled": stats.scheduled,
            "published": stats.published,
            "failed": stats.failed,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        println!("draft:     {}", stats.draft);
        println!("scheduled: {}", stats.scheduled);
        println!("published: {}", stats.published);
        println!("failed:    {}", stats.failed);
    }

    Ok(())
}
