//! Error types for Postrunner

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PostrunnerError>;

#[derive(Error, Debug)]
pub enum PostrunnerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl PostrunnerError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            PostrunnerError::InvalidInput(_) => 3,
            PostrunnerError::Config(_) => 2,
            PostrunnerError::Database(_) => 1,
            PostrunnerError::Publish(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors raised by platform publishers.
///
/// Ordinary platform-API failures (rate limits, expired tokens, rejected
/// content) are folded into a `DeliveryOutcome` by the registry and never
/// surface as `Err` from a dispatch pass. These variants exist for the
/// adapters themselves and for callers that talk to a publisher directly.
#[derive(Error, Debug, Clone)]
pub enum PublishError {
    #[error("Not connected: {0}")]
    NotConnected(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Content validation failed: {0}")]
    Validation(String),

    #[error("Publish call failed: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Publish call timed out after {0}s")]
    Timeout(u64),

    #[error("Platform not supported: {0}")]
    Unsupported(String),
}
