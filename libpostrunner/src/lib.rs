//! Core library for Postrunner
//!
//! Postrunner delivers scheduled social posts. The pieces:
//!
//! - [`db`]: sqlite-backed post state store with conditional status updates
//! - [`scheduler`]: due-post polling and batch dispatch
//! - [`publisher`]: per-platform publishing adapters behind a registry
//! - [`config`]: TOML configuration with XDG path resolution
//!
//! Overlapping dispatch passes are expected and safe: the store's
//! conditional updates guarantee at most one recorded outcome per post,
//! while delivery itself is at-least-once.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod publisher;
pub mod scheduler;
pub mod types;

pub use config::{Config, SchedulerConfig, ServerConfig};
pub use db::{Database, QueueStats};
pub use error::{PostrunnerError, PublishError, Result};
pub use publisher::{Publisher, PublisherRegistry};
pub use scheduler::{BatchResult, DispatchCoordinator, Poller};
pub use types::{
    Connection, DeliveryOutcome, Platform, PostStatus, PublishPayload, ScheduledPost,
};
