//! Scheduled post polling and dispatch

pub mod dispatch;
pub mod poller;

pub use dispatch::{BatchResult, DispatchCoordinator};
pub use poller::Poller;
