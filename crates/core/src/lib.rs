#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

//! Core types for the dirwatch directory monitoring engine
//!
//! This crate provides the foundational abstractions shared by the watch
//! engine and its consumers:
//!
//! - **Events**: normalized change events and the consumer sink trait
//! - **Filters**: the per-watch interest mask with its published bit table
//! - **Configuration**: engine tuning knobs
//! - **Error handling**: unified error types

pub mod config;
pub mod error;
pub mod events;
pub mod filter;

// Re-export main types for convenience
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use events::{ChangeKind, EventSink, WatchEvent, WatchId};
pub use filter::FilterMask;

/// Version of the core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::error::{Error, Result};
    pub use crate::events::{ChangeKind, EventSink, WatchEvent, WatchId};
    pub use crate::filter::FilterMask;
}
