#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

//! Native directory watch engine
//!
//! Watches directories for filesystem changes (create, delete, rename,
//! modify) and delivers a normalized, ordered event stream to a single
//! registered consumer:
//!
//! - One dedicated worker thread per watch, blocking on its own kernel
//!   notification descriptor
//! - Raw notification buffers decoded through a bounds-checked cursor
//! - Per-watch event order preserved exactly; renames delivered as
//!   separate from/to events in arrival order
//! - Cancel-and-drain teardown: once `remove_watch` returns, no further
//!   events for that watch reach the consumer
//! - Kernel queue overflow surfaced as a dedicated signal, not silence
//!
//! # Example
//!
//! ```no_run
//! use dirwatch_engine::{Engine, EventSink, FilterMask, WatchEvent, WatchId};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl EventSink for Printer {
//!     fn on_event(&self, watch: WatchId, event: &WatchEvent) {
//!         println!("[{watch}] {event:?}");
//!     }
//! }
//!
//! # fn main() -> dirwatch_engine::Result<()> {
//! let engine = Engine::new(Arc::new(Printer));
//! let id = engine.add_watch("/tmp", FilterMask::all(), true)?;
//! // ... events arrive on the watch's worker thread ...
//! engine.remove_watch(id);
//! # Ok(())
//! # }
//! ```

// Private implementation modules
mod bridge;
mod engine;
mod entry;
mod errdesc;
mod platform;
mod table;
mod translate;
mod worker;

// Process-wide facade
pub mod global;

// Public exports - minimal API surface
pub use engine::{Engine, InitState};
pub use errdesc::describe_error;

// Re-exported so consumers need only this crate
pub use dirwatch_core::{
    ChangeKind, EngineConfig, Error, EventSink, FilterMask, Result, WatchEvent, WatchId,
};
