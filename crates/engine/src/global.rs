//! Process-wide engine facade
//!
//! Mirrors the external contract of a single per-process engine: `init`
//! installs the consumer sink and constructs the singleton under one lock,
//! so concurrent first calls are race-free and repeated calls are
//! idempotent. A failed initialization is sticky until [`shutdown`].
//!
//! Library consumers that want isolated instances use [`Engine`] directly;
//! the facade exists for hosts that need exactly one engine per process.

use crate::engine::{Engine, InitState};
use crate::errdesc;
use dirwatch_core::{EngineConfig, Error, EventSink, FilterMask, Result, WatchId};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

enum Slot {
    Empty,
    Failed,
    Ready(Arc<Engine>),
}

static ENGINE: Mutex<Slot> = Mutex::new(Slot::Empty);

/// Initialize the process-wide engine with the default configuration
pub fn init(sink: Arc<dyn EventSink>) -> Result<()> {
    init_with_config(EngineConfig::default(), sink)
}

/// Initialize the process-wide engine
///
/// Idempotent: later calls on an initialized engine succeed without
/// replacing the sink. After a failed initialization the engine is
/// unusable and every call reports the failure.
pub fn init_with_config(config: EngineConfig, sink: Arc<dyn EventSink>) -> Result<()> {
    let mut slot = ENGINE.lock();
    match &*slot {
        Slot::Ready(_) => {
            debug!("engine already initialized");
            Ok(())
        }
        Slot::Failed => Err(Error::initialization("previous initialization failed")),
        Slot::Empty => match Engine::with_config(config, sink) {
            Ok(engine) => {
                *slot = Slot::Ready(Arc::new(engine));
                Ok(())
            }
            Err(err) => {
                *slot = Slot::Failed;
                Err(err)
            }
        },
    }
}

fn engine() -> Result<Arc<Engine>> {
    match &*ENGINE.lock() {
        Slot::Ready(engine) => Ok(Arc::clone(engine)),
        Slot::Failed => Err(Error::initialization("previous initialization failed")),
        Slot::Empty => Err(Error::NotInitialized),
    }
}

/// Add a watch on the process-wide engine
pub fn add_watch(path: impl AsRef<Path>, filter: FilterMask, recursive: bool) -> Result<WatchId> {
    engine()?.add_watch(path, filter, recursive)
}

/// Remove a watch from the process-wide engine; unknown IDs are a no-op
pub fn remove_watch(id: WatchId) {
    match engine() {
        Ok(engine) => engine.remove_watch(id),
        Err(_) => debug!(watch = id, "remove_watch without an engine ignored"),
    }
}

/// Describe an OS error code; usable before `init`
pub fn describe_error(code: i32) -> String {
    errdesc::describe_error(code)
}

/// Lifecycle state of the process-wide engine
pub fn status() -> InitState {
    match &*ENGINE.lock() {
        Slot::Empty => InitState::Uninitialized,
        Slot::Failed => InitState::Failed,
        Slot::Ready(engine) => engine.status(),
    }
}

/// Tear down the process-wide engine, cancelling every live watch
pub fn shutdown() {
    let engine = match std::mem::replace(&mut *ENGINE.lock(), Slot::Empty) {
        Slot::Ready(engine) => Some(engine),
        _ => None,
    };
    // join workers outside the facade lock
    if let Some(engine) = engine {
        engine.shutdown();
    }
}
