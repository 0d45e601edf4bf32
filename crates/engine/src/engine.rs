//! Engine composition root
//!
//! The engine owns the watch table and the callback bridge and mediates
//! every lifecycle transition: watch creation (with rollback on partial
//! failure), cancel-and-drain teardown, and whole-engine shutdown.

use crate::bridge::CallbackBridge;
use crate::entry::{WatchEntry, WatchShared};
use crate::platform::{register_tree, DirectoryHandle};
use crate::table::WatchTable;
use crate::worker::WatchWorker;
use dirwatch_core::{EngineConfig, Error, EventSink, FilterMask, Result, WatchId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{error, info};

/// Process-visible lifecycle of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    /// No engine has been initialized (facade only)
    Uninitialized,
    /// The engine exists; no delivery thread has attached yet
    Initialized,
    /// At least one delivery thread has attached to the consumer runtime
    Attached,
    /// Initialization failed; the engine is unusable (facade only)
    Failed,
}

/// Atomic cell tracking the Initialized -> Attached transition
pub(crate) struct LifecycleCell(AtomicU8);

impl LifecycleCell {
    const INITIALIZED: u8 = 0;
    const ATTACHED: u8 = 1;

    pub fn new() -> Self {
        Self(AtomicU8::new(Self::INITIALIZED))
    }

    pub fn get(&self) -> InitState {
        match self.0.load(Ordering::Acquire) {
            Self::INITIALIZED => InitState::Initialized,
            _ => InitState::Attached,
        }
    }

    /// First attach wins; later calls are no-ops
    pub fn mark_attached(&self) {
        let _ = self.0.compare_exchange(
            Self::INITIALIZED,
            Self::ATTACHED,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}

/// Directory watch engine
///
/// Watches directories for filesystem changes and delivers normalized
/// events to the registered [`EventSink`], in kernel order per watch, on a
/// dedicated thread per watch. Dropping the engine cancels every live
/// watch.
pub struct Engine {
    config: EngineConfig,
    table: Arc<WatchTable>,
    bridge: CallbackBridge,
    lifecycle: Arc<LifecycleCell>,
}

impl Engine {
    /// Create an engine with the default configuration
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self::build(EngineConfig::default(), sink)
    }

    /// Create an engine with a custom, validated configuration
    pub fn with_config(config: EngineConfig, sink: Arc<dyn EventSink>) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, sink))
    }

    fn build(config: EngineConfig, sink: Arc<dyn EventSink>) -> Self {
        let lifecycle = Arc::new(LifecycleCell::new());
        Self {
            table: Arc::new(WatchTable::new(config.max_watches)),
            bridge: CallbackBridge::new(sink, Arc::clone(&lifecycle)),
            config,
            lifecycle,
        }
    }

    /// Lifecycle state of this engine
    pub fn status(&self) -> InitState {
        self.lifecycle.get()
    }

    /// Start watching `path` for the categories in `filter`
    ///
    /// Returns the watch's ID. On failure nothing is registered and no
    /// resources leak; the error carries the OS error code when one
    /// exists.
    pub fn add_watch(
        &self,
        path: impl AsRef<Path>,
        filter: FilterMask,
        recursive: bool,
    ) -> Result<WatchId> {
        let path = path.as_ref();

        let handle = DirectoryHandle::open(path, filter, recursive)
            .map_err(|err| Error::watch_creation(path, err))?;
        let mut dirs = HashMap::new();
        dirs.insert(handle.root_wd(), PathBuf::new());
        if recursive {
            let registered = register_tree(&handle, path, Path::new(""))
                .map_err(|err| Error::watch_creation(path, err))?;
            dirs.extend(registered);
        }

        let shared = WatchShared::new(handle);
        let entry = WatchEntry {
            shared: Arc::clone(&shared),
            path: path.to_path_buf(),
        };
        let id = self.table.allocate(entry)?;

        let worker = WatchWorker::new(
            id,
            Arc::clone(&shared),
            filter,
            recursive,
            path.to_path_buf(),
            dirs,
            self.bridge.clone(),
            Arc::clone(&self.table),
            self.config.buffer_capacity,
        );
        let spawned = thread::Builder::new()
            .name(format!("dirwatch-{id}"))
            .spawn(move || worker.run());
        match spawned {
            Ok(join) => {
                *shared.worker.lock() = Some(join);
                info!(watch = id, path = %path.display(), recursive, "watch added");
                Ok(id)
            }
            Err(err) => {
                self.table.remove(id);
                Err(Error::watch_creation(path, err))
            }
        }
    }

    /// Stop the watch with the given ID
    ///
    /// Blocks until the worker has drained its outstanding read; once this
    /// returns, no further events for `id` reach the consumer. Unknown IDs
    /// are a logged no-op. Must not be called from inside the consumer
    /// callback: the join would deadlock on the delivering thread.
    pub fn remove_watch(&self, id: WatchId) {
        let Some(entry) = self.table.remove(id) else {
            return;
        };
        self.teardown(id, entry);
    }

    fn teardown(&self, id: WatchId, entry: WatchEntry) {
        entry.shared.state.request_cancel();
        entry.shared.handle.interrupt();
        let join = entry.shared.worker.lock().take();
        if let Some(join) = join {
            if join.join().is_err() {
                error!(watch = id, "watch worker panicked during teardown");
            }
        }
        entry.shared.state.mark_closed();
        info!(watch = id, path = %entry.path.display(), "watch removed");
    }

    /// Whether the given ID refers to a live watch
    pub fn is_watching(&self, id: WatchId) -> bool {
        self.table.contains(id)
    }

    /// Number of live watches
    pub fn watch_count(&self) -> usize {
        self.table.len()
    }

    /// Cancel every live watch and join its worker
    pub fn shutdown(&self) {
        for id in self.table.ids() {
            if let Some(entry) = self.table.remove(id) {
                self.teardown(id, entry);
            }
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
