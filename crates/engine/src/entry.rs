//! Per-watch state and its lifecycle
//!
//! A watch moves through `Active -> Cancelling -> Closed`, never back.
//! The state cell, the directory handle, and the worker join handle are
//! shared between the table entry and the worker thread through one `Arc`,
//! so the descriptor closes only after both sides are done with it.

use crate::platform::DirectoryHandle;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Lifecycle state of a watch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WatchState {
    /// The worker is reading, or about to read, change records
    Active,
    /// Teardown requested; the outstanding read is being drained
    Cancelling,
    /// Terminal; resources released
    Closed,
}

/// Atomic cell holding a [`WatchState`]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    const ACTIVE: u8 = 0;
    const CANCELLING: u8 = 1;
    const CLOSED: u8 = 2;

    pub fn new() -> Self {
        Self(AtomicU8::new(Self::ACTIVE))
    }

    pub fn get(&self) -> WatchState {
        match self.0.load(Ordering::Acquire) {
            Self::ACTIVE => WatchState::Active,
            Self::CANCELLING => WatchState::Cancelling,
            _ => WatchState::Closed,
        }
    }

    pub fn is_active(&self) -> bool {
        self.get() == WatchState::Active
    }

    /// `Active -> Cancelling`; false when the watch already left `Active`
    pub fn request_cancel(&self) -> bool {
        self.0
            .compare_exchange(
                Self::ACTIVE,
                Self::CANCELLING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Terminal transition; valid from any state
    pub fn mark_closed(&self) {
        self.0.store(Self::CLOSED, Ordering::Release);
    }
}

/// State shared between a watch's table entry and its worker thread
pub(crate) struct WatchShared {
    pub state: StateCell,
    pub handle: DirectoryHandle,
    /// Set by `add_watch` right after the thread spawns; taken exactly
    /// once during teardown
    pub worker: Mutex<Option<JoinHandle<()>>>,
}

impl WatchShared {
    pub fn new(handle: DirectoryHandle) -> Arc<Self> {
        Arc::new(Self {
            state: StateCell::new(),
            handle,
            worker: Mutex::new(None),
        })
    }
}

/// Registry entry for a live watch
pub(crate) struct WatchEntry {
    pub shared: Arc<WatchShared>,
    pub path: PathBuf,
}
