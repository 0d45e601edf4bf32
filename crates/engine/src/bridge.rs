//! Event delivery to the registered consumer
//!
//! Workers hand every decoded event to the bridge, one at a time. The
//! bridge attaches the delivering thread to the consumer runtime before
//! its first delivery (once per thread lifetime; worker threads belong to
//! exactly one engine) and keeps consumer panics from reaching the
//! OS-facing read loop.

use crate::engine::LifecycleCell;
use dirwatch_core::{EventSink, WatchEvent, WatchId};
use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::error;

thread_local! {
    static ATTACHED: Cell<bool> = const { Cell::new(false) };
}

#[derive(Clone)]
pub(crate) struct CallbackBridge {
    sink: Arc<dyn EventSink>,
    lifecycle: Arc<LifecycleCell>,
}

impl CallbackBridge {
    pub fn new(sink: Arc<dyn EventSink>, lifecycle: Arc<LifecycleCell>) -> Self {
        Self { sink, lifecycle }
    }

    /// Deliver one event, attaching the current thread first if needed
    pub fn deliver(&self, watch: WatchId, event: &WatchEvent) {
        ATTACHED.with(|attached| {
            if !attached.get() {
                self.sink.attach_thread();
                attached.set(true);
                self.lifecycle.mark_attached();
            }
        });

        if catch_unwind(AssertUnwindSafe(|| self.sink.on_event(watch, event))).is_err() {
            error!(watch, "consumer callback panicked; event dropped");
        }
    }
}
