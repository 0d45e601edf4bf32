//! Shared helpers for the engine integration tests

#![allow(dead_code)]

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use dirwatch_engine::{ChangeKind, EventSink, WatchEvent, WatchId};
use std::sync::Arc;
use std::time::Duration;

/// Generous upper bound; events normally arrive within milliseconds
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// How long to listen when asserting that nothing arrives
pub const QUIET_PERIOD: Duration = Duration::from_millis(300);

/// Sink that forwards every delivery into a channel
pub struct ChannelSink(Sender<(WatchId, WatchEvent)>);

impl EventSink for ChannelSink {
    fn on_event(&self, watch: WatchId, event: &WatchEvent) {
        let _ = self.0.send((watch, event.clone()));
    }
}

pub fn channel_sink() -> (Arc<ChannelSink>, Receiver<(WatchId, WatchEvent)>) {
    let (tx, rx) = unbounded();
    (Arc::new(ChannelSink(tx)), rx)
}

/// Receive the next event or fail the test
pub fn next_event(rx: &Receiver<(WatchId, WatchEvent)>) -> (WatchId, WatchEvent) {
    match rx.recv_timeout(EVENT_TIMEOUT) {
        Ok(delivery) => delivery,
        Err(err) => panic!("timed out waiting for an event: {err}"),
    }
}

/// Assert the next delivery is exactly the given change
pub fn expect_change(
    rx: &Receiver<(WatchId, WatchEvent)>,
    watch: WatchId,
    kind: ChangeKind,
    path: &str,
) {
    let (got_watch, got_event) = next_event(rx);
    assert_eq!(got_watch, watch, "event arrived for the wrong watch");
    assert_eq!(got_event, WatchEvent::change(kind, path));
}

/// Assert that no event arrives within the quiet period
pub fn assert_no_events(rx: &Receiver<(WatchId, WatchEvent)>) {
    match rx.recv_timeout(QUIET_PERIOD) {
        Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {}
        Ok((watch, event)) => panic!("unexpected event for watch {watch}: {event:?}"),
    }
}
