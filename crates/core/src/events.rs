//! Normalized change events and the consumer sink
//!
//! Workers decode OS notification buffers into these types and hand them,
//! in arrival order, to the single registered [`EventSink`].

use serde::Serialize;
use std::path::PathBuf;

/// Identifier of a live watch; positive while the watch is registered
pub type WatchId = i32;

/// The kind of change a single record reports
///
/// Each kind has a fixed published code for integrations that cross a
/// language boundary (see [`ChangeKind::code`]). Renames arrive as two
/// separate events, in OS order; the engine does not pair them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeKind {
    /// File or directory created
    Added,
    /// File or directory deleted
    Removed,
    /// Content written
    Modified,
    /// Metadata (permissions, ownership, timestamps) changed
    AttributesChanged,
    /// Content read
    Accessed,
    /// Old name half of a rename
    RenamedFrom,
    /// New name half of a rename
    RenamedTo,
    /// Unrecognized OS change code, passed through rather than dropped
    Unknown(u32),
}

impl ChangeKind {
    /// Fixed integer code of this kind
    ///
    /// Added=1, Removed=2, Modified=3, RenamedFrom=4, RenamedTo=5,
    /// AttributesChanged=6, Accessed=7; Unknown maps to 0 with the raw OS
    /// code retained on the variant.
    pub fn code(&self) -> i32 {
        match self {
            Self::Added => 1,
            Self::Removed => 2,
            Self::Modified => 3,
            Self::RenamedFrom => 4,
            Self::RenamedTo => 5,
            Self::AttributesChanged => 6,
            Self::Accessed => 7,
            Self::Unknown(_) => 0,
        }
    }
}

/// One delivery to the consumer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatchEvent {
    /// A decoded change record; `path` is relative to the watch root
    Change { kind: ChangeKind, path: PathBuf },
    /// The OS queue overflowed and an unknown number of changes were lost
    Overflow,
}

impl WatchEvent {
    /// Convenience constructor for a change event
    pub fn change(kind: ChangeKind, path: impl Into<PathBuf>) -> Self {
        Self::Change {
            kind,
            path: path.into(),
        }
    }
}

/// Consumer callback surface
///
/// One sink is registered per engine. `on_event` runs on engine-owned
/// worker threads, never concurrently for the same watch, and must not
/// call back into `remove_watch` for the delivering watch.
pub trait EventSink: Send + Sync + 'static {
    /// Called once per delivery thread, before its first event
    ///
    /// Consumers that bridge into a managed runtime register the thread
    /// here; the default is a no-op.
    fn attach_thread(&self) {}

    /// Receive one event for the given watch
    fn on_event(&self, watch: WatchId, event: &WatchEvent);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_change_kind_codes_are_stable() {
        assert_eq!(ChangeKind::Added.code(), 1);
        assert_eq!(ChangeKind::Removed.code(), 2);
        assert_eq!(ChangeKind::Modified.code(), 3);
        assert_eq!(ChangeKind::RenamedFrom.code(), 4);
        assert_eq!(ChangeKind::RenamedTo.code(), 5);
        assert_eq!(ChangeKind::AttributesChanged.code(), 6);
        assert_eq!(ChangeKind::Accessed.code(), 7);
        assert_eq!(ChangeKind::Unknown(0x4000).code(), 0);
    }

    #[test]
    fn test_event_serializes_for_json_output() {
        let event = WatchEvent::change(ChangeKind::Added, "a.txt");
        let json = serde_json::to_string(&event).expect("serializable");
        assert!(json.contains("added"));
        assert!(json.contains("a.txt"));
    }
}
