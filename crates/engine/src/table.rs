//! Watch registry and ID allocation
//!
//! The table is the single source of truth for "is this watch alive". IDs
//! are allocated monotonically and wrap around the positive `i32` range;
//! an ID still present in the table is never handed out again.

use crate::entry::WatchEntry;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use dirwatch_core::{Error, Result, WatchId};
use std::sync::atomic::{AtomicI32, Ordering};
use tracing::debug;

pub(crate) struct WatchTable {
    entries: DashMap<WatchId, WatchEntry>,
    next_id: AtomicI32,
    max_watches: usize,
}

impl WatchTable {
    pub fn new(max_watches: usize) -> Self {
        Self {
            entries: DashMap::new(),
            next_id: AtomicI32::new(1),
            max_watches,
        }
    }

    /// Insert `entry` under a fresh positive ID and return the ID
    pub fn allocate(&self, entry: WatchEntry) -> Result<WatchId> {
        if self.entries.len() >= self.max_watches {
            return Err(Error::ResourceExhausted);
        }
        let mut entry = Some(entry);
        loop {
            let id = self.next_candidate();
            if let Entry::Vacant(slot) = self.entries.entry(id) {
                if let Some(entry) = entry.take() {
                    slot.insert(entry);
                }
                return Ok(id);
            }
            // id survived a full wraparound; try the next one
        }
    }

    fn next_candidate(&self) -> WatchId {
        loop {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            if id > 0 {
                return id;
            }
            // wrapped past i32::MAX; restart the sequence at 1
            let _ = self.next_id.compare_exchange(
                id.wrapping_add(1),
                1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            );
        }
    }

    /// Erase and return the entry; unknown IDs are a logged no-op
    pub fn remove(&self, id: WatchId) -> Option<WatchEntry> {
        match self.entries.remove(&id) {
            Some((_, entry)) => Some(entry),
            None => {
                debug!(watch = id, "remove for unknown watch id ignored");
                None
            }
        }
    }

    /// Concurrent-safe liveness check
    ///
    /// False covers both "never existed" and "already removed".
    pub fn contains(&self, id: WatchId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of live (Active or Cancelling) watches
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Snapshot of the currently registered IDs
    pub fn ids(&self) -> Vec<WatchId> {
        self.entries.iter().map(|entry| *entry.key()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{WatchEntry, WatchShared};
    use crate::platform::DirectoryHandle;
    use dirwatch_core::FilterMask;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn test_entry(dir: &TempDir) -> WatchEntry {
        let handle = DirectoryHandle::open(dir.path(), FilterMask::all(), false)
            .expect("test setup failed");
        WatchEntry {
            shared: WatchShared::new(handle),
            path: dir.path().to_path_buf(),
        }
    }

    #[test]
    fn test_allocated_ids_are_distinct_and_positive() {
        let dir = TempDir::new().expect("test setup failed");
        let table = WatchTable::new(1024);

        let ids: HashSet<WatchId> = (0..32)
            .map(|_| table.allocate(test_entry(&dir)).expect("allocation failed"))
            .collect();
        assert_eq!(ids.len(), 32);
        assert!(ids.iter().all(|id| *id > 0));
        assert_eq!(table.len(), 32);
    }

    #[test]
    fn test_removed_ids_are_not_immediately_reissued() {
        let dir = TempDir::new().expect("test setup failed");
        let table = WatchTable::new(1024);

        let first = table.allocate(test_entry(&dir)).expect("allocation failed");
        assert!(table.remove(first).is_some());

        let second = table.allocate(test_entry(&dir)).expect("allocation failed");
        assert_ne!(first, second);
    }

    #[test]
    fn test_remove_unknown_id_is_a_noop() {
        let table = WatchTable::new(16);
        assert!(table.remove(424242).is_none());
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_watch_limit_is_enforced() {
        let dir = TempDir::new().expect("test setup failed");
        let table = WatchTable::new(2);

        table.allocate(test_entry(&dir)).expect("allocation failed");
        table.allocate(test_entry(&dir)).expect("allocation failed");
        assert!(matches!(
            table.allocate(test_entry(&dir)),
            Err(Error::ResourceExhausted)
        ));

        // removing frees capacity again
        let ids = table.ids();
        assert!(table.remove(ids[0]).is_some());
        table.allocate(test_entry(&dir)).expect("allocation failed");
    }

    #[test]
    fn test_allocation_skips_ids_still_in_the_table() {
        let dir = TempDir::new().expect("test setup failed");
        let table = WatchTable::new(16);

        let occupied = table.allocate(test_entry(&dir)).expect("allocation failed");
        // force the counter to collide with the live id
        table.next_id.store(occupied, Ordering::Relaxed);

        let fresh = table.allocate(test_entry(&dir)).expect("allocation failed");
        assert_ne!(fresh, occupied);
    }
}
