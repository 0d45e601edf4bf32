//! Per-watch monitoring loop
//!
//! One worker thread drives one watch: block in the handle's read, decode
//! the filled buffer, deliver each event through the bridge, and read
//! again. The loop ends when teardown is requested or when the watch can
//! no longer produce events (root lost, read failure); in the latter case
//! the worker erases its own table entry.

use crate::bridge::CallbackBridge;
use crate::entry::WatchShared;
use crate::platform::register_tree;
use crate::table::WatchTable;
use crate::translate::{classify, RecordCursor};
use dirwatch_core::{ChangeKind, FilterMask, WatchEvent, WatchId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Why the monitoring loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    /// Teardown requested; `remove_watch` finishes the cleanup
    Cancelled,
    /// The watched root was deleted, moved, or unmounted
    RootLost,
    /// The kernel read failed
    ReadFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop(Exit),
}

pub(crate) struct WatchWorker {
    id: WatchId,
    shared: Arc<WatchShared>,
    filter: FilterMask,
    recursive: bool,
    root: PathBuf,
    /// descriptor -> directory path relative to the root
    dirs: HashMap<i32, PathBuf>,
    /// reverse of `dirs`, for unregistering moved-out subtrees
    dirs_by_path: HashMap<PathBuf, i32>,
    bridge: CallbackBridge,
    table: Arc<WatchTable>,
    buffer: Vec<u8>,
}

impl WatchWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: WatchId,
        shared: Arc<WatchShared>,
        filter: FilterMask,
        recursive: bool,
        root: PathBuf,
        dirs: HashMap<i32, PathBuf>,
        bridge: CallbackBridge,
        table: Arc<WatchTable>,
        buffer_capacity: usize,
    ) -> Self {
        let dirs_by_path = dirs.iter().map(|(wd, path)| (path.clone(), *wd)).collect();
        Self {
            id,
            shared,
            filter,
            recursive,
            root,
            dirs,
            dirs_by_path,
            bridge,
            table,
            buffer: vec![0; buffer_capacity],
        }
    }

    pub fn run(mut self) {
        let exit = self.read_loop();
        match exit {
            Exit::Cancelled => trace!(watch = self.id, "worker exited after cancel"),
            Exit::RootLost | Exit::ReadFailed => {
                // the watch can produce no further events; erase our own entry
                if let Some(entry) = self.table.remove(self.id) {
                    entry.shared.state.mark_closed();
                }
                debug!(watch = self.id, reason = ?exit, "watch closed");
            }
        }
    }

    fn read_loop(&mut self) -> Exit {
        loop {
            if !self.shared.state.is_active() {
                return Exit::Cancelled;
            }
            // the buffer is exclusively ours; the kernel fills it, we drain it
            let result = self.shared.handle.read(&mut self.buffer);
            if let Flow::Stop(exit) = self.handle_read(result) {
                return exit;
            }
        }
    }

    /// React to one completed read
    fn handle_read(&mut self, result: std::io::Result<usize>) -> Flow {
        match result {
            // zero bytes transferred: the kernel could not fit the pending
            // changes; report the loss and keep the watch alive
            Ok(0) => {
                self.bridge.deliver(self.id, &WatchEvent::Overflow);
                Flow::Continue
            }
            Ok(filled) => {
                let buffer = std::mem::take(&mut self.buffer);
                let flow = self.process(&buffer[..filled]);
                self.buffer = buffer;
                flow
            }
            Err(err) => {
                warn!(watch = self.id, error = %err, "read failed; closing watch");
                Flow::Stop(Exit::ReadFailed)
            }
        }
    }

    /// Decode and deliver one filled buffer, preserving kernel order
    fn process(&mut self, bytes: &[u8]) -> Flow {
        for record in RecordCursor::new(bytes) {
            // a cancel request discards everything not yet delivered
            if !self.shared.state.is_active() {
                return Flow::Stop(Exit::Cancelled);
            }

            if record.mask & libc::IN_Q_OVERFLOW != 0 {
                self.bridge.deliver(self.id, &WatchEvent::Overflow);
                continue;
            }
            if record.mask & libc::IN_IGNORED != 0 {
                if record.wd == self.shared.handle.root_wd() {
                    return Flow::Stop(Exit::RootLost);
                }
                if let Some(path) = self.dirs.remove(&record.wd) {
                    self.dirs_by_path.remove(&path);
                }
                continue;
            }
            if record.mask & (libc::IN_DELETE_SELF | libc::IN_MOVE_SELF | libc::IN_UNMOUNT) != 0 {
                if record.wd == self.shared.handle.root_wd() {
                    return Flow::Stop(Exit::RootLost);
                }
                // subdirectory descriptors are reclaimed via IN_IGNORED
                continue;
            }

            let Some(dir) = self.dirs.get(&record.wd) else {
                trace!(
                    watch = self.id,
                    wd = record.wd,
                    "record for unregistered descriptor skipped"
                );
                continue;
            };
            let path = if record.name.is_empty() {
                dir.clone()
            } else {
                dir.join(record.name)
            };
            let is_dir = record.mask & libc::IN_ISDIR != 0;

            if self.recursive && is_dir {
                self.track_directory(record.mask, &path);
            }

            let kind = classify(record.mask);
            if !self.selected(kind, is_dir) {
                continue;
            }
            self.bridge
                .deliver(self.id, &WatchEvent::Change { kind, path });
        }
        Flow::Continue
    }

    /// Keep the descriptor set in step with subtree structure changes
    fn track_directory(&mut self, mask: u32, rel: &Path) {
        if mask & (libc::IN_CREATE | libc::IN_MOVED_TO) != 0 {
            let abs = self.root.join(rel);
            match self.shared.handle.register(&abs) {
                Ok(wd) => {
                    self.dirs.insert(wd, rel.to_path_buf());
                    self.dirs_by_path.insert(rel.to_path_buf(), wd);
                    // a moved-in tree brings nested directories with it
                    match register_tree(&self.shared.handle, &abs, rel) {
                        Ok(nested) => {
                            for (wd, rel) in nested {
                                self.dirs.insert(wd, rel.clone());
                                self.dirs_by_path.insert(rel, wd);
                            }
                        }
                        Err(err) => warn!(
                            watch = self.id,
                            path = %abs.display(),
                            error = %err,
                            "failed to register nested subdirectories"
                        ),
                    }
                }
                Err(err) => warn!(
                    watch = self.id,
                    path = %abs.display(),
                    error = %err,
                    "failed to track new subdirectory"
                ),
            }
        } else if mask & (libc::IN_MOVED_FROM | libc::IN_DELETE) != 0 {
            self.untrack_subtree(rel);
        }
    }

    fn untrack_subtree(&mut self, rel: &Path) {
        let doomed: Vec<PathBuf> = self
            .dirs_by_path
            .keys()
            .filter(|path| path.starts_with(rel))
            .cloned()
            .collect();
        for path in doomed {
            if let Some(wd) = self.dirs_by_path.remove(&path) {
                // already reclaimed by the kernel when the directory was
                // deleted; only moved-out descriptors need the explicit drop
                let _ = self.shared.handle.unregister(wd);
                self.dirs.remove(&wd);
            }
        }
    }

    /// Apply the file/directory split of the name categories
    ///
    /// The remaining categories were subscribed precisely, so the kernel
    /// already filtered them.
    fn selected(&self, kind: ChangeKind, is_dir: bool) -> bool {
        match kind {
            ChangeKind::Added
            | ChangeKind::Removed
            | ChangeKind::RenamedFrom
            | ChangeKind::RenamedTo => {
                if is_dir {
                    self.filter.contains(FilterMask::DIR_NAME)
                } else {
                    self.filter.contains(FilterMask::FILE_NAME)
                }
            }
            _ => true,
        }
    }
}
