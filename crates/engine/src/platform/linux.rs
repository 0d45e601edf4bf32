//! inotify-backed directory handles
//!
//! Each watch owns one inotify instance. The root directory is registered
//! at open; recursive watches register every subdirectory as an additional
//! watch descriptor on the same instance, so one blocking `read(2)` drains
//! the whole subtree in kernel order.

use dirwatch_core::FilterMask;
use std::ffi::CString;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Owned inotify instance plus the root watch descriptor
///
/// Reads and descriptor management are independent kernel-side, so the
/// worker may block in [`read`](Self::read) while another thread calls
/// [`interrupt`](Self::interrupt); removing the root descriptor queues an
/// `IN_IGNORED` record that wakes the read.
#[derive(Debug)]
pub(crate) struct DirectoryHandle {
    fd: OwnedFd,
    root_wd: i32,
    interest: u32,
}

impl DirectoryHandle {
    /// Open an inotify instance and register the root directory
    pub fn open(path: &Path, filter: FilterMask, recursive: bool) -> io::Result<Self> {
        let fd = unsafe { libc::inotify_init1(libc::IN_CLOEXEC) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        // Safety: freshly created descriptor, owned from here on.
        let fd = unsafe { OwnedFd::from_raw_fd(fd) };

        let interest = interest_bits(filter, recursive);
        // Root-loss kinds are subscribed unconditionally; the worker turns
        // them into a silent close of the watch.
        let root_wd = add_watch_fd(
            &fd,
            path,
            interest | libc::IN_DELETE_SELF | libc::IN_MOVE_SELF,
        )?;
        Ok(Self {
            fd,
            root_wd,
            interest,
        })
    }

    /// Watch descriptor of the root directory
    pub fn root_wd(&self) -> i32 {
        self.root_wd
    }

    /// Register an additional directory on this instance
    pub fn register(&self, path: &Path) -> io::Result<i32> {
        add_watch_fd(&self.fd, path, self.interest)
    }

    /// Drop a watch descriptor; EINVAL means the kernel already reclaimed it
    pub fn unregister(&self, wd: i32) -> io::Result<()> {
        let rc = unsafe { libc::inotify_rm_watch(self.fd.as_raw_fd(), wd) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Block until the kernel fills `buf` with change records
    ///
    /// Returns the number of valid bytes. Interrupted reads are retried.
    pub fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let n = unsafe { libc::read(self.fd.as_raw_fd(), buf.as_mut_ptr().cast(), buf.len()) };
            if n >= 0 {
                return Ok(n as usize);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    /// Wake a read blocked on this instance
    ///
    /// Removing the root descriptor queues an `IN_IGNORED` record, the
    /// inotify analogue of cancelling an outstanding asynchronous read.
    /// If the kernel already reclaimed the descriptor the wake-up record
    /// is already queued, so the failure is ignored.
    pub fn interrupt(&self) {
        let _ = self.unregister(self.root_wd);
    }
}

/// Register every subdirectory under `walk_root` on `handle`
///
/// Returns `(descriptor, relative_path)` pairs where the relative path is
/// `rel_prefix` joined with the directory's path below `walk_root`.
/// Directories that vanish mid-walk are skipped; other failures abort.
pub(crate) fn register_tree(
    handle: &DirectoryHandle,
    walk_root: &Path,
    rel_prefix: &Path,
) -> io::Result<Vec<(i32, PathBuf)>> {
    let mut registered = Vec::new();
    for entry in WalkDir::new(walk_root).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry during subtree registration");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let rel = match entry.path().strip_prefix(walk_root) {
            Ok(rel) => rel_prefix.join(rel),
            Err(_) => continue,
        };
        match handle.register(entry.path()) {
            Ok(wd) => registered.push((wd, rel)),
            // the directory raced away between the walk and the registration
            Err(err)
                if err.raw_os_error() == Some(libc::ENOENT)
                    || err.raw_os_error() == Some(libc::ENOTDIR) =>
            {
                continue;
            }
            Err(err) => return Err(err),
        }
    }
    Ok(registered)
}

fn add_watch_fd(fd: &OwnedFd, path: &Path, mask: u32) -> io::Result<i32> {
    let cpath = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains a NUL byte"))?;
    // IN_ONLYDIR: the engine watches directories, never plain files
    let wd = unsafe {
        libc::inotify_add_watch(fd.as_raw_fd(), cpath.as_ptr(), mask | libc::IN_ONLYDIR)
    };
    if wd < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(wd)
}

/// Map the published filter categories onto inotify interest bits
///
/// Recursive watches subscribe the name bits regardless of the filter:
/// the worker needs create/move records to keep the descriptor set in
/// step with the subtree, and applies the filter at delivery time.
fn interest_bits(filter: FilterMask, recursive: bool) -> u32 {
    let mut mask = 0;
    if recursive || filter.intersects(FilterMask::FILE_NAME | FilterMask::DIR_NAME) {
        mask |= libc::IN_CREATE | libc::IN_DELETE | libc::IN_MOVED_FROM | libc::IN_MOVED_TO;
    }
    if filter.intersects(FilterMask::SIZE | FilterMask::LAST_WRITE) {
        mask |= libc::IN_MODIFY;
    }
    if filter.intersects(FilterMask::ATTRIBUTES | FilterMask::CREATION | FilterMask::SECURITY) {
        mask |= libc::IN_ATTRIB;
    }
    if filter.contains(FilterMask::LAST_ACCESS) {
        mask |= libc::IN_ACCESS;
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_open_requires_a_directory() {
        let dir = TempDir::new().expect("test setup failed");
        let file = dir.path().join("plain");
        std::fs::write(&file, b"x").expect("test setup failed");

        let err = DirectoryHandle::open(&file, FilterMask::all(), false)
            .expect_err("must reject files");
        assert_eq!(err.raw_os_error(), Some(libc::ENOTDIR));
    }

    #[test]
    fn test_open_nonexistent_reports_os_code() {
        let err =
            DirectoryHandle::open(Path::new("/no/such/dirwatch/dir"), FilterMask::all(), false)
                .expect_err("must reject missing paths");
        assert_eq!(err.raw_os_error(), Some(libc::ENOENT));
    }

    #[test]
    fn test_register_tree_covers_nested_directories() {
        let dir = TempDir::new().expect("test setup failed");
        std::fs::create_dir_all(dir.path().join("a/b")).expect("test setup failed");
        std::fs::create_dir(dir.path().join("c")).expect("test setup failed");
        std::fs::write(dir.path().join("c/file"), b"x").expect("test setup failed");

        let handle =
            DirectoryHandle::open(dir.path(), FilterMask::all(), true).expect("open failed");
        let mut rels: Vec<_> = register_tree(&handle, dir.path(), Path::new(""))
            .expect("registration failed")
            .into_iter()
            .map(|(_, rel)| rel)
            .collect();
        rels.sort();

        assert_eq!(
            rels,
            vec![
                PathBuf::from("a"),
                PathBuf::from("a/b"),
                PathBuf::from("c"),
            ]
        );
    }

    #[test]
    fn test_interrupt_wakes_a_blocked_read() {
        let dir = TempDir::new().expect("test setup failed");
        let handle = std::sync::Arc::new(
            DirectoryHandle::open(dir.path(), FilterMask::all(), false).expect("open failed"),
        );

        let reader = {
            let handle = std::sync::Arc::clone(&handle);
            std::thread::spawn(move || {
                let mut buf = vec![0u8; 4096];
                handle.read(&mut buf).map(|n| n > 0)
            })
        };

        std::thread::sleep(std::time::Duration::from_millis(50));
        handle.interrupt();

        let woke = reader.join().expect("reader panicked").expect("read failed");
        assert!(woke, "interrupt must queue a wake-up record");
    }
}
