//! OS-specific watch plumbing
//!
//! The rest of the engine is OS-agnostic: it sees an owned directory
//! handle that registers interest, fills buffers with raw change records,
//! and can be interrupted from another thread.

#[cfg(any(target_os = "linux", target_os = "android"))]
mod linux;

#[cfg(any(target_os = "linux", target_os = "android"))]
pub(crate) use linux::{register_tree, DirectoryHandle};

#[cfg(not(any(target_os = "linux", target_os = "android")))]
compile_error!("dirwatch currently supports inotify platforms (Linux, Android) only");
