//! OS error code descriptions
//!
//! `strerror(3)` is not reentrant: it may return a pointer into a shared
//! static buffer, so every caller goes through one process-wide lock.

use parking_lot::Mutex;
use std::ffi::CStr;

static FORMAT_LOCK: Mutex<()> = Mutex::new(());

/// Format an OS error code as human-readable text
///
/// Total: unknown codes yield the generic `"Error N"` form and the result
/// is never empty.
pub fn describe_error(code: i32) -> String {
    let _guard = FORMAT_LOCK.lock();

    let ptr = unsafe { libc::strerror(code) };
    if ptr.is_null() {
        return format!("Error {code}");
    }
    // Safety: strerror returns a NUL-terminated string that stays valid
    // while the lock is held.
    let message = unsafe { CStr::from_ptr(ptr) }.to_string_lossy();
    let message = message.trim_end_matches(['\r', '\n']).trim();
    if message.is_empty() {
        format!("Error {code}")
    } else {
        format!("Error {code}: {message}")
    }
}
