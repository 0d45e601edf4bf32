//! Engine configuration
//!
//! Tuning knobs for the watch engine. The per-watch interest mask lives in
//! [`crate::filter::FilterMask`]; everything here applies engine-wide.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Smallest buffer that still fits one maximum-size change record
pub const MIN_BUFFER_CAPACITY: usize = 4096;

/// Engine-wide configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Capacity in bytes of each watch's notification buffer (default: 16 KiB)
    pub buffer_capacity: usize,
    /// Maximum number of concurrently live watches (default: 65536)
    pub max_watches: usize,
}

impl EngineConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.buffer_capacity < MIN_BUFFER_CAPACITY {
            return Err(Error::config(format!(
                "buffer_capacity must be at least {MIN_BUFFER_CAPACITY} bytes"
            )));
        }
        if self.max_watches == 0 {
            return Err(Error::config("max_watches must be positive"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 16 * 1024,
            max_watches: 65536,
        }
    }
}
