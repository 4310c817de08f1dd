//! Throttling configuration for organization-wide validation.
//!
//! The delay between blocks is the sole backpressure mechanism against
//! the version-control provider's rate limit. It is threaded into the
//! engine explicitly rather than read from a process-wide singleton, so
//! two engines validating different organizations concurrently can carry
//! different policies without cross-talk.

use std::time::Duration;

/// Default number of repositories validated per block.
pub const DEFAULT_BLOCK_SIZE: usize = 10;

/// Block/delay schedule for the organization batch validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Repositories dispatched per block.
    pub block_size: usize,
    /// Pause after each completed block. Zero means unthrottled.
    pub time_to_wait: Duration,
}

impl ThrottleConfig {
    pub fn new(block_size: usize, time_to_wait: Duration) -> Self {
        Self {
            block_size: block_size.max(1),
            time_to_wait,
        }
    }

    /// Unthrottled schedule with the given block size.
    pub fn unthrottled() -> Self {
        Self::default()
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            time_to_wait: Duration::ZERO,
        }
    }
}
