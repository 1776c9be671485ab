//! Stack allocator configuration.

use crate::stats::TrackingConfig;

/// Construction parameters for [`StackAllocator`](super::StackAllocator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackConfig {
    /// Region capacity in bytes.
    pub capacity: usize,
    /// Statistics and history behavior.
    pub tracking: TrackingConfig,
}

impl StackConfig {
    /// Stack over a region of `capacity` bytes.
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            tracking: TrackingConfig::new(),
        }
    }

    /// Debug variant: poison patterns and unbounded history.
    pub const fn debug(capacity: usize) -> Self {
        Self {
            capacity,
            tracking: TrackingConfig::debug(),
        }
    }

    /// Production variant: no history log, no poisoning.
    pub const fn production(capacity: usize) -> Self {
        Self {
            capacity,
            tracking: TrackingConfig::production(),
        }
    }
}
