//! Pool allocator configuration.

use crate::stats::TrackingConfig;
use crate::utils::DEFAULT_ALIGNMENT;

/// Construction parameters for [`PoolAllocator`](super::PoolAllocator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Requested slot size in bytes; rounded up to `alignment` and to the
    /// free-list link size at construction.
    pub block_size: usize,
    /// Number of slots in the pool.
    pub block_count: usize,
    /// Alignment of every slot. Malformed values are corrected to
    /// [`DEFAULT_ALIGNMENT`].
    pub alignment: usize,
    /// Statistics and history behavior.
    pub tracking: TrackingConfig,
}

impl PoolConfig {
    /// Pool of `block_count` slots of `block_size` bytes at the default
    /// alignment.
    pub const fn new(block_size: usize, block_count: usize) -> Self {
        Self {
            block_size,
            block_count,
            alignment: DEFAULT_ALIGNMENT,
            tracking: TrackingConfig::new(),
        }
    }

    /// Debug variant: poison patterns and unbounded history.
    pub const fn debug(block_size: usize, block_count: usize) -> Self {
        Self {
            block_size,
            block_count,
            alignment: DEFAULT_ALIGNMENT,
            tracking: TrackingConfig::debug(),
        }
    }

    /// Production variant: no history log, no poisoning.
    pub const fn production(block_size: usize, block_count: usize) -> Self {
        Self {
            block_size,
            block_count,
            alignment: DEFAULT_ALIGNMENT,
            tracking: TrackingConfig::production(),
        }
    }

    /// Overrides the slot alignment.
    pub const fn with_alignment(mut self, alignment: usize) -> Self {
        self.alignment = alignment;
        self
    }
}
