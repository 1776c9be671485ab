//! Free-list allocator configuration.

use super::FitPolicy;
use crate::stats::TrackingConfig;

/// Construction parameters for
/// [`FreeListAllocator`](super::FreeListAllocator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeListConfig {
    /// Region capacity in bytes.
    pub capacity: usize,
    /// Initial block selection policy; changeable at runtime.
    pub policy: FitPolicy,
    /// Statistics and history behavior.
    pub tracking: TrackingConfig,
}

impl FreeListConfig {
    /// Best-fit allocator over a region of `capacity` bytes.
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            policy: FitPolicy::BestFit,
            tracking: TrackingConfig::new(),
        }
    }

    /// Debug variant: poison patterns and unbounded history.
    pub const fn debug(capacity: usize) -> Self {
        Self {
            capacity,
            policy: FitPolicy::BestFit,
            tracking: TrackingConfig::debug(),
        }
    }

    /// Production variant: no history log, no poisoning.
    pub const fn production(capacity: usize) -> Self {
        Self {
            capacity,
            policy: FitPolicy::BestFit,
            tracking: TrackingConfig::production(),
        }
    }

    /// Overrides the fit policy.
    pub const fn with_policy(mut self, policy: FitPolicy) -> Self {
        self.policy = policy;
        self
    }
}
