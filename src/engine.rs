//! Caller-owned engine context.
//!
//! Holds one instance of every strategy and a selector for the active one.
//! There is no global state: embedders construct a [`MemoryEngine`], own
//! it, and route allocation calls through it.

use tracing::debug;

use crate::allocator::{
    Allocator, FreeListAllocator, FreeListConfig, PoolAllocator, PoolConfig, StackAllocator,
    StackConfig, StandardAllocator,
};
use crate::error::AllocResult;
use crate::stats::{AllocationStats, TrackingConfig};

/// Identifies one of the engine's strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AllocatorKind {
    /// Platform allocator with tracking.
    #[default]
    Standard,
    /// Fixed-size block pool.
    Pool,
    /// LIFO stack with markers.
    Stack,
    /// Address-ordered free list.
    FreeList,
}

/// Construction parameters for every strategy in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Pool strategy parameters.
    pub pool: PoolConfig,
    /// Stack strategy parameters.
    pub stack: StackConfig,
    /// Free-list strategy parameters.
    pub freelist: FreeListConfig,
    /// Tracking for the standard strategy.
    pub standard_tracking: TrackingConfig,
}

impl EngineConfig {
    const DEFAULT_REGION: usize = 16 * 1024 * 1024;

    /// Defaults: 4 KiB × 10 000 pool slots, 16 MiB stack and free-list
    /// regions, best-fit policy.
    pub const fn new() -> Self {
        Self {
            pool: PoolConfig::new(4096, 10_000),
            stack: StackConfig::new(Self::DEFAULT_REGION),
            freelist: FreeListConfig::new(Self::DEFAULT_REGION),
            standard_tracking: TrackingConfig::new(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// One instance of every allocation strategy plus the active selector.
#[derive(Debug)]
pub struct MemoryEngine {
    standard: StandardAllocator,
    pool: PoolAllocator,
    stack: StackAllocator,
    freelist: FreeListAllocator,
    active: AllocatorKind,
}

impl MemoryEngine {
    /// Builds all four strategies up front. Fails when any backing region
    /// cannot be reserved.
    pub fn new(config: EngineConfig) -> AllocResult<Self> {
        let engine = Self {
            standard: StandardAllocator::new(config.standard_tracking),
            pool: PoolAllocator::new(config.pool)?,
            stack: StackAllocator::new(config.stack)?,
            freelist: FreeListAllocator::new(config.freelist)?,
            active: AllocatorKind::Standard,
        };
        debug!("memory engine created");
        Ok(engine)
    }

    /// The currently selected strategy.
    #[inline]
    pub fn active_kind(&self) -> AllocatorKind {
        self.active
    }

    /// Switches the active strategy. Outstanding allocations from other
    /// strategies stay valid; their allocators keep owning them.
    pub fn select(&mut self, kind: AllocatorKind) {
        debug!(from = ?self.active, to = ?kind, "switching active allocator");
        self.active = kind;
    }

    /// The active strategy as a trait object.
    pub fn active(&self) -> &dyn Allocator {
        match self.active {
            AllocatorKind::Standard => &self.standard,
            AllocatorKind::Pool => &self.pool,
            AllocatorKind::Stack => &self.stack,
            AllocatorKind::FreeList => &self.freelist,
        }
    }

    /// Mutable access to the active strategy.
    pub fn active_mut(&mut self) -> &mut dyn Allocator {
        match self.active {
            AllocatorKind::Standard => &mut self.standard,
            AllocatorKind::Pool => &mut self.pool,
            AllocatorKind::Stack => &mut self.stack,
            AllocatorKind::FreeList => &mut self.freelist,
        }
    }

    /// Statistics snapshot of the active strategy.
    pub fn stats(&self) -> AllocationStats {
        self.active().stats()
    }

    /// Resets the active strategy.
    pub fn reset_active(&mut self) {
        self.active_mut().reset();
    }

    /// Occupancy snapshot; `Some` only while the pool strategy is active.
    pub fn occupancy_grid(&self) -> Option<Vec<bool>> {
        (self.active == AllocatorKind::Pool).then(|| self.pool.occupancy_grid())
    }

    /// Direct access to the pool strategy.
    pub fn pool(&mut self) -> &mut PoolAllocator {
        &mut self.pool
    }

    /// Direct access to the stack strategy.
    pub fn stack(&mut self) -> &mut StackAllocator {
        &mut self.stack
    }

    /// Direct access to the free-list strategy.
    pub fn freelist(&mut self) -> &mut FreeListAllocator {
        &mut self.freelist
    }

    /// Direct access to the standard strategy.
    pub fn standard(&mut self) -> &mut StandardAllocator {
        &mut self.standard
    }
}
