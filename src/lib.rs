//! Pluggable memory allocation strategies behind one contract.
//!
//! The crate provides four allocators that share the [`Allocator`] trait:
//!
//! - [`StandardAllocator`] — platform allocator plus per-allocation
//!   tracking, the baseline everything else is compared against
//! - [`PoolAllocator`] — fixed-size slots, O(1) allocate/deallocate
//! - [`StackAllocator`] — LIFO allocation with markers for batch rollback
//! - [`FreeListAllocator`] — variable-size blocks with first/best/worst
//!   fit, splitting and coalescing
//!
//! [`MemoryEngine`] bundles one instance of each behind a selector for
//! embedders that switch strategies at runtime. Allocators are
//! single-owner: methods take `&mut self` and there is no internal
//! locking or global state.
//!
//! # Example
//!
//! ```
//! use memory_engine::{Allocator, PoolAllocator, PoolConfig};
//!
//! let mut pool = PoolAllocator::new(PoolConfig::new(64, 16))?;
//! let ptr = pool.allocate(64, 16).ok_or("exhausted")?;
//! assert!(pool.owns(ptr));
//! pool.deallocate(ptr);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]

pub mod allocator;
pub mod engine;
pub mod error;
pub mod region;
pub mod stats;
pub mod utils;

pub use allocator::{
    Allocator, FitPolicy, FreeListAllocator, FreeListConfig, Marker, PoolAllocator, PoolConfig,
    StackAllocator, StackConfig, StackFrame, StandardAllocator,
};
pub use engine::{AllocatorKind, EngineConfig, MemoryEngine};
pub use error::{AllocError, AllocResult};
pub use stats::{AllocationRecord, AllocationStats, TrackingConfig};

/// Commonly used types in one import.
pub mod prelude {
    pub use crate::allocator::{
        Allocator, FitPolicy, FreeListAllocator, FreeListConfig, PoolAllocator, PoolConfig,
        StackAllocator, StackConfig, StandardAllocator,
    };
    pub use crate::engine::{AllocatorKind, EngineConfig, MemoryEngine};
    pub use crate::error::{AllocError, AllocResult};
    pub use crate::stats::{AllocationStats, TrackingConfig};
}
