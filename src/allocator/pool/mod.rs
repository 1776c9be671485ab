//! Fixed-size block pool allocator.
//!
//! The region is divided into equally sized slots linked through an
//! intrusive LIFO free list: a free slot's first 8 bytes hold the offset of
//! the next free slot. Allocation and deallocation are O(1); a freshly
//! built pool hands out slot 0 first, then ascending addresses.

mod allocator;
mod config;

pub use allocator::PoolAllocator;
pub use config::PoolConfig;
