//! Variable-size free-list allocator.
//!
//! Free space is kept as an address-ordered intrusive list of nodes encoded
//! inside the region. Allocation searches the list under a configurable
//! [`FitPolicy`], splits blocks that leave a usable remainder, and
//! deallocation re-inserts blocks in address order, coalescing with both
//! neighbors.

mod allocator;
mod config;
mod policy;

pub use allocator::FreeListAllocator;
pub use config::FreeListConfig;
pub use policy::FitPolicy;
