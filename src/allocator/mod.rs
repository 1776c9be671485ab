//! Allocation strategies.
//!
//! Every strategy implements the [`Allocator`] trait over either a fixed
//! [`Region`](crate::region::Region) (pool, stack, free-list) or the
//! platform allocator (standard).

mod freelist;
mod pool;
mod stack;
mod standard;
mod traits;

pub use freelist::{FitPolicy, FreeListAllocator, FreeListConfig};
pub use pool::{PoolAllocator, PoolConfig};
pub use stack::{Marker, StackAllocator, StackConfig, StackFrame};
pub use standard::StandardAllocator;
pub use traits::Allocator;
