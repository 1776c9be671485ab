//! LIFO stack allocator with markers.
//!
//! Allocations advance a top offset; each one is preceded by a small header
//! recording its payload size, the alignment padding before the header, and
//! the offset of the previous allocation's header. That chain is what lets
//! a marker roll back any number of allocations at once.

mod allocator;
mod config;
mod frame;

pub use allocator::{Marker, StackAllocator};
pub use config::StackConfig;
pub use frame::StackFrame;
