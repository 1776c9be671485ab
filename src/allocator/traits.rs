//! The shared allocator contract.

use core::ptr::NonNull;

use crate::stats::{AllocationRecord, AllocationStats};

/// Common interface implemented by every allocation strategy.
///
/// Instances are single-owner: methods take `&mut self` and perform no
/// internal locking. Callers that need sharing wrap the allocator in their
/// own synchronization.
///
/// Failure conventions:
/// - `allocate` returns `None` for zero sizes, oversized requests and
///   exhaustion; it never panics.
/// - malformed alignments are corrected to
///   [`DEFAULT_ALIGNMENT`](crate::utils::DEFAULT_ALIGNMENT), never rejected.
/// - `deallocate` of a pointer the allocator does not own (or, for the
///   stack strategy, out of LIFO order) is a silent no-op.
pub trait Allocator {
    /// Allocates `size` bytes aligned to `align`. Returns `None` when the
    /// request cannot be satisfied.
    fn allocate(&mut self, size: usize, align: usize) -> Option<NonNull<u8>>;

    /// Returns an allocation to the allocator. Unowned and ill-ordered
    /// pointers are ignored.
    fn deallocate(&mut self, ptr: NonNull<u8>);

    /// Drops every outstanding allocation and zeroes the statistics.
    fn reset(&mut self);

    /// Whether `ptr` was produced by this allocator and is still live.
    fn owns(&self, ptr: NonNull<u8>) -> bool;

    /// Snapshot of the current statistics.
    fn stats(&self) -> AllocationStats;

    /// Allocation history, oldest first. Empty when tracking is disabled.
    fn history(&self) -> &[AllocationRecord];

    /// Bytes still available for allocation. Strategies without a fixed
    /// region report `usize::MAX`.
    fn available(&self) -> usize;

    /// Capacity of the backing region, or `usize::MAX` when unbounded.
    fn total_size(&self) -> usize;

    /// Fragmentation relative to the bytes currently in use, in percent.
    /// Zero while nothing is allocated.
    fn fragmentation_percentage(&self) -> f64 {
        let stats = self.stats();
        if stats.current_bytes_used == 0 {
            return 0.0;
        }
        stats.fragmentation_bytes as f64 / stats.current_bytes_used as f64 * 100.0
    }

    /// Short human-readable strategy name.
    fn name(&self) -> &'static str;
}
