//! The stack allocator proper.

use core::ptr::NonNull;
use std::time::Instant;

use tracing::debug;

use super::StackConfig;
use crate::allocator::Allocator;
use crate::error::{AllocError, AllocResult};
use crate::region::{NIL, Region};
use crate::stats::{AllocationRecord, AllocationStats, AllocationTracker};
use crate::utils::{align_up, sanitize_alignment};

// Header layout, relative to the header offset:
//   +0  payload size
//   +8  adjustment (padding between the previous top and the header)
//   +16 previous live allocation's header offset, NIL at the bottom
const HEADER_SIZE: usize = 24;
const SIZE_FIELD: usize = 0;
const ADJUST_FIELD: usize = 8;
const PREV_FIELD: usize = 16;

/// Snapshot of the stack top, used to roll back a batch of allocations.
///
/// Markers taken before a [`StackAllocator::reset`] are stale; rolling back
/// to one is ignored unless it happens to land on a live allocation
/// boundary again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker(u64);

/// LIFO allocator over a fixed region.
#[derive(Debug)]
pub struct StackAllocator {
    region: Region,
    top: usize,
    top_header: u64,
    tracker: AllocationTracker,
}

impl StackAllocator {
    /// Builds a stack allocator from `config`. Fails for a zero capacity or
    /// when the backing region cannot be reserved.
    pub fn new(config: StackConfig) -> AllocResult<Self> {
        if config.capacity == 0 {
            return Err(AllocError::InvalidConfig("stack capacity must be non-zero"));
        }
        let region = Region::new(config.capacity)?;
        debug!(capacity = config.capacity, "stack allocator created");
        Ok(Self {
            region,
            top: 0,
            top_header: NIL,
            tracker: AllocationTracker::new(config.tracking),
        })
    }

    /// Snapshot of the current top, for later [`rollback_to_marker`].
    ///
    /// [`rollback_to_marker`]: Self::rollback_to_marker
    #[inline]
    pub fn marker(&self) -> Marker {
        Marker(self.top as u64)
    }

    /// Pops every allocation made after `marker` was taken, newest first.
    ///
    /// Markers that do not correspond to a live allocation boundary (taken
    /// before a reset, or from another allocator) leave the stack
    /// untouched.
    pub fn rollback_to_marker(&mut self, marker: Marker) {
        let target = marker.0 as usize;
        if target > self.top {
            debug!(target, top = self.top, "ignoring stale marker");
            return;
        }
        // Validate before touching anything: the marker must sit on an
        // allocation boundary reachable from the current top.
        let mut boundary = self.top;
        let mut header = self.top_header;
        while boundary > target {
            if header == NIL {
                debug!(target, "ignoring marker off any allocation boundary");
                return;
            }
            let header_off = header as usize;
            let adjustment = self.region.read_u64(header_off + ADJUST_FIELD) as usize;
            boundary = header_off - adjustment;
            header = self.region.read_u64(header_off + PREV_FIELD);
        }
        if boundary != target {
            debug!(target, "ignoring marker off any allocation boundary");
            return;
        }
        while self.top > target {
            self.pop_top();
        }
    }

    /// Current fill level in percent.
    pub fn usage_percentage(&self) -> f64 {
        self.top as f64 / self.region.len() as f64 * 100.0
    }

    // Removes the newest allocation. Caller ensures top_header != NIL.
    fn pop_top(&mut self) {
        let started = Instant::now();
        let header_off = self.top_header as usize;
        let size = self.region.read_u64(header_off + SIZE_FIELD) as usize;
        let adjustment = self.region.read_u64(header_off + ADJUST_FIELD) as usize;
        let prev = self.region.read_u64(header_off + PREV_FIELD);

        let payload_off = header_off + HEADER_SIZE;
        if let Some(pattern) = self.tracker.config().dealloc_pattern {
            self.region.fill(payload_off, size, pattern);
        }
        let address = self.region.base_addr() + payload_off;
        self.top = header_off - adjustment;
        self.top_header = prev;
        self.tracker
            .record_deallocation(address, size, started.elapsed());
    }
}

impl Allocator for StackAllocator {
    fn allocate(&mut self, size: usize, align: usize) -> Option<NonNull<u8>> {
        if size == 0 {
            return None;
        }
        let started = Instant::now();
        let align = sanitize_alignment(align);

        // Place the header so the payload address (not offset; the region
        // base only guarantees 16 bytes) lands on the requested alignment.
        let base = self.region.base_addr();
        let payload_off = align_up(base + self.top + HEADER_SIZE, align) - base;
        let header_off = payload_off - HEADER_SIZE;
        let end = payload_off.checked_add(size)?;
        if end > self.region.len() {
            return None;
        }

        self.region
            .write_u64(header_off + SIZE_FIELD, size as u64);
        self.region
            .write_u64(header_off + ADJUST_FIELD, (header_off - self.top) as u64);
        self.region.write_u64(header_off + PREV_FIELD, self.top_header);

        if let Some(pattern) = self.tracker.config().alloc_pattern {
            self.region.fill(payload_off, size, pattern);
        }
        self.top_header = header_off as u64;
        self.top = end;

        let ptr = self.region.ptr_at(payload_off);
        self.tracker
            .record_allocation(ptr.as_ptr() as usize, size, align, started.elapsed());
        Some(ptr)
    }

    fn deallocate(&mut self, ptr: NonNull<u8>) {
        let Some(offset) = self.region.offset_of(ptr) else {
            debug!(address = ptr.as_ptr() as usize, "ignoring deallocate of unowned pointer");
            return;
        };
        if self.top_header == NIL || offset != self.top_header as usize + HEADER_SIZE {
            debug!(offset, "ignoring out-of-order stack deallocate");
            return;
        }
        self.pop_top();
    }

    fn reset(&mut self) {
        self.top = 0;
        self.top_header = NIL;
        self.tracker.reset();
        debug!("stack allocator reset");
    }

    fn owns(&self, ptr: NonNull<u8>) -> bool {
        self.region
            .offset_of(ptr)
            .is_some_and(|offset| offset < self.top)
    }

    fn stats(&self) -> AllocationStats {
        self.tracker.stats()
    }

    fn history(&self) -> &[AllocationRecord] {
        self.tracker.history()
    }

    fn available(&self) -> usize {
        self.region.len() - self.top
    }

    fn total_size(&self) -> usize {
        self.region.len()
    }

    fn name(&self) -> &'static str {
        "stack"
    }
}
