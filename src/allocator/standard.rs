//! Tracking wrapper over the platform allocator.
//!
//! Serves as the baseline strategy: every request is delegated to
//! [`std::alloc::System`], and an address table records the size and
//! alignment of each live allocation so `deallocate`, `owns` and `reset`
//! work without the caller passing a layout back.

use core::alloc::{GlobalAlloc, Layout};
use core::ptr::NonNull;
use std::alloc::System;
use std::time::Instant;

use hashbrown::HashMap;
use tracing::debug;

use super::Allocator;
use crate::stats::{AllocationRecord, AllocationStats, AllocationTracker, TrackingConfig};
use crate::utils::sanitize_alignment;

/// Platform allocator with per-allocation tracking.
#[derive(Debug)]
pub struct StandardAllocator {
    // address -> (size, alignment)
    live: HashMap<usize, (usize, usize)>,
    tracker: AllocationTracker,
}

impl StandardAllocator {
    /// Creates an allocator with the given tracking configuration.
    pub fn new(tracking: TrackingConfig) -> Self {
        Self {
            live: HashMap::new(),
            tracker: AllocationTracker::new(tracking),
        }
    }

    /// Number of live allocations in the table.
    #[inline]
    pub fn live_allocations(&self) -> usize {
        self.live.len()
    }

    fn release(&mut self, addr: usize, size: usize, align: usize) {
        let started = Instant::now();
        if let Some(pattern) = self.tracker.config().dealloc_pattern {
            // SAFETY: the table only holds addresses of live System
            // allocations of exactly `size` bytes.
            unsafe { core::ptr::write_bytes(addr as *mut u8, pattern, size) };
        }
        // SAFETY: layout parameters were validated when the allocation was
        // made and stored unchanged in the table.
        unsafe {
            let layout = Layout::from_size_align_unchecked(size, align);
            System.dealloc(addr as *mut u8, layout);
        }
        self.tracker.record_deallocation(addr, size, started.elapsed());
    }
}

impl Default for StandardAllocator {
    fn default() -> Self {
        Self::new(TrackingConfig::new())
    }
}

impl Allocator for StandardAllocator {
    fn allocate(&mut self, size: usize, align: usize) -> Option<NonNull<u8>> {
        if size == 0 {
            return None;
        }
        let started = Instant::now();
        let align = sanitize_alignment(align);
        let layout = Layout::from_size_align(size, align).ok()?;

        // SAFETY: layout has non-zero size and a power-of-two alignment.
        let raw = unsafe { System.alloc(layout) };
        let ptr = NonNull::new(raw)?;

        if let Some(pattern) = self.tracker.config().alloc_pattern {
            // SAFETY: System just returned `size` writable bytes at `raw`.
            unsafe { core::ptr::write_bytes(raw, pattern, size) };
        }
        self.live.insert(ptr.as_ptr() as usize, (size, align));
        self.tracker
            .record_allocation(ptr.as_ptr() as usize, size, align, started.elapsed());
        Some(ptr)
    }

    fn deallocate(&mut self, ptr: NonNull<u8>) {
        let addr = ptr.as_ptr() as usize;
        match self.live.remove(&addr) {
            Some((size, align)) => self.release(addr, size, align),
            None => debug!(address = addr, "ignoring deallocate of unowned pointer"),
        }
    }

    fn reset(&mut self) {
        let entries: Vec<(usize, (usize, usize))> = self.live.drain().collect();
        for (addr, (size, align)) in entries {
            self.release(addr, size, align);
        }
        self.tracker.reset();
        debug!("standard allocator reset");
    }

    fn owns(&self, ptr: NonNull<u8>) -> bool {
        self.live.contains_key(&(ptr.as_ptr() as usize))
    }

    fn stats(&self) -> AllocationStats {
        self.tracker.stats()
    }

    fn history(&self) -> &[AllocationRecord] {
        self.tracker.history()
    }

    fn available(&self) -> usize {
        usize::MAX
    }

    fn total_size(&self) -> usize {
        usize::MAX
    }

    fn name(&self) -> &'static str {
        "standard"
    }
}

impl Drop for StandardAllocator {
    fn drop(&mut self) {
        let entries: Vec<(usize, (usize, usize))> = self.live.drain().collect();
        for (addr, (size, align)) in entries {
            self.release(addr, size, align);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_tracks_and_frees() {
        let mut alloc = StandardAllocator::default();
        let ptr = alloc.allocate(64, 8).unwrap();
        assert!(alloc.owns(ptr));
        assert_eq!(alloc.live_allocations(), 1);

        alloc.deallocate(ptr);
        assert!(!alloc.owns(ptr));
        assert_eq!(alloc.live_allocations(), 0);
    }

    #[test]
    fn test_zero_size_returns_none() {
        let mut alloc = StandardAllocator::default();
        assert!(alloc.allocate(0, 8).is_none());
    }

    #[test]
    fn test_unowned_deallocate_is_noop() {
        let mut alloc = StandardAllocator::default();
        let mut value = 0u64;
        let foreign = NonNull::from(&mut value).cast::<u8>();
        alloc.deallocate(foreign);
        assert_eq!(alloc.stats().total_deallocations, 0);
    }

    #[test]
    fn test_malformed_alignment_corrected() {
        let mut alloc = StandardAllocator::default();
        let ptr = alloc.allocate(32, 3).unwrap();
        assert_eq!(ptr.as_ptr() as usize % 16, 0);
        alloc.deallocate(ptr);
    }

    #[test]
    fn test_reset_frees_everything() {
        let mut alloc = StandardAllocator::default();
        for _ in 0..4 {
            alloc.allocate(16, 8).unwrap();
        }
        alloc.reset();
        assert_eq!(alloc.live_allocations(), 0);
        assert_eq!(alloc.stats(), AllocationStats::default());
    }
}
