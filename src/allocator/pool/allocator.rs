//! The pool allocator proper.

use core::ptr::NonNull;
use std::time::Instant;

use tracing::debug;

use super::PoolConfig;
use crate::allocator::Allocator;
use crate::error::{AllocError, AllocResult};
use crate::region::{NIL, Region};
use crate::stats::{AllocationRecord, AllocationStats, AllocationTracker};
use crate::utils::{align_up, padding_needed, sanitize_alignment};

/// Size of the intrusive free-list link stored in a free slot.
const LINK_SIZE: usize = size_of::<u64>();

/// Fixed-size block allocator with an intrusive LIFO free list.
#[derive(Debug)]
pub struct PoolAllocator {
    region: Region,
    block_size: usize,
    block_count: usize,
    alignment: usize,
    // Offset of slot 0; non-zero when the slot alignment is stronger than
    // what the region base guarantees.
    data_start: usize,
    free_head: u64,
    free_count: usize,
    occupied: Vec<bool>,
    tracker: AllocationTracker,
}

impl PoolAllocator {
    /// Builds a pool from `config`. Fails for zero sizes/counts, for slot
    /// arithmetic that overflows, and when the backing region cannot be
    /// reserved.
    pub fn new(config: PoolConfig) -> AllocResult<Self> {
        if config.block_size == 0 {
            return Err(AllocError::InvalidConfig("block_size must be non-zero"));
        }
        if config.block_count == 0 {
            return Err(AllocError::InvalidConfig("block_count must be non-zero"));
        }
        let alignment = sanitize_alignment(config.alignment);
        // A free slot must be able to hold the next-slot link.
        let block_size = align_up(config.block_size.max(LINK_SIZE), alignment);
        // Slack for aligning slot 0 when the alignment exceeds the region
        // base guarantee of 16 bytes.
        let slack = alignment.saturating_sub(16);
        let capacity = block_size
            .checked_mul(config.block_count)
            .and_then(|bytes| bytes.checked_add(slack))
            .ok_or(AllocError::SizeOverflow)?;

        let region = Region::new(capacity)?;
        let data_start = padding_needed(region.base_addr(), alignment);
        let mut pool = Self {
            region,
            block_size,
            block_count: config.block_count,
            alignment,
            data_start,
            free_head: NIL,
            free_count: 0,
            occupied: vec![false; config.block_count],
            tracker: AllocationTracker::new(config.tracking),
        };
        pool.build_free_list();
        debug!(
            block_size,
            block_count = config.block_count,
            "pool allocator created"
        );
        Ok(pool)
    }

    /// Slot size after alignment rounding.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Total number of slots.
    #[inline]
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    /// Slots currently on the free list.
    #[inline]
    pub fn free_blocks(&self) -> usize {
        self.free_count
    }

    /// Slots currently handed out.
    #[inline]
    pub fn allocated_blocks(&self) -> usize {
        self.block_count - self.free_count
    }

    /// Per-slot occupancy snapshot, `true` meaning allocated. Index 0 is
    /// the slot at the region base.
    pub fn occupancy_grid(&self) -> Vec<bool> {
        self.occupied.clone()
    }

    // Links slots last-to-first so slot 0 is popped first.
    fn build_free_list(&mut self) {
        let mut head = NIL;
        for index in (0..self.block_count).rev() {
            let offset = self.data_start + index * self.block_size;
            self.region.write_u64(offset, head);
            head = offset as u64;
        }
        self.free_head = head;
        self.free_count = self.block_count;
        self.occupied.fill(false);
    }

    // Slot index for an owned, slot-aligned pointer.
    fn slot_of(&self, ptr: NonNull<u8>) -> Option<usize> {
        let offset = self.region.offset_of(ptr)?;
        let relative = offset.checked_sub(self.data_start)?;
        (relative % self.block_size == 0 && relative / self.block_size < self.block_count)
            .then(|| relative / self.block_size)
    }
}

impl Allocator for PoolAllocator {
    fn allocate(&mut self, size: usize, align: usize) -> Option<NonNull<u8>> {
        if size == 0 || size > self.block_size {
            return None;
        }
        let align = sanitize_alignment(align);
        if align > self.alignment {
            debug!(requested = align, slot = self.alignment, "pool cannot serve alignment");
            return None;
        }
        if self.free_head == NIL {
            return None;
        }

        let started = Instant::now();
        let offset = self.free_head as usize;
        self.free_head = self.region.read_u64(offset);
        self.free_count -= 1;
        self.occupied[(offset - self.data_start) / self.block_size] = true;

        if let Some(pattern) = self.tracker.config().alloc_pattern {
            self.region.fill(offset, self.block_size, pattern);
        }
        let ptr = self.region.ptr_at(offset);
        // The whole slot is consumed regardless of the requested size, so
        // statistics count slot bytes on both paths.
        self.tracker
            .record_allocation(ptr.as_ptr() as usize, self.block_size, align, started.elapsed());
        Some(ptr)
    }

    fn deallocate(&mut self, ptr: NonNull<u8>) {
        let Some(slot) = self.slot_of(ptr) else {
            debug!(address = ptr.as_ptr() as usize, "ignoring deallocate of unowned pointer");
            return;
        };
        if !self.occupied[slot] {
            debug!(slot, "ignoring deallocate of free slot");
            return;
        }

        let started = Instant::now();
        let offset = self.data_start + slot * self.block_size;
        if let Some(pattern) = self.tracker.config().dealloc_pattern {
            self.region.fill(offset, self.block_size, pattern);
        }
        self.region.write_u64(offset, self.free_head);
        self.free_head = offset as u64;
        self.free_count += 1;
        self.occupied[slot] = false;
        self.tracker
            .record_deallocation(ptr.as_ptr() as usize, self.block_size, started.elapsed());
    }

    fn reset(&mut self) {
        self.build_free_list();
        self.tracker.reset();
        debug!("pool allocator reset");
    }

    fn owns(&self, ptr: NonNull<u8>) -> bool {
        self.slot_of(ptr).is_some_and(|slot| self.occupied[slot])
    }

    fn stats(&self) -> AllocationStats {
        self.tracker.stats()
    }

    fn history(&self) -> &[AllocationRecord] {
        self.tracker.history()
    }

    fn available(&self) -> usize {
        self.free_count * self.block_size
    }

    fn total_size(&self) -> usize {
        self.block_count * self.block_size
    }

    fn name(&self) -> &'static str {
        "pool"
    }
}
