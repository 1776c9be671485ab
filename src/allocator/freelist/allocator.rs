//! The free-list allocator proper.

use core::ptr::NonNull;
use std::time::Instant;

use tracing::debug;

use super::{FitPolicy, FreeListConfig};
use crate::allocator::Allocator;
use crate::error::{AllocError, AllocResult};
use crate::region::{NIL, Region};
use crate::stats::{AllocationRecord, AllocationStats, AllocationTracker};
use crate::utils::{align_up, sanitize_alignment};

// Allocation header, placed immediately before the payload:
//   +0  total bytes consumed from the free block (padding + header + payload)
//   +8  adjustment (padding between the block start and the header)
const HEADER_SIZE: usize = 16;

// Free node, placed at the block start:
//   +0  block size
//   +8  next free block offset, NIL terminates
const FREE_NODE_SIZE: usize = 16;

/// Remainders smaller than this are absorbed into the allocation instead
/// of forming a new free block.
const MIN_BLOCK_SIZE: usize = 16;

// Candidate found during the fit search.
struct Fit {
    prev: u64,
    offset: usize,
    block_size: usize,
    consumed: usize,
    adjustment: usize,
}

/// Variable-size allocator over an address-ordered free list.
#[derive(Debug)]
pub struct FreeListAllocator {
    region: Region,
    free_head: u64,
    policy: FitPolicy,
    tracker: AllocationTracker,
}

impl FreeListAllocator {
    /// Builds a free-list allocator from `config`. Fails when the capacity
    /// cannot hold a single free node or the region cannot be reserved.
    pub fn new(config: FreeListConfig) -> AllocResult<Self> {
        if config.capacity < FREE_NODE_SIZE + MIN_BLOCK_SIZE {
            return Err(AllocError::InvalidConfig(
                "free-list capacity too small for a single block",
            ));
        }
        let mut region = Region::new(config.capacity)?;
        region.write_u64(0, config.capacity as u64);
        region.write_u64(8, NIL);
        debug!(capacity = config.capacity, policy = ?config.policy, "free-list allocator created");
        Ok(Self {
            region,
            free_head: 0,
            policy: config.policy,
            tracker: AllocationTracker::new(config.tracking),
        })
    }

    /// The active fit policy.
    #[inline]
    pub fn policy(&self) -> FitPolicy {
        self.policy
    }

    /// Switches the fit policy. Takes effect on the next allocation.
    #[inline]
    pub fn set_policy(&mut self, policy: FitPolicy) {
        self.policy = policy;
    }

    /// Number of blocks on the free list.
    pub fn free_block_count(&self) -> usize {
        let mut count = 0;
        let mut cursor = self.free_head;
        while cursor != NIL {
            count += 1;
            cursor = self.region.read_u64(cursor as usize + 8);
        }
        count
    }

    /// Size of the largest free block, zero when the list is empty.
    pub fn largest_free_block(&self) -> usize {
        let mut largest = 0;
        let mut cursor = self.free_head;
        while cursor != NIL {
            largest = largest.max(self.region.read_u64(cursor as usize) as usize);
            cursor = self.region.read_u64(cursor as usize + 8);
        }
        largest
    }

    fn total_free(&self) -> usize {
        let mut total = 0;
        let mut cursor = self.free_head;
        while cursor != NIL {
            total += self.region.read_u64(cursor as usize) as usize;
            cursor = self.region.read_u64(cursor as usize + 8);
        }
        total
    }

    fn refresh_fragmentation(&mut self) {
        let frag = self.total_free() - self.largest_free_block();
        self.tracker.set_fragmentation(frag as u64);
    }

    // Fit test for one block: where would the payload land, and does it
    // fit? Alignment is computed on the absolute address; the region base
    // only guarantees 16 bytes.
    fn try_fit(&self, offset: usize, block_size: usize, size: usize, align: usize) -> Option<(usize, usize)> {
        let base = self.region.base_addr();
        let payload_off = align_up(base + offset + HEADER_SIZE, align) - base;
        let adjustment = payload_off - HEADER_SIZE - offset;
        let consumed = size.checked_add(adjustment + HEADER_SIZE)?;
        (consumed <= block_size).then_some((consumed, adjustment))
    }

    fn find_fit(&self, size: usize, align: usize) -> Option<Fit> {
        let mut best: Option<Fit> = None;
        let mut prev = NIL;
        let mut cursor = self.free_head;
        while cursor != NIL {
            let offset = cursor as usize;
            let block_size = self.region.read_u64(offset) as usize;
            let next = self.region.read_u64(offset + 8);

            if let Some((consumed, adjustment)) = self.try_fit(offset, block_size, size, align) {
                let candidate = Fit { prev, offset, block_size, consumed, adjustment };
                let better = match (&best, self.policy) {
                    (_, FitPolicy::FirstFit) => {
                        return Some(candidate);
                    }
                    (None, _) => true,
                    (Some(cur), FitPolicy::BestFit) => block_size < cur.block_size,
                    (Some(cur), FitPolicy::WorstFit) => block_size > cur.block_size,
                };
                if better {
                    best = Some(candidate);
                }
            }
            prev = cursor;
            cursor = next;
        }
        best
    }

    // Unlinks `fit` from the free list, splitting off the tail when it is
    // big enough to stand alone. Returns the bytes actually consumed.
    fn carve(&mut self, fit: &Fit) -> usize {
        let next = self.region.read_u64(fit.offset + 8);
        let remaining = fit.block_size - fit.consumed;

        let (replacement, consumed) = if remaining >= FREE_NODE_SIZE + MIN_BLOCK_SIZE {
            let tail = fit.offset + fit.consumed;
            self.region.write_u64(tail, remaining as u64);
            self.region.write_u64(tail + 8, next);
            (tail as u64, fit.consumed)
        } else {
            // Remainder too small to track; the allocation absorbs it.
            (next, fit.block_size)
        };

        if fit.prev == NIL {
            self.free_head = replacement;
        } else {
            self.region.write_u64(fit.prev as usize + 8, replacement);
        }
        consumed
    }

    // Inserts a free block in address order and merges with both
    // neighbors where they touch.
    fn insert_free_block(&mut self, offset: usize, size: usize) {
        let mut prev = NIL;
        let mut cursor = self.free_head;
        while cursor != NIL && (cursor as usize) < offset {
            prev = cursor;
            cursor = self.region.read_u64(cursor as usize + 8);
        }

        self.region.write_u64(offset, size as u64);
        self.region.write_u64(offset + 8, cursor);
        if prev == NIL {
            self.free_head = offset as u64;
        } else {
            self.region.write_u64(prev as usize + 8, offset as u64);
        }

        // Merge with the successor first so the predecessor merge sees the
        // combined size.
        if cursor != NIL && offset + size == cursor as usize {
            let next_size = self.region.read_u64(cursor as usize) as usize;
            let next_next = self.region.read_u64(cursor as usize + 8);
            self.region.write_u64(offset, (size + next_size) as u64);
            self.region.write_u64(offset + 8, next_next);
        }
        if prev != NIL {
            let prev_off = prev as usize;
            let prev_size = self.region.read_u64(prev_off) as usize;
            if prev_off + prev_size == offset {
                let cur_size = self.region.read_u64(offset) as usize;
                let cur_next = self.region.read_u64(offset + 8);
                self.region.write_u64(prev_off, (prev_size + cur_size) as u64);
                self.region.write_u64(prev_off + 8, cur_next);
            }
        }
    }

    // Whether the address sits inside a block currently on the free list.
    fn in_free_block(&self, offset: usize) -> bool {
        let mut cursor = self.free_head;
        while cursor != NIL {
            let start = cursor as usize;
            let size = self.region.read_u64(start) as usize;
            if offset >= start && offset < start + size {
                return true;
            }
            if start > offset {
                break;
            }
            cursor = self.region.read_u64(start + 8);
        }
        false
    }
}

impl Allocator for FreeListAllocator {
    fn allocate(&mut self, size: usize, align: usize) -> Option<NonNull<u8>> {
        if size == 0 {
            return None;
        }
        let started = Instant::now();
        let align = sanitize_alignment(align);

        let fit = self.find_fit(size, align)?;
        let consumed = self.carve(&fit);

        let header_off = fit.offset + fit.adjustment;
        let payload_off = header_off + HEADER_SIZE;
        self.region.write_u64(header_off, consumed as u64);
        self.region.write_u64(header_off + 8, fit.adjustment as u64);

        if let Some(pattern) = self.tracker.config().alloc_pattern {
            self.region.fill(payload_off, size, pattern);
        }
        let ptr = self.region.ptr_at(payload_off);
        self.tracker
            .record_allocation(ptr.as_ptr() as usize, consumed, align, started.elapsed());
        self.refresh_fragmentation();
        Some(ptr)
    }

    fn deallocate(&mut self, ptr: NonNull<u8>) {
        let address = ptr.as_ptr() as usize;
        let Some(payload_off) = self.region.offset_of(ptr) else {
            debug!(address, "ignoring deallocate of unowned pointer");
            return;
        };
        if payload_off < HEADER_SIZE || self.in_free_block(payload_off) {
            debug!(address, "ignoring deallocate of non-live pointer");
            return;
        }

        let started = Instant::now();
        let header_off = payload_off - HEADER_SIZE;
        let consumed = self.region.read_u64(header_off) as usize;
        let adjustment = self.region.read_u64(header_off + 8) as usize;
        let block_off = header_off - adjustment;

        if let Some(pattern) = self.tracker.config().dealloc_pattern {
            self.region.fill(block_off, consumed, pattern);
        }
        self.insert_free_block(block_off, consumed);
        self.tracker
            .record_deallocation(address, consumed, started.elapsed());
        self.refresh_fragmentation();
    }

    fn reset(&mut self) {
        let capacity = self.region.len();
        self.region.write_u64(0, capacity as u64);
        self.region.write_u64(8, NIL);
        self.free_head = 0;
        self.tracker.reset();
        debug!("free-list allocator reset");
    }

    fn owns(&self, ptr: NonNull<u8>) -> bool {
        self.region
            .offset_of(ptr)
            .is_some_and(|offset| offset >= HEADER_SIZE && !self.in_free_block(offset))
    }

    fn stats(&self) -> AllocationStats {
        self.tracker.stats()
    }

    fn history(&self) -> &[AllocationRecord] {
        self.tracker.history()
    }

    fn available(&self) -> usize {
        self.total_free()
    }

    fn total_size(&self) -> usize {
        self.region.len()
    }

    fn name(&self) -> &'static str {
        "free-list"
    }
}
