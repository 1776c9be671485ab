//! Allocation statistics and history tracking.
//!
//! Every allocator owns one [`AllocationTracker`]: a snapshot-able
//! [`AllocationStats`] plus an optional bounded log of
//! [`AllocationRecord`]s. The tracker also carries the debug fill patterns
//! applied by the region-based allocators.

use std::fmt;
use std::time::{Duration, Instant};

use crate::utils::format_bytes;

/// Point-in-time statistics for a single allocator.
///
/// Invariants maintained by [`AllocationTracker`]:
/// - `current_allocations == total_allocations - total_deallocations`
/// - `current_bytes_used <= peak_bytes_used <= total_bytes_allocated`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocationStats {
    /// Successful allocations since construction or the last reset.
    pub total_allocations: u64,
    /// Successful deallocations since construction or the last reset.
    pub total_deallocations: u64,
    /// Allocations currently outstanding.
    pub current_allocations: u64,
    /// Cumulative bytes handed out, never decremented.
    pub total_bytes_allocated: u64,
    /// Bytes currently outstanding.
    pub current_bytes_used: u64,
    /// High-water mark of `current_bytes_used`.
    pub peak_bytes_used: u64,
    /// Free bytes unusable for the largest possible request
    /// (`total_free - largest_free_block`); zero for strategies that
    /// cannot fragment.
    pub fragmentation_bytes: u64,
    /// Running average time per allocation, in nanoseconds.
    pub avg_allocation_time_ns: u64,
    /// Running average time per deallocation, in nanoseconds.
    pub avg_dealloc_time_ns: u64,
}

impl fmt::Display for AllocationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "allocs: {} ({} live), used: {} (peak {}), frag: {}, avg alloc {}ns / dealloc {}ns",
            self.total_allocations,
            self.current_allocations,
            format_bytes(self.current_bytes_used as usize),
            format_bytes(self.peak_bytes_used as usize),
            format_bytes(self.fragmentation_bytes as usize),
            self.avg_allocation_time_ns,
            self.avg_dealloc_time_ns,
        )
    }
}

/// One entry in an allocator's history log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationRecord {
    /// Address returned to the caller.
    pub address: usize,
    /// Bytes accounted to the allocation: the requested size for the
    /// standard and stack strategies, the whole slot or carved block for
    /// the block-granular pool and free-list strategies.
    pub size: usize,
    /// Alignment the allocation was served with.
    pub alignment: usize,
    /// Nanoseconds since the owning tracker was created.
    pub timestamp_ns: u64,
    /// `true` until the allocation is deallocated or the allocator resets.
    pub is_active: bool,
}

/// Tracking behavior knobs, following the config-variant convention used
/// across the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingConfig {
    /// Maximum history entries kept; `None` keeps everything, `Some(0)`
    /// disables the log.
    pub history_limit: Option<usize>,
    /// Byte written over fresh payloads, if set.
    pub alloc_pattern: Option<u8>,
    /// Byte written over freed payloads, if set.
    pub dealloc_pattern: Option<u8>,
}

impl TrackingConfig {
    /// Balanced default: bounded history, no poisoning.
    pub const fn new() -> Self {
        Self {
            history_limit: Some(4096),
            alloc_pattern: None,
            dealloc_pattern: None,
        }
    }

    /// Debug variant: unbounded history and poison patterns on both paths.
    pub const fn debug() -> Self {
        Self {
            history_limit: None,
            alloc_pattern: Some(0xCC),
            dealloc_pattern: Some(0xDD),
        }
    }

    /// Production variant: no history log, no poisoning.
    pub const fn production() -> Self {
        Self {
            history_limit: Some(0),
            alloc_pattern: None,
            dealloc_pattern: None,
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics plus bounded allocation history for one allocator.
#[derive(Debug)]
pub struct AllocationTracker {
    stats: AllocationStats,
    history: Vec<AllocationRecord>,
    config: TrackingConfig,
    epoch: Instant,
}

impl AllocationTracker {
    /// Creates an empty tracker.
    pub fn new(config: TrackingConfig) -> Self {
        Self {
            stats: AllocationStats::default(),
            history: Vec::new(),
            config,
            epoch: Instant::now(),
        }
    }

    /// The active tracking configuration.
    #[inline]
    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    /// Snapshot of the current statistics.
    #[inline]
    pub fn stats(&self) -> AllocationStats {
        self.stats
    }

    /// The history log, oldest first.
    #[inline]
    pub fn history(&self) -> &[AllocationRecord] {
        &self.history
    }

    /// Records a successful allocation.
    pub fn record_allocation(
        &mut self,
        address: usize,
        size: usize,
        alignment: usize,
        elapsed: Duration,
    ) {
        let s = &mut self.stats;
        s.total_allocations += 1;
        s.current_allocations = s.total_allocations - s.total_deallocations;
        s.total_bytes_allocated += size as u64;
        s.current_bytes_used += size as u64;
        if s.current_bytes_used > s.peak_bytes_used {
            s.peak_bytes_used = s.current_bytes_used;
        }
        s.avg_allocation_time_ns = running_average(
            s.avg_allocation_time_ns,
            elapsed.as_nanos() as u64,
            s.total_allocations,
        );

        if self.config.history_limit != Some(0) {
            if let Some(limit) = self.config.history_limit
                && self.history.len() == limit
            {
                self.history.remove(0);
            }
            self.history.push(AllocationRecord {
                address,
                size,
                alignment,
                timestamp_ns: self.epoch.elapsed().as_nanos() as u64,
                is_active: true,
            });
        }
    }

    /// Records a successful deallocation of `size` bytes at `address`.
    pub fn record_deallocation(&mut self, address: usize, size: usize, elapsed: Duration) {
        let s = &mut self.stats;
        s.total_deallocations += 1;
        s.current_allocations = s.total_allocations - s.total_deallocations;
        s.current_bytes_used = s.current_bytes_used.saturating_sub(size as u64);
        s.avg_dealloc_time_ns = running_average(
            s.avg_dealloc_time_ns,
            elapsed.as_nanos() as u64,
            s.total_deallocations,
        );

        // Most recent matching active record wins; LIFO strategies always
        // free the newest allocation first.
        if let Some(record) = self
            .history
            .iter_mut()
            .rev()
            .find(|r| r.is_active && r.address == address)
        {
            record.is_active = false;
        }
    }

    /// Re-derives the fragmentation figure after free-list mutations.
    #[inline]
    pub fn set_fragmentation(&mut self, bytes: u64) {
        self.stats.fragmentation_bytes = bytes;
    }

    /// Clears statistics and marks every history entry inactive.
    pub fn reset(&mut self) {
        self.stats = AllocationStats::default();
        for record in &mut self.history {
            record.is_active = false;
        }
    }
}

#[inline]
fn running_average(avg: u64, sample: u64, count: u64) -> u64 {
    debug_assert!(count > 0);
    (avg * (count - 1) + sample) / count
}
