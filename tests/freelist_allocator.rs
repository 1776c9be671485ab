//! Free-list allocator behavior.

use std::ptr::NonNull;

use memory_engine::{Allocator, FitPolicy, FreeListAllocator, FreeListConfig};
use proptest::prelude::*;

fn freelist(capacity: usize, policy: FitPolicy) -> FreeListAllocator {
    FreeListAllocator::new(FreeListConfig::new(capacity).with_policy(policy)).unwrap()
}

#[test]
fn full_round_trip_coalesces_to_one_block() {
    let mut alloc = freelist(1024, FitPolicy::FirstFit);
    let a = alloc.allocate(100, 8).unwrap();
    let b = alloc.allocate(200, 8).unwrap();
    let c = alloc.allocate(50, 8).unwrap();

    // Arbitrary order exercises both neighbor merges.
    alloc.deallocate(b);
    alloc.deallocate(a);
    alloc.deallocate(c);

    assert_eq!(alloc.free_block_count(), 1);
    assert_eq!(alloc.largest_free_block(), 1024);
    assert_eq!(alloc.available(), 1024);
    assert_eq!(alloc.stats().fragmentation_bytes, 0);
}

// Carves the 496-byte region into an exact alternating pattern, then frees
// a, b and c to leave free blocks of 64, 208 and 128 bytes in address
// order. A 96-byte request needs 112 bytes with its header.
fn carve_three_holes(alloc: &mut FreeListAllocator) -> usize {
    let a = alloc.allocate(48, 8).unwrap();
    let _x1 = alloc.allocate(16, 8).unwrap();
    let b = alloc.allocate(192, 8).unwrap();
    let _x2 = alloc.allocate(16, 8).unwrap();
    let c = alloc.allocate(112, 8).unwrap();
    let _x3 = alloc.allocate(16, 8).unwrap();
    assert_eq!(alloc.available(), 0);

    let base = a.as_ptr() as usize - 16;
    alloc.deallocate(a);
    alloc.deallocate(b);
    alloc.deallocate(c);
    assert_eq!(alloc.free_block_count(), 3);
    base
}

#[test]
fn first_fit_takes_the_lowest_fitting_block() {
    let mut alloc = freelist(496, FitPolicy::FirstFit);
    let base = carve_three_holes(&mut alloc);
    let ptr = alloc.allocate(96, 8).unwrap();
    // The 64-byte hole is too small; the 208-byte hole at offset 96 wins.
    assert_eq!(ptr.as_ptr() as usize, base + 112);
}

#[test]
fn best_fit_takes_the_tightest_block() {
    let mut alloc = freelist(496, FitPolicy::BestFit);
    let base = carve_three_holes(&mut alloc);
    let ptr = alloc.allocate(96, 8).unwrap();
    // The 128-byte hole at offset 336 leaves the least waste.
    assert_eq!(ptr.as_ptr() as usize, base + 352);
}

#[test]
fn worst_fit_takes_the_largest_block() {
    let mut alloc = freelist(496, FitPolicy::WorstFit);
    let base = carve_three_holes(&mut alloc);
    let ptr = alloc.allocate(96, 8).unwrap();
    assert_eq!(ptr.as_ptr() as usize, base + 112);
}

#[test]
fn fragmentation_is_free_minus_largest() {
    let mut alloc = freelist(496, FitPolicy::FirstFit);
    carve_three_holes(&mut alloc);

    // Free blocks: 64 + 208 + 128 = 400, largest 208.
    assert_eq!(alloc.available(), 400);
    assert_eq!(alloc.largest_free_block(), 208);
    assert_eq!(alloc.stats().fragmentation_bytes, 192);
}

#[test]
fn fragmentation_percentage_is_relative_to_used_bytes() {
    let mut alloc = freelist(496, FitPolicy::FirstFit);
    assert_eq!(alloc.fragmentation_percentage(), 0.0);

    carve_three_holes(&mut alloc);
    // Live: the three 32-byte spacers; fragmented free space: 192 of 400.
    assert_eq!(alloc.stats().current_bytes_used, 96);
    assert!((alloc.fragmentation_percentage() - 200.0).abs() < 1e-9);

    alloc.reset();
    assert_eq!(alloc.fragmentation_percentage(), 0.0);
}

#[test]
fn policy_can_change_at_runtime() {
    let mut alloc = freelist(496, FitPolicy::FirstFit);
    assert_eq!(alloc.policy(), FitPolicy::FirstFit);
    let base = carve_three_holes(&mut alloc);

    alloc.set_policy(FitPolicy::BestFit);
    let ptr = alloc.allocate(96, 8).unwrap();
    assert_eq!(ptr.as_ptr() as usize, base + 352);
}

#[test]
fn small_remainders_are_absorbed() {
    let mut alloc = freelist(128, FitPolicy::FirstFit);
    // Consumes 16 + 96 = 112 and leaves 16, below the split threshold, so
    // the allocation absorbs the whole region.
    let ptr = alloc.allocate(96, 8).unwrap();
    assert_eq!(alloc.available(), 0);
    assert_eq!(alloc.free_block_count(), 0);

    alloc.deallocate(ptr);
    assert_eq!(alloc.available(), 128);
}

#[test]
fn exhaustion_returns_none() {
    let mut alloc = freelist(128, FitPolicy::FirstFit);
    assert!(alloc.allocate(256, 8).is_none());
    let _a = alloc.allocate(96, 8).unwrap();
    assert!(alloc.allocate(16, 8).is_none());
}

#[test]
fn requested_alignment_is_honored() {
    let mut alloc = freelist(1024, FitPolicy::FirstFit);
    alloc.allocate(10, 8).unwrap();
    for align in [16usize, 32, 64, 128] {
        let ptr = alloc.allocate(24, align).unwrap();
        assert_eq!(ptr.as_ptr() as usize % align, 0, "align {align}");
    }
}

#[test]
fn double_free_is_ignored() {
    let mut alloc = freelist(1024, FitPolicy::FirstFit);
    let a = alloc.allocate(100, 8).unwrap();
    alloc.deallocate(a);

    let before = alloc.stats();
    let count = alloc.free_block_count();
    alloc.deallocate(a);
    assert_eq!(alloc.stats(), before);
    assert_eq!(alloc.free_block_count(), count);
}

#[test]
fn reset_restores_a_single_block() {
    let mut alloc = freelist(1024, FitPolicy::BestFit);
    for _ in 0..5 {
        alloc.allocate(32, 8).unwrap();
    }
    alloc.reset();
    assert_eq!(alloc.free_block_count(), 1);
    assert_eq!(alloc.available(), 1024);
    assert_eq!(alloc.stats().total_allocations, 0);
}

#[test]
fn best_fit_is_the_default_policy() {
    assert_eq!(FitPolicy::default(), FitPolicy::BestFit);
    let alloc = FreeListAllocator::new(FreeListConfig::new(1024)).unwrap();
    assert_eq!(alloc.policy(), FitPolicy::BestFit);
}

#[test]
fn too_small_capacity_is_rejected() {
    assert!(FreeListAllocator::new(FreeListConfig::new(16)).is_err());
}

proptest! {
    // Random allocate/deallocate interleavings must conserve statistics
    // and coalesce back to a single block once everything is freed.
    #[test]
    fn random_sequences_conserve_memory(ops in prop::collection::vec((any::<bool>(), 1usize..200, 0u32..5), 1..60)) {
        let capacity = 8192;
        let mut alloc = freelist(capacity, FitPolicy::BestFit);
        let mut live: Vec<NonNull<u8>> = Vec::new();

        for (is_alloc, size, align_exp) in ops {
            if is_alloc {
                if let Some(ptr) = alloc.allocate(size, 1 << align_exp) {
                    prop_assert_eq!(ptr.as_ptr() as usize % (1 << align_exp), 0);
                    live.push(ptr);
                }
            } else if let Some(ptr) = live.pop() {
                alloc.deallocate(ptr);
            }

            let s = alloc.stats();
            prop_assert_eq!(s.current_allocations as usize, live.len());
            prop_assert_eq!(s.current_allocations, s.total_allocations - s.total_deallocations);
            prop_assert!(alloc.available() <= capacity);
        }

        while let Some(ptr) = live.pop() {
            alloc.deallocate(ptr);
        }
        prop_assert_eq!(alloc.free_block_count(), 1);
        prop_assert_eq!(alloc.available(), capacity);
        prop_assert_eq!(alloc.stats().fragmentation_bytes, 0);
    }
}
