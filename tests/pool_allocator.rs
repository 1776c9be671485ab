//! Pool allocator behavior.

use memory_engine::{Allocator, PoolAllocator, PoolConfig};

fn pool_64x4() -> PoolAllocator {
    PoolAllocator::new(PoolConfig::new(64, 4)).unwrap()
}

#[test]
fn slots_are_handed_out_in_address_order() {
    let mut pool = pool_64x4();

    let ptrs: Vec<_> = (0..4).map(|_| pool.allocate(64, 16).unwrap()).collect();
    let base = ptrs[0].as_ptr() as usize;
    for (i, ptr) in ptrs.iter().enumerate() {
        assert_eq!(ptr.as_ptr() as usize, base + i * 64);
    }

    // Pool is now exhausted.
    assert!(pool.allocate(64, 16).is_none());

    pool.reset();
    assert_eq!(pool.free_blocks(), 4);
    // Slot 0 comes back first after a reset.
    let first = pool.allocate(64, 16).unwrap();
    assert_eq!(first.as_ptr() as usize, base);
}

#[test]
fn freed_slot_is_reused_lifo() {
    let mut pool = pool_64x4();
    let a = pool.allocate(64, 16).unwrap();
    let _b = pool.allocate(64, 16).unwrap();

    pool.deallocate(a);
    let c = pool.allocate(64, 16).unwrap();
    assert_eq!(c.as_ptr(), a.as_ptr());
}

#[test]
fn block_count_is_conserved() {
    let mut pool = pool_64x4();
    assert_eq!(pool.free_blocks() + pool.allocated_blocks(), 4);

    let a = pool.allocate(16, 8).unwrap();
    let b = pool.allocate(16, 8).unwrap();
    assert_eq!(pool.free_blocks() + pool.allocated_blocks(), 4);
    assert_eq!(pool.allocated_blocks(), 2);

    pool.deallocate(a);
    pool.deallocate(b);
    assert_eq!(pool.free_blocks(), 4);
}

#[test]
fn oversized_request_fails() {
    let mut pool = pool_64x4();
    assert!(pool.allocate(65, 16).is_none());
    assert!(pool.allocate(64, 16).is_some());
}

#[test]
fn stronger_alignment_than_slots_fails() {
    let mut pool = pool_64x4();
    assert!(pool.allocate(64, 64).is_none());
}

#[test]
fn double_free_is_ignored() {
    let mut pool = pool_64x4();
    let a = pool.allocate(64, 16).unwrap();
    pool.deallocate(a);

    let before = pool.stats();
    pool.deallocate(a);
    assert_eq!(pool.stats(), before);
    assert_eq!(pool.free_blocks(), 4);
}

#[test]
fn misaligned_interior_pointer_is_ignored() {
    let mut pool = pool_64x4();
    let a = pool.allocate(64, 16).unwrap();

    // Points into the slot but not at its start.
    let interior = unsafe { a.add(8) };
    let before = pool.stats();
    pool.deallocate(interior);
    assert_eq!(pool.stats(), before);
    assert!(pool.owns(a));
}

#[test]
fn occupancy_grid_reflects_live_slots() {
    let mut pool = pool_64x4();
    assert_eq!(pool.occupancy_grid(), vec![false; 4]);

    let a = pool.allocate(64, 16).unwrap();
    let _b = pool.allocate(64, 16).unwrap();
    assert_eq!(pool.occupancy_grid(), vec![true, true, false, false]);

    pool.deallocate(a);
    assert_eq!(pool.occupancy_grid(), vec![false, true, false, false]);
}

#[test]
fn block_size_rounds_up_to_alignment() {
    let pool = PoolAllocator::new(PoolConfig::new(50, 4)).unwrap();
    assert_eq!(pool.block_size(), 64);
    assert_eq!(pool.total_size(), 256);
}

#[test]
fn invalid_configs_are_rejected() {
    assert!(PoolAllocator::new(PoolConfig::new(0, 4)).is_err());
    assert!(PoolAllocator::new(PoolConfig::new(64, 0)).is_err());
}

#[test]
fn pool_never_fragments() {
    let mut pool = pool_64x4();
    let a = pool.allocate(64, 16).unwrap();
    let _b = pool.allocate(64, 16).unwrap();
    pool.deallocate(a);
    assert_eq!(pool.stats().fragmentation_bytes, 0);
    assert_eq!(pool.fragmentation_percentage(), 0.0);
}
