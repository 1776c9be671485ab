//! Backing storage for the region-based allocators.
//!
//! A [`Region`] owns a fixed block of heap memory and exposes it through
//! byte offsets rather than raw pointers. Allocator bookkeeping (free-list
//! nodes, stack headers) is encoded into the region itself with the
//! little-endian `u64` codec below, so the allocators never reinterpret
//! user pointers as linked-list nodes.

use core::ptr::{self, NonNull};

use crate::error::{AllocError, AllocResult};

/// Sentinel offset meaning "no node" in intrusive structures stored inside
/// a region.
pub const NIL: u64 = u64::MAX;

/// A fixed-capacity block of owned memory addressed by byte offsets.
///
/// The buffer is backed by `u128` words, which guarantees the base address
/// is 16-byte aligned regardless of the host allocator. All pointers handed
/// out by the allocators derive from the single base pointer captured at
/// construction.
#[derive(Debug)]
pub struct Region {
    // Held for ownership; all access goes through `base`.
    _buf: Box<[u128]>,
    base: *mut u8,
    len: usize,
}

// Single-owner by construction: the raw base pointer aliases only `_buf`,
// which moves together with the struct.
unsafe impl Send for Region {}

impl Region {
    /// Reserves `capacity` bytes. Fails with [`AllocError::OutOfMemory`]
    /// when the host allocator cannot satisfy the reservation, and with
    /// [`AllocError::InvalidConfig`] for a zero capacity.
    pub fn new(capacity: usize) -> AllocResult<Self> {
        if capacity == 0 {
            return Err(AllocError::InvalidConfig("region capacity must be non-zero"));
        }
        let words = capacity.div_ceil(size_of::<u128>());

        let mut vec: Vec<u128> = Vec::new();
        vec.try_reserve_exact(words)
            .map_err(|_| AllocError::OutOfMemory { requested: capacity })?;
        vec.resize(words, 0);

        let mut buf = vec.into_boxed_slice();
        let base = buf.as_mut_ptr().cast::<u8>();
        Ok(Self { _buf: buf, base, len: capacity })
    }

    /// Usable capacity in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Base address of the region.
    #[inline]
    pub fn base_addr(&self) -> usize {
        self.base as usize
    }

    /// Whether `addr` falls inside the region.
    #[inline]
    pub fn contains_addr(&self, addr: usize) -> bool {
        addr >= self.base_addr() && addr < self.base_addr() + self.len
    }

    /// Byte offset of `ptr` inside the region, or `None` if the pointer is
    /// not owned by this region.
    #[inline]
    pub fn offset_of(&self, ptr: NonNull<u8>) -> Option<usize> {
        let addr = ptr.as_ptr() as usize;
        self.contains_addr(addr).then(|| addr - self.base_addr())
    }

    /// Pointer to the byte at `offset`.
    ///
    /// # Panics
    /// Debug builds assert `offset < len`.
    #[inline]
    pub fn ptr_at(&self, offset: usize) -> NonNull<u8> {
        debug_assert!(offset < self.len);
        // SAFETY: offset is within the buffer, and base came from a live
        // Box allocation owned by self.
        unsafe { NonNull::new_unchecked(self.base.add(offset)) }
    }

    /// Reads a little-endian `u64` at `offset`. The offset need not be
    /// 8-byte aligned.
    #[inline]
    pub fn read_u64(&self, offset: usize) -> u64 {
        debug_assert!(offset + size_of::<u64>() <= self.len);
        // SAFETY: the 8 bytes at offset are inside the buffer.
        let raw = unsafe { ptr::read_unaligned(self.base.add(offset).cast::<u64>()) };
        u64::from_le(raw)
    }

    /// Writes a little-endian `u64` at `offset`.
    #[inline]
    pub fn write_u64(&mut self, offset: usize, value: u64) {
        debug_assert!(offset + size_of::<u64>() <= self.len);
        // SAFETY: the 8 bytes at offset are inside the buffer, and &mut self
        // guarantees exclusive access.
        unsafe { ptr::write_unaligned(self.base.add(offset).cast::<u64>(), value.to_le()) };
    }

    /// Fills `count` bytes starting at `offset` with `byte`. Used for the
    /// debug poison patterns.
    #[inline]
    pub fn fill(&mut self, offset: usize, count: usize, byte: u8) {
        debug_assert!(offset + count <= self.len);
        // SAFETY: the range is inside the buffer and exclusively borrowed.
        unsafe { ptr::write_bytes(self.base.add(offset), byte, count) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::is_aligned;

    #[test]
    fn test_base_is_16_byte_aligned() {
        let region = Region::new(64).unwrap();
        assert!(is_aligned(region.base_addr(), 16));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(Region::new(0), Err(AllocError::InvalidConfig(_))));
    }

    #[test]
    fn test_u64_codec_round_trip() {
        let mut region = Region::new(64).unwrap();
        region.write_u64(0, 0xDEAD_BEEF);
        region.write_u64(24, NIL);
        assert_eq!(region.read_u64(0), 0xDEAD_BEEF);
        assert_eq!(region.read_u64(24), NIL);
    }

    #[test]
    fn test_unaligned_codec_offsets() {
        let mut region = Region::new(64).unwrap();
        region.write_u64(3, 42);
        assert_eq!(region.read_u64(3), 42);
    }

    #[test]
    fn test_ownership_checks() {
        let region = Region::new(32).unwrap();
        assert!(region.contains_addr(region.base_addr()));
        assert!(region.contains_addr(region.base_addr() + 31));
        assert!(!region.contains_addr(region.base_addr() + 32));

        let inside = region.ptr_at(8);
        assert_eq!(region.offset_of(inside), Some(8));
    }
}
