//! RAII frame for scoped stack allocation.

use super::{Marker, StackAllocator};

/// Rolls the stack back to the position it had when the frame was created,
/// as soon as the frame is dropped.
pub struct StackFrame<'a> {
    allocator: &'a mut StackAllocator,
    marker: Marker,
}

impl<'a> StackFrame<'a> {
    /// Opens a frame at the allocator's current top.
    pub fn new(allocator: &'a mut StackAllocator) -> Self {
        let marker = allocator.marker();
        Self { allocator, marker }
    }

    /// Access to the underlying allocator for allocations inside the frame.
    pub fn allocator(&mut self) -> &mut StackAllocator {
        self.allocator
    }

    /// Rolls back and consumes the frame.
    pub fn restore(self) {
        drop(self);
    }
}

impl Drop for StackFrame<'_> {
    fn drop(&mut self) {
        self.allocator.rollback_to_marker(self.marker);
    }
}
