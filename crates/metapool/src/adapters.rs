//! Protocol adapters over the allocator core.
//!
//! Two ambient protocols are served with no behavioral change:
//!
//! - the per-element allocator protocol (`allocator_api2::alloc::Allocator`,
//!   the stable ecosystem stand-in for `std::alloc::Allocator`), which lets
//!   allocator-aware containers — `allocator_api2::vec::Vec`, hashbrown
//!   maps — run on a [`MetapoolAllocator`] handle;
//! - a type-erased byte protocol, [`MemoryResource`], with identity
//!   equality, for callers that want to pass `&dyn` resources across API
//!   seams.
//!
//! Handles are shallowly copyable; every copy of one handle addresses the
//! same stack, so copies are interchangeable ("always equal" in the
//! container-protocol sense).

use std::alloc::Layout;
use std::ptr::NonNull;

use allocator_api2::alloc::{AllocError, Allocator};

use crate::fail::{self, err};
use crate::metaset::MetasetSpec;
use crate::model::MetapoolAllocator;

fn layout_width(layout: Layout) -> (u32, u32) {
    let Ok(size) = u32::try_from(layout.size()) else {
        fail::fatal_ctx(
            err::LOOKUP_NO_MATCH,
            &format!("size = {}, align = {}", layout.size(), layout.align()),
        )
    };
    (size, layout.align() as u32)
}

// SAFETY: allocate returns blocks sized and aligned per the layout (routing
// guarantees stride >= size + header and stride divisible by the requested
// alignment); blocks stay valid until deallocated; copies of a handle all
// address the same stack, so any copy may deallocate.
unsafe impl<S: MetasetSpec> Allocator for MetapoolAllocator<'_, S> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        if layout.size() == 0 {
            // SAFETY: an alignment is non-zero, so the pointer is non-null.
            let dangling =
                unsafe { NonNull::new_unchecked(std::ptr::without_provenance_mut(layout.align())) };
            return Ok(NonNull::slice_from_raw_parts(dangling, 0));
        }

        let (size, align) = layout_width(layout);
        Ok(NonNull::slice_from_raw_parts(
            self.alloc(size, align),
            layout.size(),
        ))
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() == 0 {
            return;
        }
        // SAFETY: ptr came from allocate on a handle to the same stack
        // (caller contract).
        unsafe { self.free(ptr.as_ptr()) }
    }
}

/// Type-erased memory resource: raw byte allocation with identity equality.
pub trait MemoryResource {
    /// Allocates `size` bytes at `alignment`; infallible or fatal.
    fn allocate(&self, size: usize, alignment: usize) -> NonNull<u8>;

    /// Returns a previously allocated block.
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate` on an equal resource, unfreed, with
    /// `size` and `alignment` matching that call.
    unsafe fn deallocate(&self, ptr: *mut u8, size: usize, alignment: usize);

    /// Identity comparison: two resources are equal when they are the same
    /// object.
    fn is_equal(&self, other: &dyn MemoryResource) -> bool {
        std::ptr::addr_eq(self as *const Self, other as *const dyn MemoryResource)
    }
}

impl<S: MetasetSpec> MemoryResource for MetapoolAllocator<'_, S> {
    fn allocate(&self, size: usize, alignment: usize) -> NonNull<u8> {
        let Ok(size) = u32::try_from(size) else {
            fail::fatal_ctx(
                err::LOOKUP_NO_MATCH,
                &format!("size = {size}, align = {alignment}"),
            )
        };
        self.alloc(size, alignment as u32)
    }

    unsafe fn deallocate(&self, ptr: *mut u8, _size: usize, _alignment: usize) {
        // SAFETY: forwarded caller contract; the header routes the block.
        unsafe { self.free(ptr) }
    }
}
