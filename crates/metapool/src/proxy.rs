//! Type-erased freelist handles for the hot path.
//!
//! The allocator core addresses freelists by flat global index through a
//! table of proxies: an opaque freelist pointer plus three function
//! pointers. The indirection keeps the core free of any per-class type
//! knowledge — `free` turns a decoded header straight into a table slot
//! with no discrimination on which metapool owns the block.

use std::ptr::NonNull;

use crate::freelist::Freelist;

type FetchFn = unsafe fn(*mut ()) -> Option<NonNull<u8>>;
type ReleaseFn = unsafe fn(*mut (), NonNull<u8>);
type ResetFn = unsafe fn(*mut ());

/// One proxy table entry: `(opaque freelist, fetch, release, reset)`.
pub struct FreelistProxy {
    freelist: *mut (),
    fetch: FetchFn,
    release: ReleaseFn,
    reset: ResetFn,
}

impl FreelistProxy {
    /// Binds a proxy to a freelist. The freelist must stay at this address
    /// for the proxy's lifetime; [`Metapool`](crate::metapool::Metapool)
    /// guarantees that by keeping its classes in a boxed slice.
    pub(crate) fn new(freelist: NonNull<Freelist>) -> Self {
        Self {
            freelist: freelist.as_ptr().cast(),
            fetch: fetch_erased,
            release: release_erased,
            reset: reset_erased,
        }
    }

    /// Pops a block from the underlying freelist.
    #[inline]
    #[must_use]
    pub fn fetch(&self) -> Option<NonNull<u8>> {
        // SAFETY: the opaque pointer was erased from a live Freelist and the
        // single-threaded ownership model rules out concurrent access.
        unsafe { (self.fetch)(self.freelist) }
    }

    /// Pushes a block back onto the underlying freelist.
    ///
    /// # Safety
    ///
    /// `user` must be a user pointer fetched from this proxy's freelist.
    #[inline]
    pub unsafe fn release(&self, user: NonNull<u8>) {
        // SAFETY: as in fetch; the block contract is the caller's.
        unsafe { (self.release)(self.freelist, user) }
    }

    /// Re-threads the underlying freelist.
    ///
    /// # Safety
    ///
    /// Invalidates every pointer handed out by this proxy's freelist.
    #[inline]
    pub unsafe fn reset(&self) {
        // SAFETY: as in fetch.
        unsafe { (self.reset)(self.freelist) }
    }
}

unsafe fn fetch_erased(freelist: *mut ()) -> Option<NonNull<u8>> {
    // SAFETY: the pointer identifies a live Freelist (proxy construction
    // invariant); we are the only accessor on this thread.
    unsafe { (*freelist.cast::<Freelist>()).fetch() }
}

unsafe fn release_erased(freelist: *mut (), user: NonNull<u8>) {
    // SAFETY: as in fetch_erased; the user pointer contract is forwarded.
    unsafe { (*freelist.cast::<Freelist>()).release(user) }
}

unsafe fn reset_erased(freelist: *mut ()) {
    // SAFETY: as in fetch_erased.
    unsafe { (*freelist.cast::<Freelist>()).reset() }
}
