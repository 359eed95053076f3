//! The slag: an unordered growable sequence with swap-removal.
//!
//! A slag is the vault's order-indifferent sibling: same `(beg, end, cap)`
//! storage discipline, same lazy acquisition and doubling growth, but no
//! positional insertion or ordered removal. Elements leave through
//! [`remove_swap`](Slag::remove_swap), which moves the last element into
//! the vacated slot — O(1) removal for free-form working sets (live
//! particle lists, contact pools) where element order carries no meaning.
//!
//! Slags always bind this thread's allocator; for allocator-scoped
//! sequences use [`Vault`](crate::Vault) with a `Shared` stack.

use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::ptr;

use metapool::fail::{self, err};
use metapool::{MetapoolAllocator, MetasetSpec, get_allocator};

/// Unordered growable sequence of `T` bound to metaset `S`.
///
/// Same invariants as the vault: `beg <= end <= cap`, null `beg` implies
/// null `end`/`cap`, `[beg, end)` constructed, `[end, cap)` raw. Move-only;
/// removal order scrambles element order by design.
///
/// # Example
///
/// ```
/// use metapool::{CapacityFunction, MetapoolConfig, MetasetSpec};
/// use metapool_cntr::Slag;
///
/// struct LiveSet;
/// impl MetasetSpec for LiveSet {
///     const POOLS: &'static [MetapoolConfig] =
///         &[MetapoolConfig::new(CapacityFunction::Flat, 16, 32, &[32, 1024])];
/// }
///
/// let mut live: Slag<u32, LiveSet> = Slag::with_capacity(4);
/// live.push(10);
/// live.push(20);
/// live.push(30);
///
/// // The last element fills the hole; order is not preserved.
/// assert_eq!(live.remove_swap(0), 10);
/// assert_eq!(&live[..], &[30, 20]);
/// ```
pub struct Slag<T, S: MetasetSpec> {
    beg: *mut T,
    end: *mut T,
    cap: *mut T,
    alloc: MetapoolAllocator<'static, S>,
    _own: PhantomData<T>,
}

impl<T, S: MetasetSpec> Slag<T, S> {
    /// An empty slag on this thread's allocator; no storage yet.
    #[must_use]
    pub fn new() -> Self {
        const {
            assert!(
                size_of::<T>() != 0,
                "slag does not support zero-sized element types"
            );
        }
        Self {
            beg: ptr::null_mut(),
            end: ptr::null_mut(),
            cap: ptr::null_mut(),
            alloc: get_allocator::<S>(),
            _own: PhantomData,
        }
    }

    /// A slag with exactly `capacity` raw slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slag = Self::new();
        if capacity > 0 {
            slag.acquire(capacity);
        }
        slag
    }

    /// A slag holding `count` clones of `value`.
    #[must_use]
    pub fn filled(count: usize, value: T) -> Self
    where
        T: Clone,
    {
        let mut slag = Self::with_capacity(count);
        for _ in 0..count {
            slag.push(value.clone());
        }
        slag
    }

    /// Number of live elements.
    #[must_use]
    pub fn len(&self) -> usize {
        if self.beg.is_null() {
            0
        } else {
            // SAFETY: beg and end bound one live allocation.
            unsafe { self.end.offset_from(self.beg) as usize }
        }
    }

    /// Whether no elements are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end == self.beg
    }

    /// Slots the current storage can hold without growing.
    #[must_use]
    pub fn capacity(&self) -> usize {
        if self.beg.is_null() {
            0
        } else {
            // SAFETY: beg and cap bound one live allocation.
            unsafe { self.cap.offset_from(self.beg) as usize }
        }
    }

    /// Raw pointer to the first element; null before first acquisition.
    #[must_use]
    pub fn data(&self) -> *const T {
        self.beg
    }

    /// Appends an element, growing if full. Amortized O(1).
    pub fn push(&mut self, value: T) {
        if self.end == self.cap {
            self.grow();
        }
        // SAFETY: end < cap after growth; the slot is raw.
        unsafe {
            self.end.write(value);
            self.end = self.end.add(1);
        }
    }

    /// Destroys the last element.
    ///
    /// Aborts when empty.
    pub fn pop(&mut self) {
        if self.is_empty() {
            fail::fatal(err::SLAG_POP_EMPTY);
        }
        // SAFETY: non-empty, so end - 1 is a live element.
        unsafe {
            self.end = self.end.sub(1);
            ptr::drop_in_place(self.end);
        }
    }

    /// Removes and returns the element at `index`, filling the hole with
    /// the last element. O(1); element order is not preserved.
    ///
    /// Aborts out of bounds.
    pub fn remove_swap(&mut self, index: usize) -> T {
        if index >= self.len() {
            fail::fatal(err::SLAG_INDEX_OOB);
        }

        // SAFETY: index < len; the value moves out, the last element moves
        // into its slot, and the tail slot becomes raw.
        unsafe {
            let slot = self.beg.add(index);
            let value = slot.read();
            self.end = self.end.sub(1);
            if slot != self.end {
                ptr::copy_nonoverlapping(self.end, slot, 1);
            }
            value
        }
    }

    /// Last element.
    ///
    /// Aborts when empty.
    #[must_use]
    pub fn back(&self) -> &T {
        if self.is_empty() {
            fail::fatal(err::SLAG_BACK_EMPTY);
        }
        // SAFETY: non-empty.
        unsafe { &*self.end.sub(1) }
    }

    /// Last element, mutable.
    ///
    /// Aborts when empty.
    #[must_use]
    pub fn back_mut(&mut self) -> &mut T {
        if self.is_empty() {
            fail::fatal(err::SLAG_BACK_EMPTY);
        }
        // SAFETY: non-empty.
        unsafe { &mut *self.end.sub(1) }
    }

    /// Grows storage to exactly `new_cap` slots; no-op when `new_cap` does
    /// not exceed the current capacity. The argument is the total capacity.
    pub fn reserve(&mut self, new_cap: usize) {
        if new_cap <= self.capacity() {
            return;
        }
        self.relocate(new_cap);
    }

    /// Grows with clones of `value` or shrinks by destroying the suffix.
    pub fn resize(&mut self, new_len: usize, value: T)
    where
        T: Clone,
    {
        self.resize_with(new_len, || value.clone());
    }

    /// Grows with values from `fill` or shrinks by destroying the suffix.
    pub fn resize_with(&mut self, new_len: usize, mut fill: impl FnMut() -> T) {
        let count = self.len();
        if new_len > count {
            self.reserve(new_len);
            for _ in count..new_len {
                // SAFETY: reserved above; slots past end are raw.
                unsafe {
                    self.end.write(fill());
                    self.end = self.end.add(1);
                }
            }
        } else {
            // SAFETY: the suffix [new_len, count) holds live elements.
            unsafe {
                let tail = ptr::slice_from_raw_parts_mut(self.beg.add(new_len), count - new_len);
                self.end = self.beg.add(new_len);
                ptr::drop_in_place(tail);
            }
        }
    }

    /// Destroys all elements; storage is preserved.
    pub fn clear(&mut self) {
        let count = self.len();
        if count == 0 {
            return;
        }
        // SAFETY: [beg, end) are live; end rewinds first so a panicking
        // Drop cannot expose half-dead elements.
        unsafe {
            let live = ptr::slice_from_raw_parts_mut(self.beg, count);
            self.end = self.beg;
            ptr::drop_in_place(live);
        }
    }

    /// Destroys all elements, frees the old storage, and acquires fresh
    /// storage of exactly `new_cap` raw slots.
    pub fn reset(&mut self, new_cap: usize) {
        self.release_storage();
        if new_cap > 0 {
            self.acquire(new_cap);
        }
    }

    /// Like [`reset`](Self::reset), but additionally constructs all
    /// `new_cap` slots as clones of `value`.
    pub fn reset_filled(&mut self, new_cap: usize, value: T)
    where
        T: Clone,
    {
        self.reset(new_cap);
        for _ in 0..new_cap {
            self.push(value.clone());
        }
    }

    /// Replaces the contents with `count` clones of `value`.
    pub fn assign(&mut self, count: usize, value: T)
    where
        T: Clone,
    {
        self.clear();
        self.reserve(count);
        for _ in 0..count {
            self.push(value.clone());
        }
    }

    /// Replaces the contents with the items of `iter`.
    pub fn assign_iter(&mut self, iter: impl IntoIterator<Item = T>) {
        self.clear();
        for item in iter {
            self.push(item);
        }
    }

    fn grow(&mut self) {
        let count = self.len();
        let new_cap = if count == 0 { 8 } else { count * 2 };
        self.relocate(new_cap);
    }

    fn relocate(&mut self, new_cap: usize) {
        debug_assert!(new_cap >= self.len());

        let count = self.len();
        let new_beg = self.raw_storage(new_cap);

        // SAFETY: both regions are live and disjoint; the old elements are
        // logically moved, never dropped.
        unsafe {
            if count > 0 {
                ptr::copy_nonoverlapping(self.beg, new_beg, count);
            }
            if !self.beg.is_null() {
                self.alloc.free(self.beg.cast());
            }
            self.beg = new_beg;
            self.end = new_beg.add(count);
            self.cap = new_beg.add(new_cap);
        }
    }

    fn acquire(&mut self, capacity: usize) {
        debug_assert!(self.beg.is_null());
        let beg = self.raw_storage(capacity);
        self.beg = beg;
        self.end = beg;
        // SAFETY: raw_storage returned capacity slots.
        self.cap = unsafe { beg.add(capacity) };
    }

    fn raw_storage(&self, capacity: usize) -> *mut T {
        let Some(bytes) = capacity.checked_mul(size_of::<T>()) else {
            fail::fatal(err::SLAG_CAPACITY_OVERFLOW);
        };
        let Ok(bytes) = u32::try_from(bytes) else {
            fail::fatal_ctx(err::SLAG_CAPACITY_OVERFLOW, &format!("bytes = {bytes}"));
        };
        self.alloc.alloc(bytes, align_of::<T>() as u32).cast().as_ptr()
    }

    fn release_storage(&mut self) {
        if self.beg.is_null() {
            return;
        }
        self.clear();
        // SAFETY: beg came from this allocator and all elements are dead.
        unsafe { self.alloc.free(self.beg.cast()) };
        self.beg = ptr::null_mut();
        self.end = ptr::null_mut();
        self.cap = ptr::null_mut();
    }
}

impl<T, S: MetasetSpec> Default for Slag<T, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S: MetasetSpec> Drop for Slag<T, S> {
    fn drop(&mut self) {
        self.release_storage();
    }
}

impl<T, S: MetasetSpec> Deref for Slag<T, S> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        if self.beg.is_null() {
            return &[];
        }
        // SAFETY: [beg, end) holds len() constructed elements.
        unsafe { std::slice::from_raw_parts(self.beg, self.len()) }
    }
}

impl<T, S: MetasetSpec> DerefMut for Slag<T, S> {
    fn deref_mut(&mut self) -> &mut [T] {
        if self.beg.is_null() {
            return &mut [];
        }
        // SAFETY: as in deref, with exclusive access.
        unsafe { std::slice::from_raw_parts_mut(self.beg, self.len()) }
    }
}

impl<'s, T, S: MetasetSpec> IntoIterator for &'s Slag<T, S> {
    type Item = &'s T;
    type IntoIter = std::slice::Iter<'s, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'s, T, S: MetasetSpec> IntoIterator for &'s mut Slag<T, S> {
    type Item = &'s mut T;
    type IntoIter = std::slice::IterMut<'s, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T: std::fmt::Debug, S: MetasetSpec> std::fmt::Debug for Slag<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
