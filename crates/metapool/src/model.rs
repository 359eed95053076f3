//! Allocator stack ownership and handles.
//!
//! One *stack* is the full machinery behind a metaset: the arena, the
//! metapools carved from it, and the flat proxy table in global index
//! order. Stacks come in two lifetimes:
//!
//! - **Thread-local** — [`get_allocator`] returns a handle to a per-thread
//!   stack keyed by the [`MetasetSpec`] type, constructed on first use and
//!   dropped at thread exit. Distinct threads get distinct stacks; nothing
//!   is shared and nothing synchronizes.
//! - **Shared** — a [`Shared`] value owns its own stack for single-owner,
//!   multi-client use within one thread (say, one allocator feeding several
//!   containers). Handles borrow the `Shared`, so clients cannot outlive
//!   it.
//!
//! Handles are shallow copies over raw pointers: `!Send`/`!Sync`, cheap to
//! pass by value, and never reference-counted — the stack is a strict
//! ownership tree.

use std::any::TypeId;
use std::cell::RefCell;
use std::marker::PhantomData;
use std::ptr::NonNull;

use fxhash::FxHashMap;

use crate::allocator::AllocatorCore;
use crate::arena::{ArenaStats, MonotonicArena};
use crate::config::ARENA_ALIGNMENT;
use crate::metapool::Metapool;
use crate::metaset::MetasetSpec;
use crate::proxy::FreelistProxy;

/// The owned machinery behind one metaset instance.
///
/// Field order is not load-bearing: freelists and proxies point into heap
/// buffers (`Box<[_]>` contents and the arena region) that stay put until
/// the whole stack drops.
struct AllocatorStack {
    arena: MonotonicArena,
    pools: Box<[Metapool]>,
    proxies: Box<[FreelistProxy]>,
}

impl AllocatorStack {
    fn create<S: MetasetSpec>() -> Box<Self> {
        let set = &S::SET;

        let mut arena = MonotonicArena::new(set.arena_size(), ARENA_ALIGNMENT);

        let mut pools = Vec::with_capacity(set.range_count() as usize);
        for i in 0..set.range_count() {
            let config = &S::POOLS[set.pool_order(i)];
            pools.push(Metapool::new(
                config,
                &mut arena,
                set.range(i).base_proxy_index,
            ));
        }
        let mut pools = pools.into_boxed_slice();

        let mut proxies = Vec::with_capacity(set.proxy_count() as usize);
        for pool in pools.iter_mut() {
            pool.fill_proxies(&mut proxies);
        }
        let proxies = proxies.into_boxed_slice();
        debug_assert_eq!(proxies.len(), set.proxy_count() as usize);
        debug_assert_eq!(
            pools.iter().map(Metapool::class_count).sum::<u32>(),
            set.proxy_count()
        );

        metapool_log::debug!(
            "allocator stack ready: {} ranges, {} proxies, {} arena bytes",
            set.range_count(),
            proxies.len(),
            set.arena_size()
        );

        Box::new(Self {
            arena,
            pools,
            proxies,
        })
    }

    fn handle<'scope, S: MetasetSpec>(&mut self) -> MetapoolAllocator<'scope, S> {
        let base = NonNull::new(self.proxies.as_mut_ptr()).expect("proxy table is never empty");
        MetapoolAllocator {
            core: AllocatorCore::new(base, self.proxies.len() as u32),
            _scope: PhantomData,
        }
    }
}

/// A shallow, copyable handle to an allocator stack.
///
/// For thread-local stacks the scope is `'static` in the type but really
/// means "this thread": the stack lives until thread exit, and the handle
/// cannot leave the thread (`!Send`). For [`Shared`] stacks the scope is
/// the borrow of the owning value, checked by the compiler.
pub struct MetapoolAllocator<'scope, S: MetasetSpec> {
    core: AllocatorCore<S>,
    _scope: PhantomData<&'scope ()>,
}

impl<S: MetasetSpec> Clone for MetapoolAllocator<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: MetasetSpec> Copy for MetapoolAllocator<'_, S> {}

impl<S: MetasetSpec> MetapoolAllocator<'_, S> {
    /// See [`AllocatorCore::alloc`].
    #[must_use]
    pub fn alloc(&self, size: u32, alignment: u32) -> NonNull<u8> {
        self.core.alloc(size, alignment)
    }

    /// See [`AllocatorCore::free`].
    ///
    /// # Safety
    ///
    /// As for [`AllocatorCore::free`].
    pub unsafe fn free(&self, ptr: *mut u8) {
        unsafe { self.core.free(ptr) }
    }

    /// See [`AllocatorCore::construct`].
    #[must_use]
    pub fn construct<T>(&self, value: T) -> NonNull<T> {
        self.core.construct(value)
    }

    /// See [`AllocatorCore::destruct`].
    ///
    /// # Safety
    ///
    /// As for [`AllocatorCore::destruct`].
    pub unsafe fn destruct<T>(&self, object: *mut T) {
        unsafe { self.core.destruct(object) }
    }

    /// See [`AllocatorCore::reset`].
    ///
    /// # Safety
    ///
    /// As for [`AllocatorCore::reset`].
    pub unsafe fn reset(&self) {
        unsafe { self.core.reset() }
    }

    /// See [`AllocatorCore::proxy_for`].
    #[must_use]
    pub fn proxy_for(&self, size: u32, alignment: u32) -> u16 {
        self.core.proxy_for(size, alignment)
    }

    /// Length of the proxy table behind this handle.
    #[must_use]
    pub fn proxy_count(&self) -> u32 {
        self.core.proxy_count()
    }
}

thread_local! {
    static STACKS: RefCell<FxHashMap<TypeId, Box<AllocatorStack>>> =
        RefCell::new(FxHashMap::default());
}

/// Returns this thread's allocator for metaset `S`, building the stack on
/// first use.
///
/// The handle is valid until thread exit and must not cross threads (the
/// type is `!Send`, so the compiler enforces that).
#[must_use]
pub fn get_allocator<S: MetasetSpec>() -> MetapoolAllocator<'static, S> {
    STACKS.with(|stacks| {
        let mut stacks = stacks.borrow_mut();
        let stack = stacks
            .entry(TypeId::of::<S>())
            .or_insert_with(AllocatorStack::create::<S>);
        stack.handle()
    })
}

/// Eagerly primes this thread's stack for metaset `S`.
///
/// Callers that cannot tolerate a construction pause on the first
/// allocation (the arena touch is the dominant cost) call this up front.
pub fn init_tls<S: MetasetSpec>() {
    let _ = get_allocator::<S>();
}

/// Arena usage counters of this thread's stack for `S`, if it exists.
#[must_use]
pub fn tls_arena_stats<S: MetasetSpec>() -> Option<ArenaStats> {
    STACKS.with(|stacks| {
        stacks
            .borrow()
            .get(&TypeId::of::<S>())
            .map(|stack| stack.arena.stats())
    })
}

/// A single-owner allocator stack for multi-client use within one thread.
///
/// # Example
///
/// ```
/// use metapool::config::{CapacityFunction, MetapoolConfig};
/// use metapool::metaset::MetasetSpec;
/// use metapool::model::Shared;
///
/// struct TinySet;
/// impl MetasetSpec for TinySet {
///     const POOLS: &'static [MetapoolConfig] =
///         &[MetapoolConfig::new(CapacityFunction::Flat, 16, 8, &[8, 64])];
/// }
///
/// let shared = Shared::<TinySet>::new();
/// let alloc = shared.allocator();
/// let value = alloc.construct(17u64);
/// unsafe {
///     assert_eq!(*value.as_ptr(), 17);
///     alloc.destruct(value.as_ptr());
/// }
/// ```
pub struct Shared<S: MetasetSpec> {
    stack: Box<AllocatorStack>,
    _spec: PhantomData<fn(S) -> S>,
}

impl<S: MetasetSpec> Shared<S> {
    /// Builds a fresh stack for `S`, independent of the thread-local one.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stack: AllocatorStack::create::<S>(),
            _spec: PhantomData,
        }
    }

    /// A handle borrowing this stack; clients carrying it cannot outlive
    /// the `Shared`.
    #[must_use]
    pub fn allocator(&self) -> MetapoolAllocator<'_, S> {
        // The proxy table is only ever mutated through the freelist
        // pointers inside its entries; the entries themselves are read-only
        // after construction, so deriving the handle from a shared borrow
        // is sound.
        let base = self.stack.proxies.as_ptr().cast_mut();
        let base = NonNull::new(base).expect("proxy table is never empty");
        MetapoolAllocator {
            core: AllocatorCore::new(base, self.stack.proxies.len() as u32),
            _scope: PhantomData,
        }
    }

    /// Arena usage counters of this stack.
    #[must_use]
    pub fn arena_stats(&self) -> ArenaStats {
        self.stack.arena.stats()
    }
}

impl<S: MetasetSpec> Default for Shared<S> {
    fn default() -> Self {
        Self::new()
    }
}
