//! A metapool: one configured family of freelists.
//!
//! Construction expands the configuration's class list, carves one region
//! per class out of the arena, and initializes each freelist with its
//! global proxy index. The carve passes `HEADER_SIZE` as the arena shift so
//! the first *user region* of every class — not the raw block start — lands
//! on the freelist alignment.

use std::ptr::NonNull;

use crate::arena::MonotonicArena;
use crate::config::{FREELIST_ALIGNMENT, HEADER_SIZE, MetapoolConfig};
use crate::freelist::{Freelist, region_bytes};
use crate::proxy::FreelistProxy;

/// A contiguous family of freelists sharing a stride step and capacity
/// policy, owning its class storage.
pub struct Metapool {
    classes: Box<[Freelist]>,
}

impl Metapool {
    /// Carves and initializes every class of `config` from `arena`.
    ///
    /// Class `i` receives global proxy index `base_proxy_index + i`.
    pub(crate) fn new(
        config: &'static MetapoolConfig,
        arena: &mut MonotonicArena,
        base_proxy_index: u16,
    ) -> Self {
        let count = config.stride_count();

        let mut classes = Vec::with_capacity(count as usize);
        for class in 0..count {
            classes.push(Freelist::new(
                config.stride_at(class),
                config.block_count_at(class),
            ));
        }
        let mut classes = classes.into_boxed_slice();

        for (class, freelist) in classes.iter_mut().enumerate() {
            let bytes = region_bytes(freelist.stride(), freelist.block_count());
            let memory = arena.fetch(bytes, FREELIST_ALIGNMENT, HEADER_SIZE);

            // SAFETY: the carve produced `bytes` writable bytes with the
            // user region aligned; the arena outlives the metapool inside
            // one allocator stack.
            unsafe { freelist.initialize(memory, base_proxy_index + class as u16) };
        }

        Self { classes }
    }

    /// Appends one proxy per class, in class order. Proxy addresses stay
    /// valid because the classes live in a boxed slice that never moves.
    pub(crate) fn fill_proxies(&mut self, proxies: &mut Vec<FreelistProxy>) {
        for freelist in self.classes.iter_mut() {
            proxies.push(FreelistProxy::new(NonNull::from(freelist)));
        }
    }

    /// Number of size classes in this metapool.
    #[must_use]
    pub fn class_count(&self) -> u32 {
        self.classes.len() as u32
    }
}
