//! `metapool`: a compile-time configured, size-segregated block allocator.
//!
//! The allocator pre-partitions one contiguous arena into fixed-stride
//! freelists, routes every allocation through an O(1) size→class lookup
//! whose parameters are const-evaluated, and stamps a 2-byte routing index
//! in front of every block so `free` needs neither a size argument nor an
//! external map. It targets workloads that churn through many
//! short-to-medium-lived objects of statically known size classes — game
//! engine subsystems, ECS stores, request-scoped working sets.
//!
//! # Architecture
//!
//! - [`config`] / [`metaset`]: the compile-time configuration surface —
//!   metapool declarations, validated and composed into a sorted range
//!   table during const evaluation.
//! - [`arena`]: one monotonic backing region per allocator stack.
//! - [`freelist`] / [`proxy`] / [`metapool`]: fixed-stride block storage
//!   and the type-erased flat table the hot path indexes.
//! - [`allocator`]: routing, fetch/release, construct/destruct.
//! - [`model`]: thread-local stacks keyed by metaset type, plus the
//!   [`Shared`] single-owner variant.
//! - [`adapters`]: the per-element allocator protocol and a type-erased
//!   memory-resource protocol.
//! - [`tracer`]: feature-gated allocation counters with CSV export.
//!
//! # Threading
//!
//! Instances are strictly per-thread; parallelism comes from per-thread
//! instancing, never sharing. Handles are `!Send`, and pointers must not
//! cross threads — a foreign `free` would route through the wrong
//! freelist.
//!
//! # Example
//!
//! ```
//! use metapool::{CapacityFunction, MetapoolConfig, MetasetSpec, get_allocator};
//!
//! struct ParticleSet;
//!
//! impl MetasetSpec for ParticleSet {
//!     const POOLS: &'static [MetapoolConfig] = &[
//!         MetapoolConfig::new(CapacityFunction::Flat, 64, 16, &[16, 112]),
//!         MetapoolConfig::new(CapacityFunction::Div2, 32, 64, &[128, 512]),
//!     ];
//! }
//!
//! let alloc = get_allocator::<ParticleSet>();
//!
//! let block = alloc.alloc(96, 8);
//! let value = alloc.construct([1.0f32; 12]);
//! unsafe {
//!     alloc.destruct(value.as_ptr());
//!     alloc.free(block.as_ptr());
//! }
//! ```

pub mod adapters;
pub mod allocator;
pub mod arena;
pub mod config;
pub mod fail;
pub mod freelist;
pub mod math;
pub mod metapool;
pub mod metaset;
pub mod model;
pub mod proxy;
pub mod tracer;

pub use adapters::MemoryResource;
pub use allocator::AllocatorCore;
pub use arena::{ArenaStats, MonotonicArena};
pub use config::{CapacityFunction, MetapoolConfig};
pub use metaset::{Metaset, MetasetSpec, RangeMetadata};
pub use model::{MetapoolAllocator, Shared, get_allocator, init_tls, tls_arena_stats};
pub use tracer::export_trace;

/// A ready-made general-purpose metaset tiling strides 32 through 917504
/// (arena demand ≈ 30 MiB per thread).
///
/// Small classes dominate the block budget; capacities taper as strides
/// grow. Workloads with a known shape should declare their own
/// [`MetasetSpec`] instead.
///
/// ```
/// use metapool::{DefaultSet, get_allocator};
///
/// let alloc = get_allocator::<DefaultSet>();
/// let node = alloc.construct((1u64, 2u64));
/// unsafe { alloc.destruct(node.as_ptr()) };
/// ```
pub struct DefaultSet;

impl MetasetSpec for DefaultSet {
    const POOLS: &'static [MetapoolConfig] = &[
        MetapoolConfig::new(CapacityFunction::Mul2, 64, 32, &[32, 512, 2016]),
        MetapoolConfig::new(CapacityFunction::Div4, 32, 512, &[2048, 8192, 32256]),
        MetapoolConfig::new(CapacityFunction::Flat, 4, 8192, &[32768, 122880]),
        MetapoolConfig::new(CapacityFunction::Flat, 2, 131072, &[131072, 917504]),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_composes() {
        let set = DefaultSet::SET;
        assert_eq!(set.range_count(), 4);
        assert_eq!(set.proxy_count(), 63 + 60 + 12 + 7);
        assert_eq!(set.stride_of(0), 32);
        assert_eq!(set.stride_of(63), 2048);
        assert!(set.arena_size() <= 64 << 20);
    }
}
