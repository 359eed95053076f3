//! Factories binding containers to this thread's allocator.
//!
//! Each `make_*` resolves the thread-local allocator for the metaset and
//! hands back a container running on it: the native [`Vault`], plus
//! allocator-aware `Vec`/`Box` (allocator-api2) and hash map/set
//! (hashbrown) through the per-element protocol adapter.
//!
//! # Example
//!
//! ```
//! use metapool::{CapacityFunction, MetapoolConfig, MetasetSpec};
//! use metapool_cntr::{make_map, make_vault, make_vec};
//!
//! struct MeshSet;
//! impl MetasetSpec for MeshSet {
//!     const POOLS: &'static [MetapoolConfig] =
//!         &[MetapoolConfig::new(CapacityFunction::Flat, 32, 64, &[64, 4096])];
//! }
//!
//! let mut indices = make_vec::<u32, MeshSet>();
//! indices.extend([0, 1, 2]);
//!
//! let mut lookup = make_map::<&str, u32, MeshSet>();
//! lookup.insert("origin", 0);
//!
//! let mut scratch = make_vault::<f32, MeshSet>();
//! scratch.push(1.5);
//! ```

use allocator_api2::boxed::Box;
use allocator_api2::vec::Vec;
use hashbrown::hash_map::DefaultHashBuilder;
use hashbrown::{HashMap, HashSet};

use metapool::{MetapoolAllocator, MetasetSpec, get_allocator};

use crate::slag::Slag;
use crate::vault::Vault;

/// This thread's allocator handle for `S`.
type ThreadAlloc<S> = MetapoolAllocator<'static, S>;

/// An empty [`Vault`] on this thread's allocator.
#[must_use]
pub fn make_vault<T, S: MetasetSpec>() -> Vault<'static, T, S> {
    Vault::new()
}

/// A [`Vault`] with exactly `capacity` raw slots.
#[must_use]
pub fn make_vault_with_capacity<T, S: MetasetSpec>(capacity: usize) -> Vault<'static, T, S> {
    Vault::with_capacity(capacity)
}

/// A [`Vault`] holding `count` clones of `value`.
#[must_use]
pub fn make_filled_vault<T: Clone, S: MetasetSpec>(count: usize, value: T) -> Vault<'static, T, S> {
    Vault::filled(count, value)
}

/// A [`Slag`] with exactly `capacity` raw slots on this thread's
/// allocator.
#[must_use]
pub fn make_slag<T, S: MetasetSpec>(capacity: usize) -> Slag<T, S> {
    Slag::with_capacity(capacity)
}

/// A [`Slag`] holding `count` clones of `value`.
#[must_use]
pub fn make_filled_slag<T: Clone, S: MetasetSpec>(count: usize, value: T) -> Slag<T, S> {
    Slag::filled(count, value)
}

/// An empty allocator-aware vector on this thread's allocator.
#[must_use]
pub fn make_vec<T, S: MetasetSpec>() -> Vec<T, ThreadAlloc<S>> {
    Vec::new_in(get_allocator::<S>())
}

/// An allocator-aware vector with `capacity` slots pre-acquired.
#[must_use]
pub fn make_vec_with_capacity<T, S: MetasetSpec>(capacity: usize) -> Vec<T, ThreadAlloc<S>> {
    Vec::with_capacity_in(capacity, get_allocator::<S>())
}

/// Boxes `value` on this thread's allocator.
#[must_use]
pub fn make_box<T, S: MetasetSpec>(value: T) -> Box<T, ThreadAlloc<S>> {
    Box::new_in(value, get_allocator::<S>())
}

/// An empty hash map on this thread's allocator.
#[must_use]
pub fn make_map<K, V, S: MetasetSpec>() -> HashMap<K, V, DefaultHashBuilder, ThreadAlloc<S>> {
    HashMap::new_in(get_allocator::<S>())
}

/// An empty hash set on this thread's allocator.
#[must_use]
pub fn make_set<T: std::hash::Hash + Eq, S: MetasetSpec>()
-> HashSet<T, DefaultHashBuilder, ThreadAlloc<S>> {
    HashSet::new_in(get_allocator::<S>())
}
