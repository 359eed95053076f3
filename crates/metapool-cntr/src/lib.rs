//! Containers over the `metapool` allocator.
//!
//! Two native containers ship here: the [`Vault`], a growable ordered
//! sequence with strength-reduced relocation, and the [`Slag`], its
//! unordered sibling with O(1) swap-removal. The [`factory`] module
//! additionally binds ambient allocator-aware containers — vectors, boxes,
//! hash maps and sets — to a thread's metapool allocator through the
//! per-element protocol.

pub mod factory;
pub mod slag;
pub mod vault;

pub use factory::{
    make_box, make_filled_slag, make_filled_vault, make_map, make_set, make_slag, make_vault,
    make_vault_with_capacity, make_vec, make_vec_with_capacity,
};
pub use slag::Slag;
pub use vault::Vault;
