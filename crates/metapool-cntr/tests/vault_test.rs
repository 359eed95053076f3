//! Vault contract end-to-end on real allocator stacks.

use metapool::{CapacityFunction, MetapoolConfig, MetasetSpec, Shared};
use metapool_cntr::{Vault, make_map, make_vault, make_vec};

struct GrowSet;

impl MetasetSpec for GrowSet {
    const POOLS: &'static [MetapoolConfig] = &[
        MetapoolConfig::new(CapacityFunction::Flat, 32, 8, &[8, 120]),
        MetapoolConfig::new(CapacityFunction::Flat, 8, 128, &[128, 2048]),
    ];
}

// ============================================================================
// Growth scenario
// ============================================================================

#[test]
fn ninth_push_doubles_past_sixteen() {
    let mut vault: Vault<u32, GrowSet> = make_vault();

    for value in 0..9u32 {
        vault.push(value);
    }

    assert_eq!(vault.len(), 9);
    assert!(vault.capacity() >= 16);
    assert_eq!(
        vault.iter().copied().collect::<Vec<_>>(),
        (0..9).collect::<Vec<_>>()
    );

    vault.reset_filled(4, 42);
    assert_eq!(vault.len(), 4);
    assert_eq!(vault.capacity(), 4);
    assert!(vault.iter().all(|&v| v == 42));
}

#[test]
fn growth_preserves_order_across_relocations() {
    let mut vault: Vault<u64, GrowSet> = make_vault();
    let mut storage_seen = Vec::new();

    for value in 0..64u64 {
        if !vault.data().is_null() && Some(&(vault.data() as usize)) != storage_seen.last() {
            storage_seen.push(vault.data() as usize);
        }
        vault.push(value);
    }

    // 8 -> 16 -> 32 -> 64 means several distinct storage regions.
    assert!(storage_seen.len() >= 3);
    for (index, value) in vault.iter().enumerate() {
        assert_eq!(*value, index as u64);
    }
}

// ============================================================================
// Vault laws
// ============================================================================

#[test]
fn push_pop_identity_without_growth() {
    let mut vault: Vault<u32, GrowSet> = Vault::with_capacity(8);
    let storage = vault.data();

    vault.push(1);
    vault.pop();
    assert!(vault.is_empty());
    assert_eq!(vault.data(), storage);
}

#[test]
fn reserve_never_shrinks() {
    let mut vault: Vault<u32, GrowSet> = make_vault();
    vault.reserve(24);
    let cap = vault.capacity();
    vault.reserve(1);
    assert_eq!(vault.capacity(), cap);
}

#[test]
fn vaults_free_their_blocks_back() {
    let shared = Shared::<GrowSet>::new();

    let first_storage;
    {
        let mut vault: Vault<u32, GrowSet> = Vault::with_capacity_in(shared.allocator(), 16);
        vault.push(7);
        first_storage = vault.data() as usize;
    }

    // The dropped vault's block is the freelist head again.
    let mut next: Vault<u32, GrowSet> = Vault::with_capacity_in(shared.allocator(), 16);
    next.push(9);
    assert_eq!(next.data() as usize, first_storage);
}

// ============================================================================
// Factories on one thread
// ============================================================================

#[test]
fn containers_share_the_thread_stack() {
    let mut vec = make_vec::<u32, GrowSet>();
    let mut map = make_map::<u32, u32, GrowSet>();
    let mut vault = make_vault::<u32, GrowSet>();

    for i in 0..100u32 {
        vec.push(i);
        map.insert(i, i * 2);
        vault.push(i);
    }

    assert_eq!(vec.len(), 100);
    assert_eq!(map[&40], 80);
    assert_eq!(vault[99], 99);

    drop(vec);
    drop(map);

    // The vault keeps working after its siblings returned their storage.
    vault.push(100);
    assert_eq!(*vault.back(), 100);
}
