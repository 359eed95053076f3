//! Allocator behavior: fallback escalation, freelist discipline, reset,
//! object lifecycle, and per-thread instancing.

use metapool::{
    CapacityFunction, MetapoolConfig, MetasetSpec, Shared, get_allocator, init_tls,
    tls_arena_stats,
};

// ============================================================================
// Test metasets
// ============================================================================

/// Two classes of two blocks each: four blocks total, then exhaustion.
struct TinySet;

impl MetasetSpec for TinySet {
    const POOLS: &'static [MetapoolConfig] =
        &[MetapoolConfig::new(CapacityFunction::Flat, 2, 8, &[8, 16])];
}

/// One class with plenty of blocks for churn tests.
struct ChurnSet;

impl MetasetSpec for ChurnSet {
    const POOLS: &'static [MetapoolConfig] =
        &[MetapoolConfig::new(CapacityFunction::Flat, 128, 8, &[8, 16])];
}

/// A mixed set for lifecycle and disjointness tests.
struct MixedSet;

impl MetasetSpec for MixedSet {
    const POOLS: &'static [MetapoolConfig] = &[
        MetapoolConfig::new(CapacityFunction::Flat, 16, 8, &[8, 120]),
        MetapoolConfig::new(CapacityFunction::Div2, 8, 128, &[128, 1024]),
    ];
}

const HEADER_SIZE: usize = 2;

fn read_header(ptr: *mut u8) -> u16 {
    let mut raw = [0u8; HEADER_SIZE];
    unsafe {
        std::ptr::copy_nonoverlapping(ptr.sub(HEADER_SIZE), raw.as_mut_ptr(), HEADER_SIZE);
    }
    u16::from_le_bytes(raw)
}

// ============================================================================
// Fallback escalation
// ============================================================================

#[test]
fn exhausted_classes_escalate_to_the_next_proxy() {
    let alloc = get_allocator::<TinySet>();

    // Two blocks in class 0, then escalation into class 1.
    let a = alloc.alloc(1, 1);
    let b = alloc.alloc(1, 1);
    let c = alloc.alloc(1, 1);
    let d = alloc.alloc(1, 1);

    assert_eq!(read_header(a.as_ptr()), 0);
    assert_eq!(read_header(b.as_ptr()), 0);
    assert_eq!(read_header(c.as_ptr()), 1);
    assert_eq!(read_header(d.as_ptr()), 1);

    // Freeing routes each block home; the next small request prefers the
    // refilled class 0 again.
    unsafe {
        alloc.free(c.as_ptr());
        alloc.free(a.as_ptr());
    }
    let e = alloc.alloc(1, 1);
    assert_eq!(read_header(e.as_ptr()), 0);

    unsafe {
        alloc.free(b.as_ptr());
        alloc.free(d.as_ptr());
        alloc.free(e.as_ptr());
    }
}

// ============================================================================
// Freelist discipline
// ============================================================================

#[test]
fn release_then_alloc_is_lifo() {
    let alloc = get_allocator::<ChurnSet>();

    let first = alloc.alloc(4, 1);
    let second = alloc.alloc(4, 1);
    assert_ne!(first, second);

    unsafe { alloc.free(second.as_ptr()) };
    let reused = alloc.alloc(4, 1);
    assert_eq!(reused, second);

    unsafe { alloc.free(reused.as_ptr()) };
    unsafe { alloc.free(first.as_ptr()) };

    let a = alloc.alloc(4, 1);
    assert_eq!(a, first);
    let b = alloc.alloc(4, 1);
    assert_eq!(b, second);

    unsafe {
        alloc.free(a.as_ptr());
        alloc.free(b.as_ptr());
    }
}

#[test]
fn free_of_null_is_a_no_op() {
    let alloc = get_allocator::<ChurnSet>();
    unsafe {
        alloc.free(std::ptr::null_mut());
        alloc.destruct(std::ptr::null_mut::<u32>());
    }
}

#[test]
fn outstanding_blocks_are_disjoint() {
    let alloc = get_allocator::<MixedSet>();
    let set = MixedSet::SET;

    let mut live: Vec<(usize, u32)> = Vec::new();
    for size in [1u32, 6, 14, 30, 62, 100, 126, 300, 500, 1000] {
        for _ in 0..3 {
            let ptr = alloc.alloc(size, 1);
            let stride = set.stride_of(read_header(ptr.as_ptr()));
            live.push((ptr.as_ptr() as usize, stride));
        }
    }

    let mut sorted = live.clone();
    sorted.sort_unstable();
    for pair in sorted.windows(2) {
        let (addr, stride) = pair[0];
        let (next, _) = pair[1];
        // Block spans run [user - header, user - header + stride).
        assert!(
            addr + stride as usize <= next,
            "blocks overlap: {addr:#x}+{stride} vs {next:#x}"
        );
    }

    for (addr, _) in live {
        unsafe { alloc.free(addr as *mut u8) };
    }
}

// ============================================================================
// Reset
// ============================================================================

#[test]
fn reset_replays_the_same_addresses() {
    let alloc = get_allocator::<ChurnSet>();

    let mut first_pass = Vec::new();
    for _ in 0..100 {
        first_pass.push(alloc.alloc(4, 1).as_ptr() as usize);
    }

    // Nothing freed; rewind everything.
    unsafe { alloc.reset() };

    let mut second_pass = Vec::new();
    for _ in 0..100 {
        second_pass.push(alloc.alloc(4, 1).as_ptr() as usize);
    }

    let mut a = first_pass.clone();
    let mut b = second_pass.clone();
    a.sort_unstable();
    b.sort_unstable();
    assert_eq!(a, b);

    for addr in second_pass {
        unsafe { alloc.free(addr as *mut u8) };
    }
}

// ============================================================================
// Object lifecycle
// ============================================================================

#[test]
fn construct_and_destruct_run_the_object_lifecycle() {
    use std::rc::Rc;

    let alloc = get_allocator::<MixedSet>();
    let probe = Rc::new(());

    struct Tracked {
        _probe: Rc<()>,
        payload: [u64; 6],
    }

    let object = alloc.construct(Tracked {
        _probe: probe.clone(),
        payload: [9; 6],
    });

    assert_eq!(Rc::strong_count(&probe), 2);
    unsafe {
        assert_eq!((*object.as_ptr()).payload, [9; 6]);
        alloc.destruct(object.as_ptr());
    }
    assert_eq!(Rc::strong_count(&probe), 1);
}

#[test]
fn constructed_objects_reuse_their_class() {
    let alloc = get_allocator::<MixedSet>();

    let first = alloc.construct(0xABu64);
    let addr = first.as_ptr() as usize;
    unsafe { alloc.destruct(first.as_ptr()) };

    let second = alloc.construct(0xCDu64);
    assert_eq!(second.as_ptr() as usize, addr);
    unsafe { alloc.destruct(second.as_ptr()) };
}

// ============================================================================
// Per-thread instancing
// ============================================================================

#[test]
fn threads_get_independent_stacks() {
    init_tls::<ChurnSet>();
    let here = get_allocator::<ChurnSet>().alloc(4, 1).as_ptr() as usize;

    let there = std::thread::spawn(|| {
        let alloc = get_allocator::<ChurnSet>();
        alloc.alloc(4, 1).as_ptr() as usize
    })
    .join()
    .unwrap();

    // Same metaset, different thread, different arena.
    assert_ne!(here, there);

    unsafe { get_allocator::<ChurnSet>().free(here as *mut u8) };
}

#[test]
fn tls_stats_appear_after_priming() {
    assert!(tls_arena_stats::<TinySet>().is_none());
    init_tls::<TinySet>();

    let stats = tls_arena_stats::<TinySet>().expect("stack was primed");
    assert!(stats.capacity >= TinySet::SET.arena_size());
    assert!(stats.used > 0);
}

#[test]
fn shared_stacks_are_independent_of_tls() {
    let shared = Shared::<ChurnSet>::new();
    let tls = get_allocator::<ChurnSet>();

    let a = shared.allocator().alloc(4, 1);
    let b = tls.alloc(4, 1);
    assert_ne!(a, b);

    unsafe {
        shared.allocator().free(a.as_ptr());
        tls.free(b.as_ptr());
    }
}
