//! Integration test: `Vector` growth over a monotonic arena.
//!
//! The vector talks to a counting resource that sits between its
//! allocator handle and the arena, so every request the container makes
//! is visible. A second counting resource under the arena shows what
//! reaches the system heap.

use strata_arena::ArenaResource;
use strata_collections::Vector;
use strata_core::PolymorphicAllocator;
use strata_test_utils::{CountingResource, DropCounter};

// ── Growth sequence ─────────────────────────────────────────────────

#[test]
fn hundred_pushes_make_six_requests() {
    let arena = ArenaResource::on_default_resource();
    let counting = CountingResource::new(&arena);
    let mut v = Vector::new_in(PolymorphicAllocator::new(&counting));

    for i in 0..100i32 {
        v.push(i);
    }

    let expected: Vec<i32> = (0..100).collect();
    assert_eq!(v.as_slice(), expected.as_slice());
    assert_eq!(v.len(), 100);
    assert_eq!(v.capacity(), 128);

    let elem = std::mem::size_of::<i32>();
    let align = std::mem::align_of::<i32>();
    let requested: Vec<(usize, usize)> = [4, 8, 16, 32, 64, 128]
        .iter()
        .map(|&n| (n * elem, align))
        .collect();
    assert_eq!(counting.allocations(), requested);
    // The five outgrown regions were handed back in order.
    assert_eq!(counting.deallocations(), requested[..5].to_vec());
}

#[test]
fn growth_stays_in_one_upstream_block() {
    let upstream = CountingResource::system();
    let mut arena = ArenaResource::with_block_size(4096, &upstream).unwrap();
    {
        let mut v = Vector::new_in(PolymorphicAllocator::new(&arena));
        v.extend(0..100u32);
        assert_eq!(v.iter().copied().sum::<u32>(), 4950);
    }
    // 16 + 32 + ... + 512 bytes all fit in the first block.
    assert_eq!(upstream.allocate_count(), 1);
    assert_eq!(arena.block_count(), 1);

    arena.release();
    assert_eq!(upstream.deallocate_count(), 1);
    assert_eq!(upstream.live_count(), 0);
}

// ── Element lifetime ────────────────────────────────────────────────

#[test]
fn elements_dropped_before_arena_release() {
    let drops = DropCounter::new();
    let mut arena = ArenaResource::on_default_resource();
    {
        let mut v = Vector::new_in(PolymorphicAllocator::new(&arena));
        for i in 0..20 {
            v.push(drops.track(i));
        }
        v.truncate(5);
        assert_eq!(drops.count(), 15);
    }
    assert_eq!(drops.count(), 20);
    arena.release();
    assert_eq!(arena.block_count(), 0);
}

#[test]
fn clone_into_other_arena() {
    let first = ArenaResource::on_default_resource();
    let second = ArenaResource::on_default_resource();
    let mut v = Vector::new_in(PolymorphicAllocator::new(&first));
    v.extend(["alpha".to_string(), "beta".to_string()]);

    let w = v.try_clone_in(PolymorphicAllocator::new(&second)).unwrap();
    assert_eq!(v, w);
    assert!(w.allocator().resource().is_equal(&second));
    assert!(!w.allocator().resource().is_equal(&first));
    assert_eq!(second.block_count(), 1);
}
