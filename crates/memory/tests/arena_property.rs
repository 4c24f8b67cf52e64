//! Property tests for arena allocation invariants.
//!
//! - live blocks never overlap and stay inside the buffer
//! - a refused allocation leaves `used()` unchanged
//! - freeing the tail returns its bytes, and the next allocation reuses the address
//! - freeing anything but the tail is a no-op

use bumpkit_memory::arena::Arena;
use proptest::prelude::*;

fn addr(ptr: std::ptr::NonNull<u8>) -> usize {
    ptr.as_ptr() as usize
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn blocks_are_disjoint_and_in_bounds(
        capacity in 1usize..512,
        sizes in prop::collection::vec(1usize..64, 1..32),
    ) {
        let arena = Arena::new(capacity).expect("arena");
        let start = arena.as_ptr() as usize;
        let mut blocks: Vec<(usize, usize)> = Vec::new();

        for size in sizes {
            if let Some(ptr) = arena.try_allocate(size) {
                blocks.push((addr(ptr), size));
            }
        }

        for (i, &(a, a_len)) in blocks.iter().enumerate() {
            prop_assert!(a >= start);
            prop_assert!(a + a_len <= start + capacity);
            for &(b, b_len) in &blocks[i + 1..] {
                prop_assert!(a + a_len <= b || b + b_len <= a, "blocks overlap");
            }
        }
        let total: usize = blocks.iter().map(|&(_, len)| len).sum();
        prop_assert_eq!(arena.used(), total);
    }

    #[test]
    fn refused_allocation_keeps_offset(
        capacity in 1usize..256,
        fill in 0usize..256,
        extra in 1usize..256,
    ) {
        let arena = Arena::new(capacity).expect("arena");
        let fill = fill.min(capacity);
        arena.allocate(fill).expect("fill fits");

        let request = arena.available() + extra;
        let before = arena.used();
        prop_assert!(arena.allocate(request).is_err());
        prop_assert!(arena.try_allocate(request).is_none());
        prop_assert_eq!(arena.used(), before);
    }

    #[test]
    fn tail_free_returns_same_address(
        prefix in prop::collection::vec(1usize..32, 0..8),
        size in 1usize..32,
    ) {
        let arena = Arena::new(512).expect("arena");
        for len in prefix {
            arena.allocate(len).expect("prefix fits");
        }

        let used = arena.used();
        let ptr = arena.allocate(size).expect("block fits");
        unsafe { arena.deallocate(ptr, size) };
        prop_assert_eq!(arena.used(), used);
        prop_assert_eq!(arena.allocate(size).expect("block fits again"), ptr);
    }

    #[test]
    fn non_tail_free_is_noop(
        sizes in prop::collection::vec(1usize..32, 2..10),
        pick in any::<prop::sample::Index>(),
    ) {
        let arena = Arena::new(512).expect("arena");
        let blocks: Vec<_> = sizes
            .iter()
            .map(|&len| (arena.allocate(len).expect("fits"), len))
            .collect();

        // Any block except the last one
        let (ptr, len) = blocks[pick.index(blocks.len() - 1)];
        let used = arena.used();
        unsafe { arena.deallocate(ptr, len) };
        prop_assert_eq!(arena.used(), used);
    }
}
