//! Integration tests for `ChunkList` over the different allocators

use std::rc::Rc;

use bumpkit_memory::allocator::{HeapAllocator, TypedAllocator};
use bumpkit_memory::arena::ArenaRegistry;
use bumpkit_memory::container::{ChunkList, Node};
use bumpkit_memory::extensions::logging::{LoggingAllocator, RecordingSink};
use pretty_assertions::assert_eq;

fn factorial(n: u64) -> u64 {
    (1..=n).product()
}

#[test]
fn test_logged_typed_list_round_trip() {
    let registry = Rc::new(ArenaRegistry::new());
    let sink = RecordingSink::new();
    let alloc = LoggingAllocator::new(
        TypedAllocator::<(u64, u64), 10>::new_in(&registry),
        sink.clone(),
    );

    let mut list = ChunkList::new_in(alloc);
    for i in 0..10 {
        list.push((i, factorial(i))).expect("binding holds ten pairs");
    }
    assert!(list.push((10, factorial(10))).is_err());
    assert_eq!(list.len(), 10);
    assert_eq!(list.iter().nth(5), Some(&(5, 120)));

    // element + node request per push, plus the refused element request
    assert_eq!(sink.len(), 21);
    assert_eq!(sink.lines()[0], "allocate<(u64, u64)>[n = 1]");
    assert!(sink.lines()[1].starts_with("allocate<bumpkit_memory::container::"));

    drop(list);
    let elements = registry.get::<(u64, u64)>(10).expect("binding exists");
    let nodes = registry.get::<Node<(u64, u64)>>(10).expect("binding exists");
    assert_eq!(elements.used(), 0);
    assert_eq!(nodes.used(), 0);
    // one deallocate for every successful allocate
    assert_eq!(sink.len(), 41);
}

#[test]
fn test_heap_lists_splice_typed_lists_copy() {
    let mut heap_a = ChunkList::new_in(HeapAllocator::<u32>::new());
    let mut heap_b = ChunkList::new_in(HeapAllocator::<u32>::new());
    heap_a.push_chunk([1, 2]).expect("heap");
    heap_b.push_chunk([3, 4]).expect("heap");
    let before = heap_b.chunks().next().expect("one chunk").as_ptr();
    heap_a.append(&mut heap_b).expect("splice");
    assert_eq!(heap_a.chunks().last().expect("chunk").as_ptr(), before);

    let registry = Rc::new(ArenaRegistry::new());
    let typed = TypedAllocator::<u32, 16>::new_in(&registry);
    let mut typed_a = ChunkList::new_in(typed.clone());
    let mut typed_b = ChunkList::new_in(typed);
    typed_a.push_chunk([1, 2]).expect("arena");
    typed_b.push_chunk([3, 4]).expect("arena");
    let before = typed_b.chunks().next().expect("one chunk").as_ptr();
    typed_a.append(&mut typed_b).expect("copy");
    assert!(typed_b.is_empty());
    assert!(typed_a.chunks().last().expect("chunk").as_ptr() != before);

    assert_eq!(heap_a, typed_a);
}

#[test]
fn test_try_clone_is_independent() {
    let registry = Rc::new(ArenaRegistry::new());
    let mut list = ChunkList::new_in(TypedAllocator::<String, 8>::new_in(&registry));
    list.push_chunk(["x".to_owned(), "y".to_owned()]).expect("fits");

    let mut copy = list.try_clone().expect("fits");
    copy.push("z".to_owned()).expect("fits");
    assert_eq!(list.len(), 2);
    assert_eq!(copy.len(), 3);
    assert_eq!(format!("{copy:?}"), r#"["x", "y", "z"]"#);

    // Clone failure leaves the source untouched
    let mut full = ChunkList::new_in(TypedAllocator::<u8, 3>::new_in(&registry));
    full.push_chunk([1, 2]).expect("fits");
    assert!(full.try_clone().is_err());
    assert_eq!(full.len(), 2);
}

#[test]
fn test_typed_list_reuses_arena_after_clear() {
    let registry = Rc::new(ArenaRegistry::new());
    let mut list = ChunkList::new_in(TypedAllocator::<u16, 4>::new_in(&registry));
    list.push_chunk([1, 2, 3, 4]).expect("fits");
    assert!(list.push(5).is_err());

    list.clear();
    list.push_chunk([5, 6, 7, 8]).expect("fits after clear");
    assert_eq!(list.iter().copied().collect::<Vec<_>>(), [5, 6, 7, 8]);
}
