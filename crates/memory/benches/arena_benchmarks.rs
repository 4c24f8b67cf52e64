//! Arena and typed allocator benchmarks
//!
//! Compares tail-reclaiming arena cycles against the global heap

use std::hint::black_box;
use std::rc::Rc;

use bumpkit_memory::allocator::{ElementAllocator, HeapAllocator, TypedAllocator};
use bumpkit_memory::arena::{Arena, ArenaRegistry};
use bumpkit_memory::container::ChunkList;
use bumpkit_memory::core::{ArenaConfig, Resettable};
use bumpkit_memory::extensions::logging::{LoggingAllocator, RecordingSink};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

/// Benchmark single allocate/free cycle at the tail
fn bench_single_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_cycle");

    group.bench_function("arena_64b", |b| {
        let arena = Arena::with_config(1024 * 1024, ArenaConfig::production()).unwrap();

        b.iter(|| unsafe {
            let ptr = arena.allocate(64).unwrap();
            arena.deallocate(ptr, 64);
            black_box(ptr);
        });
    });

    group.bench_function("typed_u64x8", |b| {
        let registry = Rc::new(ArenaRegistry::with_config(ArenaConfig::production()));
        let alloc = TypedAllocator::<u64, 1024>::new_in(&registry);

        b.iter(|| unsafe {
            let ptr = alloc.allocate(8).unwrap();
            alloc.deallocate(ptr, 8);
            black_box(ptr);
        });
    });

    group.bench_function("heap_u64x8", |b| {
        let alloc = HeapAllocator::<u64>::new();

        b.iter(|| unsafe {
            let ptr = alloc.allocate(8).unwrap();
            alloc.deallocate(ptr, 8);
            black_box(ptr);
        });
    });

    group.finish();
}

/// Benchmark filling and draining an arena in LIFO order
fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_lifo");
    group.throughput(Throughput::Elements(100));

    group.bench_function("arena_100x64b", |b| {
        let arena = Arena::with_config(64 * 100, ArenaConfig::production()).unwrap();

        b.iter(|| unsafe {
            let mut ptrs = Vec::with_capacity(100);
            for _ in 0..100 {
                ptrs.push(arena.allocate(64).unwrap());
            }
            for ptr in ptrs.into_iter().rev() {
                arena.deallocate(ptr, 64);
            }
        });
    });

    group.bench_function("arena_100x64b_reset", |b| {
        let arena = Arena::with_config(64 * 100, ArenaConfig::production()).unwrap();

        b.iter(|| unsafe {
            for _ in 0..100 {
                black_box(arena.allocate(64).unwrap());
            }
            arena.reset();
        });
    });

    group.finish();
}

/// Benchmark different block sizes
fn bench_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_sizes");

    for size in [16, 64, 256, 1024, 4096] {
        group.bench_with_input(BenchmarkId::new("arena", size), &size, |b, &size| {
            let arena = Arena::with_config(1024 * 1024, ArenaConfig::production()).unwrap();

            b.iter(|| unsafe {
                let ptr = arena.allocate(size).unwrap();
                arena.deallocate(ptr, size);
                black_box(ptr);
            });
        });
    }

    group.finish();
}

/// Benchmark the container over plain and logged allocators
fn bench_chunk_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_list_fill");
    group.throughput(Throughput::Elements(64));

    group.bench_function("typed", |b| {
        let registry = Rc::new(ArenaRegistry::with_config(ArenaConfig::production()));
        let alloc = TypedAllocator::<(u32, u64), 64>::new_in(&registry);

        b.iter(|| {
            let mut list = ChunkList::new_in(alloc.clone());
            for i in 0..64u32 {
                list.push((i, u64::from(i) * 3)).unwrap();
            }
            black_box(list.len());
        });
    });

    group.bench_function("typed_logged", |b| {
        let registry = Rc::new(ArenaRegistry::with_config(ArenaConfig::production()));
        let sink = RecordingSink::new();
        let alloc = LoggingAllocator::new(
            TypedAllocator::<(u32, u64), 64>::new_in(&registry),
            sink.clone(),
        );

        b.iter(|| {
            let mut list = ChunkList::new_in(alloc.clone());
            for i in 0..64u32 {
                list.push((i, u64::from(i) * 3)).unwrap();
            }
            black_box(list.len());
            drop(list);
            sink.take();
        });
    });

    group.bench_function("heap", |b| {
        b.iter(|| {
            let mut list = ChunkList::new_in(HeapAllocator::<(u32, u64)>::new());
            for i in 0..64u32 {
                list.push((i, u64::from(i) * 3)).unwrap();
            }
            black_box(list.len());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_cycle,
    bench_batch,
    bench_sizes,
    bench_chunk_list
);

criterion_main!(benches);
