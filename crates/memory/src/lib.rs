//! # bumpkit-memory
//!
//! Bump arenas and allocator-aware building blocks for short-lived, stack-shaped
//! allocation patterns.
//!
//! This crate provides:
//! - [`Arena`](arena::Arena): a fixed-capacity bump allocator that reclaims only its most
//!   recent live block
//! - [`TypedAllocator`](allocator::TypedAllocator): a typed allocator bound to one arena per
//!   `(element type, capacity)` through an [`ArenaRegistry`](arena::ArenaRegistry)
//! - [`LoggingAllocator`](extensions::logging::LoggingAllocator): a decorator that reports
//!   every allocator call before forwarding it
//! - [`ChunkList`](container::ChunkList): a container written against the allocator protocol
//!
//! ## Quick Start
//!
//! ```rust
//! use bumpkit_memory::prelude::*;
//! use std::rc::Rc;
//!
//! let registry = Rc::new(ArenaRegistry::new());
//! let sink = RecordingSink::new();
//! let alloc = LoggingAllocator::new(TypedAllocator::<i32, 16>::new_in(&registry), sink.clone());
//!
//! let mut list = ChunkList::new_in(alloc);
//! list.push_chunk([1, 2, 3])?;
//! assert_eq!(sink.lines()[0], "allocate<i32>[n = 3]");
//! # Ok::<(), MemoryError>(())
//! ```
//!
//! ## Features
//!
//! - `logging` (default): `tracing` diagnostics and the [`TracingSink`](extensions::TracingSink)
//!
//! ## Threading
//!
//! Everything here is single-threaded. Arenas, registries and typed allocators are
//! neither `Send` nor `Sync`.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(clippy::all)]
#![warn(clippy::perf)]
#![warn(clippy::pedantic)]
#![warn(rust_2018_idioms)]
#![allow(unsafe_code)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
// Precision loss in usize -> f64 casts is acceptable for stats
#![allow(clippy::cast_precision_loss)]
// #[must_use] on fns returning Self/Result documents intent even if type is already must_use
#![allow(clippy::double_must_use)]
#![allow(clippy::return_self_not_must_use)]
// Typed views over byte storage; alignment is guaranteed by the arena base and block sizes
#![allow(clippy::cast_ptr_alignment)]

// Error types
pub mod error;

pub mod allocator;
pub mod arena;
pub mod container;
pub mod core;
pub mod extensions;

pub use crate::error::{MemoryError, MemoryResult, Result};

// Public API exports
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::core::{ArenaConfig, MemoryUsage, Resettable};

    pub use crate::error::{MemoryError, MemoryResult};

    pub use crate::allocator::{ElementAllocator, HeapAllocator, Rebind, TypedAllocator};

    pub use crate::arena::{Arena, ArenaRegistry, ArenaStats};

    pub use crate::container::ChunkList;

    #[cfg(feature = "logging")]
    pub use crate::extensions::TracingSink;
    pub use crate::extensions::{
        AllocationEvent, AllocationSink, LogLevel, LoggingAllocator, RecordingSink, StderrSink,
    };
}
