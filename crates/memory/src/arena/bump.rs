//! Fixed-capacity bump arena with LIFO-only reclamation
//!
//! # Safety
//!
//! This module owns the only raw buffer in the crate:
//! - The buffer is obtained from the global allocator once and never resized
//! - `offset` is a `Cell`, so the arena is `!Sync`; the buffer pointer makes it `!Send`
//! - Deallocation only moves `offset` back when the freed block ends exactly at `offset`
//!
//! ## Invariants
//!
//! - `0 <= offset <= capacity`
//! - Every non-empty block handed out lies in [`start`, `start + capacity`)
//! - Live blocks never overlap: each one starts at the offset left by its predecessor
//! - `offset` only decreases through a tail deallocation or an explicit reset

use core::alloc::Layout;
use core::cell::Cell;
use core::fmt;
use core::ptr::NonNull;
use std::alloc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

use super::stats::{ArenaStats, StatsCell};
use crate::core::{ArenaConfig, MemoryUsage, Resettable};
use crate::error::{MemoryError, MemoryResult};

/// Fixed-capacity bump allocator over one owned byte buffer
///
/// Allocation hands out `start + offset` and advances `offset`. Memory is returned
/// to the arena only when the freed block is the most recently allocated one that is
/// still live; any other deallocation is ignored and its bytes stay lost until the
/// arena is reset or dropped. No free list and no per-block metadata are kept.
///
/// # Memory Layout
/// ```text
/// [start]----[block1]----[block2]----[offset]--------[end]
///             <----- allocated ----->  <-- available -->
/// ```
///
/// Only `block2` can be reclaimed; freeing `block1` first is a no-op.
///
/// # Thread Safety
///
/// An arena is neither `Send` nor `Sync`. Sharing one between threads requires
/// external synchronization that this type deliberately does not provide.
///
/// # Example
///
/// ```rust
/// use bumpkit_memory::arena::Arena;
///
/// let arena = Arena::new(16)?;
/// let a = arena.allocate(10)?;
/// assert_eq!(arena.used(), 10);
/// assert!(arena.allocate(10).is_err());
///
/// unsafe { arena.deallocate(a, 10) };
/// assert_eq!(arena.used(), 0);
/// assert_eq!(arena.allocate(16)?, a);
/// # Ok::<(), bumpkit_memory::MemoryError>(())
/// ```
pub struct Arena {
    buffer: NonNull<u8>,
    layout: Layout,
    offset: Cell<usize>,
    config: ArenaConfig,
    stats: StatsCell,
}

impl Arena {
    /// Creates an arena of `capacity` bytes with the default configuration
    pub fn new(capacity: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, ArenaConfig::default())
    }

    /// Creates an arena of `capacity` bytes with the given configuration
    pub fn with_config(capacity: usize, config: ArenaConfig) -> MemoryResult<Self> {
        if capacity == 0 {
            return Err(MemoryError::invalid_config("arena capacity cannot be zero"));
        }
        config.validate()?;

        let layout = Layout::from_size_align(capacity, config.align)
            .map_err(|_| MemoryError::size_overflow("arena capacity rounded up to alignment"))?;

        // SAFETY: `layout` has a non-zero size (checked above).
        let raw = unsafe {
            match config.alloc_pattern {
                Some(_) => alloc::alloc(layout),
                None => alloc::alloc_zeroed(layout),
            }
        };
        let buffer = NonNull::new(raw)
            .ok_or_else(|| MemoryError::system_allocation(capacity, config.align))?;

        if let Some(pattern) = config.alloc_pattern {
            // SAFETY: `buffer` is valid for writes of `capacity` bytes (just allocated).
            unsafe { buffer.as_ptr().write_bytes(pattern, capacity) };
        }

        #[cfg(feature = "logging")]
        debug!(capacity, align = config.align, "arena created");

        Ok(Self {
            buffer,
            layout,
            offset: Cell::new(0),
            stats: StatsCell::new(config.track_stats),
            config,
        })
    }

    /// Total capacity in bytes
    #[inline]
    pub fn capacity(&self) -> usize {
        self.layout.size()
    }

    /// Bytes currently allocated (the offset)
    #[inline]
    pub fn used(&self) -> usize {
        self.offset.get()
    }

    /// Bytes still available past the offset
    #[inline]
    pub fn available(&self) -> usize {
        self.capacity() - self.used()
    }

    /// Highest offset reached since creation or the last reset
    #[inline]
    pub fn peak_usage(&self) -> usize {
        self.stats.peak()
    }

    /// Base alignment of the buffer
    #[inline]
    pub fn align(&self) -> usize {
        self.layout.align()
    }

    /// Configuration the arena was created with
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Activity counters
    pub fn stats(&self) -> ArenaStats {
        self.stats.snapshot()
    }

    /// Start of the buffer
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.buffer.as_ptr()
    }

    #[inline]
    fn start_addr(&self) -> usize {
        self.buffer.as_ptr() as usize
    }

    /// Returns `true` if `ptr` points into the buffer
    pub fn contains(&self, ptr: NonNull<u8>) -> bool {
        let addr = ptr.as_ptr() as usize;
        addr >= self.start_addr() && addr < self.start_addr() + self.capacity()
    }

    /// Returns `true` if `[ptr, ptr + size)` is the most recent live block
    pub fn is_tail(&self, ptr: NonNull<u8>, size: usize) -> bool {
        let offset = self.offset.get();
        size != 0
            && size <= offset
            && (ptr.as_ptr() as usize).checked_add(size) == Some(self.start_addr() + offset)
    }

    /// Reserves `size` bytes, or returns `None` when they do not fit
    ///
    /// Never fails: this is the probe entry point for callers that want to check
    /// capacity before committing. A zero-sized request consumes nothing and
    /// returns the current end of the allocated region, which is never the tail
    /// of any block.
    pub fn try_allocate(&self, size: usize) -> Option<NonNull<u8>> {
        let offset = self.offset.get();
        if size == 0 {
            // SAFETY: `offset <= capacity`, so the result is at most one past the end.
            return Some(unsafe { self.buffer.add(offset) });
        }

        if size > self.capacity() - offset {
            self.stats.record_failure();
            #[cfg(feature = "logging")]
            trace!(size, available = self.capacity() - offset, "arena request refused");
            return None;
        }

        // SAFETY: `offset + size <= capacity`, so `offset` is within the buffer.
        let ptr = unsafe { self.buffer.add(offset) };
        let new_offset = offset + size;
        self.offset.set(new_offset);
        self.stats.record_allocation(size, new_offset);

        if let Some(pattern) = self.config.alloc_pattern {
            // SAFETY: `[ptr, ptr + size)` lies within the buffer and was just
            // handed out; no live block overlaps it.
            unsafe { ptr.as_ptr().write_bytes(pattern, size) };
        }

        #[cfg(feature = "logging")]
        trace!(size, offset, "arena bump");

        Some(ptr)
    }

    /// Reserves `size` bytes or fails with [`MemoryError::OutOfMemory`]
    ///
    /// A failed call leaves the arena untouched.
    pub fn allocate(&self, size: usize) -> MemoryResult<NonNull<u8>> {
        self.try_allocate(size)
            .ok_or_else(|| MemoryError::out_of_memory(size, self.available()))
    }

    /// Returns a block to the arena if it is the tail; otherwise does nothing
    ///
    /// When `ptr + size` equals the current end of the allocated region the offset
    /// moves back by `size`. Every other call, including pointers from outside the
    /// buffer and zero sizes, is a silent no-op.
    ///
    /// # Safety
    ///
    /// - `size` must equal the size passed to the `allocate`/`try_allocate` call that
    ///   returned `ptr`. A different size is not detected: it moves the offset to the
    ///   wrong place and later allocations may overlap live blocks.
    /// - After a reclaiming call the block must not be used again.
    pub unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize) {
        if self.is_tail(ptr, size) {
            let offset = self.offset.get() - size;
            self.offset.set(offset);
            self.stats.record_reclaim(size);

            if let Some(pattern) = self.config.dealloc_pattern {
                // SAFETY: `is_tail` established that the block is
                // `[start + offset, start + offset + size)`, inside the buffer.
                unsafe { self.buffer.add(offset).as_ptr().write_bytes(pattern, size) };
            }

            #[cfg(feature = "logging")]
            trace!(size, offset, "arena reclaim");
        } else if size != 0 && self.contains(ptr) {
            self.stats.record_lost(size);

            #[cfg(feature = "logging")]
            trace!(size, "arena deallocation ignored: block is not the tail");
        }
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        // SAFETY: `buffer` was allocated in `with_config` with exactly `self.layout`.
        unsafe { alloc::dealloc(self.buffer.as_ptr(), self.layout) };
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity())
            .field("used", &self.used())
            .field("align", &self.align())
            .finish()
    }
}

impl MemoryUsage for Arena {
    fn used_memory(&self) -> usize {
        self.used()
    }

    fn available_memory(&self) -> Option<usize> {
        Some(self.available())
    }
}

impl Resettable for Arena {
    /// # Safety
    ///
    /// Caller must ensure no block handed out by this arena is used afterwards.
    unsafe fn reset(&self) {
        let used = self.offset.get();
        if let Some(pattern) = self.config.dealloc_pattern {
            // SAFETY: `[start, start + used)` is the allocated prefix of the buffer.
            unsafe { self.buffer.as_ptr().write_bytes(pattern, used) };
        }
        self.offset.set(0);
        self.stats.reset();
    }
}
