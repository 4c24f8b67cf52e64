//! Global-heap element allocator
//!
//! Delegates to `std::alloc`. Stateless: every instance can free memory obtained
//! through any other, so all instances compare equal.

use core::alloc::Layout;
use core::any::type_name;
use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;
use std::alloc;

use super::traits::{ElementAllocator, Rebind};
use crate::error::{MemoryError, MemoryResult};

/// Element allocator backed by the process-wide heap
pub struct HeapAllocator<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> HeapAllocator<T> {
    /// Creates a new heap allocator
    ///
    /// This is a zero-cost operation as the allocator contains no state.
    #[inline]
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    fn layout(n: usize) -> MemoryResult<Layout> {
        Layout::array::<T>(n).map_err(|_| MemoryError::size_overflow("heap array layout"))
    }
}

impl<T> ElementAllocator for HeapAllocator<T> {
    type Element = T;

    fn allocate(&self, n: usize) -> MemoryResult<NonNull<T>> {
        let layout = Self::layout(n)?;
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }

        // SAFETY: `layout` has a non-zero size.
        let ptr = unsafe { alloc::alloc(layout) };
        NonNull::new(ptr.cast::<T>())
            .ok_or_else(|| MemoryError::allocation_failed::<T>(n, layout.size(), 0))
    }

    fn try_allocate(&self, n: usize) -> Option<NonNull<T>> {
        let layout = Self::layout(n).ok()?;
        if layout.size() == 0 {
            return Some(NonNull::dangling());
        }

        // SAFETY: `layout` has a non-zero size.
        NonNull::new(unsafe { alloc::alloc(layout) }.cast::<T>())
    }

    unsafe fn deallocate(&self, ptr: NonNull<T>, n: usize) {
        let Ok(layout) = Self::layout(n) else {
            return;
        };
        if layout.size() == 0 {
            return; // Nothing to deallocate for zero-sized allocations
        }

        // SAFETY: the caller guarantees `ptr` was allocated here with the same `n`,
        // which reproduces the allocation layout exactly.
        unsafe { alloc::dealloc(ptr.as_ptr().cast::<u8>(), layout) };
    }
}

impl<T, U> Rebind<U> for HeapAllocator<T> {
    type Output = HeapAllocator<U>;

    fn rebind(&self) -> Self::Output {
        HeapAllocator::new()
    }
}

impl<T, U> PartialEq<HeapAllocator<U>> for HeapAllocator<T> {
    fn eq(&self, _other: &HeapAllocator<U>) -> bool {
        true
    }
}

impl<T> Eq for HeapAllocator<T> {}

impl<T> Clone for HeapAllocator<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for HeapAllocator<T> {}

impl<T> Default for HeapAllocator<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for HeapAllocator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HeapAllocator<{}>", type_name::<T>())
    }
}
