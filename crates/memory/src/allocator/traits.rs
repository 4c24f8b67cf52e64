//! Element allocator protocol
//!
//! The contract containers program against:
//! - [`ElementAllocator`]: allocate / probe / deallocate `n` elements of one type
//! - [`Rebind`]: derive an allocator for a different element type
//!
//! Equality (`PartialEq`) tells a container whether storage may change hands: two
//! allocators that compare equal can free each other's memory, so a container may move
//! storage between them without reallocating. Allocators that compare unequal force a
//! copy. Equality says nothing about an allocator and its own clones, which always
//! share a backing store even when they compare unequal.
//!
//! # Safety
//!
//! Deallocation is `unsafe`: the caller promises that the pointer came from the same
//! backing store and that `n` matches the count it was allocated with. Neither is checked.

use core::ptr::NonNull;

use crate::error::MemoryResult;

/// Allocator of uninitialized storage for `n` values of [`Self::Element`]
///
/// Returned memory is aligned for `Element` and not initialized. Zero-sized
/// requests (`n == 0` or a zero-sized element) yield a dangling, well-aligned
/// pointer that must only be passed back to `deallocate` with the same `n`.
pub trait ElementAllocator: Clone + PartialEq {
    /// Element type this allocator hands out storage for
    type Element;

    /// Allocates storage for `n` elements
    ///
    /// Fails with [`MemoryError::AllocationFailed`](crate::MemoryError::AllocationFailed)
    /// when the backing store cannot satisfy the request.
    fn allocate(&self, n: usize) -> MemoryResult<NonNull<Self::Element>>;

    /// Allocates storage for `n` elements, or returns `None` on exhaustion
    fn try_allocate(&self, n: usize) -> Option<NonNull<Self::Element>>;

    /// Returns storage for `n` elements
    ///
    /// # Safety
    /// - `ptr` must come from `allocate`/`try_allocate` on this allocator, a clone of
    ///   it, or any allocator that compares equal to it
    /// - `n` must equal the count passed to that call
    /// - `ptr` must not be used after this call
    unsafe fn deallocate(&self, ptr: NonNull<Self::Element>, n: usize);
}

/// Derives an allocator for element type `U` from an allocator for another type
///
/// Containers that store internal nodes rather than bare elements take this as a
/// bound (`A: Rebind<Node<T>>`) and call it once when they need node storage.
pub trait Rebind<U>: ElementAllocator {
    /// The allocator for `U`
    type Output: ElementAllocator<Element = U>;

    /// Produces an allocator of the same family for `U`
    fn rebind(&self) -> Self::Output;
}

/// Byte size of `n` values of `T`, or `None` on overflow
#[inline]
pub(crate) fn array_bytes<T>(n: usize) -> Option<usize> {
    n.checked_mul(size_of::<T>())
}
