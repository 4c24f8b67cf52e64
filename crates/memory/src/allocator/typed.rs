//! Typed allocator bound to one arena per `(element type, capacity)`

use core::any::type_name;
use core::cell::OnceCell;
use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;
use std::rc::Rc;

use super::traits::{ElementAllocator, Rebind, array_bytes};
use crate::arena::{Arena, ArenaRegistry};
use crate::error::{MemoryError, MemoryResult};

/// Allocator for `T` backed by the registry arena of `CAP` elements
///
/// The value carries no state beyond its identity: a registry handle and a lazily
/// resolved arena handle. Every allocator for the same `(T, CAP)` on the same
/// registry draws from the same arena; [`rebind`](Self::rebind) yields an allocator
/// for another element type bound to that type's own arena.
///
/// Because the arena only reclaims its tail block, memory from one instance cannot
/// be handed to another instance's container. Any two instances therefore compare
/// unequal, even a value with itself, and the type does not implement `Eq`.
///
/// ```rust
/// use bumpkit_memory::allocator::{ElementAllocator, TypedAllocator};
/// use bumpkit_memory::arena::ArenaRegistry;
/// use std::rc::Rc;
///
/// let registry = Rc::new(ArenaRegistry::new());
/// let ints = TypedAllocator::<i32, 4>::new_in(&registry);
/// let ptr = ints.allocate(3)?;
/// assert_eq!(ints.used_bytes(), 12);
/// assert!(ints != ints.clone());
/// unsafe { ints.deallocate(ptr, 3) };
/// assert_eq!(ints.used_bytes(), 0);
/// # Ok::<(), bumpkit_memory::MemoryError>(())
/// ```
pub struct TypedAllocator<T: 'static, const CAP: usize> {
    registry: Rc<ArenaRegistry>,
    arena: OnceCell<Rc<Arena>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static, const CAP: usize> TypedAllocator<T, CAP> {
    /// Capacity of the bound arena, in elements
    pub const CAPACITY: usize = CAP;

    /// Creates an allocator drawing from `registry`
    pub fn new_in(registry: &Rc<ArenaRegistry>) -> Self {
        const { assert!(CAP > 0, "TypedAllocator capacity must be non-zero") };

        Self {
            registry: Rc::clone(registry),
            arena: OnceCell::new(),
            _marker: PhantomData,
        }
    }

    /// Creates an allocator drawing from this thread's default registry
    pub fn new() -> Self {
        Self::new_in(&ArenaRegistry::thread_default())
    }

    /// Allocator for `U` with the same capacity, on the same registry
    ///
    /// The result is bound to the `(U, CAP)` arena; nothing is copied.
    pub fn rebind<U: 'static>(&self) -> TypedAllocator<U, CAP> {
        TypedAllocator::new_in(&self.registry)
    }

    /// Registry this allocator resolves its arena from
    pub fn registry(&self) -> &Rc<ArenaRegistry> {
        &self.registry
    }

    /// The bound arena, created on first use
    pub fn arena(&self) -> MemoryResult<Rc<Arena>> {
        self.resolve().map(Rc::clone)
    }

    /// Bytes in use in the bound arena (0 if it does not exist yet)
    pub fn used_bytes(&self) -> usize {
        self.arena
            .get()
            .cloned()
            .or_else(|| self.registry.get::<T>(CAP))
            .map_or(0, |arena| arena.used())
    }

    /// Size of the bound arena in bytes
    pub fn capacity_bytes(&self) -> usize {
        CAP.saturating_mul(size_of::<T>())
    }

    fn resolve(&self) -> MemoryResult<&Rc<Arena>> {
        if let Some(arena) = self.arena.get() {
            return Ok(arena);
        }
        let arena = self.registry.arena_for::<T>(CAP)?;
        Ok(self.arena.get_or_init(|| arena))
    }
}

impl<T: 'static, const CAP: usize> ElementAllocator for TypedAllocator<T, CAP> {
    type Element = T;

    fn allocate(&self, n: usize) -> MemoryResult<NonNull<T>> {
        let bytes = array_bytes::<T>(n);
        if bytes == Some(0) {
            return Ok(NonNull::dangling());
        }

        let arena = self.resolve()?;
        // A byte count past `usize::MAX` can never fit either.
        let Some(bytes) = bytes else {
            return Err(MemoryError::allocation_failed::<T>(
                n,
                usize::MAX,
                arena.available(),
            ));
        };
        // Block sizes are multiples of size_of::<T>() and the base is aligned to
        // align_of::<T>(), so every offset the arena hands out is aligned for T.
        arena
            .try_allocate(bytes)
            .map(NonNull::cast)
            .ok_or_else(|| MemoryError::allocation_failed::<T>(n, bytes, arena.available()))
    }

    fn try_allocate(&self, n: usize) -> Option<NonNull<T>> {
        let bytes = array_bytes::<T>(n)?;
        if bytes == 0 {
            return Some(NonNull::dangling());
        }
        self.resolve().ok()?.try_allocate(bytes).map(NonNull::cast)
    }

    unsafe fn deallocate(&self, ptr: NonNull<T>, n: usize) {
        let Some(bytes) = array_bytes::<T>(n) else {
            return;
        };
        if bytes == 0 {
            return;
        }
        if let Ok(arena) = self.resolve() {
            // SAFETY: the caller guarantees `ptr` came from this allocator or a
            // clone of it, so from this binding's arena, with the same element
            // count, hence the same byte size.
            unsafe { arena.deallocate(ptr.cast(), bytes) };
        }
    }
}

impl<T: 'static, U: 'static, const CAP: usize> Rebind<U> for TypedAllocator<T, CAP> {
    type Output = TypedAllocator<U, CAP>;

    fn rebind(&self) -> Self::Output {
        TypedAllocator::new_in(&self.registry)
    }
}

impl<T: 'static, U: 'static, const CAP: usize> From<&TypedAllocator<U, CAP>>
    for TypedAllocator<T, CAP>
{
    fn from(other: &TypedAllocator<U, CAP>) -> Self {
        other.rebind::<T>()
    }
}

impl<T: 'static, U: 'static, const A: usize, const B: usize> PartialEq<TypedAllocator<U, B>>
    for TypedAllocator<T, A>
{
    fn eq(&self, _other: &TypedAllocator<U, B>) -> bool {
        false
    }
}

impl<T: 'static, const CAP: usize> Clone for TypedAllocator<T, CAP> {
    fn clone(&self) -> Self {
        Self {
            registry: Rc::clone(&self.registry),
            arena: self.arena.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: 'static, const CAP: usize> Default for TypedAllocator<T, CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static, const CAP: usize> fmt::Debug for TypedAllocator<T, CAP> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedAllocator")
            .field("element", &type_name::<T>())
            .field("capacity", &CAP)
            .field("resolved", &self.arena.get().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Rc<ArenaRegistry> {
        Rc::new(ArenaRegistry::new())
    }

    #[test]
    fn resolves_lazily() {
        let registry = registry();
        let alloc = TypedAllocator::<u32, 4>::new_in(&registry);
        assert!(registry.is_empty());
        assert_eq!(alloc.used_bytes(), 0);
        assert_eq!(alloc.capacity_bytes(), 16);

        alloc.allocate(1).unwrap();
        assert!(registry.contains::<u32>(4));
        assert_eq!(alloc.used_bytes(), 4);
    }

    #[test]
    fn instances_share_binding() {
        let registry = registry();
        let a = TypedAllocator::<u64, 2>::new_in(&registry);
        let b = TypedAllocator::<u64, 2>::new_in(&registry);
        let first = a.allocate(1).unwrap();
        let second = b.allocate(1).unwrap();
        assert_eq!(second.as_ptr() as usize, first.as_ptr() as usize + 8);
        assert!(b.allocate(1).is_err());
    }

    #[test]
    fn never_equal() {
        let registry = registry();
        let a = TypedAllocator::<u8, 8>::new_in(&registry);
        let same = a.clone();
        let other: TypedAllocator<u16, 8> = a.rebind();
        assert!(a != same);
        #[allow(clippy::eq_op)]
        {
            assert!(!(a == a));
        }
        assert!(a != other);
        assert!(other != a);
    }

    #[test]
    fn clones_free_each_others_blocks() {
        let registry = registry();
        let alloc = TypedAllocator::<u32, 4>::new_in(&registry);
        let twin = alloc.clone();
        assert!(alloc != twin);

        let ptr = alloc.allocate(3).unwrap();
        unsafe { twin.deallocate(ptr, 3) };
        assert_eq!(alloc.used_bytes(), 0);

        let ptr = twin.allocate(2).unwrap();
        unsafe { alloc.deallocate(ptr, 2) };
        assert_eq!(twin.used_bytes(), 0);
    }

    #[test]
    fn exhaustion_reports_element_type() {
        let registry = registry();
        let alloc = TypedAllocator::<u32, 2>::new_in(&registry);
        let err = alloc.allocate(3).unwrap_err();
        assert_eq!(
            err,
            MemoryError::AllocationFailed {
                element: "u32",
                count: 3,
                bytes: 12,
                available: 8,
            }
        );
        assert!(alloc.try_allocate(3).is_none());
        assert_eq!(alloc.used_bytes(), 0);
    }

    #[test]
    fn overflowing_count_is_an_allocation_failure() {
        let alloc = TypedAllocator::<u64, 2>::new_in(&registry());
        assert_eq!(
            alloc.allocate(usize::MAX).unwrap_err(),
            MemoryError::AllocationFailed {
                element: "u64",
                count: usize::MAX,
                bytes: usize::MAX,
                available: 16,
            }
        );
        assert!(alloc.try_allocate(usize::MAX).is_none());
        assert_eq!(alloc.used_bytes(), 0);
    }

    #[test]
    fn zero_sized_requests_skip_arena() {
        let registry = registry();
        let alloc = TypedAllocator::<u32, 2>::new_in(&registry);
        let ptr = alloc.allocate(0).unwrap();
        unsafe { alloc.deallocate(ptr, 0) };
        assert!(registry.is_empty());

        let unit = TypedAllocator::<(), 2>::new_in(&registry);
        let ptr = unit.allocate(5).unwrap();
        unsafe { unit.deallocate(ptr, 5) };
        assert!(registry.is_empty());
    }

    #[test]
    fn rebind_targets_other_arena() {
        let registry = registry();
        let ints = TypedAllocator::<i32, 4>::new_in(&registry);
        let longs = TypedAllocator::<i64, 4>::from(&ints);
        ints.allocate(4).unwrap();
        longs.allocate(4).unwrap();
        assert_eq!(ints.used_bytes(), 16);
        assert_eq!(longs.used_bytes(), 32);
        assert!(!Rc::ptr_eq(&ints.arena().unwrap(), &longs.arena().unwrap()));

        let back: TypedAllocator<i32, 4> = Rebind::<i32>::rebind(&longs);
        assert!(Rc::ptr_eq(&back.arena().unwrap(), &ints.arena().unwrap()));
    }

    #[test]
    fn resolved_arena_survives_retire() {
        let registry = registry();
        let alloc = TypedAllocator::<u16, 4>::new_in(&registry);
        let ptr = alloc.allocate(2).unwrap();
        registry.retire::<u16>(4);

        unsafe { alloc.deallocate(ptr, 2) };
        assert_eq!(alloc.arena().unwrap().used(), 0);

        let fresh = TypedAllocator::<u16, 4>::new_in(&registry);
        assert!(!Rc::ptr_eq(&alloc.arena().unwrap(), &fresh.arena().unwrap()));
    }
}
