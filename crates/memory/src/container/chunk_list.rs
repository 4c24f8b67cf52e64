//! Forward list of short arrays, generic over an element allocator
//!
//! # Safety
//!
//! Nodes and element arrays are raw allocations owned by the list:
//! - Element arrays come from `A`, nodes from `A`'s rebind for [`Node<T>`]
//! - A node's first `len` slots are initialized; `capacity` is the allocation count
//! - Storage is released newest-first, so arenas that only reclaim their tail block
//!   get every byte back on `clear`

use core::fmt;
use core::iter::{Flatten, FusedIterator};
use core::marker::PhantomData;
use core::mem;
use core::ptr::{self, NonNull};
use core::slice;

use crate::allocator::{ElementAllocator, Rebind};
use crate::error::MemoryResult;

/// One chunk: a pointer to `capacity` slots of which the first `len` are live
pub struct Node<T> {
    data: NonNull<T>,
    len: usize,
    capacity: usize,
    next: Option<NonNull<Node<T>>>,
}

/// Linked run of nodes, oldest first
struct Chain<T> {
    head: Option<NonNull<Node<T>>>,
    tail: Option<NonNull<Node<T>>>,
    chunks: usize,
    len: usize,
}

impl<T> Chain<T> {
    const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            chunks: 0,
            len: 0,
        }
    }

    /// # Safety
    /// `node` must be initialized and not part of any chain.
    unsafe fn link(&mut self, node: NonNull<Node<T>>) {
        // SAFETY: caller guarantees `node` is initialized; `tail` is a live node of
        // this chain.
        unsafe {
            (*node.as_ptr()).next = None;
            match self.tail {
                Some(tail) => (*tail.as_ptr()).next = Some(node),
                None => self.head = Some(node),
            }
            self.len += (*node.as_ptr()).len;
        }
        self.tail = Some(node);
        self.chunks += 1;
    }

    fn splice(&mut self, other: Self) {
        let Some(other_head) = other.head else {
            return;
        };
        match self.tail {
            // SAFETY: `tail` is a live node owned by this chain.
            Some(tail) => unsafe { (*tail.as_ptr()).next = Some(other_head) },
            None => self.head = Some(other_head),
        }
        self.tail = other.tail;
        self.chunks += other.chunks;
        self.len += other.len;
    }

    /// Reverses the links in place, so that the head is the newest node
    fn reverse(&mut self) {
        let mut prev = None;
        let mut cursor = self.head;
        self.tail = self.head;
        while let Some(node) = cursor {
            // SAFETY: every node reachable from `head` is live and owned by the chain.
            unsafe {
                cursor = (*node.as_ptr()).next;
                (*node.as_ptr()).next = prev;
            }
            prev = Some(node);
        }
        self.head = prev;
    }
}

impl<T> Default for Chain<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Allocator-aware forward list of short arrays ("chunks")
///
/// Each [`push_chunk`](Self::push_chunk) makes two requests: one array of elements
/// from `A` and one node from `A`'s rebind for [`Node<T>`]. Iteration visits chunks in
/// insertion order.
///
/// ```rust
/// use bumpkit_memory::allocator::TypedAllocator;
/// use bumpkit_memory::arena::ArenaRegistry;
/// use bumpkit_memory::container::ChunkList;
/// use std::rc::Rc;
///
/// let registry = Rc::new(ArenaRegistry::new());
/// let mut list = ChunkList::new_in(TypedAllocator::<u32, 16>::new_in(&registry));
/// list.push_chunk([1, 2, 3])?;
/// list.push(4)?;
/// assert_eq!(list.iter().copied().collect::<Vec<_>>(), [1, 2, 3, 4]);
///
/// list.clear();
/// assert_eq!(registry.arena_for::<u32>(16)?.used(), 0);
/// # Ok::<(), bumpkit_memory::MemoryError>(())
/// ```
pub struct ChunkList<T, A>
where
    A: ElementAllocator<Element = T> + Rebind<Node<T>>,
{
    chain: Chain<T>,
    alloc: A,
    nodes: A::Output,
    _owns: PhantomData<T>,
}

impl<T, A> ChunkList<T, A>
where
    A: ElementAllocator<Element = T> + Rebind<Node<T>>,
{
    /// Creates an empty list drawing from `alloc`
    pub fn new_in(alloc: A) -> Self {
        let nodes = alloc.rebind();
        Self {
            chain: Chain::new(),
            alloc,
            nodes,
            _owns: PhantomData,
        }
    }

    /// Creates an empty list with a default-constructed allocator
    pub fn new() -> Self
    where
        A: Default,
    {
        Self::new_in(A::default())
    }

    /// Element allocator
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Node allocator derived from the element allocator
    pub fn node_allocator(&self) -> &A::Output {
        &self.nodes
    }

    /// Total number of elements
    pub fn len(&self) -> usize {
        self.chain.len
    }

    pub fn is_empty(&self) -> bool {
        self.chain.len == 0
    }

    /// Number of chunks
    pub fn chunk_count(&self) -> usize {
        self.chain.chunks
    }

    /// Appends `values` as one chunk
    ///
    /// An empty iterator adds nothing. On allocation failure the list is unchanged
    /// and the values are dropped.
    pub fn push_chunk<I>(&mut self, values: I) -> MemoryResult<()>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let values = values.into_iter();
        let capacity = values.len();
        if capacity == 0 {
            return Ok(());
        }

        let node = self.allocate_node(capacity)?;
        // SAFETY: `allocate_node` initialized the node with room for `capacity`
        // elements; `take` keeps a misreporting iterator within that room.
        unsafe {
            let raw = node.as_ptr();
            for value in values.take(capacity) {
                (*raw).data.as_ptr().add((*raw).len).write(value);
                (*raw).len += 1;
            }
            self.chain.link(node);
        }
        Ok(())
    }

    /// Appends a single-element chunk
    pub fn push(&mut self, value: T) -> MemoryResult<()> {
        self.push_chunk(core::iter::once(value))
    }

    /// Iterates over chunks as slices
    pub fn chunks(&self) -> Chunks<'_, T> {
        Chunks {
            next: self.chain.head,
            remaining: self.chain.chunks,
            _marker: PhantomData,
        }
    }

    /// Iterates over elements in insertion order
    pub fn iter(&self) -> Flatten<Chunks<'_, T>> {
        self.chunks().flatten()
    }

    /// Drops every element and releases all storage, newest chunk first
    pub fn clear(&mut self) {
        let chain = mem::take(&mut self.chain);
        // SAFETY: the chain was detached from `self` and its storage came from
        // `self.alloc` / `self.nodes` or, after a splice, from equal allocators.
        unsafe { self.release(chain) };
    }

    /// Copies the list into fresh storage from a clone of the allocator
    pub fn try_clone(&self) -> MemoryResult<Self>
    where
        T: Clone,
    {
        let mut copy = Self::new_in(self.alloc.clone());
        for chunk in self.chunks() {
            copy.push_chunk(chunk.iter().cloned())?;
        }
        Ok(copy)
    }

    /// Moves every element of `other` to the end of `self`, leaving `other` empty
    ///
    /// When the allocators compare equal the nodes are relinked and nothing is
    /// copied. Otherwise new storage is taken from `self`'s allocator, the elements
    /// are moved into it and `other`'s storage is released. If that allocation fails,
    /// both lists are left unchanged.
    pub fn append(&mut self, other: &mut Self) -> MemoryResult<()> {
        if other.chain.chunks == 0 {
            return Ok(());
        }

        if self.alloc == other.alloc {
            self.chain.splice(mem::take(&mut other.chain));
            return Ok(());
        }

        let mut staged = Chain::new();
        let mut cursor = other.chain.head;
        while let Some(src) = cursor {
            // SAFETY: `src` is a live node of `other`.
            let (len, next) = unsafe { ((*src.as_ptr()).len, (*src.as_ptr()).next) };
            match self.allocate_node(len) {
                // SAFETY: fresh node, not linked anywhere.
                Ok(node) => unsafe { staged.link(node) },
                Err(err) => {
                    // SAFETY: staged storage came from our allocators and holds no
                    // live elements yet.
                    unsafe { self.release(staged) };
                    return Err(err);
                }
            }
            cursor = next;
        }

        let mut src_cursor = other.chain.head;
        let mut dst_cursor = staged.head;
        while let (Some(src), Some(dst)) = (src_cursor, dst_cursor) {
            // SAFETY: `src` and `dst` belong to different chains; `dst` was sized
            // for exactly `src.len` elements. After the copy `src` no longer owns
            // its elements.
            unsafe {
                let src = &mut *src.as_ptr();
                let dst = &mut *dst.as_ptr();
                ptr::copy_nonoverlapping(src.data.as_ptr(), dst.data.as_ptr(), src.len);
                dst.len = src.len;
                src.len = 0;
                src_cursor = src.next;
                dst_cursor = dst.next;
            }
        }
        staged.len = other.chain.len;

        let drained = mem::take(&mut other.chain);
        // SAFETY: every node of `drained` has `len == 0`, so only storage is released.
        unsafe { other.release(drained) };
        self.chain.splice(staged);
        Ok(())
    }

    fn allocate_node(&self, capacity: usize) -> MemoryResult<NonNull<Node<T>>> {
        let data = self.alloc.allocate(capacity)?;
        match self.nodes.allocate(1) {
            Ok(node) => {
                // SAFETY: `node` is fresh storage for one `Node<T>`.
                unsafe {
                    node.as_ptr().write(Node {
                        data,
                        len: 0,
                        capacity,
                        next: None,
                    });
                }
                Ok(node)
            }
            Err(err) => {
                // SAFETY: `data` was just allocated with `capacity`.
                unsafe { self.alloc.deallocate(data, capacity) };
                Err(err)
            }
        }
    }

    /// # Safety
    /// `chain` must be detached and all its storage must come from this list's
    /// allocators, their clones, or allocators equal to them.
    unsafe fn release(&self, mut chain: Chain<T>) {
        chain.reverse();
        let mut cursor = chain.head;
        while let Some(node) = cursor {
            // SAFETY: `node` is initialized and exclusively owned by `chain`; its
            // first `len` slots are live. Each chunk is freed in reverse allocation
            // order: node, then its elements.
            unsafe {
                let Node {
                    data,
                    len,
                    capacity,
                    next,
                } = node.as_ptr().read();
                ptr::drop_in_place(ptr::slice_from_raw_parts_mut(data.as_ptr(), len));
                self.nodes.deallocate(node, 1);
                self.alloc.deallocate(data, capacity);
                cursor = next;
            }
        }
    }
}

impl<T, A> Default for ChunkList<T, A>
where
    A: ElementAllocator<Element = T> + Rebind<Node<T>> + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A> Drop for ChunkList<T, A>
where
    A: ElementAllocator<Element = T> + Rebind<Node<T>>,
{
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T, A, B> PartialEq<ChunkList<T, B>> for ChunkList<T, A>
where
    T: PartialEq,
    A: ElementAllocator<Element = T> + Rebind<Node<T>>,
    B: ElementAllocator<Element = T> + Rebind<Node<T>>,
{
    fn eq(&self, other: &ChunkList<T, B>) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T, A> fmt::Debug for ChunkList<T, A>
where
    T: fmt::Debug,
    A: ElementAllocator<Element = T> + Rebind<Node<T>>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, T, A> IntoIterator for &'a ChunkList<T, A>
where
    A: ElementAllocator<Element = T> + Rebind<Node<T>>,
{
    type Item = &'a T;
    type IntoIter = Flatten<Chunks<'a, T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the chunks of a [`ChunkList`]
pub struct Chunks<'a, T> {
    next: Option<NonNull<Node<T>>>,
    remaining: usize,
    _marker: PhantomData<&'a T>,
}

impl<'a, T> Iterator for Chunks<'a, T> {
    type Item = &'a [T];

    fn next(&mut self) -> Option<&'a [T]> {
        let node = self.next?;
        // SAFETY: the list is borrowed for 'a, so its nodes stay live and unmodified.
        let node = unsafe { node.as_ref() };
        self.next = node.next;
        self.remaining -= 1;
        // SAFETY: the first `len` slots of a linked node are initialized.
        Some(unsafe { slice::from_raw_parts(node.data.as_ptr(), node.len) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Chunks<'_, T> {}

impl<T> FusedIterator for Chunks<'_, T> {}
