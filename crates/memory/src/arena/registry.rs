//! Registry of arenas keyed by `(element type, capacity)`
//!
//! Every [`TypedAllocator`](crate::allocator::TypedAllocator) resolves its arena here.
//! Two allocators with the same element type and capacity on the same registry share
//! one arena; a different element type or capacity gets a different one.

use core::any::{TypeId, type_name};
use core::cell::RefCell;
use core::fmt;
use std::collections::HashMap;
use std::rc::Rc;

#[cfg(feature = "logging")]
use tracing::debug;

use super::Arena;
use crate::core::ArenaConfig;
use crate::error::{MemoryError, MemoryResult};

/// Identity of one arena in a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingKey {
    /// Element type the arena serves
    pub element: TypeId,
    /// Capacity in elements
    pub capacity: usize,
}

impl BindingKey {
    /// Key for element type `T` and `capacity` elements
    pub fn of<T: 'static>(capacity: usize) -> Self {
        Self {
            element: TypeId::of::<T>(),
            capacity,
        }
    }
}

/// Debug listing entry returned by [`ArenaRegistry::bindings`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingInfo {
    pub element: &'static str,
    pub capacity: usize,
    pub used_bytes: usize,
    pub capacity_bytes: usize,
}

impl fmt::Display for BindingInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}]: {}/{} bytes",
            self.element, self.capacity, self.used_bytes, self.capacity_bytes
        )
    }
}

struct Binding {
    element: &'static str,
    arena: Rc<Arena>,
}

/// Lazily populated map from binding to arena
///
/// Arenas are created on first request, sized `capacity * size_of::<T>()` bytes and
/// aligned to at least `align_of::<T>()`. Handles are reference counted: retiring a
/// binding only forgets the registry's handle, so memory handed out through an
/// allocator that already resolved the arena stays valid until that allocator drops.
///
/// The registry is single-threaded (`!Send`, `!Sync`).
pub struct ArenaRegistry {
    config: ArenaConfig,
    bindings: RefCell<HashMap<BindingKey, Binding>>,
}

thread_local! {
    static THREAD_DEFAULT: Rc<ArenaRegistry> = Rc::new(ArenaRegistry::new());
}

impl ArenaRegistry {
    /// Creates an empty registry with the default arena configuration
    pub fn new() -> Self {
        Self::with_config(ArenaConfig::default())
    }

    /// Creates an empty registry whose arenas all use `config`
    pub fn with_config(config: ArenaConfig) -> Self {
        Self {
            config,
            bindings: RefCell::new(HashMap::new()),
        }
    }

    /// The registry used by `TypedAllocator::default()` on this thread
    pub fn thread_default() -> Rc<Self> {
        THREAD_DEFAULT.with(Rc::clone)
    }

    /// Retires every binding of this thread's default registry
    pub fn reset_thread_default() {
        THREAD_DEFAULT.with(|registry| registry.clear());
    }

    /// Configuration applied to new arenas
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Returns the arena for `(T, capacity)`, creating it on first use
    pub fn arena_for<T: 'static>(&self, capacity: usize) -> MemoryResult<Rc<Arena>> {
        let key = BindingKey::of::<T>(capacity);
        if let Some(binding) = self.bindings.borrow().get(&key) {
            return Ok(Rc::clone(&binding.arena));
        }

        let bytes = capacity
            .checked_mul(size_of::<T>())
            .ok_or_else(|| MemoryError::size_overflow("arena capacity * element size"))?;
        if bytes == 0 {
            return Err(MemoryError::invalid_config(
                "arena binding needs a non-zero capacity and a sized element type",
            ));
        }

        let config = self
            .config
            .clone()
            .with_align(self.config.align.max(align_of::<T>()));
        let arena = Rc::new(Arena::with_config(bytes, config)?);

        #[cfg(feature = "logging")]
        debug!(element = type_name::<T>(), capacity, bytes, "arena binding created");

        self.bindings.borrow_mut().insert(
            key,
            Binding {
                element: type_name::<T>(),
                arena: Rc::clone(&arena),
            },
        );
        Ok(arena)
    }

    /// Returns the arena for `(T, capacity)` if it has been created
    pub fn get<T: 'static>(&self, capacity: usize) -> Option<Rc<Arena>> {
        self.bindings
            .borrow()
            .get(&BindingKey::of::<T>(capacity))
            .map(|binding| Rc::clone(&binding.arena))
    }

    /// Returns `true` if the arena for `(T, capacity)` exists
    pub fn contains<T: 'static>(&self, capacity: usize) -> bool {
        self.bindings
            .borrow()
            .contains_key(&BindingKey::of::<T>(capacity))
    }

    /// Forgets the arena for `(T, capacity)`; the next request creates a fresh one
    pub fn retire<T: 'static>(&self, capacity: usize) -> bool {
        let removed = self
            .bindings
            .borrow_mut()
            .remove(&BindingKey::of::<T>(capacity));

        #[cfg(feature = "logging")]
        {
            if removed.is_some() {
                debug!(element = type_name::<T>(), capacity, "arena binding retired");
            }
        }

        removed.is_some()
    }

    /// Forgets every binding
    pub fn clear(&self) {
        // Drop outside the borrow: arenas may log while being freed.
        let drained: Vec<Binding> = self
            .bindings
            .borrow_mut()
            .drain()
            .map(|(_, binding)| binding)
            .collect();

        #[cfg(feature = "logging")]
        {
            if !drained.is_empty() {
                debug!(count = drained.len(), "arena bindings cleared");
            }
        }

        drop(drained);
    }

    /// Number of live bindings
    pub fn len(&self) -> usize {
        self.bindings.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.borrow().is_empty()
    }

    /// Snapshot of every binding, sorted by element name then capacity
    pub fn bindings(&self) -> Vec<BindingInfo> {
        let mut infos: Vec<BindingInfo> = self
            .bindings
            .borrow()
            .iter()
            .map(|(key, binding)| BindingInfo {
                element: binding.element,
                capacity: key.capacity,
                used_bytes: binding.arena.used(),
                capacity_bytes: binding.arena.capacity(),
            })
            .collect();
        infos.sort_by(|a, b| (a.element, a.capacity).cmp(&(b.element, b.capacity)));
        infos
    }
}

impl Default for ArenaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ArenaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaRegistry")
            .field("config", &self.config)
            .field("bindings", &self.len())
            .finish()
    }
}
