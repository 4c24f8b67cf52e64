//! Configuration types for arenas

use crate::error::{MemoryError, MemoryResult};

/// Default base alignment of an arena buffer
pub const DEFAULT_ALIGN: usize = 16;

/// Configuration for [`Arena`](crate::arena::Arena)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Base alignment of the backing buffer (power of two)
    pub align: usize,

    /// Fill patterns for debugging
    pub alloc_pattern: Option<u8>,
    pub dealloc_pattern: Option<u8>,

    /// Enable statistics tracking
    pub track_stats: bool,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            align: DEFAULT_ALIGN,
            alloc_pattern: if cfg!(debug_assertions) { Some(0xAA) } else { None },
            dealloc_pattern: if cfg!(debug_assertions) { Some(0xDD) } else { None },
            track_stats: true,
        }
    }
}

impl ArenaConfig {
    /// Production configuration - no fills, no counters
    pub fn production() -> Self {
        Self {
            align: DEFAULT_ALIGN,
            alloc_pattern: None,
            dealloc_pattern: None,
            track_stats: false,
        }
    }

    /// Debug configuration - poisons fresh and reclaimed blocks
    pub fn debug() -> Self {
        Self {
            align: DEFAULT_ALIGN,
            alloc_pattern: Some(0xAA),
            dealloc_pattern: Some(0xDD),
            track_stats: true,
        }
    }

    /// Overrides the base alignment
    #[must_use = "builder methods must be chained or built"]
    pub fn with_align(mut self, align: usize) -> Self {
        self.align = align;
        self
    }

    /// Checks that the configuration can back an arena
    pub fn validate(&self) -> MemoryResult<()> {
        if !self.align.is_power_of_two() {
            return Err(MemoryError::invalid_alignment(self.align));
        }
        Ok(())
    }
}
