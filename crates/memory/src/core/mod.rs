//! Core functionality for bumpkit-memory
//!
//! This module contains the building blocks shared by every allocator:
//! - Configuration structures
//! - Base traits for usage tracking and reset

pub mod config;
pub mod traits;

// Re-export commonly used items
pub use crate::error::{MemoryError, MemoryResult};
pub use config::{ArenaConfig, DEFAULT_ALIGN};
pub use traits::{BasicMemoryUsage, MemoryUsage, Resettable};
