//! Standalone error types for bumpkit-memory
//!
//! Uses thiserror for clean, idiomatic Rust error definitions.

use thiserror::Error;

#[cfg(feature = "logging")]
use tracing::{error, warn};

// ============================================================================
// Main Error Types
// ============================================================================

/// Memory management errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    // --- Arena Errors ---
    /// The arena cannot satisfy a byte request from its remaining space.
    #[error("Arena out of memory: requested {requested} bytes, {available} available")]
    OutOfMemory { requested: usize, available: usize },

    // --- Typed Allocation Errors ---
    /// A typed allocator could not obtain storage for `count` elements.
    #[error(
        "Allocation of {count} x {element} ({bytes} bytes) failed: {available} bytes available"
    )]
    AllocationFailed {
        element: &'static str,
        count: usize,
        bytes: usize,
        available: usize,
    },

    #[error("Size overflow during operation: {operation}")]
    SizeOverflow { operation: String },

    #[error("Invalid alignment: {alignment}")]
    InvalidAlignment { alignment: usize },

    // --- Configuration Errors ---
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // --- System Errors ---
    /// The global allocator refused to provide an arena buffer.
    #[error("System allocator failed to provide {size} bytes with {align} byte alignment")]
    SystemAllocation { size: usize, align: usize },
}

impl MemoryError {
    /// Check if error is retryable
    ///
    /// Exhaustion is retryable once the caller releases the tail of the arena;
    /// everything else is a programming or configuration error.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::OutOfMemory { .. } | Self::AllocationFailed { .. }
        )
    }

    /// Check if error signals exhausted storage
    #[must_use]
    pub fn is_exhaustion(&self) -> bool {
        matches!(
            self,
            Self::OutOfMemory { .. } | Self::AllocationFailed { .. } | Self::SystemAllocation { .. }
        )
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::OutOfMemory { .. } => "MEM:ARENA:OOM",
            Self::AllocationFailed { .. } => "MEM:ALLOC:FAILED",
            Self::SizeOverflow { .. } => "MEM:ALLOC:OVERFLOW",
            Self::InvalidAlignment { .. } => "MEM:ALLOC:ALIGN",
            Self::InvalidConfig { .. } => "MEM:CONFIG:INVALID",
            Self::SystemAllocation { .. } => "MEM:SYSTEM:ALLOC",
        }
    }

    // ============================================================================
    // Convenience Constructors
    // ============================================================================

    /// Create arena out of memory error
    pub fn out_of_memory(requested: usize, available: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(requested, available, "arena out of memory");

        Self::OutOfMemory {
            requested,
            available,
        }
    }

    /// Create typed allocation failure for element type `T`
    pub fn allocation_failed<T>(count: usize, bytes: usize, available: usize) -> Self {
        let element = core::any::type_name::<T>();

        #[cfg(feature = "logging")]
        error!(element, count, bytes, available, "typed allocation failed");

        Self::AllocationFailed {
            element,
            count,
            bytes,
            available,
        }
    }

    /// Create size overflow error
    pub fn size_overflow(operation: &str) -> Self {
        Self::SizeOverflow {
            operation: operation.to_string(),
        }
    }

    /// Create invalid alignment error
    pub fn invalid_alignment(alignment: usize) -> Self {
        Self::InvalidAlignment { alignment }
    }

    /// Create invalid config error
    pub fn invalid_config(reason: &str) -> Self {
        Self::InvalidConfig {
            reason: reason.to_string(),
        }
    }

    /// Create system allocation error
    pub fn system_allocation(size: usize, align: usize) -> Self {
        #[cfg(feature = "logging")]
        error!(size, align, "system allocator refused arena buffer");

        Self::SystemAllocation { size, align }
    }

    /// Check if this is an invalid alignment error
    #[must_use]
    pub fn is_invalid_alignment(&self) -> bool {
        matches!(self, Self::InvalidAlignment { .. })
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Result type for memory operations
pub type MemoryResult<T> = core::result::Result<T, MemoryError>;

/// Generic result type alias
pub type Result<T> = MemoryResult<T>;

// ============================================================================
// Tests
// ============================================================================
