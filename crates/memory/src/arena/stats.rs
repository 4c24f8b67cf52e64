//! Arena statistics tracking
//!
//! Counters live in `Cell`s: arenas are single-threaded, so no atomics are needed.

use core::cell::Cell;

/// Snapshot of arena activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Successful allocations
    pub allocations: usize,
    /// Allocations refused for lack of space
    pub failed_allocations: usize,
    /// Total bytes ever handed out (cumulative)
    pub total_bytes_allocated: usize,
    /// Deallocations that released the tail block
    pub reclaims: usize,
    /// Bytes returned to the arena by tail deallocations
    pub reclaimed_bytes: usize,
    /// Deallocations of non-tail blocks (ignored)
    pub lost_deallocations: usize,
    /// Bytes freed before the tail and therefore never reusable
    pub lost_bytes: usize,
    /// Highest offset observed
    pub peak_bytes: usize,
}

impl ArenaStats {
    /// Ratio of successful allocations to allocation attempts (1.0 with no attempts)
    pub fn allocation_efficiency(&self) -> f64 {
        let attempts = self.allocations + self.failed_allocations;
        if attempts == 0 {
            1.0
        } else {
            self.allocations as f64 / attempts as f64
        }
    }
}

/// Interior-mutable counters behind [`ArenaStats`]
#[derive(Debug, Default)]
pub(crate) struct StatsCell {
    enabled: bool,
    allocations: Cell<usize>,
    failed_allocations: Cell<usize>,
    total_bytes_allocated: Cell<usize>,
    reclaims: Cell<usize>,
    reclaimed_bytes: Cell<usize>,
    lost_deallocations: Cell<usize>,
    lost_bytes: Cell<usize>,
    peak_bytes: Cell<usize>,
}

#[inline]
fn bump(cell: &Cell<usize>, by: usize) {
    cell.set(cell.get().saturating_add(by));
}

impl StatsCell {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    pub(crate) fn record_allocation(&self, size: usize, offset_after: usize) {
        // Peak is tracked unconditionally; `Arena::peak_usage` depends on it.
        if offset_after > self.peak_bytes.get() {
            self.peak_bytes.set(offset_after);
        }
        if self.enabled {
            bump(&self.allocations, 1);
            bump(&self.total_bytes_allocated, size);
        }
    }

    pub(crate) fn record_failure(&self) {
        if self.enabled {
            bump(&self.failed_allocations, 1);
        }
    }

    pub(crate) fn record_reclaim(&self, size: usize) {
        if self.enabled {
            bump(&self.reclaims, 1);
            bump(&self.reclaimed_bytes, size);
        }
    }

    pub(crate) fn record_lost(&self, size: usize) {
        if self.enabled {
            bump(&self.lost_deallocations, 1);
            bump(&self.lost_bytes, size);
        }
    }

    pub(crate) fn peak(&self) -> usize {
        self.peak_bytes.get()
    }

    pub(crate) fn reset(&self) {
        for cell in [
            &self.allocations,
            &self.failed_allocations,
            &self.total_bytes_allocated,
            &self.reclaims,
            &self.reclaimed_bytes,
            &self.lost_deallocations,
            &self.lost_bytes,
            &self.peak_bytes,
        ] {
            cell.set(0);
        }
    }

    pub(crate) fn snapshot(&self) -> ArenaStats {
        ArenaStats {
            allocations: self.allocations.get(),
            failed_allocations: self.failed_allocations.get(),
            total_bytes_allocated: self.total_bytes_allocated.get(),
            reclaims: self.reclaims.get(),
            reclaimed_bytes: self.reclaimed_bytes.get(),
            lost_deallocations: self.lost_deallocations.get(),
            lost_bytes: self.lost_bytes.get(),
            peak_bytes: self.peak_bytes.get(),
        }
    }
}
