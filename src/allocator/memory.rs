//! Memory Allocator Facade
//!
//! Owns the linear address space `[0, total)` and grants allocations under
//! the active strategy. The extent arena and the buddy system are both
//! constructed up front; the session layer restricts switching so that
//! buddy mode is only ever entered at initialization, when the address
//! space is still untouched.

use tracing::debug;

use super::buddy::BuddySystem;
use super::extent::ExtentList;
use super::stats::{LayoutEntry, MemoryLayout, MemoryStats};
use super::strategy::Strategy;
use crate::error::{Error, Result};

/// Start and size of the most recent successful grant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrantedRange {
    /// First granted address
    pub start: u64,
    /// Granted length; for buddy this is the rounded-up block size
    pub size: u64,
}

/// Dynamic-memory allocator over a fixed linear address space
#[derive(Debug)]
pub struct Memory {
    total: u64,
    strategy: Strategy,
    extents: ExtentList,
    buddy: BuddySystem,
    next_id: u64,
    last_allocation: Option<GrantedRange>,
    used: u64,
    internal_frag: u64,
    attempts: u64,
    failures: u64,
}

impl Memory {
    /// Create an allocator with the default first-fit strategy
    pub fn new(total: u64) -> Self {
        Self::with_strategy(total, Strategy::default())
    }

    /// Create an allocator with an explicit strategy
    pub fn with_strategy(total: u64, strategy: Strategy) -> Self {
        Self {
            total,
            strategy,
            extents: ExtentList::new(total),
            buddy: BuddySystem::new(total),
            next_id: 1,
            last_allocation: None,
            used: 0,
            internal_frag: 0,
            attempts: 0,
            failures: 0,
        }
    }

    /// Size of the managed address space
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Currently active strategy
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Switch the allocation strategy.
    ///
    /// Callers parse the name first, so an unrecognized name never reaches
    /// this point and the prior configuration is retained unchanged. The
    /// session layer forbids entering or leaving buddy mode after
    /// construction.
    pub fn set_strategy(&mut self, strategy: Strategy) {
        debug!(from = %self.strategy, to = %strategy, "switching allocation strategy");
        self.strategy = strategy;
    }

    /// Allocate `size` bytes, returning a fresh allocation id.
    ///
    /// A non-positive size is rejected before any state changes, including
    /// the attempt counter. Exhaustion counts as a failed attempt and
    /// leaves the layout untouched.
    pub fn allocate(&mut self, size: u64) -> Result<u64> {
        if size == 0 {
            return Err(Error::InvalidSize { size });
        }

        self.attempts += 1;
        // Cleared on every attempt: after a failure there is no last
        // allocation to invalidate caches over.
        self.last_allocation = None;

        let granted = match self.strategy {
            Strategy::FirstFit => self.extents.find_first_fit(size),
            Strategy::BestFit => self.extents.find_best_fit(size),
            Strategy::WorstFit => self.extents.find_worst_fit(size),
            Strategy::Buddy => return self.allocate_buddy(size),
        };

        let Some(index) = granted else {
            self.failures += 1;
            debug!(size, strategy = %self.strategy, "allocation failed, no fitting extent");
            return Err(Error::OutOfMemory { requested: size });
        };

        let id = self.next_id;
        self.next_id += 1;
        let start = self.extents.claim(index, size, id);
        self.used += size;
        self.last_allocation = Some(GrantedRange { start, size });
        debug!(id, start, size, strategy = %self.strategy, "granted extent");
        Ok(id)
    }

    fn allocate_buddy(&mut self, size: u64) -> Result<u64> {
        let id = self.next_id;
        let Some((start, record)) = self.buddy.allocate(size, id) else {
            self.failures += 1;
            debug!(size, "buddy allocation failed, no free block of sufficient order");
            return Err(Error::OutOfMemory { requested: size });
        };
        self.next_id += 1;

        let granted = record.granted();
        self.used += granted;
        self.internal_frag += record.internal_waste();
        self.last_allocation = Some(GrantedRange {
            start,
            size: granted,
        });
        debug!(id, start, requested = size, granted, order = record.order, "granted buddy block");
        Ok(id)
    }

    /// Free the allocation `id`.
    ///
    /// List strategies merge the freed extent with its immediate free
    /// neighbors; buddy merges the block with its buddy upward while the
    /// buddy is free. An unknown id is a no-op failure.
    pub fn free(&mut self, id: u64) -> Result<()> {
        match self.strategy {
            Strategy::Buddy => {
                let record = self.buddy.free(id).ok_or(Error::UnknownBlock { id })?;
                self.used -= record.granted();
                self.internal_frag -= record.internal_waste();
                debug!(id, granted = record.granted(), "freed buddy block");
            }
            _ => {
                let freed = self.extents.release(id).ok_or(Error::UnknownBlock { id })?;
                self.used -= freed;
                debug!(id, freed, "freed extent");
            }
        }
        Ok(())
    }

    /// The most recent successful grant, used by the session to drive cache
    /// invalidation. Every allocate attempt clears this first, so after a
    /// failed attempt it reports `None`.
    pub fn last_allocation(&self) -> Option<GrantedRange> {
        self.last_allocation
    }

    /// Address-ordered snapshot of the current layout
    pub fn layout(&self) -> MemoryLayout {
        let entries = match self.strategy {
            Strategy::Buddy => self.buddy_layout(),
            _ => self
                .extents
                .extents()
                .iter()
                .map(|e| LayoutEntry {
                    start: e.start,
                    size: e.size,
                    id: e.id,
                })
                .collect(),
        };
        MemoryLayout { entries }
    }

    fn buddy_layout(&self) -> Vec<LayoutEntry> {
        let mut entries: Vec<LayoutEntry> = self
            .buddy
            .allocations()
            .map(|(id, start, record)| LayoutEntry {
                start,
                size: record.granted(),
                id: Some(id),
            })
            .collect();
        for order in 0..=self.buddy.max_order() {
            for &start in self.buddy.free_blocks(order) {
                entries.push(LayoutEntry {
                    start,
                    size: 1u64 << order,
                    id: None,
                });
            }
        }
        entries.sort_by_key(|e| e.start);
        entries
    }

    /// Point-in-time statistics snapshot
    pub fn stats(&self) -> MemoryStats {
        let largest_free = match self.strategy {
            Strategy::Buddy => self.buddy.largest_free(),
            _ => self.extents.largest_free(),
        };
        MemoryStats::compute(
            self.total,
            self.used,
            largest_free,
            self.internal_frag,
            self.attempts,
            self.failures,
        )
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_first_fit_reuses_freed_extent() {
        let mut mem = Memory::new(1024);
        let a = mem.allocate(100).unwrap();
        assert_eq!(a, 1);
        assert_eq!(mem.last_allocation(), Some(GrantedRange { start: 0, size: 100 }));

        let b = mem.allocate(200).unwrap();
        assert_eq!(b, 2);
        assert_eq!(mem.last_allocation(), Some(GrantedRange { start: 100, size: 200 }));

        mem.free(a).unwrap();
        let c = mem.allocate(50).unwrap();
        assert_eq!(c, 3);
        // The freed extent at 0 is reused before the tail at 300.
        assert_eq!(mem.last_allocation(), Some(GrantedRange { start: 0, size: 50 }));
    }

    #[test]
    fn test_zero_size_rejected_without_state_change() {
        let mut mem = Memory::new(1024);
        assert_matches!(mem.allocate(0), Err(Error::InvalidSize { size: 0 }));
        assert_eq!(mem.stats().attempts, 0);
        assert_eq!(mem.layout().entries.len(), 1);
    }

    #[test]
    fn test_failed_allocate_clears_last_allocation() {
        let mut mem = Memory::new(128);
        mem.allocate(100).unwrap();
        assert!(mem.last_allocation().is_some());

        assert_matches!(mem.allocate(64), Err(Error::OutOfMemory { requested: 64 }));
        assert_eq!(mem.last_allocation(), None);

        let stats = mem.stats();
        assert_eq!(stats.attempts, 2);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.failure_rate, 0.5);
    }

    #[test]
    fn test_free_unknown_id_is_noop() {
        let mut mem = Memory::new(1024);
        mem.allocate(100).unwrap();
        assert_matches!(mem.free(9), Err(Error::UnknownBlock { id: 9 }));
        assert_eq!(mem.stats().used, 100);
    }

    #[test]
    fn test_roundtrip_restores_initial_layout() {
        for strategy in [Strategy::FirstFit, Strategy::BestFit, Strategy::WorstFit] {
            let mut mem = Memory::with_strategy(1024, strategy);
            let id = mem.allocate(300).unwrap();
            mem.free(id).unwrap();

            let layout = mem.layout();
            assert_eq!(layout.entries.len(), 1);
            assert_eq!(layout.entries[0].size, 1024);
            assert_eq!(layout.entries[0].id, None);
            assert_eq!(mem.stats().used, 0);
        }
    }

    #[test]
    fn test_buddy_rounds_up_and_tracks_internal_fragmentation() {
        let mut mem = Memory::with_strategy(1024, Strategy::Buddy);
        let id = mem.allocate(100).unwrap();
        assert_eq!(mem.last_allocation(), Some(GrantedRange { start: 0, size: 128 }));

        let stats = mem.stats();
        assert_eq!(stats.used, 128);
        // 28 wasted bytes inside a 128-byte block.
        assert!((stats.internal_fragmentation - 28.0 / 128.0).abs() < 1e-12);

        mem.free(id).unwrap();
        let stats = mem.stats();
        assert_eq!(stats.used, 0);
        assert_eq!(stats.internal_fragmentation, 0.0);
        assert_eq!(stats.largest_free, 1024);
    }

    #[test]
    fn test_buddy_layout_is_a_partition() {
        let mut mem = Memory::with_strategy(1024, Strategy::Buddy);
        mem.allocate(100).unwrap();
        mem.allocate(40).unwrap();

        let layout = mem.layout();
        assert_eq!(layout.entries[0].start, 0);
        for pair in layout.entries.windows(2) {
            assert_eq!(pair[0].start + pair[0].size, pair[1].start);
        }
        let last = layout.entries.last().unwrap();
        assert_eq!(last.start + last.size, 1024);
    }

    #[test]
    fn test_best_fit_picks_tightest_hole() {
        let mut mem = Memory::with_strategy(1024, Strategy::BestFit);
        let a = mem.allocate(100).unwrap(); // [0,100)
        let _b = mem.allocate(50).unwrap(); // [100,150)
        let c = mem.allocate(200).unwrap(); // [150,350)
        let _d = mem.allocate(50).unwrap(); // [350,400)
        mem.free(a).unwrap();
        mem.free(c).unwrap();

        // Holes: 100 at 0, 200 at 150, 624 at 400. Tightest for 80 is at 0.
        mem.allocate(80).unwrap();
        assert_eq!(mem.last_allocation().unwrap().start, 0);
    }

    #[test]
    fn test_worst_fit_picks_widest_hole() {
        let mut mem = Memory::with_strategy(1024, Strategy::WorstFit);
        let a = mem.allocate(100).unwrap();
        let _b = mem.allocate(50).unwrap();
        mem.free(a).unwrap();

        // Holes: 100 at 0, 874 at 150. Worst fit lands in the tail.
        mem.allocate(80).unwrap();
        assert_eq!(mem.last_allocation().unwrap().start, 150);
    }
}
