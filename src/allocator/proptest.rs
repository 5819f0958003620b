//! Property-Based Tests for the Allocator
//!
//! Uses proptest to verify the structural invariants across arbitrary
//! allocate/free sequences under every strategy.
//!
//! # Test Properties
//!
//! 1. **Partition**: the extents always partition `[0, total)`: sorted,
//!    contiguous, non-overlapping, sizes summing to `total`.
//! 2. **Eager Merge**: no two address-adjacent extents are both free.
//! 3. **Buddy Alignment**: every order-`k` free block is a multiple of
//!    `2^k`, and free blocks plus reserved spans partition `[0, total)`.
//! 4. **Round-trip**: allocate-then-free of the only allocation restores
//!    the initial single-free-block state.

#![cfg(test)]

use proptest::prelude::*;

use super::memory::Memory;
// Renamed: the proptest prelude exports a `Strategy` trait of its own.
use super::strategy::Strategy as AllocStrategy;

const TOTAL: u64 = 1024;

/// One step of a simulated workload
#[derive(Debug, Clone, Copy)]
enum Op {
    /// Allocate this many bytes
    Alloc(u64),
    /// Free the n-th live allocation (modulo the live count)
    Free(usize),
}

/// Strategy for generating workloads that mix grants and releases.
fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            (1u64..300).prop_map(Op::Alloc),
            (0usize..16).prop_map(Op::Free),
        ],
        1..60,
    )
}

/// Strategy for picking one of the list strategies.
fn list_strategy() -> impl Strategy<Value = AllocStrategy> {
    prop_oneof![
        Just(AllocStrategy::FirstFit),
        Just(AllocStrategy::BestFit),
        Just(AllocStrategy::WorstFit),
    ]
}

/// Run a workload, ignoring expected failures (exhaustion, stale frees).
fn run_workload(mem: &mut Memory, ops: &[Op]) {
    let mut live: Vec<u64> = Vec::new();
    for &op in ops {
        match op {
            Op::Alloc(size) => {
                if let Ok(id) = mem.allocate(size) {
                    live.push(id);
                }
            }
            Op::Free(pick) => {
                if !live.is_empty() {
                    let id = live.remove(pick % live.len());
                    mem.free(id).unwrap();
                }
            }
        }
    }
}

// =============================================================================
// List-Strategy Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property: the extent list partitions the address space after any
    /// workload, and no two adjacent extents are both free.
    #[test]
    fn prop_extents_partition_address_space(
        strategy in list_strategy(),
        ops in ops_strategy(),
    ) {
        let mut mem = Memory::with_strategy(TOTAL, strategy);
        run_workload(&mut mem, &ops);

        let layout = mem.layout();
        prop_assert_eq!(layout.entries[0].start, 0);
        for pair in layout.entries.windows(2) {
            prop_assert_eq!(pair[0].start + pair[0].size, pair[1].start);
            prop_assert!(
                pair[0].id.is_some() || pair[1].id.is_some(),
                "adjacent free extents survived a free"
            );
        }
        let last = layout.entries.last().unwrap();
        prop_assert_eq!(last.start + last.size, TOTAL);
    }

    /// Property: used memory equals the sum of allocated extent sizes.
    #[test]
    fn prop_used_matches_allocated_extents(
        strategy in list_strategy(),
        ops in ops_strategy(),
    ) {
        let mut mem = Memory::with_strategy(TOTAL, strategy);
        run_workload(&mut mem, &ops);

        let allocated: u64 = mem
            .layout()
            .entries
            .iter()
            .filter(|e| e.id.is_some())
            .map(|e| e.size)
            .sum();
        prop_assert_eq!(mem.stats().used, allocated);
    }

    /// Property: allocating then freeing the only allocation restores the
    /// initial single-free-extent state.
    #[test]
    fn prop_roundtrip_restores_initial_state(
        strategy in list_strategy(),
        size in 1u64..=TOTAL,
    ) {
        let mut mem = Memory::with_strategy(TOTAL, strategy);
        let id = mem.allocate(size).unwrap();
        mem.free(id).unwrap();

        let layout = mem.layout();
        prop_assert_eq!(layout.entries.len(), 1);
        prop_assert_eq!(layout.entries[0].size, TOTAL);
        prop_assert!(layout.entries[0].id.is_none());
    }
}

// =============================================================================
// Buddy Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property: free blocks stay order-aligned and, together with the
    /// reserved spans, partition the address space.
    #[test]
    fn prop_buddy_blocks_partition_address_space(ops in ops_strategy()) {
        let mut mem = Memory::with_strategy(TOTAL, AllocStrategy::Buddy);
        run_workload(&mut mem, &ops);

        // The buddy layout interleaves free blocks and reserved spans in
        // address order; contiguity means nothing overlaps or is missing.
        let layout = mem.layout();
        prop_assert_eq!(layout.entries[0].start, 0);
        for pair in layout.entries.windows(2) {
            prop_assert_eq!(pair[0].start + pair[0].size, pair[1].start);
        }
        let last = layout.entries.last().unwrap();
        prop_assert_eq!(last.start + last.size, TOTAL);

        // Every region of a buddy layout is power-of-two sized and aligned
        // to its own size.
        for entry in &layout.entries {
            prop_assert!(entry.size.is_power_of_two());
            prop_assert_eq!(entry.start % entry.size, 0);
        }
    }

    /// Property: a buddy round-trip merges all the way back to the single
    /// maximal free block.
    #[test]
    fn prop_buddy_roundtrip_merges_to_full_block(size in 1u64..=TOTAL) {
        let mut mem = Memory::with_strategy(TOTAL, AllocStrategy::Buddy);
        let id = mem.allocate(size).unwrap();
        mem.free(id).unwrap();

        prop_assert_eq!(mem.stats().largest_free, TOTAL);
        prop_assert_eq!(mem.stats().used, 0);
        prop_assert_eq!(mem.stats().internal_fragmentation, 0.0);
    }
}
