//! Cache Chain
//!
//! Owns the outermost cache level of a linked hierarchy and addresses the
//! levels behind it by index. The chain is built innermost-first so every
//! level's backing link exists before the level wrapping it; the last
//! level terminates at the memory probe.

use super::geometry::CacheGeometry;
use super::level::{AccessOutcome, BackingStore, CacheLevel};
use super::metrics::{CacheLevelStats, ChainStats};
use super::policy::ReplacementPolicy;
use crate::error::{Error, Result};

/// An ordered chain of cache levels, outermost first
#[derive(Debug)]
pub struct CacheChain {
    outer: CacheLevel,
}

impl CacheChain {
    /// Build a chain from geometries ordered outermost (L1) first.
    ///
    /// Each geometry is validated; the level list must not be empty.
    pub fn new(geometries: &[CacheGeometry]) -> Result<Self> {
        for geometry in geometries {
            geometry.validate()?;
        }
        let (last, outer_geometries) = geometries
            .split_last()
            .ok_or_else(|| Error::Config("a cache chain needs at least one level".to_string()))?;

        let mut level = CacheLevel::new(*last, BackingStore::Memory);
        for geometry in outer_geometries.iter().rev() {
            level = CacheLevel::new(*geometry, BackingStore::NextLevel(Box::new(level)));
        }
        Ok(Self { outer: level })
    }

    /// Number of levels in the chain
    pub fn len(&self) -> usize {
        let mut count = 1;
        let mut level = &self.outer;
        while let Some(next) = level.next_level() {
            count += 1;
            level = next;
        }
        count
    }

    /// Whether the chain has no levels; construction forbids this, so it
    /// always reports false
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The level at `index` (0 = outermost)
    pub fn level(&self, index: usize) -> Option<&CacheLevel> {
        let mut level = &self.outer;
        for _ in 0..index {
            level = level.next_level()?;
        }
        Some(level)
    }

    fn level_mut(&mut self, index: usize) -> Option<&mut CacheLevel> {
        let mut level = &mut self.outer;
        for _ in 0..index {
            level = level.next_level_mut()?;
        }
        Some(level)
    }

    /// Set the replacement policy of the level at `index`
    pub fn set_policy(&mut self, index: usize, policy: ReplacementPolicy) -> Result<()> {
        let level = self
            .level_mut(index)
            .ok_or(Error::InvalidLevel { index })?;
        level.set_policy(policy);
        Ok(())
    }

    /// Look up `address` starting at the outermost level
    pub fn access(&mut self, address: u64) -> AccessOutcome {
        self.outer.access(address)
    }

    /// Drop every cached line overlapping `[start, start + size)` at every
    /// level
    pub fn invalidate_range(&mut self, start: u64, size: u64) {
        self.outer.invalidate_range(start, size);
    }

    /// Snapshot of every level's counters, outermost first
    pub fn stats(&self) -> ChainStats {
        let mut levels = Vec::new();
        let mut level = Some(&self.outer);
        while let Some(current) = level {
            levels.push(CacheLevelStats::new(
                levels.len() + 1,
                current.policy(),
                current.hits(),
                current.misses(),
            ));
            level = current.next_level();
        }
        ChainStats { levels }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn two_level_chain() -> CacheChain {
        CacheChain::new(&[
            CacheGeometry::new(64, 16, 2),
            CacheGeometry::new(256, 16, 4),
        ])
        .unwrap()
    }

    #[test]
    fn test_chain_construction() {
        let chain = two_level_chain();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.level(0).unwrap().geometry().cache_size, 64);
        assert_eq!(chain.level(1).unwrap().geometry().cache_size, 256);
        assert!(chain.level(2).is_none());
    }

    #[test]
    fn test_empty_chain_rejected() {
        assert_matches!(CacheChain::new(&[]), Err(Error::Config(_)));
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        let result = CacheChain::new(&[CacheGeometry::new(60, 16, 2)]);
        assert_matches!(result, Err(Error::InvalidGeometry(_)));
    }

    #[test]
    fn test_set_policy_addresses_levels() {
        let mut chain = two_level_chain();
        chain.set_policy(1, ReplacementPolicy::Lru).unwrap();
        assert_eq!(chain.level(0).unwrap().policy(), ReplacementPolicy::Fifo);
        assert_eq!(chain.level(1).unwrap().policy(), ReplacementPolicy::Lru);

        assert_matches!(
            chain.set_policy(2, ReplacementPolicy::Lfu),
            Err(Error::InvalidLevel { index: 2 })
        );
    }

    #[test]
    fn test_stats_walk_the_chain() {
        let mut chain = two_level_chain();
        chain.access(0); // miss at both levels
        chain.access(0); // hit at L1 only

        let stats = chain.stats();
        assert_eq!(stats.levels.len(), 2);
        assert_eq!(stats.levels[0].hits, 1);
        assert_eq!(stats.levels[0].misses, 1);
        assert_eq!(stats.levels[1].hits, 0);
        assert_eq!(stats.levels[1].misses, 1);
        assert_eq!(stats.levels[0].hit_ratio, 0.5);
    }

    #[test]
    fn test_invalidation_reaches_every_level() {
        let mut chain = two_level_chain();
        chain.access(0);
        chain.invalidate_range(0, 16);

        // Both copies were dropped: the re-access misses at both levels.
        chain.access(0);
        let stats = chain.stats();
        assert_eq!(stats.levels[0].misses, 2);
        assert_eq!(stats.levels[1].misses, 2);
    }
}
