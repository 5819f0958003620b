//! Cache Chain Statistics
//!
//! Per-level hit/miss snapshots assembled by walking the chain, with the
//! miss count each level hands to the next stage. Renders through
//! `Display` and serializes for machine consumption.

use serde::Serialize;

use super::policy::ReplacementPolicy;

/// Snapshot of one level's counters
#[derive(Debug, Clone, Serialize)]
pub struct CacheLevelStats {
    /// 1-based level number, outermost first
    pub level: usize,
    /// Active replacement policy
    pub policy: ReplacementPolicy,
    /// Accesses satisfied at this level
    pub hits: u64,
    /// Accesses forwarded to the next stage
    pub misses: u64,
    /// `hits / (hits + misses)`, 0.0 before the first access
    pub hit_ratio: f64,
}

impl CacheLevelStats {
    pub(crate) fn new(level: usize, policy: ReplacementPolicy, hits: u64, misses: u64) -> Self {
        let total = hits + misses;
        let hit_ratio = if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        };
        Self {
            level,
            policy,
            hits,
            misses,
            hit_ratio,
        }
    }
}

/// Snapshot of the whole chain, outermost level first
#[derive(Debug, Clone, Serialize)]
pub struct ChainStats {
    pub levels: Vec<CacheLevelStats>,
}

impl std::fmt::Display for ChainStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, stats) in self.levels.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "==== Cache L{} Statistics ====", stats.level)?;
            writeln!(f, "Policy        : {}", stats.policy)?;
            writeln!(f, "Hits          : {}", stats.hits)?;
            writeln!(f, "Misses        : {}", stats.misses)?;
            writeln!(f, "Hit ratio     : {:.4}", stats.hit_ratio)?;
            // Each block ends with the misses handed to the next stage;
            // the last level hands them to backing memory.
            if i + 1 < self.levels.len() {
                write!(
                    f,
                    "Misses propagated to L{} : {}",
                    stats.level + 1,
                    stats.misses
                )?;
            } else {
                write!(f, "Misses propagated to Memory : {}", stats.misses)?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
