//! Cache Replacement Policies
//!
//! Victim selection for a full set. All three policies scan the set in
//! associativity order and keep the first line with the strictly smallest
//! key, so ties resolve to the line encountered first.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::line::CacheLine;
use crate::error::Error;

/// Line replacement policy for one cache level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplacementPolicy {
    /// Evict the line inserted earliest
    Fifo,
    /// Evict the line hit least recently
    Lru,
    /// Evict the line hit least often
    Lfu,
}

impl ReplacementPolicy {
    /// Index of the victim line in a full set.
    ///
    /// Callers only invoke this once every line is valid; an invalid line
    /// would have been filled instead of evicting.
    pub fn victim(&self, set: &[CacheLine]) -> usize {
        let key = |line: &CacheLine| match self {
            ReplacementPolicy::Fifo => line.inserted_at,
            ReplacementPolicy::Lru => line.last_used,
            ReplacementPolicy::Lfu => line.frequency,
        };

        let mut victim = 0;
        for (i, line) in set.iter().enumerate().skip(1) {
            if key(line) < key(&set[victim]) {
                victim = i;
            }
        }
        victim
    }
}

impl Default for ReplacementPolicy {
    fn default() -> Self {
        ReplacementPolicy::Fifo
    }
}

impl std::fmt::Display for ReplacementPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplacementPolicy::Fifo => write!(f, "fifo"),
            ReplacementPolicy::Lru => write!(f, "lru"),
            ReplacementPolicy::Lfu => write!(f, "lfu"),
        }
    }
}

impl FromStr for ReplacementPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fifo" => Ok(ReplacementPolicy::Fifo),
            "lru" => Ok(ReplacementPolicy::Lru),
            "lfu" => Ok(ReplacementPolicy::Lfu),
            other => Err(Error::UnknownPolicy(other.to_string())),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn line(inserted_at: u64, last_used: u64, frequency: u64) -> CacheLine {
        let mut l = CacheLine::default();
        l.fill(0, inserted_at);
        l.last_used = last_used;
        l.frequency = frequency;
        l
    }

    #[test]
    fn test_fifo_picks_oldest_insertion() {
        let set = [line(3, 9, 5), line(1, 8, 9), line(2, 7, 1)];
        assert_eq!(ReplacementPolicy::Fifo.victim(&set), 1);
    }

    #[test]
    fn test_lru_picks_least_recent_hit() {
        let set = [line(3, 9, 5), line(1, 8, 9), line(2, 7, 1)];
        assert_eq!(ReplacementPolicy::Lru.victim(&set), 2);
    }

    #[test]
    fn test_lfu_picks_lowest_frequency() {
        let set = [line(3, 9, 5), line(1, 8, 9), line(2, 7, 1)];
        assert_eq!(ReplacementPolicy::Lfu.victim(&set), 2);
    }

    #[test]
    fn test_ties_resolve_to_first_in_set_order() {
        let set = [line(4, 6, 2), line(4, 6, 2), line(4, 6, 2)];
        for policy in [
            ReplacementPolicy::Fifo,
            ReplacementPolicy::Lru,
            ReplacementPolicy::Lfu,
        ] {
            assert_eq!(policy.victim(&set), 0);
        }
    }

    #[test]
    fn test_policy_names() {
        for policy in [
            ReplacementPolicy::Fifo,
            ReplacementPolicy::Lru,
            ReplacementPolicy::Lfu,
        ] {
            assert_eq!(policy.to_string().parse::<ReplacementPolicy>().unwrap(), policy);
        }
        assert_matches!(
            "mru".parse::<ReplacementPolicy>(),
            Err(Error::UnknownPolicy(name)) if name == "mru"
        );
    }
}
