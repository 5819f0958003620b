//! Allocation Strategies
//!
//! Names and dispatch targets for the four supported allocators.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Allocation strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// First free extent large enough, in address order
    FirstFit,
    /// Smallest free extent large enough; ties to the lowest address
    BestFit,
    /// Largest free extent large enough; ties to the lowest address
    WorstFit,
    /// Binary buddy system over power-of-two blocks
    Buddy,
}

impl Strategy {
    /// True for the strategies backed by the extent list
    pub fn is_list_strategy(&self) -> bool {
        !matches!(self, Strategy::Buddy)
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::FirstFit
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::FirstFit => write!(f, "first_fit"),
            Strategy::BestFit => write!(f, "best_fit"),
            Strategy::WorstFit => write!(f, "worst_fit"),
            Strategy::Buddy => write!(f, "buddy"),
        }
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first_fit" => Ok(Strategy::FirstFit),
            "best_fit" => Ok(Strategy::BestFit),
            "worst_fit" => Ok(Strategy::WorstFit),
            "buddy" => Ok(Strategy::Buddy),
            other => Err(Error::UnknownStrategy(other.to_string())),
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

    #[test]
    fn test_strategy_roundtrip_names() {
        for s in [
            Strategy::FirstFit,
            Strategy::BestFit,
            Strategy::WorstFit,
            Strategy::Buddy,
        ] {
            assert_eq!(s.to_string().parse::<Strategy>().unwrap(), s);
        }
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let err = "next_fit".parse::<Strategy>().unwrap_err();
        assert_matches!(err, Error::UnknownStrategy(name) if name == "next_fit");
    }

    #[test]
    fn test_default_is_first_fit() {
        assert_eq!(Strategy::default(), Strategy::FirstFit);
    }

    #[test]
    fn test_list_strategy_classification() {
        assert!(Strategy::FirstFit.is_list_strategy());
        assert!(Strategy::BestFit.is_list_strategy());
        assert!(Strategy::WorstFit.is_list_strategy());
        assert!(!Strategy::Buddy.is_list_strategy());
    }
}
