//! Simulation Configuration
//!
//! Construction parameters for one simulation session, loadable from JSON.
//! Validation happens up front, before any component is built, so a
//! rejected configuration never leaves a half-initialized session behind.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::allocator::{Strategy, DEFAULT_MEMORY_SIZE};
use crate::cache::{CacheGeometry, DEFAULT_L1_GEOMETRY, DEFAULT_L2_GEOMETRY};
use crate::error::{Error, Result};

/// Parameters of one simulation session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Size of the simulated address space in bytes
    pub total_memory: u64,
    /// Initial allocation strategy
    pub strategy: Strategy,
    /// Cache levels, outermost (L1) first
    pub levels: Vec<CacheGeometry>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            total_memory: DEFAULT_MEMORY_SIZE,
            strategy: Strategy::default(),
            levels: vec![DEFAULT_L1_GEOMETRY, DEFAULT_L2_GEOMETRY],
        }
    }
}

impl SessionConfig {
    /// Configuration with the default cache hierarchy and an explicit
    /// memory size and strategy
    pub fn new(total_memory: u64, strategy: Strategy) -> Self {
        Self {
            total_memory,
            strategy,
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
    }

    /// Check every construction constraint.
    ///
    /// Memory must be positive (and a power of two for buddy); every
    /// geometry must be valid on its own; level sizes must grow strictly
    /// from the outermost inward and stay below the memory size.
    pub fn validate(&self) -> Result<()> {
        if self.total_memory == 0 {
            return Err(Error::Config("total memory must be positive".to_string()));
        }
        if self.strategy == Strategy::Buddy && !self.total_memory.is_power_of_two() {
            return Err(Error::BuddyMemorySize {
                size: self.total_memory,
            });
        }
        if self.levels.is_empty() {
            return Err(Error::Config(
                "at least one cache level is required".to_string(),
            ));
        }
        for geometry in &self.levels {
            geometry.validate()?;
        }
        for pair in self.levels.windows(2) {
            if pair[0].cache_size >= pair[1].cache_size {
                return Err(Error::Config(format!(
                    "cache levels must grow strictly inward, got {} before {}",
                    pair[0].cache_size, pair[1].cache_size
                )));
            }
        }
        let innermost = self.levels[self.levels.len() - 1].cache_size;
        if innermost >= self.total_memory {
            return Err(Error::Config(format!(
                "innermost cache of {} must be smaller than memory of {}",
                innermost, self.total_memory
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
