//! Cache Geometry
//!
//! Construction parameters of one set-associative level and the address
//! arithmetic they induce.
//!
//! Address decomposition, in block units:
//!
//! ```text
//! block_number = address / block_size
//! set_index    = block_number % num_sets
//! tag          = block_number / num_sets
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Shape of one cache level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheGeometry {
    /// Total capacity in bytes
    pub cache_size: u64,
    /// Line size in bytes
    pub block_size: u64,
    /// Lines per set
    pub associativity: u64,
}

impl CacheGeometry {
    /// Create a geometry; combine with [`CacheGeometry::validate`] before
    /// building a level from it.
    pub fn new(cache_size: u64, block_size: u64, associativity: u64) -> Self {
        Self {
            cache_size,
            block_size,
            associativity,
        }
    }

    /// Check the construction constraints: all three parameters are
    /// positive powers of two, the block size divides the cache size, and
    /// the associativity divides the block count.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("cache_size", self.cache_size),
            ("block_size", self.block_size),
            ("associativity", self.associativity),
        ] {
            if value == 0 || !value.is_power_of_two() {
                return Err(Error::InvalidGeometry(format!(
                    "{name} must be a positive power of two, got {value}"
                )));
            }
        }
        if self.cache_size % self.block_size != 0 {
            return Err(Error::InvalidGeometry(format!(
                "block size {} does not divide cache size {}",
                self.block_size, self.cache_size
            )));
        }
        if self.num_blocks() % self.associativity != 0 {
            return Err(Error::InvalidGeometry(format!(
                "associativity {} does not divide block count {}",
                self.associativity,
                self.num_blocks()
            )));
        }
        Ok(())
    }

    /// Total number of lines
    pub fn num_blocks(&self) -> u64 {
        self.cache_size / self.block_size
    }

    /// Number of sets
    pub fn num_sets(&self) -> u64 {
        self.num_blocks() / self.associativity
    }

    /// Split a byte address into `(set_index, tag)`
    pub fn decompose(&self, address: u64) -> (usize, u64) {
        let block_number = address / self.block_size;
        let index = block_number % self.num_sets();
        let tag = block_number / self.num_sets();
        (index as usize, tag)
    }

    /// Reconstruct the byte range `[start, end)` a line caches from its
    /// tag and set index
    pub fn block_range(&self, tag: u64, set_index: usize) -> (u64, u64) {
        let start = (tag * self.num_sets() + set_index as u64) * self.block_size;
        (start, start + self.block_size)
    }
}

// =============================================================================
// Tests
// =============================================================================
