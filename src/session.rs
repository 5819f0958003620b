//! Simulation Session
//!
//! One owned allocator + cache-chain pair. The session is the only owner
//! of all simulation state; reinitialization replaces the whole value.
//! `malloc` is the composition point: a successful grant pushes the
//! granted range through the chain so no level keeps serving lines for a
//! reused address.

use tracing::debug;

use crate::allocator::{Memory, MemoryLayout, MemoryStats, Strategy};
use crate::cache::{AccessOutcome, CacheChain, ChainStats, ReplacementPolicy};
use crate::config::SessionConfig;
use crate::error::{Error, Result};

/// One simulation session: an allocator backing a cache chain
#[derive(Debug)]
pub struct Session {
    memory: Memory,
    chain: CacheChain,
}

impl Session {
    /// Build a session from a validated configuration
    pub fn new(config: &SessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            memory: Memory::with_strategy(config.total_memory, config.strategy),
            chain: CacheChain::new(&config.levels)?,
        })
    }

    /// The allocator half of the session
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// The cache half of the session
    pub fn chain(&self) -> &CacheChain {
        &self.chain
    }

    /// Allocate `size` bytes and invalidate the granted range at every
    /// cache level
    pub fn malloc(&mut self, size: u64) -> Result<u64> {
        let id = self.memory.allocate(size)?;
        if let Some(range) = self.memory.last_allocation() {
            debug!(start = range.start, size = range.size, "invalidating granted range");
            self.chain.invalidate_range(range.start, range.size);
        }
        Ok(id)
    }

    /// Free the allocation `id`
    pub fn free(&mut self, id: u64) -> Result<()> {
        self.memory.free(id)
    }

    /// Look up `address` through the cache chain
    pub fn access(&mut self, address: u64) -> AccessOutcome {
        self.chain.access(address)
    }

    /// Switch the allocation strategy at runtime.
    ///
    /// Buddy mode assumes an untouched address space and is only
    /// selectable at construction.
    pub fn set_strategy(&mut self, strategy: Strategy) -> Result<()> {
        if strategy == Strategy::Buddy {
            return Err(Error::Config(
                "the buddy allocator can only be selected at initialization".to_string(),
            ));
        }
        self.memory.set_strategy(strategy);
        Ok(())
    }

    /// Set the replacement policy of the cache level at `index`
    /// (0 = outermost)
    pub fn set_policy(&mut self, index: usize, policy: ReplacementPolicy) -> Result<()> {
        self.chain.set_policy(index, policy)
    }

    /// Allocator layout snapshot
    pub fn layout(&self) -> MemoryLayout {
        self.memory.layout()
    }

    /// Allocator statistics snapshot
    pub fn memory_stats(&self) -> MemoryStats {
        self.memory.stats()
    }

    /// Cache-chain statistics snapshot
    pub fn cache_stats(&self) -> ChainStats {
        self.chain.stats()
    }
}

// =============================================================================
// Tests
// =============================================================================
