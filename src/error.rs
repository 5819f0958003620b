//! Error types for the memory-hierarchy simulator

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the simulator
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Allocator Errors
    // =========================================================================
    /// No free extent or buddy block large enough for the request
    #[error("Out of memory: no free block of {requested} bytes available")]
    OutOfMemory { requested: u64 },

    /// Allocation size must be positive
    #[error("Invalid allocation size: {size}")]
    InvalidSize { size: u64 },

    /// Freeing an id that is not currently allocated
    #[error("Unknown block id: {id}")]
    UnknownBlock { id: u64 },

    /// Unrecognized allocation strategy name
    #[error("Unknown allocation strategy: {0}")]
    UnknownStrategy(String),

    /// Buddy allocation requires a power-of-two address space
    #[error("Buddy allocator requires a power-of-two memory size, got {size}")]
    BuddyMemorySize { size: u64 },

    // =========================================================================
    // Cache Errors
    // =========================================================================
    /// Unrecognized replacement policy name
    #[error("Unknown replacement policy: {0}")]
    UnknownPolicy(String),

    /// Cache geometry violates a construction constraint
    #[error("Invalid cache geometry: {0}")]
    InvalidGeometry(String),

    /// Level index outside the configured chain
    #[error("Unknown cache level: {index}")]
    InvalidLevel { index: usize },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Tests
// =============================================================================
