//! Dynamic-Memory Allocator
//!
//! Manages a fixed-size linear address space under a pluggable allocation
//! strategy.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Memory                               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ExtentList                      │  BuddySystem             │
//! │  ┌──────────────────────────┐    │  ┌────────────────────┐  │
//! │  │ [0,100) used  id=1       │    │  │ order 10: []       │  │
//! │  │ [100,300) FREE           │    │  │ order 9:  [512]    │  │
//! │  │ [300,1024) used id=2     │    │  │ order 8:  [256]    │  │
//! │  └──────────────────────────┘    │  │ ...                │  │
//! │  first-fit / best-fit /          │  │ allocations by     │  │
//! │  worst-fit scans, split on       │  │ start, XOR-buddy   │  │
//! │  grant, eager merge on free      │  │ merge on free      │  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The extent list always partitions `[0, total)`: extents are contiguous,
//! non-overlapping, address-ordered, and no two adjacent extents are both
//! free. The buddy free lists keep every order-`k` block aligned to `2^k`.

mod buddy;
mod extent;
mod memory;
mod stats;
mod strategy;

mod proptest;

pub use buddy::{BuddyAllocation, BuddySystem};
pub use extent::{Extent, ExtentList};
pub use memory::{GrantedRange, Memory};
pub use stats::{LayoutEntry, MemoryLayout, MemoryStats};
pub use strategy::Strategy;

/// Default address-space size for an interactively created session
pub const DEFAULT_MEMORY_SIZE: u64 = 1024;
