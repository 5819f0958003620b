//! Allocator Statistics and Layout Reporting
//!
//! Read-only snapshots of the allocator's health: occupancy, fragmentation
//! and allocation counters, plus the extent-by-extent layout dump. Both
//! render through `Display` and serialize for machine consumption.

use serde::Serialize;

/// Point-in-time allocator statistics
#[derive(Debug, Clone, Serialize)]
pub struct MemoryStats {
    /// Size of the managed address space
    pub total: u64,
    /// Bytes currently reserved (buddy: rounded-up block sizes)
    pub used: u64,
    /// Bytes currently free
    pub free: u64,
    /// `used / total`
    pub utilization: f64,
    /// Largest free extent (list strategies) or free block (buddy)
    pub largest_free: u64,
    /// Wasted-space ratio inside granted blocks; non-zero only for buddy
    pub internal_fragmentation: f64,
    /// `1 - largest_free / (total - used)`, 0.0 when memory is full
    pub external_fragmentation: f64,
    /// Allocation attempts, including failed ones
    pub attempts: u64,
    /// Attempts that returned a block
    pub successes: u64,
    /// Attempts that found no block
    pub failures: u64,
    /// `successes / attempts`, 0.0 before the first attempt
    pub success_rate: f64,
    /// `failures / attempts`, 0.0 before the first attempt
    pub failure_rate: f64,
}

impl MemoryStats {
    /// Assemble a snapshot from raw counters, guarding every ratio against
    /// an empty denominator.
    pub(crate) fn compute(
        total: u64,
        used: u64,
        largest_free: u64,
        internal_frag: u64,
        attempts: u64,
        failures: u64,
    ) -> Self {
        let utilization = if total == 0 {
            0.0
        } else {
            used as f64 / total as f64
        };
        let internal_fragmentation = if used == 0 {
            0.0
        } else {
            internal_frag as f64 / used as f64
        };
        let external_fragmentation = if total == used {
            0.0
        } else {
            1.0 - largest_free as f64 / (total - used) as f64
        };
        let failure_rate = if attempts == 0 {
            0.0
        } else {
            failures as f64 / attempts as f64
        };
        let success_rate = if attempts == 0 { 0.0 } else { 1.0 - failure_rate };

        Self {
            total,
            used,
            free: total - used,
            utilization,
            largest_free,
            internal_fragmentation,
            external_fragmentation,
            attempts,
            successes: attempts - failures,
            failures,
            success_rate,
            failure_rate,
        }
    }
}

impl std::fmt::Display for MemoryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "==== Memory Statistics ====")?;
        writeln!(f, "Total memory           : {}", self.total)?;
        writeln!(f, "Used memory            : {}", self.used)?;
        writeln!(f, "Free memory            : {}", self.free)?;
        writeln!(f, "Memory utilization     : {:.4}", self.utilization)?;
        writeln!(f, "Largest free block     : {}", self.largest_free)?;
        writeln!(
            f,
            "Internal fragmentation : {:.4}",
            self.internal_fragmentation
        )?;
        writeln!(
            f,
            "External fragmentation : {:.4}",
            self.external_fragmentation
        )?;
        writeln!(f, "Total allocations      : {}", self.attempts)?;
        writeln!(f, "Successful allocations : {}", self.successes)?;
        writeln!(f, "Failed allocations     : {}", self.failures)?;
        writeln!(f, "Success rate           : {:.4}", self.success_rate)?;
        write!(f, "Failure rate           : {:.4}", self.failure_rate)
    }
}

/// One row of the layout dump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayoutEntry {
    /// First byte address of the region
    pub start: u64,
    /// Region length in bytes
    pub size: u64,
    /// Owning allocation id; `None` for a free region
    pub id: Option<u64>,
}

/// Address-ordered layout of the whole address space
#[derive(Debug, Clone, Serialize)]
pub struct MemoryLayout {
    pub entries: Vec<LayoutEntry>,
}

impl std::fmt::Display for MemoryLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let end = entry.start + entry.size - 1;
            match entry.id {
                Some(id) => write!(
                    f,
                    "[0x{:x} - 0x{:x}] Used (id={})",
                    entry.start, end, id
                )?,
                None => write!(f, "[0x{:x} - 0x{:x}] FREE", entry.start, end)?,
            }
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratios_guard_zero_denominators() {
        let stats = MemoryStats::compute(1024, 0, 1024, 0, 0, 0);
        assert_eq!(stats.utilization, 0.0);
        assert_eq!(stats.internal_fragmentation, 0.0);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.failure_rate, 0.0);
        assert_eq!(stats.external_fragmentation, 0.0);
    }

    #[test]
    fn test_external_fragmentation_formula() {
        // 1024 total, 256 used, largest free 512 of 768 free bytes.
        let stats = MemoryStats::compute(1024, 256, 512, 0, 2, 0);
        assert!((stats.external_fragmentation - (1.0 - 512.0 / 768.0)).abs() < 1e-12);

        // Fully used memory reports zero by definition.
        let stats = MemoryStats::compute(1024, 1024, 0, 0, 1, 0);
        assert_eq!(stats.external_fragmentation, 0.0);
    }

    #[test]
    fn test_rates_sum_to_one_once_attempted() {
        let stats = MemoryStats::compute(1024, 100, 924, 0, 4, 1);
        assert_eq!(stats.successes, 3);
        assert!((stats.success_rate + stats.failure_rate - 1.0).abs() < 1e-12);
        assert_eq!(stats.failure_rate, 0.25);
    }

    #[test]
    fn test_layout_rendering() {
        let layout = MemoryLayout {
            entries: vec![
                LayoutEntry { start: 0, size: 0x64, id: Some(1) },
                LayoutEntry { start: 0x64, size: 0x9c, id: None },
            ],
        };
        let text = layout.to_string();
        assert!(text.contains("[0x0 - 0x63] Used (id=1)"));
        assert!(text.contains("[0x64 - 0xff] FREE"));
    }
}
