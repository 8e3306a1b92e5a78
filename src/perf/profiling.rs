/// Instrumentation for the per-frame visibility path
/// Counters are only incremented when the `profiling` feature is enabled
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for function call tracking
pub struct FunctionCounters {
    // Query counters
    pub searches: AtomicU64,
    pub tiles_received: AtomicU64,
    pub set_section_forwarded: AtomicU64,
    pub set_section_unchanged: AtomicU64,

    // Decode counters
    pub tiles_decoded: AtomicU64,
    pub region_lookups: AtomicU64,
    pub sections_visited: AtomicU64,
}

impl FunctionCounters {
    pub const fn new() -> Self {
        Self {
            searches: AtomicU64::new(0),
            tiles_received: AtomicU64::new(0),
            set_section_forwarded: AtomicU64::new(0),
            set_section_unchanged: AtomicU64::new(0),
            tiles_decoded: AtomicU64::new(0),
            region_lookups: AtomicU64::new(0),
            sections_visited: AtomicU64::new(0),
        }
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        self.searches.store(0, Ordering::Relaxed);
        self.tiles_received.store(0, Ordering::Relaxed);
        self.set_section_forwarded.store(0, Ordering::Relaxed);
        self.set_section_unchanged.store(0, Ordering::Relaxed);
        self.tiles_decoded.store(0, Ordering::Relaxed);
        self.region_lookups.store(0, Ordering::Relaxed);
        self.sections_visited.store(0, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            searches: self.searches.load(Ordering::Relaxed),
            tiles_received: self.tiles_received.load(Ordering::Relaxed),
            set_section_forwarded: self.set_section_forwarded.load(Ordering::Relaxed),
            set_section_unchanged: self.set_section_unchanged.load(Ordering::Relaxed),
            tiles_decoded: self.tiles_decoded.load(Ordering::Relaxed),
            region_lookups: self.region_lookups.load(Ordering::Relaxed),
            sections_visited: self.sections_visited.load(Ordering::Relaxed),
        }
    }
}

impl Default for FunctionCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of counter values at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub searches: u64,
    pub tiles_received: u64,
    pub set_section_forwarded: u64,
    pub set_section_unchanged: u64,
    pub tiles_decoded: u64,
    pub region_lookups: u64,
    pub sections_visited: u64,
}

impl CounterSnapshot {
    /// Average visited sections per decoded tile
    pub fn sections_per_tile(&self) -> f64 {
        if self.tiles_decoded == 0 {
            0.0
        } else {
            self.sections_visited as f64 / self.tiles_decoded as f64
        }
    }

    /// Log formatted report
    pub fn log_report(&self) {
        log::info!("=== Visibility Counters Report ===");
        log::info!("Query Operations:");
        log::info!("  searches:                   {:12}", self.searches);
        log::info!("  tiles received:             {:12}", self.tiles_received);
        log::info!("  set_section forwarded:      {:12}", self.set_section_forwarded);
        log::info!("  set_section unchanged:      {:12}", self.set_section_unchanged);

        log::info!("Decode Operations:");
        log::info!("  tiles decoded:              {:12}", self.tiles_decoded);
        log::info!("  region lookups:             {:12}", self.region_lookups);
        log::info!("  sections visited:           {:12}", self.sections_visited);
        if self.tiles_decoded > 0 {
            log::info!("  sections per tile:          {:12.2}", self.sections_per_tile());
        }
    }
}

/// Global function counters instance
pub static FUNCTION_COUNTERS: FunctionCounters = FunctionCounters::new();

/// Macro for incrementing a counter (only when profiling feature is enabled)
#[macro_export]
macro_rules! count_call {
    ($counter:expr) => {
        #[cfg(feature = "profiling")]
        {
            $counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }
    };
}

/// Macro for adding to a counter (only when profiling feature is enabled)
#[macro_export]
macro_rules! count_add {
    ($counter:expr, $value:expr) => {
        #[cfg(feature = "profiling")]
        {
            $counter.fetch_add($value, std::sync::atomic::Ordering::Relaxed);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_increments_and_reset() {
        let counters = FunctionCounters::new();
        counters.tiles_decoded.fetch_add(4, Ordering::Relaxed);
        counters.sections_visited.fetch_add(10, Ordering::Relaxed);

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.tiles_decoded, 4);
        assert_eq!(snapshot.sections_per_tile(), 2.5);

        counters.reset();
        assert_eq!(counters.snapshot(), CounterSnapshot::default());
    }
}
