/// Performance measurement utilities
/// Each stage of a visibility query is timed and logged for analysis
pub mod profiling;

pub use profiling::{CounterSnapshot, FunctionCounters, FUNCTION_COUNTERS};

use std::time::{Duration, Instant};

pub struct PerfTimer {
    name: &'static str,
    start: Instant,
}

impl PerfTimer {
    #[inline]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for PerfTimer {
    fn drop(&mut self) {
        let elapsed = self.elapsed();
        log::debug!("[PERF] {}: {}μs", self.name, elapsed.as_micros());
    }
}

/// Timings for one visibility query, in microseconds
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryTimings {
    pub search_us: f64,
    pub decode_us: f64,
}

impl QueryTimings {
    #[inline]
    pub fn total_us(&self) -> f64 {
        self.search_us + self.decode_us
    }

    /// Fraction of the query spent in the engine search
    pub fn search_share(&self) -> f64 {
        let total = self.total_us();
        if total > 0.0 {
            self.search_us / total
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        log::debug!(
            "Search: {:8.2}μs ({:5.1}%)  Decode: {:8.2}μs  Total: {:8.2}μs",
            self.search_us,
            self.search_share() * 100.0,
            self.decode_us,
            self.total_us()
        );
    }
}

/// Macro for easy performance measurement
#[macro_export]
macro_rules! perf_scope {
    ($name:expr) => {
        let _timer = $crate::perf::PerfTimer::new($name);
    };
}
