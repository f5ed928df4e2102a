/// Performance measurement utilities
/// Each rendering stage is timed and logged for optimization analysis
pub mod profiling;

pub use profiling::{CounterSnapshot, FunctionCounters, FUNCTION_COUNTERS};

use log::trace;
use std::sync::atomic::{AtomicU64, Ordering};
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
        trace!("[PERF] {}: {}μs", self.name, elapsed.as_micros());
    }
}

/// Macro for easy performance measurement
#[macro_export]
macro_rules! perf_scope {
    ($name:expr) => {
        let _timer = $crate::perf::PerfTimer::new($name);
    };
}

/// Always-on per-frame counters. Workers add to them concurrently.
#[derive(Default)]
pub struct FrameCounters {
    pub draw_calls: AtomicU64,
    pub presented_triangles: AtomicU64,
    pub coverage_tests: AtomicU64,
    pub depth_tests: AtomicU64,
    pub color_writes: AtomicU64,
}

impl FrameCounters {
    pub fn reset(&self) {
        self.draw_calls.store(0, Ordering::Relaxed);
        self.presented_triangles.store(0, Ordering::Relaxed);
        self.coverage_tests.store(0, Ordering::Relaxed);
        self.depth_tests.store(0, Ordering::Relaxed);
        self.color_writes.store(0, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_pixels(&self, coverage_tests: u64, depth_tests: u64, color_writes: u64) {
        self.coverage_tests.fetch_add(coverage_tests, Ordering::Relaxed);
        self.depth_tests.fetch_add(depth_tests, Ordering::Relaxed);
        self.color_writes.fetch_add(color_writes, Ordering::Relaxed);
    }
}

/// Read-only summary of the last completed frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfilerData {
    pub width: usize,
    pub height: usize,
    pub thread_count: usize,
    pub draw_call_count: u64,
    pub presented_triangle_count: u64,
    pub texture_count: usize,
    pub texture_byte_count: usize,
    pub total_light_count: usize,
    pub total_coverage_tests: u64,
    pub total_depth_tests: u64,
    pub total_color_writes: u64,
}

impl ProfilerData {
    /// Copy the frame counters into a summary; registry totals are filled by the caller.
    pub fn from_counters(counters: &FrameCounters) -> Self {
        Self {
            draw_call_count: counters.draw_calls.load(Ordering::Relaxed),
            presented_triangle_count: counters.presented_triangles.load(Ordering::Relaxed),
            total_coverage_tests: counters.coverage_tests.load(Ordering::Relaxed),
            total_depth_tests: counters.depth_tests.load(Ordering::Relaxed),
            total_color_writes: counters.color_writes.load(Ordering::Relaxed),
            ..Self::default()
        }
    }
}
