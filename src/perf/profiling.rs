/// Instrumentation and profiling infrastructure for microoptimization
/// Provides function call counting and hardware performance counter integration
use log::info;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe performance counters for pipeline stage tracking
pub struct FunctionCounters {
    // Geometry counters
    pub vertex_batches: AtomicU64,
    pub triangles_shaded: AtomicU64,
    pub triangles_clipped: AtomicU64,
    pub triangles_culled: AtomicU64,
    pub triangles_binned: AtomicU64,

    // Rasterization counters
    pub bins_rasterized: AtomicU64,
    pub triangles_rasterized: AtomicU64,

    // Frame buffer counters
    pub frame_buffer_clears: AtomicU64,
    pub palette_snapshots: AtomicU64,
}

impl FunctionCounters {
    pub const fn new() -> Self {
        Self {
            vertex_batches: AtomicU64::new(0),
            triangles_shaded: AtomicU64::new(0),
            triangles_clipped: AtomicU64::new(0),
            triangles_culled: AtomicU64::new(0),
            triangles_binned: AtomicU64::new(0),
            bins_rasterized: AtomicU64::new(0),
            triangles_rasterized: AtomicU64::new(0),
            frame_buffer_clears: AtomicU64::new(0),
            palette_snapshots: AtomicU64::new(0),
        }
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        for counter in self.all() {
            counter.store(0, Ordering::Relaxed);
        }
    }

    fn all(&self) -> [&AtomicU64; 9] {
        [
            &self.vertex_batches,
            &self.triangles_shaded,
            &self.triangles_clipped,
            &self.triangles_culled,
            &self.triangles_binned,
            &self.bins_rasterized,
            &self.triangles_rasterized,
            &self.frame_buffer_clears,
            &self.palette_snapshots,
        ]
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            vertex_batches: self.vertex_batches.load(Ordering::Relaxed),
            triangles_shaded: self.triangles_shaded.load(Ordering::Relaxed),
            triangles_clipped: self.triangles_clipped.load(Ordering::Relaxed),
            triangles_culled: self.triangles_culled.load(Ordering::Relaxed),
            triangles_binned: self.triangles_binned.load(Ordering::Relaxed),
            bins_rasterized: self.bins_rasterized.load(Ordering::Relaxed),
            triangles_rasterized: self.triangles_rasterized.load(Ordering::Relaxed),
            frame_buffer_clears: self.frame_buffer_clears.load(Ordering::Relaxed),
            palette_snapshots: self.palette_snapshots.load(Ordering::Relaxed),
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
    pub vertex_batches: u64,
    pub triangles_shaded: u64,
    pub triangles_clipped: u64,
    pub triangles_culled: u64,
    pub triangles_binned: u64,
    pub bins_rasterized: u64,
    pub triangles_rasterized: u64,
    pub frame_buffer_clears: u64,
    pub palette_snapshots: u64,
}

impl CounterSnapshot {
    /// Log formatted report
    pub fn log_report(&self) {
        info!("=== Performance Counters Report ===");
        info!("Geometry:");
        info!("  vertex batches:             {:12}", self.vertex_batches);
        info!("  triangles shaded:           {:12}", self.triangles_shaded);
        info!("  triangles clipped:          {:12}", self.triangles_clipped);
        info!("  triangles culled:           {:12}", self.triangles_culled);
        info!("  triangles binned:           {:12}", self.triangles_binned);
        if self.triangles_shaded > 0 {
            let cull_rate = (self.triangles_culled as f64 / self.triangles_shaded as f64) * 100.0;
            info!("  cull rate:                  {:11.2}%", cull_rate);
        }

        info!("Rasterization:");
        info!("  bins rasterized:            {:12}", self.bins_rasterized);
        info!("  bin entries rasterized:     {:12}", self.triangles_rasterized);

        info!("Frame buffers:");
        info!("  clears:                     {:12}", self.frame_buffer_clears);
        info!("  palette snapshots:          {:12}", self.palette_snapshots);
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

/// Hardware performance counter wrapper for benchmarking
#[cfg(feature = "profiling")]
pub mod hardware {
    use log::info;
    use perf_event::events::Hardware;
    use perf_event::{Builder, Counter};

    pub struct PerfCounters {
        pub cpu_cycles: Option<Counter>,
        pub instructions: Option<Counter>,
        pub cache_references: Option<Counter>,
        pub cache_misses: Option<Counter>,
        pub branch_instructions: Option<Counter>,
        pub branch_misses: Option<Counter>,
    }

    impl PerfCounters {
        /// Counters the kernel refuses (containers, missing permissions) stay `None`.
        pub fn new() -> Self {
            let build = |kind: Hardware| Builder::new().kind(kind).build().ok();
            Self {
                cpu_cycles: build(Hardware::CPU_CYCLES),
                instructions: build(Hardware::INSTRUCTIONS),
                cache_references: build(Hardware::CACHE_REFERENCES),
                cache_misses: build(Hardware::CACHE_MISSES),
                branch_instructions: build(Hardware::BRANCH_INSTRUCTIONS),
                branch_misses: build(Hardware::BRANCH_MISSES),
            }
        }

        fn counters(&mut self) -> impl Iterator<Item = &mut Counter> {
            [
                &mut self.cpu_cycles,
                &mut self.instructions,
                &mut self.cache_references,
                &mut self.cache_misses,
                &mut self.branch_instructions,
                &mut self.branch_misses,
            ]
            .into_iter()
            .filter_map(|c| c.as_mut())
        }

        pub fn enable_all(&mut self) {
            for c in self.counters() {
                let _ = c.enable();
            }
        }

        pub fn disable_all(&mut self) {
            for c in self.counters() {
                let _ = c.disable();
            }
        }

        pub fn reset_all(&mut self) {
            for c in self.counters() {
                let _ = c.reset();
            }
        }

        pub fn read_all(&mut self) -> PerfSnapshot {
            let read = |c: &mut Option<Counter>| c.as_mut().and_then(|c| c.read().ok()).unwrap_or(0);
            PerfSnapshot {
                cpu_cycles: read(&mut self.cpu_cycles),
                instructions: read(&mut self.instructions),
                cache_references: read(&mut self.cache_references),
                cache_misses: read(&mut self.cache_misses),
                branch_instructions: read(&mut self.branch_instructions),
                branch_misses: read(&mut self.branch_misses),
            }
        }
    }

    impl Default for PerfCounters {
        fn default() -> Self {
            Self::new()
        }
    }

    #[derive(Debug, Clone, Copy)]
    pub struct PerfSnapshot {
        pub cpu_cycles: u64,
        pub instructions: u64,
        pub cache_references: u64,
        pub cache_misses: u64,
        pub branch_instructions: u64,
        pub branch_misses: u64,
    }

    impl PerfSnapshot {
        pub fn log_report(&self) {
            info!("=== Hardware Performance Counters ===");
            info!("CPU Cycles:            {:16}", self.cpu_cycles);
            info!("Instructions:          {:16}", self.instructions);

            if self.cpu_cycles > 0 {
                let ipc = self.instructions as f64 / self.cpu_cycles as f64;
                info!("IPC (Instructions/Cycle): {:13.3}", ipc);
            }

            info!("Cache References:      {:16}", self.cache_references);
            info!("Cache Misses:          {:16}", self.cache_misses);
            if self.cache_references > 0 {
                let miss_rate = (self.cache_misses as f64 / self.cache_references as f64) * 100.0;
                info!("Cache Miss Rate:       {:13.2}%", miss_rate);
            }

            info!("Branch Instructions:   {:16}", self.branch_instructions);
            info!("Branch Misses:         {:16}", self.branch_misses);
            if self.branch_instructions > 0 {
                let prediction_rate = ((self.branch_instructions - self.branch_misses) as f64
                    / self.branch_instructions as f64)
                    * 100.0;
                info!("Branch Prediction:     {:13.2}%", prediction_rate);
            }
        }
    }
}
