/// Worker pool for bin rasterization.
///
/// A persistent rayon pool sized by a thread tier. Per draw call the director
/// hands bins out round-robin; each worker walks its list sequentially and the
/// director blocks in `scope` until every worker is done.
use super::error::{RenderError, RenderResult};
use log::info;

/// Worker count tiers relative to the machine's core count.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum RenderThreadsMode {
    VeryLow,
    Low,
    #[default]
    Medium,
    High,
    VeryHigh,
    Max,
}

impl RenderThreadsMode {
    pub const ALL: [RenderThreadsMode; 6] = [
        Self::VeryLow,
        Self::Low,
        Self::Medium,
        Self::High,
        Self::VeryHigh,
        Self::Max,
    ];

    /// Worker count for a machine with `available` cores; at least 1.
    pub fn thread_count(self, available: usize) -> usize {
        let n = available.max(1);
        let count = match self {
            Self::VeryLow => 1,
            Self::Low => n / 4,
            Self::Medium => n / 2,
            Self::High => (3 * n) / 4,
            Self::VeryHigh => n - 1,
            Self::Max => n,
        };
        count.max(1)
    }
}

impl TryFrom<i32> for RenderThreadsMode {
    type Error = RenderError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        usize::try_from(value)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(RenderError::UnknownThreadsMode(value))
    }
}

pub struct WorkerPool {
    pool: rayon::ThreadPool,
    mode: RenderThreadsMode,
    thread_count: usize,
}

impl WorkerPool {
    pub fn new(mode: RenderThreadsMode) -> RenderResult<Self> {
        let thread_count = mode.thread_count(rayon::current_num_threads());
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(thread_count)
            .thread_name(|i| format!("raster-worker-{i}"))
            .build()?;
        info!("worker pool: {:?} -> {} threads", mode, thread_count);

        Ok(Self {
            pool,
            mode,
            thread_count,
        })
    }

    #[inline]
    pub fn mode(&self) -> RenderThreadsMode {
        self.mode
    }

    #[inline]
    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Rebuild the pool if the tier changed. Only call between frames.
    pub fn set_mode(&mut self, mode: RenderThreadsMode) -> RenderResult<()> {
        if mode != self.mode {
            *self = Self::new(mode)?;
        }
        Ok(())
    }

    /// Round-robin assignment of `items` to workers.
    pub fn assign<T: Copy>(&self, items: &[T]) -> Vec<Vec<T>> {
        let mut lists = vec![Vec::new(); self.thread_count.min(items.len())];
        let worker_count = lists.len();
        for (i, &item) in items.iter().enumerate() {
            lists[i % worker_count].push(item);
        }
        lists
    }

    /// Run `work` on every item, one sequential list per worker, and wait for
    /// all of them.
    pub fn run<T, F>(&self, items: &[T], work: F)
    where
        T: Copy + Send,
        F: Fn(T) + Sync,
    {
        if items.is_empty() {
            return;
        }

        let lists = self.assign(items);
        let work = &work;
        self.pool.scope(|scope| {
            for list in lists {
                scope.spawn(move |_| {
                    for item in list {
                        work(item);
                    }
                });
            }
        });
    }
}
