/*!
 * Per-CPU Schedulers
 *
 * One scheduler per CPU, each behind its own lock. Every CPU only ever
 * touches its own instance, so the lock is the per-CPU kernel lock held for
 * the duration of a scheduler call. Shares never move between CPUs here.
 */

use super::{Scheduler, SchedulerConfig, SchedulerStats, Share};
use crate::core::errors::SchedulerResult;
use parking_lot::Mutex;
use tracing::info;

/// Scheduler instances indexed by CPU number
pub struct CpuSchedulers {
    cpus: Vec<Mutex<Scheduler>>,
}

impl CpuSchedulers {
    /// Build `cpus` schedulers, asking `idle` for each CPU's idle share
    pub fn new<F>(cpus: usize, config: SchedulerConfig, mut idle: F) -> SchedulerResult<Self>
    where
        F: FnMut(usize) -> Share,
    {
        let cpus = (0..cpus)
            .map(|cpu| Scheduler::new(idle(cpu), config).map(Mutex::new))
            .collect::<SchedulerResult<Vec<_>>>()?;

        info!(cpus = cpus.len(), "per-CPU schedulers initialized");
        Ok(Self { cpus })
    }

    #[inline]
    pub fn cpu_count(&self) -> usize {
        self.cpus.len()
    }

    /// Run `f` on the scheduler of `cpu` while holding its lock
    ///
    /// Returns `None` for an unknown CPU.
    pub fn with<R>(&self, cpu: usize, f: impl FnOnce(&mut Scheduler) -> R) -> Option<R> {
        let slot = self.cpus.get(cpu)?;
        let mut scheduler = slot.lock();
        Some(f(&mut scheduler))
    }

    /// Statistics of every CPU, in CPU order
    pub fn stats(&self) -> Vec<SchedulerStats> {
        self.cpus.iter().map(|cpu| cpu.lock().stats()).collect()
    }
}
