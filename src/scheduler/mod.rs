/*!
 * CPU Scheduler
 * Per-CPU proportional-share scheduling: strict priorities, quota-bounded
 * claims replenished every super-period, and round-robin fill
 */

use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::types::{ShareId, Tick};
use tracing::info;

mod arena;
pub mod config;
mod operations;
pub mod percpu;
mod queue;
pub mod share;
mod stats;
pub mod traits;
pub mod types;
mod update;

use arena::{QueueId, ShareArena};
use queue::ShareQueue;

// Re-export public API
pub use config::SchedulerConfig;
pub use percpu::CpuSchedulers;
pub use share::Share;
pub use stats::{SchedulerStats, ShareSnapshot};
pub use traits::{ManualClock, MonotonicClock, TickSource};
pub use types::{Grant, GrantKind, Priority, SchedulerState, MAX_PRIORITY, MIN_PRIORITY};

/// Scheduling core of one CPU
///
/// Owned by the per-CPU kernel context and driven through `&mut self`, so
/// exclusive access is enforced by the borrow checker rather than by
/// internal locking.
#[derive(Debug)]
pub struct Scheduler {
    arena: ShareArena,
    idle: ShareId,

    // Claim queues indexed by priority level
    ready_claims: Vec<ShareQueue>,
    unready_claims: Vec<ShareQueue>,

    // Every ready share, in round-robin order
    fills: ShareQueue,

    super_period: Tick,
    super_period_left: Tick,
    fill_quantum: Tick,

    current: Option<ShareId>,
    current_quantum: Tick,
    current_kind: GrantKind,
    last_update: Tick,
    state: SchedulerState,

    stats: SchedulerStats,
}

impl Scheduler {
    /// Create a scheduler around a permanent idle share
    ///
    /// The idle share never carries a quota. It is the current selection
    /// until the first [`update`](Self::update).
    pub fn new(idle: Share, config: SchedulerConfig) -> SchedulerResult<Self> {
        config.validate()?;

        let mut idle = idle;
        idle.priority = idle.priority.clamp_to(config.priority_levels);
        idle.quota = 0;
        idle.claim = 0;
        idle.ready = false;

        let mut arena = ShareArena::with_capacity(config.share_capacity.saturating_add(1));
        let idle = arena.insert(idle);

        let levels = config.priority_levels;
        let ready_claims = (0..levels)
            .map(|p| ShareQueue::new(QueueId::Ready(Priority::new(p))))
            .collect();
        let unready_claims = (0..levels)
            .map(|p| ShareQueue::new(QueueId::Unready(Priority::new(p))))
            .collect();

        info!(
            priority_levels = levels,
            super_period = config.super_period,
            fill_quantum = config.fill_quantum,
            "CPU scheduler initialized"
        );

        Ok(Self {
            arena,
            idle,
            ready_claims,
            unready_claims,
            fills: ShareQueue::new(QueueId::Fill),
            super_period: config.super_period,
            super_period_left: config.super_period,
            fill_quantum: config.fill_quantum,
            current: Some(idle),
            current_quantum: config.fill_quantum,
            current_kind: GrantKind::Idle,
            last_update: 0,
            state: SchedulerState::OutOfDate,
            stats: SchedulerStats::default(),
        })
    }

    /// Handle of the idle share
    #[inline(always)]
    pub fn idle(&self) -> ShareId {
        self.idle
    }

    /// Current selection without the self-healing of [`current`](Self::current)
    #[inline(always)]
    pub fn peek_current(&self) -> Option<ShareId> {
        self.current
    }

    /// Quantum granted to the current selection by the last update
    #[inline(always)]
    pub fn current_quantum(&self) -> Tick {
        self.current_quantum
    }

    /// The current selection as a grant, if any
    pub fn current_grant(&self) -> Option<Grant> {
        self.current.map(|share| Grant {
            share,
            quantum: self.current_quantum,
            kind: self.current_kind,
        })
    }

    #[inline(always)]
    pub fn super_period(&self) -> Tick {
        self.super_period
    }

    #[inline(always)]
    pub fn super_period_left(&self) -> Tick {
        self.super_period_left
    }

    #[inline(always)]
    pub fn fill_quantum(&self) -> Tick {
        self.fill_quantum
    }

    #[inline(always)]
    pub fn last_update(&self) -> Tick {
        self.last_update
    }

    #[inline(always)]
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Whether the cached selection must be re-derived before dispatch
    #[inline(always)]
    pub fn need_to_schedule(&self) -> bool {
        self.state != SchedulerState::UpToDate
    }

    /// Longest interval the timer may be armed for after an update
    pub fn timeout(&self, platform_max: Tick) -> Tick {
        self.current_quantum
            .min(self.super_period_left)
            .min(platform_max)
    }

    #[inline(always)]
    pub fn priority_levels(&self) -> u8 {
        self.ready_claims.len() as u8
    }

    pub fn share(&self, id: ShareId) -> Option<&Share> {
        self.arena.get(id)
    }

    pub fn contains(&self, id: ShareId) -> bool {
        self.arena.contains(id)
    }

    /// Number of tracked shares, not counting the idle share
    pub fn len(&self) -> usize {
        self.arena.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ready-claim queue of a priority level, head first
    pub fn ready_claims(&self, priority: impl Into<Priority>) -> Vec<ShareId> {
        let priority = priority.into();
        self.ready_claims
            .get(priority.slot())
            .map(|queue| self.queue_ids(queue))
            .unwrap_or_default()
    }

    /// Unready-claim queue of a priority level, head first
    pub fn unready_claims(&self, priority: impl Into<Priority>) -> Vec<ShareId> {
        let priority = priority.into();
        self.unready_claims
            .get(priority.slot())
            .map(|queue| self.queue_ids(queue))
            .unwrap_or_default()
    }

    /// Fill queue, head first
    pub fn fills(&self) -> Vec<ShareId> {
        self.queue_ids(&self.fills)
    }

    /// Check that a handle names a tracked share other than the idle share
    ///
    /// Fallible counterpart of the contract checks the mutating calls panic on.
    pub fn check_managed(&self, id: ShareId) -> SchedulerResult<()> {
        if id == self.idle {
            return Err(SchedulerError::IdleShare(id.to_string()));
        }
        if !self.arena.contains(id) {
            return Err(SchedulerError::UnknownShare(id));
        }
        Ok(())
    }

    fn queue_ids(&self, queue: &ShareQueue) -> Vec<ShareId> {
        queue
            .iter(&self.arena)
            .map(|index| self.arena.id_at(index))
            .collect()
    }

    /// Resolve a handle, panicking on a stale or foreign one
    fn resolve(&self, id: ShareId, op: &str) -> u32 {
        match self.arena.index_of(id) {
            Some(index) => index,
            None => panic!("{}: {} is not tracked by this scheduler", op, id),
        }
    }

    fn assert_not_idle(&self, id: ShareId, op: &str) {
        assert!(id != self.idle, "{}: not permitted on the idle share", op);
    }

    fn mark_out_of_date(&mut self) {
        if self.state == SchedulerState::UpToDate {
            self.state = SchedulerState::OutOfDate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> Scheduler {
        Scheduler::new(Share::new(0, 0), SchedulerConfig::new(4, 1000, 100)).unwrap()
    }

    #[test]
    fn test_initial_selection_is_idle() {
        let sched = scheduler();
        assert_eq!(sched.peek_current(), Some(sched.idle()));
        assert_eq!(sched.current_quantum(), 100);
        assert!(sched.need_to_schedule());
        assert!(sched.is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = Scheduler::new(Share::new(0, 0), SchedulerConfig::new(0, 1000, 100));
        assert!(result.is_err());
    }

    #[test]
    fn test_idle_quota_is_dropped() {
        let sched = Scheduler::new(Share::new(9, 500), SchedulerConfig::new(4, 1000, 100)).unwrap();
        let idle = sched.share(sched.idle()).unwrap();
        assert_eq!(idle.quota(), 0);
        assert_eq!(idle.priority().level(), 3);
    }

    #[test]
    fn test_timeout_is_three_way_minimum() {
        let mut sched = scheduler();
        sched.update(950);
        assert_eq!(sched.super_period_left(), 1000 - 100);
        assert_eq!(sched.timeout(1_000_000), 100);
        assert_eq!(sched.timeout(30), 30);

        for now in [1050, 1150, 1250, 1350, 1450, 1550, 1650, 1750] {
            sched.update(now);
        }
        assert_eq!(sched.super_period_left(), 100);
        sched.update(1800);
        assert_eq!(sched.super_period_left(), 50);
        assert_eq!(sched.timeout(1_000_000), 50);
    }

    #[test]
    fn test_check_managed() {
        let mut sched = scheduler();
        let a = sched.insert(Share::new(1, 0));
        assert!(sched.check_managed(a).is_ok());
        assert!(matches!(
            sched.check_managed(sched.idle()),
            Err(SchedulerError::IdleShare(_))
        ));

        sched.remove(a);
        assert_eq!(sched.check_managed(a), Err(SchedulerError::UnknownShare(a)));
    }

    #[test]
    fn test_queue_snapshots_out_of_range_priority() {
        let sched = scheduler();
        assert!(sched.ready_claims(100).is_empty());
        assert!(sched.unready_claims(0).is_empty());
        assert!(sched.fills().is_empty());
    }
}
