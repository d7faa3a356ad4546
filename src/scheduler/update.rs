/*!
 * Scheduling Step
 * Charge the elapsed time, roll the super-period and derive the next grant
 */

use super::traits::TickSource;
use super::{Grant, GrantKind, Scheduler, SchedulerState};
use crate::core::types::{ShareId, Tick};
use tracing::{debug, trace, warn};

impl Scheduler {
    /// Account the time since the last update and select the next share
    ///
    /// The caller must re-arm its timer for at most
    /// [`timeout`](Self::timeout) after every call.
    pub fn update(&mut self, now: Tick) -> Grant {
        debug_assert!(
            now >= self.last_update,
            "update: time moved backwards from {} to {}",
            self.last_update,
            now
        );

        let elapsed = now
            .saturating_sub(self.last_update)
            .min(self.current_quantum)
            .min(self.super_period_left);
        self.last_update = now;

        let yielded = self.state == SchedulerState::Yield;
        if yielded {
            self.stats.yields += 1;
        }

        if let Some(current) = self.current {
            let remaining = if yielded {
                0
            } else {
                self.current_quantum.saturating_sub(elapsed)
            };
            self.charge(current, remaining, yielded);
        }

        self.retire(elapsed);
        self.state = SchedulerState::UpToDate;
        self.stats.updates += 1;

        let previous = self.current;
        let grant = self.select();
        if previous != Some(grant.share) {
            self.stats.context_switches += 1;
        }

        trace!(
            now,
            elapsed,
            share = %grant.share,
            quantum = grant.quantum,
            kind = ?grant.kind,
            "scheduling step"
        );
        grant
    }

    /// [`update`](Self::update) with the time read from a tick source
    pub fn update_from(&mut self, source: &impl TickSource) -> Grant {
        self.update(source.now())
    }

    /// The share to dispatch
    ///
    /// If no share is selected, which only happens when the current share was
    /// removed without a following update, the selection is re-derived first.
    pub fn current(&mut self) -> ShareId {
        let current = self.current;
        current.unwrap_or_else(|| {
            warn!(
                last_update = self.last_update,
                "no current share selected, forcing a scheduling step"
            );
            self.update(self.last_update).share
        })
    }

    fn charge(&mut self, id: ShareId, remaining: Tick, yielded: bool) {
        let Some(index) = self.arena.index_of(id) else {
            return;
        };
        match self.current_kind {
            GrantKind::Claim => self.charge_claim(index, remaining, yielded),
            GrantKind::Fill => self.charge_fill(index, remaining),
            GrantKind::Idle => {}
        }
    }

    fn charge_claim(&mut self, index: u32, remaining: Tick, yielded: bool) {
        let share = self.arena.share_mut(index);
        if share.quota == 0 {
            return;
        }
        share.claim = remaining.min(share.quota);
        if share.claim != 0 || !share.ready {
            return;
        }

        let slot = share.priority.slot();
        self.ready_claims[slot].to_tail(&mut self.arena, index);

        // An exhausted claimant may recover a slight deficit through fill
        // before any other fill candidate
        if !yielded {
            self.fills.to_head(&mut self.arena, index);
        }
    }

    fn charge_fill(&mut self, index: u32, remaining: Tick) {
        if self.fills.head() != Some(index) {
            return;
        }
        if remaining != 0 {
            self.arena.share_mut(index).fill = remaining;
        } else {
            self.arena.share_mut(index).fill = self.fill_quantum;
            self.fills.to_tail(&mut self.arena, index);
        }
    }

    /// Deduct time from the running super-period
    fn retire(&mut self, elapsed: Tick) {
        self.super_period_left = self.super_period_left.saturating_sub(elapsed);
        if self.super_period_left == 0 {
            self.next_super_period();
        }
    }

    fn next_super_period(&mut self) {
        self.super_period_left = self.super_period;
        for queue in self.ready_claims.iter().chain(self.unready_claims.iter()) {
            let mut cursor = queue.head();
            while let Some(index) = cursor {
                cursor = queue.next(&self.arena, index);
                let share = self.arena.share_mut(index);
                share.claim = share.quota;
            }
        }
        self.stats.super_periods += 1;
        debug!(
            super_period = self.super_period,
            "super-period elapsed, claims refilled"
        );
    }

    fn select(&mut self) -> Grant {
        let claimant = self.ready_claims.iter().rev().find_map(|queue| {
            let head = queue.head()?;
            let claim = self.arena.share(head).claim;
            (claim != 0).then_some((head, claim))
        });
        if let Some((index, claim)) = claimant {
            self.stats.claim_grants += 1;
            return self.grant(self.arena.id_at(index), claim, GrantKind::Claim);
        }

        if let Some(index) = self.fills.head() {
            let fill = self.arena.share(index).fill;
            self.stats.fill_grants += 1;
            return self.grant(self.arena.id_at(index), fill, GrantKind::Fill);
        }

        self.stats.idle_grants += 1;
        self.grant(self.idle, self.fill_quantum, GrantKind::Idle)
    }

    fn grant(&mut self, share: ShareId, quantum: Tick, kind: GrantKind) -> Grant {
        self.current = Some(share);
        self.current_quantum = quantum;
        self.current_kind = kind;
        Grant {
            share,
            quantum,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::scheduler::{GrantKind, ManualClock, Scheduler, SchedulerConfig, Share};

    fn scheduler() -> Scheduler {
        Scheduler::new(Share::new(0, 0), SchedulerConfig::new(4, 1000, 100)).unwrap()
    }

    #[test]
    fn test_idle_when_nothing_ready() {
        let mut sched = scheduler();
        let grant = sched.update(50);
        assert_eq!(grant.share, sched.idle());
        assert_eq!(grant.quantum, 100);
        assert_eq!(grant.kind, GrantKind::Idle);
    }

    #[test]
    fn test_claim_then_fill_after_exhaustion() {
        let mut sched = scheduler();
        let a = sched.insert(Share::new(0, 500));
        sched.ready(a);

        let grant = sched.update(0);
        assert_eq!((grant.share, grant.quantum, grant.kind), (a, 500, GrantKind::Claim));

        let grant = sched.update(500);
        assert_eq!((grant.share, grant.quantum, grant.kind), (a, 100, GrantKind::Fill));
        assert_eq!(sched.share(a).unwrap().claim(), 0);
    }

    #[test]
    fn test_elapsed_clamped_by_quantum() {
        let mut sched = scheduler();
        let a = sched.insert(Share::new(0, 300));
        sched.ready(a);
        sched.update(0);
        sched.update(250);

        // 250 consumed of 300 - overrun to 900 is clamped to the 50 granted
        let grant = sched.update(900);
        assert_eq!(sched.share(a).unwrap().claim(), 0);
        assert_eq!(grant.kind, GrantKind::Fill);
        assert_eq!(sched.super_period_left(), 700);
    }

    #[test]
    fn test_super_period_refills_claims() {
        let mut sched = scheduler();
        let a = sched.insert(Share::new(1, 200));
        let b = sched.insert(Share::new(0, 300));
        sched.ready(a);

        sched.update(0);
        sched.update(200);
        assert_eq!(sched.share(a).unwrap().claim(), 0);

        // a runs on fill for the rest of the super-period
        let mut now = 200;
        while sched.super_period_left() != 1000 {
            now += 100;
            sched.update(now);
        }
        assert_eq!(now, 1000);
        assert_eq!(sched.share(a).unwrap().claim(), 200);
        assert_eq!(sched.share(b).unwrap().claim(), 300);
        assert_eq!(sched.current_grant().unwrap().kind, GrantKind::Claim);
        assert_eq!(sched.stats().super_periods, 1);
    }

    #[test]
    fn test_current_self_heals() {
        let mut sched = scheduler();
        let a = sched.insert(Share::new(0, 0));
        let b = sched.insert(Share::new(0, 0));
        sched.ready(a);
        sched.ready(b);
        sched.update(10);
        sched.remove(a);

        assert_eq!(sched.peek_current(), None);
        assert_eq!(sched.current(), b);
        assert_eq!(sched.peek_current(), Some(b));
        assert!(!sched.need_to_schedule());
    }

    #[test]
    fn test_yield_counted_once_consumed() {
        let mut sched = scheduler();
        let a = sched.insert(Share::new(0, 0));
        sched.ready(a);
        sched.update(0);

        sched.yield_current();
        sched.yield_current();
        assert_eq!(sched.stats().yields, 0);

        sched.update(10);
        assert_eq!(sched.stats().yields, 1);
        sched.update(20);
        assert_eq!(sched.stats().yields, 1);
    }

    #[test]
    fn test_update_from_tick_source() {
        let mut sched = scheduler();
        let clock = ManualClock::new(0);
        let a = sched.insert(Share::new(0, 0));
        sched.ready(a);

        sched.update_from(&clock);
        clock.advance(60);
        let grant = sched.update_from(&clock);
        assert_eq!((grant.share, grant.quantum), (a, 40));
        assert_eq!(sched.last_update(), 60);
    }
}
