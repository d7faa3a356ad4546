/*!
 * Scheduler Core Operations
 * Admission, removal, readiness, quota and yield transitions
 */

use super::{GrantKind, Scheduler, SchedulerState, Share};
use crate::core::types::{ShareId, Tick};
use tracing::{debug, info};

impl Scheduler {
    /// Admit an unready share to this CPU
    ///
    /// A share with quota starts with its full claim at the head of its
    /// unready-claim queue, so it is favored once it becomes ready.
    pub fn insert(&mut self, share: Share) -> ShareId {
        assert!(!share.ready, "insert: share must not be ready");

        let mut share = share;
        let requested = share.priority;
        share.priority = requested.clamp_to(self.priority_levels());
        share.fill = 0;
        share.claim = share.quota;

        let priority = share.priority;
        let quota = share.quota;
        let id = self.arena.insert(share);
        if quota != 0 {
            self.unready_claims[priority.slot()].push_head(&mut self.arena, id.index());
        }
        self.stats.shares += 1;

        info!(
            share = %id,
            priority = priority.level(),
            requested_priority = requested.level(),
            quota,
            "share admitted"
        );
        id
    }

    /// Forget a share, returning its record
    ///
    /// Never called on the idle share.
    pub fn remove(&mut self, id: ShareId) -> Share {
        self.assert_not_idle(id, "remove");
        let index = self.resolve(id, "remove");

        if self.arena.share(index).ready {
            self.unready(id);
        }
        if self.current == Some(id) {
            self.current = None;
            self.mark_out_of_date();
        }

        let share = self.arena.share(index);
        let (priority, quota) = (share.priority, share.quota);
        if quota != 0 {
            self.unready_claims[priority.slot()].remove(&mut self.arena, index);
        }

        self.stats.shares -= 1;
        info!(share = %id, "share removed");

        match self.arena.remove(id) {
            Some(share) => share,
            None => unreachable!("{} vanished during removal", id),
        }
    }

    /// Mark a share runnable
    ///
    /// Returns whether the cached selection is stale because of this call.
    pub fn ready(&mut self, id: ShareId) -> bool {
        self.assert_not_idle(id, "ready");
        let index = self.resolve(id, "ready");

        let fill_quantum = self.fill_quantum;
        let share = self.arena.share_mut(index);
        assert!(!share.ready, "ready: {} is already ready", id);
        share.ready = true;
        share.fill = fill_quantum;
        let claims = share.has_claim();
        let (priority, quota, claim) = (share.priority, share.quota, share.claim);

        if quota != 0 {
            let slot = priority.slot();
            self.unready_claims[slot].remove(&mut self.arena, index);
            if claim != 0 {
                self.ready_claims[slot].push_head(&mut self.arena, index);
            } else {
                self.ready_claims[slot].push_tail(&mut self.arena, index);
            }
        }
        self.fills.push_tail(&mut self.arena, index);

        let stale = match self.current {
            None => true,
            Some(current) if current == self.idle => true,
            Some(current) => {
                let outranks = self
                    .arena
                    .get(current)
                    .map_or(true, |running| priority >= running.priority);
                claims && (self.current_kind != GrantKind::Claim || outranks)
            }
        };
        if stale {
            self.mark_out_of_date();
        }

        debug!(share = %id, claim, stale, "share ready");
        stale
    }

    /// Mark a share blocked
    ///
    /// Its remaining claim is kept for when it becomes ready again.
    pub fn unready(&mut self, id: ShareId) {
        self.assert_not_idle(id, "unready");
        let index = self.resolve(id, "unready");
        assert!(
            self.arena.share(index).ready,
            "unready: {} is not ready",
            id
        );

        if self.current == Some(id) {
            self.mark_out_of_date();
        }

        let share = self.arena.share_mut(index);
        share.ready = false;
        let (priority, quota) = (share.priority, share.quota);

        self.fills.remove(&mut self.arena, index);
        if quota != 0 {
            let slot = priority.slot();
            self.ready_claims[slot].remove(&mut self.arena, index);
            self.unready_claims[slot].push_tail(&mut self.arena, index);
        }

        debug!(share = %id, "share unready");
    }

    /// Give up the rest of the current quantum at the next update
    ///
    /// Unlike exhausting a claim, a yielding claimant is not promoted to the
    /// head of the fill queue.
    pub fn yield_current(&mut self) {
        self.state = SchedulerState::Yield;
    }

    /// Change the guaranteed runtime of a share
    pub fn quota(&mut self, id: ShareId, quota: Tick) {
        self.assert_not_idle(id, "quota");
        let index = self.resolve(id, "quota");

        let share = self.arena.share(index);
        let (priority, ready, previous) = (share.priority, share.ready, share.quota);
        let slot = priority.slot();
        let introduced = previous == 0 && quota != 0;

        if introduced {
            self.arena.share_mut(index).claim = quota;
            if ready {
                self.ready_claims[slot].push_tail(&mut self.arena, index);
            } else {
                self.unready_claims[slot].push_tail(&mut self.arena, index);
            }
        } else if previous != 0 && quota != 0 {
            let share = self.arena.share_mut(index);
            share.claim = share.claim.min(quota);
        } else if previous != 0 {
            if ready {
                self.ready_claims[slot].remove(&mut self.arena, index);
            } else {
                self.unready_claims[slot].remove(&mut self.arena, index);
            }
            self.arena.share_mut(index).claim = 0;
        }
        self.arena.share_mut(index).quota = quota;

        if self.current == Some(id) || (introduced && ready) {
            self.mark_out_of_date();
        }

        info!(share = %id, previous, quota, "share quota changed");
    }
}
