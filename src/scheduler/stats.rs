/*!
 * Scheduler Statistics
 * Decision counters, per-share snapshots and structural self-checks
 */

use super::arena::QueueId;
use super::{GrantKind, Priority, Scheduler};
use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::types::{ShareId, Tick};
use serde::{Deserialize, Serialize};

/// Counters accumulated over the lifetime of a scheduler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerStats {
    pub updates: u64,
    pub claim_grants: u64,
    pub fill_grants: u64,
    pub idle_grants: u64,
    /// Updates that selected a different share than before
    pub context_switches: u64,
    pub yields: u64,
    pub super_periods: u64,
    /// Tracked shares, idle excluded
    pub shares: usize,
}

/// Point-in-time view of one share
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ShareSnapshot {
    pub id: ShareId,
    pub priority: Priority,
    pub quota: Tick,
    pub claim: Tick,
    pub fill: Tick,
    pub ready: bool,
    pub is_current: bool,
}

impl Scheduler {
    /// Get scheduler statistics
    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Snapshot every tracked share, idle excluded
    pub fn snapshot(&self) -> Vec<ShareSnapshot> {
        self.arena
            .iter()
            .filter(|(id, _)| *id != self.idle)
            .map(|(id, share)| ShareSnapshot {
                id,
                priority: share.priority,
                quota: share.quota,
                claim: share.claim,
                fill: share.fill,
                ready: share.ready,
                is_current: self.current == Some(id),
            })
            .collect()
    }

    /// Verify the structural invariants of every share and queue
    ///
    /// O(N); meant for tests and debugging, not for the scheduling path.
    pub fn check_invariants(&self) -> SchedulerResult<()> {
        let violation = |msg: String| Err(SchedulerError::Contract(msg));

        let mut claimants = 0;
        for (id, share) in self.arena.iter() {
            let index = id.index();
            if share.claim > share.quota {
                return violation(format!(
                    "{} claim {} exceeds quota {}",
                    id, share.claim, share.quota
                ));
            }

            let slot = share.priority.slot();
            if slot >= self.ready_claims.len() {
                return violation(format!("{} priority {} out of range", id, share.priority));
            }

            let expected = match (id == self.idle, share.quota != 0, share.ready) {
                (true, _, _) | (false, false, _) => None,
                (false, true, true) => Some(QueueId::Ready(share.priority)),
                (false, true, false) => Some(QueueId::Unready(share.priority)),
            };
            let in_ready = self.ready_claims[slot].contains(&self.arena, index);
            let in_unready = self.unready_claims[slot].contains(&self.arena, index);
            let actual = match (in_ready, in_unready) {
                (true, _) => Some(QueueId::Ready(share.priority)),
                (false, true) => Some(QueueId::Unready(share.priority)),
                (false, false) => None,
            };
            if expected != actual {
                return violation(format!(
                    "{} expected in claim queue {:?} but found in {:?}",
                    id, expected, actual
                ));
            }
            claimants += usize::from(actual.is_some());

            if self.fills.contains(&self.arena, index) != share.ready {
                return violation(format!(
                    "{} fill membership disagrees with ready={}",
                    id, share.ready
                ));
            }
        }

        let queued: usize = self
            .ready_claims
            .iter()
            .chain(self.unready_claims.iter())
            .map(|queue| queue.len())
            .sum();
        if queued != claimants {
            return violation(format!(
                "claim queues hold {} shares but {} claimants exist",
                queued, claimants
            ));
        }

        if self.super_period_left > self.super_period {
            return violation(format!(
                "super_period_left {} exceeds super_period {}",
                self.super_period_left, self.super_period
            ));
        }

        if let Some(current) = self.current {
            if !self.arena.contains(current) {
                return violation(format!("current {} is not tracked", current));
            }
            if (current == self.idle) != (self.current_kind == GrantKind::Idle) {
                return violation(format!(
                    "current {} granted as {:?}",
                    current, self.current_kind
                ));
            }
        }
        Ok(())
    }
}
