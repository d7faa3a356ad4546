/*!
 * Replay Runner
 * Drives a scheduler through a script against a manual clock
 */

use super::errors::{ReplayError, ReplayResult};
use super::script::{Expectation, Label, ReplayScript, Step, IDLE_LABEL};
use crate::core::types::{ShareId, Tick};
use crate::scheduler::{GrantKind, ManualClock, Scheduler, Share, TickSource};
use ahash::AHashMap;
use serde::Serialize;
use tracing::{debug, info};

/// Outcome of one scripted update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReplayRecord {
    pub step: usize,
    pub now: Tick,
    pub share: Label,
    pub quantum: Tick,
    pub kind: GrantKind,
    pub super_period_left: Tick,
}

/// Scheduler plus the label bookkeeping of a running script
///
/// Every step is checked against the scheduler's contracts before it is
/// applied, so a bad script yields a [`ReplayError`] instead of a panic.
pub struct Replayer {
    scheduler: Scheduler,
    clock: ManualClock,
    shares: AHashMap<Label, ShareId>,
    labels: AHashMap<ShareId, Label>,
}

impl Replayer {
    pub fn new(script: &ReplayScript) -> ReplayResult<Self> {
        let scheduler = Scheduler::new(Share::new(script.idle_priority, 0), script.config)?;

        let mut shares = AHashMap::new();
        let mut labels = AHashMap::new();
        shares.insert(IDLE_LABEL, scheduler.idle());
        labels.insert(scheduler.idle(), IDLE_LABEL);

        Ok(Self {
            scheduler,
            clock: ManualClock::new(script.start),
            shares,
            labels,
        })
    }

    /// Run every step of `script` and collect one record per update
    pub fn run(script: &ReplayScript) -> ReplayResult<Vec<ReplayRecord>> {
        let mut replayer = Self::new(script)?;
        let mut records = Vec::new();
        for (index, step) in script.steps.iter().enumerate() {
            if let Some(record) = replayer.apply(index, step)? {
                records.push(record);
            }
        }
        info!(
            steps = script.steps.len(),
            updates = records.len(),
            "replay finished"
        );
        Ok(records)
    }

    #[inline]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    #[inline]
    pub fn now(&self) -> Tick {
        self.clock.now()
    }

    /// Label of a share handle, if the script created it
    pub fn label(&self, id: ShareId) -> Option<Label> {
        self.labels.get(&id).copied()
    }

    /// Apply one step; updates produce a record
    pub fn apply(&mut self, step: usize, op: &Step) -> ReplayResult<Option<ReplayRecord>> {
        debug!(step, ?op, "replay step");

        match *op {
            Step::Create {
                share,
                priority,
                quota,
            } => {
                if self.shares.contains_key(&share) {
                    return Err(ReplayError::DuplicateShare { step, label: share });
                }
                let id = self.scheduler.insert(Share::new(priority, quota));
                self.shares.insert(share, id);
                self.labels.insert(id, share);
            }
            Step::Destroy { share } => {
                let id = self.non_idle(step, share)?;
                self.scheduler.remove(id);
                self.shares.remove(&share);
                self.labels.remove(&id);
            }
            Step::Ready {
                share,
                expect_outdated,
            } => {
                let id = self.non_idle(step, share)?;
                if self.is_ready(id) {
                    return Err(precondition(step, format!("share {share} is already ready")));
                }
                let outdated = self.scheduler.ready(id);
                if let Some(expected) = expect_outdated {
                    if expected != outdated {
                        return Err(ReplayError::OutdateMismatch { step, expected });
                    }
                }
            }
            Step::Unready { share } => {
                let id = self.non_idle(step, share)?;
                if !self.is_ready(id) {
                    return Err(precondition(step, format!("share {share} is not ready")));
                }
                self.scheduler.unready(id);
            }
            Step::Quota { share, quota } => {
                let id = self.non_idle(step, share)?;
                self.scheduler.quota(id, quota);
            }
            Step::Yield => self.scheduler.yield_current(),
            Step::Update {
                advance,
                at,
                expect,
            } => return self.update(step, advance, at, expect).map(Some),
        }
        Ok(None)
    }

    fn update(
        &mut self,
        step: usize,
        advance: Option<Tick>,
        at: Option<Tick>,
        expect: Option<Expectation>,
    ) -> ReplayResult<ReplayRecord> {
        let now = match (advance, at) {
            (Some(_), Some(_)) => {
                return Err(ReplayError::InvalidStep {
                    step,
                    reason: "update takes either advance or at, not both".into(),
                })
            }
            (Some(ticks), None) => self.clock.advance(ticks),
            (None, Some(at)) => {
                if at < self.clock.now() {
                    return Err(precondition(
                        step,
                        format!("update at {at} is before the previous tick {}", self.clock.now()),
                    ));
                }
                self.clock.set(at)
            }
            (None, None) => self.clock.now(),
        };

        let grant = self.scheduler.update_from(&self.clock);
        let share = self.label(grant.share).ok_or(ReplayError::InvalidStep {
            step,
            reason: format!("scheduler granted untracked {}", grant.share),
        })?;

        if let Some(expect) = expect {
            let quantum_matches = expect.quantum.map_or(true, |q| q == grant.quantum);
            if expect.share != share || !quantum_matches {
                return Err(ReplayError::Mismatch {
                    step,
                    expected_share: expect.share,
                    expected_quantum: expect.quantum,
                    share,
                    quantum: grant.quantum,
                });
            }
        }

        Ok(ReplayRecord {
            step,
            now,
            share,
            quantum: grant.quantum,
            kind: grant.kind,
            super_period_left: self.scheduler.super_period_left(),
        })
    }

    fn non_idle(&self, step: usize, label: Label) -> ReplayResult<ShareId> {
        let id = self
            .shares
            .get(&label)
            .copied()
            .ok_or(ReplayError::UnknownShare { step, label })?;
        self.scheduler.check_managed(id)?;
        Ok(id)
    }

    fn is_ready(&self, id: ShareId) -> bool {
        self.scheduler.share(id).is_some_and(Share::is_ready)
    }
}

fn precondition(step: usize, reason: String) -> ReplayError {
    ReplayError::Precondition { step, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::SchedulerError;
    use crate::scheduler::SchedulerConfig;
    use pretty_assertions::assert_eq;

    fn script(steps: Vec<Step>) -> ReplayScript {
        ReplayScript {
            name: None,
            config: SchedulerConfig::new(4, 1000, 100),
            idle_priority: 0,
            start: 0,
            steps,
        }
    }

    fn update(advance: Tick, share: Label, quantum: Tick) -> Step {
        Step::Update {
            advance: Some(advance),
            at: None,
            expect: Some(Expectation {
                share,
                quantum: Some(quantum),
            }),
        }
    }

    #[test]
    fn test_claim_then_fill() {
        let records = Replayer::run(&script(vec![
            Step::Create {
                share: 1,
                priority: 2,
                quota: 300,
            },
            Step::Ready {
                share: 1,
                expect_outdated: Some(true),
            },
            update(0, 1, 300),
            update(300, 1, 100),
        ]))
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, GrantKind::Claim);
        assert_eq!(records[1].kind, GrantKind::Fill);
        assert_eq!(records[1].now, 300);
        assert_eq!(records[1].super_period_left, 700);
    }

    #[test]
    fn test_idle_when_nothing_ready() {
        let records = Replayer::run(&script(vec![update(0, IDLE_LABEL, 100)])).unwrap();
        assert_eq!(records[0].kind, GrantKind::Idle);
    }

    #[test]
    fn test_mismatch_reported() {
        let err = Replayer::run(&script(vec![
            Step::Create {
                share: 1,
                priority: 0,
                quota: 0,
            },
            Step::Ready {
                share: 1,
                expect_outdated: None,
            },
            update(0, 1, 50),
        ]))
        .unwrap_err();

        assert!(matches!(
            err,
            ReplayError::Mismatch {
                step: 2,
                share: 1,
                quantum: 100,
                ..
            }
        ));
    }

    #[test]
    fn test_contract_violations_become_errors() {
        let err = Replayer::run(&script(vec![Step::Unready { share: 3 }])).unwrap_err();
        assert!(matches!(err, ReplayError::UnknownShare { step: 0, label: 3 }));

        let err = Replayer::run(&script(vec![Step::Destroy { share: IDLE_LABEL }])).unwrap_err();
        assert!(matches!(
            err,
            ReplayError::Scheduler(SchedulerError::IdleShare(_))
        ));

        let err = Replayer::run(&script(vec![
            Step::Create {
                share: 1,
                priority: 0,
                quota: 0,
            },
            Step::Ready {
                share: 1,
                expect_outdated: None,
            },
            Step::Ready {
                share: 1,
                expect_outdated: None,
            },
        ]))
        .unwrap_err();
        assert!(matches!(err, ReplayError::Precondition { step: 2, .. }));

        let err = Replayer::run(&script(vec![
            Step::Create {
                share: 1,
                priority: 0,
                quota: 0,
            },
            Step::Create {
                share: 1,
                priority: 0,
                quota: 0,
            },
        ]))
        .unwrap_err();
        assert!(matches!(err, ReplayError::DuplicateShare { step: 1, label: 1 }));
    }

    #[test]
    fn test_update_time_forms() {
        let err = Replayer::run(&script(vec![Step::Update {
            advance: Some(1),
            at: Some(2),
            expect: None,
        }]))
        .unwrap_err();
        assert!(matches!(err, ReplayError::InvalidStep { step: 0, .. }));

        let err = Replayer::run(&script(vec![
            Step::Update {
                advance: None,
                at: Some(50),
                expect: None,
            },
            Step::Update {
                advance: None,
                at: Some(20),
                expect: None,
            },
        ]))
        .unwrap_err();
        assert!(matches!(err, ReplayError::Precondition { step: 1, .. }));
    }

    #[test]
    fn test_destroyed_label_can_be_reused() {
        let mut replayer = Replayer::new(&script(Vec::new())).unwrap();
        let create = Step::Create {
            share: 5,
            priority: 1,
            quota: 10,
        };
        replayer.apply(0, &create).unwrap();
        replayer.apply(1, &Step::Destroy { share: 5 }).unwrap();
        replayer.apply(2, &create).unwrap();

        assert_eq!(replayer.scheduler().len(), 1);
        assert_eq!(replayer.now(), 0);
    }
}
