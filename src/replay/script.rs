/*!
 * Replay Scripts
 * JSON description of a sequence of kernel passes
 */

use super::errors::{ReplayError, ReplayResult};
use crate::core::types::Tick;
use crate::scheduler::SchedulerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Script-local name of a share; 0 always names the idle share
pub type Label = u32;

/// Label reserved for the idle share
pub const IDLE_LABEL: Label = 0;

/// A scheduler configuration plus the operations to drive it with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReplayScript {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub config: SchedulerConfig,
    #[serde(default)]
    pub idle_priority: u8,
    /// Tick count of the first update
    #[serde(default)]
    pub start: Tick,
    pub steps: Vec<Step>,
}

/// One operation of a kernel pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Create a share and insert it
    Create {
        share: Label,
        #[serde(default)]
        priority: u8,
        #[serde(default)]
        quota: Tick,
    },
    /// Remove a share and drop it
    Destroy { share: Label },
    /// Mark a share ready, optionally checking whether that outdates the head
    Ready {
        share: Label,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expect_outdated: Option<bool>,
    },
    Unready { share: Label },
    Quota { share: Label, quota: Tick },
    Yield,
    /// Run a scheduling step `advance` ticks after the previous one, or at
    /// the absolute tick `at`
    Update {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        advance: Option<Tick>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        at: Option<Tick>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expect: Option<Expectation>,
    },
}

/// Selection an update is expected to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expectation {
    pub share: Label,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantum: Option<Tick>,
}

impl ReplayScript {
    pub fn from_json(json: &str) -> ReplayResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> ReplayResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn to_json_pretty(&self) -> ReplayResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_steps() {
        let script = ReplayScript::from_json(
            r#"{
                "config": {"super_period": 1000, "fill_quantum": 100},
                "steps": [
                    {"op": "create", "share": 1, "priority": 2, "quota": 230},
                    {"op": "ready", "share": 1, "expect_outdated": true},
                    {"op": "yield"},
                    {"op": "update", "advance": 10, "expect": {"share": 1, "quantum": 230}}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(script.config.fill_quantum, 100);
        assert_eq!(script.steps.len(), 4);
        assert_eq!(
            script.steps[0],
            Step::Create {
                share: 1,
                priority: 2,
                quota: 230
            }
        );
        assert_eq!(script.steps[2], Step::Yield);
        assert!(matches!(
            script.steps[3],
            Step::Update {
                advance: Some(10),
                at: None,
                expect: Some(Expectation {
                    share: 1,
                    quantum: Some(230)
                })
            }
        ));
    }

    #[test]
    fn test_unknown_op_rejected() {
        let err = ReplayScript::from_json(r#"{"steps": [{"op": "migrate", "share": 1}]}"#)
            .unwrap_err();
        assert!(matches!(err, ReplayError::Parse(_)));
    }

    #[test]
    fn test_round_trip_through_pretty_json() {
        let script = ReplayScript {
            name: Some("rr".into()),
            config: SchedulerConfig::new(2, 1000, 100),
            idle_priority: 0,
            start: 0,
            steps: vec![Step::Destroy { share: 3 }],
        };
        let json = script.to_json_pretty().unwrap();
        assert_eq!(ReplayScript::from_json(&json).unwrap(), script);
    }
}
