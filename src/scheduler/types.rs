/*!
 * Scheduler Types
 * Domain types for scheduling decisions
 */

use crate::core::limits::MAX_PRIORITY_LEVELS;
use crate::core::types::{ShareId, Tick};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest priority level any scheduler can be configured with
pub const MAX_PRIORITY: u8 = MAX_PRIORITY_LEVELS - 1;

/// Lowest priority level
pub const MIN_PRIORITY: u8 = 0;

/// Priority level of a share (higher value is more important)
///
/// Values are clamped on every assignment, first to [`MAX_PRIORITY`] here and
/// again to the level count of the scheduler the share is inserted into.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const MIN: Priority = Priority(MIN_PRIORITY);
    pub const MAX: Priority = Priority(MAX_PRIORITY);

    /// Create a priority, clamping to [`MAX_PRIORITY`]
    #[inline]
    pub const fn new(level: u8) -> Self {
        if level > MAX_PRIORITY {
            Self(MAX_PRIORITY)
        } else {
            Self(level)
        }
    }

    /// Clamp to a scheduler with `levels` priority levels
    #[inline]
    pub fn clamp_to(self, levels: u8) -> Self {
        Self(self.0.min(levels.saturating_sub(1)))
    }

    #[inline(always)]
    pub const fn level(&self) -> u8 {
        self.0
    }

    #[inline(always)]
    pub(crate) const fn slot(&self) -> usize {
        self.0 as usize
    }
}

impl From<u8> for Priority {
    fn from(level: u8) -> Self {
        Self::new(level)
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Freshness of the cached selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    /// The current selection reflects every change since the last update
    UpToDate,
    /// A readiness or quota change may have invalidated the current selection
    OutOfDate,
    /// The current share gave up the rest of its quantum
    Yield,
}

impl SchedulerState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UpToDate => "up_to_date",
            Self::OutOfDate => "out_of_date",
            Self::Yield => "yield",
        }
    }
}

/// How the current share obtained the CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantKind {
    /// Guaranteed runtime from the share's claim
    Claim,
    /// Best-effort round-robin slice
    Fill,
    /// Nothing ready, the idle share runs
    Idle,
}

/// Result of a scheduling step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub share: ShareId,
    pub quantum: Tick,
    pub kind: GrantKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_clamped_on_creation() {
        assert_eq!(Priority::new(3).level(), 3);
        assert_eq!(Priority::new(200), Priority::MAX);
        assert_eq!(Priority::from(u8::MAX), Priority::MAX);
    }

    #[test]
    fn test_priority_clamp_to_levels() {
        assert_eq!(Priority::new(9).clamp_to(4).level(), 3);
        assert_eq!(Priority::new(2).clamp_to(4).level(), 2);
        assert_eq!(Priority::new(2).clamp_to(1).level(), 0);
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::new(2) > Priority::new(1));
        assert!(Priority::MIN < Priority::MAX);
    }

    #[test]
    fn test_priority_serde_as_integer() {
        let json = serde_json::to_string(&Priority::new(7)).unwrap();
        assert_eq!(json, "7");
        let back: Priority = serde_json::from_str("250").unwrap();
        assert_eq!(back, Priority::MAX);
    }
}
