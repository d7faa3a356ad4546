/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use super::types::ShareId;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scheduler errors with serialization support
///
/// Only construction and lookup failures are reported through this type.
/// Violating a documented call precondition is a kernel bug and panics.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SchedulerError {
    #[error("Invalid scheduler configuration: {0}")]
    #[diagnostic(
        code(scheduler::invalid_config),
        help("Priority levels must be within 1..=128 and both periods must be non-zero.")
    )]
    InvalidConfig(String),

    #[error("Share {0} is not tracked by this scheduler")]
    #[diagnostic(
        code(scheduler::unknown_share),
        help("The share may have been removed. Handles are not reusable after removal.")
    )]
    UnknownShare(ShareId),

    #[error("Operation not permitted on the idle share: {0}")]
    #[diagnostic(
        code(scheduler::idle_share),
        help("The idle share is permanent and never ready, unready, removed or re-quoted.")
    )]
    IdleShare(String),

    #[error("Scheduler contract violated: {0}")]
    #[diagnostic(
        code(scheduler::contract),
        help("Check the readiness state of the share before issuing this call.")
    )]
    Contract(String),
}

/// Result type for fallible scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = SchedulerError::InvalidConfig("fill_quantum is zero".into());
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("invalid_config"));

        let back: SchedulerError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn test_error_display() {
        let err = SchedulerError::UnknownShare(ShareId::new(4, 2));
        assert_eq!(err.to_string(), "Share share#4.2 is not tracked by this scheduler");
    }
}
