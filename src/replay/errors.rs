/*!
 * Replay Errors
 */

use super::script::Label;
use crate::core::errors::SchedulerError;
use crate::core::types::Tick;
use miette::Diagnostic;
use thiserror::Error;

/// Failures while loading or running a replay script
#[derive(Error, Debug, Diagnostic)]
pub enum ReplayError {
    #[error("Failed to read script {path}")]
    #[diagnostic(code(replay::io), help("Check that the script path exists and is readable."))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed replay script: {0}")]
    #[diagnostic(
        code(replay::parse),
        help("Each step needs an \"op\" of create, destroy, ready, unready, quota, yield or update.")
    )]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("Step {step}: share {label} does not exist")]
    #[diagnostic(code(replay::unknown_share))]
    UnknownShare { step: usize, label: Label },

    #[error("Step {step}: share {label} already exists")]
    #[diagnostic(code(replay::duplicate_share))]
    DuplicateShare { step: usize, label: Label },

    #[error("Step {step}: {reason}")]
    #[diagnostic(
        code(replay::precondition),
        help("The scheduler would treat this call as a kernel bug.")
    )]
    Precondition { step: usize, reason: String },

    #[error("Step {step}: invalid step: {reason}")]
    #[diagnostic(code(replay::invalid_step))]
    InvalidStep { step: usize, reason: String },

    #[error("Step {step}: expected share {expected_share} with quantum {expected_quantum:?}, got share {share} with quantum {quantum}")]
    #[diagnostic(code(replay::mismatch))]
    Mismatch {
        step: usize,
        expected_share: Label,
        expected_quantum: Option<Tick>,
        share: Label,
        quantum: Tick,
    },

    #[error("Step {step}: expected ready to report outdated = {expected}")]
    #[diagnostic(code(replay::outdate_mismatch))]
    OutdateMismatch { step: usize, expected: bool },
}

pub type ReplayResult<T> = Result<T, ReplayError>;
