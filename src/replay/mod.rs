/*!
 * Replay Module
 * Scripted kernel passes for exercising a scheduler outside the kernel
 */

pub mod errors;
pub mod runner;
pub mod script;

pub use errors::{ReplayError, ReplayResult};
pub use runner::{ReplayRecord, Replayer};
pub use script::{Expectation, Label, ReplayScript, Step, IDLE_LABEL};
