/*!
 * CPU Share Scheduler Library
 * Per-CPU proportional-share scheduling core exposed as a library
 */

pub mod core;
pub mod monitoring;
pub mod replay;
pub mod scheduler;

// Re-exports
pub use crate::core::{ShareId, SchedulerError, SchedulerResult, Tick};
pub use monitoring::{init_tracing, span_replay};
pub use replay::{ReplayError, ReplayRecord, ReplayScript, Replayer, Step};
pub use scheduler::{
    CpuSchedulers, Grant, GrantKind, ManualClock, MonotonicClock, Priority, Scheduler,
    SchedulerConfig, SchedulerState, SchedulerStats, Share, ShareSnapshot, TickSource,
};
