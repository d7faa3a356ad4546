/*!
 * Scheduler Configuration
 * Construction-time parameters with serde and environment overrides
 */

use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::limits::{
    DEFAULT_FILL_QUANTUM, DEFAULT_PRIORITY_LEVELS, DEFAULT_SHARE_CAPACITY, DEFAULT_SUPER_PERIOD,
    MAX_PRIORITY_LEVELS,
};
use crate::core::types::Tick;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

/// Parameters fixed for the lifetime of a scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SchedulerConfig {
    /// Number of priority levels, each with its own claim queues
    pub priority_levels: u8,
    /// Length of the window after which every claim is refilled
    pub super_period: Tick,
    /// Round-robin slice for shares without outstanding claim
    pub fill_quantum: Tick,
    /// Initial arena capacity
    pub share_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            priority_levels: DEFAULT_PRIORITY_LEVELS,
            super_period: DEFAULT_SUPER_PERIOD,
            fill_quantum: DEFAULT_FILL_QUANTUM,
            share_capacity: DEFAULT_SHARE_CAPACITY,
        }
    }
}

impl SchedulerConfig {
    pub fn new(priority_levels: u8, super_period: Tick, fill_quantum: Tick) -> Self {
        Self {
            priority_levels,
            super_period,
            fill_quantum,
            ..Self::default()
        }
    }

    pub fn with_priority_levels(mut self, levels: u8) -> Self {
        self.priority_levels = levels;
        self
    }

    pub fn with_super_period(mut self, super_period: Tick) -> Self {
        self.super_period = super_period;
        self
    }

    pub fn with_fill_quantum(mut self, fill_quantum: Tick) -> Self {
        self.fill_quantum = fill_quantum;
        self
    }

    pub fn with_share_capacity(mut self, capacity: usize) -> Self {
        self.share_capacity = capacity;
        self
    }

    /// Defaults overridden by `SCHED_*` environment variables
    ///
    /// Environment variables:
    /// - SCHED_PRIORITY_LEVELS: number of priority levels
    /// - SCHED_SUPER_PERIOD: super-period length in ticks
    /// - SCHED_FILL_QUANTUM: fill quantum in ticks
    /// - SCHED_SHARE_CAPACITY: initial arena capacity
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            priority_levels: env_or("SCHED_PRIORITY_LEVELS", defaults.priority_levels),
            super_period: env_or("SCHED_SUPER_PERIOD", defaults.super_period),
            fill_quantum: env_or("SCHED_FILL_QUANTUM", defaults.fill_quantum),
            share_capacity: env_or("SCHED_SHARE_CAPACITY", defaults.share_capacity),
        }
    }

    /// Check the configuration before a scheduler is built from it
    pub fn validate(&self) -> SchedulerResult<()> {
        if self.priority_levels == 0 || self.priority_levels > MAX_PRIORITY_LEVELS {
            return Err(SchedulerError::InvalidConfig(format!(
                "priority_levels {} must be within 1..={}",
                self.priority_levels, MAX_PRIORITY_LEVELS
            )));
        }
        if self.super_period == 0 {
            return Err(SchedulerError::InvalidConfig(
                "super_period must be non-zero".into(),
            ));
        }
        if self.fill_quantum == 0 {
            return Err(SchedulerError::InvalidConfig(
                "fill_quantum must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

fn env_or<T: FromStr + Copy>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "ignoring unparseable scheduler setting");
            default
        }),
        Err(_) => default,
    }
}
