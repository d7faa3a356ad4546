/*!
 * Core Types
 * Common types used across the scheduler
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Abstract time unit supplied by the caller's tick source
pub type Tick = u64;

/// Stable handle to a share tracked by a scheduler
///
/// A handle stays valid until the share is removed. The slot may be reused
/// afterwards, but with a bumped generation, so a stale handle never aliases
/// a newer share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShareId {
    index: u32,
    generation: u32,
}

impl ShareId {
    #[inline]
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Arena slot of this handle
    #[inline(always)]
    pub const fn index(&self) -> u32 {
        self.index
    }

    #[inline(always)]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ShareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "share#{}.{}", self.index, self.generation)
    }
}
