/*!
 * Time Source Traits
 * Interface definitions for the tick source driving scheduling steps
 */

use crate::core::types::Tick;
use std::cell::Cell;
use std::time::Instant;

/// Monotonic tick source consumed by [`Scheduler::update_from`]
///
/// Ticks must use the same unit as the configured super-period and fill
/// quantum. Wraparound handling is the implementor's responsibility.
///
/// [`Scheduler::update_from`]: super::Scheduler::update_from
pub trait TickSource {
    /// Current absolute tick count
    fn now(&self) -> Tick;
}

impl<T: TickSource + ?Sized> TickSource for &T {
    fn now(&self) -> Tick {
        (**self).now()
    }
}

/// Tick source advanced explicitly by its owner
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Tick>,
}

impl ManualClock {
    pub fn new(start: Tick) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Move time forward and return the new tick count
    pub fn advance(&self, ticks: Tick) -> Tick {
        let now = self.now.get().saturating_add(ticks);
        self.now.set(now);
        now
    }

    /// Jump to an absolute tick count, never moving backwards
    pub fn set(&self, now: Tick) -> Tick {
        let now = now.max(self.now.get());
        self.now.set(now);
        now
    }
}

impl TickSource for ManualClock {
    fn now(&self) -> Tick {
        self.now.get()
    }
}

/// Microseconds elapsed since the clock was created
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for MonotonicClock {
    fn now(&self) -> Tick {
        self.origin.elapsed().as_micros() as Tick
    }
}
