/*!
 * Share Record
 * Per-context scheduling state borrowed by the scheduler
 */

use super::types::Priority;
use crate::core::types::Tick;

/// Scheduling record of one execution context
///
/// Pure data. The scheduler keeps `claim <= quota`, and keeps the share in a
/// claim queue exactly while `quota != 0` and in the fill queue exactly while
/// it is ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Share {
    pub(crate) priority: Priority,
    pub(crate) quota: Tick,
    pub(crate) claim: Tick,
    pub(crate) fill: Tick,
    pub(crate) ready: bool,
}

impl Share {
    /// Create an unready share with the given priority and quota
    pub fn new(priority: impl Into<Priority>, quota: Tick) -> Self {
        Self {
            priority: priority.into(),
            quota,
            claim: 0,
            fill: 0,
            ready: false,
        }
    }

    #[inline(always)]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Guaranteed runtime per super-period, 0 for none
    #[inline(always)]
    pub fn quota(&self) -> Tick {
        self.quota
    }

    /// Guaranteed runtime still owed in the running super-period
    #[inline(always)]
    pub fn claim(&self) -> Tick {
        self.claim
    }

    /// Remaining round-robin allowance
    #[inline(always)]
    pub fn fill(&self) -> Tick {
        self.fill
    }

    #[inline(always)]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    #[inline(always)]
    pub(crate) fn has_claim(&self) -> bool {
        self.quota != 0 && self.claim != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_share_is_unready_without_claim() {
        let share = Share::new(2, 230);
        assert_eq!(share.priority().level(), 2);
        assert_eq!(share.quota(), 230);
        assert_eq!(share.claim(), 0);
        assert!(!share.is_ready());
        assert!(!share.has_claim());
    }
}
