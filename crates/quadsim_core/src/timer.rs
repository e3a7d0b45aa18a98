//! Step-count based periodic triggers

use crate::error::ControlError;

/// Fires every `period` steps
///
/// The timer holds no state of its own: callers pass the step counter, so
/// several timers can share one counter and be checked before or after it
/// is incremented.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeriodicTimer {
    period: u64,
}

impl PeriodicTimer {
    pub fn new(period: u64) -> Result<Self, ControlError> {
        if period == 0 {
            return Err(ControlError::ZeroPeriod);
        }
        Ok(Self { period })
    }

    /// True when `count` is a multiple of the period (including zero)
    pub fn is_due(&self, count: u64) -> bool {
        count % self.period == 0
    }
}
