//! Same-day half-open time windows.

use chrono::{NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

use super::SchedulingValidationError;

/// A `[start, end)` interval within one day.
///
/// # Examples
/// ```
/// use chrono::NaiveTime;
/// use carerota::domain::TimeWindow;
///
/// let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
/// let five = NaiveTime::from_hms_opt(17, 0, 0).unwrap();
/// let window = TimeWindow::new(nine, five).unwrap();
/// assert_eq!(window.duration().num_hours(), 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WindowDto", into = "WindowDto")]
pub struct TimeWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeWindow {
    /// Build a window, rejecting empty or inverted ranges.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, SchedulingValidationError> {
        if start >= end {
            return Err(SchedulingValidationError::EmptyTimeWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Inclusive start.
    pub const fn start(&self) -> NaiveTime {
        self.start
    }

    /// Exclusive end.
    pub const fn end(&self) -> NaiveTime {
        self.end
    }

    /// Length of the window.
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Half-open overlap: touching boundaries do not overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Whether `other` lies entirely inside this window.
    pub fn contains(&self, other: &Self) -> bool {
        other.start >= self.start && other.end <= self.end
    }
}

#[derive(Serialize, Deserialize)]
struct WindowDto {
    start: NaiveTime,
    end: NaiveTime,
}

impl From<TimeWindow> for WindowDto {
    fn from(value: TimeWindow) -> Self {
        Self {
            start: value.start,
            end: value.end,
        }
    }
}

impl TryFrom<WindowDto> for TimeWindow {
    type Error = SchedulingValidationError;

    fn try_from(value: WindowDto) -> Result<Self, Self::Error> {
        Self::new(value.start, value.end)
    }
}
