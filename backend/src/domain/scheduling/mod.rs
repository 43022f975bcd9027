//! Schedules, shifts and the time windows they are built from.
//!
//! A schedule is a date-ranged container; shifts are same-day work intervals
//! owned by one staff member. Shifts crossing midnight are rejected because
//! the window must satisfy `start < end` on a single date.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};

mod schedule;
mod shift;
mod window;

pub use schedule::{ParseScheduleStatusError, Schedule, ScheduleDraft, ScheduleStatus};
pub use shift::{
    ParseShiftStatusError, ParseShiftTypeError, Shift, ShiftChanges, ShiftDraft, ShiftStatus,
    ShiftType, ShiftUpdateError, ShiftWrite,
};
pub use window::TimeWindow;

/// Validation errors raised by schedule and shift constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulingValidationError {
    /// Schedule name was blank once trimmed.
    BlankScheduleName,
    /// Schedule end date precedes its start date.
    ScheduleEndsBeforeStart {
        /// First day of the schedule.
        start: NaiveDate,
        /// Last day of the schedule.
        end: NaiveDate,
    },
    /// A window's start is not strictly before its end.
    EmptyTimeWindow {
        /// Window start.
        start: NaiveTime,
        /// Window end.
        end: NaiveTime,
    },
    /// The break window leaves the shift bounds.
    BreakOutsideShift,
    /// The meal window leaves the shift bounds.
    MealOutsideShift,
    /// The shift date falls outside the owning schedule's range.
    ShiftOutsideSchedule {
        /// Shift date.
        date: NaiveDate,
        /// First day of the schedule.
        start: NaiveDate,
        /// Last day of the schedule.
        end: NaiveDate,
    },
}

impl fmt::Display for SchedulingValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlankScheduleName => write!(f, "schedule name must not be blank"),
            Self::ScheduleEndsBeforeStart { start, end } => write!(
                f,
                "schedule end date {end} must not precede start date {start}"
            ),
            Self::EmptyTimeWindow { start, end } => write!(
                f,
                "window start {start} must be before end {end}; shifts crossing midnight are not supported"
            ),
            Self::BreakOutsideShift => write!(f, "break window must lie within the shift"),
            Self::MealOutsideShift => write!(f, "meal window must lie within the shift"),
            Self::ShiftOutsideSchedule { date, start, end } => write!(
                f,
                "shift date {date} lies outside the schedule range {start}..={end}"
            ),
        }
    }
}

impl std::error::Error for SchedulingValidationError {}
