//! Time clock events.
//!
//! Entries are append-only. A correction is a new entry pointing at the one it
//! corrects and carrying an audit note; the original row is never touched.
//! Administrative corrections take no part in open-session accounting.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::domain::text_enum::define_text_enum;
use crate::domain::{OrganizationId, ShiftId, StaffId, TimeEntryId, UserId};

define_text_enum! {
    /// Kind of time clock event.
    pub enum TimeEntryType parse ParseTimeEntryTypeError as "time entry type" {
        /// Session start.
        ClockIn => "clock_in",
        /// Session end.
        ClockOut => "clock_out",
        /// Rest break start.
        BreakStart => "break_start",
        /// Rest break end.
        BreakEnd => "break_end",
        /// Meal start.
        MealStart => "meal_start",
        /// Meal end.
        MealEnd => "meal_end",
    }
}

define_text_enum! {
    /// Interval that an opening event leaves open until its closing event.
    pub enum ClockIntervalKind parse ParseClockIntervalKindError as "clock interval kind" {
        /// Worked session bounded by clock-in and clock-out.
        Work => "work",
        /// Rest break.
        RestBreak => "rest_break",
        /// Meal.
        Meal => "meal",
    }
}

define_text_enum! {
    /// Break flavour accepted by the break operations.
    pub enum BreakKind parse ParseBreakKindError as "break kind" {
        /// Paid rest break.
        Rest => "rest",
        /// Meal period.
        Meal => "meal",
    }
}

impl BreakKind {
    /// Entry type opening this kind of break.
    pub const fn start_type(self) -> TimeEntryType {
        match self {
            Self::Rest => TimeEntryType::BreakStart,
            Self::Meal => TimeEntryType::MealStart,
        }
    }

    /// Entry type closing this kind of break.
    pub const fn end_type(self) -> TimeEntryType {
        match self {
            Self::Rest => TimeEntryType::BreakEnd,
            Self::Meal => TimeEntryType::MealEnd,
        }
    }

    /// Interval tracked while the break is open.
    pub const fn interval(self) -> ClockIntervalKind {
        match self {
            Self::Rest => ClockIntervalKind::RestBreak,
            Self::Meal => ClockIntervalKind::Meal,
        }
    }
}

/// Validation errors raised by time clock constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeClockValidationError {
    /// An event is not later than the staff member's latest event.
    OutOfOrder {
        /// Proposed event time.
        at: DateTime<Utc>,
        /// Latest recorded event time.
        latest: DateTime<Utc>,
    },
    /// Adjustments must explain themselves.
    BlankAdjustmentReason,
}

impl fmt::Display for TimeClockValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfOrder { at, latest } => write!(
                f,
                "clock event at {at} must be later than the latest entry at {latest}"
            ),
            Self::BlankAdjustmentReason => write!(f, "adjustment reason must not be blank"),
        }
    }
}

impl std::error::Error for TimeClockValidationError {}

/// Input payload for [`TimeClockEntry::new`].
#[derive(Debug, Clone)]
pub struct TimeClockEntryDraft {
    pub id: TimeEntryId,
    pub organization_id: OrganizationId,
    pub staff_id: StaffId,
    pub shift_id: Option<ShiftId>,
    pub entry_type: TimeEntryType,
    pub recorded_at: DateTime<Utc>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub corrects_entry_id: Option<TimeEntryId>,
    pub recorded_by: UserId,
}

/// One timestamped attendance event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeClockEntry {
    id: TimeEntryId,
    organization_id: OrganizationId,
    staff_id: StaffId,
    shift_id: Option<ShiftId>,
    entry_type: TimeEntryType,
    recorded_at: DateTime<Utc>,
    location: Option<String>,
    notes: Option<String>,
    corrects_entry_id: Option<TimeEntryId>,
    recorded_by: UserId,
}

impl TimeClockEntry {
    pub fn new(draft: TimeClockEntryDraft) -> Self {
        Self {
            id: draft.id,
            organization_id: draft.organization_id,
            staff_id: draft.staff_id,
            shift_id: draft.shift_id,
            entry_type: draft.entry_type,
            recorded_at: draft.recorded_at,
            location: draft.location,
            notes: draft.notes,
            corrects_entry_id: draft.corrects_entry_id,
            recorded_by: draft.recorded_by,
        }
    }

    pub fn id(&self) -> TimeEntryId {
        self.id
    }

    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    pub fn staff_id(&self) -> StaffId {
        self.staff_id
    }

    pub fn shift_id(&self) -> Option<ShiftId> {
        self.shift_id
    }

    pub fn entry_type(&self) -> TimeEntryType {
        self.entry_type
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn corrects_entry_id(&self) -> Option<TimeEntryId> {
        self.corrects_entry_id
    }

    pub fn recorded_by(&self) -> UserId {
        self.recorded_by
    }

    /// Administrative corrections are excluded from session accounting.
    pub fn is_adjustment(&self) -> bool {
        self.corrects_entry_id.is_some()
    }

    /// Append-only correction of this entry's timestamp.
    pub fn adjustment(
        &self,
        id: TimeEntryId,
        corrected_at: DateTime<Utc>,
        administrator: UserId,
        reason: &str,
    ) -> Result<Self, TimeClockValidationError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(TimeClockValidationError::BlankAdjustmentReason);
        }
        Ok(Self {
            id,
            recorded_at: corrected_at,
            notes: Some(format!(
                "Adjusted from {} to {} by {administrator}: {reason}",
                self.recorded_at.to_rfc3339(),
                corrected_at.to_rfc3339(),
            )),
            corrects_entry_id: Some(self.id),
            recorded_by: administrator,
            ..self.clone()
        })
    }
}

/// Reject events that would not extend the staff member's timeline.
pub fn ensure_strictly_after(
    latest: Option<DateTime<Utc>>,
    at: DateTime<Utc>,
) -> Result<(), TimeClockValidationError> {
    match latest {
        Some(latest) if at <= latest => Err(TimeClockValidationError::OutOfOrder { at, latest }),
        _ => Ok(()),
    }
}
