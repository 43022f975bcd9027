//! Shift entities and their status transitions.

use chrono::NaiveDate;

use crate::domain::text_enum::define_text_enum;
use crate::domain::transition::InvalidTransition;
use crate::domain::{ClientId, DocumentType, OrganizationId, ScheduleId, ShiftId, StaffId};

use super::{SchedulingValidationError, TimeWindow};

define_text_enum! {
    /// Lifecycle of a shift from scheduling to completion.
    pub enum ShiftStatus parse ParseShiftStatusError as "shift status" {
        /// Assigned and waiting.
        Scheduled => "scheduled",
        /// Acknowledged by the staff member.
        Confirmed => "confirmed",
        /// Staff member has clocked in.
        InProgress => "in_progress",
        /// Clock-out passed the compliance gate.
        Completed => "completed",
        /// Withdrawn before it started.
        Cancelled => "cancelled",
        /// Staff member never attended.
        NoShow => "no_show",
    }
}

impl ShiftStatus {
    /// Cancelled shifts take no part in conflict detection.
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// Shifts that have not started yet may be edited, swapped or cancelled.
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Scheduled | Self::Confirmed)
    }
}

define_text_enum! {
    /// Pay classification of a shift.
    pub enum ShiftType parse ParseShiftTypeError as "shift type" {
        /// Standard hours.
        Regular => "regular",
        /// Pre-approved overtime.
        Overtime => "overtime",
        /// Public holiday.
        Holiday => "holiday",
        /// Standby.
        OnCall => "on_call",
        /// One part of a split shift.
        Split => "split",
    }
}

/// Input payload for [`Shift::new`].
#[derive(Debug, Clone)]
pub struct ShiftDraft {
    pub id: ShiftId,
    pub organization_id: OrganizationId,
    pub schedule_id: ScheduleId,
    pub staff_id: StaffId,
    pub client_id: Option<ClientId>,
    pub date: NaiveDate,
    pub window: TimeWindow,
    pub break_window: Option<TimeWindow>,
    pub meal_window: Option<TimeWindow>,
    pub status: ShiftStatus,
    pub shift_type: ShiftType,
    pub notes: Option<String>,
    /// Shift-level documentation override for the compliance gate.
    pub required_documentation: Option<Vec<DocumentType>>,
}

/// Replacement values for the editable attributes of a shift.
///
/// Ownership is absent: it only changes through an approved swap.
#[derive(Debug, Clone)]
pub struct ShiftChanges {
    pub client_id: Option<ClientId>,
    pub date: NaiveDate,
    pub window: TimeWindow,
    pub break_window: Option<TimeWindow>,
    pub meal_window: Option<TimeWindow>,
    pub shift_type: ShiftType,
    pub notes: Option<String>,
    pub required_documentation: Option<Vec<DocumentType>>,
}

/// A same-day work interval owned by one staff member.
///
/// ## Invariants
/// - `window.start < window.end` (no midnight crossing).
/// - Break and meal windows lie within `window`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shift {
    id: ShiftId,
    organization_id: OrganizationId,
    schedule_id: ScheduleId,
    staff_id: StaffId,
    client_id: Option<ClientId>,
    date: NaiveDate,
    window: TimeWindow,
    break_window: Option<TimeWindow>,
    meal_window: Option<TimeWindow>,
    status: ShiftStatus,
    shift_type: ShiftType,
    notes: Option<String>,
    required_documentation: Option<Vec<DocumentType>>,
}

impl Shift {
    /// Creates a validated shift.
    pub fn new(draft: ShiftDraft) -> Result<Self, SchedulingValidationError> {
        Self::try_from(draft)
    }

    pub fn id(&self) -> ShiftId {
        self.id
    }

    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    pub fn schedule_id(&self) -> ScheduleId {
        self.schedule_id
    }

    pub fn staff_id(&self) -> StaffId {
        self.staff_id
    }

    pub fn client_id(&self) -> Option<ClientId> {
        self.client_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn break_window(&self) -> Option<TimeWindow> {
        self.break_window
    }

    pub fn meal_window(&self) -> Option<TimeWindow> {
        self.meal_window
    }

    pub fn status(&self) -> ShiftStatus {
        self.status
    }

    pub fn shift_type(&self) -> ShiftType {
        self.shift_type
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn required_documentation(&self) -> Option<&[DocumentType]> {
        self.required_documentation.as_deref()
    }

    /// Whether two shifts collide: same staff, same date, overlapping windows.
    pub fn collides_with(&self, other: &Self) -> bool {
        self.id != other.id
            && self.staff_id == other.staff_id
            && self.date == other.date
            && self.status.is_active()
            && other.status.is_active()
            && self.window.overlaps(&other.window)
    }

    /// Replace the editable attributes, re-validating every window.
    pub fn apply_changes(&self, changes: ShiftChanges) -> Result<Self, ShiftUpdateError> {
        if !self.status.is_pending() {
            return Err(ShiftUpdateError::State(InvalidTransition::new(
                "shift",
                "update",
                self.status.as_str(),
            )));
        }
        let updated = Self::new(ShiftDraft {
            id: self.id,
            organization_id: self.organization_id,
            schedule_id: self.schedule_id,
            staff_id: self.staff_id,
            client_id: changes.client_id,
            date: changes.date,
            window: changes.window,
            break_window: changes.break_window,
            meal_window: changes.meal_window,
            status: self.status,
            shift_type: changes.shift_type,
            notes: changes.notes,
            required_documentation: changes.required_documentation,
        })?;
        Ok(updated)
    }

    /// Withdraw a shift that has not started.
    pub fn cancel(&self) -> Result<Self, InvalidTransition> {
        self.transition("cancel", ShiftStatus::is_pending, ShiftStatus::Cancelled)
    }

    /// Enter the shift on clock-in.
    pub fn start(&self) -> Result<Self, InvalidTransition> {
        self.transition("start", ShiftStatus::is_pending, ShiftStatus::InProgress)
    }

    /// Close the shift after a successful clock-out.
    pub fn complete(&self) -> Result<Self, InvalidTransition> {
        self.transition(
            "complete",
            |status| status == ShiftStatus::InProgress,
            ShiftStatus::Completed,
        )
    }

    /// Copy this shift into another schedule, `offset` days later.
    pub fn copy_into(
        &self,
        id: ShiftId,
        schedule_id: ScheduleId,
        offset: chrono::TimeDelta,
    ) -> Result<Self, SchedulingValidationError> {
        Self::new(ShiftDraft {
            id,
            organization_id: self.organization_id,
            schedule_id,
            staff_id: self.staff_id,
            client_id: self.client_id,
            date: self.date + offset,
            window: self.window,
            break_window: self.break_window,
            meal_window: self.meal_window,
            status: ShiftStatus::Scheduled,
            shift_type: self.shift_type,
            notes: self.notes.clone(),
            required_documentation: self.required_documentation.clone(),
        })
    }

    /// Hand the shift to a new owner. Only swap approval calls this.
    pub(crate) fn reassigned_to(&self, staff_id: StaffId) -> Self {
        Self {
            staff_id,
            ..self.clone()
        }
    }

    fn transition(
        &self,
        action: &'static str,
        allowed: impl Fn(ShiftStatus) -> bool,
        next: ShiftStatus,
    ) -> Result<Self, InvalidTransition> {
        if !allowed(self.status) {
            return Err(InvalidTransition::new("shift", action, self.status.as_str()));
        }
        Ok(Self {
            status: next,
            ..self.clone()
        })
    }
}

/// A shift write that only applies while storage still holds the owner and
/// status it was derived from.
///
/// Adapters compare `expected_staff` and `expected_status` against the stored
/// row and reject the write when either moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftWrite {
    shift: Shift,
    expected_staff: StaffId,
    expected_status: ShiftStatus,
}

impl ShiftWrite {
    /// Replace `previous` with `next`, guarded by `previous`'s owner and status.
    pub fn replacing(previous: &Shift, next: Shift) -> Self {
        Self {
            shift: next,
            expected_staff: previous.staff_id,
            expected_status: previous.status,
        }
    }

    /// Shift to store.
    pub fn shift(&self) -> &Shift {
        &self.shift
    }

    /// Owner the stored row must still have.
    pub fn expected_staff(&self) -> StaffId {
        self.expected_staff
    }

    /// Status the stored row must still have.
    pub fn expected_status(&self) -> ShiftStatus {
        self.expected_status
    }

    pub fn into_shift(self) -> Shift {
        self.shift
    }
}

/// Rejections raised by [`Shift::apply_changes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShiftUpdateError {
    /// The shift is no longer editable.
    State(InvalidTransition),
    /// The new values break a shift invariant.
    Validation(SchedulingValidationError),
}

impl From<SchedulingValidationError> for ShiftUpdateError {
    fn from(value: SchedulingValidationError) -> Self {
        Self::Validation(value)
    }
}

impl std::fmt::Display for ShiftUpdateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::State(err) => err.fmt(f),
            Self::Validation(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for ShiftUpdateError {}

impl TryFrom<ShiftDraft> for Shift {
    type Error = SchedulingValidationError;

    fn try_from(draft: ShiftDraft) -> Result<Self, Self::Error> {
        if draft
            .break_window
            .is_some_and(|window| !draft.window.contains(&window))
        {
            return Err(SchedulingValidationError::BreakOutsideShift);
        }
        if draft
            .meal_window
            .is_some_and(|window| !draft.window.contains(&window))
        {
            return Err(SchedulingValidationError::MealOutsideShift);
        }

        Ok(Self {
            id: draft.id,
            organization_id: draft.organization_id,
            schedule_id: draft.schedule_id,
            staff_id: draft.staff_id,
            client_id: draft.client_id,
            date: draft.date,
            window: draft.window,
            break_window: draft.break_window,
            meal_window: draft.meal_window,
            status: draft.status,
            shift_type: draft.shift_type,
            notes: draft.notes,
            required_documentation: draft.required_documentation,
        })
    }
}
