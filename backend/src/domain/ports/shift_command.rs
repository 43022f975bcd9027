//! Driving port for schedules, shifts and their conflicts.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

use crate::domain::{
    Actor, ClientId, ConflictId, DocumentType, Error, Schedule, ScheduleConflict, ScheduleId,
    SchedulingValidationError, Shift, ShiftId, ShiftType, StaffId, TimeWindow,
};

use super::ConflictFilter;

/// Raw shift times as submitted by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftTimes {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub break_window: Option<(NaiveTime, NaiveTime)>,
    pub meal_window: Option<(NaiveTime, NaiveTime)>,
}

/// Validated windows built from [`ShiftTimes`].
pub(crate) struct ShiftWindows {
    pub window: TimeWindow,
    pub break_window: Option<TimeWindow>,
    pub meal_window: Option<TimeWindow>,
}

impl ShiftTimes {
    /// Working window without breaks.
    pub const fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            start,
            end,
            break_window: None,
            meal_window: None,
        }
    }

    pub(crate) fn validate(self) -> Result<ShiftWindows, SchedulingValidationError> {
        let optional = |pair: Option<(NaiveTime, NaiveTime)>| {
            pair.map(|(start, end)| TimeWindow::new(start, end))
                .transpose()
        };
        Ok(ShiftWindows {
            window: TimeWindow::new(self.start, self.end)?,
            break_window: optional(self.break_window)?,
            meal_window: optional(self.meal_window)?,
        })
    }
}

/// Request to open a draft schedule.
#[derive(Debug, Clone)]
pub struct CreateScheduleRequest {
    pub actor: Actor,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub notes: Option<String>,
}

/// Request to publish a draft schedule.
#[derive(Debug, Clone, Copy)]
pub struct PublishScheduleRequest {
    pub actor: Actor,
    pub schedule_id: ScheduleId,
}

/// Request to copy a schedule and its live shifts to a new start date.
#[derive(Debug, Clone)]
pub struct CopyScheduleRequest {
    pub actor: Actor,
    pub schedule_id: ScheduleId,
    pub new_start_date: NaiveDate,
    /// Defaults to the source name with " (Copy)" appended.
    pub new_name: Option<String>,
}

/// Copied schedule and the shifts created in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyScheduleResponse {
    pub schedule: Schedule,
    pub shifts: Vec<Shift>,
}

/// Request to add a shift to a schedule.
#[derive(Debug, Clone)]
pub struct CreateShiftRequest {
    pub actor: Actor,
    pub schedule_id: ScheduleId,
    pub staff_id: StaffId,
    pub client_id: Option<ClientId>,
    pub date: NaiveDate,
    pub times: ShiftTimes,
    pub shift_type: ShiftType,
    pub notes: Option<String>,
    pub required_documentation: Option<Vec<DocumentType>>,
}

/// One shift in a bulk creation request.
#[derive(Debug, Clone)]
pub struct ShiftSpec {
    pub staff_id: StaffId,
    pub client_id: Option<ClientId>,
    pub date: NaiveDate,
    pub times: ShiftTimes,
    pub shift_type: ShiftType,
    pub notes: Option<String>,
    pub required_documentation: Option<Vec<DocumentType>>,
}

/// Request to add several shifts to one schedule at once.
#[derive(Debug, Clone)]
pub struct CreateShiftsRequest {
    pub actor: Actor,
    pub schedule_id: ScheduleId,
    pub shifts: Vec<ShiftSpec>,
}

/// Outcome of a bulk creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateShiftsResponse {
    /// Stored shifts in request order.
    pub created: Vec<Shift>,
    /// Staff the directory did not know; their shifts were left out.
    pub skipped_staff: Vec<StaffId>,
}

/// Request to replace a shift's editable attributes.
#[derive(Debug, Clone)]
pub struct UpdateShiftRequest {
    pub actor: Actor,
    pub shift_id: ShiftId,
    pub client_id: Option<ClientId>,
    pub date: NaiveDate,
    pub times: ShiftTimes,
    pub shift_type: ShiftType,
    pub notes: Option<String>,
    pub required_documentation: Option<Vec<DocumentType>>,
}

/// Request to cancel a shift that has not started.
#[derive(Debug, Clone)]
pub struct CancelShiftRequest {
    pub actor: Actor,
    pub shift_id: ShiftId,
    pub reason: Option<String>,
}

/// Request to run conflict detection for one shift.
#[derive(Debug, Clone, Copy)]
pub struct DetectConflictsRequest {
    pub actor: Actor,
    pub shift_id: ShiftId,
}

/// Result of an explicit detection run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectConflictsResponse {
    /// Conflicts written by this run, on the shift or its peers.
    pub recorded: Vec<ScheduleConflict>,
    /// Every unresolved conflict on the shift after the run.
    pub unresolved: Vec<ScheduleConflict>,
}

/// Request to list conflicts.
#[derive(Debug, Clone, Copy)]
pub struct ListConflictsRequest {
    pub actor: Actor,
    pub filter: ConflictFilter,
}

/// Request to mark a conflict resolved.
#[derive(Debug, Clone)]
pub struct ResolveConflictRequest {
    pub actor: Actor,
    pub conflict_id: ConflictId,
    pub notes: Option<String>,
}

/// Schedule and shift mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShiftCommand: Send + Sync {
    async fn create_schedule(&self, request: CreateScheduleRequest) -> Result<Schedule, Error>;

    async fn publish_schedule(&self, request: PublishScheduleRequest) -> Result<Schedule, Error>;

    async fn copy_schedule(
        &self,
        request: CopyScheduleRequest,
    ) -> Result<CopyScheduleResponse, Error>;

    async fn create_shift(&self, request: CreateShiftRequest) -> Result<Shift, Error>;

    /// Shifts for unknown staff are skipped; any other invalid entry
    /// rejects the whole batch.
    async fn create_shifts(
        &self,
        request: CreateShiftsRequest,
    ) -> Result<CreateShiftsResponse, Error>;

    async fn update_shift(&self, request: UpdateShiftRequest) -> Result<Shift, Error>;

    async fn cancel_shift(&self, request: CancelShiftRequest) -> Result<Shift, Error>;

    async fn detect_conflicts(
        &self,
        request: DetectConflictsRequest,
    ) -> Result<DetectConflictsResponse, Error>;

    async fn list_conflicts(
        &self,
        request: ListConflictsRequest,
    ) -> Result<Vec<ScheduleConflict>, Error>;

    async fn resolve_conflict(
        &self,
        request: ResolveConflictRequest,
    ) -> Result<ScheduleConflict, Error>;
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    fn time(hour: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, 0, 0).expect("valid time")
    }

    #[rstest]
    fn times_validate_every_window() {
        let times = ShiftTimes {
            break_window: Some((time(12), time(11))),
            ..ShiftTimes::new(time(9), time(17))
        };
        assert!(matches!(
            times.validate(),
            Err(SchedulingValidationError::EmptyTimeWindow { .. })
        ));
    }

    #[rstest]
    fn plain_times_produce_a_single_window() {
        let windows = ShiftTimes::new(time(9), time(17))
            .validate()
            .expect("valid times");
        assert_eq!(windows.window.start(), time(9));
        assert!(windows.break_window.is_none());
        assert!(windows.meal_window.is_none());
    }
}
