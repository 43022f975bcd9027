//! Diesel row structs and their translation to domain entities.
//!
//! Rows never leave the persistence module. Reading a row rebuilds the entity
//! through its validating constructor, so a row that no longer satisfies the
//! entity's invariants surfaces as a [`RowMappingError`] instead of a
//! half-valid value.

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    AvailabilityType, ClientId, ConflictSeverity, ConflictType, DocumentType, OrganizationId,
    Schedule, ScheduleConflict, ScheduleDraft, ScheduleId, ScheduleStatus, Shift, ShiftDraft,
    ShiftId, ShiftStatus, ShiftType, StaffAvailability, StaffAvailabilityDraft, StaffId,
    TimeWindow, UserId, iso_weekday_number, weekday_from_iso_number,
};

use super::schema::{schedule_conflicts, schedules, shifts, staff_availability};

mod appointment_rows;
mod attendance_rows;

pub(crate) use appointment_rows::{AppointmentRecord, TemplateRecord, TemplateRow};
pub(crate) use attendance_rows::{
    CoverageRecord, CoverageRow, OpenIntervalRecord, OvertimeRecordRow, OvertimeRecordValues,
    SwapRecord, SwapRow, TimeEntryRecord, TimeEntryRow,
};

/// A stored row that cannot be turned into a domain value, or a domain value
/// that does not fit its column.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{table} row {id}: {message}")]
pub(crate) struct RowMappingError {
    table: &'static str,
    id: Uuid,
    message: String,
}

impl RowMappingError {
    pub(crate) fn new(table: &'static str, id: Uuid, message: impl Display) -> Self {
        Self {
            table,
            id,
            message: message.to_string(),
        }
    }
}

/// Parse a text enum column.
pub(crate) fn parse_column<T>(table: &'static str, id: Uuid, value: &str) -> Result<T, RowMappingError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|err| RowMappingError::new(table, id, err))
}

fn window(
    table: &'static str,
    id: Uuid,
    start: NaiveTime,
    end: NaiveTime,
) -> Result<TimeWindow, RowMappingError> {
    TimeWindow::new(start, end).map_err(|err| RowMappingError::new(table, id, err))
}

/// Both bounds or neither.
fn optional_window(
    table: &'static str,
    id: Uuid,
    start: Option<NaiveTime>,
    end: Option<NaiveTime>,
) -> Result<Option<TimeWindow>, RowMappingError> {
    match (start, end) {
        (Some(start), Some(end)) => window(table, id, start, end).map(Some),
        (None, None) => Ok(None),
        _ => Err(RowMappingError::new(table, id, "window has only one bound")),
    }
}

// ---------------------------------------------------------------------------
// Schedules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = schedules)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ScheduleRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl TryFrom<ScheduleRow> for Schedule {
    type Error = RowMappingError;

    fn try_from(row: ScheduleRow) -> Result<Self, Self::Error> {
        let status: ScheduleStatus = parse_column("schedules", row.id, &row.status)?;
        Schedule::new(ScheduleDraft {
            id: ScheduleId::from_uuid(row.id),
            organization_id: OrganizationId::from_uuid(row.organization_id),
            name: row.name,
            start_date: row.start_date,
            end_date: row.end_date,
            status,
            notes: row.notes,
            created_by: UserId::from_uuid(row.created_by),
            approved_by: row.approved_by.map(UserId::from_uuid),
            approved_at: row.approved_at,
        })
        .map_err(|err| RowMappingError::new("schedules", row.id, err))
    }
}

/// Insert and full-update payload for `schedules`.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = schedules)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ScheduleRecord<'a> {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: &'a str,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: &'static str,
    pub notes: Option<&'a str>,
    pub created_by: Uuid,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl<'a> From<&'a Schedule> for ScheduleRecord<'a> {
    fn from(schedule: &'a Schedule) -> Self {
        Self {
            id: *schedule.id().as_uuid(),
            organization_id: *schedule.organization_id().as_uuid(),
            name: schedule.name(),
            start_date: schedule.start_date(),
            end_date: schedule.end_date(),
            status: schedule.status().as_str(),
            notes: schedule.notes(),
            created_by: *schedule.created_by().as_uuid(),
            approved_by: schedule.approved_by().map(|id| *id.as_uuid()),
            approved_at: schedule.approved_at(),
        }
    }
}

// ---------------------------------------------------------------------------
// Shifts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = shifts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ShiftRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub schedule_id: Uuid,
    pub staff_id: Uuid,
    pub client_id: Option<Uuid>,
    pub shift_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
    pub meal_start: Option<NaiveTime>,
    pub meal_end: Option<NaiveTime>,
    pub status: String,
    pub shift_type: String,
    pub notes: Option<String>,
    pub required_documentation: Option<Vec<String>>,
}

impl TryFrom<ShiftRow> for Shift {
    type Error = RowMappingError;

    fn try_from(row: ShiftRow) -> Result<Self, Self::Error> {
        const TABLE: &str = "shifts";
        let required_documentation = row
            .required_documentation
            .map(|values| {
                values
                    .iter()
                    .map(|value| parse_column::<DocumentType>(TABLE, row.id, value))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        Shift::new(ShiftDraft {
            id: ShiftId::from_uuid(row.id),
            organization_id: OrganizationId::from_uuid(row.organization_id),
            schedule_id: ScheduleId::from_uuid(row.schedule_id),
            staff_id: StaffId::from_uuid(row.staff_id),
            client_id: row.client_id.map(ClientId::from_uuid),
            date: row.shift_date,
            window: window(TABLE, row.id, row.start_time, row.end_time)?,
            break_window: optional_window(TABLE, row.id, row.break_start, row.break_end)?,
            meal_window: optional_window(TABLE, row.id, row.meal_start, row.meal_end)?,
            status: parse_column::<ShiftStatus>(TABLE, row.id, &row.status)?,
            shift_type: parse_column::<ShiftType>(TABLE, row.id, &row.shift_type)?,
            notes: row.notes,
            required_documentation,
        })
        .map_err(|err| RowMappingError::new(TABLE, row.id, err))
    }
}

/// Insert and full-update payload for `shifts`, owner included.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = shifts)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ShiftRecord<'a> {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub schedule_id: Uuid,
    pub staff_id: Uuid,
    pub client_id: Option<Uuid>,
    pub shift_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
    pub meal_start: Option<NaiveTime>,
    pub meal_end: Option<NaiveTime>,
    pub status: &'static str,
    pub shift_type: &'static str,
    pub notes: Option<&'a str>,
    pub required_documentation: Option<Vec<&'static str>>,
}

impl<'a> From<&'a Shift> for ShiftRecord<'a> {
    fn from(shift: &'a Shift) -> Self {
        let window = shift.window();
        let break_window = shift.break_window();
        let meal_window = shift.meal_window();
        Self {
            id: *shift.id().as_uuid(),
            organization_id: *shift.organization_id().as_uuid(),
            schedule_id: *shift.schedule_id().as_uuid(),
            staff_id: *shift.staff_id().as_uuid(),
            client_id: shift.client_id().map(|id| *id.as_uuid()),
            shift_date: shift.date(),
            start_time: window.start(),
            end_time: window.end(),
            break_start: break_window.map(|w| w.start()),
            break_end: break_window.map(|w| w.end()),
            meal_start: meal_window.map(|w| w.start()),
            meal_end: meal_window.map(|w| w.end()),
            status: shift.status().as_str(),
            shift_type: shift.shift_type().as_str(),
            notes: shift.notes(),
            required_documentation: shift
                .required_documentation()
                .map(|documents| documents.iter().map(DocumentType::as_str).collect()),
        }
    }
}

// ---------------------------------------------------------------------------
// Staff availability
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = staff_availability)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AvailabilityRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub staff_id: Uuid,
    pub weekday: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub availability_type: String,
    pub effective_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl TryFrom<AvailabilityRow> for StaffAvailability {
    type Error = RowMappingError;

    fn try_from(row: AvailabilityRow) -> Result<Self, Self::Error> {
        const TABLE: &str = "staff_availability";
        let weekday = weekday_from_iso_number(row.weekday).ok_or_else(|| {
            RowMappingError::new(TABLE, row.id, format!("weekday {} out of range", row.weekday))
        })?;
        StaffAvailability::new(StaffAvailabilityDraft {
            id: row.id.into(),
            organization_id: OrganizationId::from_uuid(row.organization_id),
            staff_id: StaffId::from_uuid(row.staff_id),
            weekday,
            window: window(TABLE, row.id, row.start_time, row.end_time)?,
            availability_type: parse_column::<AvailabilityType>(
                TABLE,
                row.id,
                &row.availability_type,
            )?,
            effective_date: row.effective_date,
            expiry_date: row.expiry_date,
            notes: row.notes,
        })
        .map_err(|err| RowMappingError::new(TABLE, row.id, err))
    }
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = staff_availability)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct AvailabilityRecord<'a> {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub staff_id: Uuid,
    pub weekday: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub availability_type: &'static str,
    pub effective_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub notes: Option<&'a str>,
}

impl<'a> From<&'a StaffAvailability> for AvailabilityRecord<'a> {
    fn from(rule: &'a StaffAvailability) -> Self {
        Self {
            id: *rule.id().as_uuid(),
            organization_id: *rule.organization_id().as_uuid(),
            staff_id: *rule.staff_id().as_uuid(),
            weekday: iso_weekday_number(rule.weekday()),
            start_time: rule.window().start(),
            end_time: rule.window().end(),
            availability_type: rule.availability_type().as_str(),
            effective_date: rule.effective_date(),
            expiry_date: rule.expiry_date(),
            notes: rule.notes(),
        }
    }
}

// ---------------------------------------------------------------------------
// Schedule conflicts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = schedule_conflicts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ConflictRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub shift_id: Uuid,
    pub staff_id: Uuid,
    pub conflict_type: String,
    pub severity: String,
    pub description: String,
    pub detected_at: DateTime<Utc>,
    pub resolved: bool,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_notes: Option<String>,
}

impl TryFrom<ConflictRow> for ScheduleConflict {
    type Error = RowMappingError;

    fn try_from(row: ConflictRow) -> Result<Self, Self::Error> {
        const TABLE: &str = "schedule_conflicts";
        Ok(Self {
            id: row.id.into(),
            organization_id: OrganizationId::from_uuid(row.organization_id),
            shift_id: ShiftId::from_uuid(row.shift_id),
            staff_id: StaffId::from_uuid(row.staff_id),
            conflict_type: parse_column::<ConflictType>(TABLE, row.id, &row.conflict_type)?,
            severity: parse_column::<ConflictSeverity>(TABLE, row.id, &row.severity)?,
            description: row.description,
            detected_at: row.detected_at,
            resolved: row.resolved,
            resolved_by: row.resolved_by.map(UserId::from_uuid),
            resolved_at: row.resolved_at,
            resolution_notes: row.resolution_notes,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = schedule_conflicts)]
pub(crate) struct NewConflictRow<'a> {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub shift_id: Uuid,
    pub staff_id: Uuid,
    pub conflict_type: &'static str,
    pub severity: &'static str,
    pub description: &'a str,
    pub detected_at: DateTime<Utc>,
    pub resolved: bool,
}

impl<'a> From<&'a ScheduleConflict> for NewConflictRow<'a> {
    fn from(conflict: &'a ScheduleConflict) -> Self {
        Self {
            id: *conflict.id().as_uuid(),
            organization_id: *conflict.organization_id().as_uuid(),
            shift_id: *conflict.shift_id().as_uuid(),
            staff_id: *conflict.staff_id().as_uuid(),
            conflict_type: conflict.conflict_type().as_str(),
            severity: conflict.severity().as_str(),
            description: conflict.description(),
            detected_at: conflict.detected_at(),
            resolved: conflict.is_resolved(),
        }
    }
}

/// Resolution columns written by `mark_resolved`.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = schedule_conflicts)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ConflictResolution<'a> {
    pub resolved: bool,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_notes: Option<&'a str>,
}

impl<'a> From<&'a ScheduleConflict> for ConflictResolution<'a> {
    fn from(conflict: &'a ScheduleConflict) -> Self {
        Self {
            resolved: conflict.is_resolved(),
            resolved_by: conflict.resolved_by().map(|id| *id.as_uuid()),
            resolved_at: conflict.resolved_at(),
            resolution_notes: conflict.resolution_notes(),
        }
    }
}
