//! Rows for swaps, coverage requests, the time clock ledger and overtime
//! buckets.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    ClockIntervalKind, CoverageRequest, CoverageRequestDraft, CoverageRequestType, CoverageStatus,
    OrganizationId, OvertimeHours, OvertimeRecord, ShiftId, ShiftSwap,
    ShiftSwapDraft, StaffId, SwapStatus, TimeClockEntry, TimeClockEntryDraft, TimeEntryType,
    UserId, WorkedDuration,
};
use crate::outbound::persistence::schema::{
    coverage_requests, open_clock_intervals, overtime_records, shift_swaps, time_clock_entries,
};

use super::{RowMappingError, parse_column};

// ---------------------------------------------------------------------------
// Shift swaps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = shift_swaps)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SwapRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub requester_id: Uuid,
    pub requester_shift_id: Uuid,
    pub target_staff_id: Uuid,
    pub target_shift_id: Uuid,
    pub reason: Option<String>,
    pub status: String,
    pub requested_at: DateTime<Utc>,
    pub peer_responded_at: Option<DateTime<Utc>>,
    pub decided_by: Option<Uuid>,
    pub decided_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl TryFrom<SwapRow> for ShiftSwap {
    type Error = RowMappingError;

    fn try_from(row: SwapRow) -> Result<Self, Self::Error> {
        let status: SwapStatus = parse_column("shift_swaps", row.id, &row.status)?;
        Ok(ShiftSwap::new(ShiftSwapDraft {
            id: row.id.into(),
            organization_id: OrganizationId::from_uuid(row.organization_id),
            requester_id: StaffId::from_uuid(row.requester_id),
            requester_shift_id: ShiftId::from_uuid(row.requester_shift_id),
            target_staff_id: StaffId::from_uuid(row.target_staff_id),
            target_shift_id: ShiftId::from_uuid(row.target_shift_id),
            reason: row.reason,
            status,
            requested_at: row.requested_at,
            peer_responded_at: row.peer_responded_at,
            decided_by: row.decided_by.map(UserId::from_uuid),
            decided_at: row.decided_at,
            notes: row.notes,
        }))
    }
}

/// Insert and full-update payload for `shift_swaps`.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = shift_swaps)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct SwapRecord<'a> {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub requester_id: Uuid,
    pub requester_shift_id: Uuid,
    pub target_staff_id: Uuid,
    pub target_shift_id: Uuid,
    pub reason: Option<&'a str>,
    pub status: &'static str,
    pub requested_at: DateTime<Utc>,
    pub peer_responded_at: Option<DateTime<Utc>>,
    pub decided_by: Option<Uuid>,
    pub decided_at: Option<DateTime<Utc>>,
    pub notes: Option<&'a str>,
}

impl<'a> From<&'a ShiftSwap> for SwapRecord<'a> {
    fn from(swap: &'a ShiftSwap) -> Self {
        Self {
            id: *swap.id().as_uuid(),
            organization_id: *swap.organization_id().as_uuid(),
            requester_id: *swap.requester_id().as_uuid(),
            requester_shift_id: *swap.requester_shift_id().as_uuid(),
            target_staff_id: *swap.target_staff_id().as_uuid(),
            target_shift_id: *swap.target_shift_id().as_uuid(),
            reason: swap.reason(),
            status: swap.status().as_str(),
            requested_at: swap.requested_at(),
            peer_responded_at: swap.peer_responded_at(),
            decided_by: swap.decided_by().map(|id| *id.as_uuid()),
            decided_at: swap.decided_at(),
            notes: swap.notes(),
        }
    }
}

// ---------------------------------------------------------------------------
// Coverage requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = coverage_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CoverageRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub shift_id: Uuid,
    pub requesting_staff_id: Uuid,
    pub request_type: String,
    pub reason: String,
    pub status: String,
    pub requested_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub responded_by: Option<Uuid>,
    pub notes: Option<String>,
}

impl TryFrom<CoverageRow> for CoverageRequest {
    type Error = RowMappingError;

    fn try_from(row: CoverageRow) -> Result<Self, Self::Error> {
        const TABLE: &str = "coverage_requests";
        let request_type: CoverageRequestType = parse_column(TABLE, row.id, &row.request_type)?;
        let status: CoverageStatus = parse_column(TABLE, row.id, &row.status)?;
        Ok(CoverageRequest::new(CoverageRequestDraft {
            id: row.id.into(),
            organization_id: OrganizationId::from_uuid(row.organization_id),
            shift_id: ShiftId::from_uuid(row.shift_id),
            requesting_staff_id: StaffId::from_uuid(row.requesting_staff_id),
            request_type,
            reason: row.reason,
            status,
            requested_at: row.requested_at,
            responded_at: row.responded_at,
            responded_by: row.responded_by.map(UserId::from_uuid),
            notes: row.notes,
        }))
    }
}

/// Insert and full-update payload for `coverage_requests`.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = coverage_requests)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct CoverageRecord<'a> {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub shift_id: Uuid,
    pub requesting_staff_id: Uuid,
    pub request_type: &'static str,
    pub reason: &'a str,
    pub status: &'static str,
    pub requested_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub responded_by: Option<Uuid>,
    pub notes: Option<&'a str>,
}

impl<'a> From<&'a CoverageRequest> for CoverageRecord<'a> {
    fn from(request: &'a CoverageRequest) -> Self {
        Self {
            id: *request.id().as_uuid(),
            organization_id: *request.organization_id().as_uuid(),
            shift_id: *request.shift_id().as_uuid(),
            requesting_staff_id: *request.requesting_staff_id().as_uuid(),
            request_type: request.request_type().as_str(),
            reason: request.reason(),
            status: request.status().as_str(),
            requested_at: request.requested_at(),
            responded_at: request.responded_at(),
            responded_by: request.responded_by().map(|id| *id.as_uuid()),
            notes: request.notes(),
        }
    }
}

// ---------------------------------------------------------------------------
// Time clock
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = time_clock_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TimeEntryRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub staff_id: Uuid,
    pub shift_id: Option<Uuid>,
    pub entry_type: String,
    pub recorded_at: DateTime<Utc>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub corrects_entry_id: Option<Uuid>,
    pub recorded_by: Uuid,
}

impl TryFrom<TimeEntryRow> for TimeClockEntry {
    type Error = RowMappingError;

    fn try_from(row: TimeEntryRow) -> Result<Self, Self::Error> {
        let entry_type: TimeEntryType =
            parse_column("time_clock_entries", row.id, &row.entry_type)?;
        Ok(TimeClockEntry::new(TimeClockEntryDraft {
            id: row.id.into(),
            organization_id: OrganizationId::from_uuid(row.organization_id),
            staff_id: StaffId::from_uuid(row.staff_id),
            shift_id: row.shift_id.map(ShiftId::from_uuid),
            entry_type,
            recorded_at: row.recorded_at,
            location: row.location,
            notes: row.notes,
            corrects_entry_id: row.corrects_entry_id.map(Into::into),
            recorded_by: UserId::from_uuid(row.recorded_by),
        }))
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = time_clock_entries)]
pub(crate) struct TimeEntryRecord<'a> {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub staff_id: Uuid,
    pub shift_id: Option<Uuid>,
    pub entry_type: &'static str,
    pub recorded_at: DateTime<Utc>,
    pub location: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub corrects_entry_id: Option<Uuid>,
    pub recorded_by: Uuid,
}

impl<'a> From<&'a TimeClockEntry> for TimeEntryRecord<'a> {
    fn from(entry: &'a TimeClockEntry) -> Self {
        Self {
            id: *entry.id().as_uuid(),
            organization_id: *entry.organization_id().as_uuid(),
            staff_id: *entry.staff_id().as_uuid(),
            shift_id: entry.shift_id().map(|id| *id.as_uuid()),
            entry_type: entry.entry_type().as_str(),
            recorded_at: entry.recorded_at(),
            location: entry.location(),
            notes: entry.notes(),
            corrects_entry_id: entry.corrects_entry_id().map(|id| *id.as_uuid()),
            recorded_by: *entry.recorded_by().as_uuid(),
        }
    }
}

/// Marker row for an open interval; its primary key is the uniqueness guard.
#[derive(Debug, Insertable)]
#[diesel(table_name = open_clock_intervals)]
pub(crate) struct OpenIntervalRecord {
    pub staff_id: Uuid,
    pub interval_kind: &'static str,
    pub organization_id: Uuid,
    pub entry_id: Uuid,
}

impl OpenIntervalRecord {
    pub(crate) fn new(entry: &TimeClockEntry, kind: ClockIntervalKind) -> Self {
        Self {
            staff_id: *entry.staff_id().as_uuid(),
            interval_kind: kind.as_str(),
            organization_id: *entry.organization_id().as_uuid(),
            entry_id: *entry.id().as_uuid(),
        }
    }
}

// ---------------------------------------------------------------------------
// Overtime
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = overtime_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OvertimeRecordRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub staff_id: Uuid,
    pub week_start: NaiveDate,
    pub regular_seconds: i64,
    pub overtime_seconds: i64,
    pub double_time_seconds: i64,
    pub holiday_seconds: i64,
    pub total_seconds: i64,
}

impl TryFrom<OvertimeRecordRow> for OvertimeRecord {
    type Error = RowMappingError;

    fn try_from(row: OvertimeRecordRow) -> Result<Self, Self::Error> {
        const TABLE: &str = "overtime_records";
        let seconds = |value: i64| {
            WorkedDuration::from_seconds(value)
                .ok_or_else(|| RowMappingError::new(TABLE, row.id, "negative duration"))
        };
        let hours = OvertimeHours {
            regular: seconds(row.regular_seconds)?,
            overtime: seconds(row.overtime_seconds)?,
            double_time: seconds(row.double_time_seconds)?,
            holiday: seconds(row.holiday_seconds)?,
        };
        OvertimeRecord::restore(
            row.id.into(),
            OrganizationId::from_uuid(row.organization_id),
            StaffId::from_uuid(row.staff_id),
            row.week_start,
            hours,
            seconds(row.total_seconds)?,
        )
        .map_err(|err| RowMappingError::new(TABLE, row.id, err))
    }
}

/// Component columns of a bucket, total included.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = overtime_records)]
pub(crate) struct OvertimeRecordValues {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub staff_id: Uuid,
    pub week_start: NaiveDate,
    pub regular_seconds: i64,
    pub overtime_seconds: i64,
    pub double_time_seconds: i64,
    pub holiday_seconds: i64,
    pub total_seconds: i64,
}

impl From<&OvertimeRecord> for OvertimeRecordValues {
    fn from(record: &OvertimeRecord) -> Self {
        Self {
            id: *record.id().as_uuid(),
            organization_id: *record.organization_id().as_uuid(),
            staff_id: *record.staff_id().as_uuid(),
            week_start: record.week_start(),
            regular_seconds: record.regular().as_seconds(),
            overtime_seconds: record.overtime().as_seconds(),
            double_time_seconds: record.double_time().as_seconds(),
            holiday_seconds: record.holiday().as_seconds(),
            total_seconds: record.total().as_seconds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn overtime_row(total_seconds: i64) -> OvertimeRecordRow {
        OvertimeRecordRow {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            staff_id: Uuid::new_v4(),
            week_start: NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
            regular_seconds: 40 * 3_600,
            overtime_seconds: 5 * 3_600,
            double_time_seconds: 0,
            holiday_seconds: 0,
            total_seconds,
        }
    }

    #[rstest]
    fn consistent_bucket_is_restored() {
        let record = OvertimeRecord::try_from(overtime_row(45 * 3_600)).expect("total matches");

        assert_eq!(record.total(), WorkedDuration::from_hours(45));
        assert_eq!(OvertimeRecordValues::from(&record).overtime_seconds, 5 * 3_600);
    }

    #[rstest]
    fn drifted_total_is_reported() {
        let error = OvertimeRecord::try_from(overtime_row(44 * 3_600)).expect_err("total drifted");

        assert!(error.to_string().starts_with("overtime_records row"));
    }
}
