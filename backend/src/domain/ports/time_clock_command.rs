//! Driving port for attendance events.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Actor, BreakKind, Error, ShiftId, StaffId, TimeClockEntry, TimeEntryId};

/// Request to open a worked session.
#[derive(Debug, Clone)]
pub struct ClockInRequest {
    pub actor: Actor,
    pub staff_id: StaffId,
    pub shift_id: Option<ShiftId>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// Request to close the open worked session.
#[derive(Debug, Clone)]
pub struct ClockOutRequest {
    pub actor: Actor,
    pub staff_id: StaffId,
    /// Falls back to the clock-in's shift when absent.
    pub shift_id: Option<ShiftId>,
    pub notes: Option<String>,
}

/// Request to start or end a rest break or meal.
#[derive(Debug, Clone, Copy)]
pub struct BreakRequest {
    pub actor: Actor,
    pub staff_id: StaffId,
    pub kind: BreakKind,
}

/// Administrative correction of one entry's timestamp.
#[derive(Debug, Clone)]
pub struct AdjustEntryRequest {
    pub actor: Actor,
    pub entry_id: TimeEntryId,
    pub corrected_at: DateTime<Utc>,
    pub reason: String,
}

/// Entries for one staff member in an inclusive time range.
#[derive(Debug, Clone, Copy)]
pub struct ListEntriesRequest {
    pub actor: Actor,
    pub staff_id: StaffId,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// Time clock operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TimeClockCommand: Send + Sync {
    async fn clock_in(&self, request: ClockInRequest) -> Result<TimeClockEntry, Error>;

    /// Fails with `compliance_incomplete` listing every missing item when the
    /// client's documentation is incomplete.
    async fn clock_out(&self, request: ClockOutRequest) -> Result<TimeClockEntry, Error>;

    async fn start_break(&self, request: BreakRequest) -> Result<TimeClockEntry, Error>;

    async fn end_break(&self, request: BreakRequest) -> Result<TimeClockEntry, Error>;

    async fn adjust_entry(&self, request: AdjustEntryRequest) -> Result<TimeClockEntry, Error>;

    async fn list_entries(&self, request: ListEntriesRequest)
    -> Result<Vec<TimeClockEntry>, Error>;
}
