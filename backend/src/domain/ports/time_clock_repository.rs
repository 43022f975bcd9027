//! Port for the append-only time clock ledger.
//!
//! Open intervals (a clock-in without its clock-out, a break without its
//! end) are tracked as one row per (staff, interval kind). Opening an interval
//! that is already open, or closing one that is not, fails in storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    ClockIntervalKind, OrganizationId, ShiftWrite, StaffId, TimeClockEntry, TimeEntryId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by time clock repository adapters.
    pub enum TimeClockRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "time clock repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "time clock repository query failed: {message}",
        /// The interval is already open for this staff member.
        AlreadyOpen { message: String } =>
            "time clock interval already open: {message}",
        /// The interval is not open for this staff member.
        NotOpen { message: String } =>
            "time clock interval not open: {message}",
        /// The shift riding along changed owner or status since it was read.
        ShiftChanged { message: String } =>
            "shift changed before the clock event: {message}",
    }
}

/// Time clock ledger.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TimeClockRepository: Send + Sync {
    /// Timestamp of the staff member's latest non-adjustment entry.
    async fn latest_event_at(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
    ) -> Result<Option<DateTime<Utc>>, TimeClockRepositoryError>;

    /// Entry that opened the staff member's current `kind` interval.
    async fn find_open(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
        kind: ClockIntervalKind,
    ) -> Result<Option<TimeClockEntry>, TimeClockRepositoryError>;

    /// Append `entry` and mark `kind` open in one transaction, optionally
    /// storing a guarded shift write alongside.
    async fn open_interval(
        &self,
        entry: &TimeClockEntry,
        kind: ClockIntervalKind,
        shift: Option<ShiftWrite>,
    ) -> Result<(), TimeClockRepositoryError>;

    /// Clear the open `kind` interval and append `entry` in one transaction,
    /// optionally storing a guarded shift write alongside.
    async fn close_interval(
        &self,
        entry: &TimeClockEntry,
        kind: ClockIntervalKind,
        shift: Option<ShiftWrite>,
    ) -> Result<(), TimeClockRepositoryError>;

    /// Append an administrative correction. Open intervals are untouched.
    async fn append_adjustment(
        &self,
        entry: &TimeClockEntry,
    ) -> Result<(), TimeClockRepositoryError>;

    /// Find an entry by id within the organization.
    async fn find_entry(
        &self,
        organization_id: OrganizationId,
        entry_id: TimeEntryId,
    ) -> Result<Option<TimeClockEntry>, TimeClockRepositoryError>;

    /// Entries recorded in `[from, to]`, ordered by timestamp.
    async fn list_entries(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TimeClockEntry>, TimeClockRepositoryError>;
}
