//! Port for schedule and shift persistence.
//!
//! Every read is scoped to an organization; a row belonging to another tenant
//! is reported as absent.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{OrganizationId, Schedule, ScheduleId, Shift, ShiftId, ShiftWrite, StaffId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by schedule repository adapters.
    pub enum ScheduleRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "schedule repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "schedule repository query failed: {message}",
        /// A guarded shift write found a different owner or status.
        Stale { message: String } =>
            "schedule repository write was stale: {message}",
    }
}

/// Canonical store for schedules and the shifts they contain.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Find a schedule by id within the organization.
    async fn find_schedule(
        &self,
        organization_id: OrganizationId,
        schedule_id: ScheduleId,
    ) -> Result<Option<Schedule>, ScheduleRepositoryError>;

    /// Insert a schedule together with its initial shifts in one transaction.
    async fn insert_schedule(
        &self,
        schedule: &Schedule,
        shifts: &[Shift],
    ) -> Result<(), ScheduleRepositoryError>;

    /// Overwrite a schedule's mutable fields.
    async fn update_schedule(&self, schedule: &Schedule) -> Result<(), ScheduleRepositoryError>;

    /// Find a shift by id within the organization.
    async fn find_shift(
        &self,
        organization_id: OrganizationId,
        shift_id: ShiftId,
    ) -> Result<Option<Shift>, ScheduleRepositoryError>;

    /// Insert a new shift.
    async fn insert_shift(&self, shift: &Shift) -> Result<(), ScheduleRepositoryError>;

    /// Insert several shifts; either all are stored or none are.
    async fn insert_shifts(&self, shifts: &[Shift]) -> Result<(), ScheduleRepositoryError>;

    /// Overwrite a shift while its stored owner and status still match the
    /// write's expectations; otherwise fail with `Stale`.
    async fn update_shift(&self, write: &ShiftWrite) -> Result<(), ScheduleRepositoryError>;

    /// Non-cancelled shifts a staff member holds on `date`.
    async fn list_active_shifts_for_staff(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
        date: NaiveDate,
    ) -> Result<Vec<Shift>, ScheduleRepositoryError>;

    /// Every shift in a schedule ordered by date and start time.
    async fn list_schedule_shifts(
        &self,
        organization_id: OrganizationId,
        schedule_id: ScheduleId,
    ) -> Result<Vec<Shift>, ScheduleRepositoryError>;
}
