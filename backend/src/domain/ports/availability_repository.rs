//! Port for staff availability rules.

use async_trait::async_trait;
use chrono::{NaiveDate, Weekday};

use crate::domain::{AvailabilityId, OrganizationId, StaffAvailability, StaffId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by availability repository adapters.
    pub enum AvailabilityRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "availability repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "availability repository query failed: {message}",
    }
}

/// Weekly availability rules per staff member.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    /// Every rule for `weekday`, expired or not; callers pick the effective one.
    async fn list_for_weekday(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
        weekday: Weekday,
    ) -> Result<Vec<StaffAvailability>, AvailabilityRepositoryError>;

    /// A staff member's rules ordered by weekday and start time, limited to
    /// those in force on `effective_on` when given.
    async fn list_for_staff(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
        effective_on: Option<NaiveDate>,
    ) -> Result<Vec<StaffAvailability>, AvailabilityRepositoryError>;

    /// Find a rule by id within the organization.
    async fn find(
        &self,
        organization_id: OrganizationId,
        availability_id: AvailabilityId,
    ) -> Result<Option<StaffAvailability>, AvailabilityRepositoryError>;

    /// Insert or replace a rule.
    async fn save(&self, rule: &StaffAvailability) -> Result<(), AvailabilityRepositoryError>;

    /// Remove a rule. Returns `false` when nothing matched.
    async fn delete(
        &self,
        organization_id: OrganizationId,
        availability_id: AvailabilityId,
    ) -> Result<bool, AvailabilityRepositoryError>;

    /// Drop every rule for the staff member and store `rules` in their place,
    /// in one transaction.
    async fn replace_for_staff(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
        rules: &[StaffAvailability],
    ) -> Result<(), AvailabilityRepositoryError>;
}
