//! Port for weekly overtime buckets.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{OrganizationId, OvertimePolicy, OvertimeRecord, StaffId, WorkedDuration};

use super::define_port_error;

define_port_error! {
    /// Errors raised by overtime repository adapters.
    pub enum OvertimeRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "overtime repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "overtime repository query failed: {message}",
    }
}

/// Store for per-staff, per-week hour buckets.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OvertimeRepository: Send + Sync {
    /// Fetch or create the bucket for `week_start`, add `session` to it under
    /// `policy` and store the result, all under one row lock.
    async fn accumulate(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
        week_start: NaiveDate,
        session: WorkedDuration,
        policy: &OvertimePolicy,
    ) -> Result<OvertimeRecord, OvertimeRepositoryError>;

    /// Buckets whose week starts in `[from, to]`, ordered by week.
    async fn list_for_staff(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<OvertimeRecord>, OvertimeRepositoryError>;
}
