//! Port for derived scheduling conflicts.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{ConflictId, OrganizationId, ScheduleConflict, ShiftId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by conflict repository adapters.
    pub enum ConflictRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "conflict repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "conflict repository query failed: {message}",
    }
}

/// Filter for [`ConflictRepository::list`]. Empty means every conflict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConflictFilter {
    pub unresolved_only: bool,
    pub shift_id: Option<ShiftId>,
    /// Inclusive range over the conflicting shift's date.
    pub dates: Option<(NaiveDate, NaiveDate)>,
}

impl ConflictFilter {
    /// Unresolved conflicts on one shift.
    pub fn open_for_shift(shift_id: ShiftId) -> Self {
        Self {
            unresolved_only: true,
            shift_id: Some(shift_id),
            dates: None,
        }
    }
}

/// Store for conflicts written by the conflict detector.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConflictRepository: Send + Sync {
    /// Insert unless an unresolved conflict of the same (shift, type) exists.
    ///
    /// Returns `true` when a row was written.
    async fn insert_if_absent(
        &self,
        conflict: &ScheduleConflict,
    ) -> Result<bool, ConflictRepositoryError>;

    /// Conflicts matching `filter` ordered by detection time.
    async fn list(
        &self,
        organization_id: OrganizationId,
        filter: ConflictFilter,
    ) -> Result<Vec<ScheduleConflict>, ConflictRepositoryError>;

    /// Find a conflict by id within the organization.
    async fn find(
        &self,
        organization_id: OrganizationId,
        conflict_id: ConflictId,
    ) -> Result<Option<ScheduleConflict>, ConflictRepositoryError>;

    /// Persist resolution fields if the row is still unresolved.
    ///
    /// Returns `false` when another caller resolved it first.
    async fn mark_resolved(
        &self,
        conflict: &ScheduleConflict,
    ) -> Result<bool, ConflictRepositoryError>;
}
