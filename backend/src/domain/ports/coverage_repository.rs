//! Port for coverage requests.

use async_trait::async_trait;

use crate::domain::{
    CoverageRequest, CoverageRequestId, CoverageRequestType, CoverageStatus, OrganizationId,
    StaffId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by coverage repository adapters.
    pub enum CoverageRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "coverage repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "coverage repository query failed: {message}",
        /// The shift already has a pending request.
        AlreadyPending { message: String } =>
            "shift already has a pending coverage request: {message}",
        /// The stored status no longer matches the expected one.
        Stale { message: String } =>
            "coverage request changed concurrently: {message}",
    }
}

/// Filter for [`CoverageRepository::list`]. Empty means every request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoverageFilter {
    pub status: Option<CoverageStatus>,
    pub request_type: Option<CoverageRequestType>,
    pub staff_id: Option<StaffId>,
}

/// Store for coverage requests.
///
/// Storage keeps at most one pending request per shift.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CoverageRepository: Send + Sync {
    /// Insert a pending request, failing with
    /// [`CoverageRepositoryError::AlreadyPending`] when the shift has one.
    async fn insert(&self, request: &CoverageRequest) -> Result<(), CoverageRepositoryError>;

    async fn find(
        &self,
        organization_id: OrganizationId,
        request_id: CoverageRequestId,
    ) -> Result<Option<CoverageRequest>, CoverageRepositoryError>;

    /// Store `request` if the stored status still equals `expected`.
    async fn transition(
        &self,
        request: &CoverageRequest,
        expected: CoverageStatus,
    ) -> Result<(), CoverageRepositoryError>;

    /// Requests matching `filter`, newest first.
    async fn list(
        &self,
        organization_id: OrganizationId,
        filter: CoverageFilter,
    ) -> Result<Vec<CoverageRequest>, CoverageRepositoryError>;
}
