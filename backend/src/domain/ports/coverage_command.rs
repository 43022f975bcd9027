//! Driving port for the coverage request workflow.

use async_trait::async_trait;

use crate::domain::{
    Actor, CoverageRequest, CoverageRequestId, CoverageRequestType, Error, ShiftId, StaffId,
};

use super::CoverageFilter;

/// Request asking for help with one shift.
#[derive(Debug, Clone)]
pub struct OpenCoverageRequest {
    pub actor: Actor,
    pub shift_id: ShiftId,
    /// Defaults to the actor's own staff record.
    pub requesting_staff_id: Option<StaffId>,
    pub request_type: CoverageRequestType,
    pub reason: String,
    pub notes: Option<String>,
}

/// Manager decision on, or withdrawal of, a pending request.
#[derive(Debug, Clone)]
pub struct CoverageDecisionRequest {
    pub actor: Actor,
    pub request_id: CoverageRequestId,
    pub notes: Option<String>,
}

impl CoverageDecisionRequest {
    pub fn new(actor: Actor, request_id: CoverageRequestId) -> Self {
        Self {
            actor,
            request_id,
            notes: None,
        }
    }
}

/// Request to list coverage requests.
#[derive(Debug, Clone, Copy)]
pub struct ListCoverageRequest {
    pub actor: Actor,
    pub filter: CoverageFilter,
}

/// Coverage request lifecycle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CoverageCommand: Send + Sync {
    /// Staff file for themselves; filing for someone else needs scheduling
    /// rights.
    async fn request_coverage(&self, request: OpenCoverageRequest)
    -> Result<CoverageRequest, Error>;

    async fn approve_coverage(
        &self,
        request: CoverageDecisionRequest,
    ) -> Result<CoverageRequest, Error>;

    async fn deny_coverage(&self, request: CoverageDecisionRequest)
    -> Result<CoverageRequest, Error>;

    /// Only the requester may withdraw.
    async fn cancel_coverage(
        &self,
        request: CoverageDecisionRequest,
    ) -> Result<CoverageRequest, Error>;

    /// Staff listing only their own requests need no approval rights.
    async fn list_coverage_requests(
        &self,
        request: ListCoverageRequest,
    ) -> Result<Vec<CoverageRequest>, Error>;
}
