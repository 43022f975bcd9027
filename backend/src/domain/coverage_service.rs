//! Coverage request workflow service.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::conflict_detector::map_schedule_error;
use crate::domain::ports::{
    CapabilityCheck, CoverageCommand, CoverageDecisionRequest, CoverageRepository,
    CoverageRepositoryError, ListCoverageRequest, OpenCoverageRequest, ScheduleRepository,
    TenantDirectory,
};
use crate::domain::service_support::{authorize, invalid_transition, map_directory_error};
use crate::domain::{
    Actor, Capability, CoverageRequest, CoverageRequestError, CoverageRequestId, Error, StaffId,
};

fn map_coverage_error(error: CoverageRepositoryError) -> Error {
    match error {
        CoverageRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("coverage repository unavailable: {message}"))
        }
        CoverageRepositoryError::Query { message } => {
            Error::internal(format!("coverage repository error: {message}"))
        }
        CoverageRepositoryError::AlreadyPending { message } => Error::invalid_state(format!(
            "coverage request already exists for this shift: {message}"
        )),
        CoverageRepositoryError::Stale { message } => {
            Error::invalid_state(format!("coverage request changed concurrently: {message}"))
        }
    }
}

fn map_request_error(error: CoverageRequestError) -> Error {
    match error {
        CoverageRequestError::ShiftNotOpen { .. } => Error::invalid_state(error.to_string()),
        CoverageRequestError::BlankReason
        | CoverageRequestError::NotShiftOwner { .. }
        | CoverageRequestError::PickupOfOwnShift { .. } => Error::validation(error.to_string()),
    }
}

/// Domain service implementing [`CoverageCommand`].
pub struct CoverageService<S, V, T, K> {
    schedules: Arc<S>,
    coverage: Arc<V>,
    directory: Arc<T>,
    access: Arc<K>,
    clock: Arc<dyn Clock>,
}

impl<S, V, T, K> CoverageService<S, V, T, K> {
    pub fn new(
        schedules: Arc<S>,
        coverage: Arc<V>,
        directory: Arc<T>,
        access: Arc<K>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            schedules,
            coverage,
            directory,
            access,
            clock,
        }
    }
}

impl<S, V, T, K> CoverageService<S, V, T, K>
where
    S: ScheduleRepository,
    V: CoverageRepository,
    T: TenantDirectory,
    K: CapabilityCheck,
{
    /// Resolve who the request is filed for and check the actor may file it.
    async fn requester_for(
        &self,
        actor: &Actor,
        requested: Option<StaffId>,
    ) -> Result<StaffId, Error> {
        match requested {
            Some(staff_id) if !actor.is_staff(staff_id) => {
                authorize(self.access.as_ref(), actor, Capability::ManageSchedules).await?;
                let exists = self
                    .directory
                    .staff_exists(actor.organization_id, staff_id)
                    .await
                    .map_err(map_directory_error)?;
                if !exists {
                    return Err(Error::not_found(format!("staff member {staff_id} not found")));
                }
                Ok(staff_id)
            }
            _ => {
                authorize(self.access.as_ref(), actor, Capability::RequestSwaps).await?;
                actor
                    .staff_id
                    .ok_or_else(|| Error::forbidden("only staff members may request coverage"))
            }
        }
    }

    async fn load(
        &self,
        actor: &Actor,
        request_id: CoverageRequestId,
    ) -> Result<CoverageRequest, Error> {
        self.coverage
            .find(actor.organization_id, request_id)
            .await
            .map_err(map_coverage_error)?
            .ok_or_else(|| Error::not_found(format!("coverage request {request_id} not found")))
    }

    async fn store_transition(
        &self,
        current: &CoverageRequest,
        next: CoverageRequest,
    ) -> Result<CoverageRequest, Error> {
        self.coverage
            .transition(&next, current.status())
            .await
            .map_err(map_coverage_error)?;
        info!(
            request_id = %next.id(),
            shift_id = %next.shift_id(),
            from = %current.status(),
            to = %next.status(),
            "coverage request status changed"
        );
        Ok(next)
    }
}

#[async_trait]
impl<S, V, T, K> CoverageCommand for CoverageService<S, V, T, K>
where
    S: ScheduleRepository,
    V: CoverageRepository,
    T: TenantDirectory,
    K: CapabilityCheck,
{
    async fn request_coverage(
        &self,
        request: OpenCoverageRequest,
    ) -> Result<CoverageRequest, Error> {
        let actor = request.actor;
        let requester = self
            .requester_for(&actor, request.requesting_staff_id)
            .await?;
        let shift = self
            .schedules
            .find_shift(actor.organization_id, request.shift_id)
            .await
            .map_err(map_schedule_error)?
            .ok_or_else(|| Error::not_found(format!("shift {} not found", request.shift_id)))?;

        let coverage = CoverageRequest::open(
            CoverageRequestId::random(),
            requester,
            &shift,
            request.request_type,
            request.reason,
            request.notes,
            self.clock.utc(),
        )
        .map_err(map_request_error)?;
        self.coverage
            .insert(&coverage)
            .await
            .map_err(map_coverage_error)?;
        info!(
            request_id = %coverage.id(),
            shift_id = %coverage.shift_id(),
            request_type = %coverage.request_type(),
            "coverage requested"
        );
        Ok(coverage)
    }

    async fn approve_coverage(
        &self,
        request: CoverageDecisionRequest,
    ) -> Result<CoverageRequest, Error> {
        let actor = request.actor;
        authorize(self.access.as_ref(), &actor, Capability::ApproveSwaps).await?;
        let current = self.load(&actor, request.request_id).await?;
        let approved = current
            .approve(actor.user_id, self.clock.utc(), request.notes.as_deref())
            .map_err(invalid_transition)?;
        self.store_transition(&current, approved).await
    }

    async fn deny_coverage(
        &self,
        request: CoverageDecisionRequest,
    ) -> Result<CoverageRequest, Error> {
        let actor = request.actor;
        authorize(self.access.as_ref(), &actor, Capability::ApproveSwaps).await?;
        let current = self.load(&actor, request.request_id).await?;
        let denied = current
            .deny(actor.user_id, self.clock.utc(), request.notes.as_deref())
            .map_err(invalid_transition)?;
        self.store_transition(&current, denied).await
    }

    async fn cancel_coverage(
        &self,
        request: CoverageDecisionRequest,
    ) -> Result<CoverageRequest, Error> {
        let actor = request.actor;
        authorize(self.access.as_ref(), &actor, Capability::RequestSwaps).await?;
        let current = self.load(&actor, request.request_id).await?;
        if !actor.is_staff(current.requesting_staff_id()) {
            return Err(Error::forbidden(
                "only the requester may cancel a coverage request",
            ));
        }
        let cancelled = current
            .cancel(self.clock.utc())
            .map_err(invalid_transition)?;
        self.store_transition(&current, cancelled).await
    }

    async fn list_coverage_requests(
        &self,
        request: ListCoverageRequest,
    ) -> Result<Vec<CoverageRequest>, Error> {
        let actor = request.actor;
        let own_only = request
            .filter
            .staff_id
            .is_some_and(|staff_id| actor.is_staff(staff_id));
        let capability = if own_only {
            Capability::RequestSwaps
        } else {
            Capability::ApproveSwaps
        };
        authorize(self.access.as_ref(), &actor, capability).await?;
        self.coverage
            .list(actor.organization_id, request.filter)
            .await
            .map_err(map_coverage_error)
    }
}

#[cfg(test)]
#[path = "coverage_service_tests.rs"]
mod tests;
