//! Shift swap workflow service.
//!
//! Peers answer requests addressed to them, managers decide accepted ones,
//! and requesters may withdraw until a decision is made. Approval exchanges
//! shift owners atomically and re-runs conflict detection on both shifts.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::conflict_detector::{ConflictDetector, map_schedule_error};
use crate::domain::ports::{
    AvailabilityRepository, CapabilityCheck, ConflictRepository, RequestSwapRequest,
    ScheduleRepository, ShiftSwapCommand, SwapDecisionRequest, SwapRepository,
    SwapRepositoryError,
};
use crate::domain::service_support::{authorize, invalid_transition};
use crate::domain::{
    Actor, Capability, Error, OrganizationId, Shift, ShiftId, ShiftSwap, StaffId, SwapId,
    SwapRequestError,
};

fn map_swap_error(error: SwapRepositoryError) -> Error {
    match error {
        SwapRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("swap repository unavailable: {message}"))
        }
        SwapRepositoryError::Query { message } => {
            Error::internal(format!("swap repository error: {message}"))
        }
        SwapRepositoryError::ShiftLocked { message } => {
            Error::invalid_state(format!("shift is already part of an open swap: {message}"))
        }
        SwapRepositoryError::Stale { message } => {
            Error::invalid_state(format!("swap changed concurrently: {message}"))
        }
    }
}

fn map_request_error(error: SwapRequestError) -> Error {
    match error {
        SwapRequestError::ShiftNotOpen { .. } => Error::invalid_state(error.to_string()),
        SwapRequestError::SameShift
        | SwapRequestError::SameStaff
        | SwapRequestError::RequesterDoesNotOwnShift { .. }
        | SwapRequestError::TargetDoesNotOwnShift { .. } => Error::validation(error.to_string()),
    }
}

/// Domain service implementing [`ShiftSwapCommand`].
pub struct SwapService<S, A, C, W, K> {
    schedules: Arc<S>,
    swaps: Arc<W>,
    access: Arc<K>,
    detector: ConflictDetector<S, A, C>,
    clock: Arc<dyn Clock>,
}

impl<S, A, C, W, K> SwapService<S, A, C, W, K>
where
    S: ScheduleRepository,
    A: AvailabilityRepository,
    C: ConflictRepository,
{
    /// Create a swap service; availability and conflicts feed re-detection.
    pub fn new(
        schedules: Arc<S>,
        availability: Arc<A>,
        conflicts: Arc<C>,
        swaps: Arc<W>,
        access: Arc<K>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let detector = ConflictDetector::new(
            Arc::clone(&schedules),
            availability,
            conflicts,
            Arc::clone(&clock),
        );
        Self {
            schedules,
            swaps,
            access,
            detector,
            clock,
        }
    }
}

impl<S, A, C, W, K> SwapService<S, A, C, W, K>
where
    S: ScheduleRepository,
    A: AvailabilityRepository,
    C: ConflictRepository,
    W: SwapRepository,
    K: CapabilityCheck,
{
    async fn load_shift(
        &self,
        organization_id: OrganizationId,
        shift_id: ShiftId,
    ) -> Result<Shift, Error> {
        self.schedules
            .find_shift(organization_id, shift_id)
            .await
            .map_err(map_schedule_error)?
            .ok_or_else(|| Error::not_found(format!("shift {shift_id} not found")))
    }

    async fn load_swap(&self, actor: &Actor, swap_id: SwapId) -> Result<ShiftSwap, Error> {
        self.swaps
            .find(actor.organization_id, swap_id)
            .await
            .map_err(map_swap_error)?
            .ok_or_else(|| Error::not_found(format!("swap {swap_id} not found")))
    }

    /// Store a peer or manager decision guarded by the status it was made from.
    async fn store_transition(
        &self,
        current: &ShiftSwap,
        next: ShiftSwap,
    ) -> Result<ShiftSwap, Error> {
        self.swaps
            .transition(&next, current.status())
            .await
            .map_err(map_swap_error)?;
        info!(
            swap_id = %next.id(),
            from = %current.status(),
            to = %next.status(),
            "swap status changed"
        );
        Ok(next)
    }
}

fn ensure_actor_is(actor: &Actor, staff_id: StaffId, role: &str) -> Result<(), Error> {
    if actor.is_staff(staff_id) {
        Ok(())
    } else {
        Err(Error::forbidden(format!(
            "only the {role} may perform this swap action"
        )))
    }
}

#[async_trait]
impl<S, A, C, W, K> ShiftSwapCommand for SwapService<S, A, C, W, K>
where
    S: ScheduleRepository,
    A: AvailabilityRepository,
    C: ConflictRepository,
    W: SwapRepository,
    K: CapabilityCheck,
{
    async fn request_swap(&self, request: RequestSwapRequest) -> Result<ShiftSwap, Error> {
        let actor = request.actor;
        authorize(self.access.as_ref(), &actor, Capability::RequestSwaps).await?;
        let requester_id = actor
            .staff_id
            .ok_or_else(|| Error::forbidden("only staff members may request swaps"))?;

        let requester_shift = self
            .load_shift(actor.organization_id, request.requester_shift_id)
            .await?;
        let target_shift = self
            .load_shift(actor.organization_id, request.target_shift_id)
            .await?;

        let swap = ShiftSwap::request(
            SwapId::random(),
            requester_id,
            &requester_shift,
            request.target_staff_id,
            &target_shift,
            request.reason,
            self.clock.utc(),
        )
        .map_err(map_request_error)?;

        self.swaps.insert(&swap).await.map_err(map_swap_error)?;
        info!(
            swap_id = %swap.id(),
            requester_id = %swap.requester_id(),
            target_staff_id = %swap.target_staff_id(),
            "swap requested"
        );
        Ok(swap)
    }

    async fn accept_swap(&self, request: SwapDecisionRequest) -> Result<ShiftSwap, Error> {
        let actor = request.actor;
        authorize(self.access.as_ref(), &actor, Capability::RequestSwaps).await?;

        let swap = self.load_swap(&actor, request.swap_id).await?;
        ensure_actor_is(&actor, swap.target_staff_id(), "target staff member")?;
        let accepted = swap.accept(self.clock.utc()).map_err(invalid_transition)?;
        self.store_transition(&swap, accepted).await
    }

    async fn decline_swap(&self, request: SwapDecisionRequest) -> Result<ShiftSwap, Error> {
        let actor = request.actor;
        authorize(self.access.as_ref(), &actor, Capability::RequestSwaps).await?;

        let swap = self.load_swap(&actor, request.swap_id).await?;
        ensure_actor_is(&actor, swap.target_staff_id(), "target staff member")?;
        let declined = swap
            .decline(self.clock.utc(), request.notes)
            .map_err(invalid_transition)?;
        let stored = self.store_transition(&swap, declined).await?;
        info!(
            swap_id = %stored.id(),
            requester_id = %stored.requester_id(),
            "requester notified of declined swap"
        );
        Ok(stored)
    }

    async fn approve_swap(&self, request: SwapDecisionRequest) -> Result<ShiftSwap, Error> {
        let actor = request.actor;
        authorize(self.access.as_ref(), &actor, Capability::ApproveSwaps).await?;

        let swap = self.load_swap(&actor, request.swap_id).await?;
        let requester_shift = self
            .load_shift(actor.organization_id, swap.requester_shift_id())
            .await?;
        let target_shift = self
            .load_shift(actor.organization_id, swap.target_shift_id())
            .await?;

        let exchange = swap
            .approve(
                &requester_shift,
                &target_shift,
                actor.user_id,
                self.clock.utc(),
                request.notes,
            )
            .map_err(invalid_transition)?;
        self.swaps
            .commit_exchange(&exchange)
            .await
            .map_err(map_swap_error)?;
        info!(
            swap_id = %exchange.swap.id(),
            approver = %actor.user_id,
            "swap approved and shifts exchanged"
        );

        self.detector
            .detect_best_effort(exchange.requester_shift.shift())
            .await;
        self.detector.detect_best_effort(exchange.target_shift.shift()).await;
        Ok(exchange.swap)
    }

    async fn deny_swap(&self, request: SwapDecisionRequest) -> Result<ShiftSwap, Error> {
        let actor = request.actor;
        authorize(self.access.as_ref(), &actor, Capability::ApproveSwaps).await?;

        let swap = self.load_swap(&actor, request.swap_id).await?;
        let denied = swap
            .deny(actor.user_id, self.clock.utc(), request.notes)
            .map_err(invalid_transition)?;
        self.store_transition(&swap, denied).await
    }

    async fn cancel_swap(&self, request: SwapDecisionRequest) -> Result<ShiftSwap, Error> {
        let actor = request.actor;
        authorize(self.access.as_ref(), &actor, Capability::RequestSwaps).await?;

        let swap = self.load_swap(&actor, request.swap_id).await?;
        ensure_actor_is(&actor, swap.requester_id(), "requester")?;
        let cancelled = swap.cancel(self.clock.utc()).map_err(invalid_transition)?;
        self.store_transition(&swap, cancelled).await
    }
}

#[cfg(test)]
#[path = "swap_service_tests.rs"]
mod tests;
