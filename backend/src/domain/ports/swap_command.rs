//! Driving port for the shift swap workflow.

use async_trait::async_trait;

use crate::domain::{Actor, Error, ShiftId, ShiftSwap, StaffId, SwapId};

/// Request offering the actor's shift in exchange for a colleague's.
#[derive(Debug, Clone)]
pub struct RequestSwapRequest {
    pub actor: Actor,
    pub requester_shift_id: ShiftId,
    pub target_staff_id: StaffId,
    pub target_shift_id: ShiftId,
    pub reason: Option<String>,
}

/// Peer or manager decision on an existing swap.
#[derive(Debug, Clone)]
pub struct SwapDecisionRequest {
    pub actor: Actor,
    pub swap_id: SwapId,
    pub notes: Option<String>,
}

impl SwapDecisionRequest {
    pub fn new(actor: Actor, swap_id: SwapId) -> Self {
        Self {
            actor,
            swap_id,
            notes: None,
        }
    }
}

/// Swap request lifecycle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShiftSwapCommand: Send + Sync {
    async fn request_swap(&self, request: RequestSwapRequest) -> Result<ShiftSwap, Error>;

    /// Target staff member agrees; the swap waits for a manager.
    async fn accept_swap(&self, request: SwapDecisionRequest) -> Result<ShiftSwap, Error>;

    async fn decline_swap(&self, request: SwapDecisionRequest) -> Result<ShiftSwap, Error>;

    /// Manager approves and shift owners are exchanged.
    async fn approve_swap(&self, request: SwapDecisionRequest) -> Result<ShiftSwap, Error>;

    async fn deny_swap(&self, request: SwapDecisionRequest) -> Result<ShiftSwap, Error>;

    /// Requester withdraws an open swap.
    async fn cancel_swap(&self, request: SwapDecisionRequest) -> Result<ShiftSwap, Error>;
}
