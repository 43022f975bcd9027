//! Shift exchange requests and their approval state machine.
//!
//! ```text
//! requested ──accept──▶ pending_manager ──approve──▶ approved
//!     │                       └──────────deny─────▶ denied
//!     └──decline──▶ peer_declined
//! any non-terminal ──cancel──▶ cancelled
//! ```
//!
//! Peer acceptance passes through `peer_accepted` and lands on
//! `pending_manager` in one step; both are accepted as "awaiting manager".

use std::fmt;

use chrono::{DateTime, Utc};

use crate::domain::text_enum::define_text_enum;
use crate::domain::transition::InvalidTransition;
use crate::domain::{
    OrganizationId, Shift, ShiftId, ShiftStatus, ShiftWrite, StaffId, SwapId, UserId,
};

define_text_enum! {
    /// Position of a swap in its approval workflow.
    pub enum SwapStatus parse ParseSwapStatusError as "swap status" {
        /// Waiting for the target staff member.
        Requested => "requested",
        /// Target staff member agreed.
        PeerAccepted => "peer_accepted",
        /// Target staff member refused.
        PeerDeclined => "peer_declined",
        /// Waiting for a manager decision.
        PendingManager => "pending_manager",
        /// Ownership exchanged.
        Approved => "approved",
        /// Manager refused.
        Denied => "denied",
        /// Withdrawn by the requester.
        Cancelled => "cancelled",
    }
}

impl SwapStatus {
    /// Terminal swaps no longer hold their shifts.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::PeerDeclined | Self::Approved | Self::Denied | Self::Cancelled
        )
    }

    /// Peer acceptance recorded, manager decision outstanding.
    pub const fn awaits_manager(self) -> bool {
        matches!(self, Self::PeerAccepted | Self::PendingManager)
    }
}

/// Reasons a swap request is refused before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapRequestError {
    /// Both sides reference the same shift.
    SameShift,
    /// Requester and target are the same person.
    SameStaff,
    /// The requester does not own the offered shift.
    RequesterDoesNotOwnShift {
        /// Offered shift.
        shift_id: ShiftId,
    },
    /// The target staff member does not own the requested shift.
    TargetDoesNotOwnShift {
        /// Requested shift.
        shift_id: ShiftId,
    },
    /// A shift has already started, finished or been cancelled.
    ShiftNotOpen {
        /// Offending shift.
        shift_id: ShiftId,
        /// Its current status.
        status: ShiftStatus,
    },
}

impl fmt::Display for SwapRequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SameShift => write!(f, "a shift cannot be swapped with itself"),
            Self::SameStaff => write!(f, "requester and target staff must differ"),
            Self::RequesterDoesNotOwnShift { shift_id } => {
                write!(f, "requester does not own shift {shift_id}")
            }
            Self::TargetDoesNotOwnShift { shift_id } => {
                write!(f, "target staff member does not own shift {shift_id}")
            }
            Self::ShiftNotOpen { shift_id, status } => {
                write!(f, "shift {shift_id} is {status} and cannot be swapped")
            }
        }
    }
}

impl std::error::Error for SwapRequestError {}

/// Input payload for [`ShiftSwap::new`], used when loading stored swaps.
#[derive(Debug, Clone)]
pub struct ShiftSwapDraft {
    pub id: SwapId,
    pub organization_id: OrganizationId,
    pub requester_id: StaffId,
    pub requester_shift_id: ShiftId,
    pub target_staff_id: StaffId,
    pub target_shift_id: ShiftId,
    pub reason: Option<String>,
    pub status: SwapStatus,
    pub requested_at: DateTime<Utc>,
    pub peer_responded_at: Option<DateTime<Utc>>,
    pub decided_by: Option<UserId>,
    pub decided_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// A negotiated exchange of two shifts between two staff members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftSwap {
    id: SwapId,
    organization_id: OrganizationId,
    requester_id: StaffId,
    requester_shift_id: ShiftId,
    target_staff_id: StaffId,
    target_shift_id: ShiftId,
    reason: Option<String>,
    status: SwapStatus,
    requested_at: DateTime<Utc>,
    peer_responded_at: Option<DateTime<Utc>>,
    decided_by: Option<UserId>,
    decided_at: Option<DateTime<Utc>>,
    notes: Option<String>,
}

/// Everything the store must write atomically when a swap is approved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapExchange {
    /// Swap in its approved state.
    pub swap: ShiftSwap,
    /// Status the stored swap must still have for the exchange to apply.
    pub expected_status: SwapStatus,
    /// Requester's shift, now owned by the target staff member.
    pub requester_shift: ShiftWrite,
    /// Target's shift, now owned by the requester.
    pub target_shift: ShiftWrite,
}

impl ShiftSwap {
    /// Rehydrate a stored swap.
    pub fn new(draft: ShiftSwapDraft) -> Self {
        Self {
            id: draft.id,
            organization_id: draft.organization_id,
            requester_id: draft.requester_id,
            requester_shift_id: draft.requester_shift_id,
            target_staff_id: draft.target_staff_id,
            target_shift_id: draft.target_shift_id,
            reason: draft.reason,
            status: draft.status,
            requested_at: draft.requested_at,
            peer_responded_at: draft.peer_responded_at,
            decided_by: draft.decided_by,
            decided_at: draft.decided_at,
            notes: draft.notes,
        }
    }

    /// Open a new request offering `requester_shift` for `target_shift`.
    pub fn request(
        id: SwapId,
        requester_id: StaffId,
        requester_shift: &Shift,
        target_staff_id: StaffId,
        target_shift: &Shift,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Self, SwapRequestError> {
        if requester_shift.id() == target_shift.id() {
            return Err(SwapRequestError::SameShift);
        }
        if requester_id == target_staff_id {
            return Err(SwapRequestError::SameStaff);
        }
        if requester_shift.staff_id() != requester_id {
            return Err(SwapRequestError::RequesterDoesNotOwnShift {
                shift_id: requester_shift.id(),
            });
        }
        if target_shift.staff_id() != target_staff_id {
            return Err(SwapRequestError::TargetDoesNotOwnShift {
                shift_id: target_shift.id(),
            });
        }
        ensure_open(requester_shift)?;
        ensure_open(target_shift)?;

        Ok(Self::new(ShiftSwapDraft {
            id,
            organization_id: requester_shift.organization_id(),
            requester_id,
            requester_shift_id: requester_shift.id(),
            target_staff_id,
            target_shift_id: target_shift.id(),
            reason,
            status: SwapStatus::Requested,
            requested_at: at,
            peer_responded_at: None,
            decided_by: None,
            decided_at: None,
            notes: None,
        }))
    }

    /// Swap identifier.
    pub fn id(&self) -> SwapId {
        self.id
    }

    /// Organization the swap belongs to.
    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Staff member offering their shift.
    pub fn requester_id(&self) -> StaffId {
        self.requester_id
    }

    /// Shift the requester gives up.
    pub fn requester_shift_id(&self) -> ShiftId {
        self.requester_shift_id
    }

    /// Colleague asked to take the requester's shift.
    pub fn target_staff_id(&self) -> StaffId {
        self.target_staff_id
    }

    /// Shift the requester takes in return.
    pub fn target_shift_id(&self) -> ShiftId {
        self.target_shift_id
    }

    /// Free-text reason supplied with the request.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Current workflow status.
    pub fn status(&self) -> SwapStatus {
        self.status
    }

    /// When the request was opened.
    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }

    /// When the target accepted or declined.
    pub fn peer_responded_at(&self) -> Option<DateTime<Utc>> {
        self.peer_responded_at
    }

    /// Manager who approved or denied the swap.
    pub fn decided_by(&self) -> Option<UserId> {
        self.decided_by
    }

    /// When the manager decided.
    pub fn decided_at(&self) -> Option<DateTime<Utc>> {
        self.decided_at
    }

    /// Decline or decision notes.
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Both shifts referenced by the swap.
    pub fn shift_ids(&self) -> [ShiftId; 2] {
        [self.requester_shift_id, self.target_shift_id]
    }

    /// Target staff member agrees; the swap moves on to a manager.
    pub fn accept(&self, at: DateTime<Utc>) -> Result<Self, InvalidTransition> {
        self.guard("accept", |status| status == SwapStatus::Requested)?;
        Ok(Self {
            status: SwapStatus::PendingManager,
            peer_responded_at: Some(at),
            ..self.clone()
        })
    }

    /// Target staff member refuses.
    pub fn decline(&self, at: DateTime<Utc>, notes: Option<String>) -> Result<Self, InvalidTransition> {
        self.guard("decline", |status| status == SwapStatus::Requested)?;
        Ok(Self {
            status: SwapStatus::PeerDeclined,
            peer_responded_at: Some(at),
            notes,
            ..self.clone()
        })
    }

    /// Manager refuses; ownership stays as it is.
    pub fn deny(
        &self,
        manager: UserId,
        at: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<Self, InvalidTransition> {
        self.guard("deny", SwapStatus::awaits_manager)?;
        Ok(Self {
            status: SwapStatus::Denied,
            decided_by: Some(manager),
            decided_at: Some(at),
            notes,
            ..self.clone()
        })
    }

    /// Requester withdraws a swap that is still open.
    pub fn cancel(&self, at: DateTime<Utc>) -> Result<Self, InvalidTransition> {
        self.guard("cancel", |status| !status.is_terminal())?;
        Ok(Self {
            status: SwapStatus::Cancelled,
            decided_at: Some(at),
            ..self.clone()
        })
    }

    /// Manager approves; compute the ownership exchange to commit.
    ///
    /// The shifts passed in must be the current stored versions. Ownership
    /// that drifted since the request is reported as a state error.
    pub fn approve(
        &self,
        requester_shift: &Shift,
        target_shift: &Shift,
        manager: UserId,
        at: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<SwapExchange, InvalidTransition> {
        self.guard("approve", SwapStatus::awaits_manager)?;
        if requester_shift.staff_id() != self.requester_id
            || target_shift.staff_id() != self.target_staff_id
        {
            return Err(InvalidTransition::new(
                "swap",
                "approve",
                "referencing reassigned shifts",
            ));
        }
        for shift in [requester_shift, target_shift] {
            if !shift.status().is_pending() {
                return Err(InvalidTransition::new(
                    "swap",
                    "approve",
                    "referencing a shift that is no longer open",
                ));
            }
        }

        Ok(SwapExchange {
            swap: Self {
                status: SwapStatus::Approved,
                decided_by: Some(manager),
                decided_at: Some(at),
                notes,
                ..self.clone()
            },
            expected_status: self.status,
            requester_shift: ShiftWrite::replacing(
                requester_shift,
                requester_shift.reassigned_to(self.target_staff_id),
            ),
            target_shift: ShiftWrite::replacing(
                target_shift,
                target_shift.reassigned_to(self.requester_id),
            ),
        })
    }

    fn guard(
        &self,
        action: &'static str,
        allowed: impl Fn(SwapStatus) -> bool,
    ) -> Result<(), InvalidTransition> {
        if allowed(self.status) {
            Ok(())
        } else {
            Err(InvalidTransition::new("swap", action, self.status.as_str()))
        }
    }
}

fn ensure_open(shift: &Shift) -> Result<(), SwapRequestError> {
    if shift.status().is_pending() {
        Ok(())
    } else {
        Err(SwapRequestError::ShiftNotOpen {
            shift_id: shift.id(),
            status: shift.status(),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::{ScheduleId, ShiftDraft, ShiftType, TimeWindow};

    struct Pair {
        alice: StaffId,
        bob: StaffId,
        alice_shift: Shift,
        bob_shift: Shift,
    }

    fn shift_for(organization_id: OrganizationId, staff_id: StaffId, start: u32) -> Shift {
        Shift::new(ShiftDraft {
            id: ShiftId::random(),
            organization_id,
            schedule_id: ScheduleId::random(),
            staff_id,
            client_id: None,
            date: NaiveDate::from_ymd_opt(2024, 1, 2).expect("valid date"),
            window: TimeWindow::new(
                NaiveTime::from_hms_opt(start, 0, 0).expect("valid time"),
                NaiveTime::from_hms_opt(start + 4, 0, 0).expect("valid time"),
            )
            .expect("valid window"),
            break_window: None,
            meal_window: None,
            status: ShiftStatus::Scheduled,
            shift_type: ShiftType::Regular,
            notes: None,
            required_documentation: None,
        })
        .expect("valid shift")
    }

    #[fixture]
    fn pair() -> Pair {
        let organization_id = OrganizationId::random();
        let alice = StaffId::random();
        let bob = StaffId::random();
        Pair {
            alice,
            bob,
            alice_shift: shift_for(organization_id, alice, 8),
            bob_shift: shift_for(organization_id, bob, 14),
        }
    }

    fn requested(pair: &Pair) -> ShiftSwap {
        ShiftSwap::request(
            SwapId::random(),
            pair.alice,
            &pair.alice_shift,
            pair.bob,
            &pair.bob_shift,
            Some("appointment".to_owned()),
            Utc::now(),
        )
        .expect("valid request")
    }

    #[rstest]
    fn request_requires_ownership(pair: Pair) {
        let error = ShiftSwap::request(
            SwapId::random(),
            pair.bob,
            &pair.alice_shift,
            pair.alice,
            &pair.bob_shift,
            None,
            Utc::now(),
        )
        .expect_err("bob does not own alice's shift");
        assert!(matches!(
            error,
            SwapRequestError::RequesterDoesNotOwnShift { .. }
        ));
    }

    #[rstest]
    fn request_rejects_started_shifts(mut pair: Pair) {
        pair.bob_shift = pair.bob_shift.start().expect("starts");
        let error = ShiftSwap::request(
            SwapId::random(),
            pair.alice,
            &pair.alice_shift,
            pair.bob,
            &pair.bob_shift,
            None,
            Utc::now(),
        )
        .expect_err("in-progress shift cannot be swapped");
        assert!(matches!(error, SwapRequestError::ShiftNotOpen { .. }));
    }

    #[rstest]
    fn accept_then_approve_exchanges_owners(pair: Pair) {
        let swap = requested(&pair).accept(Utc::now()).expect("accepts");
        assert_eq!(swap.status(), SwapStatus::PendingManager);
        assert!(swap.peer_responded_at().is_some());

        let manager = UserId::random();
        let exchange = swap
            .approve(&pair.alice_shift, &pair.bob_shift, manager, Utc::now(), None)
            .expect("approves");

        assert_eq!(exchange.expected_status, SwapStatus::PendingManager);
        assert_eq!(exchange.swap.status(), SwapStatus::Approved);
        assert_eq!(exchange.swap.decided_by(), Some(manager));
        assert_eq!(exchange.requester_shift.shift().staff_id(), pair.bob);
        assert_eq!(exchange.target_shift.shift().staff_id(), pair.alice);
        assert_eq!(exchange.requester_shift.expected_staff(), pair.alice);
        assert_eq!(exchange.target_shift.expected_staff(), pair.bob);
    }

    #[rstest]
    fn approval_requires_peer_acceptance(pair: Pair) {
        let error = requested(&pair)
            .approve(&pair.alice_shift, &pair.bob_shift, UserId::random(), Utc::now(), None)
            .expect_err("manager cannot approve before the peer");
        assert_eq!(error.status, "requested");
    }

    #[rstest]
    fn approved_swap_cannot_be_approved_again(pair: Pair) {
        let exchange = requested(&pair)
            .accept(Utc::now())
            .expect("accepts")
            .approve(&pair.alice_shift, &pair.bob_shift, UserId::random(), Utc::now(), None)
            .expect("approves");

        let error = exchange
            .swap
            .approve(
                exchange.requester_shift.shift(),
                exchange.target_shift.shift(),
                UserId::random(),
                Utc::now(),
                None,
            )
            .expect_err("terminal swap");
        assert_eq!(error.to_string(), "cannot approve swap while it is approved");
    }

    #[rstest]
    fn approval_detects_reassigned_shift(pair: Pair) {
        let swap = requested(&pair).accept(Utc::now()).expect("accepts");
        let moved = pair.bob_shift.reassigned_to(StaffId::random());

        assert!(
            swap.approve(&pair.alice_shift, &moved, UserId::random(), Utc::now(), None)
                .is_err()
        );
    }

    #[rstest]
    #[case(SwapStatus::PeerDeclined)]
    #[case(SwapStatus::Denied)]
    #[case(SwapStatus::Cancelled)]
    fn terminal_states_reject_every_action(pair: Pair, #[case] status: SwapStatus) {
        let mut draft_swap = requested(&pair);
        draft_swap.status = status;

        assert!(draft_swap.accept(Utc::now()).is_err());
        assert!(draft_swap.decline(Utc::now(), None).is_err());
        assert!(draft_swap.deny(UserId::random(), Utc::now(), None).is_err());
        assert!(draft_swap.cancel(Utc::now()).is_err());
    }
}
