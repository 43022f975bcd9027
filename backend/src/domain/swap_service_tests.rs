//! Tests for the shift swap service.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    FixtureCapabilityCheck, MockAvailabilityRepository, MockConflictRepository,
    MockScheduleRepository, MockSwapRepository,
};
use crate::domain::{
    ErrorCode, ScheduleId, ShiftDraft, ShiftStatus, ShiftType, SwapStatus, TimeWindow, UserId,
};
use crate::test_support::MutableClock;

type Service = SwapService<
    MockScheduleRepository,
    MockAvailabilityRepository,
    MockConflictRepository,
    MockSwapRepository,
    FixtureCapabilityCheck,
>;

struct World {
    organization_id: OrganizationId,
    requester: StaffId,
    target: StaffId,
    requester_shift: Shift,
    target_shift: Shift,
}

impl World {
    fn actor_for(&self, staff_id: StaffId) -> Actor {
        Actor::new(UserId::random(), self.organization_id).with_staff(staff_id)
    }

    fn manager(&self) -> Actor {
        Actor::new(UserId::random(), self.organization_id)
    }

    fn swap(&self, status: SwapStatus) -> ShiftSwap {
        ShiftSwap::new(crate::domain::ShiftSwapDraft {
            id: SwapId::random(),
            organization_id: self.organization_id,
            requester_id: self.requester,
            requester_shift_id: self.requester_shift.id(),
            target_staff_id: self.target,
            target_shift_id: self.target_shift.id(),
            reason: None,
            status,
            requested_at: Utc::now(),
            peer_responded_at: None,
            decided_by: None,
            decided_at: None,
            notes: None,
        })
    }

    fn shifts(&self) -> Vec<Shift> {
        vec![self.requester_shift.clone(), self.target_shift.clone()]
    }
}

fn shift(organization_id: OrganizationId, staff_id: StaffId, day: u32) -> Shift {
    Shift::new(ShiftDraft {
        id: ShiftId::random(),
        organization_id,
        schedule_id: ScheduleId::random(),
        staff_id,
        client_id: None,
        date: NaiveDate::from_ymd_opt(2024, 5, day).expect("valid date"),
        window: TimeWindow::new(
            NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"),
            NaiveTime::from_hms_opt(17, 0, 0).expect("valid time"),
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
fn world() -> World {
    let organization_id = OrganizationId::random();
    let requester = StaffId::random();
    let target = StaffId::random();
    World {
        organization_id,
        requester,
        target,
        requester_shift: shift(organization_id, requester, 6),
        target_shift: shift(organization_id, target, 7),
    }
}

fn build(
    schedules: MockScheduleRepository,
    availability: MockAvailabilityRepository,
    conflicts: MockConflictRepository,
    swaps: MockSwapRepository,
) -> Service {
    SwapService::new(
        Arc::new(schedules),
        Arc::new(availability),
        Arc::new(conflicts),
        Arc::new(swaps),
        Arc::new(FixtureCapabilityCheck),
        Arc::new(MutableClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
                .single()
                .expect("valid fixture timestamp"),
        )),
    )
}

fn schedules_serving(shifts: Vec<Shift>) -> MockScheduleRepository {
    let mut schedules = MockScheduleRepository::new();
    schedules
        .expect_find_shift()
        .returning(move |_, shift_id| Ok(shifts.iter().find(|s| s.id() == shift_id).cloned()));
    schedules
}

#[rstest]
#[tokio::test]
async fn request_from_non_staff_actor_is_forbidden(world: World) {
    let service = build(
        MockScheduleRepository::new(),
        MockAvailabilityRepository::new(),
        MockConflictRepository::new(),
        MockSwapRepository::new(),
    );
    let error = service
        .request_swap(RequestSwapRequest {
            actor: world.manager(),
            requester_shift_id: world.requester_shift.id(),
            target_staff_id: world.target,
            target_shift_id: world.target_shift.id(),
            reason: None,
        })
        .await
        .expect_err("managers do not own shifts");

    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn locked_shift_is_invalid_state(world: World) {
    let mut swaps = MockSwapRepository::new();
    swaps
        .expect_insert()
        .return_once(|_| Err(SwapRepositoryError::shift_locked("shift_swap_locks_pkey")));

    let service = build(
        schedules_serving(world.shifts()),
        MockAvailabilityRepository::new(),
        MockConflictRepository::new(),
        swaps,
    );
    let error = service
        .request_swap(RequestSwapRequest {
            actor: world.actor_for(world.requester),
            requester_shift_id: world.requester_shift.id(),
            target_staff_id: world.target,
            target_shift_id: world.target_shift.id(),
            reason: Some("Childcare".to_owned()),
        })
        .await
        .expect_err("shift already in an open swap");

    assert_eq!(error.code(), ErrorCode::InvalidState);
}

#[rstest]
#[tokio::test]
async fn request_for_shift_the_target_does_not_own_is_rejected(world: World) {
    let mut swaps = MockSwapRepository::new();
    swaps.expect_insert().times(0);

    let service = build(
        schedules_serving(world.shifts()),
        MockAvailabilityRepository::new(),
        MockConflictRepository::new(),
        swaps,
    );
    let error = service
        .request_swap(RequestSwapRequest {
            actor: world.actor_for(world.requester),
            requester_shift_id: world.requester_shift.id(),
            target_staff_id: StaffId::random(),
            target_shift_id: world.target_shift.id(),
            reason: None,
        })
        .await
        .expect_err("ownership mismatch");

    assert_eq!(error.code(), ErrorCode::ValidationFailed);
}

#[rstest]
#[tokio::test]
async fn only_the_target_may_accept(world: World) {
    let stored = world.swap(SwapStatus::Requested);
    let mut swaps = MockSwapRepository::new();
    swaps.expect_find().return_once(move |_, _| Ok(Some(stored)));
    swaps.expect_transition().times(0);

    let service = build(
        MockScheduleRepository::new(),
        MockAvailabilityRepository::new(),
        MockConflictRepository::new(),
        swaps,
    );
    let error = service
        .accept_swap(SwapDecisionRequest::new(
            world.actor_for(world.requester),
            SwapId::random(),
        ))
        .await
        .expect_err("requester cannot accept their own request");

    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn accept_moves_straight_to_manager(world: World) {
    let stored = world.swap(SwapStatus::Requested);
    let mut swaps = MockSwapRepository::new();
    swaps.expect_find().return_once(move |_, _| Ok(Some(stored)));
    swaps
        .expect_transition()
        .withf(|swap, expected| {
            swap.status() == SwapStatus::PendingManager && *expected == SwapStatus::Requested
        })
        .times(1)
        .return_once(|_, _| Ok(()));

    let service = build(
        MockScheduleRepository::new(),
        MockAvailabilityRepository::new(),
        MockConflictRepository::new(),
        swaps,
    );
    let accepted = service
        .accept_swap(SwapDecisionRequest::new(
            world.actor_for(world.target),
            SwapId::random(),
        ))
        .await
        .expect("target accepts");

    assert_eq!(accepted.status(), SwapStatus::PendingManager);
    assert!(accepted.peer_responded_at().is_some());
}

#[rstest]
#[tokio::test]
async fn approve_commits_exchange_and_rechecks_both_shifts(world: World) {
    let stored = world.swap(SwapStatus::PendingManager);
    let requester = world.requester;
    let target = world.target;

    let mut schedules = schedules_serving(world.shifts());
    schedules
        .expect_list_active_shifts_for_staff()
        .times(2)
        .returning(|_, _, _| Ok(Vec::new()));
    let mut availability = MockAvailabilityRepository::new();
    availability
        .expect_list_for_weekday()
        .times(2)
        .returning(|_, _, _| Ok(Vec::new()));
    let mut swaps = MockSwapRepository::new();
    swaps.expect_find().return_once(move |_, _| Ok(Some(stored)));
    swaps
        .expect_commit_exchange()
        .withf(move |exchange| {
            exchange.requester_shift.shift().staff_id() == target
                && exchange.target_shift.shift().staff_id() == requester
                && exchange.expected_status == SwapStatus::PendingManager
        })
        .times(1)
        .return_once(|_| Ok(()));

    let service = build(schedules, availability, MockConflictRepository::new(), swaps);
    let approved = service
        .approve_swap(SwapDecisionRequest::new(world.manager(), SwapId::random()))
        .await
        .expect("manager approves");

    assert_eq!(approved.status(), SwapStatus::Approved);
    assert!(approved.decided_by().is_some());
}

#[rstest]
#[tokio::test]
async fn stale_exchange_is_invalid_state(world: World) {
    let stored = world.swap(SwapStatus::PendingManager);
    let mut swaps = MockSwapRepository::new();
    swaps.expect_find().return_once(move |_, _| Ok(Some(stored)));
    swaps
        .expect_commit_exchange()
        .return_once(|_| Err(SwapRepositoryError::stale("swap status changed")));

    let service = build(
        schedules_serving(world.shifts()),
        MockAvailabilityRepository::new(),
        MockConflictRepository::new(),
        swaps,
    );
    let error = service
        .approve_swap(SwapDecisionRequest::new(world.manager(), SwapId::random()))
        .await
        .expect_err("concurrent decision wins");

    assert_eq!(error.code(), ErrorCode::InvalidState);
}

#[rstest]
#[case(SwapStatus::Approved, "cannot approve swap while it is approved")]
#[case(SwapStatus::Requested, "cannot approve swap while it is requested")]
#[tokio::test]
async fn approve_out_of_order_names_current_status(
    world: World,
    #[case] status: SwapStatus,
    #[case] message: &str,
) {
    let stored = world.swap(status);
    let mut swaps = MockSwapRepository::new();
    swaps.expect_find().return_once(move |_, _| Ok(Some(stored)));
    swaps.expect_commit_exchange().times(0);

    let service = build(
        schedules_serving(world.shifts()),
        MockAvailabilityRepository::new(),
        MockConflictRepository::new(),
        swaps,
    );
    let error = service
        .approve_swap(SwapDecisionRequest::new(world.manager(), SwapId::random()))
        .await
        .expect_err("not awaiting a manager");

    assert_eq!(error.code(), ErrorCode::InvalidState);
    assert_eq!(error.message(), message);
}
