//! Shift swap lifecycle driven through `ShiftSwapCommand`.

use carerota::domain::ports::{
    CancelShiftRequest, RequestSwapRequest, ShiftCommand, ShiftSwapCommand, SwapDecisionRequest,
    SwapRepository, SwapRepositoryError, TimeClockRepository, TimeClockRepositoryError,
};
use carerota::domain::{
    ClockIntervalKind, ErrorCode, Shift, ShiftStatus, ShiftSwap, ShiftWrite, SwapStatus,
    TimeClockEntry, TimeClockEntryDraft, TimeEntryId, TimeEntryType,
};
use mockable::Clock;
use rstest::{fixture, rstest};

mod support;

use support::{Agency, date, instant};

/// Agency where Alice works Monday and Bob works Tuesday.
struct Rota {
    agency: Agency,
    alice_shift: Shift,
    bob_shift: Shift,
}

impl Rota {
    fn request(&self) -> RequestSwapRequest {
        RequestSwapRequest {
            actor: self.agency.alice,
            requester_shift_id: self.alice_shift.id(),
            target_staff_id: Agency::staff_id(&self.agency.bob),
            target_shift_id: self.bob_shift.id(),
            reason: Some("family wedding".to_owned()),
        }
    }

    async fn requested(&self) -> ShiftSwap {
        self.agency
            .swaps()
            .request_swap(self.request())
            .await
            .expect("swap is requested")
    }
}

#[fixture]
async fn rota() -> Rota {
    let agency = Agency::starting_at(instant(date(2024, 3, 1), 8, 0));
    let schedule = agency.schedule(date(2024, 3, 4), date(2024, 3, 10)).await;
    let alice_shift = agency.shift(&schedule, &agency.alice, date(2024, 3, 4), 9, 17).await;
    let bob_shift = agency.shift(&schedule, &agency.bob, date(2024, 3, 5), 9, 17).await;
    Rota {
        agency,
        alice_shift,
        bob_shift,
    }
}

#[rstest]
#[tokio::test]
async fn approved_swap_exchanges_owners(#[future] rota: Rota) {
    let rota = rota.await;
    let swaps = rota.agency.swaps();
    let requested = rota.requested().await;
    assert_eq!(requested.status(), SwapStatus::Requested);

    rota.agency.clock.advance_minutes(60);
    let accepted = swaps
        .accept_swap(SwapDecisionRequest::new(rota.agency.bob, requested.id()))
        .await
        .expect("target accepts");
    assert_eq!(accepted.status(), SwapStatus::PendingManager);

    rota.agency.clock.advance_minutes(60);
    let approved = swaps
        .approve_swap(SwapDecisionRequest::new(rota.agency.manager, requested.id()))
        .await
        .expect("manager approves");

    assert_eq!(approved.status(), SwapStatus::Approved);
    assert_eq!(approved.decided_by(), Some(rota.agency.manager.user_id));
    let alice_shift = rota
        .agency
        .store
        .shift(rota.alice_shift.id())
        .expect("shift is stored");
    let bob_shift = rota
        .agency
        .store
        .shift(rota.bob_shift.id())
        .expect("shift is stored");
    assert_eq!(alice_shift.staff_id(), Agency::staff_id(&rota.agency.bob));
    assert_eq!(bob_shift.staff_id(), Agency::staff_id(&rota.agency.alice));
}

#[rstest]
#[tokio::test]
async fn shift_in_an_open_swap_cannot_be_offered_again(#[future] rota: Rota) {
    let rota = rota.await;
    rota.requested().await;

    let error = rota
        .agency
        .swaps()
        .request_swap(rota.request())
        .await
        .expect_err("shifts are locked");

    assert_eq!(error.code(), ErrorCode::InvalidState);
}

#[rstest]
#[tokio::test]
async fn declining_releases_both_shifts(#[future] rota: Rota) {
    let rota = rota.await;
    let swaps = rota.agency.swaps();
    let requested = rota.requested().await;

    let declined = swaps
        .decline_swap(SwapDecisionRequest {
            actor: rota.agency.bob,
            swap_id: requested.id(),
            notes: Some("already booked".to_owned()),
        })
        .await
        .expect("target declines");
    let retried = swaps
        .request_swap(rota.request())
        .await
        .expect("shifts are free again");

    assert_eq!(declined.status(), SwapStatus::PeerDeclined);
    assert_eq!(declined.notes(), Some("already booked"));
    assert_eq!(retried.status(), SwapStatus::Requested);
}

#[rstest]
#[tokio::test]
async fn requester_cannot_accept_their_own_swap(#[future] rota: Rota) {
    let rota = rota.await;
    let requested = rota.requested().await;

    let error = rota
        .agency
        .swaps()
        .accept_swap(SwapDecisionRequest::new(rota.agency.alice, requested.id()))
        .await
        .expect_err("only the target may accept");

    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn manager_cannot_approve_before_the_peer_answers(#[future] rota: Rota) {
    let rota = rota.await;
    let requested = rota.requested().await;

    let error = rota
        .agency
        .swaps()
        .approve_swap(SwapDecisionRequest::new(rota.agency.manager, requested.id()))
        .await
        .expect_err("swap still awaits the target");

    assert_eq!(error.code(), ErrorCode::InvalidState);
    let untouched = rota
        .agency
        .store
        .shift(rota.alice_shift.id())
        .expect("shift is stored");
    assert_eq!(untouched.staff_id(), Agency::staff_id(&rota.agency.alice));
}

#[rstest]
#[tokio::test]
async fn caregivers_cannot_approve(#[future] rota: Rota) {
    let rota = rota.await;
    let swaps = rota.agency.swaps();
    let requested = rota.requested().await;
    swaps
        .accept_swap(SwapDecisionRequest::new(rota.agency.bob, requested.id()))
        .await
        .expect("target accepts");

    let error = swaps
        .approve_swap(SwapDecisionRequest::new(rota.agency.bob, requested.id()))
        .await
        .expect_err("caregiver lacks approve_swaps");

    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn cancelled_swap_is_final(#[future] rota: Rota) {
    let rota = rota.await;
    let swaps = rota.agency.swaps();
    let requested = rota.requested().await;

    let cancelled = swaps
        .cancel_swap(SwapDecisionRequest::new(rota.agency.alice, requested.id()))
        .await
        .expect("requester withdraws");
    let error = swaps
        .accept_swap(SwapDecisionRequest::new(rota.agency.bob, requested.id()))
        .await
        .expect_err("cancelled swaps cannot be accepted");

    assert_eq!(cancelled.status(), SwapStatus::Cancelled);
    assert_eq!(error.code(), ErrorCode::InvalidState);
}

#[rstest]
#[tokio::test]
async fn denied_swap_keeps_owners(#[future] rota: Rota) {
    let rota = rota.await;
    let swaps = rota.agency.swaps();
    let requested = rota.requested().await;
    swaps
        .accept_swap(SwapDecisionRequest::new(rota.agency.bob, requested.id()))
        .await
        .expect("target accepts");

    let denied = swaps
        .deny_swap(SwapDecisionRequest::new(rota.agency.manager, requested.id()))
        .await
        .expect("manager denies");

    assert_eq!(denied.status(), SwapStatus::Denied);
    let bob_shift = rota
        .agency
        .store
        .shift(rota.bob_shift.id())
        .expect("shift is stored");
    assert_eq!(bob_shift.staff_id(), Agency::staff_id(&rota.agency.bob));
}

#[rstest]
#[tokio::test]
async fn clock_in_from_a_pre_swap_snapshot_cannot_undo_the_swap(#[future] rota: Rota) {
    let rota = rota.await;
    let agency = &rota.agency;
    let swaps = agency.swaps();
    let snapshot = agency
        .store
        .shift(rota.alice_shift.id())
        .expect("shift is stored");
    let requested = rota.requested().await;
    swaps
        .accept_swap(SwapDecisionRequest::new(agency.bob, requested.id()))
        .await
        .expect("target accepts");
    swaps
        .approve_swap(SwapDecisionRequest::new(agency.manager, requested.id()))
        .await
        .expect("manager approves");

    let entry = TimeClockEntry::new(TimeClockEntryDraft {
        id: TimeEntryId::random(),
        organization_id: agency.organization_id,
        staff_id: Agency::staff_id(&agency.alice),
        shift_id: Some(snapshot.id()),
        entry_type: TimeEntryType::ClockIn,
        recorded_at: agency.clock.utc(),
        location: None,
        notes: None,
        corrects_entry_id: None,
        recorded_by: agency.alice.user_id,
    });
    let started = snapshot.start().expect("scheduled shift starts");
    let error = agency
        .store
        .open_interval(
            &entry,
            ClockIntervalKind::Work,
            Some(ShiftWrite::replacing(&snapshot, started)),
        )
        .await
        .expect_err("owner moved since the read");

    assert!(matches!(error, TimeClockRepositoryError::ShiftChanged { .. }));
    let stored = agency.store.shift(snapshot.id()).expect("shift is stored");
    assert_eq!(stored.staff_id(), Agency::staff_id(&agency.bob));
    assert_eq!(stored.status(), ShiftStatus::Scheduled);
    assert!(agency.store.entries_for(Agency::staff_id(&agency.alice)).is_empty());
}

#[rstest]
#[tokio::test]
async fn exchange_built_from_stale_shifts_is_rejected(#[future] rota: Rota) {
    let rota = rota.await;
    let agency = &rota.agency;
    let requested = rota.requested().await;
    let accepted = agency
        .swaps()
        .accept_swap(SwapDecisionRequest::new(agency.bob, requested.id()))
        .await
        .expect("target accepts");
    agency
        .shifts()
        .cancel_shift(CancelShiftRequest {
            actor: agency.manager,
            shift_id: rota.bob_shift.id(),
            reason: Some("client in hospital".to_owned()),
        })
        .await
        .expect("manager cancels Bob's shift");

    let exchange = accepted
        .approve(
            &rota.alice_shift,
            &rota.bob_shift,
            agency.manager.user_id,
            agency.clock.utc(),
            None,
        )
        .expect("snapshots still look exchangeable");
    let error = agency
        .store
        .commit_exchange(&exchange)
        .await
        .expect_err("Bob's shift changed underneath");

    assert!(matches!(error, SwapRepositoryError::Stale { .. }));
    let alice_shift = agency.store.shift(rota.alice_shift.id()).expect("stored");
    let bob_shift = agency.store.shift(rota.bob_shift.id()).expect("stored");
    assert_eq!(alice_shift.staff_id(), Agency::staff_id(&agency.alice));
    assert_eq!(bob_shift.staff_id(), Agency::staff_id(&agency.bob));
    assert_eq!(bob_shift.status(), ShiftStatus::Cancelled);
}
