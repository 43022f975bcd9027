//! Coverage request lifecycle driven through `CoverageCommand`.

use carerota::domain::ports::{
    CoverageCommand, CoverageDecisionRequest, CoverageFilter, ListCoverageRequest,
    OpenCoverageRequest,
};
use carerota::domain::{CoverageRequestType, CoverageStatus, ErrorCode, Shift};
use rstest::{fixture, rstest};

mod support;

use support::{Agency, date, instant};

struct Rota {
    agency: Agency,
    alice_shift: Shift,
}

impl Rota {
    fn drop_request(&self) -> OpenCoverageRequest {
        OpenCoverageRequest {
            actor: self.agency.alice,
            shift_id: self.alice_shift.id(),
            requesting_staff_id: None,
            request_type: CoverageRequestType::Drop,
            reason: "Hospital appointment".to_owned(),
            notes: Some("Morning only".to_owned()),
        }
    }
}

#[fixture]
async fn rota() -> Rota {
    let agency = Agency::starting_at(instant(date(2024, 3, 1), 8, 0));
    let schedule = agency.schedule(date(2024, 3, 4), date(2024, 3, 10)).await;
    let alice_shift = agency.shift(&schedule, &agency.alice, date(2024, 3, 4), 9, 17).await;
    Rota { agency, alice_shift }
}

#[rstest]
#[tokio::test]
async fn approved_request_records_the_decision(#[future] rota: Rota) {
    let rota = rota.await;
    let coverage = rota.agency.coverage();
    let requested = coverage
        .request_coverage(rota.drop_request())
        .await
        .expect("request is filed");
    assert_eq!(requested.status(), CoverageStatus::Pending);

    rota.agency.clock.advance_minutes(30);
    let approved = coverage
        .approve_coverage(CoverageDecisionRequest {
            actor: rota.agency.manager,
            request_id: requested.id(),
            notes: Some("Bob covers".to_owned()),
        })
        .await
        .expect("manager approves");

    assert_eq!(approved.status(), CoverageStatus::Approved);
    assert_eq!(approved.responded_by(), Some(rota.agency.manager.user_id));
    assert_eq!(
        approved.notes(),
        Some("Morning only\n\nApproval Notes: Bob covers")
    );
    assert!(approved.responded_at() > Some(requested.requested_at()));
    let shift = rota
        .agency
        .store
        .shift(rota.alice_shift.id())
        .expect("shift still stored");
    assert_eq!(shift.staff_id(), rota.alice_shift.staff_id());
}

#[rstest]
#[tokio::test]
async fn one_pending_request_per_shift(#[future] rota: Rota) {
    let rota = rota.await;
    let coverage = rota.agency.coverage();
    let first = coverage
        .request_coverage(rota.drop_request())
        .await
        .expect("first request");

    let error = coverage
        .request_coverage(rota.drop_request())
        .await
        .expect_err("second pending request");
    assert_eq!(error.code(), ErrorCode::InvalidState);

    coverage
        .cancel_coverage(CoverageDecisionRequest::new(rota.agency.alice, first.id()))
        .await
        .expect("requester withdraws");
    coverage
        .request_coverage(rota.drop_request())
        .await
        .expect("shift is free again once the first request closed");
}

#[rstest]
#[tokio::test]
async fn colleague_may_ask_to_pick_up_the_shift(#[future] rota: Rota) {
    let rota = rota.await;
    let request = rota
        .agency
        .coverage()
        .request_coverage(OpenCoverageRequest {
            actor: rota.agency.bob,
            request_type: CoverageRequestType::Pickup,
            reason: "Want extra hours".to_owned(),
            notes: None,
            ..rota.drop_request()
        })
        .await
        .expect("pickup filed");
    assert_eq!(
        request.requesting_staff_id(),
        Agency::staff_id(&rota.agency.bob)
    );
}

#[rstest]
#[tokio::test]
async fn decided_request_cannot_be_decided_again(#[future] rota: Rota) {
    let rota = rota.await;
    let coverage = rota.agency.coverage();
    let requested = coverage
        .request_coverage(rota.drop_request())
        .await
        .expect("request is filed");
    coverage
        .deny_coverage(CoverageDecisionRequest::new(
            rota.agency.manager,
            requested.id(),
        ))
        .await
        .expect("manager denies");

    let error = coverage
        .approve_coverage(CoverageDecisionRequest::new(
            rota.agency.manager,
            requested.id(),
        ))
        .await
        .expect_err("already denied");
    assert_eq!(error.code(), ErrorCode::InvalidState);
}

#[rstest]
#[tokio::test]
async fn caregivers_list_their_own_requests_only(#[future] rota: Rota) {
    let rota = rota.await;
    let coverage = rota.agency.coverage();
    coverage
        .request_coverage(rota.drop_request())
        .await
        .expect("request is filed");

    let own = coverage
        .list_coverage_requests(ListCoverageRequest {
            actor: rota.agency.alice,
            filter: CoverageFilter {
                staff_id: Some(Agency::staff_id(&rota.agency.alice)),
                ..CoverageFilter::default()
            },
        })
        .await
        .expect("own requests listed");
    assert_eq!(own.len(), 1);

    let error = coverage
        .list_coverage_requests(ListCoverageRequest {
            actor: rota.agency.bob,
            filter: CoverageFilter::default(),
        })
        .await
        .expect_err("caregiver cannot list everyone's requests");
    assert_eq!(error.code(), ErrorCode::Forbidden);

    let pending = coverage
        .list_coverage_requests(ListCoverageRequest {
            actor: rota.agency.manager,
            filter: CoverageFilter {
                status: Some(CoverageStatus::Pending),
                ..CoverageFilter::default()
            },
        })
        .await
        .expect("manager lists pending requests");
    assert_eq!(pending.len(), 1);
}

#[rstest]
#[tokio::test]
async fn owner_cannot_ask_to_pick_up_their_own_shift(#[future] rota: Rota) {
    let rota = rota.await;
    let error = rota
        .agency
        .coverage()
        .request_coverage(OpenCoverageRequest {
            request_type: CoverageRequestType::Pickup,
            ..rota.drop_request()
        })
        .await
        .expect_err("pickup of own shift");
    assert_eq!(error.code(), ErrorCode::ValidationFailed);
}

#[rstest]
#[tokio::test]
async fn colleague_cannot_withdraw_someone_elses_request(#[future] rota: Rota) {
    let rota = rota.await;
    let coverage = rota.agency.coverage();
    let requested = coverage
        .request_coverage(rota.drop_request())
        .await
        .expect("request is filed");

    let error = coverage
        .cancel_coverage(CoverageDecisionRequest::new(rota.agency.bob, requested.id()))
        .await
        .expect_err("bob did not file it");
    assert_eq!(error.code(), ErrorCode::Forbidden);

    let still_pending = coverage
        .list_coverage_requests(ListCoverageRequest {
            actor: rota.agency.manager,
            filter: CoverageFilter::default(),
        })
        .await
        .expect("manager lists requests");
    assert_eq!(still_pending[0].status(), CoverageStatus::Pending);
}
