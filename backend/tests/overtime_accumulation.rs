//! Weekly overtime buckets fed by completed sessions.

use std::sync::Arc;

use carerota::domain::ports::{OvertimeQuery, OvertimeSummaryRequest};
use carerota::domain::{ErrorCode, OvertimeAccumulator, OvertimePolicy, WorkedDuration};
use carerota::test_support::MemoryStore;
use chrono::{NaiveDate, TimeDelta};
use chrono_tz::Tz;
use rstest::{fixture, rstest};

mod support;

use support::{Agency, date, instant};

#[fixture]
fn agency() -> Agency {
    Agency::starting_at(instant(date(2024, 3, 1), 8, 0))
}

fn accumulator(agency: &Agency, timezone: Tz) -> OvertimeAccumulator<MemoryStore> {
    OvertimeAccumulator::new(
        Arc::clone(&agency.store),
        OvertimePolicy::new(WorkedDuration::from_hours(40), timezone),
    )
}

async fn work(
    accumulator: &OvertimeAccumulator<MemoryStore>,
    agency: &Agency,
    day: NaiveDate,
    hours: i64,
) {
    let start = instant(day, 8, 0);
    accumulator
        .record_session(
            agency.organization_id,
            Agency::staff_id(&agency.alice),
            start,
            start + TimeDelta::hours(hours),
        )
        .await
        .expect("session is recorded");
}

#[rstest]
#[tokio::test]
async fn hours_past_the_weekly_threshold_become_overtime(agency: Agency) {
    let accumulator = accumulator(&agency, Tz::UTC);
    for day in 4..8 {
        work(&accumulator, &agency, date(2024, 3, day), 9).await;
    }

    let friday = instant(date(2024, 3, 8), 8, 0);
    let record = accumulator
        .record_session(
            agency.organization_id,
            Agency::staff_id(&agency.alice),
            friday,
            friday + TimeDelta::hours(9),
        )
        .await
        .expect("session is recorded");

    assert_eq!(record.week_start(), date(2024, 3, 4));
    assert_eq!(record.regular(), WorkedDuration::from_hours(40));
    assert_eq!(record.overtime(), WorkedDuration::from_hours(5));
    assert_eq!(record.double_time(), WorkedDuration::ZERO);
    assert_eq!(record.total(), WorkedDuration::from_hours(45));
}

#[rstest]
#[tokio::test]
async fn week_follows_the_agency_timezone(agency: Agency) {
    let accumulator = accumulator(&agency, Tz::America__New_York);
    // Sunday 23:00 in New York is already Monday in UTC.
    let clock_in = instant(date(2024, 3, 11), 3, 0);

    let record = accumulator
        .record_session(
            agency.organization_id,
            Agency::staff_id(&agency.alice),
            clock_in,
            clock_in + TimeDelta::hours(2),
        )
        .await
        .expect("session is recorded");

    assert_eq!(record.week_start(), date(2024, 3, 4));
}

#[rstest]
#[tokio::test]
async fn reversed_session_is_rejected(agency: Agency) {
    let accumulator = accumulator(&agency, Tz::UTC);
    let clock_in = instant(date(2024, 3, 4), 17, 0);

    let error = accumulator
        .record_session(
            agency.organization_id,
            Agency::staff_id(&agency.alice),
            clock_in,
            clock_in - TimeDelta::hours(1),
        )
        .await
        .expect_err("clock-out precedes clock-in");

    assert_eq!(error.code(), ErrorCode::ValidationFailed);
}

#[rstest]
#[tokio::test]
async fn summary_covers_every_week_touching_the_range(agency: Agency) {
    let accumulator = accumulator(&agency, Tz::UTC);
    work(&accumulator, &agency, date(2024, 3, 4), 6).await;
    work(&accumulator, &agency, date(2024, 3, 12), 7).await;
    work(&accumulator, &agency, date(2024, 3, 25), 8).await;

    let summary = agency
        .overtime()
        .get_overtime_summary(OvertimeSummaryRequest {
            actor: agency.manager,
            staff_id: Agency::staff_id(&agency.alice),
            from: date(2024, 3, 6),
            to: date(2024, 3, 17),
        })
        .await
        .expect("summary is available");

    let weeks: Vec<NaiveDate> = summary.weeks.iter().map(|week| week.week_start()).collect();
    assert_eq!(weeks, [date(2024, 3, 4), date(2024, 3, 11)]);
    assert_eq!(summary.totals.regular, WorkedDuration::from_hours(13));
    assert_eq!(summary.totals.total(), WorkedDuration::from_hours(13));
}

#[rstest]
#[tokio::test]
async fn caregivers_cannot_read_overtime(agency: Agency) {
    let error = agency
        .overtime()
        .get_overtime_summary(OvertimeSummaryRequest {
            actor: agency.alice,
            staff_id: Agency::staff_id(&agency.alice),
            from: date(2024, 3, 4),
            to: date(2024, 3, 10),
        })
        .await
        .expect_err("caregiver lacks view_overtime");

    assert_eq!(error.code(), ErrorCode::Forbidden);
}
