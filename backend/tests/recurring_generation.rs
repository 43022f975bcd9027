//! Recurring appointment materialisation driven through
//! `RecurringAppointmentCommand`.

use carerota::domain::ports::{
    CreateTemplateRequest, GenerateInstancesRequest, RecurringAppointmentCommand,
};
use carerota::domain::{
    AppointmentStatus, AppointmentType, ClientId, ErrorCode, RecurrencePattern,
    RecurringAppointmentTemplate, TemplateId,
};
use chrono::{NaiveDate, TimeDelta, Weekday};
use rstest::{fixture, rstest};

mod support;

use support::{Agency, SAFETY_CAP, date, instant, time};

#[fixture]
fn agency() -> Agency {
    Agency::starting_at(instant(date(2024, 1, 1), 7, 0))
}

fn template_request(
    agency: &Agency,
    pattern: RecurrencePattern,
    start_date: NaiveDate,
    max_occurrences: Option<u32>,
) -> CreateTemplateRequest {
    CreateTemplateRequest {
        actor: agency.manager,
        client_id: agency.client_id,
        staff_id: Agency::staff_id(&agency.alice),
        appointment_type: AppointmentType::Therapy,
        title: "Physio".to_owned(),
        description: None,
        location: Some("Day centre".to_owned()),
        start_time: time(10, 30),
        duration_minutes: 45,
        pattern,
        weekdays: vec![Weekday::Mon, Weekday::Wed, Weekday::Fri],
        start_date,
        end_date: None,
        max_occurrences,
    }
}

async fn create(agency: &Agency, request: CreateTemplateRequest) -> RecurringAppointmentTemplate {
    agency
        .recurring()
        .create_template(request)
        .await
        .expect("template is created")
}

fn window(
    agency: &Agency,
    template_id: TemplateId,
    start: NaiveDate,
    end: NaiveDate,
) -> GenerateInstancesRequest {
    GenerateInstancesRequest {
        actor: agency.manager,
        template_id,
        window_start: start,
        window_end: end,
    }
}

#[rstest]
#[tokio::test]
async fn weekly_template_fills_matching_weekdays_once(agency: Agency) {
    let template = create(
        &agency,
        template_request(&agency, RecurrencePattern::Weekly, date(2024, 3, 4), None),
    )
    .await;
    let service = agency.recurring();
    let request = window(&agency, template.id(), date(2024, 3, 4), date(2024, 3, 17));

    let created = service
        .generate_recurring_instances(request)
        .await
        .expect("instances are generated");
    let rerun = service
        .generate_recurring_instances(request)
        .await
        .expect("rerun succeeds");

    assert_eq!(created.len(), 6);
    assert!(rerun.is_empty());
    assert_eq!(agency.store.appointments().len(), 6);
    let first = &created[0];
    assert_eq!(first.start(), date(2024, 3, 4).and_time(time(10, 30)));
    assert_eq!(first.end() - first.start(), TimeDelta::minutes(45));
    assert_eq!(first.status(), AppointmentStatus::Scheduled);
    assert_eq!(first.template_id(), Some(template.id()));
}

#[rstest]
#[tokio::test]
async fn occurrence_cap_spans_runs(agency: Agency) {
    let template = create(
        &agency,
        template_request(&agency, RecurrencePattern::Weekly, date(2024, 3, 4), Some(4)),
    )
    .await;
    let service = agency.recurring();

    let first_run = service
        .generate_recurring_instances(window(
            &agency,
            template.id(),
            date(2024, 3, 4),
            date(2024, 3, 17),
        ))
        .await
        .expect("first run");
    let second_run = service
        .generate_recurring_instances(window(
            &agency,
            template.id(),
            date(2024, 3, 18),
            date(2024, 3, 31),
        ))
        .await
        .expect("second run");

    assert_eq!(first_run.len(), 4);
    assert!(second_run.is_empty());
}

#[rstest]
#[tokio::test]
async fn later_window_first_leaves_only_the_remainder_for_earlier_dates(agency: Agency) {
    let template = create(
        &agency,
        template_request(&agency, RecurrencePattern::Weekly, date(2024, 3, 4), Some(5)),
    )
    .await;
    let service = agency.recurring();

    let later = service
        .generate_recurring_instances(window(
            &agency,
            template.id(),
            date(2024, 3, 18),
            date(2024, 3, 24),
        ))
        .await
        .expect("later window first");
    let earlier = service
        .generate_recurring_instances(window(
            &agency,
            template.id(),
            date(2024, 3, 4),
            date(2024, 3, 17),
        ))
        .await
        .expect("earlier window second");

    assert_eq!(later.len(), 3);
    let starts: Vec<_> = earlier.iter().map(|a| a.start().date()).collect();
    assert_eq!(starts, vec![date(2024, 3, 4), date(2024, 3, 6)]);
    assert_eq!(agency.store.appointments().len(), 5);
}

#[rstest]
#[tokio::test]
async fn concurrent_runs_share_one_occurrence_cap(agency: Agency) {
    let template = create(
        &agency,
        template_request(&agency, RecurrencePattern::Weekly, date(2024, 3, 4), Some(4)),
    )
    .await;
    let first = agency.recurring();
    let second = agency.recurring();

    let (left, right) = tokio::join!(
        first.generate_recurring_instances(window(
            &agency,
            template.id(),
            date(2024, 3, 4),
            date(2024, 3, 17),
        )),
        second.generate_recurring_instances(window(
            &agency,
            template.id(),
            date(2024, 3, 18),
            date(2024, 3, 31),
        )),
    );

    let total = left.expect("first run").len() + right.expect("second run").len();
    assert_eq!(total, 4);
    assert_eq!(agency.store.appointments().len(), 4);
}

#[rstest]
#[tokio::test]
async fn monthly_template_skips_short_months(agency: Agency) {
    let template = create(
        &agency,
        template_request(&agency, RecurrencePattern::Monthly, date(2024, 1, 31), None),
    )
    .await;

    let created = agency
        .recurring()
        .generate_recurring_instances(window(
            &agency,
            template.id(),
            date(2024, 1, 1),
            date(2024, 5, 31),
        ))
        .await
        .expect("instances are generated");

    let dates: Vec<NaiveDate> = created
        .iter()
        .map(|appointment| appointment.start().date())
        .collect();
    assert_eq!(dates, [date(2024, 1, 31), date(2024, 3, 31), date(2024, 5, 31)]);
}

#[rstest]
#[tokio::test]
async fn uncapped_daily_template_stops_at_the_safety_cap(agency: Agency) {
    let template = create(
        &agency,
        template_request(&agency, RecurrencePattern::Daily, date(2024, 1, 1), None),
    )
    .await;

    let created = agency
        .recurring()
        .generate_recurring_instances(window(
            &agency,
            template.id(),
            date(2024, 1, 1),
            date(2024, 12, 31),
        ))
        .await
        .expect("instances are generated");

    assert_eq!(created.len(), usize::try_from(SAFETY_CAP).expect("cap fits usize"));
}

#[rstest]
#[tokio::test]
async fn custom_pattern_produces_nothing(agency: Agency) {
    let template = create(
        &agency,
        template_request(&agency, RecurrencePattern::Custom, date(2024, 1, 1), None),
    )
    .await;

    let created = agency
        .recurring()
        .generate_recurring_instances(window(
            &agency,
            template.id(),
            date(2024, 1, 1),
            date(2024, 1, 31),
        ))
        .await
        .expect("generation runs");

    assert!(created.is_empty());
}

#[rstest]
#[tokio::test]
async fn unknown_template_is_not_found(agency: Agency) {
    let error = agency
        .recurring()
        .generate_recurring_instances(window(
            &agency,
            TemplateId::random(),
            date(2024, 1, 1),
            date(2024, 1, 31),
        ))
        .await
        .expect_err("template does not exist");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn unregistered_client_cannot_get_a_template(agency: Agency) {
    let request = CreateTemplateRequest {
        client_id: ClientId::random(),
        ..template_request(&agency, RecurrencePattern::Weekly, date(2024, 3, 4), None)
    };

    let error = agency
        .recurring()
        .create_template(request)
        .await
        .expect_err("client is unknown");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn caregivers_cannot_manage_templates(agency: Agency) {
    let request = CreateTemplateRequest {
        actor: agency.alice,
        ..template_request(&agency, RecurrencePattern::Weekly, date(2024, 3, 4), None)
    };

    let error = agency
        .recurring()
        .create_template(request)
        .await
        .expect_err("caregiver lacks the capability");

    assert_eq!(error.code(), ErrorCode::Forbidden);
}
