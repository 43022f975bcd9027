//! Recurring appointment templates and the appointments they expand into.
//!
//! Appointment times are agency wall-clock values (`NaiveDateTime`), the same
//! convention shifts use for their dates and windows.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Weekday};

use crate::domain::text_enum::define_text_enum;
use crate::domain::{AppointmentId, ClientId, OrganizationId, StaffId, TemplateId};

define_text_enum! {
    /// How a template repeats.
    pub enum RecurrencePattern parse ParseRecurrencePatternError as "recurrence pattern" {
        /// Every day.
        Daily => "daily",
        /// Selected weekdays.
        Weekly => "weekly",
        /// The start date's day of month.
        Monthly => "monthly",
        /// Not expanded.
        Custom => "custom",
    }
}

define_text_enum! {
    /// Purpose of an appointment.
    pub enum AppointmentType parse ParseAppointmentTypeError as "appointment type" {
        /// Doctor or clinic.
        Medical => "medical",
        /// Physio, speech or other therapy.
        Therapy => "therapy",
        /// Social activity.
        Social => "social",
        /// Legal matters.
        Legal => "legal",
        /// Family visit.
        FamilyVisit => "family_visit",
        /// Trip out.
        Outing => "outing",
    }
}

define_text_enum! {
    /// Appointment lifecycle.
    pub enum AppointmentStatus parse ParseAppointmentStatusError as "appointment status" {
        /// Planned.
        Scheduled => "scheduled",
        /// Confirmed with the provider.
        Confirmed => "confirmed",
        /// Underway.
        InProgress => "in_progress",
        /// Attended.
        Completed => "completed",
        /// Called off.
        Cancelled => "cancelled",
        /// Missed.
        NoShow => "no_show",
    }
}

/// Validation errors raised by template and window constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceValidationError {
    /// Title was blank once trimmed.
    BlankTitle,
    /// Appointments must last at least a minute.
    ZeroDuration,
    /// Weekly templates need at least one weekday.
    NoWeekdays,
    /// Template ends before it starts.
    EndsBeforeStart {
        /// Template start date.
        start: NaiveDate,
        /// Template end date.
        end: NaiveDate,
    },
    /// A zero occurrence cap would never generate anything.
    ZeroMaxOccurrences,
    /// Materialisation window ends before it starts.
    WindowEndsBeforeStart {
        /// Window start.
        start: NaiveDate,
        /// Window end.
        end: NaiveDate,
    },
}

impl fmt::Display for RecurrenceValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "template title must not be blank"),
            Self::ZeroDuration => write!(f, "appointment duration must be at least one minute"),
            Self::NoWeekdays => write!(f, "weekly templates need at least one weekday"),
            Self::EndsBeforeStart { start, end } => {
                write!(f, "template end date {end} must not precede start date {start}")
            }
            Self::ZeroMaxOccurrences => write!(f, "max occurrences must be positive when set"),
            Self::WindowEndsBeforeStart { start, end } => {
                write!(f, "window end {end} must not precede window start {start}")
            }
        }
    }
}

impl std::error::Error for RecurrenceValidationError {}

/// Inclusive date range to materialise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RecurrenceValidationError> {
        if end < start {
            return Err(RecurrenceValidationError::WindowEndsBeforeStart { start, end });
        }
        Ok(Self { start, end })
    }

    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    pub const fn end(&self) -> NaiveDate {
        self.end
    }
}

/// Input payload for [`RecurringAppointmentTemplate::new`].
#[derive(Debug, Clone)]
pub struct RecurringAppointmentTemplateDraft {
    pub id: TemplateId,
    pub organization_id: OrganizationId,
    pub client_id: ClientId,
    pub staff_id: StaffId,
    pub appointment_type: AppointmentType,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: NaiveTime,
    pub duration_minutes: u32,
    pub pattern: RecurrencePattern,
    pub weekdays: Vec<Weekday>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub max_occurrences: Option<u32>,
    pub is_active: bool,
}

/// A rule expanded into concrete appointments over a date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurringAppointmentTemplate {
    id: TemplateId,
    organization_id: OrganizationId,
    client_id: ClientId,
    staff_id: StaffId,
    appointment_type: AppointmentType,
    title: String,
    description: Option<String>,
    location: Option<String>,
    start_time: NaiveTime,
    duration_minutes: u32,
    pattern: RecurrencePattern,
    weekdays: Vec<Weekday>,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    max_occurrences: Option<u32>,
    is_active: bool,
}

impl RecurringAppointmentTemplate {
    /// Creates a validated template.
    pub fn new(draft: RecurringAppointmentTemplateDraft) -> Result<Self, RecurrenceValidationError> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(RecurrenceValidationError::BlankTitle);
        }
        if draft.duration_minutes == 0 {
            return Err(RecurrenceValidationError::ZeroDuration);
        }
        if draft.pattern == RecurrencePattern::Weekly && draft.weekdays.is_empty() {
            return Err(RecurrenceValidationError::NoWeekdays);
        }
        if let Some(end) = draft.end_date
            && end < draft.start_date
        {
            return Err(RecurrenceValidationError::EndsBeforeStart {
                start: draft.start_date,
                end,
            });
        }
        if draft.max_occurrences == Some(0) {
            return Err(RecurrenceValidationError::ZeroMaxOccurrences);
        }

        let mut weekdays = draft.weekdays;
        weekdays.sort_by_key(Weekday::num_days_from_monday);
        weekdays.dedup();

        Ok(Self {
            id: draft.id,
            organization_id: draft.organization_id,
            client_id: draft.client_id,
            staff_id: draft.staff_id,
            appointment_type: draft.appointment_type,
            title: title.to_owned(),
            description: draft.description,
            location: draft.location,
            start_time: draft.start_time,
            duration_minutes: draft.duration_minutes,
            pattern: draft.pattern,
            weekdays,
            start_date: draft.start_date,
            end_date: draft.end_date,
            max_occurrences: draft.max_occurrences,
            is_active: draft.is_active,
        })
    }

    /// Template identifier.
    pub fn id(&self) -> TemplateId {
        self.id
    }

    /// Organization the template belongs to.
    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Client the appointments are for.
    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Staff member attending every instance.
    pub fn staff_id(&self) -> StaffId {
        self.staff_id
    }

    /// Category copied onto each instance.
    pub fn appointment_type(&self) -> AppointmentType {
        self.appointment_type
    }

    /// Trimmed, non-blank title.
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Optional description copied onto each instance.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Optional location copied onto each instance.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Local start time of every instance.
    pub fn start_time(&self) -> NaiveTime {
        self.start_time
    }

    /// Length of every instance; always positive.
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    /// How dates repeat.
    pub fn pattern(&self) -> RecurrencePattern {
        self.pattern
    }

    /// Weekdays for weekly templates, Monday first and deduplicated.
    pub fn weekdays(&self) -> &[Weekday] {
        self.weekdays.as_slice()
    }

    /// First date the template may produce.
    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Last date the template may produce, when bounded.
    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    /// Lifetime cap on instances across every generation run.
    pub fn max_occurrences(&self) -> Option<u32> {
        self.max_occurrences
    }

    /// Generation refuses inactive templates.
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Template range intersected with `window`; `None` when they are disjoint.
    pub fn effective_range(&self, window: DateWindow) -> Option<(NaiveDate, NaiveDate)> {
        let start = window.start().max(self.start_date);
        let end = self
            .end_date
            .map_or(window.end(), |end| end.min(window.end()));
        (start <= end).then_some((start, end))
    }

    /// Dates the template produces inside `window`, in ascending order.
    ///
    /// Monthly templates skip months without the start date's day; custom
    /// templates produce nothing.
    pub fn occurrence_dates(&self, window: DateWindow) -> Vec<NaiveDate> {
        let Some((start, end)) = self.effective_range(window) else {
            return Vec::new();
        };
        let days = start.iter_days().take_while(|date| *date <= end);

        match self.pattern {
            RecurrencePattern::Daily => days.collect(),
            RecurrencePattern::Weekly => days
                .filter(|date| self.weekdays.contains(&date.weekday()))
                .collect(),
            RecurrencePattern::Monthly => {
                let day = self.start_date.day();
                days.filter(|date| date.day() == day).collect()
            }
            RecurrencePattern::Custom => Vec::new(),
        }
    }

    /// How many more instances may be created given `existing` ones.
    ///
    /// Without an occurrence cap the per-run `safety_cap` applies.
    pub fn remaining_allowance(&self, existing: u64, safety_cap: u32) -> u64 {
        match self.max_occurrences {
            Some(max) => u64::from(max).saturating_sub(existing),
            None => u64::from(safety_cap),
        }
    }

    /// Concrete appointment for `date`.
    pub fn instance_on(&self, id: AppointmentId, date: NaiveDate) -> Appointment {
        let start = date.and_time(self.start_time);
        Appointment {
            id,
            organization_id: self.organization_id,
            template_id: Some(self.id),
            client_id: self.client_id,
            staff_id: self.staff_id,
            appointment_type: self.appointment_type,
            title: self.title.clone(),
            description: self.description.clone(),
            location: self.location.clone(),
            start,
            end: start + TimeDelta::minutes(i64::from(self.duration_minutes)),
            status: AppointmentStatus::Scheduled,
            notes: Some(format!("Generated from recurring appointment: {}", self.title)),
        }
    }
}

/// One concrete appointment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appointment {
    pub(crate) id: AppointmentId,
    pub(crate) organization_id: OrganizationId,
    pub(crate) template_id: Option<TemplateId>,
    pub(crate) client_id: ClientId,
    pub(crate) staff_id: StaffId,
    pub(crate) appointment_type: AppointmentType,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) location: Option<String>,
    pub(crate) start: NaiveDateTime,
    pub(crate) end: NaiveDateTime,
    pub(crate) status: AppointmentStatus,
    pub(crate) notes: Option<String>,
}

impl Appointment {
    pub fn id(&self) -> AppointmentId {
        self.id
    }

    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    pub fn template_id(&self) -> Option<TemplateId> {
        self.template_id
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn staff_id(&self) -> StaffId {
        self.staff_id
    }

    pub fn appointment_type(&self) -> AppointmentType {
        self.appointment_type
    }

    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn status(&self) -> AppointmentStatus {
        self.status
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).expect("valid date")
    }

    fn window(start: NaiveDate, end: NaiveDate) -> DateWindow {
        DateWindow::new(start, end).expect("valid window")
    }

    #[fixture]
    fn draft() -> RecurringAppointmentTemplateDraft {
        RecurringAppointmentTemplateDraft {
            id: TemplateId::random(),
            organization_id: OrganizationId::random(),
            client_id: ClientId::random(),
            staff_id: StaffId::random(),
            appointment_type: AppointmentType::Therapy,
            title: "Physio".to_owned(),
            description: None,
            location: Some("Clinic".to_owned()),
            start_time: NaiveTime::from_hms_opt(10, 30, 0).expect("valid time"),
            duration_minutes: 45,
            pattern: RecurrencePattern::Weekly,
            weekdays: vec![Weekday::Fri, Weekday::Mon, Weekday::Wed],
            start_date: date(1, 1),
            end_date: None,
            max_occurrences: None,
            is_active: true,
        }
    }

    #[rstest]
    fn weekly_mon_wed_fri_in_first_week(draft: RecurringAppointmentTemplateDraft) {
        let template = RecurringAppointmentTemplate::new(draft).expect("valid template");
        let dates = template.occurrence_dates(window(date(1, 1), date(1, 7)));
        assert_eq!(dates, vec![date(1, 1), date(1, 3), date(1, 5)]);
    }

    #[rstest]
    fn daily_respects_template_end(mut draft: RecurringAppointmentTemplateDraft) {
        draft.pattern = RecurrencePattern::Daily;
        draft.end_date = Some(date(1, 3));
        let template = RecurringAppointmentTemplate::new(draft).expect("valid template");

        let dates = template.occurrence_dates(window(date(1, 2), date(1, 10)));
        assert_eq!(dates, vec![date(1, 2), date(1, 3)]);
    }

    #[rstest]
    fn monthly_skips_short_months(mut draft: RecurringAppointmentTemplateDraft) {
        draft.pattern = RecurrencePattern::Monthly;
        draft.start_date = date(1, 31);
        let template = RecurringAppointmentTemplate::new(draft).expect("valid template");

        let dates = template.occurrence_dates(window(date(1, 1), date(5, 31)));
        assert_eq!(dates, vec![date(1, 31), date(3, 31), date(5, 31)]);
    }

    #[rstest]
    fn monthly_matches_day_even_when_window_starts_mid_month(
        mut draft: RecurringAppointmentTemplateDraft,
    ) {
        draft.pattern = RecurrencePattern::Monthly;
        draft.start_date = date(1, 15);
        let template = RecurringAppointmentTemplate::new(draft).expect("valid template");

        let dates = template.occurrence_dates(window(date(2, 1), date(3, 31)));
        assert_eq!(dates, vec![date(2, 15), date(3, 15)]);
    }

    #[rstest]
    fn custom_produces_nothing(mut draft: RecurringAppointmentTemplateDraft) {
        draft.pattern = RecurrencePattern::Custom;
        let template = RecurringAppointmentTemplate::new(draft).expect("valid template");
        assert!(template.occurrence_dates(window(date(1, 1), date(12, 31))).is_empty());
    }

    #[rstest]
    fn window_before_template_start_is_empty(mut draft: RecurringAppointmentTemplateDraft) {
        draft.start_date = date(3, 1);
        let template = RecurringAppointmentTemplate::new(draft).expect("valid template");
        assert!(template.effective_range(window(date(1, 1), date(2, 28))).is_none());
    }

    #[rstest]
    fn instance_carries_template_details(draft: RecurringAppointmentTemplateDraft) {
        let template = RecurringAppointmentTemplate::new(draft).expect("valid template");
        let appointment = template.instance_on(AppointmentId::random(), date(1, 3));

        assert_eq!(appointment.start(), date(1, 3).and_hms_opt(10, 30, 0).expect("valid"));
        assert_eq!(appointment.end(), date(1, 3).and_hms_opt(11, 15, 0).expect("valid"));
        assert_eq!(appointment.template_id(), Some(template.id()));
        assert_eq!(
            appointment.notes(),
            Some("Generated from recurring appointment: Physio")
        );
    }

    #[rstest]
    #[case(Some(5), 3, 2)]
    #[case(Some(5), 7, 0)]
    #[case(None, 900, 1_000)]
    fn allowance_tracks_cumulative_cap(
        mut draft: RecurringAppointmentTemplateDraft,
        #[case] max: Option<u32>,
        #[case] existing: u64,
        #[case] expected: u64,
    ) {
        draft.max_occurrences = max;
        let template = RecurringAppointmentTemplate::new(draft).expect("valid template");
        assert_eq!(template.remaining_allowance(existing, 1_000), expected);
    }

    #[rstest]
    fn weekly_without_days_is_rejected(mut draft: RecurringAppointmentTemplateDraft) {
        draft.weekdays.clear();
        assert_eq!(
            RecurringAppointmentTemplate::new(draft),
            Err(RecurrenceValidationError::NoWeekdays)
        );
    }

    #[rstest]
    fn weekdays_are_normalised(draft: RecurringAppointmentTemplateDraft) {
        let template = RecurringAppointmentTemplate::new(draft).expect("valid template");
        assert_eq!(template.weekdays(), &[Weekday::Mon, Weekday::Wed, Weekday::Fri]);
    }
}
