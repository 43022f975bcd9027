//! Staff availability rules.
//!
//! A rule states how a staff member stands on one weekday during one window,
//! from an effective date until an optional expiry. Only `Unavailable` rules
//! produce conflicts; the other kinds inform scheduling but never block it.

use std::fmt;

use chrono::{NaiveDate, Weekday};

use crate::domain::text_enum::define_text_enum;
use crate::domain::{AvailabilityId, OrganizationId, StaffId, TimeWindow};

define_text_enum! {
    /// How a staff member stands during an availability window.
    pub enum AvailabilityType parse ParseAvailabilityTypeError as "availability type" {
        /// Can be scheduled.
        Available => "available",
        /// Would like to be scheduled.
        Preferred => "preferred",
        /// Must not be scheduled.
        Unavailable => "unavailable",
    }
}

/// Validation errors raised by [`StaffAvailability::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityValidationError {
    /// The rule expires before it takes effect.
    ExpiresBeforeEffective {
        /// First day the rule applies.
        effective: NaiveDate,
        /// Last day the rule applies.
        expiry: NaiveDate,
    },
}

impl fmt::Display for AvailabilityValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExpiresBeforeEffective { effective, expiry } => write!(
                f,
                "availability expiry {expiry} must not precede effective date {effective}"
            ),
        }
    }
}

impl std::error::Error for AvailabilityValidationError {}

/// Input payload for [`StaffAvailability::new`].
#[derive(Debug, Clone)]
pub struct StaffAvailabilityDraft {
    pub id: AvailabilityId,
    pub organization_id: OrganizationId,
    pub staff_id: StaffId,
    pub weekday: Weekday,
    pub window: TimeWindow,
    pub availability_type: AvailabilityType,
    pub effective_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// One weekday availability rule for a staff member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffAvailability {
    id: AvailabilityId,
    organization_id: OrganizationId,
    staff_id: StaffId,
    weekday: Weekday,
    window: TimeWindow,
    availability_type: AvailabilityType,
    effective_date: NaiveDate,
    expiry_date: Option<NaiveDate>,
    notes: Option<String>,
}

impl StaffAvailability {
    /// Creates a validated rule.
    pub fn new(draft: StaffAvailabilityDraft) -> Result<Self, AvailabilityValidationError> {
        if let Some(expiry) = draft.expiry_date
            && expiry < draft.effective_date
        {
            return Err(AvailabilityValidationError::ExpiresBeforeEffective {
                effective: draft.effective_date,
                expiry,
            });
        }
        Ok(Self {
            id: draft.id,
            organization_id: draft.organization_id,
            staff_id: draft.staff_id,
            weekday: draft.weekday,
            window: draft.window,
            availability_type: draft.availability_type,
            effective_date: draft.effective_date,
            expiry_date: draft.expiry_date,
            notes: draft.notes,
        })
    }

    pub fn id(&self) -> AvailabilityId {
        self.id
    }

    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    pub fn staff_id(&self) -> StaffId {
        self.staff_id
    }

    pub fn weekday(&self) -> Weekday {
        self.weekday
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn availability_type(&self) -> AvailabilityType {
        self.availability_type
    }

    pub fn effective_date(&self) -> NaiveDate {
        self.effective_date
    }

    pub fn expiry_date(&self) -> Option<NaiveDate> {
        self.expiry_date
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Whether the rule is in force on `date` (inclusive at both ends).
    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        self.effective_date <= date && self.expiry_date.is_none_or(|expiry| expiry >= date)
    }

    /// Whether two rules for the same staff member and weekday are in force
    /// on a common date with overlapping windows.
    pub fn clashes_with(&self, other: &Self) -> bool {
        let dates_meet = self.expiry_date.is_none_or(|expiry| expiry >= other.effective_date)
            && other.expiry_date.is_none_or(|expiry| expiry >= self.effective_date);
        self.id != other.id
            && self.staff_id == other.staff_id
            && self.weekday == other.weekday
            && dates_meet
            && self.window.overlaps(&other.window)
    }

    /// Whether the rule forbids work during `window`.
    pub fn blocks(&self, window: &TimeWindow) -> bool {
        self.availability_type == AvailabilityType::Unavailable && self.window.overlaps(window)
    }
}

/// Pick the rule governing `weekday` on `date`: the most recent non-expired one.
///
/// Ties on effective date keep the first rule encountered.
pub fn effective_rule<'a, I>(rules: I, weekday: Weekday, date: NaiveDate) -> Option<&'a StaffAvailability>
where
    I: IntoIterator<Item = &'a StaffAvailability>,
{
    rules
        .into_iter()
        .filter(|rule| rule.weekday == weekday && rule.is_effective_on(date))
        .fold(None, |best: Option<&StaffAvailability>, rule| match best {
            Some(current) if current.effective_date >= rule.effective_date => Some(current),
            _ => Some(rule),
        })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;
    use rstest::rstest;

    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).expect("valid date")
    }

    fn window(start: u32, end: u32) -> TimeWindow {
        TimeWindow::new(
            NaiveTime::from_hms_opt(start, 0, 0).expect("valid time"),
            NaiveTime::from_hms_opt(end, 0, 0).expect("valid time"),
        )
        .expect("valid window")
    }

    fn rule(
        availability_type: AvailabilityType,
        effective: NaiveDate,
        expiry: Option<NaiveDate>,
    ) -> StaffAvailability {
        StaffAvailability::new(StaffAvailabilityDraft {
            id: AvailabilityId::random(),
            organization_id: OrganizationId::random(),
            staff_id: StaffId::random(),
            weekday: Weekday::Tue,
            window: window(8, 12),
            availability_type,
            effective_date: effective,
            expiry_date: expiry,
            notes: None,
        })
        .expect("valid rule")
    }

    #[rstest]
    fn only_unavailable_rules_block() {
        let shift = window(11, 15);
        assert!(rule(AvailabilityType::Unavailable, date(1), None).blocks(&shift));
        assert!(!rule(AvailabilityType::Preferred, date(1), None).blocks(&shift));
        assert!(!rule(AvailabilityType::Unavailable, date(1), None).blocks(&window(12, 15)));
    }

    #[rstest]
    fn latest_effective_rule_wins() {
        let old = rule(AvailabilityType::Available, date(1), None);
        let newer = rule(AvailabilityType::Unavailable, date(5), None);
        let future = rule(AvailabilityType::Preferred, date(20), None);
        let rules = [old, newer.clone(), future];

        let chosen = effective_rule(&rules, Weekday::Tue, date(9)).expect("a rule applies");
        assert_eq!(chosen, &newer);
    }

    #[rstest]
    fn expired_rules_are_ignored() {
        let expired = rule(AvailabilityType::Unavailable, date(1), Some(date(8)));
        let rules = [expired];

        assert!(effective_rule(&rules, Weekday::Tue, date(8)).is_some());
        assert!(effective_rule(&rules, Weekday::Tue, date(9)).is_none());
        assert!(effective_rule(&rules, Weekday::Wed, date(3)).is_none());
    }

    #[rstest]
    fn clash_needs_shared_dates_and_overlapping_windows() {
        let staff_id = StaffId::random();
        let slot = |effective, expiry, start, end| {
            StaffAvailability::new(StaffAvailabilityDraft {
                id: AvailabilityId::random(),
                organization_id: OrganizationId::random(),
                staff_id,
                weekday: Weekday::Tue,
                window: window(start, end),
                availability_type: AvailabilityType::Available,
                effective_date: effective,
                expiry_date: expiry,
                notes: None,
            })
            .expect("valid rule")
        };
        let january = slot(date(1), Some(date(14)), 8, 12);

        assert!(january.clashes_with(&slot(date(14), None, 11, 13)));
        assert!(!january.clashes_with(&slot(date(15), None, 8, 12)));
        assert!(!january.clashes_with(&slot(date(1), None, 12, 16)));
        assert!(!january.clashes_with(&january.clone()));
    }

    #[rstest]
    fn expiry_before_effective_is_rejected() {
        let result = StaffAvailability::new(StaffAvailabilityDraft {
            id: AvailabilityId::random(),
            organization_id: OrganizationId::random(),
            staff_id: StaffId::random(),
            weekday: Weekday::Mon,
            window: window(8, 12),
            availability_type: AvailabilityType::Unavailable,
            effective_date: date(5),
            expiry_date: Some(date(4)),
            notes: None,
        });
        assert!(matches!(
            result,
            Err(AvailabilityValidationError::ExpiresBeforeEffective { .. })
        ));
    }
}
