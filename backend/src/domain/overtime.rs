//! Weekly overtime buckets.
//!
//! Worked time is counted in whole seconds so the weekly threshold split is
//! exact. Hours are rendered with two decimals for display only.

use std::fmt;
use std::ops::Add;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::domain::calendar::week_start;
use crate::domain::{OrganizationId, OvertimeRecordId, StaffId};

const SECONDS_PER_HOUR: i64 = 3_600;

/// Non-negative worked time in seconds.
///
/// # Examples
/// ```
/// use carerota::domain::WorkedDuration;
///
/// let shift = WorkedDuration::from_hours(7) + WorkedDuration::from_seconds(1_800).unwrap();
/// assert_eq!(shift.to_string(), "7.50");
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct WorkedDuration(i64);

impl WorkedDuration {
    pub const ZERO: Self = Self(0);

    /// Wrap a second count, rejecting negative values.
    pub const fn from_seconds(seconds: i64) -> Option<Self> {
        if seconds < 0 { None } else { Some(Self(seconds)) }
    }

    /// Whole hours.
    pub const fn from_hours(hours: u32) -> Self {
        Self(hours as i64 * SECONDS_PER_HOUR)
    }

    /// Time between two instants; `None` when `end` precedes `start`.
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        Self::from_seconds((end - start).num_seconds())
    }

    pub const fn as_seconds(self) -> i64 {
        self.0
    }

    /// Hours scaled by 100 and rounded half up, e.g. 45h → 4500.
    pub const fn hundredths_of_hour(self) -> i64 {
        (self.0 * 100 + SECONDS_PER_HOUR / 2) / SECONDS_PER_HOUR
    }

    /// Saturating difference, never below zero.
    pub fn saturating_sub(self, other: Self) -> Self {
        Self((self.0 - other.0).max(0))
    }
}

impl Add for WorkedDuration {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl fmt::Display for WorkedDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hundredths = self.hundredths_of_hour();
        write!(f, "{}.{:02}", hundredths / 100, hundredths % 100)
    }
}

/// Flat weekly overtime rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OvertimePolicy {
    weekly_threshold: WorkedDuration,
    timezone: Tz,
}

impl OvertimePolicy {
    /// Build a policy splitting at `weekly_threshold`, with weeks measured
    /// in `timezone`.
    pub const fn new(weekly_threshold: WorkedDuration, timezone: Tz) -> Self {
        Self {
            weekly_threshold,
            timezone,
        }
    }

    pub const fn weekly_threshold(&self) -> WorkedDuration {
        self.weekly_threshold
    }

    pub const fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Monday of the agency-local week containing `clock_in`.
    pub fn week_of(&self, clock_in: DateTime<Utc>) -> NaiveDate {
        week_start(clock_in.with_timezone(&self.timezone).date_naive())
    }
}

impl Default for OvertimePolicy {
    fn default() -> Self {
        Self::new(WorkedDuration::from_hours(40), Tz::UTC)
    }
}

/// Bucket components read from storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OvertimeHours {
    pub regular: WorkedDuration,
    pub overtime: WorkedDuration,
    pub double_time: WorkedDuration,
    pub holiday: WorkedDuration,
}

impl OvertimeHours {
    pub fn total(&self) -> WorkedDuration {
        self.regular + self.overtime + self.double_time + self.holiday
    }
}

impl Add for OvertimeHours {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            regular: self.regular + rhs.regular,
            overtime: self.overtime + rhs.overtime,
            double_time: self.double_time + rhs.double_time,
            holiday: self.holiday + rhs.holiday,
        }
    }
}

/// Stored total disagrees with the component sum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OvertimeTotalMismatch {
    pub stored: WorkedDuration,
    pub computed: WorkedDuration,
}

impl fmt::Display for OvertimeTotalMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "overtime total {} does not equal component sum {}",
            self.stored, self.computed
        )
    }
}

impl std::error::Error for OvertimeTotalMismatch {}

/// Per-staff, per-week worked-hours bucket.
///
/// ## Invariants
/// - `total == regular + overtime + double_time + holiday`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OvertimeRecord {
    id: OvertimeRecordId,
    organization_id: OrganizationId,
    staff_id: StaffId,
    week_start: NaiveDate,
    hours: OvertimeHours,
}

impl OvertimeRecord {
    /// Fresh bucket for a week with nothing worked yet.
    pub fn empty(
        id: OvertimeRecordId,
        organization_id: OrganizationId,
        staff_id: StaffId,
        week_start: NaiveDate,
    ) -> Self {
        Self {
            id,
            organization_id,
            staff_id,
            week_start,
            hours: OvertimeHours::default(),
        }
    }

    /// Rehydrate a stored bucket, checking the stored total.
    pub fn restore(
        id: OvertimeRecordId,
        organization_id: OrganizationId,
        staff_id: StaffId,
        week_start: NaiveDate,
        hours: OvertimeHours,
        stored_total: WorkedDuration,
    ) -> Result<Self, OvertimeTotalMismatch> {
        let computed = hours.total();
        if computed != stored_total {
            return Err(OvertimeTotalMismatch {
                stored: stored_total,
                computed,
            });
        }
        Ok(Self {
            id,
            organization_id,
            staff_id,
            week_start,
            hours,
        })
    }

    /// Bucket identifier.
    pub fn id(&self) -> OvertimeRecordId {
        self.id
    }

    /// Organization the bucket belongs to.
    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Staff member whose hours are tallied.
    pub fn staff_id(&self) -> StaffId {
        self.staff_id
    }

    /// Monday of the agency-local week.
    pub fn week_start(&self) -> NaiveDate {
        self.week_start
    }

    /// All components as one value.
    pub fn hours(&self) -> OvertimeHours {
        self.hours
    }

    /// Time worked up to the weekly threshold.
    pub fn regular(&self) -> WorkedDuration {
        self.hours.regular
    }

    /// Time worked past the weekly threshold.
    pub fn overtime(&self) -> WorkedDuration {
        self.hours.overtime
    }

    /// Double-time component; never written by the flat weekly rule.
    pub fn double_time(&self) -> WorkedDuration {
        self.hours.double_time
    }

    /// Holiday component; never written by the flat weekly rule.
    pub fn holiday(&self) -> WorkedDuration {
        self.hours.holiday
    }

    /// Sum of every component.
    pub fn total(&self) -> WorkedDuration {
        self.hours.total()
    }

    /// Add one completed session, splitting it at the weekly threshold.
    ///
    /// Time up to the threshold is regular; anything past it is overtime. A
    /// session straddling the threshold contributes to both.
    pub fn accumulate(&self, session: WorkedDuration, policy: &OvertimePolicy) -> Self {
        let regular_room = policy.weekly_threshold().saturating_sub(self.hours.regular);
        let regular = session.min(regular_room);
        let overtime = session.saturating_sub(regular);

        Self {
            hours: OvertimeHours {
                regular: self.hours.regular + regular,
                overtime: self.hours.overtime + overtime,
                ..self.hours
            },
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn bucket() -> OvertimeRecord {
        OvertimeRecord::empty(
            OvertimeRecordId::random(),
            OrganizationId::random(),
            StaffId::random(),
            NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
        )
    }

    fn hours(value: u32) -> WorkedDuration {
        WorkedDuration::from_hours(value)
    }

    #[rstest]
    #[case(vec![45])]
    #[case(vec![9, 9, 9, 9, 9])]
    #[case(vec![38, 7])]
    #[case(vec![40, 5])]
    #[case(vec![1; 45])]
    fn forty_five_hours_split_forty_and_five(bucket: OvertimeRecord, #[case] sessions: Vec<u32>) {
        let policy = OvertimePolicy::default();
        let record = sessions
            .into_iter()
            .fold(bucket, |record, session| record.accumulate(hours(session), &policy));

        assert_eq!(record.regular().to_string(), "40.00");
        assert_eq!(record.overtime().to_string(), "5.00");
        assert_eq!(record.total().to_string(), "45.00");
        assert_eq!(record.total(), record.hours().total());
    }

    #[rstest]
    fn straddling_session_splits_proportionally(bucket: OvertimeRecord) {
        let policy = OvertimePolicy::default();
        let record = bucket
            .accumulate(hours(38), &policy)
            .accumulate(WorkedDuration::from_seconds(4 * 3_600 + 1_800).expect("positive"), &policy);

        assert_eq!(record.regular(), hours(40));
        assert_eq!(record.overtime().as_seconds(), 2 * 3_600 + 1_800);
    }

    #[rstest]
    fn restore_rejects_inconsistent_total() {
        let result = OvertimeRecord::restore(
            OvertimeRecordId::random(),
            OrganizationId::random(),
            StaffId::random(),
            NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
            OvertimeHours {
                regular: hours(40),
                overtime: hours(2),
                ..OvertimeHours::default()
            },
            hours(41),
        );
        assert!(result.is_err());
    }

    #[rstest]
    fn week_is_measured_in_agency_timezone() {
        let policy = OvertimePolicy::new(hours(40), chrono_tz::America::New_York);
        // 03:00 UTC on Monday is still Sunday evening in New York.
        let clock_in = Utc
            .with_ymd_and_hms(2024, 1, 8, 3, 0, 0)
            .single()
            .expect("valid timestamp");

        assert_eq!(
            policy.week_of(clock_in),
            NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date")
        );
        assert_eq!(
            OvertimePolicy::default().week_of(clock_in),
            NaiveDate::from_ymd_opt(2024, 1, 8).expect("valid date")
        );
    }

    #[rstest]
    #[case(0, "0.00")]
    #[case(1_800, "0.50")]
    #[case(60, "0.02")]
    #[case(162_000, "45.00")]
    fn display_renders_two_decimal_hours(#[case] seconds: i64, #[case] expected: &str) {
        let duration = WorkedDuration::from_seconds(seconds).expect("non-negative");
        assert_eq!(duration.to_string(), expected);
    }

    #[rstest]
    fn between_rejects_reversed_instants() {
        let now = Utc::now();
        assert!(WorkedDuration::between(now, now - chrono::TimeDelta::seconds(1)).is_none());
    }
}
