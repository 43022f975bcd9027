//! Conflict detection run after shift writes.
//!
//! Detection is derived and idempotent: the store refuses a second unresolved
//! conflict for the same (shift, type), so re-running never duplicates rows.

use std::sync::Arc;

use chrono::Datelike;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{
    AvailabilityRepository, AvailabilityRepositoryError, ConflictRepository,
    ConflictRepositoryError, ScheduleRepository, ScheduleRepositoryError,
};
use crate::domain::{ConflictId, Error, ScheduleConflict, Shift, effective_rule, find_conflicts};

pub(crate) fn map_schedule_error(error: ScheduleRepositoryError) -> Error {
    match error {
        ScheduleRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("schedule repository unavailable: {message}"))
        }
        ScheduleRepositoryError::Query { message } => {
            Error::internal(format!("schedule repository error: {message}"))
        }
        ScheduleRepositoryError::Stale { message } => {
            Error::invalid_state(format!("shift changed concurrently: {message}"))
        }
    }
}

pub(crate) fn map_conflict_error(error: ConflictRepositoryError) -> Error {
    match error {
        ConflictRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("conflict repository unavailable: {message}"))
        }
        ConflictRepositoryError::Query { message } => {
            Error::internal(format!("conflict repository error: {message}"))
        }
    }
}

pub(crate) fn map_availability_error(error: AvailabilityRepositoryError) -> Error {
    match error {
        AvailabilityRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("availability repository unavailable: {message}"))
        }
        AvailabilityRepositoryError::Query { message } => {
            Error::internal(format!("availability repository error: {message}"))
        }
    }
}

/// Flags double bookings and availability violations for a shift.
pub struct ConflictDetector<S, A, C> {
    schedules: Arc<S>,
    availability: Arc<A>,
    conflicts: Arc<C>,
    clock: Arc<dyn Clock>,
}

impl<S, A, C> Clone for ConflictDetector<S, A, C> {
    fn clone(&self) -> Self {
        Self {
            schedules: Arc::clone(&self.schedules),
            availability: Arc::clone(&self.availability),
            conflicts: Arc::clone(&self.conflicts),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S, A, C> ConflictDetector<S, A, C>
where
    S: ScheduleRepository,
    A: AvailabilityRepository,
    C: ConflictRepository,
{
    pub fn new(
        schedules: Arc<S>,
        availability: Arc<A>,
        conflicts: Arc<C>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            schedules,
            availability,
            conflicts,
            clock,
        }
    }

    /// Record every new conflict involving `shift`; returns the rows written.
    ///
    /// Cancelled shifts are skipped.
    pub async fn detect(&self, shift: &Shift) -> Result<Vec<ScheduleConflict>, Error> {
        if !shift.status().is_active() {
            return Ok(Vec::new());
        }
        let organization_id = shift.organization_id();

        let peers = self
            .schedules
            .list_active_shifts_for_staff(organization_id, shift.staff_id(), shift.date())
            .await
            .map_err(map_schedule_error)?;
        let rules = self
            .availability
            .list_for_weekday(organization_id, shift.staff_id(), shift.date().weekday())
            .await
            .map_err(map_availability_error)?;
        let rule = effective_rule(rules.iter(), shift.date().weekday(), shift.date());

        let detected_at = self.clock.utc();
        let mut recorded = Vec::new();
        for finding in find_conflicts(shift, &peers, rule) {
            let conflict =
                ScheduleConflict::from_finding(ConflictId::random(), organization_id, finding, detected_at);
            let inserted = self
                .conflicts
                .insert_if_absent(&conflict)
                .await
                .map_err(map_conflict_error)?;
            if inserted {
                info!(
                    shift_id = %conflict.shift_id(),
                    conflict_type = %conflict.conflict_type(),
                    severity = %conflict.severity(),
                    "scheduling conflict recorded"
                );
                recorded.push(conflict);
            }
        }
        Ok(recorded)
    }

    /// Like [`Self::detect`], but failures are logged and never propagate.
    pub async fn detect_best_effort(&self, shift: &Shift) -> Vec<ScheduleConflict> {
        match self.detect(shift).await {
            Ok(recorded) => recorded,
            Err(error) => {
                warn!(shift_id = %shift.id(), error = %error, "conflict detection failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use std::sync::Arc;

    use chrono::{NaiveDate, NaiveTime};
    use mockable::DefaultClock;
    use rstest::rstest;

    use super::*;
    use crate::domain::ports::{
        MockAvailabilityRepository, MockConflictRepository, MockScheduleRepository,
    };
    use crate::domain::{
        ConflictType, OrganizationId, ScheduleId, ShiftDraft, ShiftStatus, ShiftType, StaffId,
        TimeWindow,
    };

    fn shift(staff_id: StaffId, start: u32, end: u32) -> Shift {
        Shift::new(ShiftDraft {
            id: crate::domain::ShiftId::random(),
            organization_id: OrganizationId::random(),
            schedule_id: ScheduleId::random(),
            staff_id,
            client_id: None,
            date: NaiveDate::from_ymd_opt(2024, 3, 4).expect("valid date"),
            window: TimeWindow::new(
                NaiveTime::from_hms_opt(start, 0, 0).expect("valid time"),
                NaiveTime::from_hms_opt(end, 0, 0).expect("valid time"),
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

    #[rstest]
    #[tokio::test]
    async fn records_double_booking_on_both_shifts() {
        let staff = StaffId::random();
        let examined = shift(staff, 9, 17);
        let peer = shift(staff, 16, 20);
        let peers = vec![examined.clone(), peer.clone()];

        let mut schedules = MockScheduleRepository::new();
        schedules
            .expect_list_active_shifts_for_staff()
            .return_once(move |_, _, _| Ok(peers));
        let mut availability = MockAvailabilityRepository::new();
        availability
            .expect_list_for_weekday()
            .return_once(|_, _, _| Ok(Vec::new()));
        let mut conflicts = MockConflictRepository::new();
        conflicts
            .expect_insert_if_absent()
            .times(2)
            .returning(|conflict| Ok(conflict.conflict_type() == ConflictType::DoubleBooking));

        let detector = ConflictDetector::new(
            Arc::new(schedules),
            Arc::new(availability),
            Arc::new(conflicts),
            Arc::new(DefaultClock),
        );
        let recorded = detector.detect(&examined).await.expect("detection succeeds");

        let shifts: Vec<_> = recorded.iter().map(ScheduleConflict::shift_id).collect();
        assert_eq!(shifts, vec![examined.id(), peer.id()]);
    }

    #[rstest]
    #[tokio::test]
    async fn best_effort_swallows_store_failures() {
        let examined = shift(StaffId::random(), 9, 17);

        let mut schedules = MockScheduleRepository::new();
        schedules
            .expect_list_active_shifts_for_staff()
            .return_once(|_, _, _| Err(ScheduleRepositoryError::connection("down")));
        let mut conflicts = MockConflictRepository::new();
        conflicts.expect_insert_if_absent().times(0);

        let detector = ConflictDetector::new(
            Arc::new(schedules),
            Arc::new(MockAvailabilityRepository::new()),
            Arc::new(conflicts),
            Arc::new(DefaultClock),
        );

        assert!(detector.detect_best_effort(&examined).await.is_empty());
    }
}
