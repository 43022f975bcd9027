//! Time clock service.
//!
//! Events per staff member are strictly ordered. Clock-out passes through the
//! compliance gate, and completed sessions feed the overtime accumulator,
//! whose failures are logged and swallowed.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::compliance_gate::ComplianceGate;
use crate::domain::conflict_detector::map_schedule_error;
use crate::domain::overtime_service::OvertimeAccumulator;
use crate::domain::ports::{
    AdjustEntryRequest, BreakRequest, CapabilityCheck, ClockInRequest, ClockOutRequest,
    DocumentationLookup, ListEntriesRequest, OvertimeRepository, ScheduleRepository,
    SpecialRequirementLookup, TenantDirectory, TimeClockCommand, TimeClockRepository,
    TimeClockRepositoryError,
};
use crate::domain::service_support::{authorize, invalid_transition};
use crate::domain::{
    Actor, Capability, ClockIntervalKind, Error, Shift, ShiftId, ShiftStatus, ShiftWrite, StaffId,
    TimeClockEntry, TimeClockEntryDraft, TimeEntryId, TimeEntryType, ensure_strictly_after,
};

fn map_repository_error(error: TimeClockRepositoryError) -> Error {
    match error {
        TimeClockRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("time clock repository unavailable: {message}"))
        }
        TimeClockRepositoryError::Query { message } => {
            Error::internal(format!("time clock repository error: {message}"))
        }
        TimeClockRepositoryError::AlreadyOpen { message } => {
            Error::invalid_state(format!("interval already open: {message}"))
        }
        TimeClockRepositoryError::NotOpen { message } => {
            Error::invalid_state(format!("interval not open: {message}"))
        }
        TimeClockRepositoryError::ShiftChanged { message } => {
            Error::invalid_state(format!("shift changed concurrently: {message}"))
        }
    }
}

/// Staff may only clock for themselves; callers without a staff identity act
/// as administrators.
fn ensure_self_or_admin(actor: &Actor, staff_id: StaffId) -> Result<(), Error> {
    match actor.staff_id {
        Some(own) if own != staff_id => Err(Error::forbidden(format!(
            "staff member {own} cannot record time for {staff_id}"
        ))),
        _ => Ok(()),
    }
}

/// Event to append, before it is stamped with an id and time.
struct NewEntry {
    staff_id: StaffId,
    shift_id: Option<ShiftId>,
    entry_type: TimeEntryType,
    location: Option<String>,
    notes: Option<String>,
}

/// Domain service implementing [`TimeClockCommand`].
pub struct TimeClockService<S, L, O, T, D, R, K> {
    schedules: Arc<S>,
    ledger: Arc<L>,
    gate: ComplianceGate<T, D, R>,
    overtime: OvertimeAccumulator<O>,
    access: Arc<K>,
    clock: Arc<dyn Clock>,
}

impl<S, L, O, T, D, R, K> TimeClockService<S, L, O, T, D, R, K> {
    pub fn new(
        schedules: Arc<S>,
        ledger: Arc<L>,
        gate: ComplianceGate<T, D, R>,
        overtime: OvertimeAccumulator<O>,
        access: Arc<K>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            schedules,
            ledger,
            gate,
            overtime,
            access,
            clock,
        }
    }
}

impl<S, L, O, T, D, R, K> TimeClockService<S, L, O, T, D, R, K>
where
    S: ScheduleRepository,
    L: TimeClockRepository,
    O: OvertimeRepository,
    T: TenantDirectory,
    D: DocumentationLookup,
    R: SpecialRequirementLookup,
    K: CapabilityCheck,
{
    async fn authorize_clocking(&self, actor: &Actor, staff_id: StaffId) -> Result<(), Error> {
        authorize(self.access.as_ref(), actor, Capability::ClockTime).await?;
        ensure_self_or_admin(actor, staff_id)
    }

    /// Current time, rejected unless it is later than the latest event.
    async fn next_event_time(
        &self,
        actor: &Actor,
        staff_id: StaffId,
    ) -> Result<chrono::DateTime<chrono::Utc>, Error> {
        let now = self.clock.utc();
        let latest = self
            .ledger
            .latest_event_at(actor.organization_id, staff_id)
            .await
            .map_err(map_repository_error)?;
        ensure_strictly_after(latest, now).map_err(|err| Error::invalid_state(err.to_string()))?;
        Ok(now)
    }

    async fn load_staff_shift(
        &self,
        actor: &Actor,
        staff_id: StaffId,
        shift_id: ShiftId,
    ) -> Result<Shift, Error> {
        let shift = self
            .schedules
            .find_shift(actor.organization_id, shift_id)
            .await
            .map_err(map_schedule_error)?
            .ok_or_else(|| Error::not_found(format!("shift {shift_id} not found")))?;
        if shift.staff_id() != staff_id {
            return Err(Error::validation(format!(
                "shift {shift_id} is not assigned to staff member {staff_id}"
            )));
        }
        Ok(shift)
    }

    async fn open_work_entry(
        &self,
        actor: &Actor,
        staff_id: StaffId,
    ) -> Result<Option<TimeClockEntry>, Error> {
        self.ledger
            .find_open(actor.organization_id, staff_id, ClockIntervalKind::Work)
            .await
            .map_err(map_repository_error)
    }

    fn stamp(
        &self,
        actor: &Actor,
        at: chrono::DateTime<chrono::Utc>,
        entry: NewEntry,
    ) -> TimeClockEntry {
        TimeClockEntry::new(TimeClockEntryDraft {
            id: TimeEntryId::random(),
            organization_id: actor.organization_id,
            staff_id: entry.staff_id,
            shift_id: entry.shift_id,
            entry_type: entry.entry_type,
            recorded_at: at,
            location: entry.location,
            notes: entry.notes,
            corrects_entry_id: None,
            recorded_by: actor.user_id,
        })
    }
}

#[async_trait]
impl<S, L, O, T, D, R, K> TimeClockCommand for TimeClockService<S, L, O, T, D, R, K>
where
    S: ScheduleRepository,
    L: TimeClockRepository,
    O: OvertimeRepository,
    T: TenantDirectory,
    D: DocumentationLookup,
    R: SpecialRequirementLookup,
    K: CapabilityCheck,
{
    async fn clock_in(&self, request: ClockInRequest) -> Result<TimeClockEntry, Error> {
        let actor = request.actor;
        let staff_id = request.staff_id;
        self.authorize_clocking(&actor, staff_id).await?;
        let now = self.next_event_time(&actor, staff_id).await?;

        let started = match request.shift_id {
            Some(shift_id) => {
                let shift = self.load_staff_shift(&actor, staff_id, shift_id).await?;
                match shift.status() {
                    ShiftStatus::Scheduled | ShiftStatus::Confirmed => {
                        let next = shift.start().map_err(invalid_transition)?;
                        Some(ShiftWrite::replacing(&shift, next))
                    }
                    ShiftStatus::InProgress => None,
                    status => {
                        return Err(Error::invalid_state(format!(
                            "cannot clock in to shift {shift_id} while it is {status}"
                        )));
                    }
                }
            }
            None => None,
        };

        let entry = self.stamp(
            &actor,
            now,
            NewEntry {
                staff_id,
                shift_id: request.shift_id,
                entry_type: TimeEntryType::ClockIn,
                location: request.location,
                notes: request.notes,
            },
        );
        self.ledger
            .open_interval(&entry, ClockIntervalKind::Work, started)
            .await
            .map_err(map_repository_error)?;
        info!(staff_id = %staff_id, entry_id = %entry.id(), "clocked in");
        Ok(entry)
    }

    async fn clock_out(&self, request: ClockOutRequest) -> Result<TimeClockEntry, Error> {
        let actor = request.actor;
        let staff_id = request.staff_id;
        self.authorize_clocking(&actor, staff_id).await?;

        let opened = self
            .open_work_entry(&actor, staff_id)
            .await?
            .ok_or_else(|| {
                Error::invalid_state(format!("staff member {staff_id} is not clocked in"))
            })?;
        let now = self.next_event_time(&actor, staff_id).await?;

        let shift_id = request.shift_id.or(opened.shift_id());
        let shift = match shift_id {
            Some(shift_id) => Some(self.load_staff_shift(&actor, staff_id, shift_id).await?),
            None => None,
        };

        if let Some(shift) = &shift {
            let report = self.gate.check(staff_id, shift).await?;
            if !report.is_complete() {
                let listed = report
                    .missing()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                info!(staff_id = %staff_id, shift_id = %shift.id(), missing = %listed, "clock-out blocked");
                return Err(Error::compliance_incomplete(format!(
                    "clock-out blocked; missing documentation: {listed}"
                ))
                .with_details(json!({ "missing": report.missing() })));
            }
        }

        let completed = match shift {
            Some(shift) if shift.status() == ShiftStatus::InProgress => {
                let next = shift.complete().map_err(invalid_transition)?;
                Some(ShiftWrite::replacing(&shift, next))
            }
            _ => None,
        };

        let entry = self.stamp(
            &actor,
            now,
            NewEntry {
                staff_id,
                shift_id,
                entry_type: TimeEntryType::ClockOut,
                location: None,
                notes: request.notes,
            },
        );
        self.ledger
            .close_interval(&entry, ClockIntervalKind::Work, completed)
            .await
            .map_err(map_repository_error)?;
        info!(staff_id = %staff_id, entry_id = %entry.id(), "clocked out");

        if let Err(error) = self
            .overtime
            .record_session(actor.organization_id, staff_id, opened.recorded_at(), now)
            .await
        {
            warn!(staff_id = %staff_id, error = %error, "overtime accumulation failed");
        }
        Ok(entry)
    }

    async fn start_break(&self, request: BreakRequest) -> Result<TimeClockEntry, Error> {
        let actor = request.actor;
        let staff_id = request.staff_id;
        self.authorize_clocking(&actor, staff_id).await?;
        let now = self.next_event_time(&actor, staff_id).await?;

        let shift_id = self
            .open_work_entry(&actor, staff_id)
            .await?
            .and_then(|entry| entry.shift_id());
        let entry = self.stamp(
            &actor,
            now,
            NewEntry {
                staff_id,
                shift_id,
                entry_type: request.kind.start_type(),
                location: None,
                notes: None,
            },
        );
        self.ledger
            .open_interval(&entry, request.kind.interval(), None)
            .await
            .map_err(map_repository_error)?;
        info!(staff_id = %staff_id, kind = %request.kind, "break started");
        Ok(entry)
    }

    async fn end_break(&self, request: BreakRequest) -> Result<TimeClockEntry, Error> {
        let actor = request.actor;
        let staff_id = request.staff_id;
        self.authorize_clocking(&actor, staff_id).await?;

        let started = self
            .ledger
            .find_open(actor.organization_id, staff_id, request.kind.interval())
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| {
                Error::invalid_state(format!(
                    "staff member {staff_id} has no open {} break",
                    request.kind
                ))
            })?;
        let now = self.next_event_time(&actor, staff_id).await?;

        let entry = self.stamp(
            &actor,
            now,
            NewEntry {
                staff_id,
                shift_id: started.shift_id(),
                entry_type: request.kind.end_type(),
                location: None,
                notes: None,
            },
        );
        self.ledger
            .close_interval(&entry, request.kind.interval(), None)
            .await
            .map_err(map_repository_error)?;
        info!(staff_id = %staff_id, kind = %request.kind, "break ended");
        Ok(entry)
    }

    async fn adjust_entry(&self, request: AdjustEntryRequest) -> Result<TimeClockEntry, Error> {
        let actor = request.actor;
        authorize(self.access.as_ref(), &actor, Capability::AdjustTimeEntries).await?;

        let original = self
            .ledger
            .find_entry(actor.organization_id, request.entry_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| {
                Error::not_found(format!("time entry {} not found", request.entry_id))
            })?;
        let adjusted = original
            .adjustment(
                TimeEntryId::random(),
                request.corrected_at,
                actor.user_id,
                &request.reason,
            )
            .map_err(|err| Error::validation(err.to_string()))?;

        self.ledger
            .append_adjustment(&adjusted)
            .await
            .map_err(map_repository_error)?;
        info!(
            entry_id = %original.id(),
            adjustment_id = %adjusted.id(),
            administrator = %actor.user_id,
            "time entry adjusted"
        );
        Ok(adjusted)
    }

    async fn list_entries(
        &self,
        request: ListEntriesRequest,
    ) -> Result<Vec<TimeClockEntry>, Error> {
        let actor = request.actor;
        self.authorize_clocking(&actor, request.staff_id).await?;
        if request.to < request.from {
            return Err(Error::validation(format!(
                "entry range end {} precedes start {}",
                request.to, request.from
            )));
        }
        self.ledger
            .list_entries(
                actor.organization_id,
                request.staff_id,
                request.from,
                request.to,
            )
            .await
            .map_err(map_repository_error)
    }
}

#[cfg(test)]
#[path = "time_clock_service_tests.rs"]
mod tests;
