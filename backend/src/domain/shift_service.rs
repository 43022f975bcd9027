//! Schedule and shift service.
//!
//! Every shift write is followed by best-effort conflict detection; a
//! detection failure is logged and never undoes the write.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::conflict_detector::{ConflictDetector, map_conflict_error, map_schedule_error};
use crate::domain::ports::{
    AvailabilityRepository, CancelShiftRequest, CapabilityCheck, ConflictFilter,
    ConflictRepository, CopyScheduleRequest, CopyScheduleResponse, CreateScheduleRequest,
    CreateShiftRequest, CreateShiftsRequest, CreateShiftsResponse, DetectConflictsRequest,
    DetectConflictsResponse, ListConflictsRequest, PublishScheduleRequest, ResolveConflictRequest,
    ScheduleRepository, ShiftCommand, ShiftSpec, TenantDirectory, UpdateShiftRequest,
};
use crate::domain::service_support::{authorize, invalid_transition, map_directory_error};
use crate::domain::{
    Actor, Capability, ClientId, Error, OrganizationId, Schedule, ScheduleConflict, ScheduleDraft,
    ScheduleId, ScheduleStatus, Shift, ShiftChanges, ShiftDraft, ShiftId, ShiftStatus,
    ShiftUpdateError, ShiftWrite, StaffId,
};

fn map_update_error(error: ShiftUpdateError) -> Error {
    match error {
        ShiftUpdateError::State(transition) => invalid_transition(transition),
        ShiftUpdateError::Validation(validation) => Error::validation(validation.to_string()),
    }
}

/// Validate `spec` against `schedule` and build a scheduled shift.
fn new_shift(schedule: &Schedule, spec: ShiftSpec) -> Result<Shift, Error> {
    schedule
        .ensure_contains(spec.date)
        .map_err(|err| Error::validation(err.to_string()))?;
    let windows = spec
        .times
        .validate()
        .map_err(|err| Error::validation(err.to_string()))?;
    Shift::new(ShiftDraft {
        id: ShiftId::random(),
        organization_id: schedule.organization_id(),
        schedule_id: schedule.id(),
        staff_id: spec.staff_id,
        client_id: spec.client_id,
        date: spec.date,
        window: windows.window,
        break_window: windows.break_window,
        meal_window: windows.meal_window,
        status: ShiftStatus::Scheduled,
        shift_type: spec.shift_type,
        notes: spec.notes,
        required_documentation: spec.required_documentation,
    })
    .map_err(|err| Error::validation(err.to_string()))
}

/// Domain service implementing [`ShiftCommand`].
pub struct ShiftService<S, A, C, T, K> {
    schedules: Arc<S>,
    conflicts: Arc<C>,
    directory: Arc<T>,
    access: Arc<K>,
    detector: ConflictDetector<S, A, C>,
    clock: Arc<dyn Clock>,
}

impl<S, A, C, T, K> ShiftService<S, A, C, T, K>
where
    S: ScheduleRepository,
    A: AvailabilityRepository,
    C: ConflictRepository,
{
    /// Create a shift service over the given stores and collaborators.
    pub fn new(
        schedules: Arc<S>,
        availability: Arc<A>,
        conflicts: Arc<C>,
        directory: Arc<T>,
        access: Arc<K>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let detector = ConflictDetector::new(
            Arc::clone(&schedules),
            availability,
            Arc::clone(&conflicts),
            Arc::clone(&clock),
        );
        Self {
            schedules,
            conflicts,
            directory,
            access,
            detector,
            clock,
        }
    }
}

impl<S, A, C, T, K> ShiftService<S, A, C, T, K>
where
    S: ScheduleRepository,
    A: AvailabilityRepository,
    C: ConflictRepository,
    T: TenantDirectory,
    K: CapabilityCheck,
{
    async fn load_schedule(
        &self,
        organization_id: OrganizationId,
        schedule_id: ScheduleId,
    ) -> Result<Schedule, Error> {
        self.schedules
            .find_schedule(organization_id, schedule_id)
            .await
            .map_err(map_schedule_error)?
            .ok_or_else(|| Error::not_found(format!("schedule {schedule_id} not found")))
    }

    async fn load_shift(
        &self,
        organization_id: OrganizationId,
        shift_id: ShiftId,
    ) -> Result<Shift, Error> {
        self.schedules
            .find_shift(organization_id, shift_id)
            .await
            .map_err(map_schedule_error)?
            .ok_or_else(|| Error::not_found(format!("shift {shift_id} not found")))
    }

    async fn ensure_staff(&self, actor: &Actor, staff_id: StaffId) -> Result<(), Error> {
        let exists = self
            .directory
            .staff_exists(actor.organization_id, staff_id)
            .await
            .map_err(map_directory_error)?;
        if exists {
            Ok(())
        } else {
            Err(Error::not_found(format!("staff member {staff_id} not found")))
        }
    }

    async fn ensure_client(&self, actor: &Actor, client_id: Option<ClientId>) -> Result<(), Error> {
        let Some(client_id) = client_id else {
            return Ok(());
        };
        let exists = self
            .directory
            .client_exists(actor.organization_id, client_id)
            .await
            .map_err(map_directory_error)?;
        if exists {
            Ok(())
        } else {
            Err(Error::not_found(format!("client {client_id} not found")))
        }
    }
}

#[async_trait]
impl<S, A, C, T, K> ShiftCommand for ShiftService<S, A, C, T, K>
where
    S: ScheduleRepository,
    A: AvailabilityRepository,
    C: ConflictRepository,
    T: TenantDirectory,
    K: CapabilityCheck,
{
    async fn create_schedule(&self, request: CreateScheduleRequest) -> Result<Schedule, Error> {
        let actor = request.actor;
        authorize(self.access.as_ref(), &actor, Capability::ManageSchedules).await?;

        let schedule = Schedule::new(ScheduleDraft {
            id: ScheduleId::random(),
            organization_id: actor.organization_id,
            name: request.name,
            start_date: request.start_date,
            end_date: request.end_date,
            status: ScheduleStatus::Draft,
            notes: request.notes,
            created_by: actor.user_id,
            approved_by: None,
            approved_at: None,
        })
        .map_err(|err| Error::validation(err.to_string()))?;

        self.schedules
            .insert_schedule(&schedule, &[])
            .await
            .map_err(map_schedule_error)?;
        info!(schedule_id = %schedule.id(), "schedule created");
        Ok(schedule)
    }

    async fn publish_schedule(&self, request: PublishScheduleRequest) -> Result<Schedule, Error> {
        let actor = request.actor;
        authorize(self.access.as_ref(), &actor, Capability::ManageSchedules).await?;

        let schedule = self
            .load_schedule(actor.organization_id, request.schedule_id)
            .await?;
        let published = schedule
            .publish(actor.user_id, self.clock.utc())
            .map_err(invalid_transition)?;

        self.schedules
            .update_schedule(&published)
            .await
            .map_err(map_schedule_error)?;
        info!(schedule_id = %published.id(), approver = %actor.user_id, "schedule published");
        Ok(published)
    }

    async fn copy_schedule(
        &self,
        request: CopyScheduleRequest,
    ) -> Result<CopyScheduleResponse, Error> {
        let actor = request.actor;
        authorize(self.access.as_ref(), &actor, Capability::ManageSchedules).await?;

        let source = self
            .load_schedule(actor.organization_id, request.schedule_id)
            .await?;
        let (schedule, offset) = source
            .copy_to(
                ScheduleId::random(),
                request.new_start_date,
                request.new_name,
                actor.user_id,
            )
            .map_err(|err| Error::validation(err.to_string()))?;

        let shifts = self
            .schedules
            .list_schedule_shifts(actor.organization_id, source.id())
            .await
            .map_err(map_schedule_error)?
            .iter()
            .filter(|shift| shift.status() != ShiftStatus::Cancelled)
            .map(|shift| shift.copy_into(ShiftId::random(), schedule.id(), offset))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| Error::validation(err.to_string()))?;

        self.schedules
            .insert_schedule(&schedule, &shifts)
            .await
            .map_err(map_schedule_error)?;
        info!(
            source_id = %source.id(),
            schedule_id = %schedule.id(),
            shift_count = shifts.len(),
            "schedule copied"
        );

        for shift in &shifts {
            self.detector.detect_best_effort(shift).await;
        }
        Ok(CopyScheduleResponse { schedule, shifts })
    }

    async fn create_shift(&self, request: CreateShiftRequest) -> Result<Shift, Error> {
        let actor = request.actor;
        authorize(self.access.as_ref(), &actor, Capability::ManageSchedules).await?;

        let schedule = self
            .load_schedule(actor.organization_id, request.schedule_id)
            .await?;
        let shift = new_shift(
            &schedule,
            ShiftSpec {
                staff_id: request.staff_id,
                client_id: request.client_id,
                date: request.date,
                times: request.times,
                shift_type: request.shift_type,
                notes: request.notes,
                required_documentation: request.required_documentation,
            },
        )?;
        self.ensure_staff(&actor, shift.staff_id()).await?;
        self.ensure_client(&actor, shift.client_id()).await?;

        self.schedules
            .insert_shift(&shift)
            .await
            .map_err(map_schedule_error)?;
        info!(shift_id = %shift.id(), staff_id = %shift.staff_id(), "shift created");

        self.detector.detect_best_effort(&shift).await;
        Ok(shift)
    }

    async fn create_shifts(
        &self,
        request: CreateShiftsRequest,
    ) -> Result<CreateShiftsResponse, Error> {
        let actor = request.actor;
        authorize(self.access.as_ref(), &actor, Capability::ManageSchedules).await?;

        let schedule = self
            .load_schedule(actor.organization_id, request.schedule_id)
            .await?;
        let mut response = CreateShiftsResponse::default();
        for spec in request.shifts {
            let known = self
                .directory
                .staff_exists(actor.organization_id, spec.staff_id)
                .await
                .map_err(map_directory_error)?;
            if !known {
                info!(staff_id = %spec.staff_id, "skipping shift for unknown staff member");
                response.skipped_staff.push(spec.staff_id);
                continue;
            }
            self.ensure_client(&actor, spec.client_id).await?;
            response.created.push(new_shift(&schedule, spec)?);
        }

        self.schedules
            .insert_shifts(&response.created)
            .await
            .map_err(map_schedule_error)?;
        info!(
            schedule_id = %schedule.id(),
            created = response.created.len(),
            skipped = response.skipped_staff.len(),
            "shifts created in bulk"
        );

        for shift in &response.created {
            self.detector.detect_best_effort(shift).await;
        }
        Ok(response)
    }

    async fn update_shift(&self, request: UpdateShiftRequest) -> Result<Shift, Error> {
        let actor = request.actor;
        authorize(self.access.as_ref(), &actor, Capability::ManageSchedules).await?;

        let current = self.load_shift(actor.organization_id, request.shift_id).await?;
        let schedule = self
            .load_schedule(actor.organization_id, current.schedule_id())
            .await?;
        schedule
            .ensure_contains(request.date)
            .map_err(|err| Error::validation(err.to_string()))?;
        let windows = request
            .times
            .validate()
            .map_err(|err| Error::validation(err.to_string()))?;
        self.ensure_client(&actor, request.client_id).await?;

        let updated = current
            .apply_changes(ShiftChanges {
                client_id: request.client_id,
                date: request.date,
                window: windows.window,
                break_window: windows.break_window,
                meal_window: windows.meal_window,
                shift_type: request.shift_type,
                notes: request.notes,
                required_documentation: request.required_documentation,
            })
            .map_err(map_update_error)?;

        self.schedules
            .update_shift(&ShiftWrite::replacing(&current, updated.clone()))
            .await
            .map_err(map_schedule_error)?;
        info!(shift_id = %updated.id(), "shift updated");

        self.detector.detect_best_effort(&updated).await;
        Ok(updated)
    }

    async fn cancel_shift(&self, request: CancelShiftRequest) -> Result<Shift, Error> {
        let actor = request.actor;
        authorize(self.access.as_ref(), &actor, Capability::ManageSchedules).await?;

        let current = self.load_shift(actor.organization_id, request.shift_id).await?;
        let cancelled = current.cancel().map_err(invalid_transition)?;

        self.schedules
            .update_shift(&ShiftWrite::replacing(&current, cancelled.clone()))
            .await
            .map_err(map_schedule_error)?;
        info!(
            shift_id = %cancelled.id(),
            reason = request.reason.as_deref().unwrap_or_default(),
            "shift cancelled"
        );
        Ok(cancelled)
    }

    async fn detect_conflicts(
        &self,
        request: DetectConflictsRequest,
    ) -> Result<DetectConflictsResponse, Error> {
        let actor = request.actor;
        authorize(self.access.as_ref(), &actor, Capability::ManageSchedules).await?;

        let shift = self.load_shift(actor.organization_id, request.shift_id).await?;
        let recorded = self.detector.detect(&shift).await?;
        let unresolved = self
            .conflicts
            .list(actor.organization_id, ConflictFilter::open_for_shift(shift.id()))
            .await
            .map_err(map_conflict_error)?;

        Ok(DetectConflictsResponse {
            recorded,
            unresolved,
        })
    }

    async fn list_conflicts(
        &self,
        request: ListConflictsRequest,
    ) -> Result<Vec<ScheduleConflict>, Error> {
        let actor = request.actor;
        authorize(self.access.as_ref(), &actor, Capability::ManageSchedules).await?;

        if let Some((from, to)) = request.filter.dates
            && to < from
        {
            return Err(Error::validation(format!(
                "conflict range end {to} precedes start {from}"
            )));
        }
        self.conflicts
            .list(actor.organization_id, request.filter)
            .await
            .map_err(map_conflict_error)
    }

    async fn resolve_conflict(
        &self,
        request: ResolveConflictRequest,
    ) -> Result<ScheduleConflict, Error> {
        let actor = request.actor;
        authorize(self.access.as_ref(), &actor, Capability::ResolveConflicts).await?;

        let conflict = self
            .conflicts
            .find(actor.organization_id, request.conflict_id)
            .await
            .map_err(map_conflict_error)?
            .ok_or_else(|| Error::not_found(format!("conflict {} not found", request.conflict_id)))?;
        let resolved = conflict
            .resolve(actor.user_id, self.clock.utc(), request.notes)
            .map_err(invalid_transition)?;

        let stored = self
            .conflicts
            .mark_resolved(&resolved)
            .await
            .map_err(map_conflict_error)?;
        if !stored {
            return Err(Error::invalid_state(format!(
                "cannot resolve conflict {} while it is resolved",
                resolved.id()
            )));
        }
        info!(conflict_id = %resolved.id(), resolver = %actor.user_id, "conflict resolved");
        Ok(resolved)
    }
}

#[cfg(test)]
#[path = "shift_service_tests.rs"]
mod tests;
