//! In-memory store implementing every driven port.
//!
//! Each port call takes one lock for its whole duration, which gives the same
//! atomicity the Diesel adapters get from transactions. The uniqueness rules
//! mirror the migration constraints: one open interval per (staff, kind), one
//! swap lock per shift, one pending coverage request per shift, one
//! unresolved conflict per (shift, type), one overtime bucket per
//! (staff, week) and one appointment per (client, staff, start).

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc, Weekday};

use crate::domain::ports::{
    AppointmentRepository, AppointmentRepositoryError, AvailabilityRepository,
    AvailabilityRepositoryError, ConflictFilter, ConflictRepository, ConflictRepositoryError,
    CoverageFilter, CoverageRepository, CoverageRepositoryError,
    DocumentationLookup, DocumentationLookupError, OvertimeRepository, OvertimeRepositoryError,
    ScheduleRepository, ScheduleRepositoryError, SpecialRequirementLookup,
    SpecialRequirementLookupError, SwapRepository, SwapRepositoryError, TenantDirectory,
    TenantDirectoryError, TimeClockRepository, TimeClockRepositoryError,
};
use crate::domain::{
    Appointment, AvailabilityId, ClientId, ClockIntervalKind, ConflictId, CoverageRequest,
    CoverageRequestId, CoverageStatus, DocumentType, OrganizationId,
    OvertimePolicy, OvertimeRecord, OvertimeRecordId, RecurringAppointmentTemplate,
    RequirementResponse, Schedule, ScheduleConflict, ScheduleId, Shift, ShiftId, ShiftSwap,
    ShiftWrite, StaffAvailability, StaffId, SwapExchange, SwapId, SwapStatus, TemplateId,
    TimeClockEntry, TimeEntryId, WorkedDuration,
};

type DocumentKey = (OrganizationId, DocumentType, ClientId, StaffId, NaiveDate);

struct StoredRequirement {
    organization_id: OrganizationId,
    client_id: ClientId,
    date: NaiveDate,
    response: RequirementResponse,
}

#[derive(Default)]
struct State {
    schedules: HashMap<ScheduleId, Schedule>,
    shifts: HashMap<ShiftId, Shift>,
    availability: Vec<StaffAvailability>,
    conflicts: Vec<ScheduleConflict>,
    swaps: HashMap<SwapId, ShiftSwap>,
    swap_locks: HashMap<ShiftId, SwapId>,
    coverage: Vec<CoverageRequest>,
    entries: Vec<TimeClockEntry>,
    open_intervals: HashMap<(StaffId, ClockIntervalKind), TimeEntryId>,
    overtime: HashMap<(OrganizationId, StaffId, NaiveDate), OvertimeRecord>,
    templates: HashMap<TemplateId, RecurringAppointmentTemplate>,
    appointments: Vec<Appointment>,
    staff: HashSet<(OrganizationId, StaffId)>,
    clients: HashMap<(OrganizationId, ClientId), Option<Vec<DocumentType>>>,
    documents: HashSet<DocumentKey>,
    requirements: Vec<StoredRequirement>,
}

impl State {
    /// Store `write` when the stored shift still matches its expectations.
    ///
    /// Returns the mismatch as a message otherwise; nothing is written.
    fn store_guarded_shift(&mut self, write: &ShiftWrite) -> Result<(), String> {
        let shift = write.shift();
        let matches = self.shifts.get(&shift.id()).is_some_and(|stored| {
            stored.staff_id() == write.expected_staff()
                && stored.status() == write.expected_status()
        });
        if !matches {
            return Err(format!(
                "shift {} is no longer {} for staff member {}",
                shift.id(),
                write.expected_status(),
                write.expected_staff()
            ));
        }
        self.shifts.insert(shift.id(), shift.clone());
        Ok(())
    }

    fn release_locks(&mut self, swap_id: SwapId) {
        self.swap_locks.retain(|_, holder| *holder != swap_id);
    }

    fn ensure_swap_status(
        &self,
        swap_id: SwapId,
        expected: SwapStatus,
    ) -> Result<(), SwapRepositoryError> {
        match self.swaps.get(&swap_id) {
            Some(stored) if stored.status() == expected => Ok(()),
            Some(stored) => Err(SwapRepositoryError::stale(format!(
                "swap {swap_id} is {} not {expected}",
                stored.status()
            ))),
            None => Err(SwapRepositoryError::query(format!("swap {swap_id} not found"))),
        }
    }
}

/// Shared in-memory backing for every repository and lookup port.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make `staff_id` resolvable in the tenant directory.
    pub fn register_staff(&self, organization_id: OrganizationId, staff_id: StaffId) {
        self.lock().staff.insert((organization_id, staff_id));
    }

    /// Make `client_id` resolvable, optionally with documentation defaults.
    pub fn register_client(
        &self,
        organization_id: OrganizationId,
        client_id: ClientId,
        documentation_defaults: Option<Vec<DocumentType>>,
    ) {
        self.lock()
            .clients
            .insert((organization_id, client_id), documentation_defaults);
    }

    /// Record that a document of `document_type` exists for the visit.
    pub fn record_document(
        &self,
        organization_id: OrganizationId,
        document_type: DocumentType,
        client_id: ClientId,
        staff_id: StaffId,
        date: NaiveDate,
    ) {
        self.lock()
            .documents
            .insert((organization_id, document_type, client_id, staff_id, date));
    }

    /// Add an active special requirement for a client on `date`.
    pub fn add_requirement(
        &self,
        organization_id: OrganizationId,
        client_id: ClientId,
        date: NaiveDate,
        title: &str,
        responded: bool,
    ) {
        self.lock().requirements.push(StoredRequirement {
            organization_id,
            client_id,
            date,
            response: RequirementResponse {
                title: title.to_owned(),
                responded,
            },
        });
    }

    /// Snapshot of a stored shift.
    pub fn shift(&self, shift_id: ShiftId) -> Option<Shift> {
        self.lock().shifts.get(&shift_id).cloned()
    }

    /// Every entry for `staff_id`, in insertion order.
    pub fn entries_for(&self, staff_id: StaffId) -> Vec<TimeClockEntry> {
        self.lock()
            .entries
            .iter()
            .filter(|entry| entry.staff_id() == staff_id)
            .cloned()
            .collect()
    }

    /// Every stored appointment.
    pub fn appointments(&self) -> Vec<Appointment> {
        self.lock().appointments.clone()
    }

    /// Every stored conflict, resolved or not.
    pub fn conflicts(&self) -> Vec<ScheduleConflict> {
        self.lock().conflicts.clone()
    }
}

#[async_trait]
impl ScheduleRepository for MemoryStore {
    async fn find_schedule(
        &self,
        organization_id: OrganizationId,
        schedule_id: ScheduleId,
    ) -> Result<Option<Schedule>, ScheduleRepositoryError> {
        Ok(self
            .lock()
            .schedules
            .get(&schedule_id)
            .filter(|schedule| schedule.organization_id() == organization_id)
            .cloned())
    }

    async fn insert_schedule(
        &self,
        schedule: &Schedule,
        shifts: &[Shift],
    ) -> Result<(), ScheduleRepositoryError> {
        let mut state = self.lock();
        if state.schedules.contains_key(&schedule.id()) {
            return Err(ScheduleRepositoryError::query(format!(
                "schedule {} already exists",
                schedule.id()
            )));
        }
        state.schedules.insert(schedule.id(), schedule.clone());
        for shift in shifts {
            state.shifts.insert(shift.id(), shift.clone());
        }
        Ok(())
    }

    async fn update_schedule(&self, schedule: &Schedule) -> Result<(), ScheduleRepositoryError> {
        let mut state = self.lock();
        match state.schedules.get_mut(&schedule.id()) {
            Some(stored) => {
                *stored = schedule.clone();
                Ok(())
            }
            None => Err(ScheduleRepositoryError::query(format!(
                "schedule {} not found",
                schedule.id()
            ))),
        }
    }

    async fn find_shift(
        &self,
        organization_id: OrganizationId,
        shift_id: ShiftId,
    ) -> Result<Option<Shift>, ScheduleRepositoryError> {
        Ok(self
            .lock()
            .shifts
            .get(&shift_id)
            .filter(|shift| shift.organization_id() == organization_id)
            .cloned())
    }

    async fn insert_shift(&self, shift: &Shift) -> Result<(), ScheduleRepositoryError> {
        self.lock().shifts.insert(shift.id(), shift.clone());
        Ok(())
    }

    async fn insert_shifts(&self, shifts: &[Shift]) -> Result<(), ScheduleRepositoryError> {
        let mut state = self.lock();
        for shift in shifts {
            state.shifts.insert(shift.id(), shift.clone());
        }
        Ok(())
    }

    async fn update_shift(&self, write: &ShiftWrite) -> Result<(), ScheduleRepositoryError> {
        self.lock()
            .store_guarded_shift(write)
            .map_err(ScheduleRepositoryError::stale)
    }

    async fn list_active_shifts_for_staff(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
        date: NaiveDate,
    ) -> Result<Vec<Shift>, ScheduleRepositoryError> {
        let mut shifts: Vec<Shift> = self
            .lock()
            .shifts
            .values()
            .filter(|shift| {
                shift.organization_id() == organization_id
                    && shift.staff_id() == staff_id
                    && shift.date() == date
                    && shift.status().is_active()
            })
            .cloned()
            .collect();
        shifts.sort_by_key(|shift| shift.window().start());
        Ok(shifts)
    }

    async fn list_schedule_shifts(
        &self,
        organization_id: OrganizationId,
        schedule_id: ScheduleId,
    ) -> Result<Vec<Shift>, ScheduleRepositoryError> {
        let mut shifts: Vec<Shift> = self
            .lock()
            .shifts
            .values()
            .filter(|shift| {
                shift.organization_id() == organization_id && shift.schedule_id() == schedule_id
            })
            .cloned()
            .collect();
        shifts.sort_by_key(|shift| (shift.date(), shift.window().start()));
        Ok(shifts)
    }
}

#[async_trait]
impl AvailabilityRepository for MemoryStore {
    async fn list_for_weekday(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
        weekday: Weekday,
    ) -> Result<Vec<StaffAvailability>, AvailabilityRepositoryError> {
        Ok(self
            .lock()
            .availability
            .iter()
            .filter(|rule| {
                rule.organization_id() == organization_id
                    && rule.staff_id() == staff_id
                    && rule.weekday() == weekday
            })
            .cloned()
            .collect())
    }

    async fn list_for_staff(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
        effective_on: Option<NaiveDate>,
    ) -> Result<Vec<StaffAvailability>, AvailabilityRepositoryError> {
        let mut rules: Vec<StaffAvailability> = self
            .lock()
            .availability
            .iter()
            .filter(|rule| {
                rule.organization_id() == organization_id
                    && rule.staff_id() == staff_id
                    && effective_on.is_none_or(|date| rule.is_effective_on(date))
            })
            .cloned()
            .collect();
        rules.sort_by_key(|rule| (rule.weekday().num_days_from_monday(), rule.window().start()));
        Ok(rules)
    }

    async fn find(
        &self,
        organization_id: OrganizationId,
        availability_id: AvailabilityId,
    ) -> Result<Option<StaffAvailability>, AvailabilityRepositoryError> {
        Ok(self
            .lock()
            .availability
            .iter()
            .find(|rule| rule.organization_id() == organization_id && rule.id() == availability_id)
            .cloned())
    }

    async fn save(&self, rule: &StaffAvailability) -> Result<(), AvailabilityRepositoryError> {
        let mut state = self.lock();
        state.availability.retain(|stored| stored.id() != rule.id());
        state.availability.push(rule.clone());
        Ok(())
    }

    async fn delete(
        &self,
        organization_id: OrganizationId,
        availability_id: AvailabilityId,
    ) -> Result<bool, AvailabilityRepositoryError> {
        let mut state = self.lock();
        let before = state.availability.len();
        state.availability.retain(|rule| {
            !(rule.organization_id() == organization_id && rule.id() == availability_id)
        });
        Ok(state.availability.len() < before)
    }

    async fn replace_for_staff(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
        rules: &[StaffAvailability],
    ) -> Result<(), AvailabilityRepositoryError> {
        let mut state = self.lock();
        state.availability.retain(|rule| {
            !(rule.organization_id() == organization_id && rule.staff_id() == staff_id)
        });
        state.availability.extend_from_slice(rules);
        Ok(())
    }
}

#[async_trait]
impl CoverageRepository for MemoryStore {
    async fn insert(&self, request: &CoverageRequest) -> Result<(), CoverageRepositoryError> {
        let mut state = self.lock();
        let pending = state.coverage.iter().any(|stored| {
            stored.shift_id() == request.shift_id() && stored.status() == CoverageStatus::Pending
        });
        if pending && request.status() == CoverageStatus::Pending {
            return Err(CoverageRepositoryError::already_pending(format!(
                "shift {}",
                request.shift_id()
            )));
        }
        state.coverage.push(request.clone());
        Ok(())
    }

    async fn find(
        &self,
        organization_id: OrganizationId,
        request_id: CoverageRequestId,
    ) -> Result<Option<CoverageRequest>, CoverageRepositoryError> {
        Ok(self
            .lock()
            .coverage
            .iter()
            .find(|stored| stored.organization_id() == organization_id && stored.id() == request_id)
            .cloned())
    }

    async fn transition(
        &self,
        request: &CoverageRequest,
        expected: CoverageStatus,
    ) -> Result<(), CoverageRepositoryError> {
        let mut state = self.lock();
        let stored = state
            .coverage
            .iter_mut()
            .find(|stored| stored.id() == request.id() && stored.status() == expected)
            .ok_or_else(|| {
                CoverageRepositoryError::stale(format!(
                    "coverage request {} is no longer {expected}",
                    request.id()
                ))
            })?;
        *stored = request.clone();
        Ok(())
    }

    async fn list(
        &self,
        organization_id: OrganizationId,
        filter: CoverageFilter,
    ) -> Result<Vec<CoverageRequest>, CoverageRepositoryError> {
        let mut requests: Vec<CoverageRequest> = self
            .lock()
            .coverage
            .iter()
            .filter(|stored| {
                stored.organization_id() == organization_id
                    && filter.status.is_none_or(|status| stored.status() == status)
                    && filter
                        .request_type
                        .is_none_or(|request_type| stored.request_type() == request_type)
                    && filter
                        .staff_id
                        .is_none_or(|staff_id| stored.requesting_staff_id() == staff_id)
            })
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.requested_at().cmp(&a.requested_at()));
        Ok(requests)
    }
}

#[async_trait]
impl ConflictRepository for MemoryStore {
    async fn insert_if_absent(
        &self,
        conflict: &ScheduleConflict,
    ) -> Result<bool, ConflictRepositoryError> {
        let mut state = self.lock();
        let duplicate = state.conflicts.iter().any(|stored| {
            !stored.is_resolved()
                && stored.shift_id() == conflict.shift_id()
                && stored.conflict_type() == conflict.conflict_type()
        });
        if duplicate {
            return Ok(false);
        }
        state.conflicts.push(conflict.clone());
        Ok(true)
    }

    async fn list(
        &self,
        organization_id: OrganizationId,
        filter: ConflictFilter,
    ) -> Result<Vec<ScheduleConflict>, ConflictRepositoryError> {
        let state = self.lock();
        let mut conflicts: Vec<ScheduleConflict> = state
            .conflicts
            .iter()
            .filter(|conflict| conflict.organization_id() == organization_id)
            .filter(|conflict| !filter.unresolved_only || !conflict.is_resolved())
            .filter(|conflict| filter.shift_id.is_none_or(|id| conflict.shift_id() == id))
            .filter(|conflict| {
                filter.dates.is_none_or(|(from, to)| {
                    state
                        .shifts
                        .get(&conflict.shift_id())
                        .is_some_and(|shift| (from..=to).contains(&shift.date()))
                })
            })
            .cloned()
            .collect();
        conflicts.sort_by_key(ScheduleConflict::detected_at);
        Ok(conflicts)
    }

    async fn find(
        &self,
        organization_id: OrganizationId,
        conflict_id: ConflictId,
    ) -> Result<Option<ScheduleConflict>, ConflictRepositoryError> {
        Ok(self
            .lock()
            .conflicts
            .iter()
            .find(|conflict| {
                conflict.id() == conflict_id && conflict.organization_id() == organization_id
            })
            .cloned())
    }

    async fn mark_resolved(
        &self,
        conflict: &ScheduleConflict,
    ) -> Result<bool, ConflictRepositoryError> {
        let mut state = self.lock();
        let Some(stored) = state
            .conflicts
            .iter_mut()
            .find(|stored| stored.id() == conflict.id() && !stored.is_resolved())
        else {
            return Ok(false);
        };
        *stored = conflict.clone();
        Ok(true)
    }
}

#[async_trait]
impl SwapRepository for MemoryStore {
    async fn insert(&self, swap: &ShiftSwap) -> Result<(), SwapRepositoryError> {
        let mut state = self.lock();
        if let Some(locked) = swap
            .shift_ids()
            .into_iter()
            .find(|shift_id| state.swap_locks.contains_key(shift_id))
        {
            return Err(SwapRepositoryError::shift_locked(format!(
                "shift {locked} is locked"
            )));
        }
        for shift_id in swap.shift_ids() {
            state.swap_locks.insert(shift_id, swap.id());
        }
        state.swaps.insert(swap.id(), swap.clone());
        Ok(())
    }

    async fn find(
        &self,
        organization_id: OrganizationId,
        swap_id: SwapId,
    ) -> Result<Option<ShiftSwap>, SwapRepositoryError> {
        Ok(self
            .lock()
            .swaps
            .get(&swap_id)
            .filter(|swap| swap.organization_id() == organization_id)
            .cloned())
    }

    async fn transition(
        &self,
        swap: &ShiftSwap,
        expected: SwapStatus,
    ) -> Result<(), SwapRepositoryError> {
        let mut state = self.lock();
        state.ensure_swap_status(swap.id(), expected)?;
        state.swaps.insert(swap.id(), swap.clone());
        if swap.status().is_terminal() {
            state.release_locks(swap.id());
        }
        Ok(())
    }

    async fn commit_exchange(&self, exchange: &SwapExchange) -> Result<(), SwapRepositoryError> {
        let mut state = self.lock();
        state.ensure_swap_status(exchange.swap.id(), exchange.expected_status)?;
        let before = state.shifts.clone();
        for write in [&exchange.requester_shift, &exchange.target_shift] {
            if let Err(message) = state.store_guarded_shift(write) {
                state.shifts = before;
                return Err(SwapRepositoryError::stale(message));
            }
        }
        state.swaps.insert(exchange.swap.id(), exchange.swap.clone());
        state.release_locks(exchange.swap.id());
        Ok(())
    }
}

#[async_trait]
impl TimeClockRepository for MemoryStore {
    async fn latest_event_at(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
    ) -> Result<Option<DateTime<Utc>>, TimeClockRepositoryError> {
        Ok(self
            .lock()
            .entries
            .iter()
            .filter(|entry| {
                entry.organization_id() == organization_id
                    && entry.staff_id() == staff_id
                    && !entry.is_adjustment()
            })
            .map(TimeClockEntry::recorded_at)
            .max())
    }

    async fn find_open(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
        kind: ClockIntervalKind,
    ) -> Result<Option<TimeClockEntry>, TimeClockRepositoryError> {
        let state = self.lock();
        let Some(entry_id) = state.open_intervals.get(&(staff_id, kind)) else {
            return Ok(None);
        };
        Ok(state
            .entries
            .iter()
            .find(|entry| entry.id() == *entry_id && entry.organization_id() == organization_id)
            .cloned())
    }

    async fn open_interval(
        &self,
        entry: &TimeClockEntry,
        kind: ClockIntervalKind,
        shift: Option<ShiftWrite>,
    ) -> Result<(), TimeClockRepositoryError> {
        let mut state = self.lock();
        let key = (entry.staff_id(), kind);
        if state.open_intervals.contains_key(&key) {
            return Err(TimeClockRepositoryError::already_open(format!(
                "{kind} for staff {}",
                entry.staff_id()
            )));
        }
        if let Some(write) = &shift {
            state
                .store_guarded_shift(write)
                .map_err(TimeClockRepositoryError::shift_changed)?;
        }
        state.open_intervals.insert(key, entry.id());
        state.entries.push(entry.clone());
        Ok(())
    }

    async fn close_interval(
        &self,
        entry: &TimeClockEntry,
        kind: ClockIntervalKind,
        shift: Option<ShiftWrite>,
    ) -> Result<(), TimeClockRepositoryError> {
        let mut state = self.lock();
        let key = (entry.staff_id(), kind);
        if !state.open_intervals.contains_key(&key) {
            return Err(TimeClockRepositoryError::not_open(format!(
                "{kind} for staff {}",
                entry.staff_id()
            )));
        }
        if let Some(write) = &shift {
            state
                .store_guarded_shift(write)
                .map_err(TimeClockRepositoryError::shift_changed)?;
        }
        state.open_intervals.remove(&key);
        state.entries.push(entry.clone());
        Ok(())
    }

    async fn append_adjustment(
        &self,
        entry: &TimeClockEntry,
    ) -> Result<(), TimeClockRepositoryError> {
        self.lock().entries.push(entry.clone());
        Ok(())
    }

    async fn find_entry(
        &self,
        organization_id: OrganizationId,
        entry_id: TimeEntryId,
    ) -> Result<Option<TimeClockEntry>, TimeClockRepositoryError> {
        Ok(self
            .lock()
            .entries
            .iter()
            .find(|entry| entry.id() == entry_id && entry.organization_id() == organization_id)
            .cloned())
    }

    async fn list_entries(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TimeClockEntry>, TimeClockRepositoryError> {
        let mut entries: Vec<TimeClockEntry> = self
            .lock()
            .entries
            .iter()
            .filter(|entry| {
                entry.organization_id() == organization_id
                    && entry.staff_id() == staff_id
                    && (from..=to).contains(&entry.recorded_at())
            })
            .cloned()
            .collect();
        entries.sort_by_key(TimeClockEntry::recorded_at);
        Ok(entries)
    }
}

#[async_trait]
impl OvertimeRepository for MemoryStore {
    async fn accumulate(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
        week_start: NaiveDate,
        session: WorkedDuration,
        policy: &OvertimePolicy,
    ) -> Result<OvertimeRecord, OvertimeRepositoryError> {
        let mut state = self.lock();
        let bucket = state
            .overtime
            .entry((organization_id, staff_id, week_start))
            .or_insert_with(|| {
                OvertimeRecord::empty(
                    OvertimeRecordId::random(),
                    organization_id,
                    staff_id,
                    week_start,
                )
            });
        *bucket = bucket.accumulate(session, policy);
        Ok(bucket.clone())
    }

    async fn list_for_staff(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<OvertimeRecord>, OvertimeRepositoryError> {
        let mut records: Vec<OvertimeRecord> = self
            .lock()
            .overtime
            .values()
            .filter(|record| {
                record.organization_id() == organization_id
                    && record.staff_id() == staff_id
                    && (from..=to).contains(&record.week_start())
            })
            .cloned()
            .collect();
        records.sort_by_key(OvertimeRecord::week_start);
        Ok(records)
    }
}

#[async_trait]
impl AppointmentRepository for MemoryStore {
    async fn insert_template(
        &self,
        template: &RecurringAppointmentTemplate,
    ) -> Result<(), AppointmentRepositoryError> {
        self.lock().templates.insert(template.id(), template.clone());
        Ok(())
    }

    async fn find_template(
        &self,
        organization_id: OrganizationId,
        template_id: TemplateId,
    ) -> Result<Option<RecurringAppointmentTemplate>, AppointmentRepositoryError> {
        Ok(self
            .lock()
            .templates
            .get(&template_id)
            .filter(|template| template.organization_id() == organization_id)
            .cloned())
    }

    async fn insert_generated(
        &self,
        template: &RecurringAppointmentTemplate,
        candidates: &[Appointment],
        safety_cap: u32,
    ) -> Result<Vec<Appointment>, AppointmentRepositoryError> {
        let mut state = self.lock();
        let existing = state
            .appointments
            .iter()
            .filter(|appointment| {
                appointment.organization_id() == template.organization_id()
                    && appointment.template_id() == Some(template.id())
            })
            .count();
        let existing = u64::try_from(existing)
            .map_err(|err| AppointmentRepositoryError::query(err.to_string()))?;
        let mut remaining = template.remaining_allowance(existing, safety_cap);

        let mut created = Vec::new();
        for candidate in candidates {
            if remaining == 0 {
                break;
            }
            let duplicate = state.appointments.iter().any(|stored| {
                stored.client_id() == candidate.client_id()
                    && stored.staff_id() == candidate.staff_id()
                    && stored.start() == candidate.start()
            });
            if !duplicate {
                state.appointments.push(candidate.clone());
                created.push(candidate.clone());
                remaining -= 1;
            }
        }
        Ok(created)
    }
}

#[async_trait]
impl TenantDirectory for MemoryStore {
    async fn staff_exists(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
    ) -> Result<bool, TenantDirectoryError> {
        Ok(self.lock().staff.contains(&(organization_id, staff_id)))
    }

    async fn client_exists(
        &self,
        organization_id: OrganizationId,
        client_id: ClientId,
    ) -> Result<bool, TenantDirectoryError> {
        Ok(self.lock().clients.contains_key(&(organization_id, client_id)))
    }

    async fn client_documentation_defaults(
        &self,
        organization_id: OrganizationId,
        client_id: ClientId,
    ) -> Result<Option<Vec<DocumentType>>, TenantDirectoryError> {
        Ok(self
            .lock()
            .clients
            .get(&(organization_id, client_id))
            .cloned()
            .flatten())
    }
}

#[async_trait]
impl DocumentationLookup for MemoryStore {
    async fn has_record(
        &self,
        organization_id: OrganizationId,
        document_type: DocumentType,
        client_id: ClientId,
        staff_id: StaffId,
        date: NaiveDate,
    ) -> Result<bool, DocumentationLookupError> {
        Ok(self
            .lock()
            .documents
            .contains(&(organization_id, document_type, client_id, staff_id, date)))
    }
}

#[async_trait]
impl SpecialRequirementLookup for MemoryStore {
    async fn active_requirements(
        &self,
        organization_id: OrganizationId,
        client_id: ClientId,
        date: NaiveDate,
        _staff_id: StaffId,
        _shift_id: Option<ShiftId>,
    ) -> Result<Vec<RequirementResponse>, SpecialRequirementLookupError> {
        Ok(self
            .lock()
            .requirements
            .iter()
            .filter(|stored| {
                stored.organization_id == organization_id
                    && stored.client_id == client_id
                    && stored.date == date
            })
            .map(|stored| stored.response.clone())
            .collect())
    }
}
