//! Agency fixture shared by the integration suites.
//!
//! Every service runs against one [`MemoryStore`] and one [`MutableClock`],
//! so a suite can drive several services and inspect the shared state.
#![allow(dead_code, reason = "each suite uses a different subset")]

pub mod embedded_postgres;

use std::sync::Arc;

use carerota::domain::ports::{
    CreateScheduleRequest, CreateShiftRequest, ShiftCommand, ShiftTimes,
};
use carerota::domain::{
    Actor, AvailabilityService, ClientId, ComplianceGate, CoverageService, DocumentType,
    OrganizationId, OvertimeAccumulator, OvertimePolicy, OvertimeService,
    RecurringAppointmentService, Role, RoleCapabilityCheck, Schedule, Shift, ShiftService,
    ShiftType, StaffId, SwapService, TimeClockService, UserId,
};
use carerota::test_support::{MemoryStore, MutableClock};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use mockable::Clock;

pub type Shifts =
    ShiftService<MemoryStore, MemoryStore, MemoryStore, MemoryStore, RoleCapabilityCheck>;
pub type Swaps =
    SwapService<MemoryStore, MemoryStore, MemoryStore, MemoryStore, RoleCapabilityCheck>;
pub type TimeClock = TimeClockService<
    MemoryStore,
    MemoryStore,
    MemoryStore,
    MemoryStore,
    MemoryStore,
    MemoryStore,
    RoleCapabilityCheck,
>;
pub type Availability = AvailabilityService<MemoryStore, MemoryStore, RoleCapabilityCheck>;
pub type Coverage =
    CoverageService<MemoryStore, MemoryStore, MemoryStore, RoleCapabilityCheck>;
pub type Overtime = OvertimeService<MemoryStore, RoleCapabilityCheck>;
pub type Recurring = RecurringAppointmentService<MemoryStore, MemoryStore, RoleCapabilityCheck>;

pub const SAFETY_CAP: u32 = 50;

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
}

pub fn instant(day: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(time(hour, minute)))
}

/// One organization with a manager, an administrator and two caregivers.
pub struct Agency {
    pub organization_id: OrganizationId,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<MutableClock>,
    pub access: Arc<RoleCapabilityCheck>,
    pub manager: Actor,
    pub administrator: Actor,
    pub alice: Actor,
    pub bob: Actor,
    pub client_id: ClientId,
}

impl Agency {
    /// Agency whose clock starts at `now`.
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        let organization_id = OrganizationId::random();
        let store = Arc::new(MemoryStore::new());
        let caregiver = |store: &MemoryStore| {
            let staff_id = StaffId::random();
            store.register_staff(organization_id, staff_id);
            Actor::new(UserId::random(), organization_id).with_staff(staff_id)
        };
        let alice = caregiver(store.as_ref());
        let bob = caregiver(store.as_ref());
        let manager = Actor::new(UserId::random(), organization_id);
        let administrator = Actor::new(UserId::random(), organization_id);
        let client_id = ClientId::random();
        store.register_client(organization_id, client_id, None);

        let access = RoleCapabilityCheck::new()
            .with_role(manager.user_id, Role::Manager)
            .with_role(administrator.user_id, Role::Administrator)
            .with_role(alice.user_id, Role::Caregiver)
            .with_role(bob.user_id, Role::Caregiver);

        Self {
            organization_id,
            store,
            clock: Arc::new(MutableClock::new(now)),
            access: Arc::new(access),
            manager,
            administrator,
            alice,
            bob,
            client_id,
        }
    }

    fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock) as Arc<dyn Clock>
    }

    pub fn shifts(&self) -> Shifts {
        ShiftService::new(
            Arc::clone(&self.store),
            Arc::clone(&self.store),
            Arc::clone(&self.store),
            Arc::clone(&self.store),
            Arc::clone(&self.access),
            self.clock(),
        )
    }

    pub fn swaps(&self) -> Swaps {
        SwapService::new(
            Arc::clone(&self.store),
            Arc::clone(&self.store),
            Arc::clone(&self.store),
            Arc::clone(&self.store),
            Arc::clone(&self.access),
            self.clock(),
        )
    }

    pub fn time_clock(&self) -> TimeClock {
        TimeClockService::new(
            Arc::clone(&self.store),
            Arc::clone(&self.store),
            ComplianceGate::new(
                Arc::clone(&self.store),
                Arc::clone(&self.store),
                Arc::clone(&self.store),
                DocumentType::ShiftNote,
            ),
            OvertimeAccumulator::new(Arc::clone(&self.store), OvertimePolicy::default()),
            Arc::clone(&self.access),
            self.clock(),
        )
    }

    pub fn availability(&self) -> Availability {
        AvailabilityService::new(
            Arc::clone(&self.store),
            Arc::clone(&self.store),
            Arc::clone(&self.access),
        )
    }

    pub fn coverage(&self) -> Coverage {
        CoverageService::new(
            Arc::clone(&self.store),
            Arc::clone(&self.store),
            Arc::clone(&self.store),
            Arc::clone(&self.access),
            self.clock(),
        )
    }

    pub fn overtime(&self) -> Overtime {
        OvertimeService::new(Arc::clone(&self.store), Arc::clone(&self.access))
    }

    pub fn recurring(&self) -> Recurring {
        RecurringAppointmentService::new(
            Arc::clone(&self.store),
            Arc::clone(&self.store),
            Arc::clone(&self.access),
            SAFETY_CAP,
        )
    }

    /// Draft schedule covering `start..=end`, created by the manager.
    pub async fn schedule(&self, start: NaiveDate, end: NaiveDate) -> Schedule {
        self.shifts()
            .create_schedule(CreateScheduleRequest {
                actor: self.manager,
                name: "Weekly rota".to_owned(),
                start_date: start,
                end_date: end,
                notes: None,
            })
            .await
            .expect("schedule is created")
    }

    /// Shift for `staff` on `day` between the given whole hours.
    pub async fn shift(
        &self,
        schedule: &Schedule,
        staff: &Actor,
        day: NaiveDate,
        start_hour: u32,
        end_hour: u32,
    ) -> Shift {
        self.shifts()
            .create_shift(CreateShiftRequest {
                actor: self.manager,
                schedule_id: schedule.id(),
                staff_id: staff.staff_id.expect("caregiver has a staff id"),
                client_id: None,
                date: day,
                times: ShiftTimes::new(time(start_hour, 0), time(end_hour, 0)),
                shift_type: ShiftType::Regular,
                notes: None,
                required_documentation: None,
            })
            .await
            .expect("shift is created")
    }

    pub fn staff_id(actor: &Actor) -> StaffId {
        actor.staff_id.expect("caregiver has a staff id")
    }
}
