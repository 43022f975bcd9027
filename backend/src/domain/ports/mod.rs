//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, lookups, the capability check) describe what
//! the scheduling services need from storage and neighbouring systems.
//! Driving ports (`*Command`, `*Query`) are what callers invoke.

mod macros;
pub(crate) use macros::define_port_error;

mod appointment_repository;
mod availability_command;
mod availability_repository;
mod capability_check;
mod conflict_repository;
mod coverage_command;
mod coverage_repository;
mod documentation_lookup;
mod overtime_query;
mod overtime_repository;
mod recurring_appointment_command;
mod schedule_repository;
mod shift_command;
mod special_requirement_lookup;
mod swap_command;
mod swap_repository;
mod tenant_directory;
mod time_clock_command;
mod time_clock_repository;

#[cfg(test)]
pub use appointment_repository::MockAppointmentRepository;
pub use appointment_repository::{AppointmentRepository, AppointmentRepositoryError};
#[cfg(test)]
pub use availability_command::MockAvailabilityCommand;
pub use availability_command::{
    AvailabilityCommand, AvailabilitySlot, CreateAvailabilityRequest, DeleteAvailabilityRequest,
    ListAvailabilityRequest, ReplaceAvailabilityRequest, UpdateAvailabilityRequest,
};
#[cfg(test)]
pub use availability_repository::MockAvailabilityRepository;
pub use availability_repository::{AvailabilityRepository, AvailabilityRepositoryError};
#[cfg(test)]
pub use capability_check::MockCapabilityCheck;
pub use capability_check::{CapabilityCheck, CapabilityCheckError, FixtureCapabilityCheck};
#[cfg(test)]
pub use conflict_repository::MockConflictRepository;
pub use conflict_repository::{ConflictFilter, ConflictRepository, ConflictRepositoryError};
#[cfg(test)]
pub use coverage_command::MockCoverageCommand;
pub use coverage_command::{
    CoverageCommand, CoverageDecisionRequest, ListCoverageRequest, OpenCoverageRequest,
};
#[cfg(test)]
pub use coverage_repository::MockCoverageRepository;
pub use coverage_repository::{CoverageFilter, CoverageRepository, CoverageRepositoryError};
#[cfg(test)]
pub use documentation_lookup::MockDocumentationLookup;
pub use documentation_lookup::{
    DocumentationLookup, DocumentationLookupError, FixtureDocumentationLookup,
};
#[cfg(test)]
pub use overtime_query::MockOvertimeQuery;
pub use overtime_query::{OvertimeQuery, OvertimeSummary, OvertimeSummaryRequest};
#[cfg(test)]
pub use overtime_repository::MockOvertimeRepository;
pub use overtime_repository::{OvertimeRepository, OvertimeRepositoryError};
#[cfg(test)]
pub use recurring_appointment_command::MockRecurringAppointmentCommand;
pub use recurring_appointment_command::{
    CreateTemplateRequest, GenerateInstancesRequest, RecurringAppointmentCommand,
};
#[cfg(test)]
pub use schedule_repository::MockScheduleRepository;
pub use schedule_repository::{ScheduleRepository, ScheduleRepositoryError};
#[cfg(test)]
pub use shift_command::MockShiftCommand;
pub(crate) use shift_command::ShiftWindows;
pub use shift_command::{
    CancelShiftRequest, CopyScheduleRequest, CopyScheduleResponse, CreateScheduleRequest,
    CreateShiftRequest, CreateShiftsRequest, CreateShiftsResponse, DetectConflictsRequest,
    DetectConflictsResponse, ListConflictsRequest, PublishScheduleRequest, ResolveConflictRequest,
    ShiftCommand, ShiftSpec, ShiftTimes, UpdateShiftRequest,
};
#[cfg(test)]
pub use special_requirement_lookup::MockSpecialRequirementLookup;
pub use special_requirement_lookup::{
    FixtureSpecialRequirementLookup, SpecialRequirementLookup, SpecialRequirementLookupError,
};
#[cfg(test)]
pub use swap_command::MockShiftSwapCommand;
pub use swap_command::{RequestSwapRequest, ShiftSwapCommand, SwapDecisionRequest};
#[cfg(test)]
pub use swap_repository::MockSwapRepository;
pub use swap_repository::{SwapRepository, SwapRepositoryError};
#[cfg(test)]
pub use tenant_directory::MockTenantDirectory;
pub use tenant_directory::{FixtureTenantDirectory, TenantDirectory, TenantDirectoryError};
#[cfg(test)]
pub use time_clock_command::MockTimeClockCommand;
pub use time_clock_command::{
    AdjustEntryRequest, BreakRequest, ClockInRequest, ClockOutRequest, ListEntriesRequest,
    TimeClockCommand,
};
#[cfg(test)]
pub use time_clock_repository::MockTimeClockRepository;
pub use time_clock_repository::{TimeClockRepository, TimeClockRepositoryError};
