//! Scheduling domain: entities, rules, ports and services.
//!
//! Purpose: hold every scheduling invariant in plain Rust types so adapters
//! only translate. Entities are immutable; lifecycle methods return the next
//! state or an [`InvalidTransition`].
//!
//! Public surface:
//! - Error (alias to `error::Error`): payload crossing every driving port.
//! - Entities: [`Schedule`], [`Shift`], [`StaffAvailability`],
//!   [`ScheduleConflict`], [`ShiftSwap`], [`CoverageRequest`],
//!   [`TimeClockEntry`],
//!   [`OvertimeRecord`], [`RecurringAppointmentTemplate`], [`Appointment`].
//! - Services implementing the driving ports in [`ports`].

pub mod access;
pub mod availability;
pub mod availability_service;
pub mod calendar;
pub mod compliance;
pub mod compliance_gate;
pub mod conflict_detector;
pub mod conflicts;
pub mod coverage;
pub mod coverage_service;
pub mod error;
pub mod ids;
pub mod overtime;
pub mod overtime_service;
pub mod policy;
pub mod ports;
pub mod recurrence;
pub mod recurring_appointment_service;
pub mod scheduling;
mod service_support;
pub mod shift_service;
pub mod swap_service;
pub mod swaps;
mod text_enum;
pub mod time_clock;
pub mod time_clock_service;
pub mod transition;

pub use self::access::{
    Actor, Capability, ParseCapabilityError, ParseRoleError, Role, RoleCapabilityCheck,
};
pub use self::availability::{
    AvailabilityType, AvailabilityValidationError, ParseAvailabilityTypeError, StaffAvailability,
    StaffAvailabilityDraft, effective_rule,
};
pub use self::availability_service::AvailabilityService;
pub use self::calendar::{iso_weekday_number, weekday_from_iso_number, week_start};
pub use self::compliance::{
    ComplianceReport, DocumentType, MissingItem, ParseDocumentTypeError, RequirementResponse,
    required_documents,
};
pub use self::compliance_gate::ComplianceGate;
pub use self::conflict_detector::ConflictDetector;
pub use self::conflicts::{
    ConflictFinding, ConflictSeverity, ConflictType, ParseConflictSeverityError,
    ParseConflictTypeError, ScheduleConflict, find_conflicts,
};
pub use self::coverage::{
    CoverageRequest, CoverageRequestDraft, CoverageRequestError, CoverageRequestType,
    CoverageStatus, ParseCoverageRequestTypeError, ParseCoverageStatusError,
};
pub use self::coverage_service::CoverageService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ids::{
    AppointmentId, AvailabilityId, ClientId, ConflictId, CoverageRequestId, OrganizationId,
    OvertimeRecordId, ScheduleId, ShiftId, StaffId, SwapId, TemplateId, TimeEntryId, UserId,
};
pub use self::overtime::{
    OvertimeHours, OvertimePolicy, OvertimeRecord, OvertimeTotalMismatch, WorkedDuration,
};
pub use self::overtime_service::{OvertimeAccumulator, OvertimeService};
pub use self::policy::{DEFAULT_GENERATION_SAFETY_CAP, SchedulingPolicy};
pub use self::recurrence::{
    Appointment, AppointmentStatus, AppointmentType, DateWindow, ParseAppointmentStatusError,
    ParseAppointmentTypeError, ParseRecurrencePatternError, RecurrencePattern,
    RecurrenceValidationError, RecurringAppointmentTemplate, RecurringAppointmentTemplateDraft,
};
pub use self::recurring_appointment_service::RecurringAppointmentService;
pub use self::scheduling::{
    ParseScheduleStatusError, ParseShiftStatusError, ParseShiftTypeError, Schedule,
    ScheduleDraft, ScheduleStatus, SchedulingValidationError, Shift, ShiftChanges, ShiftDraft,
    ShiftStatus, ShiftType, ShiftUpdateError, ShiftWrite, TimeWindow,
};
pub use self::shift_service::ShiftService;
pub use self::swap_service::SwapService;
pub use self::swaps::{
    ParseSwapStatusError, ShiftSwap, ShiftSwapDraft, SwapExchange, SwapRequestError, SwapStatus,
};
pub use self::time_clock::{
    BreakKind, ClockIntervalKind, ParseBreakKindError, ParseClockIntervalKindError,
    ParseTimeEntryTypeError, TimeClockEntry, TimeClockEntryDraft, TimeClockValidationError,
    TimeEntryType, ensure_strictly_after,
};
pub use self::time_clock_service::TimeClockService;
pub use self::transition::InvalidTransition;

/// Result alias for operations crossing the driving ports.
///
/// # Examples
/// ```
/// use carerota::domain::{DomainResult, Error};
///
/// fn reject() -> DomainResult<()> {
///     Err(Error::forbidden("user lacks the clock_time capability"))
/// }
/// assert!(reject().is_err());
/// ```
pub type DomainResult<T> = Result<T, Error>;
