//! PostgreSQL persistence adapters using Diesel with `diesel-async`.
//!
//! Each adapter implements one domain port and only translates between row
//! structs and domain entities. Row structs (`models`) and table definitions
//! (`schema`) stay private to this module. Invariants that must hold under
//! concurrency, such as one open swap per shift, one pending coverage
//! request per shift or one open clock interval per kind, are enforced by
//! constraints in `backend/migrations` and surface as typed port errors.
//!
//! # Example
//!
//! ```ignore
//! use carerota::outbound::persistence::{DbPool, DieselScheduleRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/carerota")).await?;
//! let schedules = DieselScheduleRepository::new(pool);
//! ```

mod diesel_appointment_repository;
mod diesel_availability_repository;
mod diesel_basic_error_mapping;
mod diesel_conflict_repository;
mod diesel_coverage_repository;
mod diesel_overtime_repository;
mod diesel_schedule_repository;
mod diesel_swap_repository;
mod diesel_time_clock_repository;
pub mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_appointment_repository::DieselAppointmentRepository;
pub use diesel_availability_repository::DieselAvailabilityRepository;
pub use diesel_conflict_repository::DieselConflictRepository;
pub use diesel_coverage_repository::DieselCoverageRepository;
pub use diesel_overtime_repository::DieselOvertimeRepository;
pub use diesel_schedule_repository::DieselScheduleRepository;
pub use diesel_swap_repository::DieselSwapRepository;
pub use diesel_time_clock_repository::DieselTimeClockRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
