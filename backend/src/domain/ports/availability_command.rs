//! Driving port for staff availability management.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Weekday};

use crate::domain::{Actor, AvailabilityId, AvailabilityType, Error, StaffAvailability, StaffId};

/// One weekly availability slot as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilitySlot {
    pub weekday: Weekday,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub availability_type: AvailabilityType,
    pub effective_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Request to read a staff member's availability.
#[derive(Debug, Clone, Copy)]
pub struct ListAvailabilityRequest {
    pub actor: Actor,
    pub staff_id: StaffId,
    /// Only rules in force on this date.
    pub effective_on: Option<NaiveDate>,
}

/// Request to add one slot.
#[derive(Debug, Clone)]
pub struct CreateAvailabilityRequest {
    pub actor: Actor,
    pub staff_id: StaffId,
    pub slot: AvailabilitySlot,
}

/// Request to replace an existing slot's values.
#[derive(Debug, Clone)]
pub struct UpdateAvailabilityRequest {
    pub actor: Actor,
    pub staff_id: StaffId,
    pub availability_id: AvailabilityId,
    pub slot: AvailabilitySlot,
}

/// Request to remove one slot.
#[derive(Debug, Clone, Copy)]
pub struct DeleteAvailabilityRequest {
    pub actor: Actor,
    pub staff_id: StaffId,
    pub availability_id: AvailabilityId,
}

/// Request to swap a staff member's whole availability for `slots`.
#[derive(Debug, Clone)]
pub struct ReplaceAvailabilityRequest {
    pub actor: Actor,
    pub staff_id: StaffId,
    pub slots: Vec<AvailabilitySlot>,
}

/// Availability rule maintenance.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvailabilityCommand: Send + Sync {
    /// Staff may read their own rules; everyone else needs scheduling rights.
    async fn list_availability(
        &self,
        request: ListAvailabilityRequest,
    ) -> Result<Vec<StaffAvailability>, Error>;

    async fn create_availability(
        &self,
        request: CreateAvailabilityRequest,
    ) -> Result<StaffAvailability, Error>;

    async fn update_availability(
        &self,
        request: UpdateAvailabilityRequest,
    ) -> Result<StaffAvailability, Error>;

    async fn delete_availability(&self, request: DeleteAvailabilityRequest) -> Result<(), Error>;

    /// Slots may not clash with each other; the old set is dropped whole.
    async fn replace_availability(
        &self,
        request: ReplaceAvailabilityRequest,
    ) -> Result<Vec<StaffAvailability>, Error>;
}
