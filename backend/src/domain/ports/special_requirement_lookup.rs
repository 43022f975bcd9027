//! Port onto the external client special requirements.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{ClientId, OrganizationId, RequirementResponse, ShiftId, StaffId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by special requirement lookup adapters.
    pub enum SpecialRequirementLookupError {
        /// The requirements system could not be reached.
        Unavailable { message: String } =>
            "special requirement lookup unavailable: {message}",
    }
}

/// Lists a client's active special requirements for a date, each flagged with
/// whether the staff member logged a response for the given shift.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpecialRequirementLookup: Send + Sync {
    async fn active_requirements(
        &self,
        organization_id: OrganizationId,
        client_id: ClientId,
        date: NaiveDate,
        staff_id: StaffId,
        shift_id: Option<ShiftId>,
    ) -> Result<Vec<RequirementResponse>, SpecialRequirementLookupError>;
}

/// Fixture lookup for clients without special requirements.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureSpecialRequirementLookup;

#[async_trait]
impl SpecialRequirementLookup for FixtureSpecialRequirementLookup {
    async fn active_requirements(
        &self,
        _organization_id: OrganizationId,
        _client_id: ClientId,
        _date: NaiveDate,
        _staff_id: StaffId,
        _shift_id: Option<ShiftId>,
    ) -> Result<Vec<RequirementResponse>, SpecialRequirementLookupError> {
        Ok(Vec::new())
    }
}
