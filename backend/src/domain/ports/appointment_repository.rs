//! Port for recurring templates and generated appointments.

use async_trait::async_trait;

use crate::domain::{Appointment, OrganizationId, RecurringAppointmentTemplate, TemplateId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by appointment repository adapters.
    pub enum AppointmentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "appointment repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "appointment repository query failed: {message}",
    }
}

/// Store for templates and their materialised appointments.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Insert a new template.
    async fn insert_template(
        &self,
        template: &RecurringAppointmentTemplate,
    ) -> Result<(), AppointmentRepositoryError>;

    /// Find a template by id within the organization.
    async fn find_template(
        &self,
        organization_id: OrganizationId,
        template_id: TemplateId,
    ) -> Result<Option<RecurringAppointmentTemplate>, AppointmentRepositoryError>;

    /// Write generated instances under a per-template lock.
    ///
    /// Counts the template's existing instances, then inserts `candidates` in
    /// order, skipping any whose client, staff and start already exist, until
    /// [`RecurringAppointmentTemplate::remaining_allowance`] is used up.
    /// Concurrent runs for one template serialize on the lock, so together
    /// they never exceed `max_occurrences`. Returns the rows written.
    async fn insert_generated(
        &self,
        template: &RecurringAppointmentTemplate,
        candidates: &[Appointment],
        safety_cap: u32,
    ) -> Result<Vec<Appointment>, AppointmentRepositoryError>;
}
