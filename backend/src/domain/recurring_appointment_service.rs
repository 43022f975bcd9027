//! Recurring appointment templates and their materialisation.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::ports::{
    AppointmentRepository, AppointmentRepositoryError, CapabilityCheck, CreateTemplateRequest,
    GenerateInstancesRequest, RecurringAppointmentCommand, TenantDirectory,
};
use crate::domain::service_support::{authorize, map_directory_error};
use crate::domain::{
    Appointment, AppointmentId, Capability, DateWindow, Error, RecurringAppointmentTemplate,
    RecurringAppointmentTemplateDraft, TemplateId,
};

fn map_repository_error(error: AppointmentRepositoryError) -> Error {
    match error {
        AppointmentRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("appointment repository unavailable: {message}"))
        }
        AppointmentRepositoryError::Query { message } => {
            Error::internal(format!("appointment repository error: {message}"))
        }
    }
}

/// Domain service implementing [`RecurringAppointmentCommand`].
pub struct RecurringAppointmentService<P, T, K> {
    appointments: Arc<P>,
    directory: Arc<T>,
    access: Arc<K>,
    safety_cap: u32,
}

impl<P, T, K> RecurringAppointmentService<P, T, K> {
    /// `safety_cap` bounds one run for templates without `max_occurrences`.
    pub fn new(appointments: Arc<P>, directory: Arc<T>, access: Arc<K>, safety_cap: u32) -> Self {
        Self {
            appointments,
            directory,
            access,
            safety_cap,
        }
    }
}

impl<P, T, K> RecurringAppointmentService<P, T, K>
where
    T: TenantDirectory,
{
    async fn ensure_participants(&self, request: &CreateTemplateRequest) -> Result<(), Error> {
        let organization_id = request.actor.organization_id;
        if !self
            .directory
            .staff_exists(organization_id, request.staff_id)
            .await
            .map_err(map_directory_error)?
        {
            return Err(Error::not_found(format!(
                "staff member {} not found",
                request.staff_id
            )));
        }
        if !self
            .directory
            .client_exists(organization_id, request.client_id)
            .await
            .map_err(map_directory_error)?
        {
            return Err(Error::not_found(format!(
                "client {} not found",
                request.client_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl<P, T, K> RecurringAppointmentCommand for RecurringAppointmentService<P, T, K>
where
    P: AppointmentRepository,
    T: TenantDirectory,
    K: CapabilityCheck,
{
    async fn create_template(
        &self,
        request: CreateTemplateRequest,
    ) -> Result<RecurringAppointmentTemplate, Error> {
        authorize(
            self.access.as_ref(),
            &request.actor,
            Capability::ManageRecurringAppointments,
        )
        .await?;
        self.ensure_participants(&request).await?;

        let template = RecurringAppointmentTemplate::new(RecurringAppointmentTemplateDraft {
            id: TemplateId::random(),
            organization_id: request.actor.organization_id,
            client_id: request.client_id,
            staff_id: request.staff_id,
            appointment_type: request.appointment_type,
            title: request.title,
            description: request.description,
            location: request.location,
            start_time: request.start_time,
            duration_minutes: request.duration_minutes,
            pattern: request.pattern,
            weekdays: request.weekdays,
            start_date: request.start_date,
            end_date: request.end_date,
            max_occurrences: request.max_occurrences,
            is_active: true,
        })
        .map_err(|err| Error::validation(err.to_string()))?;

        self.appointments
            .insert_template(&template)
            .await
            .map_err(map_repository_error)?;
        info!(
            template_id = %template.id(),
            pattern = %template.pattern(),
            "recurring template created"
        );
        Ok(template)
    }

    async fn generate_recurring_instances(
        &self,
        request: GenerateInstancesRequest,
    ) -> Result<Vec<Appointment>, Error> {
        let actor = request.actor;
        authorize(
            self.access.as_ref(),
            &actor,
            Capability::ManageRecurringAppointments,
        )
        .await?;
        let window = DateWindow::new(request.window_start, request.window_end)
            .map_err(|err| Error::validation(err.to_string()))?;

        let template = self
            .appointments
            .find_template(actor.organization_id, request.template_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| {
                Error::not_found(format!("template {} not found", request.template_id))
            })?;
        if !template.is_active() {
            return Err(Error::invalid_state(format!(
                "template {} is inactive",
                template.id()
            )));
        }

        let candidates: Vec<Appointment> = template
            .occurrence_dates(window)
            .into_iter()
            .map(|date| template.instance_on(AppointmentId::random(), date))
            .collect();
        debug!(
            template_id = %template.id(),
            candidates = candidates.len(),
            "generating recurring instances"
        );
        let created = self
            .appointments
            .insert_generated(&template, &candidates, self.safety_cap)
            .await
            .map_err(map_repository_error)?;

        info!(
            template_id = %template.id(),
            window_start = %window.start(),
            window_end = %window.end(),
            created = created.len(),
            "recurring instances generated"
        );
        Ok(created)
    }
}

#[cfg(test)]
#[path = "recurring_appointment_service_tests.rs"]
mod tests;
