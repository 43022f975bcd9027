//! Driving port for recurring appointment templates.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Weekday};

use crate::domain::{
    Actor, Appointment, AppointmentType, ClientId, Error, RecurrencePattern,
    RecurringAppointmentTemplate, StaffId, TemplateId,
};

/// Request to create a template.
#[derive(Debug, Clone)]
pub struct CreateTemplateRequest {
    pub actor: Actor,
    pub client_id: ClientId,
    pub staff_id: StaffId,
    pub appointment_type: AppointmentType,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: NaiveTime,
    pub duration_minutes: u32,
    pub pattern: RecurrencePattern,
    pub weekdays: Vec<Weekday>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub max_occurrences: Option<u32>,
}

/// Request to materialise a template over an inclusive date window.
#[derive(Debug, Clone, Copy)]
pub struct GenerateInstancesRequest {
    pub actor: Actor,
    pub template_id: TemplateId,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
}

/// Template management and materialisation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecurringAppointmentCommand: Send + Sync {
    async fn create_template(
        &self,
        request: CreateTemplateRequest,
    ) -> Result<RecurringAppointmentTemplate, Error>;

    /// Idempotent: returns only appointments created by this call.
    async fn generate_recurring_instances(
        &self,
        request: GenerateInstancesRequest,
    ) -> Result<Vec<Appointment>, Error>;
}
