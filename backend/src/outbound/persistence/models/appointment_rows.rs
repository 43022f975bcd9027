//! Rows for recurring templates and generated appointments.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    Appointment, AppointmentType, ClientId, OrganizationId, RecurrencePattern,
    RecurringAppointmentTemplate, RecurringAppointmentTemplateDraft, StaffId, iso_weekday_number,
    weekday_from_iso_number,
};
use crate::outbound::persistence::schema::{appointments, recurring_appointment_templates};

use super::{RowMappingError, parse_column};

const TEMPLATES: &str = "recurring_appointment_templates";

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = recurring_appointment_templates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TemplateRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub client_id: Uuid,
    pub staff_id: Uuid,
    pub appointment_type: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: NaiveTime,
    pub duration_minutes: i32,
    pub pattern: String,
    pub weekdays: Vec<i16>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub max_occurrences: Option<i32>,
    pub is_active: bool,
}

impl TryFrom<TemplateRow> for RecurringAppointmentTemplate {
    type Error = RowMappingError;

    fn try_from(row: TemplateRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let unsigned = |value: i32, column: &str| {
            u32::try_from(value)
                .map_err(|_| RowMappingError::new(TEMPLATES, id, format!("negative {column}")))
        };
        let weekdays = row
            .weekdays
            .iter()
            .map(|number| {
                weekday_from_iso_number(*number).ok_or_else(|| {
                    RowMappingError::new(TEMPLATES, id, format!("weekday {number} out of range"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        RecurringAppointmentTemplate::new(RecurringAppointmentTemplateDraft {
            id: id.into(),
            organization_id: OrganizationId::from_uuid(row.organization_id),
            client_id: ClientId::from_uuid(row.client_id),
            staff_id: StaffId::from_uuid(row.staff_id),
            appointment_type: parse_column::<AppointmentType>(TEMPLATES, id, &row.appointment_type)?,
            title: row.title,
            description: row.description,
            location: row.location,
            start_time: row.start_time,
            duration_minutes: unsigned(row.duration_minutes, "duration_minutes")?,
            pattern: parse_column::<RecurrencePattern>(TEMPLATES, id, &row.pattern)?,
            weekdays,
            start_date: row.start_date,
            end_date: row.end_date,
            max_occurrences: row
                .max_occurrences
                .map(|value| unsigned(value, "max_occurrences"))
                .transpose()?,
            is_active: row.is_active,
        })
        .map_err(|err| RowMappingError::new(TEMPLATES, id, err))
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = recurring_appointment_templates)]
pub(crate) struct TemplateRecord<'a> {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub client_id: Uuid,
    pub staff_id: Uuid,
    pub appointment_type: &'static str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub location: Option<&'a str>,
    pub start_time: NaiveTime,
    pub duration_minutes: i32,
    pub pattern: &'static str,
    pub weekdays: Vec<i16>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub max_occurrences: Option<i32>,
    pub is_active: bool,
}

impl<'a> TryFrom<&'a RecurringAppointmentTemplate> for TemplateRecord<'a> {
    type Error = RowMappingError;

    fn try_from(template: &'a RecurringAppointmentTemplate) -> Result<Self, Self::Error> {
        let id = *template.id().as_uuid();
        let signed = |value: u32, column: &str| {
            i32::try_from(value)
                .map_err(|_| RowMappingError::new(TEMPLATES, id, format!("{column} too large")))
        };
        Ok(Self {
            id,
            organization_id: *template.organization_id().as_uuid(),
            client_id: *template.client_id().as_uuid(),
            staff_id: *template.staff_id().as_uuid(),
            appointment_type: template.appointment_type().as_str(),
            title: template.title(),
            description: template.description(),
            location: template.location(),
            start_time: template.start_time(),
            duration_minutes: signed(template.duration_minutes(), "duration_minutes")?,
            pattern: template.pattern().as_str(),
            weekdays: template
                .weekdays()
                .iter()
                .copied()
                .map(iso_weekday_number)
                .collect(),
            start_date: template.start_date(),
            end_date: template.end_date(),
            max_occurrences: template
                .max_occurrences()
                .map(|value| signed(value, "max_occurrences"))
                .transpose()?,
            is_active: template.is_active(),
        })
    }
}

/// Generated appointments are written once and never read back here.
#[derive(Debug, Insertable)]
#[diesel(table_name = appointments)]
pub(crate) struct AppointmentRecord<'a> {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub template_id: Option<Uuid>,
    pub client_id: Uuid,
    pub staff_id: Uuid,
    pub appointment_type: &'static str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub location: Option<&'a str>,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
    pub status: &'static str,
    pub notes: Option<&'a str>,
}

impl<'a> From<&'a Appointment> for AppointmentRecord<'a> {
    fn from(appointment: &'a Appointment) -> Self {
        Self {
            id: *appointment.id().as_uuid(),
            organization_id: *appointment.organization_id().as_uuid(),
            template_id: appointment.template_id().map(|id| *id.as_uuid()),
            client_id: *appointment.client_id().as_uuid(),
            staff_id: *appointment.staff_id().as_uuid(),
            appointment_type: appointment.appointment_type().as_str(),
            title: appointment.title(),
            description: appointment.description(),
            location: appointment.location(),
            start_at: appointment.start(),
            end_at: appointment.end(),
            status: appointment.status().as_str(),
            notes: appointment.notes(),
        }
    }
}
