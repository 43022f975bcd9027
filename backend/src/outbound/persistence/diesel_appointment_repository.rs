//! PostgreSQL-backed `AppointmentRepository`.
//!
//! The unique index on `appointments (client_id, staff_id, start_at)` makes
//! generation idempotent: a repeated insert is skipped and reported as such.
//! Each run holds `FOR UPDATE` on its template row, so concurrent runs count
//! and insert one after another.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{AppointmentRepository, AppointmentRepositoryError};
use crate::domain::{Appointment, OrganizationId, RecurringAppointmentTemplate, TemplateId};

use super::diesel_basic_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, map_basic_row_error,
};
use super::models::{AppointmentRecord, RowMappingError, TemplateRecord, TemplateRow};
use super::pool::{DbPool, PoolError};
use super::schema::{appointments, recurring_appointment_templates};

/// Diesel-backed store for templates and generated appointments.
#[derive(Clone)]
pub struct DieselAppointmentRepository {
    pool: DbPool,
}

impl DieselAppointmentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> AppointmentRepositoryError {
    map_basic_pool_error(error, AppointmentRepositoryError::connection)
}

fn map_diesel_error(
    operation: &'static str,
) -> impl FnOnce(diesel::result::Error) -> AppointmentRepositoryError {
    move |error| {
        map_basic_diesel_error(
            error,
            operation,
            AppointmentRepositoryError::query,
            AppointmentRepositoryError::connection,
        )
    }
}

fn map_row_error(error: RowMappingError) -> AppointmentRepositoryError {
    map_basic_row_error(error, AppointmentRepositoryError::query)
}

#[async_trait]
impl AppointmentRepository for DieselAppointmentRepository {
    async fn insert_template(
        &self,
        template: &RecurringAppointmentTemplate,
    ) -> Result<(), AppointmentRepositoryError> {
        let record = TemplateRecord::try_from(template).map_err(map_row_error)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(recurring_appointment_templates::table)
            .values(&record)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error("insert template"))?;
        Ok(())
    }

    async fn find_template(
        &self,
        organization_id: OrganizationId,
        template_id: TemplateId,
    ) -> Result<Option<RecurringAppointmentTemplate>, AppointmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = recurring_appointment_templates::table
            .filter(recurring_appointment_templates::id.eq(template_id.as_uuid()))
            .filter(
                recurring_appointment_templates::organization_id.eq(organization_id.as_uuid()),
            )
            .select(TemplateRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error("find template"))?;
        row.map(RecurringAppointmentTemplate::try_from)
            .transpose()
            .map_err(map_row_error)
    }

    async fn insert_generated(
        &self,
        template: &RecurringAppointmentTemplate,
        candidates: &[Appointment],
        safety_cap: u32,
    ) -> Result<Vec<Appointment>, AppointmentRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let template_id = *template.id().as_uuid();
        let organization_id = *template.organization_id().as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                recurring_appointment_templates::table
                    .filter(recurring_appointment_templates::id.eq(template_id))
                    .select(recurring_appointment_templates::id)
                    .for_update()
                    .first::<Uuid>(conn)
                    .await?;
                let existing: i64 = appointments::table
                    .filter(appointments::organization_id.eq(organization_id))
                    .filter(appointments::template_id.eq(template_id))
                    .count()
                    .get_result(conn)
                    .await?;
                let mut remaining = template
                    .remaining_allowance(u64::try_from(existing).unwrap_or_default(), safety_cap);

                let mut created = Vec::new();
                for candidate in candidates {
                    if remaining == 0 {
                        debug!(
                            template_id = %template.id(),
                            existing,
                            "occurrence allowance reached"
                        );
                        break;
                    }
                    if insert_if_absent(conn, candidate).await? {
                        remaining -= 1;
                        created.push(candidate.clone());
                    }
                }
                Ok(created)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error("generate appointments"))
    }
}

/// Insert unless the (client, staff, start) slot is taken.
async fn insert_if_absent(
    conn: &mut AsyncPgConnection,
    appointment: &Appointment,
) -> QueryResult<bool> {
    let inserted = diesel::insert_into(appointments::table)
        .values(&AppointmentRecord::from(appointment))
        .on_conflict((
            appointments::client_id,
            appointments::staff_id,
            appointments::start_at,
        ))
        .do_nothing()
        .execute(conn)
        .await?;
    Ok(inserted > 0)
}
