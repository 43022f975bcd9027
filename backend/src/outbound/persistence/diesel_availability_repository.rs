//! PostgreSQL-backed `AvailabilityRepository`.

use async_trait::async_trait;
use chrono::{NaiveDate, Weekday};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{AvailabilityRepository, AvailabilityRepositoryError};
use crate::domain::{
    AvailabilityId, OrganizationId, StaffAvailability, StaffId, iso_weekday_number,
};

use super::diesel_basic_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, map_basic_row_error,
};
use super::models::{AvailabilityRecord, AvailabilityRow};
use super::pool::{DbPool, PoolError};
use super::schema::staff_availability;

/// Diesel-backed store for weekly availability rules.
#[derive(Clone)]
pub struct DieselAvailabilityRepository {
    pool: DbPool,
}

impl DieselAvailabilityRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> AvailabilityRepositoryError {
    map_basic_pool_error(error, AvailabilityRepositoryError::connection)
}

fn map_diesel_error(
    operation: &'static str,
) -> impl FnOnce(diesel::result::Error) -> AvailabilityRepositoryError {
    move |error| {
        map_basic_diesel_error(
            error,
            operation,
            AvailabilityRepositoryError::query,
            AvailabilityRepositoryError::connection,
        )
    }
}

fn rules_from_rows(
    rows: Vec<AvailabilityRow>,
) -> Result<Vec<StaffAvailability>, AvailabilityRepositoryError> {
    rows.into_iter()
        .map(StaffAvailability::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| map_basic_row_error(err, AvailabilityRepositoryError::query))
}

#[async_trait]
impl AvailabilityRepository for DieselAvailabilityRepository {
    async fn list_for_weekday(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
        weekday: Weekday,
    ) -> Result<Vec<StaffAvailability>, AvailabilityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = staff_availability::table
            .filter(staff_availability::organization_id.eq(organization_id.as_uuid()))
            .filter(staff_availability::staff_id.eq(staff_id.as_uuid()))
            .filter(staff_availability::weekday.eq(iso_weekday_number(weekday)))
            .order(staff_availability::effective_date.desc())
            .select(AvailabilityRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error("list availability"))?;
        rules_from_rows(rows)
    }

    async fn list_for_staff(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
        effective_on: Option<NaiveDate>,
    ) -> Result<Vec<StaffAvailability>, AvailabilityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = staff_availability::table
            .filter(staff_availability::organization_id.eq(*organization_id.as_uuid()))
            .filter(staff_availability::staff_id.eq(*staff_id.as_uuid()))
            .select(AvailabilityRow::as_select())
            .into_boxed();
        if let Some(date) = effective_on {
            query = query
                .filter(staff_availability::effective_date.le(date))
                .filter(
                    staff_availability::expiry_date
                        .is_null()
                        .or(staff_availability::expiry_date.ge(date)),
                );
        }
        let rows = query
            .order((
                staff_availability::weekday.asc(),
                staff_availability::start_time.asc(),
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error("list staff availability"))?;
        rules_from_rows(rows)
    }

    async fn find(
        &self,
        organization_id: OrganizationId,
        availability_id: AvailabilityId,
    ) -> Result<Option<StaffAvailability>, AvailabilityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = staff_availability::table
            .filter(staff_availability::organization_id.eq(organization_id.as_uuid()))
            .filter(staff_availability::id.eq(availability_id.as_uuid()))
            .select(AvailabilityRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error("find availability"))?;
        row.map(StaffAvailability::try_from)
            .transpose()
            .map_err(|err| map_basic_row_error(err, AvailabilityRepositoryError::query))
    }

    async fn save(&self, rule: &StaffAvailability) -> Result<(), AvailabilityRepositoryError> {
        let record = AvailabilityRecord::from(rule);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(staff_availability::table)
            .values(&record)
            .on_conflict(staff_availability::id)
            .do_update()
            .set(&record)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error("save availability"))?;
        Ok(())
    }

    async fn delete(
        &self,
        organization_id: OrganizationId,
        availability_id: AvailabilityId,
    ) -> Result<bool, AvailabilityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(
            staff_availability::table
                .filter(staff_availability::organization_id.eq(organization_id.as_uuid()))
                .filter(staff_availability::id.eq(availability_id.as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error("delete availability"))?;
        Ok(removed > 0)
    }

    async fn replace_for_staff(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
        rules: &[StaffAvailability],
    ) -> Result<(), AvailabilityRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let organization_id = *organization_id.as_uuid();
        let staff_id = *staff_id.as_uuid();
        let records: Vec<AvailabilityRecord> = rules.iter().map(AvailabilityRecord::from).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                diesel::delete(
                    staff_availability::table
                        .filter(staff_availability::organization_id.eq(organization_id))
                        .filter(staff_availability::staff_id.eq(staff_id)),
                )
                .execute(conn)
                .await?;
                if !records.is_empty() {
                    diesel::insert_into(staff_availability::table)
                        .values(&records)
                        .execute(conn)
                        .await?;
                }
                Ok::<_, diesel::result::Error>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error("replace availability"))
    }
}
