//! PostgreSQL-backed `OvertimeRepository`.
//!
//! `accumulate` creates the week's bucket if needed, then locks it with
//! `SELECT ... FOR UPDATE` so concurrent clock-outs add up instead of
//! overwriting each other.

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{OvertimeRepository, OvertimeRepositoryError};
use crate::domain::{
    OrganizationId, OvertimePolicy, OvertimeRecord, OvertimeRecordId, StaffId, WorkedDuration,
};

use super::diesel_basic_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, map_basic_row_error,
};
use super::models::{OvertimeRecordRow, OvertimeRecordValues, RowMappingError};
use super::pool::{DbPool, PoolError};
use super::schema::overtime_records;

/// Diesel-backed store for weekly hour buckets.
#[derive(Clone)]
pub struct DieselOvertimeRepository {
    pool: DbPool,
}

impl DieselOvertimeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

enum BucketTxError {
    Diesel(diesel::result::Error),
    Row(RowMappingError),
}

impl From<diesel::result::Error> for BucketTxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

fn map_pool_error(error: PoolError) -> OvertimeRepositoryError {
    map_basic_pool_error(error, OvertimeRepositoryError::connection)
}

fn map_diesel_error(
    operation: &'static str,
) -> impl FnOnce(diesel::result::Error) -> OvertimeRepositoryError {
    move |error| {
        map_basic_diesel_error(
            error,
            operation,
            OvertimeRepositoryError::query,
            OvertimeRepositoryError::connection,
        )
    }
}

fn map_row_error(error: RowMappingError) -> OvertimeRepositoryError {
    map_basic_row_error(error, OvertimeRepositoryError::query)
}

#[async_trait]
impl OvertimeRepository for DieselOvertimeRepository {
    async fn accumulate(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
        week_start: NaiveDate,
        session: WorkedDuration,
        policy: &OvertimePolicy,
    ) -> Result<OvertimeRecord, OvertimeRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let empty = OvertimeRecordValues::from(&OvertimeRecord::empty(
            OvertimeRecordId::random(),
            organization_id,
            staff_id,
            week_start,
        ));
        let organization = *organization_id.as_uuid();
        let staff = *staff_id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                diesel::insert_into(overtime_records::table)
                    .values(&empty)
                    .on_conflict((
                        overtime_records::organization_id,
                        overtime_records::staff_id,
                        overtime_records::week_start,
                    ))
                    .do_nothing()
                    .execute(conn)
                    .await?;

                let row = overtime_records::table
                    .filter(overtime_records::organization_id.eq(organization))
                    .filter(overtime_records::staff_id.eq(staff))
                    .filter(overtime_records::week_start.eq(week_start))
                    .select(OvertimeRecordRow::as_select())
                    .for_update()
                    .first(conn)
                    .await?;
                let updated = OvertimeRecord::try_from(row)
                    .map_err(BucketTxError::Row)?
                    .accumulate(session, policy);

                diesel::update(overtime_records::table.find(*updated.id().as_uuid()))
                    .set(&OvertimeRecordValues::from(&updated))
                    .execute(conn)
                    .await?;
                Ok(updated)
            }
            .scope_boxed()
        })
        .await
        .map_err(|error| match error {
            BucketTxError::Diesel(error) => map_diesel_error("accumulate overtime")(error),
            BucketTxError::Row(error) => map_row_error(error),
        })
    }

    async fn list_for_staff(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<OvertimeRecord>, OvertimeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = overtime_records::table
            .filter(overtime_records::organization_id.eq(organization_id.as_uuid()))
            .filter(overtime_records::staff_id.eq(staff_id.as_uuid()))
            .filter(overtime_records::week_start.between(from, to))
            .order(overtime_records::week_start.asc())
            .select(OvertimeRecordRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error("list overtime"))?;
        rows.into_iter()
            .map(OvertimeRecord::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_row_error)
    }
}
