//! PostgreSQL-backed `ScheduleRepository`.

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{ScheduleRepository, ScheduleRepositoryError};
use crate::domain::{
    OrganizationId, Schedule, ScheduleId, Shift, ShiftId, ShiftStatus, ShiftWrite, StaffId,
};

use super::diesel_basic_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, map_basic_row_error,
};
use super::models::{RowMappingError, ScheduleRecord, ScheduleRow, ShiftRecord, ShiftRow};
use super::pool::{DbPool, PoolError};
use super::schema::{schedules, shifts};

/// Diesel-backed store for schedules and shifts.
#[derive(Clone)]
pub struct DieselScheduleRepository {
    pool: DbPool,
}

impl DieselScheduleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ScheduleRepositoryError {
    map_basic_pool_error(error, ScheduleRepositoryError::connection)
}

fn map_diesel_error(
    operation: &'static str,
) -> impl FnOnce(diesel::result::Error) -> ScheduleRepositoryError {
    move |error| {
        map_basic_diesel_error(
            error,
            operation,
            ScheduleRepositoryError::query,
            ScheduleRepositoryError::connection,
        )
    }
}

fn map_row_error(error: RowMappingError) -> ScheduleRepositoryError {
    map_basic_row_error(error, ScheduleRepositoryError::query)
}

fn into_shifts(rows: Vec<ShiftRow>) -> Result<Vec<Shift>, ScheduleRepositoryError> {
    rows.into_iter()
        .map(Shift::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(map_row_error)
}

/// Fail with `Query` when an update matched no row.
fn ensure_updated(
    affected: usize,
    what: &str,
    id: impl std::fmt::Display,
) -> Result<(), ScheduleRepositoryError> {
    if affected == 0 {
        return Err(ScheduleRepositoryError::query(format!("{what} {id} not found")));
    }
    Ok(())
}

/// Store `write` while the row still has the expected owner and status.
///
/// Returns `false` when the guard matched no row.
pub(super) async fn store_guarded_shift(
    conn: &mut AsyncPgConnection,
    write: &ShiftWrite,
) -> QueryResult<bool> {
    let shift = write.shift();
    let target = shifts::table
        .filter(shifts::id.eq(*shift.id().as_uuid()))
        .filter(shifts::staff_id.eq(*write.expected_staff().as_uuid()))
        .filter(shifts::status.eq(write.expected_status().as_str()));
    let affected = diesel::update(target)
        .set(&ShiftRecord::from(shift))
        .execute(conn)
        .await?;
    Ok(affected > 0)
}

pub(super) fn stale_shift_message(write: &ShiftWrite) -> String {
    format!(
        "shift {} is no longer {} for staff member {}",
        write.shift().id(),
        write.expected_status(),
        write.expected_staff()
    )
}

#[async_trait]
impl ScheduleRepository for DieselScheduleRepository {
    async fn find_schedule(
        &self,
        organization_id: OrganizationId,
        schedule_id: ScheduleId,
    ) -> Result<Option<Schedule>, ScheduleRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = schedules::table
            .filter(schedules::id.eq(schedule_id.as_uuid()))
            .filter(schedules::organization_id.eq(organization_id.as_uuid()))
            .select(ScheduleRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error("find schedule"))?;
        row.map(Schedule::try_from)
            .transpose()
            .map_err(map_row_error)
    }

    async fn insert_schedule(
        &self,
        schedule: &Schedule,
        shifts: &[Shift],
    ) -> Result<(), ScheduleRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let schedule_row = ScheduleRecord::from(schedule);
        let shift_rows: Vec<ShiftRecord<'_>> = shifts.iter().map(ShiftRecord::from).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                diesel::insert_into(schedules::table)
                    .values(&schedule_row)
                    .execute(conn)
                    .await?;
                if !shift_rows.is_empty() {
                    diesel::insert_into(shifts::table)
                        .values(&shift_rows)
                        .execute(conn)
                        .await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error("insert schedule"))
    }

    async fn update_schedule(&self, schedule: &Schedule) -> Result<(), ScheduleRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let affected = diesel::update(schedules::table.find(*schedule.id().as_uuid()))
            .set(&ScheduleRecord::from(schedule))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error("update schedule"))?;
        ensure_updated(affected, "schedule", schedule.id())
    }

    async fn find_shift(
        &self,
        organization_id: OrganizationId,
        shift_id: ShiftId,
    ) -> Result<Option<Shift>, ScheduleRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = shifts::table
            .filter(shifts::id.eq(shift_id.as_uuid()))
            .filter(shifts::organization_id.eq(organization_id.as_uuid()))
            .select(ShiftRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error("find shift"))?;
        row.map(Shift::try_from).transpose().map_err(map_row_error)
    }

    async fn insert_shift(&self, shift: &Shift) -> Result<(), ScheduleRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(shifts::table)
            .values(&ShiftRecord::from(shift))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error("insert shift"))?;
        Ok(())
    }

    async fn insert_shifts(&self, shifts: &[Shift]) -> Result<(), ScheduleRepositoryError> {
        if shifts.is_empty() {
            return Ok(());
        }
        let rows: Vec<ShiftRecord<'_>> = shifts.iter().map(ShiftRecord::from).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(shifts::table)
            .values(&rows)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error("insert shifts"))?;
        Ok(())
    }

    async fn update_shift(&self, write: &ShiftWrite) -> Result<(), ScheduleRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let stored = store_guarded_shift(&mut conn, write)
            .await
            .map_err(map_diesel_error("update shift"))?;
        if !stored {
            return Err(ScheduleRepositoryError::stale(stale_shift_message(write)));
        }
        Ok(())
    }

    async fn list_active_shifts_for_staff(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
        date: NaiveDate,
    ) -> Result<Vec<Shift>, ScheduleRepositoryError> {
        let inactive: Vec<&str> = ShiftStatus::ALL
            .iter()
            .filter(|status| !status.is_active())
            .map(ShiftStatus::as_str)
            .collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = shifts::table
            .filter(shifts::organization_id.eq(organization_id.as_uuid()))
            .filter(shifts::staff_id.eq(staff_id.as_uuid()))
            .filter(shifts::shift_date.eq(date))
            .filter(shifts::status.ne_all(inactive))
            .order(shifts::start_time.asc())
            .select(ShiftRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error("list staff shifts"))?;
        into_shifts(rows)
    }

    async fn list_schedule_shifts(
        &self,
        organization_id: OrganizationId,
        schedule_id: ScheduleId,
    ) -> Result<Vec<Shift>, ScheduleRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = shifts::table
            .filter(shifts::organization_id.eq(organization_id.as_uuid()))
            .filter(shifts::schedule_id.eq(schedule_id.as_uuid()))
            .order((shifts::shift_date.asc(), shifts::start_time.asc()))
            .select(ShiftRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error("list schedule shifts"))?;
        into_shifts(rows)
    }
}
