//! PostgreSQL-backed `ConflictRepository`.
//!
//! The partial unique index `schedule_conflicts_open_pair` holds at most one
//! unresolved row per `(shift_id, conflict_type)`; inserts that would break it
//! are dropped by `ON CONFLICT DO NOTHING`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ConflictFilter, ConflictRepository, ConflictRepositoryError};
use crate::domain::{ConflictId, OrganizationId, ScheduleConflict};

use super::diesel_basic_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, map_basic_row_error,
};
use super::models::{ConflictResolution, ConflictRow, NewConflictRow, RowMappingError};
use super::pool::{DbPool, PoolError};
use super::schema::{schedule_conflicts, shifts};

/// Diesel-backed store for detected conflicts.
#[derive(Clone)]
pub struct DieselConflictRepository {
    pool: DbPool,
}

impl DieselConflictRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ConflictRepositoryError {
    map_basic_pool_error(error, ConflictRepositoryError::connection)
}

fn map_diesel_error(
    operation: &'static str,
) -> impl FnOnce(diesel::result::Error) -> ConflictRepositoryError {
    move |error| {
        map_basic_diesel_error(
            error,
            operation,
            ConflictRepositoryError::query,
            ConflictRepositoryError::connection,
        )
    }
}

fn map_row_error(error: RowMappingError) -> ConflictRepositoryError {
    map_basic_row_error(error, ConflictRepositoryError::query)
}

#[async_trait]
impl ConflictRepository for DieselConflictRepository {
    async fn insert_if_absent(
        &self,
        conflict: &ScheduleConflict,
    ) -> Result<bool, ConflictRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let inserted = diesel::insert_into(schedule_conflicts::table)
            .values(&NewConflictRow::from(conflict))
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error("insert conflict"))?;
        Ok(inserted > 0)
    }

    async fn list(
        &self,
        organization_id: OrganizationId,
        filter: ConflictFilter,
    ) -> Result<Vec<ScheduleConflict>, ConflictRepositoryError> {
        let mut query = schedule_conflicts::table
            .filter(schedule_conflicts::organization_id.eq(*organization_id.as_uuid()))
            .into_boxed();
        if filter.unresolved_only {
            query = query.filter(schedule_conflicts::resolved.eq(false));
        }
        if let Some(shift_id) = filter.shift_id {
            query = query.filter(schedule_conflicts::shift_id.eq(*shift_id.as_uuid()));
        }
        if let Some((from, to)) = filter.dates {
            let shifts_in_range = shifts::table
                .filter(shifts::organization_id.eq(*organization_id.as_uuid()))
                .filter(shifts::shift_date.between(from, to))
                .select(shifts::id);
            query = query.filter(schedule_conflicts::shift_id.eq_any(shifts_in_range));
        }

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = query
            .order(schedule_conflicts::detected_at.asc())
            .select(ConflictRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error("list conflicts"))?;
        rows.into_iter()
            .map(ScheduleConflict::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_row_error)
    }

    async fn find(
        &self,
        organization_id: OrganizationId,
        conflict_id: ConflictId,
    ) -> Result<Option<ScheduleConflict>, ConflictRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = schedule_conflicts::table
            .filter(schedule_conflicts::id.eq(conflict_id.as_uuid()))
            .filter(schedule_conflicts::organization_id.eq(organization_id.as_uuid()))
            .select(ConflictRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error("find conflict"))?;
        row.map(ScheduleConflict::try_from)
            .transpose()
            .map_err(map_row_error)
    }

    async fn mark_resolved(
        &self,
        conflict: &ScheduleConflict,
    ) -> Result<bool, ConflictRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let target = schedule_conflicts::table
            .filter(schedule_conflicts::id.eq(*conflict.id().as_uuid()))
            .filter(schedule_conflicts::resolved.eq(false));
        let affected = diesel::update(target)
            .set(&ConflictResolution::from(conflict))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error("resolve conflict"))?;
        Ok(affected > 0)
    }
}
