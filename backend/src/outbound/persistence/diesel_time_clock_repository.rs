//! PostgreSQL-backed `TimeClockRepository`.
//!
//! `time_clock_entries` is insert-only. Open intervals live in
//! `open_clock_intervals`, whose primary key `(staff_id, interval_kind)` turns
//! a second concurrent clock-in into a unique violation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{TimeClockRepository, TimeClockRepositoryError};
use crate::domain::{
    ClockIntervalKind, OrganizationId, ShiftWrite, StaffId, TimeClockEntry, TimeEntryId,
};

use super::diesel_basic_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, map_basic_row_error, unique_violation,
};
use super::diesel_schedule_repository::{stale_shift_message, store_guarded_shift};
use super::models::{OpenIntervalRecord, RowMappingError, TimeEntryRecord, TimeEntryRow};
use super::pool::{DbPool, PoolError};
use super::schema::{open_clock_intervals, time_clock_entries};

/// Diesel-backed time clock ledger.
#[derive(Clone)]
pub struct DieselTimeClockRepository {
    pool: DbPool,
}

impl DieselTimeClockRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

enum LedgerTxError {
    Diesel(diesel::result::Error),
    AlreadyOpen(String),
    NotOpen(String),
    ShiftChanged(String),
}

impl From<diesel::result::Error> for LedgerTxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

fn map_pool_error(error: PoolError) -> TimeClockRepositoryError {
    map_basic_pool_error(error, TimeClockRepositoryError::connection)
}

fn map_diesel_error(
    operation: &'static str,
) -> impl FnOnce(diesel::result::Error) -> TimeClockRepositoryError {
    move |error| {
        map_basic_diesel_error(
            error,
            operation,
            TimeClockRepositoryError::query,
            TimeClockRepositoryError::connection,
        )
    }
}

fn map_tx_error(operation: &'static str) -> impl FnOnce(LedgerTxError) -> TimeClockRepositoryError {
    move |error| match error {
        LedgerTxError::Diesel(error) => map_diesel_error(operation)(error),
        LedgerTxError::AlreadyOpen(message) => TimeClockRepositoryError::already_open(message),
        LedgerTxError::NotOpen(message) => TimeClockRepositoryError::not_open(message),
        LedgerTxError::ShiftChanged(message) => TimeClockRepositoryError::shift_changed(message),
    }
}

fn map_row_error(error: RowMappingError) -> TimeClockRepositoryError {
    map_basic_row_error(error, TimeClockRepositoryError::query)
}

fn interval_label(entry: &TimeClockEntry, kind: ClockIntervalKind) -> String {
    format!("{kind} for staff {}", entry.staff_id())
}

/// Append `entry` and store the guarded shift write when one rides along.
async fn append_with_shift(
    conn: &mut AsyncPgConnection,
    entry: &TimeClockEntry,
    shift: Option<&ShiftWrite>,
) -> Result<(), LedgerTxError> {
    diesel::insert_into(time_clock_entries::table)
        .values(&TimeEntryRecord::from(entry))
        .execute(conn)
        .await?;
    if let Some(write) = shift
        && !store_guarded_shift(conn, write).await?
    {
        return Err(LedgerTxError::ShiftChanged(stale_shift_message(write)));
    }
    Ok(())
}

#[async_trait]
impl TimeClockRepository for DieselTimeClockRepository {
    async fn latest_event_at(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
    ) -> Result<Option<DateTime<Utc>>, TimeClockRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        time_clock_entries::table
            .filter(time_clock_entries::organization_id.eq(organization_id.as_uuid()))
            .filter(time_clock_entries::staff_id.eq(staff_id.as_uuid()))
            .filter(time_clock_entries::corrects_entry_id.is_null())
            .select(diesel::dsl::max(time_clock_entries::recorded_at))
            .first::<Option<DateTime<Utc>>>(&mut conn)
            .await
            .map_err(map_diesel_error("latest clock event"))
    }

    async fn find_open(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
        kind: ClockIntervalKind,
    ) -> Result<Option<TimeClockEntry>, TimeClockRepositoryError> {
        let open_entry = open_clock_intervals::table
            .filter(open_clock_intervals::staff_id.eq(*staff_id.as_uuid()))
            .filter(open_clock_intervals::interval_kind.eq(kind.as_str()))
            .select(open_clock_intervals::entry_id);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = time_clock_entries::table
            .filter(time_clock_entries::organization_id.eq(organization_id.as_uuid()))
            .filter(time_clock_entries::id.eq_any(open_entry))
            .select(TimeEntryRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error("find open interval"))?;
        row.map(TimeClockEntry::try_from)
            .transpose()
            .map_err(map_row_error)
    }

    async fn open_interval(
        &self,
        entry: &TimeClockEntry,
        kind: ClockIntervalKind,
        shift: Option<ShiftWrite>,
    ) -> Result<(), TimeClockRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let marker = OpenIntervalRecord::new(entry, kind);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let inserted = diesel::insert_into(open_clock_intervals::table)
                    .values(&marker)
                    .execute(conn)
                    .await;
                if let Err(error) = inserted {
                    return Err(match unique_violation(&error) {
                        Some(_) => LedgerTxError::AlreadyOpen(interval_label(entry, kind)),
                        None => LedgerTxError::Diesel(error),
                    });
                }
                append_with_shift(conn, entry, shift.as_ref()).await
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error("open clock interval"))
    }

    async fn close_interval(
        &self,
        entry: &TimeClockEntry,
        kind: ClockIntervalKind,
        shift: Option<ShiftWrite>,
    ) -> Result<(), TimeClockRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let staff_id = *entry.staff_id().as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let released = diesel::delete(
                    open_clock_intervals::table
                        .filter(open_clock_intervals::staff_id.eq(staff_id))
                        .filter(open_clock_intervals::interval_kind.eq(kind.as_str())),
                )
                .execute(conn)
                .await?;
                if released == 0 {
                    return Err(LedgerTxError::NotOpen(interval_label(entry, kind)));
                }
                append_with_shift(conn, entry, shift.as_ref()).await
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error("close clock interval"))
    }

    async fn append_adjustment(
        &self,
        entry: &TimeClockEntry,
    ) -> Result<(), TimeClockRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(time_clock_entries::table)
            .values(&TimeEntryRecord::from(entry))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error("append adjustment"))?;
        Ok(())
    }

    async fn find_entry(
        &self,
        organization_id: OrganizationId,
        entry_id: TimeEntryId,
    ) -> Result<Option<TimeClockEntry>, TimeClockRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = time_clock_entries::table
            .filter(time_clock_entries::id.eq(entry_id.as_uuid()))
            .filter(time_clock_entries::organization_id.eq(organization_id.as_uuid()))
            .select(TimeEntryRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error("find clock entry"))?;
        row.map(TimeClockEntry::try_from)
            .transpose()
            .map_err(map_row_error)
    }

    async fn list_entries(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TimeClockEntry>, TimeClockRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = time_clock_entries::table
            .filter(time_clock_entries::organization_id.eq(organization_id.as_uuid()))
            .filter(time_clock_entries::staff_id.eq(staff_id.as_uuid()))
            .filter(time_clock_entries::recorded_at.between(from, to))
            .order(time_clock_entries::recorded_at.asc())
            .select(TimeEntryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error("list clock entries"))?;
        rows.into_iter()
            .map(TimeClockEntry::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_row_error)
    }
}
