//! PostgreSQL-backed `SwapRepository`.
//!
//! `shift_swap_locks` holds one row per shift referenced by a non-terminal
//! swap, keyed by shift id. Taking both locks in the insert transaction makes
//! a second open swap on either shift fail with a unique violation. Status
//! changes are compare-and-set updates on the stored status.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{SwapRepository, SwapRepositoryError};
use crate::domain::{OrganizationId, ShiftSwap, ShiftWrite, SwapExchange, SwapId, SwapStatus};

use super::diesel_basic_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, map_basic_row_error, unique_violation,
};
use super::diesel_schedule_repository::{stale_shift_message, store_guarded_shift};
use super::models::{SwapRecord, SwapRow};
use super::pool::{DbPool, PoolError};
use super::schema::{shift_swap_locks, shift_swaps};

const LOCK_CONSTRAINT_PREFIX: &str = "shift_swap_locks";

/// Diesel-backed store for swap requests and their shift locks.
#[derive(Clone)]
pub struct DieselSwapRepository {
    pool: DbPool,
}

impl DieselSwapRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Failure inside a swap transaction.
enum SwapTxError {
    Diesel(diesel::result::Error),
    Stale(String),
}

impl From<diesel::result::Error> for SwapTxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

fn map_pool_error(error: PoolError) -> SwapRepositoryError {
    map_basic_pool_error(error, SwapRepositoryError::connection)
}

fn map_diesel_error(
    operation: &'static str,
) -> impl FnOnce(diesel::result::Error) -> SwapRepositoryError {
    move |error| {
        if let Some(constraint) = unique_violation(&error)
            && constraint.starts_with(LOCK_CONSTRAINT_PREFIX)
        {
            debug!(%constraint, operation, "swap lock already held");
            return SwapRepositoryError::shift_locked(constraint);
        }
        map_basic_diesel_error(
            error,
            operation,
            SwapRepositoryError::query,
            SwapRepositoryError::connection,
        )
    }
}

fn map_tx_error(operation: &'static str) -> impl FnOnce(SwapTxError) -> SwapRepositoryError {
    move |error| match error {
        SwapTxError::Diesel(error) => map_diesel_error(operation)(error),
        SwapTxError::Stale(message) => SwapRepositoryError::stale(message),
    }
}

/// Store `swap` only while its stored status is still `expected`.
async fn store_if_status(
    conn: &mut AsyncPgConnection,
    swap: &ShiftSwap,
    expected: SwapStatus,
) -> Result<(), SwapTxError> {
    let target = shift_swaps::table
        .filter(shift_swaps::id.eq(*swap.id().as_uuid()))
        .filter(shift_swaps::status.eq(expected.as_str()));
    let affected = diesel::update(target)
        .set(&SwapRecord::from(swap))
        .execute(conn)
        .await?;
    if affected == 0 {
        return Err(SwapTxError::Stale(format!(
            "swap {} is no longer {expected}",
            swap.id()
        )));
    }
    Ok(())
}

/// Hand a shift to its new owner while the previous owner still holds it in
/// the same status.
async fn reassign_if_owned(
    conn: &mut AsyncPgConnection,
    write: &ShiftWrite,
) -> Result<(), SwapTxError> {
    if !store_guarded_shift(conn, write).await? {
        return Err(SwapTxError::Stale(stale_shift_message(write)));
    }
    Ok(())
}

async fn release_locks(conn: &mut AsyncPgConnection, swap_id: SwapId) -> Result<(), SwapTxError> {
    diesel::delete(shift_swap_locks::table.filter(shift_swap_locks::swap_id.eq(swap_id.as_uuid())))
        .execute(conn)
        .await?;
    Ok(())
}

#[async_trait]
impl SwapRepository for DieselSwapRepository {
    async fn insert(&self, swap: &ShiftSwap) -> Result<(), SwapRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let record = SwapRecord::from(swap);
        let swap_id = *swap.id().as_uuid();
        let locks: Vec<(Uuid, Uuid)> = swap
            .shift_ids()
            .iter()
            .map(|shift_id| (*shift_id.as_uuid(), swap_id))
            .collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                diesel::insert_into(shift_swaps::table)
                    .values(&record)
                    .execute(conn)
                    .await?;
                let lock_rows: Vec<_> = locks
                    .iter()
                    .map(|(shift_id, swap_id)| {
                        (
                            shift_swap_locks::shift_id.eq(*shift_id),
                            shift_swap_locks::swap_id.eq(*swap_id),
                        )
                    })
                    .collect();
                diesel::insert_into(shift_swap_locks::table)
                    .values(&lock_rows)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error("insert swap"))
    }

    async fn find(
        &self,
        organization_id: OrganizationId,
        swap_id: SwapId,
    ) -> Result<Option<ShiftSwap>, SwapRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = shift_swaps::table
            .filter(shift_swaps::id.eq(swap_id.as_uuid()))
            .filter(shift_swaps::organization_id.eq(organization_id.as_uuid()))
            .select(SwapRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error("find swap"))?;
        row.map(ShiftSwap::try_from)
            .transpose()
            .map_err(|err| map_basic_row_error(err, SwapRepositoryError::query))
    }

    async fn transition(
        &self,
        swap: &ShiftSwap,
        expected: SwapStatus,
    ) -> Result<(), SwapRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                store_if_status(conn, swap, expected).await?;
                if swap.status().is_terminal() {
                    release_locks(conn, swap.id()).await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error("transition swap"))
    }

    async fn commit_exchange(&self, exchange: &SwapExchange) -> Result<(), SwapRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let swap = &exchange.swap;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                store_if_status(conn, swap, exchange.expected_status).await?;
                reassign_if_owned(conn, &exchange.requester_shift).await?;
                reassign_if_owned(conn, &exchange.target_shift).await?;
                release_locks(conn, swap.id()).await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error("commit swap exchange"))
    }
}
