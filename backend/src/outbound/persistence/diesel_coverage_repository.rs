//! PostgreSQL-backed `CoverageRepository`.
//!
//! The partial unique index `coverage_requests_pending_shift` keeps one
//! pending request per shift, so a racing second insert fails with a unique
//! violation. Status changes are compare-and-set updates on the stored
//! status.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{CoverageFilter, CoverageRepository, CoverageRepositoryError};
use crate::domain::{CoverageRequest, CoverageRequestId, CoverageStatus, OrganizationId};

use super::diesel_basic_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, map_basic_row_error, unique_violation,
};
use super::models::{CoverageRecord, CoverageRow};
use super::pool::{DbPool, PoolError};
use super::schema::coverage_requests;

const PENDING_CONSTRAINT: &str = "coverage_requests_pending_shift";

/// Diesel-backed store for coverage requests.
#[derive(Clone)]
pub struct DieselCoverageRepository {
    pool: DbPool,
}

impl DieselCoverageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CoverageRepositoryError {
    map_basic_pool_error(error, CoverageRepositoryError::connection)
}

fn map_diesel_error(
    operation: &'static str,
) -> impl FnOnce(diesel::result::Error) -> CoverageRepositoryError {
    move |error| {
        if let Some(constraint) = unique_violation(&error)
            && constraint.contains(PENDING_CONSTRAINT)
        {
            debug!(%constraint, operation, "pending coverage request already exists");
            return CoverageRepositoryError::already_pending(constraint);
        }
        map_basic_diesel_error(
            error,
            operation,
            CoverageRepositoryError::query,
            CoverageRepositoryError::connection,
        )
    }
}

fn requests_from_rows(
    rows: Vec<CoverageRow>,
) -> Result<Vec<CoverageRequest>, CoverageRepositoryError> {
    rows.into_iter()
        .map(CoverageRequest::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| map_basic_row_error(err, CoverageRepositoryError::query))
}

#[async_trait]
impl CoverageRepository for DieselCoverageRepository {
    async fn insert(&self, request: &CoverageRequest) -> Result<(), CoverageRepositoryError> {
        let record = CoverageRecord::from(request);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(coverage_requests::table)
            .values(&record)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error("insert coverage request"))?;
        Ok(())
    }

    async fn find(
        &self,
        organization_id: OrganizationId,
        request_id: CoverageRequestId,
    ) -> Result<Option<CoverageRequest>, CoverageRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = coverage_requests::table
            .filter(coverage_requests::id.eq(request_id.as_uuid()))
            .filter(coverage_requests::organization_id.eq(organization_id.as_uuid()))
            .select(CoverageRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error("find coverage request"))?;
        row.map(CoverageRequest::try_from)
            .transpose()
            .map_err(|err| map_basic_row_error(err, CoverageRepositoryError::query))
    }

    async fn transition(
        &self,
        request: &CoverageRequest,
        expected: CoverageStatus,
    ) -> Result<(), CoverageRepositoryError> {
        let record = CoverageRecord::from(request);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let target = coverage_requests::table
            .filter(coverage_requests::id.eq(*request.id().as_uuid()))
            .filter(coverage_requests::status.eq(expected.as_str()));
        let affected = diesel::update(target)
            .set(&record)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error("transition coverage request"))?;
        if affected == 0 {
            return Err(CoverageRepositoryError::stale(format!(
                "coverage request {} is no longer {expected}",
                request.id()
            )));
        }
        Ok(())
    }

    async fn list(
        &self,
        organization_id: OrganizationId,
        filter: CoverageFilter,
    ) -> Result<Vec<CoverageRequest>, CoverageRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = coverage_requests::table
            .filter(coverage_requests::organization_id.eq(*organization_id.as_uuid()))
            .select(CoverageRow::as_select())
            .into_boxed();
        if let Some(status) = filter.status {
            query = query.filter(coverage_requests::status.eq(status.as_str()));
        }
        if let Some(request_type) = filter.request_type {
            query = query.filter(coverage_requests::request_type.eq(request_type.as_str()));
        }
        if let Some(staff_id) = filter.staff_id {
            query = query.filter(coverage_requests::requesting_staff_id.eq(*staff_id.as_uuid()));
        }
        let rows = query
            .order(coverage_requests::requested_at.desc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error("list coverage requests"))?;
        requests_from_rows(rows)
    }
}
