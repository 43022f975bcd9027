//! Overtime accumulation and summaries.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::domain::calendar::week_start;
use crate::domain::ports::{
    CapabilityCheck, OvertimeQuery, OvertimeRepository, OvertimeRepositoryError, OvertimeSummary,
    OvertimeSummaryRequest,
};
use crate::domain::service_support::authorize;
use crate::domain::{
    Capability, Error, OrganizationId, OvertimeHours, OvertimePolicy, OvertimeRecord, StaffId,
    WorkedDuration,
};

fn map_repository_error(error: OvertimeRepositoryError) -> Error {
    match error {
        OvertimeRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("overtime repository unavailable: {message}"))
        }
        OvertimeRepositoryError::Query { message } => {
            Error::internal(format!("overtime repository error: {message}"))
        }
    }
}

/// Rolls completed sessions into weekly buckets.
pub struct OvertimeAccumulator<O> {
    repo: Arc<O>,
    policy: OvertimePolicy,
}

impl<O> Clone for OvertimeAccumulator<O> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            policy: self.policy,
        }
    }
}

impl<O: OvertimeRepository> OvertimeAccumulator<O> {
    pub fn new(repo: Arc<O>, policy: OvertimePolicy) -> Self {
        Self { repo, policy }
    }

    /// Add the session `[clock_in, clock_out]` to the week containing
    /// `clock_in` in the agency timezone.
    pub async fn record_session(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
        clock_in: DateTime<Utc>,
        clock_out: DateTime<Utc>,
    ) -> Result<OvertimeRecord, Error> {
        let worked = WorkedDuration::between(clock_in, clock_out).ok_or_else(|| {
            Error::validation(format!(
                "session clock-out {clock_out} precedes clock-in {clock_in}"
            ))
        })?;
        let week = self.policy.week_of(clock_in);

        let record = self
            .repo
            .accumulate(organization_id, staff_id, week, worked, &self.policy)
            .await
            .map_err(map_repository_error)?;
        info!(
            staff_id = %staff_id,
            week_start = %week,
            worked_hours = %worked,
            regular_hours = %record.regular(),
            overtime_hours = %record.overtime(),
            "session added to overtime bucket"
        );
        Ok(record)
    }
}

/// Domain service implementing [`OvertimeQuery`].
pub struct OvertimeService<O, K> {
    repo: Arc<O>,
    access: Arc<K>,
}

impl<O, K> OvertimeService<O, K> {
    pub fn new(repo: Arc<O>, access: Arc<K>) -> Self {
        Self { repo, access }
    }
}

#[async_trait]
impl<O, K> OvertimeQuery for OvertimeService<O, K>
where
    O: OvertimeRepository,
    K: CapabilityCheck,
{
    async fn get_overtime_summary(
        &self,
        request: OvertimeSummaryRequest,
    ) -> Result<OvertimeSummary, Error> {
        let actor = request.actor;
        authorize(self.access.as_ref(), &actor, Capability::ViewOvertime).await?;
        if request.to < request.from {
            return Err(Error::validation(format!(
                "summary range end {} precedes start {}",
                request.to, request.from
            )));
        }

        let weeks = self
            .repo
            .list_for_staff(
                actor.organization_id,
                request.staff_id,
                week_start(request.from),
                request.to,
            )
            .await
            .map_err(map_repository_error)?;
        let totals = weeks
            .iter()
            .fold(OvertimeHours::default(), |sum, week| sum + week.hours());

        Ok(OvertimeSummary { weeks, totals })
    }
}

#[cfg(test)]
#[path = "overtime_service_tests.rs"]
mod tests;
