//! Driving port for overtime summaries.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{Actor, Error, OvertimeHours, OvertimeRecord, StaffId};

/// Request for a staff member's buckets over a date range.
#[derive(Debug, Clone, Copy)]
pub struct OvertimeSummaryRequest {
    pub actor: Actor,
    pub staff_id: StaffId,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Weekly buckets and their sum.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OvertimeSummary {
    pub weeks: Vec<OvertimeRecord>,
    pub totals: OvertimeHours,
}

/// Overtime reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OvertimeQuery: Send + Sync {
    async fn get_overtime_summary(
        &self,
        request: OvertimeSummaryRequest,
    ) -> Result<OvertimeSummary, Error>;
}
