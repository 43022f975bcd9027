//! Schedule containers and their publish lifecycle.

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::text_enum::define_text_enum;
use crate::domain::transition::InvalidTransition;
use crate::domain::{OrganizationId, ScheduleId, UserId};

use super::SchedulingValidationError;

define_text_enum! {
    /// Publication lifecycle of a schedule.
    pub enum ScheduleStatus parse ParseScheduleStatusError as "schedule status" {
        /// Being assembled; shifts are not yet visible to staff.
        Draft => "draft",
        /// Released to staff.
        Published => "published",
        /// Frozen for payroll.
        Locked => "locked",
        /// Retained for history only.
        Archived => "archived",
    }
}

/// Input payload for [`Schedule::new`].
#[derive(Debug, Clone)]
pub struct ScheduleDraft {
    pub id: ScheduleId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ScheduleStatus,
    pub notes: Option<String>,
    pub created_by: UserId,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
}

/// A named, date-ranged container of shifts.
///
/// ## Invariants
/// - `name` is non-blank.
/// - `start_date <= end_date`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    id: ScheduleId,
    organization_id: OrganizationId,
    name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: ScheduleStatus,
    notes: Option<String>,
    created_by: UserId,
    approved_by: Option<UserId>,
    approved_at: Option<DateTime<Utc>>,
}

impl Schedule {
    /// Creates a validated schedule.
    pub fn new(draft: ScheduleDraft) -> Result<Self, SchedulingValidationError> {
        Self::try_from(draft)
    }

    pub fn id(&self) -> ScheduleId {
        self.id
    }

    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn status(&self) -> ScheduleStatus {
        self.status
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    pub fn approved_by(&self) -> Option<UserId> {
        self.approved_by
    }

    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        self.approved_at
    }

    /// Whether `date` falls inside the schedule's inclusive range.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Reject shift dates outside the schedule range.
    pub fn ensure_contains(&self, date: NaiveDate) -> Result<(), SchedulingValidationError> {
        if self.contains_date(date) {
            return Ok(());
        }
        Err(SchedulingValidationError::ShiftOutsideSchedule {
            date,
            start: self.start_date,
            end: self.end_date,
        })
    }

    /// Release a draft schedule, recording who approved it.
    pub fn publish(&self, approver: UserId, at: DateTime<Utc>) -> Result<Self, InvalidTransition> {
        if self.status != ScheduleStatus::Draft {
            return Err(InvalidTransition::new(
                "schedule",
                "publish",
                self.status.as_str(),
            ));
        }
        Ok(Self {
            status: ScheduleStatus::Published,
            approved_by: Some(approver),
            approved_at: Some(at),
            ..self.clone()
        })
    }

    /// Build a draft copy starting on `start_date`, keeping the same length.
    ///
    /// The returned offset in days is applied to every copied shift date.
    pub fn copy_to(
        &self,
        id: ScheduleId,
        start_date: NaiveDate,
        name: Option<String>,
        created_by: UserId,
    ) -> Result<(Self, chrono::TimeDelta), SchedulingValidationError> {
        let offset = start_date - self.start_date;
        let copy = Self::new(ScheduleDraft {
            id,
            organization_id: self.organization_id,
            name: name.unwrap_or_else(|| format!("{} (Copy)", self.name)),
            start_date,
            end_date: self.end_date + offset,
            status: ScheduleStatus::Draft,
            notes: self.notes.clone(),
            created_by,
            approved_by: None,
            approved_at: None,
        })?;
        Ok((copy, offset))
    }
}

impl TryFrom<ScheduleDraft> for Schedule {
    type Error = SchedulingValidationError;

    fn try_from(draft: ScheduleDraft) -> Result<Self, Self::Error> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(SchedulingValidationError::BlankScheduleName);
        }
        if draft.end_date < draft.start_date {
            return Err(SchedulingValidationError::ScheduleEndsBeforeStart {
                start: draft.start_date,
                end: draft.end_date,
            });
        }

        Ok(Self {
            id: draft.id,
            organization_id: draft.organization_id,
            name: name.to_owned(),
            start_date: draft.start_date,
            end_date: draft.end_date,
            status: draft.status,
            notes: draft.notes,
            created_by: draft.created_by,
            approved_by: draft.approved_by,
            approved_at: draft.approved_at,
        })
    }
}
