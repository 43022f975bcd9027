//! Coverage requests: asking for a shift to be swapped, dropped or picked up.
//!
//! ```text
//! pending ──approve──▶ approved
//!    ├─────deny─────▶ denied
//!    └────cancel────▶ cancelled
//! ```
//!
//! A decision records who answered and when. Ownership of the shift is not
//! changed here; an approved request is acted on through the shift or swap
//! workflows. At most one request per shift may be pending.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::domain::text_enum::define_text_enum;
use crate::domain::transition::InvalidTransition;
use crate::domain::{
    CoverageRequestId, OrganizationId, Shift, ShiftId, ShiftStatus, StaffId, UserId,
};

define_text_enum! {
    /// What the requester wants done with the shift.
    pub enum CoverageRequestType parse ParseCoverageRequestTypeError as "coverage request type" {
        /// Trade the shift with someone.
        Swap => "swap",
        /// Take on a shift owned by someone else.
        Pickup => "pickup",
        /// Give the shift up.
        Drop => "drop",
    }
}

define_text_enum! {
    /// Position of a coverage request in its workflow.
    pub enum CoverageStatus parse ParseCoverageStatusError as "coverage status" {
        /// Waiting for a decision.
        Pending => "pending",
        /// Granted by a manager.
        Approved => "approved",
        /// Refused by a manager.
        Denied => "denied",
        /// Withdrawn by the requester.
        Cancelled => "cancelled",
    }
}

/// Reasons a coverage request is refused before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverageRequestError {
    /// The reason is empty or whitespace.
    BlankReason,
    /// Swap and drop requests must come from the shift owner.
    NotShiftOwner {
        /// Shift named in the request.
        shift_id: ShiftId,
    },
    /// Pickup requests must come from someone other than the owner.
    PickupOfOwnShift {
        /// Shift named in the request.
        shift_id: ShiftId,
    },
    /// The shift has started, finished or been cancelled.
    ShiftNotOpen {
        /// Shift named in the request.
        shift_id: ShiftId,
        /// Its current status.
        status: ShiftStatus,
    },
}

impl fmt::Display for CoverageRequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlankReason => write!(f, "coverage request reason must not be blank"),
            Self::NotShiftOwner { shift_id } => {
                write!(f, "requester does not own shift {shift_id}")
            }
            Self::PickupOfOwnShift { shift_id } => {
                write!(f, "requester already owns shift {shift_id}")
            }
            Self::ShiftNotOpen { shift_id, status } => {
                write!(f, "shift {shift_id} is {status} and cannot be covered")
            }
        }
    }
}

impl std::error::Error for CoverageRequestError {}

/// Input payload for [`CoverageRequest::new`], used when loading stored rows.
#[derive(Debug, Clone)]
pub struct CoverageRequestDraft {
    pub id: CoverageRequestId,
    pub organization_id: OrganizationId,
    pub shift_id: ShiftId,
    pub requesting_staff_id: StaffId,
    pub request_type: CoverageRequestType,
    pub reason: String,
    pub status: CoverageStatus,
    pub requested_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub responded_by: Option<UserId>,
    pub notes: Option<String>,
}

/// A staff member's request for help with one shift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageRequest {
    id: CoverageRequestId,
    organization_id: OrganizationId,
    shift_id: ShiftId,
    requesting_staff_id: StaffId,
    request_type: CoverageRequestType,
    reason: String,
    status: CoverageStatus,
    requested_at: DateTime<Utc>,
    responded_at: Option<DateTime<Utc>>,
    responded_by: Option<UserId>,
    notes: Option<String>,
}

impl CoverageRequest {
    /// Rehydrate a stored request.
    pub fn new(draft: CoverageRequestDraft) -> Self {
        Self {
            id: draft.id,
            organization_id: draft.organization_id,
            shift_id: draft.shift_id,
            requesting_staff_id: draft.requesting_staff_id,
            request_type: draft.request_type,
            reason: draft.reason,
            status: draft.status,
            requested_at: draft.requested_at,
            responded_at: draft.responded_at,
            responded_by: draft.responded_by,
            notes: draft.notes,
        }
    }

    /// Open a pending request against the current version of `shift`.
    pub fn open(
        id: CoverageRequestId,
        requesting_staff_id: StaffId,
        shift: &Shift,
        request_type: CoverageRequestType,
        reason: String,
        notes: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Self, CoverageRequestError> {
        let reason = reason.trim().to_owned();
        if reason.is_empty() {
            return Err(CoverageRequestError::BlankReason);
        }
        let owns_shift = shift.staff_id() == requesting_staff_id;
        match request_type {
            CoverageRequestType::Pickup if owns_shift => {
                return Err(CoverageRequestError::PickupOfOwnShift {
                    shift_id: shift.id(),
                });
            }
            CoverageRequestType::Swap | CoverageRequestType::Drop if !owns_shift => {
                return Err(CoverageRequestError::NotShiftOwner {
                    shift_id: shift.id(),
                });
            }
            _ => {}
        }
        if !shift.status().is_pending() {
            return Err(CoverageRequestError::ShiftNotOpen {
                shift_id: shift.id(),
                status: shift.status(),
            });
        }

        Ok(Self::new(CoverageRequestDraft {
            id,
            organization_id: shift.organization_id(),
            shift_id: shift.id(),
            requesting_staff_id,
            request_type,
            reason,
            status: CoverageStatus::Pending,
            requested_at: at,
            responded_at: None,
            responded_by: None,
            notes,
        }))
    }

    /// Request identifier.
    pub fn id(&self) -> CoverageRequestId {
        self.id
    }

    /// Organization the request belongs to.
    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Shift the request is about.
    pub fn shift_id(&self) -> ShiftId {
        self.shift_id
    }

    /// Staff member who asked for cover.
    pub fn requesting_staff_id(&self) -> StaffId {
        self.requesting_staff_id
    }

    /// Kind of cover asked for.
    pub fn request_type(&self) -> CoverageRequestType {
        self.request_type
    }

    /// Trimmed, non-blank reason.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Current workflow status.
    pub fn status(&self) -> CoverageStatus {
        self.status
    }

    /// When the request was filed.
    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }

    /// When a manager or the requester closed the request.
    pub fn responded_at(&self) -> Option<DateTime<Utc>> {
        self.responded_at
    }

    /// Manager who decided; `None` for pending and cancelled requests.
    pub fn responded_by(&self) -> Option<UserId> {
        self.responded_by
    }

    /// Requester notes followed by any decision notes.
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Manager grants the request. Decision notes are appended to the
    /// requester's notes.
    pub fn approve(
        &self,
        manager: UserId,
        at: DateTime<Utc>,
        decision_notes: Option<&str>,
    ) -> Result<Self, InvalidTransition> {
        self.decide("approve", CoverageStatus::Approved, "Approval", manager, at, decision_notes)
    }

    /// Manager refuses the request.
    pub fn deny(
        &self,
        manager: UserId,
        at: DateTime<Utc>,
        decision_notes: Option<&str>,
    ) -> Result<Self, InvalidTransition> {
        self.decide("deny", CoverageStatus::Denied, "Denial", manager, at, decision_notes)
    }

    /// Requester withdraws a pending request.
    pub fn cancel(&self, at: DateTime<Utc>) -> Result<Self, InvalidTransition> {
        self.guard("cancel")?;
        Ok(Self {
            status: CoverageStatus::Cancelled,
            responded_at: Some(at),
            ..self.clone()
        })
    }

    fn decide(
        &self,
        action: &'static str,
        status: CoverageStatus,
        label: &str,
        manager: UserId,
        at: DateTime<Utc>,
        decision_notes: Option<&str>,
    ) -> Result<Self, InvalidTransition> {
        self.guard(action)?;
        Ok(Self {
            status,
            responded_at: Some(at),
            responded_by: Some(manager),
            notes: append_notes(self.notes.as_deref(), label, decision_notes),
            ..self.clone()
        })
    }

    fn guard(&self, action: &'static str) -> Result<(), InvalidTransition> {
        if self.status == CoverageStatus::Pending {
            Ok(())
        } else {
            Err(InvalidTransition::new(
                "coverage request",
                action,
                self.status.as_str(),
            ))
        }
    }
}

fn append_notes(existing: Option<&str>, label: &str, addition: Option<&str>) -> Option<String> {
    let addition = addition.map(str::trim).filter(|text| !text.is_empty());
    match (existing, addition) {
        (existing, None) => existing.map(str::to_owned),
        (None, Some(text)) => Some(format!("{label} Notes: {text}")),
        (Some(existing), Some(text)) => Some(
            format!("{existing}\n\n{label} Notes: {text}")
                .trim()
                .to_owned(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::{ScheduleId, ShiftDraft, ShiftType, TimeWindow};

    #[fixture]
    fn shift() -> Shift {
        Shift::new(ShiftDraft {
            id: ShiftId::random(),
            organization_id: OrganizationId::random(),
            schedule_id: ScheduleId::random(),
            staff_id: StaffId::random(),
            client_id: None,
            date: NaiveDate::from_ymd_opt(2024, 5, 6).expect("valid date"),
            window: TimeWindow::new(
                NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"),
                NaiveTime::from_hms_opt(17, 0, 0).expect("valid time"),
            )
            .expect("valid window"),
            break_window: None,
            meal_window: None,
            status: ShiftStatus::Scheduled,
            shift_type: ShiftType::Regular,
            notes: None,
            required_documentation: None,
        })
        .expect("valid shift")
    }

    fn drop_request(shift: &Shift, notes: Option<&str>) -> CoverageRequest {
        CoverageRequest::open(
            CoverageRequestId::random(),
            shift.staff_id(),
            shift,
            CoverageRequestType::Drop,
            "  hospital appointment ".to_owned(),
            notes.map(str::to_owned),
            Utc::now(),
        )
        .expect("valid request")
    }

    #[rstest]
    fn open_trims_the_reason_and_starts_pending(shift: Shift) {
        let request = drop_request(&shift, None);
        assert_eq!(request.reason(), "hospital appointment");
        assert_eq!(request.status(), CoverageStatus::Pending);
        assert_eq!(request.organization_id(), shift.organization_id());
        assert!(request.responded_at().is_none());
    }

    #[rstest]
    #[case::swap_by_stranger(CoverageRequestType::Swap, false)]
    #[case::drop_by_stranger(CoverageRequestType::Drop, false)]
    #[case::pickup_by_owner(CoverageRequestType::Pickup, true)]
    fn ownership_must_fit_the_request_type(
        shift: Shift,
        #[case] request_type: CoverageRequestType,
        #[case] by_owner: bool,
    ) {
        let requester = if by_owner {
            shift.staff_id()
        } else {
            StaffId::random()
        };
        let error = CoverageRequest::open(
            CoverageRequestId::random(),
            requester,
            &shift,
            request_type,
            "reason".to_owned(),
            None,
            Utc::now(),
        )
        .expect_err("ownership mismatch");
        assert!(matches!(
            error,
            CoverageRequestError::NotShiftOwner { .. } | CoverageRequestError::PickupOfOwnShift { .. }
        ));
    }

    #[rstest]
    fn blank_reason_is_rejected(shift: Shift) {
        let error = CoverageRequest::open(
            CoverageRequestId::random(),
            shift.staff_id(),
            &shift,
            CoverageRequestType::Drop,
            "   ".to_owned(),
            None,
            Utc::now(),
        )
        .expect_err("blank reason");
        assert_eq!(error, CoverageRequestError::BlankReason);
    }

    #[rstest]
    fn started_shift_cannot_be_covered(shift: Shift) {
        let started = shift.start().expect("starts");
        let error = CoverageRequest::open(
            CoverageRequestId::random(),
            started.staff_id(),
            &started,
            CoverageRequestType::Drop,
            "reason".to_owned(),
            None,
            Utc::now(),
        )
        .expect_err("in progress");
        assert!(matches!(error, CoverageRequestError::ShiftNotOpen { .. }));
    }

    #[rstest]
    fn approval_appends_decision_notes(shift: Shift) {
        let manager = UserId::random();
        let approved = drop_request(&shift, Some("cover needed by noon"))
            .approve(manager, Utc::now(), Some("Dana will cover"))
            .expect("pending requests can be approved");
        assert_eq!(approved.status(), CoverageStatus::Approved);
        assert_eq!(approved.responded_by(), Some(manager));
        assert_eq!(
            approved.notes(),
            Some("cover needed by noon\n\nApproval Notes: Dana will cover")
        );
    }

    #[rstest]
    fn denial_without_prior_notes_keeps_only_the_decision(shift: Shift) {
        let denied = drop_request(&shift, None)
            .deny(UserId::random(), Utc::now(), Some("short staffed"))
            .expect("pending requests can be denied");
        assert_eq!(denied.notes(), Some("Denial Notes: short staffed"));
    }

    #[rstest]
    fn decided_requests_are_final(shift: Shift) {
        let cancelled = drop_request(&shift, None)
            .cancel(Utc::now())
            .expect("pending requests can be cancelled");
        assert_eq!(cancelled.responded_by(), None);
        let error = cancelled
            .approve(UserId::random(), Utc::now(), None)
            .expect_err("cancelled is terminal");
        assert_eq!(error.status, "cancelled");
    }
}
