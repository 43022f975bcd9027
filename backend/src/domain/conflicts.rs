//! Derived scheduling conflicts.
//!
//! Conflicts are computed from shifts and availability rules and stored as
//! informational records. At most one unresolved record exists per
//! `(shift, conflict type)`; storage enforces this and recomputation relies on
//! it.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::domain::text_enum::define_text_enum;
use crate::domain::transition::InvalidTransition;
use crate::domain::{
    ConflictId, OrganizationId, Shift, ShiftId, StaffAvailability, StaffId, UserId,
};

define_text_enum! {
    /// Kind of scheduling problem.
    pub enum ConflictType parse ParseConflictTypeError as "conflict type" {
        /// Overlapping shifts for one staff member.
        DoubleBooking => "double_booking",
        /// Shift overlaps an unavailable window.
        AvailabilityConflict => "availability_conflict",
        /// Weekly hours exceed policy.
        OvertimeViolation => "overtime_violation",
        /// Staff member lacks a required skill.
        SkillMismatch => "skill_mismatch",
    }
}

define_text_enum! {
    /// Urgency attached to a conflict.
    pub enum ConflictSeverity parse ParseConflictSeverityError as "conflict severity" {
        /// Informational.
        Low => "low",
        /// Needs attention before publishing.
        Medium => "medium",
        /// Must be fixed.
        High => "high",
        /// Blocks care delivery.
        Critical => "critical",
    }
}

impl ConflictType {
    /// Severity assigned when the detector raises this kind of conflict.
    pub const fn default_severity(self) -> ConflictSeverity {
        match self {
            Self::DoubleBooking => ConflictSeverity::High,
            Self::AvailabilityConflict | Self::OvertimeViolation => ConflictSeverity::Medium,
            Self::SkillMismatch => ConflictSeverity::Low,
        }
    }
}

/// A conflict found by evaluation, before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictFinding {
    pub shift_id: ShiftId,
    pub staff_id: StaffId,
    pub conflict_type: ConflictType,
    pub severity: ConflictSeverity,
    pub description: String,
}

/// Evaluate `shift` against the staff member's other shifts that day and the
/// availability rule in force.
///
/// Every double booking is reported on both participating shifts. Findings
/// are unique per `(shift, type)`.
pub fn find_conflicts(
    shift: &Shift,
    same_day_shifts: &[Shift],
    availability: Option<&StaffAvailability>,
) -> Vec<ConflictFinding> {
    if !shift.status().is_active() {
        return Vec::new();
    }

    let mut findings = Vec::new();
    let mut seen = HashSet::new();
    let mut push = |finding: ConflictFinding| {
        if seen.insert((finding.shift_id, finding.conflict_type)) {
            findings.push(finding);
        }
    };

    for peer in same_day_shifts.iter().filter(|peer| shift.collides_with(peer)) {
        push(double_booking(shift, peer));
        push(double_booking(peer, shift));
    }

    if let Some(rule) = availability
        && rule.staff_id() == shift.staff_id()
        && rule.blocks(&shift.window())
    {
        push(ConflictFinding {
            shift_id: shift.id(),
            staff_id: shift.staff_id(),
            conflict_type: ConflictType::AvailabilityConflict,
            severity: ConflictType::AvailabilityConflict.default_severity(),
            description: format!(
                "Shift {}-{} overlaps unavailable window {}-{} on {}",
                shift.window().start(),
                shift.window().end(),
                rule.window().start(),
                rule.window().end(),
                rule.weekday(),
            ),
        });
    }

    findings
}

fn double_booking(shift: &Shift, other: &Shift) -> ConflictFinding {
    ConflictFinding {
        shift_id: shift.id(),
        staff_id: shift.staff_id(),
        conflict_type: ConflictType::DoubleBooking,
        severity: ConflictType::DoubleBooking.default_severity(),
        description: format!("Double booking detected with shift {}", other.id()),
    }
}

/// Stored conflict record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleConflict {
    pub(crate) id: ConflictId,
    pub(crate) organization_id: OrganizationId,
    pub(crate) shift_id: ShiftId,
    pub(crate) staff_id: StaffId,
    pub(crate) conflict_type: ConflictType,
    pub(crate) severity: ConflictSeverity,
    pub(crate) description: String,
    pub(crate) detected_at: DateTime<Utc>,
    pub(crate) resolved: bool,
    pub(crate) resolved_by: Option<UserId>,
    pub(crate) resolved_at: Option<DateTime<Utc>>,
    pub(crate) resolution_notes: Option<String>,
}

impl ScheduleConflict {
    /// Turn a finding into an unresolved record.
    pub fn from_finding(
        id: ConflictId,
        organization_id: OrganizationId,
        finding: ConflictFinding,
        detected_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            organization_id,
            shift_id: finding.shift_id,
            staff_id: finding.staff_id,
            conflict_type: finding.conflict_type,
            severity: finding.severity,
            description: finding.description,
            detected_at,
            resolved: false,
            resolved_by: None,
            resolved_at: None,
            resolution_notes: None,
        }
    }

    /// Conflict identifier.
    pub fn id(&self) -> ConflictId {
        self.id
    }

    /// Organization the conflict belongs to.
    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Shift the conflict was detected on.
    pub fn shift_id(&self) -> ShiftId {
        self.shift_id
    }

    /// Staff member holding the shift.
    pub fn staff_id(&self) -> StaffId {
        self.staff_id
    }

    /// What kind of clash was found.
    pub fn conflict_type(&self) -> ConflictType {
        self.conflict_type
    }

    /// Severity derived from the conflict type at detection.
    pub fn severity(&self) -> ConflictSeverity {
        self.severity
    }

    /// Human-readable summary naming the clashing shift or window.
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// When detection ran.
    pub fn detected_at(&self) -> DateTime<Utc> {
        self.detected_at
    }

    /// Whether a manager has marked the conflict handled.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Manager who resolved the conflict.
    pub fn resolved_by(&self) -> Option<UserId> {
        self.resolved_by
    }

    /// When the conflict was resolved; set exactly when resolved.
    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    /// Notes recorded on resolution.
    pub fn resolution_notes(&self) -> Option<&str> {
        self.resolution_notes.as_deref()
    }

    /// Mark the conflict handled.
    pub fn resolve(
        &self,
        resolver: UserId,
        at: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<Self, InvalidTransition> {
        if self.resolved {
            return Err(InvalidTransition::new("conflict", "resolve", "resolved"));
        }
        Ok(Self {
            resolved: true,
            resolved_by: Some(resolver),
            resolved_at: Some(at),
            resolution_notes: notes,
            ..self.clone()
        })
    }
}
