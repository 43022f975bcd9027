//! Callers and the capabilities they may exercise.

use std::collections::HashMap;

use crate::domain::text_enum::define_text_enum;
use crate::domain::{OrganizationId, StaffId, UserId};

/// Authenticated caller on whose behalf an operation runs.
///
/// Every repository query issued for an actor is scoped to its organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Actor {
    pub user_id: UserId,
    pub organization_id: OrganizationId,
    /// Present when the caller is also a member of staff.
    pub staff_id: Option<StaffId>,
}

impl Actor {
    pub const fn new(user_id: UserId, organization_id: OrganizationId) -> Self {
        Self {
            user_id,
            organization_id,
            staff_id: None,
        }
    }

    pub const fn with_staff(mut self, staff_id: StaffId) -> Self {
        self.staff_id = Some(staff_id);
        self
    }

    /// True when the caller is the given member of staff.
    pub fn is_staff(&self, staff_id: StaffId) -> bool {
        self.staff_id == Some(staff_id)
    }
}

define_text_enum! {
    /// Permission checked before an operation runs.
    pub enum Capability parse ParseCapabilityError as "capability" {
        /// Create, copy, publish and edit schedules and shifts.
        ManageSchedules => "manage_schedules",
        /// Mark scheduling conflicts as resolved.
        ResolveConflicts => "resolve_conflicts",
        /// Request, answer and withdraw shift swaps.
        RequestSwaps => "request_swaps",
        /// Approve or deny peer-accepted swaps.
        ApproveSwaps => "approve_swaps",
        /// Clock in, clock out and take breaks.
        ClockTime => "clock_time",
        /// Append corrections to recorded time entries.
        AdjustTimeEntries => "adjust_time_entries",
        /// Read overtime summaries.
        ViewOvertime => "view_overtime",
        /// Create templates and materialise appointments.
        ManageRecurringAppointments => "manage_recurring_appointments",
    }
}

define_text_enum! {
    /// Agency role used by [`RoleCapabilityCheck`].
    pub enum Role parse ParseRoleError as "role" {
        /// Everything.
        Administrator => "administrator",
        /// Scheduling plus approvals and overtime.
        Manager => "manager",
        /// Builds rotas.
        Scheduler => "scheduler",
        /// Front-line staff.
        Caregiver => "caregiver",
    }
}

impl Role {
    /// Whether this role carries `capability`.
    pub const fn grants(self, capability: Capability) -> bool {
        use Capability as C;
        match self {
            Self::Administrator => true,
            Self::Manager => !matches!(capability, C::AdjustTimeEntries),
            Self::Scheduler => matches!(
                capability,
                C::ManageSchedules | C::ResolveConflicts | C::ManageRecurringAppointments
            ),
            Self::Caregiver => matches!(capability, C::RequestSwaps | C::ClockTime),
        }
    }
}

/// Role table keyed by user.
///
/// Users without an entry are granted nothing.
#[derive(Debug, Clone, Default)]
pub struct RoleCapabilityCheck {
    roles: HashMap<UserId, Role>,
}

impl RoleCapabilityCheck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `role` to `user_id`, replacing any earlier assignment.
    pub fn with_role(mut self, user_id: UserId, role: Role) -> Self {
        self.roles.insert(user_id, role);
        self
    }

    pub fn role_of(&self, user_id: UserId) -> Option<Role> {
        self.roles.get(&user_id).copied()
    }

    pub fn allows(&self, actor: &Actor, capability: Capability) -> bool {
        self.role_of(actor.user_id)
            .is_some_and(|role| role.grants(capability))
    }
}
