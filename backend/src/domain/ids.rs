//! Strongly typed identifiers.
//!
//! Every entity is keyed by a UUID. Wrapping each key in its own type stops a
//! staff id from being passed where a client id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new random identifier.
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub const fn from_uuid(value: Uuid) -> Self {
                Self(value)
            }

            /// Access the underlying UUID.
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

define_id!(
    /// Tenant boundary; every stored row carries one.
    OrganizationId
);
define_id!(
    /// Authenticated user performing an operation.
    UserId
);
define_id!(
    /// Caregiver or other staff member who can own shifts.
    StaffId
);
define_id!(
    /// Care recipient a shift or appointment is delivered to.
    ClientId
);
define_id!(
    /// Schedule container.
    ScheduleId
);
define_id!(
    /// Scheduled work interval.
    ShiftId
);
define_id!(
    /// Staff availability rule.
    AvailabilityId
);
define_id!(
    /// Derived scheduling conflict record.
    ConflictId
);
define_id!(
    /// Shift exchange request.
    SwapId
);
define_id!(
    /// Request for someone to cover, pick up or drop a shift.
    CoverageRequestId
);
define_id!(
    /// Time clock event.
    TimeEntryId
);
define_id!(
    /// Weekly overtime bucket.
    OvertimeRecordId
);
define_id!(
    /// Recurring appointment template.
    TemplateId
);
define_id!(
    /// Concrete appointment instance.
    AppointmentId
);

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn display_matches_uuid() {
        let uuid = Uuid::new_v4();
        assert_eq!(ShiftId::from_uuid(uuid).to_string(), uuid.to_string());
    }

    #[rstest]
    fn serialises_transparently() {
        let uuid = Uuid::new_v4();
        let value = serde_json::to_value(StaffId::from(uuid)).expect("serialise id");
        assert_eq!(value, serde_json::Value::String(uuid.to_string()));
    }
}
