//! Shared rejection type for state machine transitions.

use std::fmt;

/// Raised when an entity cannot perform `action` from its current status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTransition {
    /// Entity kind, for example `"shift"`.
    pub entity: &'static str,
    /// Attempted action, for example `"cancel"`.
    pub action: &'static str,
    /// Canonical text of the status the entity was in.
    pub status: &'static str,
}

impl InvalidTransition {
    /// Build a rejection for `entity` in `status`.
    pub const fn new(entity: &'static str, action: &'static str, status: &'static str) -> Self {
        Self {
            entity,
            action,
            status,
        }
    }
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot {} {} while it is {}",
            self.action, self.entity, self.status
        )
    }
}

impl std::error::Error for InvalidTransition {}
