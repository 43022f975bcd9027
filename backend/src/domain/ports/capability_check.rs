//! Port deciding whether an actor may exercise a capability.

use async_trait::async_trait;

use crate::domain::{Actor, Capability, RoleCapabilityCheck};

use super::define_port_error;

define_port_error! {
    /// Errors raised by capability check adapters.
    pub enum CapabilityCheckError {
        /// The permission source could not be reached.
        Unavailable { message: String } =>
            "capability check unavailable: {message}",
    }
}

/// Authorization seam consulted before every operation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CapabilityCheck: Send + Sync {
    /// `Ok(false)` means the actor lacks the capability.
    async fn is_authorized(
        &self,
        actor: &Actor,
        capability: Capability,
    ) -> Result<bool, CapabilityCheckError>;
}

#[async_trait]
impl CapabilityCheck for RoleCapabilityCheck {
    async fn is_authorized(
        &self,
        actor: &Actor,
        capability: Capability,
    ) -> Result<bool, CapabilityCheckError> {
        Ok(self.allows(actor, capability))
    }
}

/// Fixture check that allows everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCapabilityCheck;

#[async_trait]
impl CapabilityCheck for FixtureCapabilityCheck {
    async fn is_authorized(
        &self,
        _actor: &Actor,
        _capability: Capability,
    ) -> Result<bool, CapabilityCheckError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;
    use crate::domain::{OrganizationId, Role, UserId};

    #[rstest]
    #[tokio::test]
    async fn role_table_answers_through_the_port() {
        let user = UserId::random();
        let check = RoleCapabilityCheck::new().with_role(user, Role::Caregiver);
        let actor = Actor::new(user, OrganizationId::random());

        assert!(
            check
                .is_authorized(&actor, Capability::ClockTime)
                .await
                .expect("role lookup succeeds")
        );
        assert!(
            !check
                .is_authorized(&actor, Capability::ApproveSwaps)
                .await
                .expect("role lookup succeeds")
        );
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_allows_everything() {
        let actor = Actor::new(UserId::random(), OrganizationId::random());
        for capability in Capability::ALL {
            assert!(
                FixtureCapabilityCheck
                    .is_authorized(&actor, *capability)
                    .await
                    .expect("fixture succeeds")
            );
        }
    }
}
