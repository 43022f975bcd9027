//! Helpers shared by the scheduling services.

use crate::domain::ports::{CapabilityCheck, CapabilityCheckError, TenantDirectoryError};
use crate::domain::{Actor, Capability, Error, InvalidTransition};

/// Fail with `forbidden` unless `actor` holds `capability`.
pub(crate) async fn authorize<C>(check: &C, actor: &Actor, capability: Capability) -> Result<(), Error>
where
    C: CapabilityCheck + ?Sized,
{
    let allowed = check
        .is_authorized(actor, capability)
        .await
        .map_err(map_capability_error)?;
    if allowed {
        Ok(())
    } else {
        Err(Error::forbidden(format!(
            "user {} lacks the {capability} capability",
            actor.user_id
        )))
    }
}

fn map_capability_error(error: CapabilityCheckError) -> Error {
    match error {
        CapabilityCheckError::Unavailable { message } => {
            Error::service_unavailable(format!("capability check unavailable: {message}"))
        }
    }
}

/// Lifecycle violations surface as `invalid_state`.
pub(crate) fn invalid_transition(error: InvalidTransition) -> Error {
    Error::invalid_state(error.to_string())
}

pub(crate) fn map_directory_error(error: TenantDirectoryError) -> Error {
    match error {
        TenantDirectoryError::Unavailable { message } => {
            Error::service_unavailable(format!("tenant directory unavailable: {message}"))
        }
    }
}
