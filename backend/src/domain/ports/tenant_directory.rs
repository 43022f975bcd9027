//! Port onto the staff and client directory kept outside this crate.

use async_trait::async_trait;

use crate::domain::{ClientId, DocumentType, OrganizationId, StaffId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by tenant directory adapters.
    pub enum TenantDirectoryError {
        /// The directory could not be reached.
        Unavailable { message: String } =>
            "tenant directory unavailable: {message}",
    }
}

/// Resolves staff and clients within an organization.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn staff_exists(
        &self,
        organization_id: OrganizationId,
        staff_id: StaffId,
    ) -> Result<bool, TenantDirectoryError>;

    async fn client_exists(
        &self,
        organization_id: OrganizationId,
        client_id: ClientId,
    ) -> Result<bool, TenantDirectoryError>;

    /// Client-level required documentation, if the client has any configured.
    async fn client_documentation_defaults(
        &self,
        organization_id: OrganizationId,
        client_id: ClientId,
    ) -> Result<Option<Vec<DocumentType>>, TenantDirectoryError>;
}

/// Fixture directory that resolves everyone and configures no defaults.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureTenantDirectory;

#[async_trait]
impl TenantDirectory for FixtureTenantDirectory {
    async fn staff_exists(
        &self,
        _organization_id: OrganizationId,
        _staff_id: StaffId,
    ) -> Result<bool, TenantDirectoryError> {
        Ok(true)
    }

    async fn client_exists(
        &self,
        _organization_id: OrganizationId,
        _client_id: ClientId,
    ) -> Result<bool, TenantDirectoryError> {
        Ok(true)
    }

    async fn client_documentation_defaults(
        &self,
        _organization_id: OrganizationId,
        _client_id: ClientId,
    ) -> Result<Option<Vec<DocumentType>>, TenantDirectoryError> {
        Ok(None)
    }
}
