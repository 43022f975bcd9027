//! Port onto the external client documentation records.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{ClientId, DocumentType, OrganizationId, StaffId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by documentation lookup adapters.
    pub enum DocumentationLookupError {
        /// The documentation system could not be reached.
        Unavailable { message: String } =>
            "documentation lookup unavailable: {message}",
    }
}

/// Answers whether a caregiver recorded a document for a client on a date.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentationLookup: Send + Sync {
    async fn has_record(
        &self,
        organization_id: OrganizationId,
        document_type: DocumentType,
        client_id: ClientId,
        staff_id: StaffId,
        date: NaiveDate,
    ) -> Result<bool, DocumentationLookupError>;
}

/// Fixture lookup that reports every document as recorded.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureDocumentationLookup;

#[async_trait]
impl DocumentationLookup for FixtureDocumentationLookup {
    async fn has_record(
        &self,
        _organization_id: OrganizationId,
        _document_type: DocumentType,
        _client_id: ClientId,
        _staff_id: StaffId,
        _date: NaiveDate,
    ) -> Result<bool, DocumentationLookupError> {
        Ok(true)
    }
}
