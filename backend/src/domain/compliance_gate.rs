//! Documentation checks that must pass before a clock-out is written.

use std::sync::Arc;

use crate::domain::ports::{
    DocumentationLookup, DocumentationLookupError, SpecialRequirementLookup,
    SpecialRequirementLookupError, TenantDirectory,
};
use crate::domain::service_support::map_directory_error;
use crate::domain::{ComplianceReport, DocumentType, Error, Shift, StaffId, required_documents};

fn map_documentation_error(error: DocumentationLookupError) -> Error {
    match error {
        DocumentationLookupError::Unavailable { message } => {
            Error::service_unavailable(format!("documentation lookup unavailable: {message}"))
        }
    }
}

fn map_requirement_error(error: SpecialRequirementLookupError) -> Error {
    match error {
        SpecialRequirementLookupError::Unavailable { message } => {
            Error::service_unavailable(format!("special requirement lookup unavailable: {message}"))
        }
    }
}

/// Collects every missing document and unanswered special requirement for a
/// shift's client on the shift date.
pub struct ComplianceGate<T, D, R> {
    directory: Arc<T>,
    documents: Arc<D>,
    requirements: Arc<R>,
    fallback: DocumentType,
}

impl<T, D, R> ComplianceGate<T, D, R>
where
    T: TenantDirectory,
    D: DocumentationLookup,
    R: SpecialRequirementLookup,
{
    /// `fallback` applies when neither shift nor client name any documents.
    pub fn new(
        directory: Arc<T>,
        documents: Arc<D>,
        requirements: Arc<R>,
        fallback: DocumentType,
    ) -> Self {
        Self {
            directory,
            documents,
            requirements,
            fallback,
        }
    }

    /// Check `shift` for `staff_id`. Shifts without a client have nothing to
    /// check and always pass.
    pub async fn check(&self, staff_id: StaffId, shift: &Shift) -> Result<ComplianceReport, Error> {
        let mut report = ComplianceReport::default();
        let Some(client_id) = shift.client_id() else {
            return Ok(report);
        };
        let organization_id = shift.organization_id();
        let date = shift.date();

        let client_defaults = self
            .directory
            .client_documentation_defaults(organization_id, client_id)
            .await
            .map_err(map_directory_error)?;
        let required = required_documents(
            shift.required_documentation(),
            client_defaults.as_deref(),
            self.fallback,
        );

        for document_type in required {
            let recorded = self
                .documents
                .has_record(organization_id, document_type, client_id, staff_id, date)
                .await
                .map_err(map_documentation_error)?;
            if !recorded {
                report.missing_document(document_type);
            }
        }

        let requirements = self
            .requirements
            .active_requirements(organization_id, client_id, date, staff_id, Some(shift.id()))
            .await
            .map_err(map_requirement_error)?;
        for requirement in requirements.into_iter().filter(|r| !r.responded) {
            report.missing_requirement(requirement.title);
        }

        Ok(report)
    }
}
