//! Documentation compliance rules applied before clock-out.

use std::fmt;

use serde::Serialize;

use crate::domain::text_enum::define_text_enum;

define_text_enum! {
    /// Client documentation a caregiver may be required to record.
    pub enum DocumentType parse ParseDocumentTypeError as "document type" {
        /// Vital signs.
        VitalsLog => "vitals_log",
        /// Narrative shift note.
        ShiftNote => "shift_note",
        /// Meal record.
        MealLog => "meal_log",
        /// Incident report.
        IncidentReport => "incident_report",
        /// Activity record.
        ActivityLog => "activity_log",
        /// Sleep record.
        SleepLog => "sleep_log",
        /// Elimination record.
        BowelMovementLog => "bowel_movement_log",
    }
}

/// Response status of one active special requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementResponse {
    pub title: String,
    pub responded: bool,
}

/// One item blocking clock-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MissingItem {
    /// No record of this type exists for the client, staff member and date.
    Document {
        /// Missing document type.
        document_type: DocumentType,
    },
    /// No response was logged for an active special requirement.
    SpecialRequirement {
        /// Requirement title.
        title: String,
    },
}

impl fmt::Display for MissingItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document { document_type } => write!(f, "{document_type}"),
            Self::SpecialRequirement { title } => {
                write!(f, "special requirement response: {title}")
            }
        }
    }
}

/// Resolve which documents a session must have, in priority order:
/// shift override, client defaults, then the global fallback.
///
/// Empty lists count as unset. Duplicates are dropped, first occurrence wins.
///
/// # Examples
/// ```
/// use carerota::domain::{required_documents, DocumentType};
///
/// let required = required_documents(None, Some(&[DocumentType::MealLog]), DocumentType::ShiftNote);
/// assert_eq!(required, vec![DocumentType::MealLog]);
/// ```
pub fn required_documents(
    shift_override: Option<&[DocumentType]>,
    client_defaults: Option<&[DocumentType]>,
    fallback: DocumentType,
) -> Vec<DocumentType> {
    let chosen = shift_override
        .filter(|list| !list.is_empty())
        .or_else(|| client_defaults.filter(|list| !list.is_empty()));

    match chosen {
        Some(list) => list.iter().fold(Vec::new(), |mut unique, item| {
            if !unique.contains(item) {
                unique.push(*item);
            }
            unique
        }),
        None => vec![fallback],
    }
}

/// Outcome of a compliance check; lists every missing item, not just the first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplianceReport {
    missing: Vec<MissingItem>,
}

impl ComplianceReport {
    /// Record a missing document.
    pub fn missing_document(&mut self, document_type: DocumentType) {
        self.missing.push(MissingItem::Document { document_type });
    }

    /// Record an unanswered special requirement.
    pub fn missing_requirement(&mut self, title: impl Into<String>) {
        self.missing.push(MissingItem::SpecialRequirement {
            title: title.into(),
        });
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn missing(&self) -> &[MissingItem] {
        self.missing.as_slice()
    }
}
