//! Agency-wide scheduling policy.

use crate::domain::{DocumentType, OvertimePolicy};

/// Default per-run cap on generated appointments for uncapped templates.
pub const DEFAULT_GENERATION_SAFETY_CAP: u32 = 1_000;

/// Tunables shared by the scheduling services.
///
/// Built from configuration by `config::SchedulingSettings::policy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulingPolicy {
    pub overtime: OvertimePolicy,
    pub generation_safety_cap: u32,
    /// Required document when neither shift nor client configure any.
    pub fallback_document: DocumentType,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self {
            overtime: OvertimePolicy::default(),
            generation_safety_cap: DEFAULT_GENERATION_SAFETY_CAP,
            fallback_document: DocumentType::ShiftNote,
        }
    }
}
