//! Scheduling configuration loaded via OrthoConfig.
//!
//! Values come from CLI arguments, `CAREROTA_*` environment variables and
//! configuration files, and are validated into a [`SchedulingPolicy`].

use std::str::FromStr;

use chrono_tz::Tz;
use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{
    DEFAULT_GENERATION_SAFETY_CAP, DocumentType, OvertimePolicy, SchedulingPolicy, WorkedDuration,
};
use crate::outbound::persistence::PoolConfig;

const DEFAULT_TIMEZONE: &str = "UTC";
const DEFAULT_WEEKLY_THRESHOLD_HOURS: u32 = 40;

/// Settings rejected while building a [`SchedulingPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("unknown agency timezone: {name}")]
    UnknownTimezone { name: String },
    #[error("invalid fallback document type: {value}")]
    UnknownDocumentType { value: String },
    #[error("weekly overtime threshold must be positive")]
    ZeroOvertimeThreshold,
    #[error("generation safety cap must be positive")]
    ZeroSafetyCap,
}

/// Configuration values for the scheduling core.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CAREROTA")]
pub struct SchedulingSettings {
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// Upper bound on pooled connections.
    pub pool_max_size: Option<u32>,
    /// IANA timezone defining the agency's overtime week.
    pub timezone: Option<String>,
    /// Hours per week before overtime starts.
    pub weekly_overtime_threshold_hours: Option<u32>,
    /// Per-run cap on generated appointments for uncapped templates.
    pub generation_safety_cap: Option<u32>,
    /// Document required when neither shift nor client name any.
    pub fallback_document: Option<String>,
}

impl SchedulingSettings {
    /// Validate the settings, applying defaults for anything unset.
    pub fn policy(&self) -> Result<SchedulingPolicy, SettingsError> {
        let timezone_name = self.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE);
        let timezone = Tz::from_str(timezone_name).map_err(|_| SettingsError::UnknownTimezone {
            name: timezone_name.to_owned(),
        })?;

        let threshold = self
            .weekly_overtime_threshold_hours
            .unwrap_or(DEFAULT_WEEKLY_THRESHOLD_HOURS);
        if threshold == 0 {
            return Err(SettingsError::ZeroOvertimeThreshold);
        }

        let generation_safety_cap = self
            .generation_safety_cap
            .unwrap_or(DEFAULT_GENERATION_SAFETY_CAP);
        if generation_safety_cap == 0 {
            return Err(SettingsError::ZeroSafetyCap);
        }

        let fallback_document = match self.fallback_document.as_deref() {
            Some(value) => DocumentType::from_str(value).map_err(|err| {
                SettingsError::UnknownDocumentType { value: err.input }
            })?,
            None => DocumentType::ShiftNote,
        };

        Ok(SchedulingPolicy {
            overtime: OvertimePolicy::new(WorkedDuration::from_hours(threshold), timezone),
            generation_safety_cap,
            fallback_document,
        })
    }

    /// Pool configuration, when a database URL is configured.
    pub fn pool_config(&self) -> Option<PoolConfig> {
        let config = PoolConfig::new(self.database_url.as_deref()?);
        Some(match self.pool_max_size {
            Some(max_size) => config.with_max_size(max_size),
            None => config,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for scheduling configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARIABLES: [&str; 6] = [
        "CAREROTA_DATABASE_URL",
        "CAREROTA_POOL_MAX_SIZE",
        "CAREROTA_TIMEZONE",
        "CAREROTA_WEEKLY_OVERTIME_THRESHOLD_HOURS",
        "CAREROTA_GENERATION_SAFETY_CAP",
        "CAREROTA_FALLBACK_DOCUMENT",
    ];

    /// Every variable, unset unless overridden.
    fn env_with(overrides: &[(&str, &str)]) -> Vec<(&'static str, Option<String>)> {
        VARIABLES
            .iter()
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| (*value).to_owned());
                (*name, value)
            })
            .collect()
    }

    fn load_from_empty_args() -> SchedulingSettings {
        SchedulingSettings::load_from_iter([OsString::from("carerota")])
            .expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_nothing_is_set() {
        let _guard = lock_env(env_with(&[]));

        let settings = load_from_empty_args();
        let policy = settings.policy().expect("defaults are valid");

        assert_eq!(policy, SchedulingPolicy::default());
        assert!(settings.pool_config().is_none());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(env_with(&[
            ("CAREROTA_DATABASE_URL", "postgres://localhost/rota"),
            ("CAREROTA_TIMEZONE", "Europe/London"),
            ("CAREROTA_WEEKLY_OVERTIME_THRESHOLD_HOURS", "37"),
            ("CAREROTA_GENERATION_SAFETY_CAP", "250"),
            ("CAREROTA_FALLBACK_DOCUMENT", "activity_log"),
        ]));

        let settings = load_from_empty_args();
        let policy = settings.policy().expect("overrides are valid");

        assert_eq!(policy.overtime.timezone(), chrono_tz::Europe::London);
        assert_eq!(
            policy.overtime.weekly_threshold(),
            WorkedDuration::from_hours(37)
        );
        assert_eq!(policy.generation_safety_cap, 250);
        assert_eq!(policy.fallback_document, DocumentType::ActivityLog);
        let pool = settings.pool_config().expect("database configured");
        assert_eq!(pool.database_url(), "postgres://localhost/rota");
    }

    #[rstest]
    #[case("CAREROTA_TIMEZONE", "Mars/Olympus", SettingsError::UnknownTimezone { name: "Mars/Olympus".to_owned() })]
    #[case("CAREROTA_FALLBACK_DOCUMENT", "ShiftNote", SettingsError::UnknownDocumentType { value: "ShiftNote".to_owned() })]
    #[case("CAREROTA_WEEKLY_OVERTIME_THRESHOLD_HOURS", "0", SettingsError::ZeroOvertimeThreshold)]
    #[case("CAREROTA_GENERATION_SAFETY_CAP", "0", SettingsError::ZeroSafetyCap)]
    fn invalid_values_are_rejected(
        #[case] name: &str,
        #[case] value: &str,
        #[case] expected: SettingsError,
    ) {
        let _guard = lock_env(env_with(&[(name, value)]));

        let error = load_from_empty_args()
            .policy()
            .expect_err("value is rejected");

        assert_eq!(error, expected);
    }
}
