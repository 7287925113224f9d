//! Alert configuration
//!
//! Thresholds and cooldowns default to the tuned values below. They can be
//! overridden from a TOML file and from `SENTINEL_*` environment variables
//! (nested keys use `__`, e.g. `SENTINEL_THRESHOLDS__SLEEPING=6`).

use crate::error::ConfigError;
use crate::types::AlertCategory;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Seconds of continuous sleeping before the first alert
pub const DEFAULT_SLEEPING_THRESHOLD_SECS: f64 = 8.0;
/// Seconds of continuous yawning before the first alert
pub const DEFAULT_YAWNING_THRESHOLD_SECS: f64 = 3.5;
/// Seconds of continuous inattention before the first alert
pub const DEFAULT_NOT_FOCUSED_THRESHOLD_SECS: f64 = 8.0;
/// Seconds without a visible subject before the first alert
pub const DEFAULT_NO_PERSON_THRESHOLD_SECS: f64 = 10.0;
/// Minimum seconds between alerts for the same ongoing episode
pub const DEFAULT_ALERT_COOLDOWN_SECS: f64 = 5.0;
/// Number of alerts included in live status reads
pub const DEFAULT_RECENT_ALERT_LIMIT: usize = 5;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "SENTINEL_";

/// Per-category alert thresholds in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub sleeping: f64,
    pub yawning: f64,
    pub not_focused: f64,
    pub no_person: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            sleeping: DEFAULT_SLEEPING_THRESHOLD_SECS,
            yawning: DEFAULT_YAWNING_THRESHOLD_SECS,
            not_focused: DEFAULT_NOT_FOCUSED_THRESHOLD_SECS,
            no_person: DEFAULT_NO_PERSON_THRESHOLD_SECS,
        }
    }
}

impl Thresholds {
    pub fn for_category(&self, category: AlertCategory) -> f64 {
        match category {
            AlertCategory::Sleeping => self.sleeping,
            AlertCategory::Yawning => self.yawning,
            AlertCategory::NotFocused => self.not_focused,
            AlertCategory::NoPerson => self.no_person,
        }
    }
}

/// Alerting configuration for one monitored subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentinelConfig {
    pub thresholds: Thresholds,
    pub alert_cooldown_secs: f64,
    pub recent_alert_limit: usize,
    /// Subject label on behavioral alerts
    pub behavior_subject_label: String,
    /// Subject label on absence alerts
    pub system_subject_label: String,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            alert_cooldown_secs: DEFAULT_ALERT_COOLDOWN_SECS,
            recent_alert_limit: DEFAULT_RECENT_ALERT_LIMIT,
            behavior_subject_label: "You".to_string(),
            system_subject_label: "System".to_string(),
        }
    }
}

impl SentinelConfig {
    /// Load from the platform config file and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, optionally merging a specific TOML file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = default_config_dir() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Check that all durations are finite and non-negative
    pub fn validate(&self) -> Result<(), ConfigError> {
        for category in AlertCategory::ALL {
            let threshold = self.thresholds.for_category(category);
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "threshold for {} must be a non-negative number, got {}",
                    category.label(),
                    threshold
                )));
            }
        }

        if !self.alert_cooldown_secs.is_finite() || self.alert_cooldown_secs < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "alert_cooldown_secs must be a non-negative number, got {}",
                self.alert_cooldown_secs
            )));
        }

        if self.recent_alert_limit == 0 {
            return Err(ConfigError::Invalid(
                "recent_alert_limit must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Platform config directory for focus-sentinel
///
/// On Linux: `~/.config/focus-sentinel`
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("focus-sentinel"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults_match_tuned_values() {
        let config = SentinelConfig::default();
        assert_eq!(config.thresholds.sleeping, 8.0);
        assert_eq!(config.thresholds.yawning, 3.5);
        assert_eq!(config.thresholds.not_focused, 8.0);
        assert_eq!(config.thresholds.no_person, 10.0);
        assert_eq!(config.alert_cooldown_secs, 5.0);
        assert_eq!(config.recent_alert_limit, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_threshold_lookup_by_category() {
        let thresholds = Thresholds::default();
        assert_eq!(thresholds.for_category(AlertCategory::Sleeping), 8.0);
        assert_eq!(thresholds.for_category(AlertCategory::Yawning), 3.5);
        assert_eq!(thresholds.for_category(AlertCategory::NoPerson), 10.0);
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "alert_cooldown_secs = 2.5\nrecent_alert_limit = 10\n\n[thresholds]\nsleeping = 6.0\nyawning = 3.5\nnot_focused = 8.0\nno_person = 12.0"
        )
        .unwrap();

        let config = SentinelConfig::load_from(Some(file.path())).unwrap();
        assert_eq!(config.alert_cooldown_secs, 2.5);
        assert_eq!(config.recent_alert_limit, 10);
        assert_eq!(config.thresholds.sleeping, 6.0);
        assert_eq!(config.thresholds.no_person, 12.0);
        assert_eq!(config.behavior_subject_label, "You");
    }

    #[test]
    fn test_validate_rejects_negative_threshold() {
        let mut config = SentinelConfig::default();
        config.thresholds.yawning = -1.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_nan_cooldown() {
        let config = SentinelConfig {
            alert_cooldown_secs: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_recent_limit() {
        let config = SentinelConfig {
            recent_alert_limit: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
