//! Core data types
//!
//! Defines the behavioral categories produced by the perception layer, the alerts
//! fired by the trackers, and the request/response values exchanged with callers
//! of the session coordinator.

use crate::config::Thresholds;
use crate::statistics::FocusStatistics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Attention state reported by the perception layer for a visible subject
///
/// Deserializes from the perception labels (`"FOCUSED"`, `"NOT FOCUSED"`,
/// `"YAWNING"`, `"SLEEPING"`). Any other label is treated as `Focused`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum BehaviorCategory {
    #[default]
    #[serde(rename = "FOCUSED")]
    Focused,
    #[serde(rename = "NOT FOCUSED")]
    NotFocused,
    #[serde(rename = "YAWNING")]
    Yawning,
    #[serde(rename = "SLEEPING")]
    Sleeping,
}

impl BehaviorCategory {
    /// Parse a perception label, falling back to `Focused` for anything unrecognized
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_ascii_uppercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "NOT FOCUSED" => BehaviorCategory::NotFocused,
            "YAWNING" => BehaviorCategory::Yawning,
            "SLEEPING" => BehaviorCategory::Sleeping,
            _ => BehaviorCategory::Focused,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BehaviorCategory::Focused => "FOCUSED",
            BehaviorCategory::NotFocused => "NOT FOCUSED",
            BehaviorCategory::Yawning => "YAWNING",
            BehaviorCategory::Sleeping => "SLEEPING",
        }
    }

    /// The alert category this state accrues to, or `None` for `Focused`
    pub fn alert_category(&self) -> Option<AlertCategory> {
        match self {
            BehaviorCategory::Focused => None,
            BehaviorCategory::NotFocused => Some(AlertCategory::NotFocused),
            BehaviorCategory::Yawning => Some(AlertCategory::Yawning),
            BehaviorCategory::Sleeping => Some(AlertCategory::Sleeping),
        }
    }

    pub fn is_distraction(&self) -> bool {
        self.alert_category().is_some()
    }
}

impl From<String> for BehaviorCategory {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<&str> for BehaviorCategory {
    fn from(label: &str) -> Self {
        Self::from_label(label)
    }
}

/// Category recorded on a fired alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertCategory {
    #[serde(rename = "NOT FOCUSED")]
    NotFocused,
    #[serde(rename = "YAWNING")]
    Yawning,
    #[serde(rename = "SLEEPING")]
    Sleeping,
    #[serde(rename = "NO PERSON")]
    NoPerson,
}

impl AlertCategory {
    pub const ALL: [AlertCategory; 4] = [
        AlertCategory::NotFocused,
        AlertCategory::Yawning,
        AlertCategory::Sleeping,
        AlertCategory::NoPerson,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AlertCategory::NotFocused => "NOT FOCUSED",
            AlertCategory::Yawning => "YAWNING",
            AlertCategory::Sleeping => "SLEEPING",
            AlertCategory::NoPerson => "NO PERSON",
        }
    }

    /// Message shown to the subject when this alert fires
    pub fn message(&self) -> &'static str {
        match self {
            AlertCategory::NotFocused => "You are not focused - please focus on screen!",
            AlertCategory::Yawning => "You are yawning - please take a rest!",
            AlertCategory::Sleeping => "You are sleeping - please wake up!",
            AlertCategory::NoPerson => "No person detected - please return to your seat!",
        }
    }

    pub fn severity(&self) -> AlertSeverity {
        match self {
            AlertCategory::NotFocused | AlertCategory::Yawning => AlertSeverity::Warning,
            AlertCategory::Sleeping | AlertCategory::NoPerson => AlertSeverity::Error,
        }
    }
}

/// Display severity for live alert feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Warning,
    Error,
}

/// Whether a subject is visible in the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PresenceState {
    Present,
    Absent,
}

impl From<bool> for PresenceState {
    fn from(is_present: bool) -> Self {
        if is_present {
            PresenceState::Present
        } else {
            PresenceState::Absent
        }
    }
}

/// A fired alert. Immutable once appended to the session log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// When the alert fired
    pub timestamp: DateTime<Utc>,
    /// Display time of day (`HH:MM:SS`, UTC)
    pub alert_time: String,
    /// Who the alert is about ("You" or "System")
    pub person: String,
    /// Alert category
    #[serde(rename = "detection")]
    pub category: AlertCategory,
    /// Human-readable message
    pub message: String,
    /// Whole seconds spent in the category at fire time
    #[serde(rename = "duration")]
    pub duration_secs: u64,
    /// Seconds spent in the category at fire time
    #[serde(rename = "real_time_duration")]
    pub real_time_duration_secs: f64,
    /// True for repeat alerts within the same ongoing episode
    pub is_reminder: bool,
}

impl Alert {
    pub fn new(
        category: AlertCategory,
        person: &str,
        duration_secs: f64,
        is_reminder: bool,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let duration_secs = duration_secs.max(0.0);
        Self {
            timestamp,
            alert_time: timestamp.format("%H:%M:%S").to_string(),
            person: person.to_string(),
            category,
            message: category.message().to_string(),
            duration_secs: duration_secs.trunc() as u64,
            real_time_duration_secs: duration_secs,
            is_reminder,
        }
    }
}

/// One classified frame from the perception layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameObservation {
    /// Capture time of the frame
    pub timestamp: DateTime<Utc>,
    /// Whether a subject was detected
    #[serde(alias = "is_present")]
    pub present: bool,
    /// Attention state of the subject (ignored when absent)
    #[serde(default, alias = "state", alias = "status")]
    pub category: BehaviorCategory,
}

/// Response to a successful session start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStarted {
    pub status: String,
    pub session_id: String,
    pub start_time: DateTime<Utc>,
    pub thresholds: Thresholds,
    pub alert_cooldown: f64,
}

/// Frozen record of a finished session, handed to report and recording consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub statistics: FocusStatistics,
    pub alert_count: usize,
    pub alerts: Vec<Alert>,
    /// Alerts recorded client-side and synced during the session (opaque)
    #[serde(default)]
    pub client_alerts: Vec<serde_json::Value>,
}

/// Alert formatted for live display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentAlert {
    pub time: String,
    pub message: String,
    #[serde(rename = "type")]
    pub severity: AlertSeverity,
    pub duration: f64,
    pub is_reminder: bool,
}

impl From<&Alert> for RecentAlert {
    fn from(alert: &Alert) -> Self {
        let duration = alert.real_time_duration_secs;
        let message = if duration > 0.0 {
            format!("{} ({:.1}s)", alert.message, duration)
        } else {
            alert.message.clone()
        };
        Self {
            time: alert.alert_time.clone(),
            message,
            severity: alert.category.severity(),
            duration,
            is_reminder: alert.is_reminder,
        }
    }
}

/// Live view of the monitored subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveStatus {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// `READY`, a behavior label, or `NO PERSON`
    pub current_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_category: Option<BehaviorCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence: Option<PresenceState>,
    /// Seconds spent in the current category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_elapsed: Option<f64>,
    /// Alert threshold for the current category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_threshold: Option<f64>,
    /// Seconds into the open absence episode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absence_elapsed: Option<f64>,
    pub total_persons: u32,
    pub focused_count: u32,
    pub alert_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<FocusStatistics>,
    pub recent_alerts: Vec<RecentAlert>,
}

/// Result of ingesting one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameOutcome {
    /// At most one alert per tracker
    pub alerts: Vec<Alert>,
    pub status: LiveStatus,
}

/// Coarse monitoring summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringStatus {
    pub is_active: bool,
    pub session_id: Option<String>,
    pub alerts_count: usize,
    pub frames_processed: u64,
    pub no_person_active: bool,
    pub alert_cooldown: f64,
    pub thresholds: Thresholds,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_behavior_label_parsing() {
        assert_eq!(BehaviorCategory::from_label("SLEEPING"), BehaviorCategory::Sleeping);
        assert_eq!(BehaviorCategory::from_label("not focused"), BehaviorCategory::NotFocused);
        assert_eq!(BehaviorCategory::from_label("NOT_FOCUSED"), BehaviorCategory::NotFocused);
        assert_eq!(BehaviorCategory::from_label("Yawning"), BehaviorCategory::Yawning);
    }

    #[test]
    fn test_unknown_label_is_focused() {
        assert_eq!(BehaviorCategory::from_label("DANCING"), BehaviorCategory::Focused);
        assert_eq!(BehaviorCategory::from_label(""), BehaviorCategory::Focused);
        assert!(!BehaviorCategory::from_label("???").is_distraction());
    }

    #[test]
    fn test_frame_observation_deserialize() {
        let json = r#"{"timestamp":"2024-01-15T14:00:00Z","is_present":true,"state":"NOT FOCUSED"}"#;
        let frame: FrameObservation = serde_json::from_str(json).unwrap();
        assert!(frame.present);
        assert_eq!(frame.category, BehaviorCategory::NotFocused);

        let json = r#"{"timestamp":"2024-01-15T14:00:00Z","present":false}"#;
        let frame: FrameObservation = serde_json::from_str(json).unwrap();
        assert!(!frame.present);
        assert_eq!(frame.category, BehaviorCategory::Focused);
    }

    #[test]
    fn test_behavior_category_serializes_as_label() {
        let json = serde_json::to_string(&BehaviorCategory::NotFocused).unwrap();
        assert_eq!(json, "\"NOT FOCUSED\"");
    }

    #[test]
    fn test_alert_truncates_duration() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 9).unwrap();
        let alert = Alert::new(AlertCategory::Sleeping, "You", 8.75, false, at);
        assert_eq!(alert.duration_secs, 8);
        assert!((alert.real_time_duration_secs - 8.75).abs() < 1e-9);
        assert_eq!(alert.alert_time, "14:00:09");
        assert_eq!(alert.message, "You are sleeping - please wake up!");

        let json: serde_json::Value = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["detection"], "SLEEPING");
        assert_eq!(json["duration"], 8);
    }

    #[test]
    fn test_recent_alert_formatting() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 4).unwrap();
        let alert = Alert::new(AlertCategory::Yawning, "You", 3.5, true, at);
        let recent = RecentAlert::from(&alert);
        assert_eq!(recent.message, "You are yawning - please take a rest! (3.5s)");
        assert_eq!(recent.severity, AlertSeverity::Warning);
        assert!(recent.is_reminder);

        let no_person = Alert::new(AlertCategory::NoPerson, "System", 10.0, false, at);
        assert_eq!(RecentAlert::from(&no_person).severity, AlertSeverity::Error);
    }
}
