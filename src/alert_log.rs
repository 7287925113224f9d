//! Append-only alert log for one session

use crate::types::Alert;
use serde::{Deserialize, Serialize};

/// Alerts fired during a session, in firing order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertLog {
    alerts: Vec<Alert>,
}

impl AlertLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an alert. Entries are never modified after this call.
    pub fn append(&mut self, alert: Alert) {
        self.alerts.push(alert);
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter()
    }

    /// The last `limit` alerts, oldest first
    pub fn recent(&self, limit: usize) -> &[Alert] {
        let start = self.alerts.len().saturating_sub(limit);
        &self.alerts[start..]
    }

    pub fn reminder_count(&self) -> usize {
        self.alerts.iter().filter(|a| a.is_reminder).count()
    }

    pub fn to_vec(&self) -> Vec<Alert> {
        self.alerts.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AlertCategory;
    use chrono::{Duration, TimeZone, Utc};

    fn alert(category: AlertCategory, secs: i64, is_reminder: bool) -> Alert {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap() + Duration::seconds(secs);
        Alert::new(category, "You", secs as f64, is_reminder, at)
    }

    #[test]
    fn test_recent_returns_tail_in_order() {
        let mut log = AlertLog::new();
        for i in 0..7 {
            log.append(alert(AlertCategory::Sleeping, 8 + i, i > 0));
        }

        let recent = log.recent(5);
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].duration_secs, 10);
        assert_eq!(recent[4].duration_secs, 14);
    }

    #[test]
    fn test_recent_with_short_log() {
        let mut log = AlertLog::new();
        log.append(alert(AlertCategory::Yawning, 4, false));
        assert_eq!(log.recent(5).len(), 1);
        assert!(AlertLog::new().recent(5).is_empty());
    }

    #[test]
    fn test_reminder_count() {
        let mut log = AlertLog::new();
        log.append(alert(AlertCategory::Sleeping, 8, false));
        log.append(alert(AlertCategory::NoPerson, 10, false));
        log.append(alert(AlertCategory::Sleeping, 13, true));

        assert_eq!(log.reminder_count(), 1);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_serializes_as_array() {
        let mut log = AlertLog::new();
        log.append(alert(AlertCategory::Yawning, 4, false));
        let json = serde_json::to_value(&log).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["detection"], "YAWNING");
    }
}
