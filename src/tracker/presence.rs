//! Subject presence tracker
//!
//! An absence episode opens on the first frame without a subject and closes on
//! the next frame with one. Closing an episode folds its length into the
//! session's cumulative absence and resets the alert clock, so the next
//! episode starts fresh.

use crate::clock::seconds_between;
use crate::config::SentinelConfig;
use crate::types::{Alert, AlertCategory, PresenceState};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// State machine over subject presence
#[derive(Debug, Clone)]
pub struct PresenceTracker {
    threshold_secs: f64,
    cooldown_secs: f64,
    subject_label: String,
    active: bool,
    absence_start: Option<DateTime<Utc>>,
    last_alert_at: Option<DateTime<Utc>>,
    cumulative_absence_secs: f64,
    last_state: Option<PresenceState>,
}

impl PresenceTracker {
    pub fn new(config: &SentinelConfig) -> Self {
        Self {
            threshold_secs: config.thresholds.no_person,
            cooldown_secs: config.alert_cooldown_secs,
            subject_label: config.system_subject_label.clone(),
            active: false,
            absence_start: None,
            last_alert_at: None,
            cumulative_absence_secs: 0.0,
            last_state: None,
        }
    }

    /// Record whether a subject is visible at `now`, returning a NO PERSON alert if one fires
    pub fn observe_presence(&mut self, is_present: bool, now: DateTime<Utc>) -> Option<Alert> {
        self.last_state = Some(PresenceState::from(is_present));

        if is_present {
            self.close_episode(now);
            return None;
        }

        if !self.active {
            self.active = true;
            self.absence_start = Some(now);
            debug!("absence episode opened");
            return None;
        }

        let start = self.absence_start?;
        let elapsed = seconds_between(start, now);
        if elapsed < self.threshold_secs {
            return None;
        }

        let is_reminder = match self.last_alert_at {
            None => false,
            Some(last) if seconds_between(last, now) >= self.cooldown_secs => true,
            Some(_) => return None,
        };

        self.last_alert_at = Some(now);

        if is_reminder {
            info!(elapsed_secs = elapsed, "reminder NO PERSON alert");
        } else {
            info!(elapsed_secs = elapsed, "first NO PERSON alert");
        }

        Some(Alert::new(
            AlertCategory::NoPerson,
            &self.subject_label,
            elapsed,
            is_reminder,
            now,
        ))
    }

    /// Fold any open absence episode into the cumulative total without alerting
    pub fn finalize(&mut self, now: DateTime<Utc>) {
        self.close_episode(now);
    }

    fn close_episode(&mut self, now: DateTime<Utc>) {
        if !self.active {
            return;
        }

        if let Some(start) = self.absence_start {
            let duration = seconds_between(start, now);
            self.cumulative_absence_secs += duration;
            debug!(
                duration_secs = duration,
                total_secs = self.cumulative_absence_secs,
                "absence episode closed"
            );
        }

        self.active = false;
        self.absence_start = None;
        self.last_alert_at = None;
    }

    /// True while an absence episode is open
    pub fn is_absent(&self) -> bool {
        self.active
    }

    /// Presence reported by the most recent frame
    pub fn last_state(&self) -> Option<PresenceState> {
        self.last_state
    }

    /// Seconds into the open absence episode, if any
    pub fn absence_elapsed(&self, now: DateTime<Utc>) -> Option<f64> {
        if !self.active {
            return None;
        }
        self.absence_start.map(|start| seconds_between(start, now))
    }

    /// Absence accumulated from closed episodes
    pub fn cumulative_absence_secs(&self) -> f64 {
        self.cumulative_absence_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::duration_from_secs;
    use chrono::TimeZone;

    fn t(secs: f64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap() + duration_from_secs(secs)
    }

    fn tracker() -> PresenceTracker {
        PresenceTracker::new(&SentinelConfig::default())
    }

    fn absent(tracker: &mut PresenceTracker, from: f64, to: f64, step: f64) -> Vec<Alert> {
        let mut alerts = Vec::new();
        let mut s = from;
        while s <= to + 1e-9 {
            alerts.extend(tracker.observe_presence(false, t(s)));
            s += step;
        }
        alerts
    }

    #[test]
    fn test_short_absence_accumulates_without_alert() {
        let mut tracker = tracker();
        let alerts = absent(&mut tracker, 0.0, 4.0, 1.0);
        assert!(alerts.is_empty());
        assert!(tracker.is_absent());

        assert!(tracker.observe_presence(true, t(5.0)).is_none());
        assert!(!tracker.is_absent());
        assert!((tracker.cumulative_absence_secs() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_two_episodes_accumulate() {
        let mut tracker = tracker();
        absent(&mut tracker, 0.0, 4.0, 1.0);
        tracker.observe_presence(true, t(5.0));

        let alerts = absent(&mut tracker, 20.0, 31.0, 1.0);
        assert_eq!(alerts.len(), 1);
        assert!(!alerts[0].is_reminder);
        assert_eq!(alerts[0].category, AlertCategory::NoPerson);
        assert_eq!(alerts[0].person, "System");

        tracker.observe_presence(true, t(32.0));
        assert!((tracker.cumulative_absence_secs() - 17.0).abs() < 1e-9);
    }

    #[test]
    fn test_reminder_after_cooldown() {
        let mut tracker = tracker();
        let alerts = absent(&mut tracker, 0.0, 20.0, 1.0);
        assert_eq!(alerts.len(), 3);
        assert!(!alerts[0].is_reminder);
        assert_eq!(alerts[0].duration_secs, 10);
        assert!(alerts[1].is_reminder);
        assert_eq!(alerts[1].duration_secs, 15);
        assert_eq!(alerts[2].duration_secs, 20);
    }

    #[test]
    fn test_new_episode_starts_fresh() {
        let mut tracker = tracker();
        absent(&mut tracker, 0.0, 10.0, 1.0);
        tracker.observe_presence(true, t(11.0));

        let alerts = absent(&mut tracker, 12.0, 22.0, 1.0);
        assert_eq!(alerts.len(), 1);
        assert!(!alerts[0].is_reminder);
    }

    #[test]
    fn test_finalize_folds_open_episode() {
        let mut tracker = tracker();
        absent(&mut tracker, 0.0, 3.0, 1.0);
        tracker.finalize(t(7.5));
        assert!(!tracker.is_absent());
        assert!((tracker.cumulative_absence_secs() - 7.5).abs() < 1e-9);

        // Finalizing twice adds nothing
        tracker.finalize(t(9.0));
        assert!((tracker.cumulative_absence_secs() - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_presence_without_episode_is_noop() {
        let mut tracker = tracker();
        assert!(tracker.observe_presence(true, t(1.0)).is_none());
        assert_eq!(tracker.cumulative_absence_secs(), 0.0);
        assert_eq!(tracker.last_state(), Some(PresenceState::Present));
        assert_eq!(tracker.absence_elapsed(t(2.0)), None);
    }
}
