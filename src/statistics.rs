//! Session focus statistics
//!
//! Distraction totals are the sum of the `real_time_duration` carried by each
//! alert of a category. Each alert reports the total time spent in the
//! category at the moment it fired, so a long episode with reminders contributes
//! several overlapping durations. Reports built on these totals depend on that
//! exact arithmetic, so it is reproduced as is rather than recomputed from
//! episode boundaries. Focused time is whatever remains of the session,
//! clamped at zero.

use crate::alert_log::AlertLog;
use crate::clock::seconds_between;
use crate::tracker::PresenceTracker;
use crate::types::AlertCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate statistics for a session, independent of the alert log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FocusStatistics {
    pub total_session_time: f64,
    pub total_focused_time: f64,
    pub total_unfocused_time: f64,
    pub total_yawning_time: f64,
    pub total_sleeping_time: f64,
    pub total_no_person_time: f64,
    pub total_alerts: usize,
    pub reminder_alerts: usize,
    pub alerts_by_category: BTreeMap<AlertCategory, usize>,
    /// Frames ingested while the session was active
    pub total_frames: u64,
    /// Frames in which a subject was present
    pub total_detections: u64,
}

impl FocusStatistics {
    /// Sum of the four distraction totals
    pub fn total_distraction_time(&self) -> f64 {
        self.total_unfocused_time
            + self.total_yawning_time
            + self.total_sleeping_time
            + self.total_no_person_time
    }
}

/// Inputs to a statistics computation
#[derive(Debug, Clone, Copy)]
pub struct StatisticsInput<'a> {
    pub alerts: &'a AlertLog,
    pub presence: &'a PresenceTracker,
    pub start_time: DateTime<Utc>,
    /// Session end, or `None` while the session is running
    pub end_time: Option<DateTime<Utc>>,
    pub now: DateTime<Utc>,
    pub total_frames: u64,
    pub total_detections: u64,
}

/// Derive statistics from the alert log and live tracker state
pub fn aggregate(input: StatisticsInput<'_>) -> FocusStatistics {
    let mut stats = FocusStatistics {
        total_frames: input.total_frames,
        total_detections: input.total_detections,
        ..Default::default()
    };

    for alert in input.alerts.iter() {
        let duration = alert.real_time_duration_secs;
        match alert.category {
            AlertCategory::NotFocused => stats.total_unfocused_time += duration,
            AlertCategory::Yawning => stats.total_yawning_time += duration,
            AlertCategory::Sleeping => stats.total_sleeping_time += duration,
            AlertCategory::NoPerson => stats.total_no_person_time += duration,
        }
        *stats.alerts_by_category.entry(alert.category).or_insert(0) += 1;
    }
    stats.total_alerts = input.alerts.len();
    stats.reminder_alerts = input.alerts.reminder_count();

    let reference = input.end_time.unwrap_or(input.now);
    if let Some(open) = input.presence.absence_elapsed(reference) {
        stats.total_no_person_time += open;
    }
    stats.total_no_person_time += input.presence.cumulative_absence_secs();

    stats.total_session_time = seconds_between(input.start_time, reference);
    stats.total_focused_time = (stats.total_session_time - stats.total_distraction_time()).max(0.0);

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::duration_from_secs;
    use crate::config::SentinelConfig;
    use crate::types::Alert;
    use chrono::TimeZone;

    fn t(secs: f64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap() + duration_from_secs(secs)
    }

    fn input<'a>(
        alerts: &'a AlertLog,
        presence: &'a PresenceTracker,
        end: Option<f64>,
        now: f64,
    ) -> StatisticsInput<'a> {
        StatisticsInput {
            alerts,
            presence,
            start_time: t(0.0),
            end_time: end.map(t),
            now: t(now),
            total_frames: 0,
            total_detections: 0,
        }
    }

    #[test]
    fn test_sums_alert_durations_per_category() {
        let mut log = AlertLog::new();
        log.append(Alert::new(AlertCategory::Sleeping, "You", 8.0, false, t(8.0)));
        log.append(Alert::new(AlertCategory::Sleeping, "You", 13.0, true, t(13.0)));
        log.append(Alert::new(AlertCategory::Yawning, "You", 3.5, false, t(20.0)));
        let presence = PresenceTracker::new(&SentinelConfig::default());

        let stats = aggregate(input(&log, &presence, Some(60.0), 60.0));
        assert_eq!(stats.total_sleeping_time, 21.0);
        assert_eq!(stats.total_yawning_time, 3.5);
        assert_eq!(stats.total_unfocused_time, 0.0);
        assert_eq!(stats.total_session_time, 60.0);
        assert_eq!(stats.total_focused_time, 60.0 - 24.5);
        assert_eq!(stats.total_alerts, 3);
        assert_eq!(stats.reminder_alerts, 1);
        assert_eq!(stats.alerts_by_category[&AlertCategory::Sleeping], 2);
    }

    #[test]
    fn test_no_person_includes_open_and_closed_episodes() {
        let mut presence = PresenceTracker::new(&SentinelConfig::default());
        presence.observe_presence(false, t(0.0));
        presence.observe_presence(true, t(5.0));
        presence.observe_presence(false, t(10.0));
        let log = AlertLog::new();

        // Open episode 10 -> 14 plus 5 closed
        let stats = aggregate(input(&log, &presence, None, 14.0));
        assert!((stats.total_no_person_time - 9.0).abs() < 1e-9);
        assert!((stats.total_focused_time - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_person_alert_durations_add_to_absence() {
        let mut presence = PresenceTracker::new(&SentinelConfig::default());
        let mut log = AlertLog::new();
        for s in 0..=12 {
            if let Some(alert) = presence.observe_presence(false, t(s as f64)) {
                log.append(alert);
            }
        }
        presence.observe_presence(true, t(12.0));

        let stats = aggregate(input(&log, &presence, Some(30.0), 30.0));
        // 10s from the alert plus 12s of closed absence
        assert!((stats.total_no_person_time - 22.0).abs() < 1e-9);
    }

    #[test]
    fn test_focused_time_clamps_to_zero() {
        let mut log = AlertLog::new();
        for i in 0..5 {
            log.append(Alert::new(AlertCategory::NotFocused, "You", 8.0 + 5.0 * i as f64, i > 0, t(8.0 + 5.0 * i as f64)));
        }
        let presence = PresenceTracker::new(&SentinelConfig::default());

        let stats = aggregate(input(&log, &presence, Some(30.0), 30.0));
        assert!(stats.total_distraction_time() > stats.total_session_time);
        assert_eq!(stats.total_focused_time, 0.0);
    }

    #[test]
    fn test_uses_end_time_when_set() {
        let log = AlertLog::new();
        let presence = PresenceTracker::new(&SentinelConfig::default());
        let stats = aggregate(input(&log, &presence, Some(10.0), 99.0));
        assert_eq!(stats.total_session_time, 10.0);
        assert_eq!(stats.total_focused_time, 10.0);
    }

    #[test]
    fn test_serializes_independently() {
        let log = AlertLog::new();
        let presence = PresenceTracker::new(&SentinelConfig::default());
        let stats = aggregate(input(&log, &presence, Some(10.0), 10.0));
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["total_focused_time"], 10.0);
        let back: FocusStatistics = serde_json::from_value(json).unwrap();
        assert_eq!(back, stats);
    }
}
