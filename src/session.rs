//! Monitoring session record

use crate::alert_log::AlertLog;
use crate::statistics::{aggregate, FocusStatistics, StatisticsInput};
use crate::tracker::PresenceTracker;
use crate::types::{Alert, SessionReport};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Mutable record of one monitoring session
///
/// Created by a session start, mutated by each ingested frame and fired alert,
/// and frozen once `end_time` is set.
#[derive(Debug, Clone)]
pub struct Session {
    session_id: String,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    alerts: AlertLog,
    client_alerts: Vec<serde_json::Value>,
    total_frames: u64,
    total_detections: u64,
    last_frame_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Start a session, generating an id when the caller supplies none
    pub fn start(session_id: Option<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            start_time,
            end_time: None,
            alerts: AlertLog::new(),
            client_alerts: Vec::new(),
            total_frames: 0,
            total_detections: 0,
            last_frame_at: None,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn is_frozen(&self) -> bool {
        self.end_time.is_some()
    }

    pub fn alerts(&self) -> &AlertLog {
        &self.alerts
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Latest time recorded on this session: last frame, or start
    pub fn last_recorded_at(&self) -> DateTime<Utc> {
        self.last_frame_at.unwrap_or(self.start_time)
    }

    pub(crate) fn record_frame(&mut self, is_present: bool, at: DateTime<Utc>) {
        self.total_frames += 1;
        if is_present {
            self.total_detections += 1;
        }
        self.last_frame_at = Some(at);
    }

    pub(crate) fn append_alert(&mut self, alert: Alert) {
        self.alerts.append(alert);
    }

    pub(crate) fn set_client_alerts(&mut self, alerts: Vec<serde_json::Value>) {
        self.client_alerts = alerts;
    }

    pub(crate) fn freeze(&mut self, end_time: DateTime<Utc>) {
        self.end_time = Some(end_time);
    }

    pub fn statistics(&self, presence: &PresenceTracker, now: DateTime<Utc>) -> FocusStatistics {
        aggregate(StatisticsInput {
            alerts: &self.alerts,
            presence,
            start_time: self.start_time,
            end_time: self.end_time,
            now,
            total_frames: self.total_frames,
            total_detections: self.total_detections,
        })
    }

    /// Owned snapshot for report consumers. Callers pass the frozen end time.
    pub fn report(&self, statistics: FocusStatistics, end_time: DateTime<Utc>) -> SessionReport {
        SessionReport {
            session_id: self.session_id.clone(),
            start_time: self.start_time,
            end_time,
            statistics,
            alert_count: self.alerts.len(),
            alerts: self.alerts.to_vec(),
            client_alerts: self.client_alerts.clone(),
        }
    }
}
