//! Session coordinator
//!
//! Owns the monitoring lifecycle and the single lock guarding the session and
//! both trackers. Every operation, reads included, holds the lock for its whole
//! duration, so a status read never observes a tracker halfway through a
//! transition. All work under the lock is CPU-bound and short.
//!
//! Frames are routed to the presence tracker first. While the subject is
//! absent the behavior tracker is not consulted and its open category stays
//! paused until a differing category is observed.

use crate::clock::{Clock, SystemClock};
use crate::config::SentinelConfig;
use crate::error::SessionError;
use crate::session::Session;
use crate::statistics::FocusStatistics;
use crate::tracker::{BehaviorTracker, PresenceTracker};
use crate::types::{
    Alert, BehaviorCategory, FrameObservation, FrameOutcome, LiveStatus, MonitoringStatus,
    PresenceState, RecentAlert, SessionReport, SessionStarted,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything mutated by the coordinator, guarded by one mutex
#[derive(Debug)]
struct MonitorState {
    active: bool,
    session: Option<Session>,
    behavior: BehaviorTracker,
    presence: PresenceTracker,
}

impl MonitorState {
    fn new(config: &SentinelConfig) -> Self {
        Self {
            active: false,
            session: None,
            behavior: BehaviorTracker::new(config),
            presence: PresenceTracker::new(config),
        }
    }

    /// Time at which reads evaluate the session
    ///
    /// An active session is read as of its last ingested frame and a frozen one
    /// as of its end, so reads between frames always agree.
    fn read_time(&self, clock_now: DateTime<Utc>) -> DateTime<Utc> {
        match &self.session {
            Some(session) => session.end_time().unwrap_or_else(|| session.last_recorded_at()),
            None => clock_now,
        }
    }

    /// Time to stamp a new event with: the clock, but never before the last recorded frame
    fn stamp_time(&self, clock_now: DateTime<Utc>) -> DateTime<Utc> {
        match &self.session {
            Some(session) if !session.is_frozen() => clock_now.max(session.last_recorded_at()),
            _ => clock_now,
        }
    }
}

/// Coordinates one monitored subject's session
///
/// Share across threads with `Arc<SessionCoordinator>`; all methods take `&self`.
pub struct SessionCoordinator {
    config: SentinelConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<MonitorState>,
}

impl std::fmt::Debug for SessionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCoordinator")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish()
    }
}

impl Default for SessionCoordinator {
    fn default() -> Self {
        Self::new(SentinelConfig::default())
    }
}

impl SessionCoordinator {
    /// Create a coordinator reading time from a monotonic-anchored system clock
    pub fn new(config: SentinelConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Create a coordinator with a specific time source
    pub fn with_clock(config: SentinelConfig, clock: Arc<dyn Clock>) -> Self {
        let state = Mutex::new(MonitorState::new(&config));
        Self {
            config,
            clock,
            state,
        }
    }

    pub fn config(&self) -> &SentinelConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    /// Start a session, replacing any previous session and tracker state
    pub fn start_session(&self, session_id: Option<String>) -> Result<SessionStarted, SessionError> {
        let mut state = self.state.lock();
        if state.active {
            return Err(SessionError::AlreadyActive);
        }

        let now = self.clock.now();
        let session = Session::start(session_id, now);
        let session_id = session.session_id().to_string();

        *state = MonitorState::new(&self.config);
        state.session = Some(session);
        state.active = true;

        info!(session_id = %session_id, start_time = %now, "monitoring session started");

        Ok(SessionStarted {
            status: "success".to_string(),
            session_id,
            start_time: now,
            thresholds: self.config.thresholds,
            alert_cooldown: self.config.alert_cooldown_secs,
        })
    }

    /// Stop the active session and return its frozen report
    pub fn stop_session(&self) -> Result<SessionReport, SessionError> {
        let mut state = self.state.lock();
        if !state.active {
            return Err(SessionError::NotActive);
        }

        let now = state.stamp_time(self.clock.now());
        let MonitorState {
            active,
            session,
            presence,
            ..
        } = &mut *state;

        let session = session.as_mut().ok_or(SessionError::NotActive)?;
        presence.finalize(now);
        session.freeze(now);
        *active = false;

        let statistics = session.statistics(presence, now);
        let report = session.report(statistics, now);

        info!(
            session_id = %report.session_id,
            start_time = %session.start_time(),
            end_time = %now,
            alerts = report.alert_count,
            focused_secs = report.statistics.total_focused_time,
            "monitoring session stopped"
        );

        Ok(report)
    }

    /// Ingest one classified frame
    ///
    /// Without an active session this is a no-op returning no alerts. A
    /// timestamp older than the last recorded time is rejected and leaves all
    /// state untouched.
    pub fn ingest_frame(
        &self,
        is_present: bool,
        category: BehaviorCategory,
        timestamp: DateTime<Utc>,
    ) -> Result<FrameOutcome, SessionError> {
        let mut state = self.state.lock();
        self.ingest_locked(&mut state, is_present, category, timestamp)
    }

    /// Ingest a deserialized frame observation
    pub fn ingest(&self, frame: &FrameObservation) -> Result<FrameOutcome, SessionError> {
        self.ingest_frame(frame.present, frame.category, frame.timestamp)
    }

    /// Ingest a frame stamped with the coordinator's clock
    ///
    /// The stamp is taken under the same guard as the ingest, so concurrent
    /// callers are serialized in stamp order.
    pub fn ingest_frame_now(
        &self,
        is_present: bool,
        category: BehaviorCategory,
    ) -> Result<FrameOutcome, SessionError> {
        let mut state = self.state.lock();
        let now = state.stamp_time(self.clock.now());
        self.ingest_locked(&mut state, is_present, category, now)
    }

    fn ingest_locked(
        &self,
        state: &mut MonitorState,
        is_present: bool,
        category: BehaviorCategory,
        timestamp: DateTime<Utc>,
    ) -> Result<FrameOutcome, SessionError> {
        if !state.active {
            let status = self.build_status(state, timestamp);
            return Ok(FrameOutcome {
                alerts: Vec::new(),
                status,
            });
        }

        let MonitorState {
            session,
            behavior,
            presence,
            ..
        } = &mut *state;
        let session = session.as_mut().ok_or(SessionError::NotActive)?;

        let last = session.last_recorded_at();
        if timestamp < last {
            warn!(observed = %timestamp, last = %last, "rejected out-of-order frame");
            return Err(SessionError::InvalidTimestamp {
                observed: timestamp,
                last,
            });
        }

        session.record_frame(is_present, timestamp);

        let mut alerts: Vec<Alert> = Vec::with_capacity(2);
        alerts.extend(presence.observe_presence(is_present, timestamp));
        if is_present {
            alerts.extend(behavior.observe(category, timestamp));
        }

        for alert in &alerts {
            info!(
                category = alert.category.label(),
                duration_secs = alert.real_time_duration_secs,
                is_reminder = alert.is_reminder,
                "alert stored: {}",
                alert.message
            );
            session.append_alert(alert.clone());
        }

        let status = self.build_status(state, timestamp);
        Ok(FrameOutcome { alerts, status })
    }

    /// Live status snapshot
    pub fn status(&self) -> LiveStatus {
        let state = self.state.lock();
        let now = state.read_time(self.clock.now());
        self.build_status(&state, now)
    }

    /// Statistics for the current or most recently finished session
    pub fn statistics(&self) -> Option<FocusStatistics> {
        let state = self.state.lock();
        let now = state.read_time(self.clock.now());
        state
            .session
            .as_ref()
            .map(|session| session.statistics(&state.presence, now))
    }

    /// Copy of the current session's alert log
    pub fn alerts(&self) -> Vec<Alert> {
        let state = self.state.lock();
        state
            .session
            .as_ref()
            .map(|session| session.alerts().to_vec())
            .unwrap_or_default()
    }

    pub fn monitoring_status(&self) -> MonitoringStatus {
        let state = self.state.lock();
        let session = state.session.as_ref();
        MonitoringStatus {
            is_active: state.active,
            session_id: session.map(|s| s.session_id().to_string()),
            alerts_count: session.map(|s| s.alerts().len()).unwrap_or(0),
            frames_processed: session.map(|s| s.total_frames()).unwrap_or(0),
            no_person_active: state.presence.is_absent(),
            alert_cooldown: self.config.alert_cooldown_secs,
            thresholds: self.config.thresholds,
        }
    }

    /// Store client-side alerts on the active session if the session id matches
    pub fn sync_client_alerts(
        &self,
        session_id: Option<&str>,
        alerts: Vec<serde_json::Value>,
    ) -> Result<usize, SessionError> {
        let mut state = self.state.lock();
        let active = state.active;
        let current_id = state
            .session
            .as_ref()
            .map(|s| s.session_id().to_string());

        match state.session.as_mut() {
            Some(session) if active && Some(session.session_id()) == session_id => {
                let count = alerts.len();
                session.set_client_alerts(alerts);
                info!(session_id = %session.session_id(), count, "synced client alerts");
                Ok(count)
            }
            _ => {
                warn!(expected = ?current_id, got = ?session_id, "client alert sync rejected");
                Err(SessionError::SessionMismatch {
                    expected: current_id,
                    got: session_id.map(str::to_string),
                })
            }
        }
    }

    fn build_status(&self, state: &MonitorState, now: DateTime<Utc>) -> LiveStatus {
        let session = state.session.as_ref();
        let alert_count = session.map(|s| s.alerts().len()).unwrap_or(0);
        let recent_alerts = session
            .map(|s| {
                s.alerts()
                    .recent(self.config.recent_alert_limit)
                    .iter()
                    .map(RecentAlert::from)
                    .collect()
            })
            .unwrap_or_default();
        let statistics = session.map(|s| s.statistics(&state.presence, now));

        let mut status = LiveStatus {
            active: state.active,
            session_id: session.map(|s| s.session_id().to_string()),
            current_status: "READY".to_string(),
            current_category: None,
            presence: None,
            category_elapsed: None,
            category_threshold: None,
            absence_elapsed: None,
            total_persons: 0,
            focused_count: 0,
            alert_count,
            statistics,
            recent_alerts,
        };

        if !state.active {
            return status;
        }

        status.presence = state.presence.last_state();
        match status.presence {
            Some(PresenceState::Present) => {
                if let Some(category) = state.behavior.current_category() {
                    status.current_status = category.label().to_string();
                    status.current_category = Some(category);
                    status.category_elapsed = state.behavior.elapsed(now);
                    status.category_threshold = state.behavior.current_threshold();
                    status.total_persons = 1;
                    status.focused_count = u32::from(category == BehaviorCategory::Focused);
                }
            }
            Some(PresenceState::Absent) => {
                status.current_status = "NO PERSON".to_string();
                status.absence_elapsed = state.presence.absence_elapsed(now);
            }
            None => {}
        }

        status
    }
}
