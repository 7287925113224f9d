//! Behavioral category tracker
//!
//! Tracks the current attention category and when the subject entered it. An
//! alert fires once the subject has held a distraction category for its
//! threshold; while the category continues, reminders fire at most once per
//! cooldown.
//!
//! Cooldown timestamps are kept per category and cleared when the tracker
//! transitions *into* that category, not when it leaves one. Leaving a category
//! keeps its stale entry until the next entry into it, so every new visit can
//! fire a fresh initial alert.

use crate::clock::seconds_between;
use crate::config::{SentinelConfig, Thresholds};
use crate::types::{Alert, AlertCategory, BehaviorCategory};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, info};

/// State machine over the subject's attention category
#[derive(Debug, Clone)]
pub struct BehaviorTracker {
    thresholds: Thresholds,
    cooldown_secs: f64,
    subject_label: String,
    current: Option<BehaviorCategory>,
    category_start: Option<DateTime<Utc>>,
    last_alert_at: HashMap<AlertCategory, DateTime<Utc>>,
}

impl BehaviorTracker {
    pub fn new(config: &SentinelConfig) -> Self {
        Self {
            thresholds: config.thresholds,
            cooldown_secs: config.alert_cooldown_secs,
            subject_label: config.behavior_subject_label.clone(),
            current: None,
            category_start: None,
            last_alert_at: HashMap::new(),
        }
    }

    /// Record the category observed at `now`, returning an alert if one fires
    pub fn observe(&mut self, category: BehaviorCategory, now: DateTime<Utc>) -> Option<Alert> {
        if self.current != Some(category) {
            self.transition(category, now);
        }

        let alert_category = category.alert_category()?;
        let start = self.category_start?;
        let elapsed = seconds_between(start, now);

        if elapsed < self.thresholds.for_category(alert_category) {
            return None;
        }

        let is_reminder = match self.last_alert_at.get(&alert_category) {
            None => false,
            Some(last) if seconds_between(*last, now) >= self.cooldown_secs => true,
            Some(_) => return None,
        };

        self.last_alert_at.insert(alert_category, now);

        if is_reminder {
            info!(category = alert_category.label(), elapsed_secs = elapsed, "reminder alert");
        } else {
            info!(category = alert_category.label(), elapsed_secs = elapsed, "first alert");
        }

        Some(Alert::new(
            alert_category,
            &self.subject_label,
            elapsed,
            is_reminder,
            now,
        ))
    }

    fn transition(&mut self, category: BehaviorCategory, now: DateTime<Utc>) {
        if let (Some(previous), Some(start)) = (self.current, self.category_start) {
            if previous.is_distraction() {
                debug!(
                    category = previous.label(),
                    duration_secs = seconds_between(start, now),
                    "closed category episode"
                );
            }
        }
        debug!(from = ?self.current.map(|c| c.label()), to = category.label(), "category transition");

        self.current = Some(category);
        self.category_start = Some(now);

        if let Some(alert_category) = category.alert_category() {
            self.last_alert_at.remove(&alert_category);
        }
    }

    pub fn current_category(&self) -> Option<BehaviorCategory> {
        self.current
    }

    /// Seconds spent in the current category as of `now`
    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<f64> {
        self.category_start.map(|start| seconds_between(start, now))
    }

    /// Alert threshold for the current category, if it is a distraction
    pub fn current_threshold(&self) -> Option<f64> {
        self.current
            .and_then(|c| c.alert_category())
            .map(|c| self.thresholds.for_category(c))
    }

    /// When an alert last fired for `category`, if still on record
    pub fn last_alert_at(&self, category: AlertCategory) -> Option<DateTime<Utc>> {
        self.last_alert_at.get(&category).copied()
    }
}
