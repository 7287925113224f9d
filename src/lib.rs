//! Focus Sentinel - Session engine for live attention monitoring
//!
//! Sentinel turns a stream of per-frame attention classifications into a timed,
//! de-duplicated alert log and session focus statistics: frame → presence
//! tracking → behavior tracking → alert log → statistics.
//!
//! ## Modules
//!
//! - **Trackers**: Behavior and presence state machines deciding initial and reminder alerts
//! - **Coordinator**: Lock-guarded session lifecycle shared between one frame producer and many status readers
//! - **Statistics**: Per-category distraction totals and focused time

pub mod alert_log;
pub mod clock;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod session;
pub mod statistics;
pub mod tracker;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{SentinelConfig, Thresholds};
pub use coordinator::SessionCoordinator;
pub use error::{ConfigError, SessionError};
pub use statistics::FocusStatistics;
pub use types::{
    Alert, AlertCategory, BehaviorCategory, FrameObservation, FrameOutcome, LiveStatus,
    PresenceState, SessionReport, SessionStarted,
};

/// Sentinel version embedded in reports
pub const SENTINEL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "focus-sentinel";
