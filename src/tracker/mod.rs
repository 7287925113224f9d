//! Episode trackers
//!
//! Two independent state machines feed the session alert log:
//!
//! - [`BehaviorTracker`] times how long the subject has continuously held one
//!   attention category and decides between initial and reminder alerts.
//! - [`PresenceTracker`] times absence episodes and accumulates total absence
//!   across the session.
//!
//! The session coordinator consults presence first; behavior is only observed
//! while the subject is visible.

pub mod behavior;
pub mod presence;

pub use behavior::BehaviorTracker;
pub use presence::PresenceTracker;
