//! Scheduler liveness model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status row name used by the keyword scheduler process.
pub const KEYWORD_SCHEDULER: &str = "keyword-scheduler";

/// Liveness record for a named scheduler process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub name: String,
    pub running: bool,
    pub last_heartbeat: Option<DateTime<Utc>>,
    /// Container ID or hostname.
    pub host: Option<String>,
    /// App version.
    pub version: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl SchedulerStatus {
    /// Create a status for the named scheduler, not yet running.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            running: false,
            last_heartbeat: None,
            host: get_hostname(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
            updated_at: Utc::now(),
        }
    }

    /// Record a heartbeat at `now`.
    pub fn beat(&mut self, now: DateTime<Utc>) {
        self.running = true;
        self.last_heartbeat = Some(now);
        self.updated_at = now;
    }

    /// Mark as stopped.
    pub fn set_stopped(&mut self, now: DateTime<Utc>) {
        self.running = false;
        self.updated_at = now;
    }

    /// Check if the scheduler is stale (no heartbeat for given duration).
    ///
    /// A scheduler that has never beaten is stale.
    pub fn is_stale(&self, threshold_secs: i64, now: DateTime<Utc>) -> bool {
        match self.last_heartbeat {
            Some(beat) => (now - beat).num_seconds() > threshold_secs,
            None => true,
        }
    }
}

/// Get the current hostname.
fn get_hostname() -> Option<String> {
    hostname::get().ok().and_then(|h| h.into_string().ok())
}
