//! Tracked site models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A domain flagged for hit detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedSite {
    pub id: i64,
    pub domain: String,
    pub created_at: DateTime<Utc>,
}

impl TrackedSite {
    /// Homepage URL used by the favorites sweep.
    pub fn homepage(&self) -> String {
        format!("https://{}/", self.domain)
    }
}

/// A search result that landed on a tracked domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedHit {
    pub id: i64,
    pub tracked_site_id: i64,
    pub run_id: i64,
    pub keyword_id: i64,
    pub position: i32,
    pub url: String,
    pub detected_at: DateTime<Utc>,
}
