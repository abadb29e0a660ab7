//! Search result models.

use serde::{Deserialize, Serialize};

/// One organic entry as returned by the search provider, before validation.
///
/// `position` and `link` may be missing; callers decide what is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganicResult {
    pub position: Option<i32>,
    pub title: Option<String>,
    pub link: Option<String>,
    pub snippet: Option<String>,
    pub raw: serde_json::Value,
}

impl OrganicResult {
    /// The position and link when both are usable.
    pub fn ranked_link(&self) -> Option<(i32, &str)> {
        let position = self.position?;
        let link = self.link.as_deref().filter(|l| !l.is_empty())?;
        Some((position, link))
    }
}

/// A persisted organic result for one keyword within one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: i64,
    pub run_id: i64,
    pub keyword_id: i64,
    pub position: i32,
    pub title: Option<String>,
    pub link: String,
    pub snippet: Option<String>,
    pub raw: serde_json::Value,
}
