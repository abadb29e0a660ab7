//! Run models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound on the stored error message of a failed run.
pub const MAX_ERROR_LEN: usize = 500;

/// Which entry point started a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    Hourly,
    Ui,
    Schedule,
    Favorites,
}

impl RunKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Ui => "ui",
            Self::Schedule => "schedule",
            Self::Favorites => "favorites",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "hourly" => Some(Self::Hourly),
            "ui" => Some(Self::Ui),
            "schedule" => Some(Self::Schedule),
            "favorites" => Some(Self::Favorites),
            _ => None,
        }
    }
}

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Success,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Whether no further transition is allowed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

/// One execution batch against one or more keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub id: i64,
    pub kind: RunKind,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl Run {
    /// Wall-clock duration, once the run has finished.
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|f| f - self.started_at)
    }
}

/// Cut an error message down to [`MAX_ERROR_LEN`] characters.
pub fn truncate_error(message: &str) -> String {
    message.chars().take(MAX_ERROR_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_kind_roundtrip() {
        for kind in [
            RunKind::Hourly,
            RunKind::Ui,
            RunKind::Schedule,
            RunKind::Favorites,
        ] {
            assert_eq!(RunKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(RunKind::from_str("weekly"), None);
    }

    #[test]
    fn test_run_status_terminal() {
        assert!(!RunStatus::Pending.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
        assert!(RunStatus::Success.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert_eq!(RunStatus::from_str("bogus"), None);
    }

    #[test]
    fn test_truncate_error() {
        let long = "x".repeat(800);
        assert_eq!(truncate_error(&long).len(), MAX_ERROR_LEN);
        assert_eq!(truncate_error("short"), "short");

        // Multi-byte characters are never split
        let wide = "é".repeat(600);
        assert_eq!(truncate_error(&wide).chars().count(), MAX_ERROR_LEN);
    }
}
