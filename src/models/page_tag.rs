//! Page tag models: canonical/hreflang signals and their dual-identity payload.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Region assigned to watch URLs created without one.
pub const DEFAULT_WATCH_REGION: &str = "US";

/// Lowercased language code to alternate URL.
pub type HreflangMap = BTreeMap<String, String>;

/// Canonical and hreflang signals extracted from one response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTags {
    pub canonical: Option<String>,
    /// `None` when the page declares no alternates.
    pub hreflang: Option<HreflangMap>,
}

/// What one client identity saw when fetching a URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityTags {
    pub canonical: Option<String>,
    pub hreflang: Option<HreflangMap>,
    pub status: Option<u16>,
    pub error: Option<String>,
}

impl IdentityTags {
    /// A fetch counts as failed when it errored or came back with a non-200 status.
    pub fn is_failure(&self) -> bool {
        self.error.is_some() || matches!(self.status, Some(status) if status != 200)
    }
}

/// Side-by-side outcome of fetching one URL as a generic bot and as Googlebot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagComparison {
    pub bot: IdentityTags,
    pub googlebot: IdentityTags,
}

impl TagComparison {
    /// Whether the two identities were served different signals.
    ///
    /// A missing hreflang map compares equal to an empty one.
    pub fn is_mismatch(&self) -> bool {
        let empty = HreflangMap::new();
        let bot_hreflang = self.bot.hreflang.as_ref().unwrap_or(&empty);
        let google_hreflang = self.googlebot.hreflang.as_ref().unwrap_or(&empty);
        self.bot.canonical != self.googlebot.canonical || bot_hreflang != google_hreflang
    }

    /// Whether either identity failed to fetch the page.
    pub fn has_failure(&self) -> bool {
        self.bot.is_failure() || self.googlebot.is_failure()
    }
}

/// Stored shape of `page_tags.raw`.
///
/// Rows written before dual-identity checks carry the flat legacy shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagPayload {
    Dual {
        bot: IdentityTags,
        googlebot: IdentityTags,
    },
    Legacy {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        canonical: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hreflang: Option<HreflangMap>,
    },
}

impl TagPayload {
    /// Both identity results, when the row holds them.
    pub fn comparison(&self) -> Option<TagComparison> {
        match self {
            Self::Dual { bot, googlebot } => Some(TagComparison {
                bot: bot.clone(),
                googlebot: googlebot.clone(),
            }),
            Self::Legacy { .. } => None,
        }
    }
}

impl From<TagComparison> for TagPayload {
    fn from(comparison: TagComparison) -> Self {
        Self::Dual {
            bot: comparison.bot,
            googlebot: comparison.googlebot,
        }
    }
}

/// A URL that has been tag-checked at least once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchUrl {
    pub id: i64,
    pub url: String,
    pub region: String,
    pub proxy_profile: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One stored tag check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTag {
    pub id: i64,
    pub run_id: i64,
    pub watch_url_id: i64,
    /// Mirrors the bot identity.
    pub canonical: Option<String>,
    /// Mirrors the bot identity.
    pub hreflang: Option<HreflangMap>,
    pub raw: TagPayload,
    pub created_at: DateTime<Utc>,
}
