//! Keyword models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Language used when a keyword entry does not name one.
pub const DEFAULT_LANGUAGE: &str = "EN";

/// A tracked search phrase.
///
/// Identity is the `(keyword, region, language, proxy_profile)` tuple; rows are
/// created lazily the first time a combination is seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub id: i64,
    pub keyword: String,
    pub region: String,
    pub language: String,
    pub proxy_profile: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Keyword {
    /// The identity tuple for this keyword.
    pub fn spec(&self) -> KeywordSpec {
        KeywordSpec {
            keyword: self.keyword.clone(),
            region: self.region.clone(),
            language: self.language.clone(),
            proxy_profile: self.proxy_profile.clone(),
        }
    }
}

/// A normalized keyword entry, ready to be resolved to a [`Keyword`] row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeywordSpec {
    pub keyword: String,
    pub region: String,
    pub language: String,
    pub proxy_profile: Option<String>,
}

impl KeywordSpec {
    /// Normalize raw entry fields.
    ///
    /// Returns `None` when the keyword or region is blank. A missing or blank
    /// language falls back to [`DEFAULT_LANGUAGE`]; a blank proxy profile is
    /// treated as absent.
    pub fn normalize(
        keyword: &str,
        region: &str,
        language: Option<&str>,
        proxy_profile: Option<&str>,
    ) -> Option<Self> {
        let keyword = keyword.trim();
        let region = region.trim();
        if keyword.is_empty() || region.is_empty() {
            return None;
        }

        let language = language
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LANGUAGE);
        let proxy_profile = proxy_profile
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        Some(Self {
            keyword: keyword.to_string(),
            region: region.to_string(),
            language: language.to_string(),
            proxy_profile,
        })
    }
}
