//! Client identities used when fetching pages.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT as UA};
use serde::{Deserialize, Serialize};

pub const USER_AGENT: &str = concat!("serpwatch/", env!("CARGO_PKG_VERSION"));

/// Generic crawler user agent.
const BOT_USER_AGENT: &str = "Mozilla/5.0 (compatible; SerpwatchBot/1.0; +https://serpwatch.dev/bot)";

/// Google's desktop crawler user agent.
const GOOGLEBOT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";

/// Referer sent with every page fetch, as if arriving from a results page.
const SEARCH_REFERER: &str = "https://www.google.com/";

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Accept-Language used for unknown languages.
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Language code to Accept-Language header value.
const LOCALES: &[(&str, &str)] = &[
    ("EN", DEFAULT_ACCEPT_LANGUAGE),
    ("HI", "hi-IN,hi;q=0.9,en;q=0.8"),
    ("ES", "es-ES,es;q=0.9,en;q=0.8"),
    ("FR", "fr-FR,fr;q=0.9,en;q=0.8"),
    ("DE", "de-DE,de;q=0.9,en;q=0.8"),
    ("IT", "it-IT,it;q=0.9,en;q=0.8"),
    ("PT", "pt-BR,pt;q=0.9,en;q=0.8"),
    ("NL", "nl-NL,nl;q=0.9,en;q=0.8"),
    ("JA", "ja-JP,ja;q=0.9,en;q=0.8"),
];

/// Accept-Language value for a language code, case-insensitive.
pub fn accept_language(language: &str) -> &'static str {
    let language = language.trim();
    LOCALES
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(language))
        .map(|(_, locale)| *locale)
        .unwrap_or(DEFAULT_ACCEPT_LANGUAGE)
}

/// Who a page fetch pretends to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Identity {
    Bot,
    Googlebot,
}

impl Identity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bot => "bot",
            Self::Googlebot => "googlebot",
        }
    }

    pub fn user_agent(&self) -> &'static str {
        match self {
            Self::Bot => BOT_USER_AGENT,
            Self::Googlebot => GOOGLEBOT_USER_AGENT,
        }
    }

    /// Request headers for this identity in the given language.
    pub fn headers(&self, language: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(UA, HeaderValue::from_static(self.user_agent()));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(accept_language(language)),
        );
        headers.insert(REFERER, HeaderValue::from_static(SEARCH_REFERER));
        headers.insert(ACCEPT, HeaderValue::from_static(HTML_ACCEPT));
        headers
    }
}
