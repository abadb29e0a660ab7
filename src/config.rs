//! Configuration management for serpwatch using the prefer crate.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::http_client::RetryPolicy;
use crate::models::KeywordSpec;
use crate::providers::DEFAULT_SERPER_BASE_URL;
use crate::repository::DbContext;
use crate::scheduler::SchedulerConfig;

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "serpwatch.db";

/// Seconds without a heartbeat after which the scheduler is reported stale.
pub const DEFAULT_STALE_AFTER_SECS: i64 = 180;

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    pub database_url: Option<String>,
    /// Serper API key.
    pub serper_api_key: Option<String>,
    /// Serper API base URL.
    pub serper_base_url: String,
    /// HTTP timeout in seconds.
    pub http_timeout: u64,
    /// Attempts per search or throttled page fetch.
    pub http_retries: u32,
    /// Timezone used when displaying timestamps. Storage is always UTC.
    pub scheduler_tz: String,
    /// Seconds between schedule ticks.
    pub schedule_tick_secs: u64,
    /// Seconds between favorites sweeps.
    pub favorites_interval_secs: u64,
    /// Heartbeat age after which the scheduler counts as stale.
    pub stale_after_secs: i64,
}

impl Default for Settings {
    fn default() -> Self {
        // Falls back gracefully: data dir -> home dir -> current dir
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("serpwatch");

        Self {
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            serper_api_key: None,
            serper_base_url: DEFAULT_SERPER_BASE_URL.to_string(),
            http_timeout: 20,
            http_retries: 3,
            scheduler_tz: "UTC".to_string(),
            schedule_tick_secs: 60,
            favorites_interval_secs: 3600,
            stale_after_secs: DEFAULT_STALE_AFTER_SECS,
        }
    }
}

impl Settings {
    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        if let Some(ref url) = self.database_url {
            url.clone()
        } else {
            format!("sqlite:{}", self.database_path().display())
        }
    }

    /// Get the full path to the database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create data directory '{}': {}",
                    self.data_dir.display(),
                    e
                ),
            )
        })
    }

    /// Create a database context using the configured database URL or path.
    pub fn create_db_context(&self) -> DbContext {
        DbContext::from_url(&self.database_url())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_attempts(self.http_retries)
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            tick_interval: Duration::from_secs(self.schedule_tick_secs.max(1)),
            favorites_interval: Duration::from_secs(self.favorites_interval_secs.max(1)),
        }
    }

    /// Zone used for display. Unrecognized zones fall back to UTC.
    pub fn display_zone(&self) -> DisplayZone {
        DisplayZone::parse(&self.scheduler_tz).unwrap_or_else(|| {
            tracing::warn!(
                "Unrecognized scheduler timezone '{}', displaying UTC",
                self.scheduler_tz
            );
            DisplayZone::Named(Tz::UTC)
        })
    }

    /// Format a stored timestamp in the display timezone.
    pub fn format_local(&self, dt: DateTime<Utc>) -> String {
        self.display_zone().format(dt)
    }
}

/// A display timezone: an IANA name or a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayZone {
    Named(Tz),
    Fixed(FixedOffset),
}

impl DisplayZone {
    /// Parse an IANA name such as `Asia/Kolkata`, falling back to a fixed offset.
    pub fn parse(tz: &str) -> Option<Self> {
        let tz = tz.trim();
        if let Ok(named) = tz.parse::<Tz>() {
            return Some(Self::Named(named));
        }
        parse_utc_offset(tz).map(Self::Fixed)
    }

    /// Format `dt` with the offset in effect at that instant.
    pub fn format(&self, dt: DateTime<Utc>) -> String {
        const FORMAT: &str = "%Y-%m-%d %H:%M:%S %:z";
        match self {
            Self::Named(tz) => dt.with_timezone(tz).format(FORMAT).to_string(),
            Self::Fixed(offset) => dt.with_timezone(offset).format(FORMAT).to_string(),
        }
    }
}

/// Parse `UTC`, `Z`, or a `±HH:MM` / `±HHMM` / `±HH` offset.
pub fn parse_utc_offset(tz: &str) -> Option<FixedOffset> {
    let tz = tz.trim();
    if tz.eq_ignore_ascii_case("utc") || tz.eq_ignore_ascii_case("gmt") || tz == "Z" {
        return FixedOffset::east_opt(0);
    }

    let tz = tz
        .strip_prefix("UTC")
        .or_else(|| tz.strip_prefix("utc"))
        .unwrap_or(tz);
    let (sign, rest) = match tz.as_bytes().first()? {
        b'+' => (1, &tz[1..]),
        b'-' => (-1, &tz[1..]),
        _ => return None,
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.is_empty() || digits.len() > 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = if digits.len() <= 2 {
        (digits.parse::<i32>().ok()?, 0)
    } else {
        let split = digits.len() - 2;
        (
            digits[..split].parse::<i32>().ok()?,
            digits[split..].parse::<i32>().ok()?,
        )
    };
    if hours > 23 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// A keyword entry as written in the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct KeywordEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_profile: Option<String>,
}

impl KeywordEntry {
    pub fn normalize(&self) -> Option<KeywordSpec> {
        KeywordSpec::normalize(
            self.keyword.as_deref()?,
            self.region.as_deref()?,
            self.language.as_deref(),
            self.proxy_profile.as_deref(),
        )
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Database filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Serper API key (the environment takes precedence).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serper_api_key: Option<String>,
    /// Serper API base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serper_base_url: Option<String>,
    /// HTTP timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_timeout: Option<u64>,
    /// Attempts per search or throttled page fetch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_retries: Option<u32>,
    /// Display timezone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduler_tz: Option<String>,
    /// Seconds between schedule ticks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_tick_secs: Option<u64>,
    /// Seconds between favorites sweeps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorites_interval_secs: Option<u64>,
    /// Keywords for one-shot runs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[prefer(default)]
    pub keywords: Vec<KeywordEntry>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    #[prefer(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers serpwatch config files in standard locations.
    pub async fn load() -> Self {
        // Use prefer for file discovery, then parse with serde
        match prefer::load("serpwatch").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => Self::load_from_path(path).await.unwrap_or_else(|e| {
                    tracing::warn!("{}", e);
                    Self::default()
                }),
                None => Self::default(),
            },
            // No config file found
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML, and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
        }
        if let Some(ref database) = self.database {
            settings.database_filename = database.clone();
        }
        if let Some(ref key) = self.serper_api_key {
            settings.serper_api_key = Some(key.clone());
        }
        if let Some(ref url) = self.serper_base_url {
            settings.serper_base_url = url.clone();
        }
        if let Some(timeout) = self.http_timeout {
            settings.http_timeout = timeout;
        }
        if let Some(retries) = self.http_retries {
            settings.http_retries = retries;
        }
        if let Some(ref tz) = self.scheduler_tz {
            settings.scheduler_tz = tz.clone();
        }
        if let Some(secs) = self.schedule_tick_secs {
            settings.schedule_tick_secs = secs;
        }
        if let Some(secs) = self.favorites_interval_secs {
            settings.favorites_interval_secs = secs;
        }
    }

    /// Valid keyword entries, normalized. Invalid entries are skipped.
    pub fn normalized_keywords(&self) -> Vec<KeywordSpec> {
        let specs: Vec<KeywordSpec> = self
            .keywords
            .iter()
            .filter_map(KeywordEntry::normalize)
            .collect();
        let skipped = self.keywords.len() - specs.len();
        if skipped > 0 {
            tracing::warn!("Skipped {} keyword entries without keyword or region", skipped);
        }
        specs
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Use CWD for relative paths instead of config file directory.
    pub use_cwd: bool,
}

/// Apply environment overrides to settings.
///
/// `lookup` returns the value of a variable; empty values are ignored.
pub fn apply_env_overrides<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(key) = var("SERPER_API_KEY") {
        tracing::debug!("Using SERPER_API_KEY from environment");
        settings.serper_api_key = Some(key);
    }
    if let Some(url) = var("SERPER_BASE_URL") {
        tracing::debug!("Using SERPER_BASE_URL from environment: {}", url);
        settings.serper_base_url = url;
    }
    if let Some(url) = var("DATABASE_URL") {
        tracing::debug!("Using DATABASE_URL from environment: {}", url);
        settings.database_url = Some(url);
    }
    if let Some(timeout) = var("HTTP_TIMEOUT") {
        match timeout.trim().parse() {
            Ok(secs) => settings.http_timeout = secs,
            Err(_) => tracing::warn!("Ignoring invalid HTTP_TIMEOUT '{}'", timeout),
        }
    }
    if let Some(retries) = var("HTTP_RETRIES") {
        match retries.trim().parse() {
            Ok(n) => settings.http_retries = n,
            Err(_) => tracing::warn!("Ignoring invalid HTTP_RETRIES '{}'", retries),
        }
    }
    if let Some(tz) = var("SCHEDULER_TZ") {
        tracing::debug!("Using SCHEDULER_TZ from environment: {}", tz);
        settings.scheduler_tz = tz;
    }
}

/// Load config from the explicit path or by discovery.
async fn load_file_config(options: &LoadOptions) -> Config {
    if let Some(ref config_path) = options.config_path {
        return Config::load_from_path(config_path)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("{}", e);
                Config::default()
            });
    }
    Config::load().await
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(options: LoadOptions) -> (Settings, Config) {
    let config = load_file_config(&options).await;
    let mut settings = Settings::default();

    // Determine base directory for resolving relative paths
    let cwd = || std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let base_dir = if options.use_cwd {
        cwd()
    } else {
        config.base_dir().unwrap_or_else(cwd)
    };

    config.apply_to_settings(&mut settings, &base_dir);
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());

    (settings, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.serper_base_url, "https://google.serper.dev");
        assert_eq!(settings.http_timeout, 20);
        assert_eq!(settings.http_retries, 3);
        assert_eq!(settings.scheduler_config(), SchedulerConfig::default());
        assert!(settings.database_url().ends_with("serpwatch.db"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SERPER_API_KEY", "secret"),
            ("SERPER_BASE_URL", "http://localhost:9000"),
            ("HTTP_TIMEOUT", "5"),
            ("HTTP_RETRIES", "not-a-number"),
            ("SCHEDULER_TZ", "+05:30"),
            ("DATABASE_URL", ""),
        ]);
        let mut settings = Settings::default();
        apply_env_overrides(&mut settings, |name| env.get(name).map(|v| v.to_string()));

        assert_eq!(settings.serper_api_key.as_deref(), Some("secret"));
        assert_eq!(settings.serper_base_url, "http://localhost:9000");
        assert_eq!(settings.http_timeout, 5);
        assert_eq!(settings.http_retries, 3);
        assert_eq!(settings.scheduler_tz, "+05:30");
        assert!(settings.database_url.is_none());
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(parse_utc_offset("UTC").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_utc_offset("+05:30").unwrap().local_minus_utc(), 19800);
        assert_eq!(parse_utc_offset("-0800").unwrap().local_minus_utc(), -28800);
        assert_eq!(parse_utc_offset("UTC+2").unwrap().local_minus_utc(), 7200);
        assert!(parse_utc_offset("Asia/Kolkata").is_none());
        assert!(parse_utc_offset("+25:00").is_none());
    }

    #[test]
    fn test_display_zone_accepts_names_and_offsets() {
        use chrono::TimeZone;
        let dt = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

        let kolkata = DisplayZone::parse("Asia/Kolkata").unwrap();
        assert_eq!(kolkata, DisplayZone::Named(chrono_tz::Asia::Kolkata));
        assert_eq!(kolkata.format(dt), "2026-01-01 05:30:00 +05:30");

        let fixed = DisplayZone::parse("-0800").unwrap();
        assert_eq!(fixed.format(dt), "2025-12-31 16:00:00 -08:00");

        assert!(DisplayZone::parse("Mars/Olympus").is_none());
    }

    #[test]
    fn test_named_zone_follows_daylight_saving() {
        use chrono::TimeZone;
        let settings = Settings {
            scheduler_tz: "America/New_York".into(),
            ..Default::default()
        };
        let winter = Utc.with_ymd_and_hms(2026, 1, 15, 17, 0, 0).unwrap();
        let summer = Utc.with_ymd_and_hms(2026, 7, 15, 16, 0, 0).unwrap();
        assert_eq!(settings.format_local(winter), "2026-01-15 12:00:00 -05:00");
        assert_eq!(settings.format_local(summer), "2026-07-15 12:00:00 -04:00");
    }

    #[test]
    fn test_unknown_zone_displays_utc() {
        use chrono::TimeZone;
        let settings = Settings {
            scheduler_tz: "Nowhere/Special".into(),
            ..Default::default()
        };
        let dt = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(settings.format_local(dt), "2026-01-01 00:00:00 +00:00");
    }

    #[test]
    fn test_format_local() {
        use chrono::TimeZone;
        let settings = Settings {
            scheduler_tz: "+05:30".into(),
            ..Default::default()
        };
        let dt = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(settings.format_local(dt), "2026-01-01 05:30:00 +05:30");
    }

    #[tokio::test]
    async fn test_load_toml_with_keywords() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("serpwatch.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "./data"
http_timeout = 7

[[keywords]]
keyword = " seo tools "
region = "IN"

[[keywords]]
keyword = "no region"

[[keywords]]
keyword = "rank tracker"
region = "US"
language = "ES"
proxy_profile = ""
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, &config.base_dir().unwrap());

        assert_eq!(settings.data_dir, dir.path().join("./data"));
        assert_eq!(settings.http_timeout, 7);

        let specs = config.normalized_keywords();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].keyword, "seo tools");
        assert_eq!(specs[0].language, "EN");
        assert_eq!(specs[1].language, "ES");
        assert_eq!(specs[1].proxy_profile, None);
    }

    #[tokio::test]
    async fn test_load_yaml_and_json() {
        let dir = tempdir().unwrap();

        let yaml = dir.path().join("c.yaml");
        std::fs::write(&yaml, "scheduler_tz: \"+01:00\"\nkeywords:\n  - keyword: a\n    region: DE\n").unwrap();
        let config = Config::load_from_path(&yaml).await.unwrap();
        assert_eq!(config.scheduler_tz.as_deref(), Some("+01:00"));
        assert_eq!(config.normalized_keywords().len(), 1);

        let json = dir.path().join("c.json");
        std::fs::write(&json, r#"{"http_retries": 5}"#).unwrap();
        let config = Config::load_from_path(&json).await.unwrap();
        assert_eq!(config.http_retries, Some(5));
    }

    #[tokio::test]
    async fn test_load_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();
        assert!(Config::load_from_path(&path).await.is_err());
        assert!(Config::load_from_path(&dir.path().join("missing.json"))
            .await
            .is_err());
    }
}
