//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::errors::{BadgeError, Result};

/// Smallest display the page layouts fit on.
pub const MIN_DISPLAY_WIDTH: u32 = 200;
pub const MIN_DISPLAY_HEIGHT: u32 = 96;

/// Longest login GitHub accepts.
const MAX_USERNAME_LEN: usize = 39;

/// Full badge configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub profile: ProfileConfig,
    pub feed: FeedConfig,
    pub refresh: RefreshConfig,
    pub input: InputConfig,
    pub display: DisplayConfig,
    pub paths: PathsConfig,
}

/// Whose badge this is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProfileConfig {
    pub username: String,
    /// Repository hosting the pre-generated feed under GitHub Pages.
    pub repo_name: String,
}

/// Kinds of feed endpoint, in the order the orchestrator may try them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    RichJson,
    SimpleText,
    GithubApi,
}

impl SourceKind {
    pub const ALL: [Self; 3] = [Self::RichJson, Self::SimpleText, Self::GithubApi];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RichJson => "rich_json",
            Self::SimpleText => "simple_text",
            Self::GithubApi => "github_api",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Feed endpoints and transport knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FeedConfig {
    /// Static feed root. Derived from the profile when unset.
    pub base_url: Option<String>,
    pub api_base: String,
    pub sources: Vec<SourceKind>,
    pub request_timeout_seconds: u64,
    /// Extra attempts per source, spent only on timeouts.
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub user_agent: String,
    /// Also fetch public events when talking to the API directly.
    pub api_events: bool,
    /// Seed placeholder data when the first fetch fails.
    pub demo_fallback: bool,
}

/// Auto-refresh schedule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RefreshConfig {
    pub update_interval_seconds: u64,
    /// Minimum gap between an attempt and the next automatic one.
    pub failure_backoff_seconds: u64,
}

/// Button polling and debounce timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InputConfig {
    pub poll_interval_ms: u64,
    pub debounce_ms: u64,
    pub refresh_debounce_ms: u64,
    /// How long the update-result screen stays up.
    pub result_hold_ms: u64,
}

/// Panel geometry in pixels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
}

/// Filesystem paths used by the badge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub activity_log: PathBuf,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            username: "Julian-Elliott".to_string(),
            repo_name: "badger-github-badge".to_string(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_base: "https://api.github.com".to_string(),
            sources: SourceKind::ALL.to_vec(),
            request_timeout_seconds: 10,
            max_retries: 3,
            retry_delay_ms: 2_000,
            user_agent: format!("github-badge/{}", env!("CARGO_PKG_VERSION")),
            api_events: false,
            demo_fallback: false,
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            update_interval_seconds: 30 * 60,
            failure_backoff_seconds: 60,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 50,
            debounce_ms: 200,
            refresh_debounce_ms: 300,
            result_hold_ms: 1_500,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 296,
            height: 128,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!(
                    "[BDG-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths"
                );
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        let cfg = home_dir
            .join(".config")
            .join("github-badge")
            .join("config.toml");
        let data = home_dir.join(".local").join("share").join("github-badge");
        Self {
            config_file: cfg,
            activity_log: data.join("activity.jsonl"),
        }
    }
}

impl FeedConfig {
    /// Static feed root, derived from the profile when not set explicitly.
    #[must_use]
    pub fn effective_base_url(&self, profile: &ProfileConfig) -> String {
        self.base_url.as_ref().map_or_else(
            || {
                format!(
                    "https://{}.github.io/{}/api",
                    profile.username.to_lowercase(),
                    profile.repo_name
                )
            },
            |url| url.trim_end_matches('/').to_string(),
        )
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl RefreshConfig {
    #[must_use]
    pub const fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_seconds)
    }

    #[must_use]
    pub const fn failure_backoff(&self) -> Duration {
        Duration::from_secs(self.failure_backoff_seconds)
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| BadgeError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(BadgeError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(env_var)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for logging.
    ///
    /// FNV-1a keeps the value stable across processes and toolchains.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    /// Render the effective config as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("BADGE_USERNAME") {
            self.profile.username = raw.trim().to_string();
        }
        if let Some(raw) = lookup("BADGE_REPO_NAME") {
            self.profile.repo_name = raw.trim().to_string();
        }
        if let Some(raw) = lookup("BADGE_UPDATE_INTERVAL_SECONDS") {
            self.refresh.update_interval_seconds =
                parse_env_u64("BADGE_UPDATE_INTERVAL_SECONDS", &raw)?;
        }
        if let Some(raw) = lookup("BADGE_REQUEST_TIMEOUT_SECONDS") {
            self.feed.request_timeout_seconds =
                parse_env_u64("BADGE_REQUEST_TIMEOUT_SECONDS", &raw)?;
        }
        if let Some(raw) = lookup("BADGE_MAX_RETRIES") {
            self.feed.max_retries = parse_env_u32("BADGE_MAX_RETRIES", &raw)?;
        }
        if let Some(raw) = lookup("BADGE_FEED_BASE_URL") {
            self.feed.base_url = Some(raw.trim().to_string());
        }
        Ok(())
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validate_username(&self.profile.username)?;

        if self.profile.repo_name.trim().is_empty() {
            return Err(BadgeError::InvalidConfig {
                details: "profile.repo_name must not be empty".to_string(),
            });
        }

        if self.refresh.update_interval_seconds == 0 {
            return Err(BadgeError::InvalidConfig {
                details: "refresh.update_interval_seconds must be > 0".to_string(),
            });
        }

        if self.feed.request_timeout_seconds == 0 {
            return Err(BadgeError::InvalidConfig {
                details: "feed.request_timeout_seconds must be > 0".to_string(),
            });
        }

        if self.feed.sources.is_empty() {
            return Err(BadgeError::InvalidConfig {
                details: "feed.sources must name at least one source".to_string(),
            });
        }
        for (i, kind) in self.feed.sources.iter().enumerate() {
            if self.feed.sources[..i].contains(kind) {
                return Err(BadgeError::InvalidConfig {
                    details: format!("feed.sources lists {kind} more than once"),
                });
            }
        }

        for (name, url) in [
            ("feed.api_base", Some(self.feed.api_base.as_str())),
            ("feed.base_url", self.feed.base_url.as_deref()),
        ] {
            if let Some(url) = url
                && !(url.starts_with("http://") || url.starts_with("https://"))
            {
                return Err(BadgeError::InvalidConfig {
                    details: format!("{name} must be an http(s) URL, got {url:?}"),
                });
            }
        }

        if self.input.poll_interval_ms == 0 {
            return Err(BadgeError::InvalidConfig {
                details: "input.poll_interval_ms must be > 0".to_string(),
            });
        }

        if self.display.width < MIN_DISPLAY_WIDTH || self.display.height < MIN_DISPLAY_HEIGHT {
            return Err(BadgeError::InvalidConfig {
                details: format!(
                    "display must be at least {MIN_DISPLAY_WIDTH}x{MIN_DISPLAY_HEIGHT}, got {}x{}",
                    self.display.width, self.display.height
                ),
            });
        }

        Ok(())
    }
}

/// Check a login against GitHub's username grammar.
pub fn validate_username(username: &str) -> Result<()> {
    static LOGIN: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = LOGIN
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9](?:-?[A-Za-z0-9])*$").ok())
        .as_ref()
        .ok_or_else(|| BadgeError::Runtime {
            details: "username pattern failed to compile".to_string(),
        })?;

    if username.len() > MAX_USERNAME_LEN || !pattern.is_match(username) {
        return Err(BadgeError::InvalidConfig {
            details: format!("profile.username {username:?} is not a valid GitHub login"),
        });
    }
    Ok(())
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env_u64(name: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|error| BadgeError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

fn parse_env_u32(name: &str, raw: &str) -> Result<u32> {
    raw.trim()
        .parse::<u32>()
        .map_err(|error| BadgeError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}
