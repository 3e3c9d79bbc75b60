//! BDG-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, BadgeError>;

/// Top-level error type for the badge.
#[derive(Debug, Error)]
pub enum BadgeError {
    #[error("[BDG-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[BDG-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[BDG-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[BDG-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[BDG-2201] HTTP client setup failure: {details}")]
    HttpClient { details: String },

    #[error("[BDG-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[BDG-3101] display failure during {operation}: {details}")]
    Display {
        operation: &'static str,
        details: String,
    },

    #[error("[BDG-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl BadgeError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "BDG-1001",
            Self::MissingConfig { .. } => "BDG-1002",
            Self::ConfigParse { .. } => "BDG-1003",
            Self::Serialization { .. } => "BDG-2101",
            Self::HttpClient { .. } => "BDG-2201",
            Self::Io { .. } => "BDG-3002",
            Self::Display { .. } => "BDG-3101",
            Self::Runtime { .. } => "BDG-3900",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Display { .. } | Self::Runtime { .. })
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Convenience constructor for display-surface failures.
    #[must_use]
    pub fn display(operation: &'static str, details: impl fmt::Display) -> Self {
        Self::Display {
            operation,
            details: details.to_string(),
        }
    }
}

impl From<serde_json::Error> for BadgeError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for BadgeError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<toml::ser::Error> for BadgeError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Serialization {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<reqwest::Error> for BadgeError {
    fn from(value: reqwest::Error) -> Self {
        Self::HttpClient {
            details: value.to_string(),
        }
    }
}

// ──────────────────── fetch errors ────────────────────

/// Failure category for a single source fetch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// No network link at all; the fetch was never attempted.
    NetworkUnavailable,
    /// The request did not complete within the configured timeout.
    Timeout,
    /// The server answered with a non-2xx status.
    HttpError(u16),
    /// The payload did not satisfy the source's parse rule.
    ParseError,
}

impl FetchErrorKind {
    /// Stable machine-parseable code, used in the activity log.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NetworkUnavailable => "BDG-4001",
            Self::Timeout => "BDG-4002",
            Self::HttpError(_) => "BDG-4003",
            Self::ParseError => "BDG-4004",
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkUnavailable => f.write_str("network unavailable"),
            Self::Timeout => f.write_str("timeout"),
            Self::HttpError(status) => write!(f, "HTTP {status}"),
            Self::ParseError => f.write_str("parse error"),
        }
    }
}

/// A failed fetch against one source. Recovered locally by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{}] {source_name}: {kind}: {details}", .kind.code())]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub source_name: String,
    pub details: String,
}

impl FetchError {
    #[must_use]
    pub fn new(kind: FetchErrorKind, details: impl Into<String>) -> Self {
        Self {
            kind,
            source_name: String::new(),
            details: details.into(),
        }
    }

    #[must_use]
    pub fn parse(details: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::ParseError, details)
    }

    #[must_use]
    pub fn timeout(details: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Timeout, details)
    }

    #[must_use]
    pub fn http(status: u16, details: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::HttpError(status), details)
    }

    #[must_use]
    pub fn unavailable(details: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::NetworkUnavailable, details)
    }

    /// Attach the name of the source that produced this error.
    #[must_use]
    pub fn from_source(mut self, source_name: &str) -> Self {
        source_name.clone_into(&mut self.source_name);
        self
    }

    /// Whether another attempt at the same source might succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind, FetchErrorKind::Timeout)
    }
}
