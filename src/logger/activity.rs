//! Semantic badge events and the shared handle that records them.
//!
//! The badge is single-threaded, so the handle is an `Rc<RefCell<_>>` around
//! one [`JsonlWriter`]. Clones share the writer. A disabled handle drops
//! everything, which is what tests and one-shot CLI commands use.

#![allow(missing_docs)]

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use crate::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};

/// Things worth recording in the activity log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityEvent {
    BadgeStarted {
        version: String,
        config_hash: String,
        username: String,
    },
    BadgeStopped {
        reason: String,
        uptime_secs: u64,
    },
    FetchSucceeded {
        source: String,
        trigger: String,
        duration_ms: u64,
        fetch_count: u64,
    },
    SourceFailed {
        source: String,
        error_code: String,
        error_message: String,
        attempts: u32,
    },
    RefreshFailed {
        trigger: String,
        details: String,
    },
    AutoRefreshDue {
        since_last_secs: Option<u64>,
    },
    Fatal {
        code: String,
        message: String,
    },
}

impl ActivityEvent {
    /// Flatten into a JSONL entry.
    #[must_use]
    pub fn to_entry(&self) -> LogEntry {
        match self {
            Self::BadgeStarted {
                version,
                config_hash,
                username,
            } => {
                let mut entry = LogEntry::new(EventType::BadgeStart, Severity::Info);
                entry.details = Some(format!(
                    "version={version} config_hash={config_hash} username={username}"
                ));
                entry
            }
            Self::BadgeStopped {
                reason,
                uptime_secs,
            } => {
                let mut entry = LogEntry::new(EventType::BadgeStop, Severity::Info);
                entry.details = Some(format!("reason={reason} uptime_secs={uptime_secs}"));
                entry
            }
            Self::FetchSucceeded {
                source,
                trigger,
                duration_ms,
                fetch_count,
            } => {
                let mut entry = LogEntry::new(EventType::FetchSuccess, Severity::Info);
                entry.source = Some(source.clone());
                entry.trigger = Some(trigger.clone());
                entry.duration_ms = Some(*duration_ms);
                entry.fetch_count = Some(*fetch_count);
                entry.ok = Some(true);
                entry
            }
            Self::SourceFailed {
                source,
                error_code,
                error_message,
                attempts,
            } => {
                let mut entry = LogEntry::new(EventType::SourceFailed, Severity::Warning);
                entry.source = Some(source.clone());
                entry.ok = Some(false);
                entry.error_code = Some(error_code.clone());
                entry.error_message = Some(error_message.clone());
                entry.details = Some(format!("attempts={attempts}"));
                entry
            }
            Self::RefreshFailed { trigger, details } => {
                let mut entry = LogEntry::new(EventType::RefreshFailed, Severity::Warning);
                entry.trigger = Some(trigger.clone());
                entry.ok = Some(false);
                entry.details = Some(details.clone());
                entry
            }
            Self::AutoRefreshDue { since_last_secs } => {
                let mut entry = LogEntry::new(EventType::AutoRefresh, Severity::Info);
                entry.trigger = Some("auto".to_string());
                entry.details = since_last_secs.map(|secs| format!("since_last_secs={secs}"));
                entry
            }
            Self::Fatal { code, message } => {
                let mut entry = LogEntry::new(EventType::Fatal, Severity::Critical);
                entry.error_code = Some(code.clone());
                entry.error_message = Some(message.clone());
                entry
            }
        }
    }
}

/// Cheaply-cloneable handle for recording activity. Never fails.
#[derive(Clone, Default)]
pub struct ActivityLogger {
    writer: Option<Rc<RefCell<JsonlWriter>>>,
}

impl ActivityLogger {
    /// Log to the given path, degrading through the writer's fallback chain.
    #[must_use]
    pub fn open(path: PathBuf) -> Self {
        Self {
            writer: Some(Rc::new(RefCell::new(JsonlWriter::open(JsonlConfig::at(
                path,
            ))))),
        }
    }

    /// A handle that records nothing.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    pub fn send(&self, event: &ActivityEvent) {
        if let Some(writer) = &self.writer
            && let Ok(mut writer) = writer.try_borrow_mut()
        {
            writer.write_entry(&event.to_entry());
        }
    }

    /// Flush and fsync; called on shutdown.
    pub fn flush(&self) {
        if let Some(writer) = &self.writer
            && let Ok(mut writer) = writer.try_borrow_mut()
        {
            writer.fsync();
        }
    }
}

impl std::fmt::Debug for ActivityLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityLogger")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
