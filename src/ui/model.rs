//! Navigation state plus the message and command vocabulary of the badge loop.

#![allow(missing_docs)]

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::core::config::Config;
use crate::core::model::Page;
use crate::feed::orchestrator::RefreshTrigger;

use super::input::ButtonSet;

// ──────────────────── state ────────────────────

/// Progress through the blocking cache-info overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayPhase {
    /// C is still held from the press that opened the overlay.
    AwaitRelease,
    /// Waiting for Up, Down, A, or B to dismiss it.
    AwaitPress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    CacheInfoOverlay(OverlayPhase),
}

/// Timing knobs the update function needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub update_interval: Duration,
    pub failure_backoff: Duration,
    pub debounce: Duration,
    pub refresh_debounce: Duration,
}

impl Timing {
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self {
            update_interval: config.refresh.update_interval(),
            failure_backoff: config.refresh.failure_backoff(),
            debounce: Duration::from_millis(config.input.debounce_ms),
            refresh_debounce: Duration::from_millis(config.input.refresh_debounce_ms),
        }
    }
}

/// Everything the navigation state machine owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeModel {
    pub page_index: usize,
    pub page_count: usize,
    pub mode: Mode,
    pub boot_at: DateTime<Utc>,
    /// When the most recent refresh (of any trigger) started.
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub timing: Timing,
}

impl BadgeModel {
    #[must_use]
    pub const fn new(boot_at: DateTime<Utc>, timing: Timing) -> Self {
        Self {
            page_index: 0,
            page_count: Page::COUNT,
            mode: Mode::Normal,
            boot_at,
            last_attempt_at: None,
            timing,
        }
    }

    /// Start on a specific page.
    #[must_use]
    pub const fn on_page(mut self, page: Page) -> Self {
        self.page_index = page as usize;
        self
    }

    #[must_use]
    pub const fn page(&self) -> Page {
        Page::from_index(self.page_index)
    }

    #[must_use]
    pub const fn in_overlay(&self) -> bool {
        matches!(self.mode, Mode::CacheInfoOverlay(_))
    }
}

// ──────────────────── messages ────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeMsg {
    /// One loop tick: the buttons read pressed, the time, and the cache's freshness.
    Poll {
        pressed: ButtonSet,
        now: DateTime<Utc>,
        last_fetch_at: Option<DateTime<Utc>>,
    },
}

// ──────────────────── commands ────────────────────

/// Effects the runtime executes on behalf of `update()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BadgeCmd {
    None,
    /// Redraw the current page from the cache.
    Render,
    /// Run the fetch chain with progress and result screens, then redraw.
    Refresh { trigger: RefreshTrigger },
    /// Draw the cache-info overlay.
    ShowCacheInfo,
    /// Block for a debounce period.
    Sleep(Duration),
    Batch(Vec<Self>),
}

impl BadgeCmd {
    /// Flatten nested batches into execution order.
    #[must_use]
    pub fn flatten(self) -> Vec<Self> {
        match self {
            Self::None => Vec::new(),
            Self::Batch(cmds) => cmds.into_iter().flat_map(Self::flatten).collect(),
            other => vec![other],
        }
    }

    /// Whether executing this command would start a refresh.
    #[must_use]
    pub fn refreshes(&self) -> bool {
        match self {
            Self::Refresh { .. } => true,
            Self::Batch(cmds) => cmds.iter().any(Self::refreshes),
            _ => false,
        }
    }
}
