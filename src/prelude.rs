//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use github_badge::prelude::*;
//! ```

// Core
pub use crate::core::cache::{BadgeCache, PageSlice};
pub use crate::core::clock::{Clock, ManualClock, SystemClock};
pub use crate::core::config::Config;
pub use crate::core::errors::{BadgeError, FetchError, FetchErrorKind, Result};
pub use crate::core::model::{BadgeData, Page, SourceTag};

// Feed
pub use crate::feed::orchestrator::{FetchOrchestrator, RefreshOutcome, RefreshTrigger};
pub use crate::feed::transport::{OfflineTransport, ReqwestTransport, Transport};

// Logger
pub use crate::logger::activity::{ActivityEvent, ActivityLogger};

// Render
pub use crate::render::{CellCanvas, DrawCommand, RenderContext, Surface, render_page};

// UI
pub use crate::ui::{BadgeRuntime, Button, ButtonSet, InputSource, ScriptedInput, StopReason};
