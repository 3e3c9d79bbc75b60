#![forbid(unsafe_code)]

//! GitHub Badge: profile statistics on a small monochrome e-ink panel.
//!
//! Three cooperating parts:
//! 1. **Feed** fetches badge data through an ordered chain of sources
//!    (pre-generated JSON, pre-generated text, live GitHub API) and keeps
//!    the last good snapshot when every source fails.
//! 2. **Render** turns the cached snapshot into draw commands for one of
//!    four pages, plus the transient status screens.
//! 3. **UI** is a button-driven state machine that navigates pages,
//!    triggers refreshes, and schedules automatic updates.
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use github_badge::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use github_badge::core::config::Config;
//! use github_badge::render::pages::{RenderContext, render_page};
//! ```

pub mod prelude;

pub mod core;
pub mod device;
pub mod feed;
pub mod logger;
pub mod render;
#[cfg(feature = "serve")]
pub mod serve;
#[cfg(feature = "daemon")]
pub mod signals;
pub mod ui;
