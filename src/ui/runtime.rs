//! Badge runtime: owns every collaborator and executes `update()`'s commands.
//!
//! One cooperative loop: poll buttons, feed a `Poll` message to the pure
//! update function, execute the returned effects, sleep one quantum. Errors
//! escaping the loop are fatal: the error screen is drawn and the panel halts.

#![allow(missing_docs)]

use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{error, info};

use crate::core::cache::BadgeCache;
use crate::core::clock::Clock;
use crate::core::config::Config;
use crate::core::errors::{BadgeError, Result};
use crate::core::model::{BadgeData, Page};
use crate::feed::orchestrator::{FetchOrchestrator, RefreshOutcome, RefreshTrigger};
use crate::logger::activity::{ActivityEvent, ActivityLogger};
use crate::render::pages::{RenderContext, render_page};
use crate::render::qr::{QrEncoder, default_encoder};
use crate::render::screens::{
    UpdateSummary, cache_info_screen, error_screen, startup_screen, update_result_screen,
    updating_screen,
};
use crate::render::surface::{DrawCommand, Surface, replay};
use crate::render::text::FixedWidthFont;

use super::input::{InputSource, snapshot};
use super::model::{BadgeCmd, BadgeModel, BadgeMsg, Timing};
use super::update::update;

/// Why the run loop ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Signal,
    Quit,
}

impl StopReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Signal => "signal",
            Self::Quit => "quit",
        }
    }
}

pub struct BadgeRuntime<S: Surface, I: InputSource> {
    config: Config,
    cache: BadgeCache,
    model: BadgeModel,
    orchestrator: FetchOrchestrator,
    surface: S,
    input: I,
    logger: ActivityLogger,
    clock: Rc<dyn Clock>,
    qr: Box<dyn QrEncoder>,
    font: FixedWidthFont,
    shutdown: Arc<AtomicBool>,
}

impl<S: Surface, I: InputSource> BadgeRuntime<S, I> {
    #[must_use]
    pub fn new(
        config: Config,
        orchestrator: FetchOrchestrator,
        surface: S,
        input: I,
        clock: Rc<dyn Clock>,
        logger: ActivityLogger,
    ) -> Self {
        let model = BadgeModel::new(clock.now(), Timing::from_config(&config));
        Self {
            config,
            cache: BadgeCache::new(),
            model,
            orchestrator,
            surface,
            input,
            logger,
            clock,
            qr: default_encoder(),
            font: FixedWidthFont::BITMAP6,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn with_qr_encoder(mut self, qr: Box<dyn QrEncoder>) -> Self {
        self.qr = qr;
        self
    }

    /// Stop the loop when `flag` becomes true (wired to SIGINT/SIGTERM by the CLI).
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown = flag;
        self
    }

    #[must_use]
    pub fn start_on(mut self, page: Page) -> Self {
        self.model = self.model.on_page(page);
        self
    }

    #[must_use]
    pub const fn cache(&self) -> &BadgeCache {
        &self.cache
    }

    #[must_use]
    pub const fn model(&self) -> &BadgeModel {
        &self.model
    }

    #[must_use]
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    // ──────────────────── lifecycle ────────────────────

    /// Boot, loop until quit or signal, then halt the panel.
    ///
    /// Any error escaping the loop draws the error screen and halts before
    /// being returned.
    pub fn run(&mut self) -> Result<StopReason> {
        let outcome = self.boot().and_then(|()| self.run_loop());
        match outcome {
            Ok(reason) => {
                self.shutdown(reason)?;
                Ok(reason)
            }
            Err(err) => Err(self.fatal(err)),
        }
    }

    /// Startup screen, first refresh, first page.
    pub fn boot(&mut self) -> Result<()> {
        let username = self.config.profile.username.clone();
        info!(%username, version = env!("CARGO_PKG_VERSION"), "badge starting");
        self.logger.send(&ActivityEvent::BadgeStarted {
            version: env!("CARGO_PKG_VERSION").to_string(),
            config_hash: self.config.stable_hash()?,
            username: username.clone(),
        });
        self.show(|ctx, _| startup_screen(ctx, &username))?;

        let now = self.clock.now();
        self.model.last_attempt_at = Some(now);
        let outcome = self
            .orchestrator
            .refresh(&mut self.cache, now, RefreshTrigger::Boot);
        if !outcome.updated() && self.config.feed.demo_fallback && self.cache.current().is_none() {
            info!("first fetch failed, showing demo data");
            self.cache.seed_demo(BadgeData::demo(&username), now);
        }
        self.render_current()
    }

    /// One loop tick. Returns why the loop should stop, if it should.
    pub fn step(&mut self) -> Result<Option<StopReason>> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Ok(Some(StopReason::Signal));
        }
        let pressed = snapshot(&mut self.input)?;
        if self.input.quit_requested() {
            return Ok(Some(StopReason::Quit));
        }
        let cmd = update(
            &mut self.model,
            BadgeMsg::Poll {
                pressed,
                now: self.clock.now(),
                last_fetch_at: self.cache.last_fetch_at(),
            },
        );
        self.execute(cmd)?;
        Ok(None)
    }

    fn run_loop(&mut self) -> Result<StopReason> {
        let quantum = Duration::from_millis(self.config.input.poll_interval_ms);
        loop {
            if let Some(reason) = self.step()? {
                return Ok(reason);
            }
            self.clock.sleep(quantum);
        }
    }

    /// Record the stop and put the panel into its low-power state.
    pub fn shutdown(&mut self, reason: StopReason) -> Result<()> {
        let uptime = (self.clock.now() - self.model.boot_at).num_seconds().max(0);
        info!(reason = reason.as_str(), uptime_secs = uptime, "badge stopping");
        self.logger.send(&ActivityEvent::BadgeStopped {
            reason: reason.as_str().to_string(),
            uptime_secs: u64::try_from(uptime).unwrap_or(0),
        });
        self.logger.flush();
        self.surface.halt()
    }

    /// Best-effort error screen and halt. Returns the original error.
    fn fatal(&mut self, err: BadgeError) -> BadgeError {
        error!(code = err.code(), error = %err, "fatal error, halting display");
        self.logger.send(&ActivityEvent::Fatal {
            code: err.code().to_string(),
            message: err.to_string(),
        });
        let code = err.code();
        if let Err(screen_err) = self.show(|ctx, _| error_screen(ctx, Some(code))) {
            error!(error = %screen_err, "could not draw error screen");
        }
        if let Err(halt_err) = self.surface.halt() {
            error!(error = %halt_err, "could not halt display");
        }
        self.logger.flush();
        err
    }

    // ──────────────────── effects ────────────────────

    fn execute(&mut self, cmd: BadgeCmd) -> Result<()> {
        match cmd {
            BadgeCmd::None => Ok(()),
            BadgeCmd::Render => self.render_current(),
            BadgeCmd::Refresh { trigger } => self.refresh_with_feedback(trigger),
            BadgeCmd::ShowCacheInfo => {
                let now = self.clock.now();
                self.show(|ctx, cache| cache_info_screen(ctx, cache, now))
            }
            BadgeCmd::Sleep(duration) => {
                self.clock.sleep(duration);
                Ok(())
            }
            BadgeCmd::Batch(cmds) => cmds.into_iter().try_for_each(|cmd| self.execute(cmd)),
        }
    }

    fn refresh_with_feedback(&mut self, trigger: RefreshTrigger) -> Result<()> {
        let now = self.clock.now();
        if trigger == RefreshTrigger::Auto {
            let since_last_secs = self
                .cache
                .last_fetch_at()
                .and_then(|last| u64::try_from((now - last).num_seconds()).ok());
            info!(?since_last_secs, "auto refresh due");
            self.logger
                .send(&ActivityEvent::AutoRefreshDue { since_last_secs });
        }

        self.show(|ctx, _| updating_screen(ctx))?;
        let outcome = self.orchestrator.refresh(&mut self.cache, now, trigger);
        let summary = summarize(&outcome, &self.cache);
        self.show(|ctx, _| update_result_screen(ctx, summary))?;
        self.clock
            .sleep(Duration::from_millis(self.config.input.result_hold_ms));
        self.render_current()
    }

    fn render_current(&mut self) -> Result<()> {
        let page = self.model.page();
        let now = self.clock.now();
        self.show(|ctx, cache| render_page(page, ctx, cache, now))
    }

    /// Build a frame against the current context, replay it, and present.
    fn show<F>(&mut self, build: F) -> Result<()>
    where
        F: FnOnce(&RenderContext<'_>, &BadgeCache) -> Vec<DrawCommand>,
    {
        let commands = {
            let ctx = RenderContext::from_config(&self.config, &self.font, self.qr.as_ref())
                .at_index(self.model.page_index);
            build(&ctx, &self.cache)
        };
        replay(&mut self.surface, &commands)?;
        self.surface.present()
    }
}

fn summarize(outcome: &RefreshOutcome, cache: &BadgeCache) -> UpdateSummary {
    UpdateSummary {
        updated: outcome.updated(),
        pages_cached: cache.pages_cached(),
        network_unavailable: outcome.network_unavailable(),
    }
}

impl<S: Surface, I: InputSource> std::fmt::Debug for BadgeRuntime<S, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BadgeRuntime")
            .field("model", &self.model)
            .field("fetch_count", &self.cache.fetch_count())
            .field("orchestrator", &self.orchestrator)
            .finish_non_exhaustive()
    }
}
