//! Full-screen status views outside the page rotation.

#![allow(missing_docs)]

use chrono::{DateTime, Utc};

use crate::core::cache::BadgeCache;

use super::layout::{Frame, MARGIN_X};
use super::pages::RenderContext;
use super::surface::DrawCommand;

/// What the update-result screen reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateSummary {
    pub updated: bool,
    pub pages_cached: usize,
    pub network_unavailable: bool,
}

#[must_use]
pub fn startup_screen(ctx: &RenderContext<'_>, username: &str) -> Vec<DrawCommand> {
    let mut frame = Frame::blank(ctx.width, ctx.metrics);
    frame.text_scaled("GitHub Badge", MARGIN_X, 30, 2);
    frame.text(format!("@{username}"), MARGIN_X, 50);
    frame.text("Loading...", MARGIN_X, 65);
    frame.finish()
}

#[must_use]
pub fn updating_screen(ctx: &RenderContext<'_>) -> Vec<DrawCommand> {
    let mut frame = Frame::blank(ctx.width, ctx.metrics);
    frame.text("Updating...", MARGIN_X, 40);
    frame.text("Downloading from GitHub", MARGIN_X, 55);
    frame.finish()
}

#[must_use]
pub fn update_result_screen(ctx: &RenderContext<'_>, summary: UpdateSummary) -> Vec<DrawCommand> {
    let mut frame = Frame::blank(ctx.width, ctx.metrics);
    if summary.updated {
        frame.text("Updated", MARGIN_X, 40);
        frame.text(format!("Cache: {} pages", summary.pages_cached), MARGIN_X, 55);
    } else {
        frame.text("Update failed", MARGIN_X, 40);
        frame.text("Showing cached data", MARGIN_X, 55);
        if summary.network_unavailable {
            frame.text("No network link", MARGIN_X, 70);
        }
    }
    frame.finish()
}

/// Blocking overlay shown while the C button holds the cache view open.
#[must_use]
pub fn cache_info_screen(
    ctx: &RenderContext<'_>,
    cache: &BadgeCache,
    now: DateTime<Utc>,
) -> Vec<DrawCommand> {
    let mut frame = Frame::blank(ctx.width, ctx.metrics);
    frame.text("Cache Status", MARGIN_X, 30);
    frame.text(format!("Pages cached: {}", cache.pages_cached()), MARGIN_X, 50);
    frame.text(format!("Updates: {}", cache.fetch_count()), MARGIN_X, 65);
    if let Some(age) = cache.age(now) {
        frame.text(
            format!("Last update: {}m ago", age.as_secs() / 60),
            MARGIN_X,
            80,
        );
    }
    if let Some(data) = cache.current() {
        frame.text(
            format!("Source: {}", data.meta.source_tag.as_str()),
            MARGIN_X,
            92,
        );
    }
    frame.text(
        "Press Up/Dn/A/B to return",
        MARGIN_X,
        ctx.height as i32 - 15,
    );
    frame.finish()
}

/// Terminal screen drawn before the panel halts.
#[must_use]
pub fn error_screen(ctx: &RenderContext<'_>, code: Option<&str>) -> Vec<DrawCommand> {
    let mut frame = Frame::blank(ctx.width, ctx.metrics);
    frame.text("Error occurred", MARGIN_X, 40);
    frame.text("Power cycle to restart", MARGIN_X, 55);
    if let Some(code) = code {
        frame.text(code, MARGIN_X, 70);
    }
    frame.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{BadgeData, Page};
    use crate::render::qr::UnavailableEncoder;
    use crate::render::surface::RecordingSurface;
    use crate::render::text::FixedWidthFont;
    use chrono::TimeZone;

    const FONT: FixedWidthFont = FixedWidthFont::BITMAP6;

    fn ctx() -> RenderContext<'static> {
        RenderContext {
            width: 296,
            height: 128,
            page_index: 0,
            page_count: Page::COUNT,
            default_username: "octo",
            metrics: &FONT,
            qr: &UnavailableEncoder,
        }
    }

    #[test]
    fn update_result_reports_page_count() {
        let commands = update_result_screen(
            &ctx(),
            UpdateSummary {
                updated: true,
                pages_cached: 4,
                network_unavailable: false,
            },
        );
        assert_eq!(
            RecordingSurface::texts(&commands),
            ["Updated", "Cache: 4 pages"]
        );
    }

    #[test]
    fn failed_update_keeps_cached_data() {
        let commands = update_result_screen(
            &ctx(),
            UpdateSummary {
                updated: false,
                pages_cached: 0,
                network_unavailable: true,
            },
        );
        assert_eq!(
            RecordingSurface::texts(&commands),
            ["Update failed", "Showing cached data", "No network link"]
        );
    }

    #[test]
    fn cache_info_summarizes_cache() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut cache = BadgeCache::new();
        cache.store(BadgeData::demo("octo"), now);
        cache.store(BadgeData::demo("octo"), now);
        let later = now + chrono::TimeDelta::minutes(12);
        let commands = cache_info_screen(&ctx(), &cache, later);
        let texts = RecordingSurface::texts(&commands);
        assert!(texts.contains(&"Pages cached: 4"));
        assert!(texts.contains(&"Updates: 2"));
        assert!(texts.contains(&"Last update: 12m ago"));
        assert!(texts.contains(&"Source: demo"));
    }

    #[test]
    fn error_screen_names_the_code() {
        let commands = error_screen(&ctx(), Some("BDG-3101"));
        assert_eq!(
            RecordingSurface::texts(&commands),
            ["Error occurred", "Power cycle to restart", "BDG-3101"]
        );
    }
}
