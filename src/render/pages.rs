//! Page renderers: pure `(page, cache, now) -> Vec<DrawCommand>`.

#![allow(missing_docs)]

use chrono::{DateTime, Utc};

use crate::core::cache::{BadgeCache, PageEntry, PageSlice};
use crate::core::config::Config;
use crate::core::model::{Event, Page, Profile, Stats, profile_url_for};

use super::layout::{
    BLOCK_STEP, BODY_TOP, Frame, HEADER_HEIGHT, HEADER_TEXT_Y, HEADING_STEP, LINE_STEP, MARGIN_X,
    footer_top,
};
use super::qr::{QR_MODULE_PX, QrEncoder, QrGrid};
use super::surface::{DrawCommand, Pen};
use super::text::{TextMetrics, format_age, strip_scheme, truncate};

pub const NAME_BUDGET: usize = 20;
pub const REPO_BUDGET: usize = 30;
pub const EVENT_BUDGET: usize = 40;
pub const EVENTS_PER_PAGE: usize = 5;
pub const NAV_HINT: &str = "Up/Dn:Nav A:Update B:Reload C:Cache";

/// Quiet-zone border around the QR symbol, in pixels.
const QR_QUIET_PX: u32 = 2;
/// Gap between the QR symbol and the URL line.
const QR_URL_GAP: i32 = 4;

/// Everything a page needs besides the cache.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub width: u32,
    pub height: u32,
    pub page_index: usize,
    pub page_count: usize,
    pub default_username: &'a str,
    pub metrics: &'a dyn TextMetrics,
    pub qr: &'a dyn QrEncoder,
}

impl<'a> RenderContext<'a> {
    /// Context for the configured panel, starting at the first page.
    #[must_use]
    pub fn from_config(
        config: &'a Config,
        metrics: &'a dyn TextMetrics,
        qr: &'a dyn QrEncoder,
    ) -> Self {
        Self {
            width: config.display.width,
            height: config.display.height,
            page_index: 0,
            page_count: Page::COUNT,
            default_username: &config.profile.username,
            metrics,
            qr,
        }
    }

    /// Same context, pointed at another page index.
    #[must_use]
    pub const fn at_index(self, page_index: usize) -> Self {
        Self { page_index, ..self }
    }
}

impl std::fmt::Debug for RenderContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("page_index", &self.page_index)
            .field("page_count", &self.page_count)
            .field("default_username", &self.default_username)
            .finish_non_exhaustive()
    }
}

/// Draw one full page: header, body, footer.
#[must_use]
pub fn render_page(
    page: Page,
    ctx: &RenderContext<'_>,
    cache: &BadgeCache,
    now: DateTime<Utc>,
) -> Vec<DrawCommand> {
    let mut frame = Frame::blank(ctx.width, ctx.metrics);
    draw_header(&mut frame, ctx, page.title());

    let entry = cache.page(page);
    match page {
        Page::Overview => draw_overview(&mut frame, entry),
        Page::Stats => draw_stats(&mut frame, entry),
        Page::Activity => draw_activity(&mut frame, ctx, entry),
        Page::Qr => draw_qr(&mut frame, ctx, entry),
    }

    draw_footer(&mut frame, ctx, &format_age(cache.age(now)));
    frame.finish()
}

// ──────────────────── chrome ────────────────────

fn draw_header(frame: &mut Frame<'_>, ctx: &RenderContext<'_>, title: &str) {
    frame.pen(Pen::Black);
    frame.rect(0, 0, ctx.width, HEADER_HEIGHT);
    frame.pen(Pen::White);
    frame.text("GitHub", 4, HEADER_TEXT_Y);
    frame.right_aligned(
        format!("{}/{}", ctx.page_index + 1, ctx.page_count),
        4,
        HEADER_TEXT_Y,
    );
    frame.centered(title, HEADER_TEXT_Y);
    frame.pen(Pen::Black);
}

fn draw_footer(frame: &mut Frame<'_>, ctx: &RenderContext<'_>, status: &str) {
    let top = footer_top(ctx.height);
    frame.pen(Pen::Black);
    frame.text(status, MARGIN_X, top + 2);
    frame.text(NAV_HINT, MARGIN_X, top + 13);
}

// ──────────────────── pages ────────────────────

fn draw_overview(frame: &mut Frame<'_>, entry: Option<&PageEntry>) {
    let Some(PageSlice::Overview { profile, stats }) = entry.map(|entry| &entry.slice) else {
        frame.text("No data available", MARGIN_X, 50);
        frame.text("Press A to update", MARGIN_X, 65);
        return;
    };
    overview_body(frame, profile, stats);
}

fn overview_body(frame: &mut Frame<'_>, profile: &Profile, stats: &Stats) {
    let col2 = (frame.width() / 2 + 10) as i32;
    let mut y = BODY_TOP;
    frame.text(truncate(&profile.display_name, NAME_BUDGET), MARGIN_X, y);
    y += HEADING_STEP;
    frame.text(
        truncate(&format!("@{}", profile.username), EVENT_BUDGET),
        MARGIN_X,
        y,
    );
    y += BLOCK_STEP;
    frame.text(format!("Repos: {}", profile.public_repo_count), MARGIN_X, y);
    frame.text(format!("Stars: {}", stats.total_stars), col2, y);
    y += LINE_STEP;
    frame.text(format!("Followers: {}", profile.follower_count), MARGIN_X, y);
    frame.text(format!("Forks: {}", stats.total_forks), col2, y);
    if let Some(language) = stats.top_language() {
        y += LINE_STEP;
        frame.text(
            format!("Top Language: {}", truncate(language, REPO_BUDGET)),
            MARGIN_X,
            y,
        );
    }
}

fn draw_stats(frame: &mut Frame<'_>, entry: Option<&PageEntry>) {
    let Some(PageSlice::Stats { profile, stats }) = entry.map(|entry| &entry.slice) else {
        frame.text("No stats available", MARGIN_X, 50);
        return;
    };
    let mut y = BODY_TOP;
    frame.text("Repository Stats", MARGIN_X, y);
    y += HEADING_STEP;
    frame.text(format!("Total Repos: {}", profile.public_repo_count), MARGIN_X, y);
    y += LINE_STEP;
    frame.text(format!("Total Stars: {}", stats.total_stars), MARGIN_X, y);
    y += LINE_STEP;
    frame.text(format!("Total Forks: {}", stats.total_forks), MARGIN_X, y);

    if let Some(top) = &stats.most_starred {
        y += BLOCK_STEP;
        frame.text(
            format!("Most Starred: {}", truncate(&top.name, REPO_BUDGET)),
            MARGIN_X,
            y,
        );
        if let Some(stars) = top.star_count {
            y += LINE_STEP;
            frame.text(format!("{stars} stars"), MARGIN_X, y);
        }
    }
}

fn draw_activity(frame: &mut Frame<'_>, ctx: &RenderContext<'_>, entry: Option<&PageEntry>) {
    let Some(PageSlice::Activity(events)) = entry.map(|entry| &entry.slice) else {
        frame.text("No activity data", MARGIN_X, 50);
        return;
    };
    frame.text("Recent Events", MARGIN_X, BODY_TOP);
    if events.is_empty() {
        frame.text("No recent activity", MARGIN_X, BODY_TOP + HEADING_STEP);
        return;
    }
    activity_lines(frame, ctx, events);
}

fn activity_lines(frame: &mut Frame<'_>, ctx: &RenderContext<'_>, events: &[Event]) {
    let limit = footer_top(ctx.height);
    let mut y = BODY_TOP + HEADING_STEP;
    for event in events.iter().take(EVENTS_PER_PAGE) {
        if y + frame.glyph_height() > limit {
            break;
        }
        frame.text(truncate(&event.display_string, EVENT_BUDGET), MARGIN_X, y);
        y += LINE_STEP;
    }
}

fn draw_qr(frame: &mut Frame<'_>, ctx: &RenderContext<'_>, entry: Option<&PageEntry>) {
    let url = match entry.map(|entry| &entry.slice) {
        Some(PageSlice::Qr { url }) => url.clone(),
        _ => profile_url_for(ctx.default_username),
    };
    match ctx.qr.encode(&url) {
        Ok(grid) => {
            if !qr_symbol(frame, ctx, &grid, &url) {
                frame.text("QR code too large", MARGIN_X, 50);
                frame.text(truncate(strip_scheme(&url), EVENT_BUDGET), MARGIN_X, 65);
            }
        }
        Err(err) => {
            frame.text("QR code unavailable", MARGIN_X, 50);
            frame.text(truncate(&err.to_string(), EVENT_BUDGET), MARGIN_X, 65);
        }
    }
}

/// Draw the symbol and its URL. Returns false when the grid does not fit.
fn qr_symbol(frame: &mut Frame<'_>, ctx: &RenderContext<'_>, grid: &QrGrid, url: &str) -> bool {
    let Ok(modules) = u32::try_from(grid.size) else {
        return false;
    };
    let side = modules.saturating_mul(QR_MODULE_PX);
    let top = BODY_TOP;
    let available = footer_top(ctx.height) - top - QR_URL_GAP - frame.glyph_height();
    if i64::from(side) > i64::from(available) || side + 2 * QR_QUIET_PX > ctx.width {
        return false;
    }

    let left = ((ctx.width - side) / 2) as i32;
    let quiet = QR_QUIET_PX as i32;
    frame.pen(Pen::White);
    frame.rect(left - quiet, top - quiet, side + 2 * QR_QUIET_PX, side + 2 * QR_QUIET_PX);
    frame.pen(Pen::Black);
    let module = QR_MODULE_PX as i32;
    for (row, col) in grid.dark_modules() {
        frame.rect(
            left + col as i32 * module,
            top + row as i32 * module,
            QR_MODULE_PX,
            QR_MODULE_PX,
        );
    }

    let label = truncate(strip_scheme(url), (ctx.width / 6) as usize);
    frame.centered(label, top + side as i32 + QR_URL_GAP);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{BadgeData, RepoHighlight};
    use crate::render::qr::{QrError, UnavailableEncoder};
    use crate::render::surface::RecordingSurface;
    use crate::render::text::FixedWidthFont;
    use chrono::TimeZone;

    struct CheckerEncoder(usize);

    impl QrEncoder for CheckerEncoder {
        fn encode(&self, _text: &str) -> Result<QrGrid, QrError> {
            let modules = (0..self.0 * self.0).map(|i| i % 2 == 0).collect();
            QrGrid::new(self.0, modules)
        }
    }

    const FONT: FixedWidthFont = FixedWidthFont::BITMAP6;

    fn ctx<'a>(index: usize, qr: &'a dyn QrEncoder) -> RenderContext<'a> {
        RenderContext {
            width: 296,
            height: 128,
            page_index: index,
            page_count: Page::COUNT,
            default_username: "octo",
            metrics: &FONT,
            qr,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn octo_data() -> BadgeData {
        let mut data = BadgeData::demo("octo");
        data.profile.display_name = "The Octocat".to_string();
        data.profile.public_repo_count = 8;
        data.profile.follower_count = 1000;
        data.stats.total_stars = 42;
        data.stats.total_forks = 7;
        data.stats.top_language = Some("Rust".to_string());
        data.stats.most_starred = Some(RepoHighlight {
            name: "hello-world".to_string(),
            star_count: Some(30),
            url: None,
        });
        data
    }

    fn texts(commands: &[DrawCommand]) -> Vec<&str> {
        RecordingSurface::texts(commands)
    }

    #[test]
    fn overview_shows_profile_and_two_columns() {
        let mut cache = BadgeCache::new();
        cache.store(octo_data(), now());
        let commands = render_page(Page::Overview, &ctx(0, &UnavailableEncoder), &cache, now());
        let texts = texts(&commands);
        for expected in [
            "GitHub",
            "1/4",
            "Overview",
            "The Octocat",
            "@octo",
            "Repos: 8",
            "Stars: 42",
            "Followers: 1000",
            "Forks: 7",
            "Top Language: Rust",
            "Updated: 0m ago",
            NAV_HINT,
        ] {
            assert!(texts.contains(&expected), "missing {expected:?} in {texts:?}");
        }
    }

    #[test]
    fn overview_without_data_prompts_for_update() {
        let cache = BadgeCache::new();
        let commands = render_page(Page::Overview, &ctx(0, &UnavailableEncoder), &cache, now());
        let texts = texts(&commands);
        assert!(texts.contains(&"No data available"));
        assert!(texts.contains(&"Press A to update"));
        assert!(texts.contains(&"No data cached"));
    }

    #[test]
    fn long_display_name_is_truncated() {
        let mut data = octo_data();
        data.profile.display_name = "A Remarkably Long Display Name".to_string();
        let mut cache = BadgeCache::new();
        cache.store(data, now());
        let commands = render_page(Page::Overview, &ctx(0, &UnavailableEncoder), &cache, now());
        assert!(texts(&commands).contains(&"A Remarkably Long..."));
    }

    #[test]
    fn header_indicator_is_right_aligned() {
        let cache = BadgeCache::new();
        let commands = render_page(Page::Stats, &ctx(1, &UnavailableEncoder), &cache, now());
        let indicator = commands.iter().find_map(|command| match command {
            DrawCommand::Text { text, x, .. } if text == "2/4" => Some(*x),
            _ => None,
        });
        assert_eq!(indicator, Some(296 - 18 - 4));
    }

    #[test]
    fn stats_lists_totals_and_most_starred() {
        let mut cache = BadgeCache::new();
        cache.store(octo_data(), now());
        let commands = render_page(Page::Stats, &ctx(1, &UnavailableEncoder), &cache, now());
        let texts = texts(&commands);
        for expected in [
            "Repository Stats",
            "Total Repos: 8",
            "Total Stars: 42",
            "Total Forks: 7",
            "Most Starred: hello-world",
            "30 stars",
        ] {
            assert!(texts.contains(&expected), "missing {expected:?} in {texts:?}");
        }
    }

    #[test]
    fn stats_without_data() {
        let commands = render_page(
            Page::Stats,
            &ctx(1, &UnavailableEncoder),
            &BadgeCache::new(),
            now(),
        );
        assert!(texts(&commands).contains(&"No stats available"));
    }

    #[test]
    fn activity_placeholders_differ_for_empty_and_missing() {
        let ctx = ctx(2, &UnavailableEncoder);
        let missing = render_page(Page::Activity, &ctx, &BadgeCache::new(), now());
        assert!(texts(&missing).contains(&"No activity data"));

        let mut cache = BadgeCache::new();
        cache.store(octo_data(), now());
        let empty = render_page(Page::Activity, &ctx, &cache, now());
        assert!(texts(&empty).contains(&"Recent Events"));
        assert!(texts(&empty).contains(&"No recent activity"));
    }

    #[test]
    fn activity_shows_at_most_five_events() {
        let mut data = octo_data();
        data.activity = (0..10)
            .map(|i| Event::from_github_event("PushEvent", &format!("octo/repo{i}"), None))
            .collect();
        let mut cache = BadgeCache::new();
        cache.store(data, now());
        let commands = render_page(Page::Activity, &ctx(2, &UnavailableEncoder), &cache, now());
        let shown: Vec<&str> = texts(&commands)
            .into_iter()
            .filter(|text| text.contains("repo"))
            .collect();
        assert_eq!(shown.len(), 5);
        assert!(shown[0].ends_with("repo0"));
    }

    #[test]
    fn activity_stops_before_footer_on_short_panels() {
        let mut data = octo_data();
        data.activity = (0..10)
            .map(|i| Event::from_github_event("WatchEvent", &format!("octo/r{i}"), None))
            .collect();
        let mut cache = BadgeCache::new();
        cache.store(data, now());
        let short = RenderContext {
            height: 96,
            ..ctx(2, &UnavailableEncoder)
        };
        let commands = render_page(Page::Activity, &short, &cache, now());
        let limit = footer_top(96);
        let event_rows: Vec<i32> = commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Text { text, y, .. } if text.contains("Starred") => Some(*y),
                _ => None,
            })
            .collect();
        assert_eq!(event_rows, [44, 56]);
        assert!(event_rows.iter().all(|y| y + 6 <= limit));
    }

    #[test]
    fn qr_page_draws_one_rect_per_dark_module() {
        let encoder = CheckerEncoder(21);
        let mut cache = BadgeCache::new();
        cache.store(octo_data(), now());
        let commands = render_page(Page::Qr, &ctx(3, &encoder), &cache, now());
        let header_and_quiet = 2;
        let rects = commands
            .iter()
            .filter(|command| matches!(command, DrawCommand::Rect { .. }))
            .count();
        assert_eq!(rects, header_and_quiet + (21_usize * 21).div_ceil(2));
        assert!(texts(&commands).contains(&"github.com/octo"));
    }

    #[test]
    fn qr_page_falls_back_to_default_username() {
        let encoder = CheckerEncoder(21);
        let commands = render_page(Page::Qr, &ctx(3, &encoder), &BadgeCache::new(), now());
        assert!(texts(&commands).contains(&"github.com/octo"));
    }

    #[test]
    fn qr_failures_stay_on_the_page() {
        let cache = BadgeCache::new();
        let unavailable = render_page(Page::Qr, &ctx(3, &UnavailableEncoder), &cache, now());
        assert!(texts(&unavailable).contains(&"QR code unavailable"));
        assert!(texts(&unavailable).contains(&NAV_HINT));

        let huge = CheckerEncoder(57);
        let too_large = render_page(Page::Qr, &ctx(3, &huge), &cache, now());
        assert!(texts(&too_large).contains(&"QR code too large"));
    }

    #[test]
    fn rendering_is_idempotent() {
        let mut cache = BadgeCache::new();
        cache.store(octo_data(), now());
        let encoder = CheckerEncoder(25);
        for (index, page) in Page::ALL.into_iter().enumerate() {
            let ctx = ctx(index, &encoder);
            assert_eq!(
                render_page(page, &ctx, &cache, now()),
                render_page(page, &ctx, &cache, now())
            );
        }
    }

    #[test]
    fn footer_reports_hours_for_old_data() {
        let mut cache = BadgeCache::new();
        cache.store(octo_data(), now());
        let later = now() + chrono::TimeDelta::minutes(125);
        let commands = render_page(Page::Overview, &ctx(0, &UnavailableEncoder), &cache, later);
        assert!(texts(&commands).contains(&"Updated: 2h ago"));
    }
}
