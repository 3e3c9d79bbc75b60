//! Button fixture replay against the full runtime with a recording panel.

use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use github_badge::core::clock::{Clock, ManualClock};
use github_badge::core::config::Config;
use github_badge::core::errors::FetchError;
use github_badge::core::model::Page;
use github_badge::feed::orchestrator::FetchOrchestrator;
use github_badge::feed::transport::{FeedRequest, FeedResponse, Transport};
use github_badge::logger::activity::ActivityLogger;
use github_badge::render::qr::UnavailableEncoder;
use github_badge::render::surface::RecordingSurface;
use github_badge::ui::input::ScriptedInput;
use github_badge::ui::model::Mode;
use github_badge::ui::runtime::{BadgeRuntime, StopReason};

const FEED: &str = r#"{"profile":{"username":"octo","name":"Octo Cat","public_repos":5},"stats":{"total_stars":42},"activity":[]}"#;

struct StaticFeed;

impl Transport for StaticFeed {
    fn get(&self, request: &FeedRequest) -> Result<FeedResponse, FetchError> {
        if request.url.ends_with("badge_compact.json") {
            Ok(FeedResponse {
                status: 200,
                body: FEED.to_string(),
            })
        } else {
            Err(FetchError::http(404, request.url.clone()))
        }
    }
}

fn badge(fixture: &str) -> (BadgeRuntime<RecordingSurface, ScriptedInput>, Rc<ManualClock>) {
    let mut config = Config::default();
    config.profile.username = "octo".to_string();
    config.feed.base_url = Some("http://feed.test/api".to_string());
    config.refresh.update_interval_seconds = 60;
    config.refresh.failure_backoff_seconds = 30;
    let clock = Rc::new(ManualClock::starting_at(
        DateTime::<Utc>::from_timestamp(1_704_067_200, 0).expect("timestamp"),
    ));
    let shared: Rc<dyn Clock> = clock.clone();
    let orchestrator = FetchOrchestrator::new(
        &config,
        Box::new(StaticFeed),
        Rc::clone(&shared),
        ActivityLogger::disabled(),
    );
    let runtime = BadgeRuntime::new(
        config,
        orchestrator,
        RecordingSurface::new(),
        ScriptedInput::from_fixture(fixture),
        shared,
        ActivityLogger::disabled(),
    )
    .with_qr_encoder(Box::new(UnavailableEncoder));
    (runtime, clock)
}

#[test]
fn down_presses_wrap_back_to_overview() {
    let (mut rt, _) = badge("down down down down");
    rt.boot().unwrap();
    let mut visited = Vec::new();
    for _ in 0..4 {
        assert_eq!(rt.step().unwrap(), None);
        visited.push(rt.model().page());
    }
    assert_eq!(
        visited,
        [Page::Stats, Page::Activity, Page::Qr, Page::Overview]
    );
}

#[test]
fn up_from_first_page_wraps_to_last() {
    let (mut rt, _) = badge("up");
    rt.boot().unwrap();
    rt.step().unwrap();
    assert_eq!(rt.model().page(), Page::Qr);
    assert!(rt.surface().showed("QR Code"));
    assert!(rt.surface().showed("4/4"));
}

#[test]
fn held_buttons_resolve_by_priority() {
    let (mut rt, _) = badge("down+a");
    rt.boot().unwrap();
    rt.step().unwrap();
    assert_eq!(rt.model().page(), Page::Stats);
    assert_eq!(rt.cache().fetch_count(), 1, "A must lose to Down");
}

#[test]
fn activity_page_shows_placeholder_for_empty_events() {
    let (mut rt, _) = badge("down down");
    rt.boot().unwrap();
    rt.step().unwrap();
    rt.step().unwrap();
    assert_eq!(rt.model().page(), Page::Activity);
    let frame = rt.surface().last_frame().expect("frame");
    assert!(RecordingSurface::texts(frame).contains(&"No recent activity"));
}

#[test]
fn cache_overlay_blocks_auto_refresh_until_dismissed() {
    let (mut rt, clock) = badge("c - - b -");
    rt.boot().unwrap();
    assert_eq!(rt.cache().fetch_count(), 1);

    rt.step().unwrap();
    assert!(rt.model().in_overlay());
    assert!(rt.surface().showed("Cache Status"));
    assert!(rt.surface().showed("Pages cached: 4"));

    clock.advance(Duration::from_secs(120));
    rt.step().unwrap();
    rt.step().unwrap();
    assert!(matches!(rt.model().mode, Mode::CacheInfoOverlay(_)));
    assert_eq!(rt.cache().fetch_count(), 1, "no refresh while the overlay is up");
    assert!(!rt.surface().showed("Updating..."));

    rt.step().unwrap();
    assert_eq!(rt.model().mode, Mode::Normal);
    assert_eq!(rt.model().page(), Page::Overview, "dismissing press is consumed");

    rt.step().unwrap();
    assert_eq!(rt.cache().fetch_count(), 2);
    assert!(rt.surface().showed("Updating..."));
}

#[test]
fn script_exhaustion_quits_and_halts() {
    let (mut rt, clock) = badge("down b");
    assert_eq!(rt.run().unwrap(), StopReason::Quit);
    assert!(rt.surface().is_halted());
    assert_eq!(rt.model().page(), Page::Stats);
    assert!(clock.total_slept() >= Duration::from_millis(400));
}
