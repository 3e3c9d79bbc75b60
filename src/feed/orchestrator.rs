//! Tiered fetch: try each configured source in priority order, store the first success.

#![allow(missing_docs)]

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::cache::BadgeCache;
use crate::core::clock::Clock;
use crate::core::config::{Config, SourceKind};
use crate::core::errors::{FetchError, FetchErrorKind};
use crate::core::model::{BadgeData, SourceTag};
use crate::feed::source::{self, FetchOptions, SourceDescriptor};
use crate::feed::transport::Transport;
use crate::logger::activity::{ActivityEvent, ActivityLogger};

/// What started a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshTrigger {
    Boot,
    Manual,
    Auto,
}

impl RefreshTrigger {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boot => "boot",
            Self::Manual => "manual",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for RefreshTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Source that produced the stored snapshot, if any.
    pub source: Option<SourceKind>,
    /// One error per failed source, in attempt order.
    pub errors: Vec<FetchError>,
    /// Cache fetch count after the cycle.
    pub fetch_count: u64,
    pub duration: Duration,
}

impl RefreshOutcome {
    /// Whether the cache was written.
    #[must_use]
    pub const fn updated(&self) -> bool {
        self.source.is_some()
    }

    /// Whether the cycle was skipped for lack of a network link.
    #[must_use]
    pub fn network_unavailable(&self) -> bool {
        self.source.is_none()
            && self
                .errors
                .iter()
                .any(|error| error.kind == FetchErrorKind::NetworkUnavailable)
    }
}

/// Per-source diagnostic from [`FetchOrchestrator::probe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub source: SourceKind,
    pub url: String,
    pub latency: Duration,
    pub result: Result<SourceTag, FetchError>,
}

/// Drives the source fallback chain and owns the only write path into the cache.
pub struct FetchOrchestrator {
    transport: Box<dyn Transport>,
    clock: Rc<dyn Clock>,
    sources: Vec<SourceDescriptor>,
    options: FetchOptions,
    max_retries: u32,
    retry_delay: Duration,
    logger: ActivityLogger,
}

impl FetchOrchestrator {
    #[must_use]
    pub fn new(
        config: &Config,
        transport: Box<dyn Transport>,
        clock: Rc<dyn Clock>,
        logger: ActivityLogger,
    ) -> Self {
        Self {
            transport,
            clock,
            sources: source::descriptors_from_config(config),
            options: FetchOptions::from_config(config),
            max_retries: config.feed.max_retries,
            retry_delay: config.feed.retry_delay(),
            logger,
        }
    }

    #[must_use]
    pub fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    /// Try sources in order and store the first success in `cache`.
    ///
    /// On total failure the cache is left untouched.
    pub fn refresh(
        &self,
        cache: &mut BadgeCache,
        now: DateTime<Utc>,
        trigger: RefreshTrigger,
    ) -> RefreshOutcome {
        let started = self.clock.now();

        if !self.transport.link_available() {
            warn!(%trigger, "no network link, refresh skipped");
            self.logger.send(&ActivityEvent::RefreshFailed {
                trigger: trigger.to_string(),
                details: "network unavailable".to_string(),
            });
            return RefreshOutcome {
                source: None,
                errors: vec![FetchError::unavailable("no network link").from_source("network")],
                fetch_count: cache.fetch_count(),
                duration: Duration::ZERO,
            };
        }

        let mut errors = Vec::new();
        for descriptor in &self.sources {
            let attempt_started = self.clock.now();
            match self.fetch_with_retries(descriptor) {
                Ok(data) => {
                    cache.store(data, now);
                    let duration = elapsed(self.clock.now(), attempt_started);
                    info!(
                        source = descriptor.name(),
                        %trigger,
                        duration_ms = millis(duration),
                        fetch_count = cache.fetch_count(),
                        "refresh succeeded"
                    );
                    self.logger.send(&ActivityEvent::FetchSucceeded {
                        source: descriptor.name().to_string(),
                        trigger: trigger.to_string(),
                        duration_ms: millis(duration),
                        fetch_count: cache.fetch_count(),
                    });
                    return RefreshOutcome {
                        source: Some(descriptor.kind),
                        errors,
                        fetch_count: cache.fetch_count(),
                        duration: elapsed(self.clock.now(), started),
                    };
                }
                Err((error, attempts)) => {
                    warn!(source = descriptor.name(), attempts, %error, "source failed");
                    self.logger.send(&ActivityEvent::SourceFailed {
                        source: descriptor.name().to_string(),
                        error_code: error.kind.code().to_string(),
                        error_message: error.details.clone(),
                        attempts,
                    });
                    errors.push(error);
                }
            }
        }

        warn!(%trigger, failed = errors.len(), "all sources failed, keeping cached data");
        self.logger.send(&ActivityEvent::RefreshFailed {
            trigger: trigger.to_string(),
            details: format!("{} sources failed", errors.len()),
        });
        RefreshOutcome {
            source: None,
            errors,
            fetch_count: cache.fetch_count(),
            duration: elapsed(self.clock.now(), started),
        }
    }

    /// Contact every source once, independently, without touching any cache.
    #[must_use]
    pub fn probe(&self) -> Vec<ProbeReport> {
        self.sources
            .iter()
            .map(|descriptor| {
                let started = self.clock.now();
                let result = source::fetch(descriptor, &*self.transport, &self.options)
                    .map(|data| data.meta.source_tag);
                ProbeReport {
                    source: descriptor.kind,
                    url: descriptor.url.clone(),
                    latency: elapsed(self.clock.now(), started),
                    result,
                }
            })
            .collect()
    }

    /// One source with timeout-only retries. Returns the error and attempt count on failure.
    fn fetch_with_retries(
        &self,
        descriptor: &SourceDescriptor,
    ) -> Result<BadgeData, (FetchError, u32)> {
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            match source::fetch(descriptor, &*self.transport, &self.options) {
                Ok(data) => return Ok(data),
                Err(error) if error.is_retryable() && attempts <= self.max_retries => {
                    debug!(
                        source = descriptor.name(),
                        attempt = attempts,
                        delay_ms = millis(self.retry_delay),
                        "timeout, retrying"
                    );
                    self.clock.sleep(self.retry_delay);
                }
                Err(error) => return Err((error, attempts)),
            }
        }
    }
}

impl fmt::Debug for FetchOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOrchestrator")
            .field("sources", &self.sources)
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .finish_non_exhaustive()
    }
}

fn elapsed(end: DateTime<Utc>, start: DateTime<Utc>) -> Duration {
    (end - start).to_std().unwrap_or(Duration::ZERO)
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::feed::transport::{FeedRequest, FeedResponse};
    use std::cell::RefCell;

    /// Replays one scripted result per call, per URL suffix.
    struct Scripted {
        link: bool,
        script: RefCell<Vec<(&'static str, Result<FeedResponse, FetchError>)>>,
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl Transport for Scripted {
        fn get(&self, request: &FeedRequest) -> Result<FeedResponse, FetchError> {
            self.calls.borrow_mut().push(request.url.clone());
            let mut script = self.script.borrow_mut();
            let index = script
                .iter()
                .position(|(suffix, _)| request.url.ends_with(suffix));
            index.map_or_else(
                || Err(FetchError::http(404, request.url.clone())),
                |i| script.remove(i).1,
            )
        }

        fn link_available(&self) -> bool {
            self.link
        }
    }

    fn ok(body: &str) -> Result<FeedResponse, FetchError> {
        Ok(FeedResponse {
            status: 200,
            body: body.to_string(),
        })
    }

    fn orchestrator(
        link: bool,
        script: Vec<(&'static str, Result<FeedResponse, FetchError>)>,
        max_retries: u32,
    ) -> (FetchOrchestrator, Rc<RefCell<Vec<String>>>, Rc<ManualClock>) {
        let mut config = Config::default();
        config.profile.username = "octo".to_string();
        config.feed.base_url = Some("http://feed.test/api".to_string());
        config.feed.api_base = "http://api.test".to_string();
        config.feed.max_retries = max_retries;
        let calls = Rc::new(RefCell::new(Vec::new()));
        let transport = Scripted {
            link,
            script: RefCell::new(script),
            calls: Rc::clone(&calls),
        };
        let clock = Rc::new(ManualClock::starting_at(
            DateTime::<Utc>::from_timestamp(1_700_000_000, 0).expect("ts"),
        ));
        let orch = FetchOrchestrator::new(
            &config,
            Box::new(transport),
            clock.clone(),
            ActivityLogger::disabled(),
        );
        (orch, calls, clock)
    }

    const SIMPLE: &str = "octo\nOcto\n1\n2\n3\n4\n5\nRust\n";

    #[test]
    fn first_success_stops_the_chain() {
        let (orch, calls, _) = orchestrator(
            true,
            vec![("badge_compact.json", ok(r#"{"profile": {"username": "octo"}}"#))],
            0,
        );
        let mut cache = BadgeCache::new();
        let outcome = orch.refresh(&mut cache, Utc::now(), RefreshTrigger::Manual);
        assert!(outcome.updated());
        assert_eq!(outcome.source, Some(SourceKind::RichJson));
        assert_eq!(calls.borrow().len(), 1);
        assert_eq!(cache.fetch_count(), 1);
    }

    #[test]
    fn falls_through_to_simple_text() {
        let (orch, calls, _) = orchestrator(
            true,
            vec![
                ("badge_compact.json", ok("[]")),
                ("badge_simple.txt", ok(SIMPLE)),
            ],
            0,
        );
        let mut cache = BadgeCache::new();
        let outcome = orch.refresh(&mut cache, Utc::now(), RefreshTrigger::Auto);
        assert_eq!(outcome.source, Some(SourceKind::SimpleText));
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].source_name, "rich_json");
        assert_eq!(calls.borrow().len(), 2);
        assert!(!calls.borrow().iter().any(|url| url.starts_with("http://api.test")));
    }

    #[test]
    fn total_failure_leaves_cache_untouched() {
        let (orch, _, _) = orchestrator(true, Vec::new(), 0);
        let mut cache = BadgeCache::new();
        let outcome = orch.refresh(&mut cache, Utc::now(), RefreshTrigger::Manual);
        assert!(!outcome.updated());
        assert_eq!(outcome.errors.len(), 3);
        assert!(cache.current().is_none());
        assert_eq!(cache.fetch_count(), 0);
    }

    #[test]
    fn no_link_contacts_nothing() {
        let (orch, calls, _) = orchestrator(false, vec![("badge_simple.txt", ok(SIMPLE))], 0);
        let mut cache = BadgeCache::new();
        let outcome = orch.refresh(&mut cache, Utc::now(), RefreshTrigger::Boot);
        assert!(outcome.network_unavailable());
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn timeouts_are_retried_with_delay() {
        let (orch, calls, clock) = orchestrator(
            true,
            vec![
                ("badge_compact.json", Err(FetchError::timeout("slow"))),
                ("badge_compact.json", Err(FetchError::timeout("slow"))),
                ("badge_compact.json", ok(r#"{"profile": {}}"#)),
            ],
            3,
        );
        let mut cache = BadgeCache::new();
        let outcome = orch.refresh(&mut cache, Utc::now(), RefreshTrigger::Manual);
        assert_eq!(outcome.source, Some(SourceKind::RichJson));
        assert_eq!(calls.borrow().len(), 3);
        assert_eq!(clock.total_slept(), Duration::from_millis(4_000));
        assert_eq!(
            cache.current().map(|d| d.profile.username.as_str()),
            Some("octo")
        );
    }

    #[test]
    fn retries_are_bounded() {
        let timeouts = (0..10)
            .map(|_| ("badge_compact.json", Err(FetchError::timeout("slow"))))
            .collect();
        let (orch, calls, _) = orchestrator(true, timeouts, 2);
        let mut cache = BadgeCache::new();
        let outcome = orch.refresh(&mut cache, Utc::now(), RefreshTrigger::Manual);
        assert!(!outcome.updated());
        let compact_calls = calls
            .borrow()
            .iter()
            .filter(|url| url.ends_with("badge_compact.json"))
            .count();
        assert_eq!(compact_calls, 3);
    }

    #[test]
    fn http_errors_are_not_retried() {
        let (orch, calls, clock) = orchestrator(true, Vec::new(), 3);
        let mut cache = BadgeCache::new();
        let _ = orch.refresh(&mut cache, Utc::now(), RefreshTrigger::Manual);
        assert_eq!(calls.borrow().len(), 3);
        assert_eq!(clock.total_slept(), Duration::ZERO);
    }

    #[test]
    fn probe_reports_every_source() {
        let (orch, calls, _) = orchestrator(true, vec![("badge_simple.txt", ok(SIMPLE))], 3);
        let reports = orch.probe();
        assert_eq!(reports.len(), 3);
        assert!(reports[0].result.is_err());
        assert_eq!(reports[1].result, Ok(SourceTag::SimpleText));
        assert!(reports[2].result.is_err());
        assert_eq!(calls.borrow().len(), 3);
    }
}
