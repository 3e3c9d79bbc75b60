//! Process-lifetime cache of the last-known-good badge snapshot.
//!
//! Single writer (the fetch orchestrator), many readers (page renderers). Every
//! write replaces the snapshot and regenerates all per-page slices, so a reader
//! never sees a partially merged state.

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::model::{BadgeData, Event, Page, Profile, Stats};

/// Page-scoped view of the current snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSlice {
    Overview { profile: Profile, stats: Stats },
    Stats { profile: Profile, stats: Stats },
    Activity(Vec<Event>),
    Qr { url: String },
}

/// One cached page slice and when it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEntry {
    pub slice: PageSlice,
    pub cached_at: DateTime<Utc>,
}

/// Last-known-good snapshot plus freshness bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct BadgeCache {
    current: Option<BadgeData>,
    last_fetch_at: Option<DateTime<Utc>>,
    fetch_count: u64,
    per_page: BTreeMap<Page, PageEntry>,
}

impl BadgeCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot wholesale after a successful fetch.
    pub fn store(&mut self, data: BadgeData, now: DateTime<Utc>) {
        self.per_page = slices_for(&data, now);
        self.current = Some(data);
        self.last_fetch_at = Some(now);
        self.fetch_count += 1;
    }

    /// Install placeholder data without counting it as a fetch.
    ///
    /// Freshness stays unset so the auto-refresh schedule keeps trying for real data.
    pub fn seed_demo(&mut self, data: BadgeData, now: DateTime<Utc>) {
        self.per_page = slices_for(&data, now);
        self.current = Some(data);
    }

    #[must_use]
    pub fn current(&self) -> Option<&BadgeData> {
        self.current.as_ref()
    }

    #[must_use]
    pub const fn last_fetch_at(&self) -> Option<DateTime<Utc>> {
        self.last_fetch_at
    }

    #[must_use]
    pub const fn fetch_count(&self) -> u64 {
        self.fetch_count
    }

    #[must_use]
    pub fn page(&self, page: Page) -> Option<&PageEntry> {
        self.per_page.get(&page)
    }

    #[must_use]
    pub fn has_page(&self, page: Page) -> bool {
        self.per_page.contains_key(&page)
    }

    #[must_use]
    pub fn pages_cached(&self) -> usize {
        self.per_page.len()
    }

    /// Time since the last successful fetch. Clock skew clamps to zero.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.last_fetch_at
            .map(|at| (now - at).to_std().unwrap_or(Duration::ZERO))
    }

    /// Whether the last successful fetch is within `ttl` of `now` (inclusive).
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.age(now).is_some_and(|age| age.as_secs() <= ttl.as_secs())
    }
}

fn slices_for(data: &BadgeData, now: DateTime<Utc>) -> BTreeMap<Page, PageEntry> {
    let entry = |slice| PageEntry {
        slice,
        cached_at: now,
    };
    let mut pages = BTreeMap::new();
    pages.insert(
        Page::Overview,
        entry(PageSlice::Overview {
            profile: data.profile.clone(),
            stats: data.stats.clone(),
        }),
    );
    pages.insert(
        Page::Stats,
        entry(PageSlice::Stats {
            profile: data.profile.clone(),
            stats: data.stats.clone(),
        }),
    );
    pages.insert(Page::Activity, entry(PageSlice::Activity(data.activity.clone())));
    pages.insert(
        Page::Qr,
        entry(PageSlice::Qr {
            url: data.profile.profile_url.clone(),
        }),
    );
    pages
}
