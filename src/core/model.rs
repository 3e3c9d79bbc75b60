//! Canonical badge data model: one immutable snapshot per successful fetch.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum events retained from any feed.
pub const MAX_EVENTS: usize = 10;

// ──────────────────── pages ────────────────────

/// Navigable full-screen views, in navigation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Overview,
    Stats,
    Activity,
    Qr,
}

impl Page {
    /// All pages in navigation order.
    pub const ALL: [Self; 4] = [Self::Overview, Self::Stats, Self::Activity, Self::Qr];

    /// Number of navigable pages.
    pub const COUNT: usize = Self::ALL.len();

    /// Page at a navigation index, wrapping out-of-range values.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::COUNT]
    }

    /// Stable identifier used for cache keys and CLI arguments.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::Stats => "stats",
            Self::Activity => "activity",
            Self::Qr => "qr",
        }
    }

    /// Header title shown on the page.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Stats => "Statistics",
            Self::Activity => "Activity",
            Self::Qr => "QR Code",
        }
    }

    /// Resolve a page from its identifier.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|page| page.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ──────────────────── badge data ────────────────────

/// Which kind of source produced a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    #[default]
    FullApi,
    SimpleText,
    Demo,
}

impl SourceTag {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FullApi => "full_api",
            Self::SimpleText => "simple_text",
            Self::Demo => "demo",
        }
    }
}

/// User profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub public_repo_count: u64,
    pub follower_count: u64,
    pub following_count: u64,
    pub profile_url: String,
    pub avatar_url: Option<String>,
    pub account_created_at: Option<String>,
}

impl Profile {
    /// Profile with only a username; every other field takes its default.
    #[must_use]
    pub fn for_username(username: &str) -> Self {
        Self {
            username: username.to_owned(),
            display_name: username.to_owned(),
            profile_url: profile_url_for(username),
            ..Self::default()
        }
    }
}

/// Public profile URL for a GitHub login.
#[must_use]
pub fn profile_url_for(username: &str) -> String {
    format!("https://github.com/{username}")
}

/// Language → repository count, sorted by count descending.
///
/// Ties are ordered alphabetically so the ordering never depends on the order
/// the feed happened to list them in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageHistogram(Vec<(String, u64)>);

impl LanguageHistogram {
    #[must_use]
    pub fn from_counts(counts: impl IntoIterator<Item = (String, u64)>) -> Self {
        let mut entries: Vec<(String, u64)> = Vec::new();
        for (language, count) in counts {
            if language.is_empty() {
                continue;
            }
            match entries.iter_mut().find(|(name, _)| *name == language) {
                Some(entry) => entry.1 += count,
                None => entries.push((language, count)),
            }
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        Self(entries)
    }

    #[must_use]
    pub fn entries(&self) -> &[(String, u64)] {
        &self.0
    }

    /// Language with the highest repository count.
    #[must_use]
    pub fn top(&self) -> Option<&str> {
        self.0.first().map(|(name, _)| name.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The repository with the most stars.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoHighlight {
    pub name: String,
    /// Unknown when the feed only names the repository.
    pub star_count: Option<u64>,
    pub url: Option<String>,
}

/// The most recently updated repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentRepo {
    pub name: String,
    pub updated_at: Option<String>,
    pub url: Option<String>,
}

/// Repository-level aggregates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_stars: u64,
    pub total_forks: u64,
    pub languages: LanguageHistogram,
    pub top_language: Option<String>,
    pub most_starred: Option<RepoHighlight>,
    pub recent_repo: Option<RecentRepo>,
    pub average_stars: u64,
}

impl Stats {
    /// Explicit top language, falling back to the histogram head.
    #[must_use]
    pub fn top_language(&self) -> Option<&str> {
        self.top_language.as_deref().or_else(|| self.languages.top())
    }
}

/// One simplified public activity event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: String,
    pub icon_glyph: String,
    pub action_label: String,
    pub repo_full_name: String,
    pub repo_short_name: String,
    pub occurred_at: Option<String>,
    pub display_string: String,
}

impl Event {
    /// Simplify a raw GitHub event type into an icon/action pair.
    #[must_use]
    pub fn from_github_event(kind: &str, repo_full_name: &str, occurred_at: Option<String>) -> Self {
        let (icon, action) = match kind {
            "PushEvent" => ("→", "Pushed to".to_owned()),
            "CreateEvent" => ("+", "Created".to_owned()),
            "WatchEvent" => ("*", "Starred".to_owned()),
            "ForkEvent" => ("Y", "Forked".to_owned()),
            "IssuesEvent" => ("!", "Issue on".to_owned()),
            "PullRequestEvent" => ("^", "PR on".to_owned()),
            other => ("•", other.replace("Event", "")),
        };
        let repo_short_name = short_repo_name(repo_full_name).to_owned();
        let display_string = format!("{icon} {action} {repo_short_name}");
        Self {
            kind: kind.to_owned(),
            icon_glyph: icon.to_owned(),
            action_label: action,
            repo_full_name: repo_full_name.to_owned(),
            repo_short_name,
            occurred_at,
            display_string,
        }
    }
}

/// Repository name without its owner prefix.
#[must_use]
pub fn short_repo_name(full_name: &str) -> &str {
    full_name.rsplit('/').next().unwrap_or(full_name)
}

/// Provenance of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub generated_at: Option<DateTime<Utc>>,
    pub source_tag: SourceTag,
}

/// Root aggregate. Replaced wholesale on every successful fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeData {
    pub profile: Profile,
    pub stats: Stats,
    pub activity: Vec<Event>,
    pub meta: Meta,
}

impl BadgeData {
    /// Placeholder snapshot shown when the first fetch fails and demo data is enabled.
    #[must_use]
    pub fn demo(username: &str) -> Self {
        Self {
            profile: Profile::for_username(username),
            stats: Stats::default(),
            activity: Vec::new(),
            meta: Meta {
                generated_at: None,
                source_tag: SourceTag::Demo,
            },
        }
    }
}

/// Parse an RFC 3339 timestamp, tolerating surrounding whitespace.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_index_wraps() {
        assert_eq!(Page::from_index(0), Page::Overview);
        assert_eq!(Page::from_index(3), Page::Qr);
        assert_eq!(Page::from_index(4), Page::Overview);
    }

    #[test]
    fn page_names_roundtrip() {
        for page in Page::ALL {
            assert_eq!(Page::from_name(page.name()), Some(page));
        }
        assert_eq!(Page::from_name(" STATS "), Some(Page::Stats));
        assert_eq!(Page::from_name("settings"), None);
    }

    #[test]
    fn histogram_sorts_by_count_then_name() {
        let histogram = LanguageHistogram::from_counts([
            ("Rust".to_owned(), 2),
            ("Go".to_owned(), 3),
            ("C".to_owned(), 2),
            (String::new(), 9),
        ]);
        let names: Vec<&str> = histogram.entries().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["Go", "C", "Rust"]);
        assert_eq!(histogram.top(), Some("Go"));
    }

    #[test]
    fn histogram_merges_duplicate_languages() {
        let histogram =
            LanguageHistogram::from_counts([("Go".to_owned(), 1), ("Go".to_owned(), 2)]);
        assert_eq!(histogram.entries(), &[("Go".to_owned(), 3)]);
    }

    #[test]
    fn github_event_mapping() {
        let push = Event::from_github_event("PushEvent", "octo/hello-world", None);
        assert_eq!(push.action_label, "Pushed to");
        assert_eq!(push.repo_short_name, "hello-world");
        assert_eq!(push.display_string, "→ Pushed to hello-world");

        let other = Event::from_github_event("ReleaseEvent", "solo", None);
        assert_eq!(other.action_label, "Release");
        assert_eq!(other.repo_short_name, "solo");
        assert_eq!(other.icon_glyph, "•");
    }

    #[test]
    fn explicit_top_language_wins_over_histogram() {
        let mut stats = Stats {
            languages: LanguageHistogram::from_counts([("Go".to_owned(), 3)]),
            ..Stats::default()
        };
        assert_eq!(stats.top_language(), Some("Go"));
        stats.top_language = Some("Rust".to_owned());
        assert_eq!(stats.top_language(), Some("Rust"));
    }

    #[test]
    fn demo_data_is_tagged_and_named() {
        let demo = BadgeData::demo("octo");
        assert_eq!(demo.meta.source_tag, SourceTag::Demo);
        assert_eq!(demo.profile.username, "octo");
        assert_eq!(demo.profile.profile_url, "https://github.com/octo");
    }

    #[test]
    fn timestamps_parse_rfc3339() {
        let ts = parse_timestamp("2024-01-01T00:00:00Z").expect("valid timestamp");
        assert_eq!(ts.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert!(parse_timestamp("yesterday").is_none());
    }
}
