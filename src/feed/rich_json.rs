//! Lenient parser for the pre-generated JSON feed (compact and full variants).
//!
//! Every field is pulled out of a [`serde_json::Value`] on its own, so a missing
//! or mistyped field degrades to its default instead of failing the document.

#![allow(missing_docs)]

use serde_json::{Map, Value};

use crate::core::errors::FetchError;
use crate::core::model::{
    BadgeData, Event, LanguageHistogram, MAX_EVENTS, Meta, Profile, RecentRepo, RepoHighlight,
    SourceTag, Stats, parse_timestamp, profile_url_for, short_repo_name,
};

/// Parse a rich JSON document. Fails only when the body is not a JSON object.
pub fn parse(body: &str, default_username: &str) -> Result<BadgeData, FetchError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|error| FetchError::parse(format!("invalid JSON: {error}")))?;
    let Some(root) = value.as_object() else {
        return Err(FetchError::parse("feed root is not a JSON object"));
    };

    let empty = Map::new();
    let profile = parse_profile(obj(root, "profile").unwrap_or(&empty), default_username);
    let stats = parse_stats(obj(root, "stats").unwrap_or(&empty));
    let activity = root
        .get("activity")
        .and_then(Value::as_array)
        .map(|events| {
            events
                .iter()
                .filter_map(Value::as_object)
                .take(MAX_EVENTS)
                .map(parse_event)
                .collect()
        })
        .unwrap_or_default();

    let meta_obj = obj(root, "meta");
    let generated_at = meta_obj
        .and_then(|meta| text(meta, "generated_at"))
        .or_else(|| text(root, "updated_at"))
        .and_then(parse_timestamp);
    let source_tag = match meta_obj.and_then(|meta| text(meta, "source")) {
        Some("simple_text") => SourceTag::SimpleText,
        Some("demo") => SourceTag::Demo,
        _ => SourceTag::FullApi,
    };

    Ok(BadgeData {
        profile,
        stats,
        activity,
        meta: Meta {
            generated_at,
            source_tag,
        },
    })
}

fn parse_profile(profile: &Map<String, Value>, default_username: &str) -> Profile {
    let username = text(profile, "username")
        .or_else(|| text(profile, "login"))
        .unwrap_or(default_username)
        .to_string();
    Profile {
        display_name: text(profile, "name").unwrap_or(&username).to_string(),
        bio: owned(profile, "bio"),
        company: owned(profile, "company"),
        location: owned(profile, "location"),
        public_repo_count: count(profile, "public_repos"),
        follower_count: count(profile, "followers"),
        following_count: count(profile, "following"),
        profile_url: owned(profile, "html_url").unwrap_or_else(|| profile_url_for(&username)),
        avatar_url: owned(profile, "avatar_url"),
        account_created_at: owned(profile, "created_at"),
        username,
    }
}

fn parse_stats(stats: &Map<String, Value>) -> Stats {
    let languages = obj(stats, "languages")
        .map(|langs| {
            LanguageHistogram::from_counts(
                langs
                    .iter()
                    .map(|(name, value)| (name.clone(), number(value).unwrap_or(0))),
            )
        })
        .unwrap_or_default();

    let most_starred = obj(stats, "most_starred").and_then(|repo| {
        let name = text(repo, "name")?;
        Some(RepoHighlight {
            name: name.to_string(),
            star_count: repo
                .get("stars")
                .or_else(|| repo.get("stargazers_count"))
                .and_then(number),
            url: owned(repo, "url").or_else(|| owned(repo, "html_url")),
        })
    });

    let recent_repo = obj(stats, "recent_repo").and_then(|repo| {
        Some(RecentRepo {
            name: text(repo, "name")?.to_string(),
            updated_at: owned(repo, "updated_at"),
            url: owned(repo, "url"),
        })
    });

    Stats {
        total_stars: count(stats, "total_stars"),
        total_forks: count(stats, "total_forks"),
        languages,
        top_language: owned(stats, "top_language").filter(|lang| lang != "None"),
        most_starred,
        recent_repo,
        average_stars: count(stats, "avg_stars"),
    }
}

fn parse_event(event: &Map<String, Value>) -> Event {
    let kind = text(event, "type").unwrap_or("Unknown");
    let repo = text(event, "repo").unwrap_or("Unknown");
    let mut parsed = Event::from_github_event(kind, repo, owned(event, "created_at"));

    if let Some(icon) = text(event, "icon") {
        parsed.icon_glyph = icon.to_string();
    }
    if let Some(action) = text(event, "action") {
        parsed.action_label = action.to_string();
    }
    if let Some(short) = text(event, "repo_short") {
        parsed.repo_short_name = short.to_string();
    } else if repo != "Unknown" {
        parsed.repo_short_name = short_repo_name(repo).to_string();
    }
    parsed.display_string = text(event, "display").map_or_else(
        || {
            format!(
                "{} {} {}",
                parsed.icon_glyph, parsed.action_label, parsed.repo_short_name
            )
        },
        str::to_string,
    );
    parsed
}

// ──────────────────── lenient field access ────────────────────

fn obj<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    map.get(key).and_then(Value::as_object)
}

/// Non-empty string field.
fn text<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn owned(map: &Map<String, Value>, key: &str) -> Option<String> {
    text(map, key).map(str::to_string)
}

fn count(map: &Map<String, Value>, key: &str) -> u64 {
    map.get(key).and_then(number).unwrap_or(0)
}

/// Non-negative integer from a JSON number or numeric string.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn number(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
