//! Positional newline-delimited feed, dispatched on line count.
//!
//! Canonical layout (8+ lines): username, name, repos, followers, following,
//! stars, forks, top language, then optionally the most-starred repo name and
//! the generation timestamp. Older feeds carry six or seven lines without the
//! following count; [`LegacyLayout`] adapts those.

#![allow(missing_docs)]

use crate::core::errors::FetchError;
use crate::core::model::{
    BadgeData, Meta, Profile, RepoHighlight, SourceTag, Stats, parse_timestamp, profile_url_for,
};

/// Fewest lines any layout accepts.
pub const MIN_LINES: usize = 6;
/// Lines in the canonical layout before the optional trailer.
pub const CANONICAL_LINES: usize = 8;

/// Literal the generator writes for an absent value.
const ABSENT: &str = "None";

/// Fields common to both layouts, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SimpleRecord<'a> {
    username: &'a str,
    display_name: &'a str,
    public_repos: u64,
    followers: u64,
    following: u64,
    total_stars: u64,
    total_forks: u64,
    top_language: Option<&'a str>,
    most_starred: Option<&'a str>,
    generated_at: Option<&'a str>,
}

/// Six- or seven-line layout without the following count.
struct LegacyLayout;

impl LegacyLayout {
    fn read<'a>(lines: &[&'a str]) -> Result<SimpleRecord<'a>, FetchError> {
        Ok(SimpleRecord {
            username: lines[0],
            display_name: lines[1],
            public_repos: numeric(lines, 2, "public repos")?,
            followers: numeric(lines, 3, "followers")?,
            following: 0,
            total_stars: numeric(lines, 4, "total stars")?,
            total_forks: numeric(lines, 5, "total forks")?,
            top_language: optional(lines, 6),
            most_starred: None,
            generated_at: None,
        })
    }
}

fn read_canonical<'a>(lines: &[&'a str]) -> Result<SimpleRecord<'a>, FetchError> {
    Ok(SimpleRecord {
        username: lines[0],
        display_name: lines[1],
        public_repos: numeric(lines, 2, "public repos")?,
        followers: numeric(lines, 3, "followers")?,
        following: numeric(lines, 4, "following")?,
        total_stars: numeric(lines, 5, "total stars")?,
        total_forks: numeric(lines, 6, "total forks")?,
        top_language: optional(lines, 7),
        most_starred: optional(lines, 8),
        generated_at: optional(lines, 9),
    })
}

/// Parse a simple text document.
pub fn parse(body: &str) -> Result<BadgeData, FetchError> {
    let mut lines: Vec<&str> = body.lines().map(str::trim).collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }

    let record = match lines.len() {
        n if n >= CANONICAL_LINES => read_canonical(&lines)?,
        n if n >= MIN_LINES => LegacyLayout::read(&lines)?,
        n => {
            return Err(FetchError::parse(format!(
                "expected at least {MIN_LINES} lines, got {n}"
            )));
        }
    };

    if record.username.is_empty() {
        return Err(FetchError::parse("username line is empty"));
    }

    let display_name = if record.display_name.is_empty() || record.display_name == ABSENT {
        record.username
    } else {
        record.display_name
    };

    Ok(BadgeData {
        profile: Profile {
            username: record.username.to_string(),
            display_name: display_name.to_string(),
            public_repo_count: record.public_repos,
            follower_count: record.followers,
            following_count: record.following,
            profile_url: profile_url_for(record.username),
            ..Profile::default()
        },
        stats: Stats {
            total_stars: record.total_stars,
            total_forks: record.total_forks,
            top_language: record.top_language.map(str::to_string),
            most_starred: record.most_starred.map(|name| RepoHighlight {
                name: name.to_string(),
                star_count: None,
                url: None,
            }),
            ..Stats::default()
        },
        activity: Vec::new(),
        meta: Meta {
            generated_at: record.generated_at.and_then(parse_timestamp),
            source_tag: SourceTag::SimpleText,
        },
    })
}

fn numeric(lines: &[&str], index: usize, field: &str) -> Result<u64, FetchError> {
    lines[index].parse().map_err(|_| {
        FetchError::parse(format!(
            "line {}: {field} is not a number: {:?}",
            index + 1,
            lines[index]
        ))
    })
}

fn optional<'a>(lines: &[&'a str], index: usize) -> Option<&'a str> {
    lines
        .get(index)
        .copied()
        .filter(|line| !line.is_empty() && *line != ABSENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::FetchErrorKind;
    use proptest::prelude::*;

    #[test]
    fn canonical_layout() {
        let body = "octo\nOcto Cat\n8\n3\n1\n42\n7\nRust\nhello-world\n2024-01-01T00:00:00Z\n";
        let data = parse(body).expect("parses");
        assert_eq!(data.profile.username, "octo");
        assert_eq!(data.profile.display_name, "Octo Cat");
        assert_eq!(data.profile.public_repo_count, 8);
        assert_eq!(data.profile.follower_count, 3);
        assert_eq!(data.profile.following_count, 1);
        assert_eq!(data.stats.total_stars, 42);
        assert_eq!(data.stats.total_forks, 7);
        assert_eq!(data.stats.top_language(), Some("Rust"));
        assert_eq!(
            data.stats.most_starred.map(|r| r.name).as_deref(),
            Some("hello-world")
        );
        assert!(data.meta.generated_at.is_some());
        assert_eq!(data.meta.source_tag, SourceTag::SimpleText);
        assert_eq!(data.profile.profile_url, "https://github.com/octo");
    }

    #[test]
    fn canonical_without_trailer() {
        let data = parse("octo\nOcto\n1\n2\n3\n4\n5\nNone").expect("parses");
        assert_eq!(data.profile.following_count, 3);
        assert_eq!(data.stats.total_stars, 4);
        assert!(data.stats.top_language().is_none());
        assert!(data.stats.most_starred.is_none());
    }

    #[test]
    fn legacy_layout() {
        let data = parse("octo\nOcto Cat\n8\n3\n42\n7\n\n\n").expect("parses");
        assert_eq!(data.profile.following_count, 0);
        assert_eq!(data.stats.total_stars, 42);
        assert_eq!(data.stats.total_forks, 7);
        assert!(data.stats.top_language.is_none());

        let with_lang = parse("octo\nOcto Cat\n8\n3\n42\n7\nGo").expect("parses");
        assert_eq!(with_lang.stats.top_language(), Some("Go"));
    }

    #[test]
    fn too_few_lines_fail() {
        let err = parse("octo\nOcto\n1\n2\n3").expect_err("five lines");
        assert_eq!(err.kind, FetchErrorKind::ParseError);
    }

    #[test]
    fn bad_number_fails() {
        let err = parse("octo\nOcto\nmany\n2\n3\n4\n5\nRust").expect_err("bad number");
        assert!(err.details.contains("public repos"));
    }

    #[test]
    fn empty_username_fails() {
        assert!(parse("\nOcto\n1\n2\n3\n4").is_err());
    }

    #[test]
    fn none_display_name_falls_back_to_username() {
        let data = parse("octo\nNone\n1\n2\n3\n4").expect("parses");
        assert_eq!(data.profile.display_name, "octo");
    }

    proptest! {
        #[test]
        fn short_documents_never_parse(lines in proptest::collection::vec("[a-z0-9]{1,8}", 0..MIN_LINES)) {
            prop_assert!(parse(&lines.join("\n")).is_err());
        }

        #[test]
        fn numeric_canonical_documents_roundtrip(
            repos in 0u64..10_000, followers in 0u64..10_000, following in 0u64..10_000,
            stars in 0u64..100_000, forks in 0u64..100_000,
        ) {
            let body = format!("octo\nOcto\n{repos}\n{followers}\n{following}\n{stars}\n{forks}\nRust\n");
            let data = parse(&body).expect("canonical document parses");
            prop_assert_eq!(data.profile.public_repo_count, repos);
            prop_assert_eq!(data.profile.follower_count, followers);
            prop_assert_eq!(data.profile.following_count, following);
            prop_assert_eq!(data.stats.total_stars, stars);
            prop_assert_eq!(data.stats.total_forks, forks);
        }
    }
}
