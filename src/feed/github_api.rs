//! Direct GitHub REST API source: profile, repositories, optional events.

#![allow(missing_docs)]

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::core::errors::FetchError;
use crate::core::model::{
    BadgeData, Event, LanguageHistogram, MAX_EVENTS, Meta, Profile, RecentRepo, RepoHighlight,
    SourceTag, Stats, profile_url_for,
};
use crate::feed::transport::{FeedRequest, GITHUB_ACCEPT, Transport};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiUser {
    login: String,
    name: Option<String>,
    bio: Option<String>,
    company: Option<String>,
    location: Option<String>,
    public_repos: u64,
    followers: u64,
    following: u64,
    html_url: Option<String>,
    avatar_url: Option<String>,
    created_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiRepo {
    name: String,
    stargazers_count: u64,
    forks_count: u64,
    language: Option<String>,
    html_url: Option<String>,
    updated_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiEvent {
    #[serde(rename = "type")]
    kind: String,
    repo: ApiEventRepo,
    created_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiEventRepo {
    name: String,
}

/// Where and how to reach the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest<'a> {
    pub api_base: &'a str,
    pub username: &'a str,
    pub timeout: Duration,
    pub include_events: bool,
}

/// Fetch profile and repository stats straight from the API.
///
/// Only the profile call is mandatory. A failed repository or event call
/// leaves the corresponding section empty.
pub fn fetch<T: Transport + ?Sized>(
    transport: &T,
    request: &ApiRequest<'_>,
) -> Result<BadgeData, FetchError> {
    let base = request.api_base.trim_end_matches('/');
    let user: ApiUser = get_json(
        transport,
        &format!("{base}/users/{}", request.username),
        request.timeout,
    )?;

    let repos: Vec<ApiRepo> = match get_json(
        transport,
        &format!("{base}/users/{}/repos?per_page=100", request.username),
        request.timeout,
    ) {
        Ok(repos) => repos,
        Err(error) => {
            warn!(%error, "repository listing failed, keeping profile with zeroed stats");
            Vec::new()
        }
    };

    let activity = if request.include_events {
        match get_json::<_, Vec<ApiEvent>>(
            transport,
            &format!(
                "{base}/users/{}/events/public?per_page={MAX_EVENTS}",
                request.username
            ),
            request.timeout,
        ) {
            Ok(events) => events
                .into_iter()
                .take(MAX_EVENTS)
                .map(|event| {
                    Event::from_github_event(&event.kind, &event.repo.name, event.created_at)
                })
                .collect(),
            Err(error) => {
                warn!(%error, "event listing failed, activity left empty");
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    debug!(repos = repos.len(), events = activity.len(), "api fetch complete");
    Ok(BadgeData {
        profile: profile_from(user, request.username),
        stats: aggregate(&repos),
        activity,
        meta: Meta {
            generated_at: None,
            source_tag: SourceTag::FullApi,
        },
    })
}

fn get_json<T: Transport + ?Sized, D: DeserializeOwned>(
    transport: &T,
    url: &str,
    timeout: Duration,
) -> Result<D, FetchError> {
    let response = transport.get(&FeedRequest::get(url, timeout).with_accept(GITHUB_ACCEPT))?;
    if !response.is_success() {
        return Err(FetchError::http(response.status, url.to_string()));
    }
    serde_json::from_str(&response.body)
        .map_err(|error| FetchError::parse(format!("{url}: {error}")))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn profile_from(user: ApiUser, default_username: &str) -> Profile {
    let username = if user.login.trim().is_empty() {
        default_username.to_string()
    } else {
        user.login
    };
    Profile {
        display_name: non_empty(user.name).unwrap_or_else(|| username.clone()),
        bio: non_empty(user.bio),
        company: non_empty(user.company),
        location: non_empty(user.location),
        public_repo_count: user.public_repos,
        follower_count: user.followers,
        following_count: user.following,
        profile_url: non_empty(user.html_url).unwrap_or_else(|| profile_url_for(&username)),
        avatar_url: non_empty(user.avatar_url),
        account_created_at: non_empty(user.created_at),
        username,
    }
}

/// Roll a repository listing up into badge stats.
fn aggregate(repos: &[ApiRepo]) -> Stats {
    if repos.is_empty() {
        return Stats::default();
    }

    let total_stars: u64 = repos.iter().map(|repo| repo.stargazers_count).sum();
    let total_forks: u64 = repos.iter().map(|repo| repo.forks_count).sum();
    let languages = LanguageHistogram::from_counts(
        repos
            .iter()
            .filter_map(|repo| repo.language.clone())
            .map(|lang| (lang, 1)),
    );

    // First repo wins ties.
    let most_starred = repos
        .iter()
        .reduce(|best, repo| {
            if repo.stargazers_count > best.stargazers_count {
                repo
            } else {
                best
            }
        })
        .map(|repo| RepoHighlight {
            name: repo.name.clone(),
            star_count: Some(repo.stargazers_count),
            url: repo.html_url.clone(),
        });

    let recent_repo = repos
        .iter()
        .reduce(|latest, repo| {
            if repo.updated_at > latest.updated_at {
                repo
            } else {
                latest
            }
        })
        .map(|repo| RecentRepo {
            name: repo.name.clone(),
            updated_at: repo.updated_at.clone(),
            url: repo.html_url.clone(),
        });

    Stats {
        total_stars,
        total_forks,
        top_language: languages.top().map(str::to_string),
        languages,
        most_starred,
        recent_repo,
        average_stars: total_stars / repos.len() as u64,
    }
}
