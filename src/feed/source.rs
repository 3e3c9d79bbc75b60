//! One fetch attempt against one configured endpoint, normalized to [`BadgeData`].

#![allow(missing_docs)]

use std::time::Duration;

use crate::core::config::{Config, SourceKind};
use crate::core::errors::FetchError;
use crate::core::model::BadgeData;
use crate::feed::github_api::{self, ApiRequest};
use crate::feed::rich_json;
use crate::feed::simple_text;
use crate::feed::transport::{FeedRequest, Transport};

/// Compact JSON file under the feed root.
pub const RICH_JSON_FILE: &str = "badge_compact.json";
/// Positional text file under the feed root.
pub const SIMPLE_TEXT_FILE: &str = "badge_simple.txt";

/// A resolved endpoint: which parser, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub kind: SourceKind,
    /// Document URL for feed sources, API root for the direct API.
    pub url: String,
}

impl SourceDescriptor {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

/// Per-attempt knobs shared by every source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub default_username: String,
    pub timeout: Duration,
    pub api_events: bool,
}

impl FetchOptions {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_username: config.profile.username.clone(),
            timeout: config.feed.request_timeout(),
            api_events: config.feed.api_events,
        }
    }
}

/// Resolve the configured source order into concrete endpoints.
#[must_use]
pub fn descriptors_from_config(config: &Config) -> Vec<SourceDescriptor> {
    let base = config.feed.effective_base_url(&config.profile);
    config
        .feed
        .sources
        .iter()
        .map(|&kind| SourceDescriptor {
            kind,
            url: match kind {
                SourceKind::RichJson => format!("{base}/{RICH_JSON_FILE}"),
                SourceKind::SimpleText => format!("{base}/{SIMPLE_TEXT_FILE}"),
                SourceKind::GithubApi => config.feed.api_base.trim_end_matches('/').to_string(),
            },
        })
        .collect()
}

/// Fetch and normalize one source. Errors are tagged with the source name.
pub fn fetch<T: Transport + ?Sized>(
    source: &SourceDescriptor,
    transport: &T,
    options: &FetchOptions,
) -> Result<BadgeData, FetchError> {
    let result = match source.kind {
        SourceKind::RichJson => get_text(transport, &source.url, options.timeout)
            .and_then(|body| rich_json::parse(&body, &options.default_username)),
        SourceKind::SimpleText => {
            get_text(transport, &source.url, options.timeout).and_then(|body| simple_text::parse(&body))
        }
        SourceKind::GithubApi => github_api::fetch(
            transport,
            &ApiRequest {
                api_base: &source.url,
                username: &options.default_username,
                timeout: options.timeout,
                include_events: options.api_events,
            },
        ),
    };
    result.map_err(|error| error.from_source(source.name()))
}

fn get_text<T: Transport + ?Sized>(
    transport: &T,
    url: &str,
    timeout: Duration,
) -> Result<String, FetchError> {
    let response = transport.get(&FeedRequest::get(url, timeout))?;
    if response.is_success() {
        Ok(response.body)
    } else {
        Err(FetchError::http(response.status, url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::FetchErrorKind;
    use crate::feed::transport::FeedResponse;

    struct Fixed(u16, &'static str);

    impl Transport for Fixed {
        fn get(&self, _request: &FeedRequest) -> Result<FeedResponse, FetchError> {
            Ok(FeedResponse {
                status: self.0,
                body: self.1.to_string(),
            })
        }
    }

    fn options() -> FetchOptions {
        FetchOptions {
            default_username: "octo".to_string(),
            timeout: Duration::from_secs(1),
            api_events: false,
        }
    }

    #[test]
    fn descriptors_follow_configured_order() {
        let mut config = Config::default();
        config.feed.base_url = Some("http://localhost:8080/api".to_string());
        config.feed.sources = vec![SourceKind::SimpleText, SourceKind::GithubApi];
        let sources = descriptors_from_config(&config);
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].url, "http://localhost:8080/api/badge_simple.txt");
        assert_eq!(sources[1].url, "https://api.github.com");
    }

    #[test]
    fn http_errors_are_tagged_with_source() {
        let source = SourceDescriptor {
            kind: SourceKind::RichJson,
            url: "http://feed.test/badge_compact.json".to_string(),
        };
        let err = fetch(&source, &Fixed(503, ""), &options()).expect_err("503");
        assert_eq!(err.kind, FetchErrorKind::HttpError(503));
        assert_eq!(err.source_name, "rich_json");
    }

    #[test]
    fn simple_text_dispatches_to_its_parser() {
        let source = SourceDescriptor {
            kind: SourceKind::SimpleText,
            url: "http://feed.test/badge_simple.txt".to_string(),
        };
        let data = fetch(&source, &Fixed(200, "octo\nOcto\n1\n2\n3\n4"), &options()).expect("parses");
        assert_eq!(data.profile.username, "octo");
    }
}
