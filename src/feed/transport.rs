//! HTTP transport capability and its blocking reqwest implementation.

#![allow(missing_docs)]

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};

use crate::core::errors::{BadgeError, FetchError, Result};

/// GitHub REST media type.
pub const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// One outbound GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRequest {
    pub url: String,
    pub accept: Option<&'static str>,
    pub timeout: Duration,
}

impl FeedRequest {
    #[must_use]
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            accept: None,
            timeout,
        }
    }

    #[must_use]
    pub const fn with_accept(mut self, accept: &'static str) -> Self {
        self.accept = Some(accept);
        self
    }
}

/// Raw response: status plus the body as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedResponse {
    pub status: u16,
    pub body: String,
}

impl FeedResponse {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Anything that can perform a blocking GET.
pub trait Transport {
    /// Perform one request. Non-2xx statuses are returned, not mapped to errors.
    fn get(&self, request: &FeedRequest) -> std::result::Result<FeedResponse, FetchError>;

    /// Whether a network link is up at all.
    fn link_available(&self) -> bool {
        true
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, request: &FeedRequest) -> std::result::Result<FeedResponse, FetchError> {
        (**self).get(request)
    }

    fn link_available(&self) -> bool {
        (**self).link_available()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn get(&self, request: &FeedRequest) -> std::result::Result<FeedResponse, FetchError> {
        (**self).get(request)
    }

    fn link_available(&self) -> bool {
        (**self).link_available()
    }
}

/// Blocking reqwest client with a fixed User-Agent.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    user_agent: String,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|error| BadgeError::HttpClient {
                details: error.to_string(),
            })?;
        Ok(Self {
            client,
            user_agent: user_agent.to_string(),
        })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, request: &FeedRequest) -> std::result::Result<FeedResponse, FetchError> {
        let mut builder = self
            .client
            .get(&request.url)
            .timeout(request.timeout)
            .header(USER_AGENT, &self.user_agent);
        if let Some(accept) = request.accept {
            builder = builder.header(ACCEPT, accept);
        }

        let response = builder.send().map_err(|error| classify(&error, &request.url))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|error| classify(&error, &request.url))?;
        Ok(FeedResponse { status, body })
    }
}

/// Transport with no link at all. Every refresh ends as network-unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineTransport;

impl Transport for OfflineTransport {
    fn get(&self, request: &FeedRequest) -> std::result::Result<FeedResponse, FetchError> {
        Err(FetchError::unavailable(format!("{}: offline", request.url)))
    }

    fn link_available(&self) -> bool {
        false
    }
}

fn classify(error: &reqwest::Error, url: &str) -> FetchError {
    if error.is_timeout() {
        FetchError::timeout(format!("{url}: {error}"))
    } else if error.is_connect() {
        FetchError::unavailable(format!("{url}: {error}"))
    } else if error.is_decode() || error.is_body() {
        FetchError::parse(format!("{url}: {error}"))
    } else {
        FetchError::unavailable(format!("{url}: {error}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range_is_2xx() {
        let ok = FeedResponse {
            status: 204,
            body: String::new(),
        };
        let redirect = FeedResponse {
            status: 304,
            body: String::new(),
        };
        assert!(ok.is_success());
        assert!(!redirect.is_success());
    }

    #[test]
    fn request_builder_sets_accept() {
        let req = FeedRequest::get("https://api.github.com/users/octo", Duration::from_secs(5))
            .with_accept(GITHUB_ACCEPT);
        assert_eq!(req.accept, Some(GITHUB_ACCEPT));
        assert_eq!(req.timeout, Duration::from_secs(5));
    }

    #[test]
    fn offline_transport_has_no_link() {
        let req = FeedRequest::get("http://feed.test/api/badge_simple.txt", Duration::from_secs(1));
        assert!(!OfflineTransport.link_available());
        let err = OfflineTransport.get(&req).unwrap_err();
        assert_eq!(err.kind, crate::core::errors::FetchErrorKind::NetworkUnavailable);
    }

    #[test]
    fn unreachable_host_is_a_fetch_error() {
        let transport = ReqwestTransport::new("badge-test").expect("client builds");
        let req = FeedRequest::get("http://127.0.0.1:9/api/badge_compact.json", Duration::from_secs(2));
        let err = transport.get(&req).expect_err("nothing listens on the discard port");
        assert!(!err.details.is_empty());
    }
}
