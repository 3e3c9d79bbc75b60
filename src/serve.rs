//! Local development feed server mimicking the hosted GitHub Pages feed.
//!
//! Serves a whitelisted set of generated files from one directory under
//! `/api/{file}` with permissive CORS, so a badge can be pointed at
//! `http://host:port/api` through `feed.base_url`.

#![allow(missing_docs)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::extract::{Path as UrlPath, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde_json::json;
use tracing::{info, warn};

use crate::core::errors::{BadgeError, Result};
use crate::feed::source::{RICH_JSON_FILE, SIMPLE_TEXT_FILE};

/// Files the server will hand out, with their content types.
pub const SERVED_FILES: [(&str, &str); 4] = [
    (RICH_JSON_FILE, "application/json"),
    (SIMPLE_TEXT_FILE, "text/plain; charset=utf-8"),
    ("github_stats.json", "application/json"),
    ("last_updated.txt", "text/plain; charset=utf-8"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeOptions {
    pub dir: PathBuf,
    pub addr: SocketAddr,
}

/// Map a requested name to a file under `dir`. Anything off the whitelist is refused.
#[must_use]
pub fn resolve_feed_file(dir: &Path, name: &str) -> Option<(PathBuf, &'static str)> {
    SERVED_FILES
        .iter()
        .find(|(file, _)| *file == name)
        .map(|(file, content_type)| (dir.join(file), *content_type))
}

#[derive(Debug)]
struct FeedDir(PathBuf);

/// Build the router for a feed directory.
pub fn router(dir: PathBuf) -> Router {
    Router::new()
        .route("/api/", get(index))
        .route("/api/{file}", get(feed_file))
        .with_state(Arc::new(FeedDir(dir)))
}

async fn index(State(dir): State<Arc<FeedDir>>) -> Response {
    let available: Vec<&str> = SERVED_FILES
        .iter()
        .filter(|(file, _)| dir.0.join(file).is_file())
        .map(|(file, _)| *file)
        .collect();
    with_cors(axum::Json(json!({ "files": available })).into_response())
}

async fn feed_file(State(dir): State<Arc<FeedDir>>, UrlPath(name): UrlPath<String>) -> Response {
    let Some((path, content_type)) = resolve_feed_file(&dir.0, &name) else {
        warn!(%name, "refused non-feed file");
        return with_cors((StatusCode::NOT_FOUND, "not a feed file").into_response());
    };
    match tokio::fs::read(&path).await {
        Ok(body) => {
            info!(%name, bytes = body.len(), "served feed file");
            with_cors(([(header::CONTENT_TYPE, content_type)], body).into_response())
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "feed file unreadable");
            with_cors((StatusCode::NOT_FOUND, "feed file missing").into_response())
        }
    }
}

fn with_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        header::HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        header::HeaderValue::from_static("GET, OPTIONS"),
    );
    response
}

/// Run the server until Ctrl-C. Blocks the calling thread.
pub fn serve_blocking(options: &ServeOptions) -> Result<()> {
    if !options.dir.is_dir() {
        return Err(BadgeError::io(
            &options.dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "feed directory not found"),
        ));
    }
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| BadgeError::Runtime {
            details: format!("tokio runtime: {err}"),
        })?;
    runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind(options.addr)
            .await
            .map_err(|err| BadgeError::Runtime {
                details: format!("bind {}: {err}", options.addr),
            })?;
        info!(addr = %options.addr, dir = %options.dir.display(), "feed server listening");
        axum::serve(listener, router(options.dir.clone()))
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await
            .map_err(|err| BadgeError::Runtime {
                details: format!("feed server: {err}"),
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(future)
    }

    #[test]
    fn whitelist_only() {
        let dir = Path::new("/srv/feed");
        assert_eq!(
            resolve_feed_file(dir, "badge_compact.json"),
            Some((dir.join("badge_compact.json"), "application/json"))
        );
        assert!(resolve_feed_file(dir, "../etc/passwd").is_none());
        assert!(resolve_feed_file(dir, "config.toml").is_none());
    }

    #[test]
    fn serves_whitelisted_file_with_cors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("badge_simple.txt"), "octo\n").unwrap();
        let state = Arc::new(FeedDir(dir.path().to_path_buf()));
        let response = block_on(feed_file(
            State(state),
            UrlPath("badge_simple.txt".to_string()),
        ));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn missing_and_refused_files_are_404() {
        let dir = tempfile::tempdir().unwrap();
        let state = Arc::new(FeedDir(dir.path().to_path_buf()));
        let missing = block_on(feed_file(
            State(Arc::clone(&state)),
            UrlPath("badge_compact.json".to_string()),
        ));
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        let refused = block_on(feed_file(State(state), UrlPath("secrets.env".to_string())));
        assert_eq!(refused.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let options = ServeOptions {
            dir: PathBuf::from("/definitely/not/here"),
            addr: "127.0.0.1:0".parse().unwrap(),
        };
        assert_eq!(serve_blocking(&options).unwrap_err().code(), "BDG-3002");
    }
}
