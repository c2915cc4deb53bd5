//! Session refresh on inbound requests.
//!
//! The refresh itself belongs to an external auth backend. This module only
//! decides which requests are subject to it and applies whatever the backend
//! hands back.

use std::future::Future;
use std::pin::Pin;

use anyhow::{Context, Result};
use axum::{
    extract::{Request, State},
    http::{
        header::{COOKIE, LOCATION, SET_COOKIE},
        HeaderMap, HeaderValue,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::AppState;

const EXCLUDED_PREFIXES: &[&str] = &["/_next/static/", "/_next/image", "/_image"];
const EXCLUDED_EXTENSIONS: &[&str] = &[".svg", ".png", ".jpg", ".jpeg", ".gif", ".webp"];

/// What the auth backend decided for a request.
#[derive(Debug)]
pub enum SessionOutcome {
    /// Let the request through; attach these `Set-Cookie` values to the response.
    Continue { set_cookies: Vec<HeaderValue> },
    /// Answer immediately, typically a redirect to sign-in.
    Respond(Response),
}

impl SessionOutcome {
    pub fn pass() -> Self {
        Self::Continue {
            set_cookies: Vec::new(),
        }
    }
}

pub type RefreshFuture = Pin<Box<dyn Future<Output = SessionOutcome> + Send>>;

pub trait SessionRefresher: Send + Sync {
    fn refresh(&self, headers: HeaderMap) -> RefreshFuture;
}

/// Used when no auth backend is configured.
#[derive(Clone, Debug, Default)]
pub struct PassThrough;

impl SessionRefresher for PassThrough {
    fn refresh(&self, _headers: HeaderMap) -> RefreshFuture {
        Box::pin(async move { SessionOutcome::pass() })
    }
}

/// Forwards the caller's cookies to an auth endpoint and relays its answer.
///
/// `Set-Cookie` headers in the reply are passed on to the client. A redirect
/// reply short-circuits the request. Failures to reach the endpoint are
/// logged and the request proceeds unchanged.
#[derive(Clone, Debug)]
pub struct RemoteSessionRefresher {
    client: reqwest::Client,
    url: String,
}

impl RemoteSessionRefresher {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("build session refresh client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl SessionRefresher for RemoteSessionRefresher {
    fn refresh(&self, headers: HeaderMap) -> RefreshFuture {
        let this = self.clone();
        Box::pin(async move {
            let mut req = this.client.post(&this.url);
            if let Some(cookie) = headers.get(COOKIE) {
                req = req.header(COOKIE, cookie.clone());
            }

            let resp = match req.send().await {
                Ok(r) => r,
                Err(e) => {
                    warn!(error = %e.without_url(), "session refresh failed; continuing");
                    return SessionOutcome::pass();
                }
            };

            let status = resp.status();
            let set_cookies: Vec<HeaderValue> =
                resp.headers().get_all(SET_COOKIE).iter().cloned().collect();
            debug!(%status, cookies = set_cookies.len(), "session refreshed");

            if status.is_redirection() {
                if let Some(location) = resp.headers().get(LOCATION) {
                    let mut response = (status, [(LOCATION, location.clone())]).into_response();
                    for cookie in set_cookies {
                        response.headers_mut().append(SET_COOKIE, cookie);
                    }
                    return SessionOutcome::Respond(response);
                }
            }

            SessionOutcome::Continue { set_cookies }
        })
    }
}

/// Static assets and images skip the session refresh.
pub fn is_excluded(path: &str) -> bool {
    if path == "/favicon.ico" {
        return true;
    }
    if EXCLUDED_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return true;
    }
    let lower = path.to_ascii_lowercase();
    EXCLUDED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Axum middleware delegating to the configured [`SessionRefresher`].
pub async fn refresh_session(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if is_excluded(request.uri().path()) {
        return next.run(request).await;
    }

    match state.session.refresh(request.headers().clone()).await {
        SessionOutcome::Respond(response) => response,
        SessionOutcome::Continue { set_cookies } => {
            let mut response = next.run(request).await;
            for cookie in set_cookies {
                response.headers_mut().append(SET_COOKIE, cookie);
            }
            response
        }
    }
}
