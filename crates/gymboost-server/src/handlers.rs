use axum::{
    body::Body,
    extract::{Query, State},
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    health::{self, HealthStatus},
    manifest::{self, WebAppManifest},
    AppState,
};

/// Browsers may reuse a proxied image for a minute.
const IMAGE_CACHE_CONTROL: &str = "public, max-age=60";

// ── Health ────────────────────────────────────────────────────────────────────

pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok", "version": env!("CARGO_PKG_VERSION")}))
}

// ── Provider health ───────────────────────────────────────────────────────────

pub async fn ai_health(State(state): State<AppState>) -> Response {
    let status = health::probe(state.gemini.as_ref(), &state.http, &state.secrets).await;
    no_store(status)
}

pub async fn resend_health(State(state): State<AppState>) -> Response {
    let status = health::probe(state.resend.as_ref(), &state.http, &state.secrets).await;
    no_store(status)
}

// ── Manifest ──────────────────────────────────────────────────────────────────

pub async fn web_manifest() -> Response {
    (
        [(CONTENT_TYPE, manifest::CONTENT_TYPE)],
        Json(WebAppManifest::console()),
    )
        .into_response()
}

// ── Images ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    pub url: Option<String>,
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("\"url\" parameter is required")]
    MissingUrl,
    #[error("\"url\" parameter is not allowed")]
    NotAllowed,
    #[error("upstream image could not be fetched")]
    Upstream(reqwest::Error),
    #[error("upstream image responded with {0}")]
    UpstreamStatus(StatusCode),
    #[error("upstream response is not an image")]
    NotAnImage,
    #[error("upstream image exceeds {0} bytes")]
    TooLarge(usize),
}

impl IntoResponse for ImageError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::MissingUrl | Self::NotAllowed => StatusCode::BAD_REQUEST,
            Self::Upstream(_)
            | Self::UpstreamStatus(_)
            | Self::NotAnImage
            | Self::TooLarge(_) => StatusCode::BAD_GATEWAY,
        };
        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}

pub async fn load_image(
    State(state): State<AppState>,
    Query(query): Query<ImageQuery>,
) -> Result<Response, ImageError> {
    let url = query
        .url
        .filter(|u| !u.is_empty())
        .ok_or(ImageError::MissingUrl)?;

    if !state.images.is_allowed(&url) {
        info!(url = %url, "image.rejected");
        return Err(ImageError::NotAllowed);
    }

    let mut resp = state.image_http.get(&url).send().await.map_err(|e| {
        warn!(url = %url, error = %e, "image fetch failed");
        ImageError::Upstream(e.without_url())
    })?;

    // Redirects are not followed, so a 3xx lands here too.
    if !resp.status().is_success() {
        info!(url = %url, status = %resp.status(), "image.upstream_status");
        return Err(ImageError::UpstreamStatus(resp.status()));
    }

    let content_type = resp
        .headers()
        .get(CONTENT_TYPE)
        .filter(|v| v.as_bytes().starts_with(b"image/"))
        .cloned()
        .ok_or(ImageError::NotAnImage)?;

    let limit = state.images.max_bytes;
    if resp.content_length().is_some_and(|len| len > limit as u64) {
        return Err(ImageError::TooLarge(limit));
    }

    let mut bytes = Vec::new();
    while let Some(chunk) = resp
        .chunk()
        .await
        .map_err(|e| ImageError::Upstream(e.without_url()))?
    {
        if bytes.len() + chunk.len() > limit {
            return Err(ImageError::TooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok((
        [
            (CONTENT_TYPE, content_type),
            (CACHE_CONTROL, HeaderValue::from_static(IMAGE_CACHE_CONTROL)),
        ],
        Body::from(bytes),
    )
        .into_response())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Provider checks are always answered fresh.
fn no_store(status: HealthStatus) -> Response {
    (
        [(CACHE_CONTROL, "no-store, max-age=0")],
        Json(status),
    )
        .into_response()
}
