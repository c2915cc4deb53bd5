use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::{
    header::{COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue, StatusCode,
};
use axum_test::TestServer;
use gymboost_server::{
    build_state,
    images::{ImageConfig, RemotePattern},
    router,
    secrets::Secrets,
    session::{RefreshFuture, RemoteSessionRefresher, SessionOutcome, SessionRefresher},
    AppState, ServerConfig,
};
use serde_json::Value;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn state() -> AppState {
    state_with_images(ImageConfig::default())
}

fn state_with_images(images: ImageConfig) -> AppState {
    let cfg = ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        cors_origins: None,
        gemini_base_url: "http://127.0.0.1:9".into(),
        resend_base_url: "http://127.0.0.1:9".into(),
        probe_timeout: None,
        session_refresh_url: None,
        images,
    };
    build_state(&cfg, Secrets::fixed(Vec::<(String, String)>::new())).unwrap()
}

fn server(state: AppState) -> TestServer {
    TestServer::new(router(state)).unwrap()
}

/// Counts refreshes and hands back one cookie.
#[derive(Clone, Default)]
struct Recording {
    calls: Arc<AtomicUsize>,
}

impl SessionRefresher for Recording {
    fn refresh(&self, _headers: HeaderMap) -> RefreshFuture {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            SessionOutcome::Continue {
                set_cookies: vec![HeaderValue::from_static("sb-access-token=fresh; Path=/")],
            }
        })
    }
}

// ── Service endpoints ────────────────────────────────────────────────────────

#[tokio::test]
async fn own_health_is_ok() {
    let resp = server(state()).get("/health").await;
    resp.assert_status_ok();
    assert_eq!(resp.json::<Value>()["status"], "ok");
}

#[tokio::test]
async fn manifest_is_served() {
    let resp = server(state()).get("/manifest.json").await;
    resp.assert_status_ok();
    assert_eq!(resp.header("content-type"), "application/manifest+json");

    let body = resp.json::<Value>();
    assert_eq!(body["short_name"], "GymBoost");
    assert_eq!(body["icons"].as_array().unwrap().len(), 2);
}

// ── Image loader ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn image_without_url_is_rejected() {
    let resp = server(state()).get("/_image").await;
    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
    assert!(resp.json::<Value>()["error"]
        .as_str()
        .unwrap()
        .contains("required"));
}

#[tokio::test]
async fn image_from_unlisted_host_is_rejected() {
    let resp = server(state())
        .get("/_image")
        .add_query_param("url", "https://example.com/cat.png")
        .await;
    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
    assert!(resp.json::<Value>()["error"]
        .as_str()
        .unwrap()
        .contains("not allowed"));
}

#[tokio::test]
async fn image_over_plain_http_is_rejected() {
    let resp = server(state())
        .get("/_image")
        .add_query_param("url", "http://images.unsplash.com/photo-1")
        .await;
    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
}

/// Allows `/img/**` on the given mock server and nothing else.
fn local_images(upstream: &MockServer, max_bytes: usize) -> ImageConfig {
    ImageConfig {
        remote_patterns: vec![RemotePattern {
            protocol: "http".into(),
            hostname: "127.0.0.1".into(),
            port: Some(upstream.address().port()),
            pathname: "/img/**".into(),
        }],
        max_bytes,
    }
}

#[tokio::test]
async fn image_is_relayed_with_upstream_type() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/cat.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"PNGDATA".to_vec(), "image/png"))
        .expect(1)
        .mount(&upstream)
        .await;

    let resp = server(state_with_images(local_images(&upstream, 1024)))
        .get("/_image")
        .add_query_param("url", format!("{}/img/cat.png", upstream.uri()))
        .await;

    resp.assert_status_ok();
    assert_eq!(resp.header("content-type"), "image/png");
    assert_eq!(resp.header("cache-control"), "public, max-age=60");
    assert_eq!(resp.text(), "PNGDATA");
}

#[tokio::test]
async fn image_upstream_not_found_is_bad_gateway() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&upstream)
        .await;

    let resp = server(state_with_images(local_images(&upstream, 1024)))
        .get("/_image")
        .add_query_param("url", format!("{}/img/missing.png", upstream.uri()))
        .await;

    assert_eq!(resp.status_code(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn non_image_upstream_is_bad_gateway() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/page.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
        .mount(&upstream)
        .await;

    let resp = server(state_with_images(local_images(&upstream, 1024)))
        .get("/_image")
        .add_query_param("url", format!("{}/img/page.png", upstream.uri()))
        .await;

    assert_eq!(resp.status_code(), StatusCode::BAD_GATEWAY);
    assert!(resp.json::<Value>()["error"]
        .as_str()
        .unwrap()
        .contains("not an image"));
}

#[tokio::test]
async fn image_redirect_to_unlisted_host_is_not_followed() {
    let elsewhere = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/secret.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"INTERNAL".to_vec(), "image/png"))
        .expect(0)
        .mount(&elsewhere)
        .await;

    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/pic.png"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/secret.png", elsewhere.uri())),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let resp = server(state_with_images(local_images(&upstream, 1024)))
        .get("/_image")
        .add_query_param("url", format!("{}/img/pic.png", upstream.uri()))
        .await;

    assert_eq!(resp.status_code(), StatusCode::BAD_GATEWAY);
    assert!(!resp.text().contains("INTERNAL"));
}

#[tokio::test]
async fn oversized_image_is_refused() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/big.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"0123456789".to_vec(), "image/png"))
        .mount(&upstream)
        .await;

    let resp = server(state_with_images(local_images(&upstream, 4)))
        .get("/_image")
        .add_query_param("url", format!("{}/img/big.png", upstream.uri()))
        .await;

    assert_eq!(resp.status_code(), StatusCode::BAD_GATEWAY);
    assert!(resp.json::<Value>()["error"]
        .as_str()
        .unwrap()
        .contains("exceeds 4 bytes"));
}

#[tokio::test]
async fn image_outside_allowed_path_is_rejected_before_fetch() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"X".to_vec(), "image/png"))
        .expect(0)
        .mount(&upstream)
        .await;

    let resp = server(state_with_images(local_images(&upstream, 1024)))
        .get("/_image")
        .add_query_param("url", format!("{}/private/x.png", upstream.uri()))
        .await;

    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
}

// ── Session refresh ──────────────────────────────────────────────────────────

#[tokio::test]
async fn pages_go_through_session_refresh() {
    let recording = Recording::default();
    let mut state = state();
    state.session = Arc::new(recording.clone());

    let resp = server(state).get("/manifest.json").await;

    resp.assert_status_ok();
    assert_eq!(recording.calls.load(Ordering::SeqCst), 1);
    assert_eq!(resp.header("set-cookie"), "sb-access-token=fresh; Path=/");
}

#[tokio::test]
async fn image_route_skips_session_refresh() {
    let recording = Recording::default();
    let mut state = state();
    state.session = Arc::new(recording.clone());

    let resp = server(state).get("/_image").await;

    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(recording.calls.load(Ordering::SeqCst), 0);
    assert!(resp.headers().get(SET_COOKIE).is_none());
}

#[tokio::test]
async fn remote_refresher_relays_cookies() {
    let auth = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(header("cookie", "sb-refresh-token=old"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "sb-access-token=new; Path=/; HttpOnly"),
        )
        .expect(1)
        .mount(&auth)
        .await;

    let mut state = state();
    state.session =
        Arc::new(RemoteSessionRefresher::new(format!("{}/auth/refresh", auth.uri())).unwrap());

    let resp = server(state)
        .get("/health")
        .add_header(COOKIE, HeaderValue::from_static("sb-refresh-token=old"))
        .await;

    resp.assert_status_ok();
    assert_eq!(
        resp.header("set-cookie"),
        "sb-access-token=new; Path=/; HttpOnly"
    );
}

#[tokio::test]
async fn remote_refresher_redirect_short_circuits() {
    let auth = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(307).insert_header("location", "/login"))
        .mount(&auth)
        .await;

    let mut state = state();
    state.session =
        Arc::new(RemoteSessionRefresher::new(format!("{}/auth/refresh", auth.uri())).unwrap());

    let resp = server(state).get("/manifest.json").await;

    assert_eq!(resp.status_code(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(resp.header("location"), "/login");
}

#[tokio::test]
async fn unreachable_auth_backend_does_not_block_requests() {
    let mut state = state();
    state.session = Arc::new(RemoteSessionRefresher::new("http://127.0.0.1:9/refresh").unwrap());

    let resp = server(state).get("/health").await;

    resp.assert_status_ok();
    assert!(resp.headers().get(SET_COOKIE).is_none());
}
