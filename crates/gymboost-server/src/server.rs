use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{middleware, routing::get, Router};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::{
    handlers::{ai_health, health, load_image, resend_health, web_manifest},
    health::{gemini, probe, resend, Gemini, Resend},
    images::ImageConfig,
    secrets::Secrets,
    session::{refresh_session, PassThrough, RemoteSessionRefresher, SessionRefresher},
    AppState,
};

pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Option<String>,
    pub gemini_base_url: String,
    pub resend_base_url: String,
    /// Upper bound for outbound calls. `None` leaves it to the client defaults.
    pub probe_timeout: Option<Duration>,
    pub session_refresh_url: Option<String>,
    /// Remote image allow-list and body cap.
    pub images: ImageConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("GYMBOOST_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("GYMBOOST_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            cors_origins: std::env::var("GYMBOOST_CORS_ORIGINS").ok(),
            gemini_base_url: std::env::var("GYMBOOST_GEMINI_BASE_URL")
                .unwrap_or_else(|_| gemini::DEFAULT_BASE_URL.into()),
            resend_base_url: std::env::var("GYMBOOST_RESEND_BASE_URL")
                .unwrap_or_else(|_| resend::DEFAULT_BASE_URL.into()),
            probe_timeout: std::env::var("GYMBOOST_PROBE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs),
            session_refresh_url: std::env::var("GYMBOOST_SESSION_REFRESH_URL")
                .ok()
                .filter(|s| !s.is_empty()),
            images: ImageConfig::default(),
        }
    }
}

/// Builds handler state from config. Provider keys come from `secrets`.
pub fn build_state(cfg: &ServerConfig, secrets: Secrets) -> Result<AppState> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = cfg.probe_timeout {
        builder = builder.timeout(timeout);
    }
    let http = builder.build().context("build http client")?;

    // Redirects would bypass the allow-list; each hop must be checked up front.
    let mut builder = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none());
    if let Some(timeout) = cfg.probe_timeout {
        builder = builder.timeout(timeout);
    }
    let image_http = builder.build().context("build image client")?;

    let session: Arc<dyn SessionRefresher> = match &cfg.session_refresh_url {
        Some(url) => {
            info!(url = %url, "session refresh delegated to remote endpoint");
            Arc::new(RemoteSessionRefresher::new(url.clone())?)
        }
        None => Arc::new(PassThrough),
    };

    Ok(AppState {
        http,
        image_http,
        secrets,
        gemini: Arc::new(Gemini::new(cfg.gemini_base_url.clone())),
        resend: Arc::new(Resend::new(cfg.resend_base_url.clone())),
        images: Arc::new(cfg.images.clone()),
        session,
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/ai/health", get(ai_health))
        .route("/api/health/resend", get(resend_health))
        .route("/manifest.json", get(web_manifest))
        .route("/_image", get(load_image))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            refresh_session,
        ))
        .with_state(state)
}

pub async fn run(cfg: ServerConfig) -> Result<()> {
    let state = build_state(&cfg, Secrets::from_env())?;
    let cors = build_cors(cfg.cors_origins.as_deref());

    let app = router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .context("invalid host/port")?;

    info!(%addr, "gymboost console listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("bind listener")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received");
}

/// Runs both provider probes once, outside the HTTP server.
pub async fn check_providers(cfg: &ServerConfig, secrets: Secrets) -> Result<serde_json::Value> {
    let state = build_state(cfg, secrets)?;
    let (ai, email) = tokio::join!(
        probe(state.gemini.as_ref(), &state.http, &state.secrets),
        probe(state.resend.as_ref(), &state.http, &state.secrets),
    );
    Ok(json!({ "ai": ai, "resend": email }))
}

fn build_cors(origins: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([http::Method::GET, http::Method::HEAD, http::Method::OPTIONS])
        .allow_headers(Any);

    match origins {
        Some(o) => {
            let origins: Vec<_> = o
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            cors.allow_origin(origins)
        }
        None => cors.allow_origin(Any),
    }
}
