use std::sync::Arc;

pub mod handlers;
pub mod health;
pub mod images;
pub mod manifest;
pub mod secrets;
pub mod server;
pub mod session;
pub mod util;

/// Shared application state threaded through axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Outbound client for provider probes.
    pub http: reqwest::Client,
    /// Outbound client for remote images; never follows redirects.
    pub image_http: reqwest::Client,
    /// Provider keys, resolved per request.
    pub secrets: secrets::Secrets,
    pub gemini: Arc<health::Gemini>,
    pub resend: Arc<health::Resend>,
    /// Remote image allow-list.
    pub images: Arc<images::ImageConfig>,
    /// Auth backend consulted by the session middleware.
    pub session: Arc<dyn session::SessionRefresher>,
}

pub use server::{build_state, check_providers, router, run, ServerConfig};
