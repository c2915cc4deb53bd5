use serde_json::Value;

use super::Provider;

pub const DEFAULT_BASE_URL: &str = "https://api.resend.com";
pub const KEY_VAR: &str = "RESEND_API_KEY";

/// Resend: lists sending domains with a bearer token.
#[derive(Debug, Clone)]
pub struct Resend {
    base_url: String,
}

impl Resend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }
}

impl Default for Resend {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl Provider for Resend {
    fn name(&self) -> &'static str {
        "resend"
    }

    fn key_var(&self) -> &'static str {
        KEY_VAR
    }

    fn request(&self, client: &reqwest::Client, key: &str) -> reqwest::RequestBuilder {
        client
            .get(format!("{}/domains", self.base_url))
            .bearer_auth(key)
    }

    fn error_message(&self, body: &Value) -> Option<String> {
        body.get("message")
            .and_then(Value::as_str)
            .map(str::to_owned)
    }
}
