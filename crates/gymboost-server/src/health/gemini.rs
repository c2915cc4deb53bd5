use serde_json::Value;

use super::Provider;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const KEY_VAR: &str = "GEMINI_API_KEY";

/// Google Gemini: lists models with the key passed as a query parameter.
#[derive(Debug, Clone)]
pub struct Gemini {
    base_url: String,
}

impl Gemini {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }
}

impl Default for Gemini {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl Provider for Gemini {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn key_var(&self) -> &'static str {
        KEY_VAR
    }

    fn request(&self, client: &reqwest::Client, key: &str) -> reqwest::RequestBuilder {
        client
            .get(format!("{}/v1beta/models", self.base_url))
            .query(&[("key", key)])
    }

    fn error_message(&self, body: &Value) -> Option<String> {
        body.pointer("/error/message")
            .and_then(Value::as_str)
            .map(str::to_owned)
    }
}
