//! Remote image allow-list.

use serde::{Deserialize, Serialize};

/// One permitted remote image source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePattern {
    pub protocol: String,
    pub hostname: String,
    /// `None` accepts only the scheme's default port.
    #[serde(default)]
    pub port: Option<u16>,
    /// `**` matches any remaining segments, `*` exactly one.
    pub pathname: String,
}

impl RemotePattern {
    pub fn https(hostname: &str, pathname: &str) -> Self {
        Self {
            protocol: "https".into(),
            hostname: hostname.into(),
            port: None,
            pathname: pathname.into(),
        }
    }

    fn matches(&self, uri: &http::Uri) -> bool {
        if uri.scheme_str() != Some(self.protocol.as_str()) {
            return false;
        }
        if uri.host().map(|h| h.eq_ignore_ascii_case(&self.hostname)) != Some(true) {
            return false;
        }
        let port_ok = match (self.port, uri.port_u16()) {
            (Some(want), got) => got == Some(want),
            (None, None) => true,
            (None, Some(got)) => Some(got) == default_port(&self.protocol),
        };
        if !port_ok {
            return false;
        }
        let pattern: Vec<&str> = segments(&self.pathname);
        let path: Vec<&str> = segments(uri.path());
        glob_match(&pattern, &path)
    }
}

/// Largest remote image body the loader will relay.
pub const DEFAULT_MAX_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageConfig {
    pub remote_patterns: Vec<RemotePattern>,
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_max_bytes() -> usize {
    DEFAULT_MAX_BYTES
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            remote_patterns: vec![
                RemotePattern::https("images.unsplash.com", "/**"),
                RemotePattern::https("lh3.googleusercontent.com", "/**"),
                RemotePattern::https("avatars.githubusercontent.com", "/u/**"),
                RemotePattern::https("www.gravatar.com", "/avatar/**"),
                RemotePattern::https("res.cloudinary.com", "/**"),
            ],
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

impl ImageConfig {
    /// Returns true when `url` may be loaded as a remote image.
    pub fn is_allowed(&self, url: &str) -> bool {
        let Ok(uri) = url.parse::<http::Uri>() else {
            return false;
        };
        self.remote_patterns.iter().any(|p| p.matches(&uri))
    }
}

fn default_port(protocol: &str) -> Option<u16> {
    match protocol {
        "https" => Some(443),
        "http" => Some(80),
        _ => None,
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn glob_match(pattern: &[&str], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((&"**", rest)) => (0..=path.len()).any(|i| glob_match(rest, &path[i..])),
        Some((&seg, rest)) => match path.split_first() {
            Some((&p, path_rest)) => (seg == "*" || seg == p) && glob_match(rest, path_rest),
            None => false,
        },
    }
}
