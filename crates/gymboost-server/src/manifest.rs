use serde::{Deserialize, Serialize};

pub const CONTENT_TYPE: &str = "application/manifest+json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestIcon {
    pub src: String,
    pub sizes: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

/// Installable web app descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebAppManifest {
    pub name: String,
    pub short_name: String,
    pub description: String,
    pub start_url: String,
    pub display: String,
    pub background_color: String,
    pub theme_color: String,
    pub icons: Vec<ManifestIcon>,
}

impl WebAppManifest {
    pub fn console() -> Self {
        Self {
            name: "GymBoost Console".into(),
            short_name: "GymBoost".into(),
            description: "Administrative console for GymBoost".into(),
            start_url: "/".into(),
            display: "standalone".into(),
            background_color: "#0a0a0a".into(),
            theme_color: "#10b981".into(),
            icons: vec![icon(192), icon(512)],
        }
    }
}

fn icon(size: u32) -> ManifestIcon {
    ManifestIcon {
        src: format!("/icon-{size}x{size}.png"),
        sizes: format!("{size}x{size}"),
        mime_type: "image/png".into(),
    }
}
