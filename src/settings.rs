use crate::overlay::model::{Color, MarkerStyle, MAX_MARKER_RADIUS};
use crate::search::client::normalize_base_url;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Environment variable overriding `backend_url`.
pub const BACKEND_URL_ENV: &str = "SCENE_SEARCH_URL";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// Base URL of the scene search backend. `/search` and `/videos/{id}` are
    /// resolved below it.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// Deadline for one search request, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Radius of a keypoint marker in display pixels.
    #[serde(default = "default_marker_radius")]
    pub marker_radius: u32,
    #[serde(default = "default_marker_color")]
    pub marker_color: Color,
    /// Give marker `i` the same colour on both surfaces so pairs can be told
    /// apart. When disabled every marker uses `marker_color`.
    #[serde(default = "default_label_markers")]
    pub label_markers: bool,
    /// When enabled the application initialises the logger at debug level.
    /// Defaults to `false` when the field is missing in the settings file.
    #[serde(default)]
    pub debug_logging: bool,
    /// Optional file the log is written to instead of stderr.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// Last known window size. If absent, a default size is used.
    #[serde(default)]
    pub window_size: Option<(f32, f32)>,
}

fn default_backend_url() -> String {
    "http://127.0.0.1:8000".into()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_marker_radius() -> u32 {
    3
}

fn default_marker_color() -> Color {
    Color::RED
}

fn default_label_markers() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            request_timeout_secs: default_request_timeout(),
            marker_radius: default_marker_radius(),
            marker_color: default_marker_color(),
            label_markers: default_label_markers(),
            debug_logging: false,
            log_file: None,
            window_size: None,
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&content).with_context(|| format!("parse settings file {path}"))
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Apply `SCENE_SEARCH_URL` if it is set and not blank.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            if !url.trim().is_empty() {
                tracing::info!("backend url overridden by {BACKEND_URL_ENV}: {url}");
                self.backend_url = url;
            }
        }
    }

    pub fn base_url(&self) -> anyhow::Result<Url> {
        normalize_base_url(&self.backend_url)
            .with_context(|| format!("invalid backend url '{}'", self.backend_url))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn marker_style(&self) -> MarkerStyle {
        MarkerStyle {
            radius: self.marker_radius.clamp(1, MAX_MARKER_RADIUS),
            color: self.marker_color,
            color_key: self.label_markers,
        }
    }
}
