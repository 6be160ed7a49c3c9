// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.
//
// Resolution order: built-in defaults, then an optional JSON file named by
// `PHOTOSHEET_CONFIG`, then individual `PHOTOSHEET_*` environment overrides.
// None of the layout or crop logic reads configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PhotosheetError, Result};

/// Environment variable naming an optional JSON config file.
pub const CONFIG_PATH_VAR: &str = "PHOTOSHEET_CONFIG";

const ENV_API_KEY: &str = "PHOTOSHEET_REMOVE_BG_API_KEY";
const ENV_ENDPOINT: &str = "PHOTOSHEET_REMOVE_BG_ENDPOINT";
const ENV_TIMEOUT: &str = "PHOTOSHEET_REMOVE_BG_TIMEOUT_SECS";
const ENV_RENDER_SCALE: &str = "PHOTOSHEET_PDF_RENDER_SCALE";
const ENV_PRINT_DPI: &str = "PHOTOSHEET_PRINT_DPI";
const ENV_PDFIUM_PATH: &str = "PHOTOSHEET_PDFIUM_PATH";

/// Default background-removal endpoint (remove.bg v1 API).
pub const DEFAULT_REMOVE_BG_ENDPOINT: &str = "https://api.remove.bg/v1.0/removebg";

/// Runtime settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// API key for the background-removal service. Background replacement is
    /// unavailable without one.
    pub remove_bg_api_key: Option<String>,
    /// Background-removal endpoint URL.
    pub remove_bg_endpoint: String,
    /// Request timeout for background removal, in seconds.
    pub remove_bg_timeout_secs: u64,
    /// Multiplier on a PDF page's point size when rasterising. High values keep
    /// small print (ID numbers) legible after the page is cropped and shrunk.
    pub pdf_render_scale: f32,
    /// Longest side, in pixels, a rendered PDF page may have.
    pub max_render_dimension: u32,
    /// Password attempts allowed before an unlock is abandoned.
    pub max_password_attempts: u32,
    /// Resolution at which sheets are composed.
    pub print_dpi: u32,
    /// Explicit location of the Pdfium shared library.
    pub pdfium_library_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            remove_bg_api_key: None,
            remove_bg_endpoint: DEFAULT_REMOVE_BG_ENDPOINT.into(),
            remove_bg_timeout_secs: 30,
            pdf_render_scale: 8.0,
            max_render_dimension: 10_000,
            max_password_attempts: 5,
            print_dpi: 300,
            pdfium_library_path: None,
        }
    }
}

// The API key must never end up in logs.
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field(
                "remove_bg_api_key",
                &self.remove_bg_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("remove_bg_endpoint", &self.remove_bg_endpoint)
            .field("remove_bg_timeout_secs", &self.remove_bg_timeout_secs)
            .field("pdf_render_scale", &self.pdf_render_scale)
            .field("max_render_dimension", &self.max_render_dimension)
            .field("max_password_attempts", &self.max_password_attempts)
            .field("print_dpi", &self.print_dpi)
            .field("pdfium_library_path", &self.pdfium_library_path)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var_os(CONFIG_PATH_VAR) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        info!(config = ?config, "configuration loaded");
        Ok(config)
    }

    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        debug!(path = %path.display(), "config file read");
        Ok(config)
    }

    /// Apply `PHOTOSHEET_*` overrides using `lookup` to read variables.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(key) = lookup(ENV_API_KEY).filter(|k| !k.trim().is_empty()) {
            self.remove_bg_api_key = Some(key.trim().to_string());
        }
        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            self.remove_bg_endpoint = endpoint;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT) {
            self.remove_bg_timeout_secs = parse_env(ENV_TIMEOUT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_RENDER_SCALE) {
            self.pdf_render_scale = parse_env(ENV_RENDER_SCALE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_PRINT_DPI) {
            self.print_dpi = parse_env(ENV_PRINT_DPI, &raw)?;
        }
        if let Some(path) = lookup(ENV_PDFIUM_PATH) {
            self.pdfium_library_path = Some(PathBuf::from(path));
        }
        Ok(())
    }

    /// Reject values no pipeline stage can work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.pdf_render_scale.is_finite() && self.pdf_render_scale > 0.0) {
            return Err(PhotosheetError::Config(format!(
                "pdf_render_scale must be positive, got {}",
                self.pdf_render_scale
            )));
        }
        if self.print_dpi == 0 {
            return Err(PhotosheetError::Config("print_dpi must be positive".into()));
        }
        if self.max_password_attempts == 0 {
            return Err(PhotosheetError::Config(
                "max_password_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| PhotosheetError::Config(format!("{key}={raw:?} is not a valid value")))
}
