// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — loads configuration once and hands out rasterizers,
// the background-removal client, and sessions built from it.
//
// Rasterizers own a PDF backend that is neither `Send` nor `Sync`, so each
// session gets its own rather than sharing one.

use std::sync::Arc;

use photosheet_core::AppConfig;
use photosheet_core::error::Result;
use photosheet_document::{Rasterizer, RemoveBgClient};
use photosheet_layout::LayoutKind;
use photosheet_print::{ComposeOptions, SheetWriter};
use tracing::info;

use crate::session::Session;

/// Shared application services. Cheap to clone.
#[derive(Clone)]
pub struct AppServices {
    config: Arc<AppConfig>,
}

impl AppServices {
    /// Load configuration from the environment. Call once at startup.
    pub fn init() -> Result<Self> {
        let config = AppConfig::load()?;
        info!("app services initialised");
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// A rasterizer bound to this build's PDF renderer.
    pub fn rasterizer(&self) -> Result<Rasterizer> {
        Rasterizer::from_config(&self.config)
    }

    /// The background-removal client. Fails when no API key is configured.
    pub fn segmentation(&self) -> Result<RemoveBgClient> {
        RemoveBgClient::from_config(&self.config)
    }

    /// Compose options at the configured print resolution.
    pub fn compose_options(&self, cut_borders: bool) -> ComposeOptions {
        ComposeOptions {
            dpi: self.config.print_dpi,
            cut_borders,
        }
    }

    pub fn sheet_writer(&self) -> SheetWriter {
        SheetWriter::new()
    }

    /// Start a session with its own rasterizer.
    pub fn new_session(&self, layout: LayoutKind) -> Result<Session> {
        Ok(Session::new(self.rasterizer()?, layout))
    }
}
