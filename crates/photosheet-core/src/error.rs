// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Photosheet.

use thiserror::Error;

use crate::types::Slot;

/// Why a PDF could not be unlocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockReason {
    /// The document is encrypted and no password was supplied.
    PasswordRequired,
    /// A password was supplied but the document rejected it.
    PasswordRejected,
    /// The caller abandoned the password prompt.
    Cancelled,
}

impl std::fmt::Display for LockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::PasswordRequired => "password required",
            Self::PasswordRejected => "password rejected",
            Self::Cancelled => "unlock cancelled",
        };
        f.write_str(text)
    }
}

/// Top-level error type for all Photosheet operations.
#[derive(Debug, Error)]
pub enum PhotosheetError {
    // -- Rasterizer --
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("document could not be decoded: {0}")]
    CorruptDocument(String),

    #[error("document is locked: {0}")]
    DocumentLocked(LockReason),

    #[error("page {requested} out of range (document has {page_count} pages)")]
    PageOutOfRange { requested: usize, page_count: usize },

    // -- Crop --
    #[error("crop region is empty ({width} x {height})")]
    EmptyRegion { width: f64, height: f64 },

    #[error("crop region {region} exceeds frame bounds {bounds}")]
    OutOfBounds { region: String, bounds: String },

    // -- Adjustments / layout --
    #[error("invalid adjustment: {0}")]
    InvalidAdjustment(String),

    #[error("invalid layout: {0}")]
    InvalidLayout(String),

    #[error("invalid colour: {0}")]
    InvalidColour(String),

    // -- Background removal --
    #[error("background removal failed: {0}")]
    BackgroundService(String),

    // -- Pipeline --
    #[error("no content loaded for the {0} slot")]
    MissingContent(Slot),

    #[error("no source document is pending")]
    NoSource,

    // -- Output --
    #[error("encoding failed: {0}")]
    Encoding(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PhotosheetError>;
