// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for people at the print counter.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives how a caller presents it: an inline note, a retry prompt,
// or a blocking alert.

use crate::error::{LockReason, PhotosheetError};

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Network blip or service hiccup; trying again may work.
    Transient,
    /// User must do something (enter a password, redraw the crop, pick a file).
    ActionRequired,
    /// Cannot be fixed by retrying (wrong format, damaged file).
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether the caller may offer to retry the same operation.
    pub retriable: bool,
    /// Severity level.
    pub severity: Severity,
}

/// Convert a `PhotosheetError` into a `HumanError`.
pub fn humanize_error(err: &PhotosheetError) -> HumanError {
    match err {
        PhotosheetError::UnsupportedFormat(detail) => HumanError {
            message: "This type of file can't be used.".into(),
            suggestion: format!("Choose a photo (JPEG, PNG, WebP) or a PDF. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        PhotosheetError::CorruptDocument(_) => HumanError {
            message: "This file couldn't be opened.".into(),
            suggestion: "The file may be damaged or only partly downloaded. Try saving it again, or choose a different file.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        PhotosheetError::DocumentLocked(reason) => humanize_lock(*reason),

        PhotosheetError::PageOutOfRange { page_count, .. } => HumanError {
            message: "That page doesn't exist.".into(),
            suggestion: format!("Pick a page between 1 and {page_count}."),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PhotosheetError::EmptyRegion { .. } => HumanError {
            message: "The selected area is empty.".into(),
            suggestion: "Drag a box over the part of the picture you want to print.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PhotosheetError::OutOfBounds { .. } => HumanError {
            message: "The selected area goes past the edge of the picture.".into(),
            suggestion: "Move or shrink the box so it stays inside the picture.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PhotosheetError::InvalidAdjustment(detail) => HumanError {
            message: "That setting isn't allowed.".into(),
            suggestion: format!("Keep brightness and contrast between 50% and 150%. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PhotosheetError::InvalidLayout(detail) => HumanError {
            message: "That layout can't be used.".into(),
            suggestion: format!("Check the photo count and custom sizes. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PhotosheetError::InvalidColour(detail) => HumanError {
            message: "That background colour isn't recognised.".into(),
            suggestion: format!("Use white, blue, or a hex code like #bfd7ea. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PhotosheetError::BackgroundService(detail) => humanize_background(detail),

        PhotosheetError::MissingContent(slot) => HumanError {
            message: format!("The {slot} picture hasn't been added yet."),
            suggestion: format!("Upload the {slot} picture, then print again."),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PhotosheetError::NoSource => HumanError {
            message: "No file is waiting to be opened.".into(),
            suggestion: "Choose a file first.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PhotosheetError::Encoding(_) => HumanError {
            message: "The print sheet couldn't be created.".into(),
            suggestion: "Try again. If it keeps happening, try a smaller photo.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        PhotosheetError::Config(detail) => HumanError {
            message: "The app settings are not valid.".into(),
            suggestion: format!("Check the configuration file and environment. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        PhotosheetError::Io(_) => HumanError {
            message: "A file couldn't be read or saved.".into(),
            suggestion: "Check that the file still exists and there's free disk space.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        PhotosheetError::Serialization(_) => HumanError {
            message: "Saved settings couldn't be read.".into(),
            suggestion: "The settings file may be damaged. Delete it to go back to defaults.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

fn humanize_lock(reason: LockReason) -> HumanError {
    match reason {
        LockReason::PasswordRequired => HumanError {
            message: "This PDF is password protected.".into(),
            suggestion: "Enter the document password to open it.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },
        LockReason::PasswordRejected => HumanError {
            message: "That password didn't work.".into(),
            suggestion: "Check the password and try again. Some documents use your date of birth or a code printed in the email.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },
        LockReason::Cancelled => HumanError {
            message: "The PDF wasn't opened.".into(),
            suggestion: "Choose the file again when you have the password.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}

/// Background-service failures carry the HTTP detail in their text; map the
/// common ones to something actionable.
fn humanize_background(detail: &str) -> HumanError {
    let lower = detail.to_lowercase();

    if lower.contains("auth") || lower.contains("api key") {
        HumanError {
            message: "The background remover isn't set up.".into(),
            suggestion: "Ask whoever runs this machine to check the background removal API key.".into(),
            retriable: false,
            severity: Severity::Permanent,
        }
    } else if lower.contains("quota") {
        HumanError {
            message: "The background remover has run out of credits.".into(),
            suggestion: "Print without changing the background, or top up the service account.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        }
    } else {
        HumanError {
            message: "The background couldn't be changed.".into(),
            suggestion: "Your photo is unchanged. Check the internet connection and try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        }
    }
}
