// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pdfium-backed PDF rendering.
//
// Library lookup order: `vendor/pdfium/lib` under the working directory, then
// the configured path, then the system library search path.

use std::path::Path;

use image::RgbaImage;
use pdfium_render::prelude::*;
use photosheet_core::error::{LockReason, PhotosheetError, Result};
use tracing::{debug, info, warn};

use super::backend::{PdfBackend, PdfPages};

/// Renders PDF pages through a bound Pdfium library.
pub struct PdfiumBackend {
    pdfium: Pdfium,
}

impl PdfiumBackend {
    /// Bind to Pdfium, optionally at an explicit library directory.
    pub fn bind(library_dir: Option<&Path>) -> Result<Self> {
        let vendor_dir = std::env::current_dir()
            .ok()
            .map(|dir| dir.join("vendor/pdfium/lib"))
            .filter(|dir| dir.exists());

        for dir in vendor_dir.iter().map(|d| d.as_path()).chain(library_dir) {
            let lib = Pdfium::pdfium_platform_library_name_at_path(dir);
            match Pdfium::bind_to_library(&lib) {
                Ok(bindings) => {
                    info!(path = %dir.display(), "bound Pdfium library");
                    return Ok(Self {
                        pdfium: Pdfium::new(bindings),
                    });
                }
                Err(err) => debug!(path = %dir.display(), error = %err, "Pdfium not usable here"),
            }
        }

        let bindings = Pdfium::bind_to_system_library().map_err(|err| {
            warn!(error = %err, "no Pdfium library found");
            PhotosheetError::UnsupportedFormat(format!("PDF renderer unavailable: {err}"))
        })?;
        info!("bound system Pdfium library");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl PdfBackend for PdfiumBackend {
    fn open<'a>(&'a self, bytes: &[u8], password: Option<&str>) -> Result<Box<dyn PdfPages + 'a>> {
        let document = self
            .pdfium
            .load_pdf_from_byte_vec(bytes.to_vec(), password)
            .map_err(|err| map_open_error(err, password.is_some()))?;
        Ok(Box::new(PdfiumPages { document }))
    }
}

struct PdfiumPages<'a> {
    document: PdfDocument<'a>,
}

impl PdfiumPages<'_> {
    fn page(&self, index: usize) -> Result<PdfPage<'_>> {
        let count = self.page_count();
        let out_of_range = || PhotosheetError::PageOutOfRange {
            requested: index + 1,
            page_count: count,
        };
        let index = u16::try_from(index).map_err(|_| out_of_range())?;
        self.document.pages().get(index).map_err(|_| out_of_range())
    }
}

impl PdfPages for PdfiumPages<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_size_points(&self, index: usize) -> Result<(f32, f32)> {
        let page = self.page(index)?;
        Ok((page.width().value, page.height().value))
    }

    fn render(&self, index: usize, scale: f32) -> Result<RgbaImage> {
        let page = self.page(index)?;
        let config = PdfRenderConfig::new().scale_page_by_factor(scale);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|err| PhotosheetError::CorruptDocument(format!("page render failed: {err}")))?;
        Ok(bitmap.as_image().into_rgba8())
    }
}

fn map_open_error(err: PdfiumError, had_password: bool) -> PhotosheetError {
    match err {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            let reason = if had_password {
                LockReason::PasswordRejected
            } else {
                LockReason::PasswordRequired
            };
            PhotosheetError::DocumentLocked(reason)
        }
        other => PhotosheetError::CorruptDocument(format!("failed to open PDF: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn password_error() -> PdfiumError {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError)
    }

    #[test]
    fn password_error_without_password_asks_for_one() {
        let err = map_open_error(password_error(), false);
        assert!(matches!(
            err,
            PhotosheetError::DocumentLocked(LockReason::PasswordRequired)
        ));
    }

    #[test]
    fn password_error_with_password_is_a_rejection() {
        let err = map_open_error(password_error(), true);
        assert!(matches!(
            err,
            PhotosheetError::DocumentLocked(LockReason::PasswordRejected)
        ));
    }

    #[test]
    fn format_error_is_corrupt() {
        let err = map_open_error(
            PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::FormatError),
            true,
        );
        assert!(matches!(err, PhotosheetError::CorruptDocument(_)));
    }

    #[test]
    fn bound_library_rejects_garbage() {
        // Skipped when no Pdfium library is installed.
        let Ok(backend) = PdfiumBackend::bind(None) else {
            return;
        };
        assert!(backend.open(b"%PDF-1.7 not really", None).is_err());
    }
}
