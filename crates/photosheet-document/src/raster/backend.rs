// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF rendering seam. The rasterizer only talks to these traits; Pdfium is
// the production implementation (feature `pdfium`).

use image::RgbaImage;
use photosheet_core::error::Result;

/// Opens PDF documents.
pub trait PdfBackend {
    /// Open `bytes`, trying `password` if the document is encrypted.
    ///
    /// A locked document must fail with
    /// `PhotosheetError::DocumentLocked(LockReason::PasswordRequired)` when
    /// `password` is `None` and `LockReason::PasswordRejected` when the given
    /// password is wrong. Unparseable input fails with `CorruptDocument`.
    fn open<'a>(&'a self, bytes: &[u8], password: Option<&str>) -> Result<Box<dyn PdfPages + 'a>>;
}

/// An opened PDF. Page indices are zero-based at this level.
pub trait PdfPages {
    fn page_count(&self) -> usize;

    /// Page size in PDF points (1/72 in).
    fn page_size_points(&self, index: usize) -> Result<(f32, f32)>;

    /// Render a page at `scale` times its point size.
    fn render(&self, index: usize, scale: f32) -> Result<RgbaImage>;
}
