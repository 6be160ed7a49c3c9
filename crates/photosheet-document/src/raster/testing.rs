// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory PDF backend for tests. Pages are synthetic gradients of a given
// point size; an optional password locks the document.

use image::{Rgba, RgbaImage};
use photosheet_core::error::{LockReason, PhotosheetError, Result};

use super::backend::{PdfBackend, PdfPages};

/// A fake PDF renderer. Any input starting with `%PDF-` opens.
#[derive(Debug, Clone)]
pub struct FakePdfBackend {
    pages: Vec<(f32, f32)>,
    password: Option<String>,
}

impl FakePdfBackend {
    /// A document whose pages have the given sizes in points.
    pub fn new(pages: Vec<(f32, f32)>) -> Self {
        Self {
            pages,
            password: None,
        }
    }

    /// Require `password` to open.
    pub fn locked(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

impl PdfBackend for FakePdfBackend {
    fn open<'a>(&'a self, bytes: &[u8], password: Option<&str>) -> Result<Box<dyn PdfPages + 'a>> {
        if !bytes.starts_with(b"%PDF-") {
            return Err(PhotosheetError::CorruptDocument("not a PDF".into()));
        }
        match (&self.password, password) {
            (None, _) => {}
            (Some(_), None) => {
                return Err(PhotosheetError::DocumentLocked(LockReason::PasswordRequired));
            }
            (Some(expected), Some(given)) if expected == given => {}
            (Some(_), Some(_)) => {
                return Err(PhotosheetError::DocumentLocked(LockReason::PasswordRejected));
            }
        }
        Ok(Box::new(FakePages { pages: &self.pages }))
    }
}

struct FakePages<'a> {
    pages: &'a [(f32, f32)],
}

impl PdfPages for FakePages<'_> {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size_points(&self, index: usize) -> Result<(f32, f32)> {
        self.pages.get(index).copied().ok_or(PhotosheetError::PageOutOfRange {
            requested: index + 1,
            page_count: self.pages.len(),
        })
    }

    fn render(&self, index: usize, scale: f32) -> Result<RgbaImage> {
        let (w, h) = self.page_size_points(index)?;
        let width = ((w * scale).round() as u32).max(1);
        let height = ((h * scale).round() as u32).max(1);
        Ok(RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        }))
    }
}
