// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rasterizer — decode a photo, or open a PDF and render one of its pages, into
// a `RasterFrame`. Locked PDFs go through a suspend/resume password loop.

use std::io::Cursor;

use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageError, ImageReader};
use photosheet_core::AppConfig;
use photosheet_core::error::{LockReason, PhotosheetError, Result};
use photosheet_core::types::SourceOrigin;
use tracing::{debug, info, instrument, warn};

use super::backend::{PdfBackend, PdfPages};
use super::frame::RasterFrame;
use crate::source::SourceDocument;

/// Supplies passwords for locked PDFs.
///
/// Returning `None` cancels the unlock.
pub trait PasswordPrompt {
    /// `attempt` counts prompts from 1. `rejected` is true when the previous
    /// password was tried and refused.
    fn request_password(&mut self, attempt: u32, rejected: bool) -> Option<String>;
}

impl<F> PasswordPrompt for F
where
    F: FnMut(u32, bool) -> Option<String>,
{
    fn request_password(&mut self, attempt: u32, rejected: bool) -> Option<String> {
        self(attempt, rejected)
    }
}

/// Decodes sources into raster frames.
pub struct Rasterizer {
    pdf: Option<Box<dyn PdfBackend>>,
    default_render_scale: f32,
    max_render_dimension: u32,
    max_password_attempts: u32,
}

impl Rasterizer {
    /// Create a rasterizer with default limits. Without a PDF backend only
    /// photos can be opened.
    pub fn new(pdf: Option<Box<dyn PdfBackend>>) -> Self {
        Self::with_config(pdf, &AppConfig::default())
    }

    /// Create a rasterizer using the render limits from `config`.
    pub fn with_config(pdf: Option<Box<dyn PdfBackend>>, config: &AppConfig) -> Self {
        Self {
            pdf,
            default_render_scale: config.pdf_render_scale,
            max_render_dimension: config.max_render_dimension,
            max_password_attempts: config.max_password_attempts,
        }
    }

    /// Create a rasterizer bound to Pdfium.
    #[cfg(feature = "pdfium")]
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let backend = super::pdfium::PdfiumBackend::bind(config.pdfium_library_path.as_deref())?;
        Ok(Self::with_config(Some(Box::new(backend)), config))
    }

    /// Create a photo-only rasterizer (this build has no PDF renderer).
    #[cfg(not(feature = "pdfium"))]
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        warn!("built without the `pdfium` feature; PDF sources will be rejected");
        Ok(Self::with_config(None, config))
    }

    /// Whether PDF sources can be opened.
    pub fn supports_pdf(&self) -> bool {
        self.pdf.is_some()
    }

    pub fn default_render_scale(&self) -> f32 {
        self.default_render_scale
    }

    pub fn max_password_attempts(&self) -> u32 {
        self.max_password_attempts
    }

    /// Open a source so its pages can be inspected and rendered.
    #[instrument(skip_all, fields(origin = ?source.origin(), has_password = password.is_some()))]
    pub fn open<'a>(
        &'a self,
        source: &SourceDocument,
        password: Option<&str>,
    ) -> Result<OpenedSource<'a>> {
        match source.origin() {
            SourceOrigin::UploadedImage => Ok(OpenedSource::Image(decode_image(source.bytes())?)),
            SourceOrigin::PdfPage => {
                let backend = self.pdf.as_deref().ok_or_else(|| {
                    PhotosheetError::UnsupportedFormat(
                        "PDF rendering is not available in this build".into(),
                    )
                })?;
                let pages = backend.open(source.bytes(), password)?;
                let page_count = pages.page_count();
                if page_count == 0 {
                    return Err(PhotosheetError::CorruptDocument("PDF has no pages".into()));
                }
                info!(page_count, "PDF opened");
                Ok(OpenedSource::Pdf(OpenedPdf {
                    pages,
                    max_render_dimension: self.max_render_dimension,
                }))
            }
        }
    }

    /// Open a source, asking `prompt` for passwords until the document
    /// unlocks, the prompt cancels, or the attempt limit is reached.
    ///
    /// The source's own password, if any, is tried before the first prompt.
    pub fn open_with_prompt<'a>(
        &'a self,
        source: &SourceDocument,
        prompt: &mut dyn PasswordPrompt,
    ) -> Result<OpenedSource<'a>> {
        let mut password = source.password().map(str::to_owned);
        let mut attempt = 0u32;

        loop {
            match self.open(source, password.as_deref()) {
                Err(PhotosheetError::DocumentLocked(reason)) if reason != LockReason::Cancelled => {
                    if attempt >= self.max_password_attempts {
                        warn!(attempt, "password attempts exhausted");
                        return Err(PhotosheetError::DocumentLocked(LockReason::PasswordRejected));
                    }
                    attempt += 1;
                    let rejected = reason == LockReason::PasswordRejected;
                    debug!(attempt, rejected, "requesting password");
                    match prompt.request_password(attempt, rejected) {
                        Some(next) => password = Some(next),
                        None => {
                            info!(attempt, "unlock cancelled by caller");
                            return Err(PhotosheetError::DocumentLocked(LockReason::Cancelled));
                        }
                    }
                }
                other => return other,
            }
        }
    }

    /// Decode `source` and return one page as a frame.
    ///
    /// `page_number` is 1-based and defaults to the first page. `render_scale`
    /// applies to PDFs only and defaults to the configured scale.
    pub fn rasterize(
        &self,
        source: &SourceDocument,
        page_number: Option<usize>,
        render_scale: Option<f32>,
    ) -> Result<RasterFrame> {
        let opened = self.open(source, source.password())?;
        opened.render_page(
            page_number.unwrap_or(1),
            render_scale.unwrap_or(self.default_render_scale),
        )
    }
}

/// A decoded photo or an opened PDF.
pub enum OpenedSource<'a> {
    Image(RasterFrame),
    Pdf(OpenedPdf<'a>),
}

impl OpenedSource<'_> {
    /// Number of pages; a photo has one.
    pub fn page_count(&self) -> usize {
        match self {
            Self::Image(_) => 1,
            Self::Pdf(pdf) => pdf.pages.page_count(),
        }
    }

    /// Render page `page_number` (1-based). Photos ignore `render_scale`.
    pub fn render_page(&self, page_number: usize, render_scale: f32) -> Result<RasterFrame> {
        match self {
            Self::Image(frame) => {
                if page_number != 1 {
                    return Err(PhotosheetError::PageOutOfRange {
                        requested: page_number,
                        page_count: 1,
                    });
                }
                Ok(frame.clone())
            }
            Self::Pdf(pdf) => pdf.render_page(page_number, render_scale),
        }
    }
}

/// An unlocked PDF ready for page rendering.
pub struct OpenedPdf<'a> {
    pages: Box<dyn PdfPages + 'a>,
    max_render_dimension: u32,
}

impl OpenedPdf<'_> {
    #[instrument(skip(self), fields(page_number, render_scale))]
    fn render_page(&self, page_number: usize, render_scale: f32) -> Result<RasterFrame> {
        let page_count = self.pages.page_count();
        if page_number == 0 || page_number > page_count {
            return Err(PhotosheetError::PageOutOfRange {
                requested: page_number,
                page_count,
            });
        }
        if !(render_scale.is_finite() && render_scale > 0.0) {
            return Err(PhotosheetError::Config(format!(
                "render scale must be positive, got {render_scale}"
            )));
        }

        let index = page_number - 1;
        let (width_pt, height_pt) = self.pages.page_size_points(index)?;
        let scale = clamp_render_scale(width_pt, height_pt, render_scale, self.max_render_dimension);
        if scale < render_scale {
            warn!(
                requested = render_scale,
                used = scale,
                max_dimension = self.max_render_dimension,
                "render scale reduced to stay within pixel limit"
            );
        }

        let pixels = self.pages.render(index, scale)?;
        info!(
            width = pixels.width(),
            height = pixels.height(),
            "PDF page rendered"
        );
        Ok(RasterFrame::new(pixels))
    }
}

/// Largest scale not exceeding `requested` that keeps the longest rendered
/// side within `max_dimension` pixels.
fn clamp_render_scale(width_pt: f32, height_pt: f32, requested: f32, max_dimension: u32) -> f32 {
    let longest = width_pt.max(height_pt);
    if longest <= 0.0 {
        return requested;
    }
    requested.min(max_dimension as f32 / longest)
}

/// Decode a photo at native resolution, honouring EXIF orientation.
fn decode_image(bytes: &[u8]) -> Result<RasterFrame> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|err| PhotosheetError::CorruptDocument(format!("unreadable image: {err}")))?;
    let mut decoder = reader.into_decoder().map_err(map_decode_error)?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut image = DynamicImage::from_decoder(decoder).map_err(map_decode_error)?;
    image.apply_orientation(orientation);

    debug!(
        width = image.width(),
        height = image.height(),
        ?orientation,
        "image decoded"
    );
    Ok(RasterFrame::new(image.to_rgba8()))
}

fn map_decode_error(err: ImageError) -> PhotosheetError {
    match err {
        ImageError::Unsupported(detail) => PhotosheetError::UnsupportedFormat(detail.to_string()),
        other => PhotosheetError::CorruptDocument(format!("failed to decode image: {other}")),
    }
}
