// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster frames — a decoded bitmap plus the size it is shown at on screen.

use image::RgbaImage;
use photosheet_core::error::{PhotosheetError, Result};

/// A decoded RGBA bitmap.
///
/// The pixel buffer is always at native (decode) resolution. The display size
/// is the size of the on-screen preview the user draws crop rectangles on;
/// it defaults to the native size.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterFrame {
    pixels: RgbaImage,
    display_width: u32,
    display_height: u32,
}

impl RasterFrame {
    /// Wrap a bitmap, displayed at its native size.
    pub fn new(pixels: RgbaImage) -> Self {
        let (display_width, display_height) = pixels.dimensions();
        Self {
            pixels,
            display_width,
            display_height,
        }
    }

    /// Record the size the frame is displayed at.
    pub fn with_display_size(mut self, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PhotosheetError::EmptyRegion {
                width: width as f64,
                height: height as f64,
            });
        }
        self.display_width = width;
        self.display_height = height;
        Ok(self)
    }

    /// Display the frame inside a `max_width` x `max_height` box, preserving
    /// aspect ratio. Never enlarges.
    pub fn fit_display(self, max_width: u32, max_height: u32) -> Result<Self> {
        let (w, h) = self.pixels.dimensions();
        let scale = (max_width as f64 / w as f64)
            .min(max_height as f64 / h as f64)
            .min(1.0);
        let dw = ((w as f64 * scale).round() as u32).max(1);
        let dh = ((h as f64 * scale).round() as u32).max(1);
        self.with_display_size(dw, dh)
    }

    pub fn native_width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn native_height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn display_width(&self) -> u32 {
        self.display_width
    }

    pub fn display_height(&self) -> u32 {
        self.display_height
    }

    /// Native pixels per display pixel, horizontally and vertically.
    pub fn scale_factors(&self) -> (f64, f64) {
        (
            self.native_width() as f64 / self.display_width as f64,
            self.native_height() as f64 / self.display_height as f64,
        )
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_pixels(self) -> RgbaImage {
        self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_display_preserves_aspect() {
        let frame = RasterFrame::new(RgbaImage::new(3000, 4000))
            .fit_display(600, 1000)
            .unwrap();
        assert_eq!((frame.display_width(), frame.display_height()), (600, 800));
        assert_eq!(frame.scale_factors(), (5.0, 5.0));
    }

    #[test]
    fn fit_display_never_enlarges() {
        let frame = RasterFrame::new(RgbaImage::new(100, 50))
            .fit_display(1000, 1000)
            .unwrap();
        assert_eq!((frame.display_width(), frame.display_height()), (100, 50));
    }

    #[test]
    fn zero_display_size_is_rejected() {
        assert!(RasterFrame::new(RgbaImage::new(10, 10))
            .with_display_size(0, 10)
            .is_err());
    }
}
