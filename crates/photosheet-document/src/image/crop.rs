// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Crop engine — map a rectangle drawn on the display-scaled preview back to
// native pixels and cut it out at full resolution.

use image::imageops;
use photosheet_core::error::{PhotosheetError, Result};
use photosheet_core::types::CropRegion;
use tracing::{debug, instrument};

use crate::raster::frame::RasterFrame;

/// Slack allowed when a display-space region touches the frame edge.
const BOUNDS_TOLERANCE: f64 = 1e-6;

/// A crop rectangle in native pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Crop `frame` to `region`, which is in display-space units.
///
/// The output is at native resolution and is displayed at its native size.
#[instrument(skip(frame), fields(region = %region))]
pub fn crop(frame: &RasterFrame, region: &CropRegion) -> Result<RasterFrame> {
    let rect = native_rect(frame, region)?;
    debug!(?rect, "native crop rectangle");
    let pixels = imageops::crop_imm(frame.pixels(), rect.x, rect.y, rect.width, rect.height)
        .to_image();
    Ok(RasterFrame::new(pixels))
}

/// Validate `region` against the frame's display bounds and convert it to
/// native pixel coordinates.
///
/// Size is `round(extent * scale)` on each axis. If rounding pushes the
/// rectangle past the native edge the origin is pulled back so the size is
/// kept.
pub fn native_rect(frame: &RasterFrame, region: &CropRegion) -> Result<NativeRect> {
    let values = [region.x, region.y, region.width, region.height];
    if values.iter().any(|v| !v.is_finite()) {
        return Err(out_of_bounds(frame, region));
    }
    if region.width <= 0.0 || region.height <= 0.0 {
        return Err(PhotosheetError::EmptyRegion {
            width: region.width,
            height: region.height,
        });
    }

    let display_w = frame.display_width() as f64;
    let display_h = frame.display_height() as f64;
    if region.x < -BOUNDS_TOLERANCE
        || region.y < -BOUNDS_TOLERANCE
        || region.x + region.width > display_w + BOUNDS_TOLERANCE
        || region.y + region.height > display_h + BOUNDS_TOLERANCE
    {
        return Err(out_of_bounds(frame, region));
    }

    let (sx, sy) = frame.scale_factors();
    let (x, width) = axis(region.x, region.width, sx, frame.native_width());
    let (y, height) = axis(region.y, region.height, sy, frame.native_height());
    if width == 0 || height == 0 {
        return Err(PhotosheetError::EmptyRegion {
            width: region.width,
            height: region.height,
        });
    }

    Ok(NativeRect {
        x,
        y,
        width,
        height,
    })
}

fn axis(offset: f64, extent: f64, scale: f64, native: u32) -> (u32, u32) {
    let size = ((extent * scale).round().max(0.0) as u32).min(native);
    let origin = ((offset.max(0.0) * scale).round() as u32).min(native - size);
    (origin, size)
}

fn out_of_bounds(frame: &RasterFrame, region: &CropRegion) -> PhotosheetError {
    PhotosheetError::OutOfBounds {
        region: region.to_string(),
        bounds: format!("{}x{}", frame.display_width(), frame.display_height()),
    }
}
