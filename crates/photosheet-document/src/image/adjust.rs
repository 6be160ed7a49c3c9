// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Adjustment baker — brightness then contrast, always applied to the
// untouched baseline so repeated edits never compound.

use image::{Rgba, RgbaImage};
use photosheet_core::types::AdjustmentParams;
use tracing::{debug, instrument};

/// Produce an adjusted copy of `baseline`. The baseline is never modified.
///
/// Brightness scales each colour channel by `brightness_pct / 100`; contrast
/// then scales the distance from mid-grey (128) by `contrast_pct / 100`. Each
/// stage clamps to [0, 255]. Alpha passes through.
#[instrument(skip(baseline), fields(
    width = baseline.width(),
    height = baseline.height(),
    brightness = params.brightness_pct(),
    contrast = params.contrast_pct(),
))]
pub fn bake(baseline: &RgbaImage, params: AdjustmentParams) -> RgbaImage {
    if params.is_identity() {
        debug!("identity adjustment, copying baseline");
        return baseline.clone();
    }

    let lut = build_lut(params);
    let mut out = baseline.clone();
    for Rgba([r, g, b, _]) in out.pixels_mut() {
        *r = lut[*r as usize];
        *g = lut[*g as usize];
        *b = lut[*b as usize];
    }
    out
}

/// Per-channel lookup table for `params`.
fn build_lut(params: AdjustmentParams) -> [u8; 256] {
    let brightness = f64::from(params.brightness_pct()) / 100.0;
    let contrast = f64::from(params.contrast_pct()) / 100.0;

    let mut lut = [0u8; 256];
    for (value, slot) in lut.iter_mut().enumerate() {
        let bright = (value as f64 * brightness).clamp(0.0, 255.0);
        let contrasted = ((bright - 128.0) * contrast + 128.0).clamp(0.0, 255.0);
        *slot = contrasted.round() as u8;
    }
    lut
}
