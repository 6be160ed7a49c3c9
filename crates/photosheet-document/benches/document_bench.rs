// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the per-edit hot paths: re-baking adjustments on
// every slider move, and cropping a full-resolution frame.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgba, RgbaImage};

use photosheet_core::{AdjustmentParams, CropRegion};
use photosheet_document::{RasterFrame, bake, crop};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Bake a 1200x1600 gradient, about the size of a cropped passport photo.
fn bench_bake(c: &mut Criterion) {
    let baseline = RgbaImage::from_fn(1200, 1600, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x ^ y) % 256) as u8, 255])
    });
    let params = AdjustmentParams::new(130, 110).expect("valid params");

    c.bench_function("bake (1200x1600)", |b| {
        b.iter(|| black_box(bake(black_box(&baseline), params)));
    });
}

/// Crop a 3000x4000 frame displayed at 600x800.
fn bench_crop(c: &mut Criterion) {
    let frame = RasterFrame::new(RgbaImage::from_pixel(3000, 4000, Rgba([90, 120, 150, 255])))
        .with_display_size(600, 800)
        .expect("valid display size");
    let region = CropRegion::new(20.0, 20.0, 120.0, 160.0);

    c.bench_function("crop (3000x4000 -> 600x800)", |b| {
        b.iter(|| black_box(crop(black_box(&frame), &region)));
    });
}

criterion_group!(benches, bench_bake, bench_crop);
criterion_main!(benches);
