// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// photosheet-document — the image half of the Photosheet pipeline.
//
// Turns an uploaded photo or PDF page into a bitmap (raster), cuts the user's
// selection out of it at native resolution (image::crop), re-bakes
// brightness/contrast from the untouched baseline (image::adjust), and
// optionally swaps the background through a segmentation service
// (background).

pub mod background;
pub mod image;
pub mod raster;
pub mod source;

// Re-export the primary entry points so callers can use
// `photosheet_document::Rasterizer` etc.
pub use self::background::compositor::{
    BackgroundReplacement, Matte, apply_matte, composite_onto_backdrop, replace_background,
    request_cutout,
};
pub use self::background::remove_bg::RemoveBgClient;
pub use self::background::SegmentationService;
pub use self::image::adjust::bake;
pub use self::image::crop::{NativeRect, crop};
pub use self::raster::frame::RasterFrame;
pub use self::raster::rasterizer::{OpenedPdf, OpenedSource, PasswordPrompt, Rasterizer};
pub use self::raster::backend::{PdfBackend, PdfPages};
pub use self::source::SourceDocument;

#[cfg(feature = "pdfium")]
pub use self::raster::pdfium::PdfiumBackend;

#[cfg(feature = "test-util")]
pub use self::raster::testing::FakePdfBackend;
