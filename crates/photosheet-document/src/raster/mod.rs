// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rasterisation — turn photos and PDF pages into RGBA frames.

pub mod backend;
pub mod frame;
pub mod rasterizer;

#[cfg(feature = "pdfium")]
pub mod pdfium;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;
