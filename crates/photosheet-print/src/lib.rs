// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// photosheet-print — paint processed images onto an exact-size sheet and hand
// the result to a printer.
//
// Composer: tiling spec + slot content -> `Sheet` raster at a fixed DPI.
// Writer:   `Sheet` -> single-page PDF (MediaBox = physical sheet) or PNG.
// Payload:  everything a print collaborator needs, including self-printing
//           HTML with a matching `@page` rule.

pub mod composer;
pub mod payload;
pub mod writer;

pub use composer::{ComposeOptions, PlacedTile, Sheet, SheetContent, compose};
pub use payload::{PRINT_CLOSE_DELAY_MS, PrintPayload};
pub use writer::SheetWriter;
