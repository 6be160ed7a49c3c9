// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// photosheet-layout — pure geometry. A layout kind resolves to a tiling spec
// (sheet size, tile size, count, arrangement), and a tiling spec enumerates
// tile rectangles in physical inches. Nothing here touches pixels or reads
// configuration.

pub mod placement;
pub mod tiling;

pub use placement::{PixelRect, TilePlacement, placements};
pub use tiling::{
    Arrangement, DEFAULT_MULTI_COUNT, LayoutKind, MAX_TILE_COUNT, SmallGridCount, TilingSpec,
    resolve_tiling,
};
