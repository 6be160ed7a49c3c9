// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tile placement — enumerate where each tile of a tiling spec lands on the
// sheet, in inches from the top-left corner.

use photosheet_core::types::Slot;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tiling::{Arrangement, EPSILON, TilingSpec};

/// One tile's rectangle on the sheet, in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TilePlacement {
    /// Position in fill order, from 0.
    pub index: usize,
    /// Which content slot fills this tile.
    pub slot: Slot,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A tile rectangle snapped to the pixel grid.
///
/// `x`/`y` may be negative when a tile overflows the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl TilePlacement {
    /// Whether the interiors of two placements intersect. Shared edges do
    /// not count.
    pub fn overlaps(&self, other: &TilePlacement) -> bool {
        self.x + EPSILON < other.x + other.width
            && other.x + EPSILON < self.x + self.width
            && self.y + EPSILON < other.y + other.height
            && other.y + EPSILON < self.y + self.height
    }

    /// Pixel rectangle at `dpi`. Both edges are rounded so that tiles which
    /// touch in inches also touch in pixels.
    pub fn to_pixels(&self, dpi: u32) -> PixelRect {
        let snap = |inches: f64| (inches * f64::from(dpi)).round() as i64;
        let (x0, y0) = (snap(self.x), snap(self.y));
        let (x1, y1) = (snap(self.x + self.width), snap(self.y + self.height));
        PixelRect {
            x: x0,
            y: y0,
            width: (x1 - x0).max(0) as u32,
            height: (y1 - y0).max(0) as u32,
        }
    }
}

/// Enumerate tile rectangles for `spec`.
///
/// Grid: fill rows left to right, wrapping before a tile would cross the
/// sheet's right edge (every row holds at least one tile). Rows stack from
/// the top and each row is centred horizontally. FixedStack: one column,
/// centred on both axes, tiles separated by the stack spacing.
pub fn placements(spec: &TilingSpec) -> Vec<TilePlacement> {
    let count = spec.count as usize;
    let sheet_w = spec.sheet.width.to_inches();
    let sheet_h = spec.sheet.height.to_inches();
    let tile_w = spec.tile.width.to_inches();
    let tile_h = spec.tile.height.to_inches();

    let place = |index: usize, x: f64, y: f64| TilePlacement {
        index,
        slot: spec.kind.slot_for_tile(index),
        x,
        y,
        width: tile_w,
        height: tile_h,
    };

    let out: Vec<TilePlacement> = match spec.arrangement {
        Arrangement::Grid => {
            let gap = spec.gap.to_inches();
            let per_row = (((sheet_w + gap + EPSILON) / (tile_w + gap)).floor() as usize)
                .clamp(1, count.max(1));

            (0..count)
                .map(|index| {
                    let row = index / per_row;
                    let col = index % per_row;
                    let in_row = per_row.min(count - row * per_row);
                    let row_w = in_row as f64 * tile_w + (in_row - 1) as f64 * gap;
                    let x0 = (sheet_w - row_w) / 2.0;
                    place(
                        index,
                        x0 + col as f64 * (tile_w + gap),
                        row as f64 * (tile_h + gap),
                    )
                })
                .collect()
        }
        Arrangement::FixedStack => {
            let spacing = spec.stack_spacing.to_inches();
            let stack_h = count as f64 * tile_h + count.saturating_sub(1) as f64 * spacing;
            let x = (sheet_w - tile_w) / 2.0;
            let y0 = (sheet_h - stack_h) / 2.0;
            (0..count)
                .map(|index| place(index, x, y0 + index as f64 * (tile_h + spacing)))
                .collect()
        }
    };

    debug!(count = out.len(), arrangement = ?spec.arrangement, "placements computed");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiling::{LayoutKind, SmallGridCount, resolve_tiling};
    use photosheet_core::types::{PaperSize, PhysicalSize};

    fn assert_disjoint(tiles: &[TilePlacement]) {
        for (i, a) in tiles.iter().enumerate() {
            for b in &tiles[i + 1..] {
                assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
            }
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn nine_wallet_photos_three_by_three() {
        let spec = resolve_tiling(LayoutKind::SmallGrid {
            count: SmallGridCount::NINE,
        })
        .unwrap();
        let tiles = placements(&spec);
        assert_eq!(tiles.len(), 9);
        assert_disjoint(&tiles);
        // 3 x 1.25in = 3.75in, centred in 4in.
        assert!(close(tiles[0].x, 0.125));
        assert!(close(tiles[3].y, 1.5));
        assert!(close(tiles[8].y, 3.0));
        assert!(tiles.iter().all(|t| t.slot == Slot::Single));
    }

    #[test]
    fn partial_last_row_is_centred() {
        let spec = resolve_tiling(LayoutKind::Custom {
            paper: PaperSize::Photo4x6,
            tile: PhysicalSize::inches(1.0, 1.0),
            count: 5,
        })
        .unwrap();
        let tiles = placements(&spec);
        // Four fit across; the fifth sits alone in the middle of row two.
        assert!(close(tiles[3].x, 3.0));
        assert!(close(tiles[4].x, 1.5));
        assert!(close(tiles[4].y, 1.0));
        assert_disjoint(&tiles);
    }

    #[test]
    fn tile_wider_than_sheet_still_gets_a_row() {
        let spec = resolve_tiling(LayoutKind::Custom {
            paper: PaperSize::Photo4x6,
            tile: PhysicalSize::inches(5.0, 1.0),
            count: 2,
        })
        .unwrap();
        let tiles = placements(&spec);
        assert_eq!(tiles.len(), 2);
        assert!(close(tiles[0].x, -0.5));
        assert!(close(tiles[1].y, 1.0));
    }

    #[test]
    fn dual_sided_id_is_a_centred_stack() {
        let spec = resolve_tiling(LayoutKind::DualSidedId).unwrap();
        let tiles = placements(&spec);
        assert_eq!(tiles.len(), 2);
        assert_eq!((tiles[0].slot, tiles[1].slot), (Slot::Front, Slot::Back));
        assert!(close(tiles[0].x, tiles[1].x));
        assert!(close(tiles[0].x, (4.0 - 3.375) / 2.0));
        // 2 x 2.125 + 0.25 = 4.5 tall, centred in 6.
        assert!(close(tiles[0].y, 0.75));
        assert!(close(tiles[1].y, 0.75 + 2.125 + 0.25));
        assert_disjoint(&tiles);
    }

    #[test]
    fn multi_page_gives_each_tile_its_own_image() {
        let spec = resolve_tiling(LayoutKind::MultiPage {
            paper: PaperSize::A4,
            count: 4,
        })
        .unwrap();
        let tiles = placements(&spec);
        let slots: Vec<Slot> = tiles.iter().map(|t| t.slot).collect();
        assert_eq!(slots, (0..4).map(Slot::Item).collect::<Vec<_>>());
        // Two by two on A4.
        assert!(close(tiles[1].x, tiles[0].x + tiles[0].width));
        assert!(close(tiles[2].y, tiles[0].height));
        assert_disjoint(&tiles);
    }

    #[test]
    fn passport_tiles_cover_sheet_exactly() {
        let spec = resolve_tiling(LayoutKind::PassportGrid).unwrap();
        let tiles = placements(&spec);
        assert_eq!(tiles.len(), 6);
        assert!(close(tiles[5].x + tiles[5].width, 4.0));
        assert!(close(tiles[5].y + tiles[5].height, 6.0));
        assert_disjoint(&tiles);
    }

    #[test]
    fn adjacent_tiles_share_pixel_edges() {
        let spec = resolve_tiling(LayoutKind::SmallGrid {
            count: SmallGridCount::TWELVE,
        })
        .unwrap();
        let tiles = placements(&spec);
        let a = tiles[0].to_pixels(96);
        let b = tiles[1].to_pixels(96);
        assert_eq!(a.x + i64::from(a.width), b.x);
        assert_eq!(a.height, 144);
    }
}
