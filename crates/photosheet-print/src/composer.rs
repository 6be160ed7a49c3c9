// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sheet composer — render a tiling spec and its slot images onto a white
// canvas of the sheet's exact physical size.

use chrono::{DateTime, Utc};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use photosheet_core::error::{PhotosheetError, Result};
use photosheet_core::types::{Length, PhysicalSize, Slot};
use photosheet_layout::{PixelRect, TilePlacement, TilingSpec, placements};
use tracing::{debug, info, instrument, warn};

/// Print resolution used when none is configured.
pub const DEFAULT_DPI: u32 = 300;

/// Cut-guide line width.
pub const CUT_BORDER: Length = Length::mm(0.2);

const PAPER_WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const CUT_LINE: Rgba<u8> = Rgba([0, 0, 0, 255]);
const PLACEHOLDER_LINE: Rgba<u8> = Rgba([190, 190, 190, 255]);

/// Images to place on the sheet, by slot.
#[derive(Debug, Clone)]
pub enum SheetContent {
    /// One image repeated on every tile.
    Single(Option<RgbaImage>),
    /// Front and back of a dual-sided card.
    Pair {
        front: Option<RgbaImage>,
        back: Option<RgbaImage>,
    },
    /// Different images, one per tile, in tile order.
    Many(Vec<Option<RgbaImage>>),
}

impl SheetContent {
    /// Image for `slot`, if one is present.
    pub fn for_slot(&self, slot: Slot) -> Option<&RgbaImage> {
        match (self, slot) {
            (Self::Single(image), Slot::Single) => image.as_ref(),
            (Self::Pair { front, .. }, Slot::Front) => front.as_ref(),
            (Self::Pair { back, .. }, Slot::Back) => back.as_ref(),
            (Self::Many(images), Slot::Item(n)) => {
                images.get(n as usize).and_then(Option::as_ref)
            }
            _ => None,
        }
    }
}

/// Composition settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposeOptions {
    pub dpi: u32,
    /// Draw a thin black cut guide around each filled tile.
    pub cut_borders: bool,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            cut_borders: true,
        }
    }
}

/// A tile as painted on the sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedTile {
    pub placement: TilePlacement,
    pub pixels: PixelRect,
    /// False when the slot had no content and a placeholder was drawn.
    pub filled: bool,
}

/// A rendered sheet.
#[derive(Debug, Clone)]
pub struct Sheet {
    image: RgbaImage,
    spec: TilingSpec,
    dpi: u32,
    tiles: Vec<PlacedTile>,
    rendered_at: DateTime<Utc>,
}

impl Sheet {
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn spec(&self) -> &TilingSpec {
        &self.spec
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    pub fn tiles(&self) -> &[PlacedTile] {
        &self.tiles
    }

    pub fn physical_size(&self) -> PhysicalSize {
        self.spec.sheet
    }

    pub fn width(&self) -> Length {
        self.spec.sheet.width
    }

    pub fn height(&self) -> Length {
        self.spec.sheet.height
    }

    pub fn rendered_at(&self) -> DateTime<Utc> {
        self.rendered_at
    }

    /// Whether every tile received content.
    pub fn is_complete(&self) -> bool {
        self.tiles.iter().all(|t| t.filled)
    }

    /// CSS `@page size` value: the paper keyword when there is one (`A4`),
    /// otherwise the physical dimensions (`4in 6in`).
    pub fn page_size_directive(&self) -> String {
        match self.spec.paper.page_keyword() {
            Some(keyword) => keyword.to_string(),
            None => format!("{} {}", self.spec.sheet.width, self.spec.sheet.height),
        }
    }
}

/// Paint `content` onto a sheet laid out by `spec`.
///
/// Each tile is filled edge to edge (cover: scale up until both sides are
/// covered, then trim the overflow evenly). A slot without content gets a
/// grey placeholder with a diagonal cross; that is not an error here.
#[instrument(skip(content), fields(layout = spec.kind.name(), count = spec.count, dpi = options.dpi))]
pub fn compose(spec: &TilingSpec, content: &SheetContent, options: ComposeOptions) -> Result<Sheet> {
    if options.dpi == 0 {
        return Err(PhotosheetError::InvalidLayout("DPI must be positive".into()));
    }
    let (width_px, height_px) = spec.sheet.to_pixels(options.dpi);
    if width_px == 0 || height_px == 0 {
        return Err(PhotosheetError::InvalidLayout(format!(
            "sheet {} is empty at {} dpi",
            spec.sheet, options.dpi
        )));
    }
    if spec.overflows() {
        warn!(tile = %spec.tile, sheet = %spec.sheet, "tiles extend past the sheet edge");
    }

    let mut canvas = RgbaImage::from_pixel(width_px, height_px, PAPER_WHITE);
    let border_px = CUT_BORDER.to_pixels(options.dpi).max(1);
    let mut tiles = Vec::with_capacity(spec.count as usize);

    for placement in placements(spec) {
        let rect = placement.to_pixels(options.dpi);
        let filled = match content.for_slot(placement.slot) {
            Some(image) if rect.width > 0 && rect.height > 0 => {
                let fitted = cover_fit(image, rect.width, rect.height);
                imageops::replace(&mut canvas, &fitted, rect.x, rect.y);
                if options.cut_borders {
                    draw_frame(&mut canvas, rect, border_px, CUT_LINE);
                }
                true
            }
            // Rounded away to nothing at this DPI; nothing was painted.
            Some(_) => false,
            None => {
                draw_placeholder(&mut canvas, rect, border_px);
                false
            }
        };
        debug!(index = placement.index, slot = %placement.slot, ?rect, filled, "tile painted");
        tiles.push(PlacedTile {
            placement,
            pixels: rect,
            filled,
        });
    }

    info!(
        width_px,
        height_px,
        tiles = tiles.len(),
        empty = tiles.iter().filter(|t| !t.filled).count(),
        "sheet composed"
    );
    Ok(Sheet {
        image: canvas,
        spec: *spec,
        dpi: options.dpi,
        tiles,
        rendered_at: Utc::now(),
    })
}

/// Scale `image` to cover `width` x `height` and centre-crop the excess.
pub fn cover_fit(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let (iw, ih) = image.dimensions();
    if (iw, ih) == (width, height) {
        return image.clone();
    }
    if iw == 0 || ih == 0 {
        return RgbaImage::from_pixel(width, height, PAPER_WHITE);
    }

    let scale = (width as f64 / iw as f64).max(height as f64 / ih as f64);
    let scaled_w = ((iw as f64 * scale).round() as u32).max(width);
    let scaled_h = ((ih as f64 * scale).round() as u32).max(height);
    let scaled = imageops::resize(image, scaled_w, scaled_h, FilterType::Lanczos3);

    let x = (scaled_w - width) / 2;
    let y = (scaled_h - height) / 2;
    imageops::crop_imm(&scaled, x, y, width, height).to_image()
}

/// Draw a frame `thickness` pixels wide just inside `rect`.
fn draw_frame(canvas: &mut RgbaImage, rect: PixelRect, thickness: u32, colour: Rgba<u8>) {
    for inset in 0..thickness {
        let w = rect.width.saturating_sub(2 * inset);
        let h = rect.height.saturating_sub(2 * inset);
        if w == 0 || h == 0 {
            break;
        }
        let at = Rect::at((rect.x + i64::from(inset)) as i32, (rect.y + i64::from(inset)) as i32)
            .of_size(w, h);
        draw_hollow_rect_mut(canvas, at, colour);
    }
}

fn draw_placeholder(canvas: &mut RgbaImage, rect: PixelRect, thickness: u32) {
    if rect.width == 0 || rect.height == 0 {
        return;
    }
    draw_frame(canvas, rect, thickness, PLACEHOLDER_LINE);
    let (x0, y0) = (rect.x as f32, rect.y as f32);
    let (x1, y1) = (x0 + rect.width as f32 - 1.0, y0 + rect.height as f32 - 1.0);
    draw_line_segment_mut(canvas, (x0, y0), (x1, y1), PLACEHOLDER_LINE);
    draw_line_segment_mut(canvas, (x1, y0), (x0, y1), PLACEHOLDER_LINE);
}
