// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layout kinds and their tiling specs.

use std::str::FromStr;

use photosheet_core::error::{PhotosheetError, Result};
use photosheet_core::types::{Length, PaperSize, PhysicalSize, Slot, Unit};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// CR80 card, the ISO/IEC 7810 ID-1 format used by PVC and national ID cards.
pub const ID_CARD: PhysicalSize = PhysicalSize::inches(3.375, 2.125);

/// Wallet photo tile used by the small grids.
pub const WALLET_TILE: PhysicalSize = PhysicalSize::inches(1.25, 1.5);

/// Slightly wider wallet tile so twelve fit three across a 4in sheet.
pub const WALLET_TILE_WIDE: PhysicalSize = PhysicalSize::inches(1.33, 1.5);

/// 2in x 2in passport/visa photo.
pub const PASSPORT_TILE: PhysicalSize = PhysicalSize::inches(2.0, 2.0);

/// Gap between the front and back of a dual-sided card.
pub const STACK_SPACING: Length = Length::inches(0.25);

/// Images on a multi-image page when no count is given.
pub const DEFAULT_MULTI_COUNT: u32 = 4;

/// Most tiles a user-defined layout may ask for.
pub const MAX_TILE_COUNT: u32 = 10_000;

/// Sheet overflow tolerance in inches, absorbing float error in tile sums.
pub(crate) const EPSILON: f64 = 1e-9;

/// Allowed tile counts for the small wallet grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SmallGridCount(u32);

impl SmallGridCount {
    pub const THREE: Self = Self(3);
    pub const NINE: Self = Self(9);
    pub const TWELVE: Self = Self(12);

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for SmallGridCount {
    fn default() -> Self {
        Self::NINE
    }
}

impl TryFrom<u32> for SmallGridCount {
    type Error = PhotosheetError;

    fn try_from(count: u32) -> Result<Self> {
        match count {
            3 | 9 | 12 => Ok(Self(count)),
            other => Err(PhotosheetError::InvalidLayout(format!(
                "small grid holds 3, 9, or 12 photos, not {other}"
            ))),
        }
    }
}

impl From<SmallGridCount> for u32 {
    fn from(count: SmallGridCount) -> u32 {
        count.0
    }
}

/// How tiles are laid out on the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Arrangement {
    /// Rows that wrap at the sheet width, each row centred.
    Grid,
    /// A single centred column in slot order.
    FixedStack,
}

/// A named print layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LayoutKind {
    /// Wallet photos on 4x6 stock.
    SmallGrid { count: SmallGridCount },
    /// One image filling the whole page.
    FullPage { paper: PaperSize },
    /// One CR80 card on 4x6 stock.
    IdCard,
    /// Six 2in x 2in photos on 4x6 stock.
    PassportGrid,
    /// Front and back of a CR80 card stacked on 4x6 stock.
    DualSidedId,
    /// Several different images sharing one page, one tile each.
    MultiPage { paper: PaperSize, count: u32 },
    /// User-defined tile size and count.
    Custom {
        paper: PaperSize,
        tile: PhysicalSize,
        count: u32,
    },
}

impl Default for LayoutKind {
    fn default() -> Self {
        Self::SmallGrid {
            count: SmallGridCount::default(),
        }
    }
}

impl LayoutKind {
    /// Short name, as accepted by [`FromStr`].
    pub fn name(&self) -> &'static str {
        match self {
            Self::SmallGrid { .. } => "4x6",
            Self::FullPage { .. } => "a4",
            Self::IdCard => "pvc",
            Self::PassportGrid => "passport",
            Self::DualSidedId => "aadhar",
            Self::MultiPage { .. } => "multi",
            Self::Custom { .. } => "custom",
        }
    }

    /// Content slots this layout needs filled.
    pub fn slots(&self) -> Vec<Slot> {
        match self {
            Self::DualSidedId => vec![Slot::Front, Slot::Back],
            Self::MultiPage { count, .. } => (0..*count).map(Slot::Item).collect(),
            _ => vec![Slot::Single],
        }
    }

    /// Slot whose image goes on tile `index`.
    pub fn slot_for_tile(&self, index: usize) -> Slot {
        match self {
            Self::DualSidedId if index % 2 == 0 => Slot::Front,
            Self::DualSidedId => Slot::Back,
            Self::MultiPage { .. } => Slot::Item(index as u32),
            _ => Slot::Single,
        }
    }

    /// Move the layout onto different stock. Layouts tied to 4x6 stock are
    /// unchanged.
    pub fn with_paper(self, paper: PaperSize) -> Self {
        match self {
            Self::FullPage { .. } => Self::FullPage { paper },
            Self::MultiPage { count, .. } => Self::MultiPage { paper, count },
            Self::Custom { tile, count, .. } => Self::Custom { paper, tile, count },
            other => other,
        }
    }
}

impl FromStr for LayoutKind {
    type Err = PhotosheetError;

    /// Parse `4x6[:3|9|12]`, `a4`, `pvc`, `passport`, `aadhar`, `multi[:n]`, or
    /// `custom:<w>x<h>[in|mm]:<count>` (custom tiles go on 4x6 stock unless
    /// moved with [`LayoutKind::with_paper`]).
    fn from_str(text: &str) -> Result<Self> {
        let lower = text.trim().to_ascii_lowercase();
        let mut parts = lower.splitn(2, ':');
        let name = parts.next().unwrap_or_default();
        let rest = parts.next();

        let kind = match (name, rest) {
            ("4x6" | "small-grid" | "wallet", None) => Self::default(),
            ("4x6" | "small-grid" | "wallet", Some(count)) => Self::SmallGrid {
                count: SmallGridCount::try_from(parse_count(count)?)?,
            },
            ("a4" | "full-page", None) => Self::FullPage {
                paper: PaperSize::A4,
            },
            ("pvc" | "id-card", None) => Self::IdCard,
            ("passport" | "2x2", None) => Self::PassportGrid,
            ("aadhar" | "aadhaar" | "dual-sided-id", None) => Self::DualSidedId,
            ("multi" | "multi-a4", None) => Self::MultiPage {
                paper: PaperSize::A4,
                count: DEFAULT_MULTI_COUNT,
            },
            ("multi" | "multi-a4", Some(count)) => Self::MultiPage {
                paper: PaperSize::A4,
                count: parse_count(count)?,
            },
            ("custom", Some(spec)) => parse_custom(spec)?,
            ("custom", None) => {
                return Err(PhotosheetError::InvalidLayout(
                    "custom layout needs a tile size and count, e.g. custom:2x2.5:4".into(),
                ));
            }
            _ => {
                return Err(PhotosheetError::InvalidLayout(format!(
                    "unknown layout {text:?}"
                )));
            }
        };
        Ok(kind)
    }
}

fn parse_count(text: &str) -> Result<u32> {
    text.trim()
        .parse()
        .map_err(|_| PhotosheetError::InvalidLayout(format!("invalid tile count {text:?}")))
}

/// `<w>x<h>[in|mm]:<count>`
fn parse_custom(spec: &str) -> Result<LayoutKind> {
    let (size, count) = spec.split_once(':').ok_or_else(|| {
        PhotosheetError::InvalidLayout(format!("custom layout {spec:?} is missing a count"))
    })?;
    let (size, unit) = match size.strip_suffix("mm") {
        Some(s) => (s, Unit::Millimeter),
        None => (size.strip_suffix("in").unwrap_or(size), Unit::Inch),
    };
    let (w, h) = size.split_once('x').ok_or_else(|| {
        PhotosheetError::InvalidLayout(format!("tile size {size:?} must be <w>x<h>"))
    })?;
    let dim = |text: &str| -> Result<Length> {
        let value: f64 = text
            .trim()
            .parse()
            .map_err(|_| PhotosheetError::InvalidLayout(format!("invalid tile dimension {text:?}")))?;
        Ok(Length { value, unit })
    };
    Ok(LayoutKind::Custom {
        paper: PaperSize::Photo4x6,
        tile: PhysicalSize::new(dim(w)?, dim(h)?),
        count: parse_count(count)?,
    })
}

/// Everything the composer needs to tile a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TilingSpec {
    pub kind: LayoutKind,
    pub paper: PaperSize,
    pub sheet: PhysicalSize,
    pub tile: PhysicalSize,
    pub count: u32,
    pub arrangement: Arrangement,
    /// Space between adjacent grid tiles.
    pub gap: Length,
    /// Space between stacked tiles.
    pub stack_spacing: Length,
}

impl TilingSpec {
    /// Whether the tiles, as arranged, extend past the sheet.
    ///
    /// Overflow is reported, never corrected.
    pub fn overflows(&self) -> bool {
        let sheet_w = self.sheet.width.to_inches();
        let sheet_h = self.sheet.height.to_inches();
        crate::placement::placements(self).iter().any(|p| {
            p.x < -EPSILON
                || p.y < -EPSILON
                || p.x + p.width > sheet_w + EPSILON
                || p.y + p.height > sheet_h + EPSILON
        })
    }
}

fn check_count(count: u32) -> Result<()> {
    if count == 0 {
        return Err(PhotosheetError::InvalidLayout(
            "tile count must be at least 1".into(),
        ));
    }
    if count > MAX_TILE_COUNT {
        return Err(PhotosheetError::InvalidLayout(format!(
            "tile count {count} exceeds the maximum of {MAX_TILE_COUNT}"
        )));
    }
    Ok(())
}

/// Split `sheet` into a near-square grid with room for `count` tiles.
fn multi_tile(sheet: PhysicalSize, count: u32) -> PhysicalSize {
    let cols = f64::from(count).sqrt().ceil().max(1.0);
    let rows = (f64::from(count) / cols).ceil().max(1.0);
    let split = |l: Length, parts: f64| Length {
        value: l.value / parts,
        unit: l.unit,
    };
    PhysicalSize::new(split(sheet.width, cols), split(sheet.height, rows))
}

/// Resolve a layout kind into its tiling spec.
///
/// Custom geometry is validated for positivity only; a tile larger than the
/// sheet is accepted and shows up in [`TilingSpec::overflows`].
pub fn resolve_tiling(kind: LayoutKind) -> Result<TilingSpec> {
    let photo = PaperSize::Photo4x6;
    let grid = |paper: PaperSize, tile: PhysicalSize, count: u32| TilingSpec {
        kind,
        paper,
        sheet: paper.size(),
        tile,
        count,
        arrangement: Arrangement::Grid,
        gap: Length::inches(0.0),
        stack_spacing: STACK_SPACING,
    };

    let spec = match kind {
        LayoutKind::SmallGrid { count } => {
            let tile = if count == SmallGridCount::TWELVE {
                WALLET_TILE_WIDE
            } else {
                WALLET_TILE
            };
            grid(photo, tile, count.get())
        }
        LayoutKind::FullPage { paper } => grid(paper, paper.size(), 1),
        LayoutKind::IdCard => grid(photo, ID_CARD, 1),
        LayoutKind::PassportGrid => grid(photo, PASSPORT_TILE, 6),
        LayoutKind::DualSidedId => TilingSpec {
            arrangement: Arrangement::FixedStack,
            ..grid(photo, ID_CARD, 2)
        },
        LayoutKind::MultiPage { paper, count } => {
            check_count(count)?;
            grid(paper, multi_tile(paper.size(), count), count)
        }
        LayoutKind::Custom { paper, tile, count } => {
            let positive = |l: Length| l.value.is_finite() && l.value > 0.0;
            if !positive(tile.width) || !positive(tile.height) {
                return Err(PhotosheetError::InvalidLayout(format!(
                    "tile size must be positive, got {tile}"
                )));
            }
            let sheet = paper.size();
            if !positive(sheet.width) || !positive(sheet.height) {
                return Err(PhotosheetError::InvalidLayout(format!(
                    "sheet size must be positive, got {sheet}"
                )));
            }
            check_count(count)?;
            grid(paper, tile, count)
        }
    };

    debug!(
        layout = kind.name(),
        sheet = %spec.sheet,
        tile = %spec.tile,
        count = spec.count,
        "tiling resolved"
    );
    Ok(spec)
}
