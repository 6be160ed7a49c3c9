// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: physical units, paper sizes, colours, adjustment
// parameters, crop regions, and pipeline bookkeeping.

use serde::{Deserialize, Serialize};

use crate::error::{PhotosheetError, Result};

/// Millimetres per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// PostScript points per inch.
pub const POINTS_PER_INCH: f64 = 72.0;

// -- Physical units -----------------------------------------------------------

/// Unit a physical length was specified in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    Inch,
    Millimeter,
}

impl Unit {
    /// Suffix used in CSS-style size strings.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Inch => "in",
            Self::Millimeter => "mm",
        }
    }
}

/// A real-world length that remembers the unit it was given in.
///
/// Equality is structural: `Length::inches(1.0) != Length::mm(25.4)`. Compare
/// via [`Length::to_inches`] when the unit should not matter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Length {
    pub value: f64,
    pub unit: Unit,
}

impl Length {
    pub const fn inches(value: f64) -> Self {
        Self {
            value,
            unit: Unit::Inch,
        }
    }

    pub const fn mm(value: f64) -> Self {
        Self {
            value,
            unit: Unit::Millimeter,
        }
    }

    pub fn to_inches(&self) -> f64 {
        match self.unit {
            Unit::Inch => self.value,
            Unit::Millimeter => self.value / MM_PER_INCH,
        }
    }

    pub fn to_mm(&self) -> f64 {
        match self.unit {
            Unit::Inch => self.value * MM_PER_INCH,
            Unit::Millimeter => self.value,
        }
    }

    pub fn to_points(&self) -> f64 {
        self.to_inches() * POINTS_PER_INCH
    }

    /// Pixel count at `dpi`, rounded to the nearest whole pixel.
    pub fn to_pixels(&self, dpi: u32) -> u32 {
        (self.to_inches() * dpi as f64).round().max(0.0) as u32
    }
}

impl std::fmt::Display for Length {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

/// Width x height pair of physical lengths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalSize {
    pub width: Length,
    pub height: Length,
}

impl PhysicalSize {
    pub const fn new(width: Length, height: Length) -> Self {
        Self { width, height }
    }

    pub const fn inches(width: f64, height: f64) -> Self {
        Self::new(Length::inches(width), Length::inches(height))
    }

    pub const fn mm(width: f64, height: f64) -> Self {
        Self::new(Length::mm(width), Length::mm(height))
    }

    /// Pixel dimensions at `dpi`.
    pub fn to_pixels(&self, dpi: u32) -> (u32, u32) {
        (self.width.to_pixels(dpi), self.height.to_pixels(dpi))
    }
}

impl std::fmt::Display for PhysicalSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} x {}", self.width, self.height)
    }
}

// -- Paper --------------------------------------------------------------------

/// Paper and photo stock sizes a sheet can be printed on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PaperSize {
    /// 4in x 6in photo stock.
    Photo4x6,
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Custom(PhysicalSize),
}

impl PaperSize {
    /// Physical dimensions, in the unit the stock is conventionally sold in.
    pub fn size(&self) -> PhysicalSize {
        match self {
            Self::Photo4x6 => PhysicalSize::inches(4.0, 6.0),
            Self::A4 => PhysicalSize::mm(210.0, 297.0),
            Self::A3 => PhysicalSize::mm(297.0, 420.0),
            Self::A5 => PhysicalSize::mm(148.0, 210.0),
            Self::Letter => PhysicalSize::inches(8.5, 11.0),
            Self::Legal => PhysicalSize::inches(8.5, 14.0),
            Self::Custom(size) => *size,
        }
    }

    /// CSS `@page size` keyword, when the stock has one.
    pub fn page_keyword(&self) -> Option<&'static str> {
        match self {
            Self::A4 => Some("A4"),
            Self::A3 => Some("A3"),
            Self::A5 => Some("A5"),
            Self::Letter => Some("letter"),
            Self::Legal => Some("legal"),
            Self::Photo4x6 | Self::Custom(_) => None,
        }
    }

    /// Parse a paper name as typed by a user (`4x6`, `a4`, `letter`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "4x6" | "photo" | "4x6in" => Some(Self::Photo4x6),
            "a4" => Some(Self::A4),
            "a3" => Some(Self::A3),
            "a5" => Some(Self::A5),
            "letter" => Some(Self::Letter),
            "legal" => Some(Self::Legal),
            _ => None,
        }
    }
}

// -- Colour -------------------------------------------------------------------

/// An opaque sRGB colour used as a backdrop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const WHITE: Rgb = Rgb([255, 255, 255]);
    pub const BLACK: Rgb = Rgb([0, 0, 0]);
    /// Pale blue commonly required for passport and visa photos.
    pub const PASSPORT_BLUE: Rgb = Rgb([191, 215, 234]);

    /// Parse `#rrggbb` / `rrggbb`, or one of the named colours.
    pub fn parse(text: &str) -> Result<Self> {
        match text.to_ascii_lowercase().as_str() {
            "white" => return Ok(Self::WHITE),
            "black" => return Ok(Self::BLACK),
            "blue" | "passport" => return Ok(Self::PASSPORT_BLUE),
            _ => {}
        }
        let hex = text.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(PhotosheetError::InvalidColour(format!(
                "colour must be #rrggbb, got {text:?}"
            )));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| {
                PhotosheetError::InvalidColour(format!("invalid hex colour {text:?}"))
            })
        };
        Ok(Self([channel(0..2)?, channel(2..4)?, channel(4..6)?]))
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

// -- Adjustments --------------------------------------------------------------

/// Brightness/contrast percentages applied by the baker.
///
/// 100/100 is the identity. Both values are limited to
/// [`AdjustmentParams::MIN_PCT`]..=[`AdjustmentParams::MAX_PCT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentParams {
    brightness_pct: u16,
    contrast_pct: u16,
}

impl AdjustmentParams {
    pub const MIN_PCT: u16 = 50;
    pub const MAX_PCT: u16 = 150;
    pub const NEUTRAL_PCT: u16 = 100;

    pub const IDENTITY: AdjustmentParams = AdjustmentParams {
        brightness_pct: Self::NEUTRAL_PCT,
        contrast_pct: Self::NEUTRAL_PCT,
    };

    pub fn new(brightness_pct: u16, contrast_pct: u16) -> Result<Self> {
        for (name, value) in [("brightness", brightness_pct), ("contrast", contrast_pct)] {
            if !(Self::MIN_PCT..=Self::MAX_PCT).contains(&value) {
                return Err(PhotosheetError::InvalidAdjustment(format!(
                    "{name} {value}% outside {}..={}%",
                    Self::MIN_PCT,
                    Self::MAX_PCT
                )));
            }
        }
        Ok(Self {
            brightness_pct,
            contrast_pct,
        })
    }

    pub fn brightness_pct(&self) -> u16 {
        self.brightness_pct
    }

    pub fn contrast_pct(&self) -> u16 {
        self.contrast_pct
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for AdjustmentParams {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// -- Crop ---------------------------------------------------------------------

/// A rectangle drawn by the user, in display-space pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRegion {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl std::fmt::Display for CropRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{}+{}+{}",
            self.width, self.height, self.x, self.y
        )
    }
}

// -- Sources ------------------------------------------------------------------

/// Where a source document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceOrigin {
    /// A raster photo or scan (`image/*`).
    UploadedImage,
    /// A page of a PDF (`application/pdf`).
    PdfPage,
}

impl SourceOrigin {
    /// Classify an upload by its declared MIME type.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or(mime).trim();
        if essence.eq_ignore_ascii_case("application/pdf") {
            Some(Self::PdfPage)
        } else if essence.to_ascii_lowercase().starts_with("image/") {
            Some(Self::UploadedImage)
        } else {
            None
        }
    }
}

// -- Pipeline bookkeeping ----------------------------------------------------

/// Content slot on a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    /// The one image tiled across single-image layouts.
    Single,
    /// Front face of a dual-sided card.
    Front,
    /// Back face of a dual-sided card.
    Back,
    /// The n-th image (0-based) of a multi-image sheet.
    Item(u32),
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single => f.write_str("image"),
            Self::Front => f.write_str("front"),
            Self::Back => f.write_str("back"),
            Self::Item(n) => write!(f, "image {}", n + 1),
        }
    }
}

/// Monotonic counter stamped on baselines and processed images.
///
/// Results computed at an older generation are stale and must be dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "g{}", self.0)
    }
}
