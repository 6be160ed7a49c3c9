// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sheet writer — export a composed sheet as a single-page PDF with the exact
// physical page size, or as a PNG.
//
// printpdf 0.8 builds pages from `Vec<Op>` lists; the sheet raster becomes one
// XObject drawn at the origin at the sheet's DPI, so it covers the page
// exactly.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat};
use photosheet_core::error::{PhotosheetError, Result};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument};

use crate::composer::Sheet;
use crate::payload::PrintPayload;

/// Serialises sheets for printing or saving.
#[derive(Debug, Clone, Default)]
pub struct SheetWriter {
    /// Title metadata embedded in the PDF /Info dictionary.
    title: Option<String>,
}

impl SheetWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Single-page PDF whose page is exactly the sheet's physical size.
    #[instrument(skip(self, sheet), fields(layout = sheet.spec().kind.name(), dpi = sheet.dpi()))]
    pub fn to_pdf(&self, sheet: &Sheet) -> Result<Vec<u8>> {
        let default_title = format!(
            "Photosheet {} {}",
            sheet.spec().kind.name(),
            sheet.rendered_at().format("%Y-%m-%d %H:%M")
        );
        let title = self.title.as_deref().unwrap_or(&default_title);

        let page_w = Mm(sheet.width().to_mm() as f32);
        let page_h = Mm(sheet.height().to_mm() as f32);

        // Sheets are opaque.
        let rgb = DynamicImage::ImageRgba8(sheet.image().clone()).to_rgb8();
        let (width_px, height_px) = rgb.dimensions();
        let raw = RawImage {
            pixels: RawImageData::U8(rgb.into_raw()),
            width: width_px as usize,
            height: height_px as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };

        let mut doc = PdfDocument::new(title);
        let xobject_id = doc.add_image(&raw);
        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                scale_x: None,
                scale_y: None,
                dpi: Some(sheet.dpi() as f32),
                rotate: None,
            },
        }];
        doc.with_pages(vec![PdfPage::new(page_w, page_h, ops)]);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        debug!(
            width_mm = page_w.0,
            height_mm = page_h.0,
            warnings = warnings.len(),
            bytes_len = output.len(),
            "sheet PDF written"
        );
        Ok(output)
    }

    /// PNG encoding of the sheet raster.
    pub fn to_png(&self, sheet: &Sheet) -> Result<Vec<u8>> {
        encode_png(sheet)
    }

    /// Write the sheet to `path`, choosing PDF, PNG, or printable HTML by
    /// extension.
    pub fn write_file(&self, sheet: &Sheet, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let bytes = match extension.as_deref() {
            Some("pdf") => self.to_pdf(sheet)?,
            Some("png") => self.to_png(sheet)?,
            Some("html" | "htm") => PrintPayload::from_sheet(self, sheet)?
                .print_markup()
                .into_bytes(),
            _ => {
                return Err(PhotosheetError::Encoding(format!(
                    "cannot tell output format from {}; use .pdf, .png, or .html",
                    path.display()
                )));
            }
        };
        std::fs::write(path, &bytes)?;
        info!(path = %path.display(), bytes_len = bytes.len(), "sheet written");
        Ok(())
    }
}

pub(crate) fn encode_png(sheet: &Sheet) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    sheet
        .image()
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(|e| PhotosheetError::Encoding(format!("PNG encode failed: {e}")))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::{ComposeOptions, SheetContent, compose};
    use image::{Rgba, RgbaImage};
    use photosheet_layout::{LayoutKind, SmallGridCount, resolve_tiling};

    fn sheet() -> Sheet {
        let spec = resolve_tiling(LayoutKind::SmallGrid {
            count: SmallGridCount::THREE,
        })
        .unwrap();
        let photo = RgbaImage::from_pixel(60, 72, Rgba([90, 140, 60, 255]));
        compose(
            &spec,
            &SheetContent::Single(Some(photo)),
            ComposeOptions {
                dpi: 96,
                cut_borders: true,
            },
        )
        .unwrap()
    }

    fn media_box(doc: &lopdf::Document, page_id: lopdf::ObjectId) -> Vec<f32> {
        let mut dict = doc.get_dictionary(page_id).unwrap();
        loop {
            if let Ok(obj) = dict.get(b"MediaBox") {
                return obj
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|v| v.as_float().unwrap())
                    .collect();
            }
            let parent = dict.get(b"Parent").unwrap().as_reference().unwrap();
            dict = doc.get_dictionary(parent).unwrap();
        }
    }

    #[test]
    fn pdf_page_matches_physical_sheet() {
        let bytes = SheetWriter::new().to_pdf(&sheet()).unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);

        let page_id = *pages.values().next().unwrap();
        let mb = media_box(&doc, page_id);
        // 4in x 6in = 288pt x 432pt.
        assert!((mb[2] - mb[0] - 288.0).abs() < 0.05, "{mb:?}");
        assert!((mb[3] - mb[1] - 432.0).abs() < 0.05, "{mb:?}");
    }

    #[test]
    fn png_round_trips_dimensions() {
        let sheet = sheet();
        let png = SheetWriter::new().to_png(&sheet).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (384, 576));
    }

    #[test]
    fn write_file_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = sheet();
        let writer = SheetWriter::new();

        let pdf = dir.path().join("sheet.pdf");
        writer.write_file(&sheet, &pdf).unwrap();
        assert!(std::fs::read(&pdf).unwrap().starts_with(b"%PDF"));

        let html = dir.path().join("sheet.html");
        writer.write_file(&sheet, &html).unwrap();
        let text = std::fs::read_to_string(&html).unwrap();
        assert!(text.contains("size: 4in 6in"));

        let err = writer.write_file(&sheet, dir.path().join("sheet.tiff")).unwrap_err();
        assert!(matches!(err, PhotosheetError::Encoding(_)));
    }
}
