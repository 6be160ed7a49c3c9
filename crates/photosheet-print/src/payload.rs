// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print hand-off — what a print collaborator receives for one sheet.

use base64::{Engine as _, engine::general_purpose};
use photosheet_core::error::Result;
use photosheet_core::types::Length;
use tracing::{debug, instrument};

use crate::composer::Sheet;
use crate::writer::{SheetWriter, encode_png};

/// Delay between opening the print dialog and closing the print window.
pub const PRINT_CLOSE_DELAY_MS: u32 = 500;

/// A sheet ready for a printer: PDF bytes plus the page geometry a print
/// dialog must be told about.
#[derive(Clone)]
pub struct PrintPayload {
    pub pdf: Vec<u8>,
    pub mime_type: &'static str,
    /// CSS `@page size` value (`A4`, `4in 6in`).
    pub page_size: String,
    pub width: Length,
    pub height: Length,
    /// Page margin in millimetres. Always zero: the sheet is the page.
    pub margin_mm: f64,
    png: Vec<u8>,
}

impl std::fmt::Debug for PrintPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrintPayload")
            .field("pdf_len", &self.pdf.len())
            .field("mime_type", &self.mime_type)
            .field("page_size", &self.page_size)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("margin_mm", &self.margin_mm)
            .finish()
    }
}

impl PrintPayload {
    #[instrument(skip_all, fields(layout = sheet.spec().kind.name()))]
    pub fn from_sheet(writer: &SheetWriter, sheet: &Sheet) -> Result<Self> {
        let payload = Self {
            pdf: writer.to_pdf(sheet)?,
            mime_type: "application/pdf",
            page_size: sheet.page_size_directive(),
            width: sheet.width(),
            height: sheet.height(),
            margin_mm: 0.0,
            png: encode_png(sheet)?,
        };
        debug!(page_size = %payload.page_size, pdf_len = payload.pdf.len(), "print payload ready");
        Ok(payload)
    }

    /// Self-printing HTML page: the sheet as an exact-size image, an `@page`
    /// rule with zero margins, and a script that opens the print dialog then
    /// closes the window after [`PRINT_CLOSE_DELAY_MS`].
    pub fn print_markup(&self) -> String {
        let data = general_purpose::STANDARD.encode(&self.png);
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Print</title>
<style>
  @page {{ size: {page_size}; margin: 0; }}
  html, body {{ margin: 0; padding: 0; }}
  img.sheet {{ display: block; width: {width}; height: {height}; }}
  * {{ page-break-inside: avoid; break-inside: avoid; }}
</style>
</head>
<body>
<img class="sheet" src="data:image/png;base64,{data}" alt="sheet">
<script>
  window.onload = function () {{
    window.focus();
    window.print();
    setTimeout(function () {{ window.close(); }}, {delay});
  }};
</script>
</body>
</html>
"#,
            page_size = self.page_size,
            width = self.width,
            height = self.height,
            data = data,
            delay = PRINT_CLOSE_DELAY_MS,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::{ComposeOptions, SheetContent, compose};
    use photosheet_core::types::PaperSize;
    use photosheet_layout::{LayoutKind, resolve_tiling};

    fn payload(kind: LayoutKind) -> PrintPayload {
        let spec = resolve_tiling(kind).unwrap();
        let opts = ComposeOptions {
            dpi: 24,
            cut_borders: false,
        };
        let sheet = compose(&spec, &SheetContent::Single(None), opts).unwrap();
        PrintPayload::from_sheet(&SheetWriter::new(), &sheet).unwrap()
    }

    #[test]
    fn four_by_six_payload() {
        let p = payload(LayoutKind::IdCard);
        assert_eq!(p.page_size, "4in 6in");
        assert_eq!(p.margin_mm, 0.0);
        assert_eq!(p.mime_type, "application/pdf");
        assert!(p.pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn markup_carries_page_rule_and_image() {
        let html = payload(LayoutKind::FullPage {
            paper: PaperSize::A4,
        })
        .print_markup();
        assert!(html.contains("@page { size: A4; margin: 0; }"));
        assert!(html.contains("width: 210mm; height: 297mm;"));
        assert!(html.contains("data:image/png;base64,iVBOR"));
        assert!(html.contains(&format!("}}, {PRINT_CLOSE_DELAY_MS});")));
    }

    #[test]
    fn debug_omits_bytes() {
        let p = payload(LayoutKind::PassportGrid);
        let printed = format!("{p:?}");
        assert!(printed.contains("pdf_len"));
        assert!(!printed.contains("png"));
    }
}
