// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Source documents — the raw bytes a user selected, classified as a photo or
// a PDF and fingerprinted. A source is immutable once ingested; selecting a
// new file replaces it wholesale.

use std::path::Path;
use std::sync::Arc;

use photosheet_core::error::{PhotosheetError, Result};
use photosheet_core::types::SourceOrigin;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

/// How far into a file the `%PDF-` marker may appear.
const PDF_MARKER_WINDOW: usize = 1024;

/// A user-supplied photo or PDF.
#[derive(Clone)]
pub struct SourceDocument {
    origin: SourceOrigin,
    bytes: Arc<[u8]>,
    password: Option<String>,
    name: Option<String>,
    fingerprint: String,
}

impl SourceDocument {
    /// Classify and wrap raw upload bytes.
    ///
    /// `mime` is the type declared by the picker, if any. When the byte
    /// signature clearly says otherwise the signature wins; when the bytes are
    /// unrecognisable the declared type is trusted and decoding decides.
    #[instrument(skip(bytes), fields(bytes_len = bytes.len(), mime))]
    pub fn ingest(bytes: Vec<u8>, mime: Option<&str>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(PhotosheetError::CorruptDocument("file is empty".into()));
        }

        let declared = match mime {
            Some(m) => Some(
                SourceOrigin::from_mime(m)
                    .ok_or_else(|| PhotosheetError::UnsupportedFormat(m.to_string()))?,
            ),
            None => None,
        };

        let origin = match (sniff_origin(&bytes), declared) {
            (Some(sniffed), Some(declared)) if sniffed != declared => {
                debug!(?sniffed, ?declared, "declared type disagrees with file signature");
                sniffed
            }
            (Some(sniffed), _) => sniffed,
            (None, Some(declared)) => declared,
            (None, None) => {
                return Err(PhotosheetError::UnsupportedFormat(
                    "unrecognised file signature".into(),
                ));
            }
        };

        let fingerprint = hash_bytes(&bytes);
        info!(?origin, fingerprint = %&fingerprint[..12], "source ingested");

        Ok(Self {
            origin,
            bytes: bytes.into(),
            password: None,
            name: None,
            fingerprint,
        })
    }

    /// Read and ingest a file, classifying it by content.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        let mut source = Self::ingest(bytes, None)?;
        source.name = name;
        Ok(source)
    }

    /// Attach the password to try first when this source is a locked PDF.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Attach a display name (usually the file name).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn origin(&self) -> SourceOrigin {
        self.origin
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// SHA-256 of the raw bytes, hex encoded.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

impl std::fmt::Debug for SourceDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceDocument")
            .field("origin", &self.origin)
            .field("bytes_len", &self.bytes.len())
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("name", &self.name)
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

/// Identify a source by its leading bytes.
///
/// Image magic is anchored at offset 0, so it is checked first; the PDF
/// marker may follow leading junk and could also appear inside image
/// metadata.
fn sniff_origin(bytes: &[u8]) -> Option<SourceOrigin> {
    if image::guess_format(bytes).is_ok() {
        return Some(SourceOrigin::UploadedImage);
    }
    let window = &bytes[..bytes.len().min(PDF_MARKER_WINDOW)];
    if window.windows(5).any(|w| w == b"%PDF-") {
        return Some(SourceOrigin::PdfPage);
    }
    None
}

/// SHA-256 hex digest of `data`.
pub fn hash_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbaImage};

    fn png_bytes() -> Vec<u8> {
        let img = RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]));
        let mut out = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn png_is_classified_as_image() {
        let source = SourceDocument::ingest(png_bytes(), None).unwrap();
        assert_eq!(source.origin(), SourceOrigin::UploadedImage);
        assert_eq!(source.fingerprint().len(), 64);
    }

    #[test]
    fn pdf_signature_wins_over_declared_image() {
        let source =
            SourceDocument::ingest(b"%PDF-1.7\n%...".to_vec(), Some("image/jpeg")).unwrap();
        assert_eq!(source.origin(), SourceOrigin::PdfPage);
    }

    #[test]
    fn jpeg_with_pdf_marker_in_comment_is_an_image() {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xFE, 0x00, 0x10];
        bytes.extend_from_slice(b"see %PDF-1.4 scan");
        bytes.extend_from_slice(&[0xFF, 0xD9]);
        let source = SourceDocument::ingest(bytes, None).unwrap();
        assert_eq!(source.origin(), SourceOrigin::UploadedImage);
    }

    #[test]
    fn pdf_after_leading_junk_is_still_a_pdf() {
        let mut bytes = b"\xEF\xBB\xBF\n".to_vec();
        bytes.extend_from_slice(b"%PDF-1.7\n");
        let source = SourceDocument::ingest(bytes, None).unwrap();
        assert_eq!(source.origin(), SourceOrigin::PdfPage);
    }

    #[test]
    fn unknown_bytes_without_mime_are_unsupported() {
        let err = SourceDocument::ingest(b"hello world".to_vec(), None).unwrap_err();
        assert!(matches!(err, PhotosheetError::UnsupportedFormat(_)));
    }

    #[test]
    fn unsupported_mime_is_rejected() {
        let err = SourceDocument::ingest(b"hello".to_vec(), Some("text/plain")).unwrap_err();
        assert!(matches!(err, PhotosheetError::UnsupportedFormat(_)));
    }

    #[test]
    fn empty_file_is_corrupt() {
        let err = SourceDocument::ingest(Vec::new(), Some("image/png")).unwrap_err();
        assert!(matches!(err, PhotosheetError::CorruptDocument(_)));
    }

    #[test]
    fn debug_hides_password() {
        let source = SourceDocument::ingest(png_bytes(), None)
            .unwrap()
            .with_password("s3cret");
        assert!(!format!("{source:?}").contains("s3cret"));
        assert_eq!(source.password(), Some("s3cret"));
    }
}
