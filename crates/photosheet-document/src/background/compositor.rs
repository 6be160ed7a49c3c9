// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Background compositor — send the image to a segmentation service, then lay
// the returned cut-out over a solid backdrop.
//
// The alpha of the cut-out is kept as a `Matte` so the same subject mask can
// be re-applied after every brightness/contrast re-bake without another
// network round trip.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{GrayImage, ImageFormat, Luma, Rgba, RgbaImage};
use photosheet_core::error::{PhotosheetError, Result};
use photosheet_core::types::Rgb;
use tracing::{debug, info, instrument};

use super::SegmentationService;

/// Per-pixel subject coverage, 0 (background) to 255 (subject).
#[derive(Debug, Clone, PartialEq)]
pub struct Matte(GrayImage);

impl Matte {
    /// Take the alpha channel of a cut-out.
    pub fn extract(cutout: &RgbaImage) -> Self {
        Self(GrayImage::from_fn(cutout.width(), cutout.height(), |x, y| {
            Luma([cutout.get_pixel(x, y).0[3]])
        }))
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    pub fn coverage(&self, x: u32, y: u32) -> u8 {
        self.0.get_pixel(x, y).0[0]
    }
}

/// Result of a background replacement.
#[derive(Debug, Clone)]
pub struct BackgroundReplacement {
    /// Opaque image with the backdrop colour behind the subject.
    pub image: RgbaImage,
    /// Subject mask at the image's dimensions.
    pub matte: Matte,
}

/// Replace the background of `image` with `backdrop`.
///
/// `image` is left untouched; on any failure the caller keeps what it had.
#[instrument(skip(image, service), fields(width = image.width(), height = image.height(), backdrop = %backdrop))]
pub async fn replace_background<S: SegmentationService>(
    image: &RgbaImage,
    backdrop: Rgb,
    service: &S,
) -> Result<BackgroundReplacement> {
    let cutout = request_cutout(image, service).await?;
    let matte = Matte::extract(&cutout);
    let composed = composite_onto_backdrop(&cutout, backdrop);
    info!("background replaced");
    Ok(BackgroundReplacement {
        image: composed,
        matte,
    })
}

/// Ask `service` for a transparent-background version of `image`, scaled
/// back to the input's dimensions.
pub async fn request_cutout<S: SegmentationService>(
    image: &RgbaImage,
    service: &S,
) -> Result<RgbaImage> {
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| PhotosheetError::Encoding(format!("PNG encode failed: {e}")))?;

    let reply = service.remove_background(png).await?;
    let cutout = image::load_from_memory(&reply)
        .map_err(|e| {
            PhotosheetError::BackgroundService(format!("malformed response from background service: {e}"))
        })?
        .to_rgba8();

    if cutout.dimensions() == image.dimensions() {
        return Ok(cutout);
    }
    debug!(
        returned = ?cutout.dimensions(),
        expected = ?image.dimensions(),
        "resizing cut-out to source dimensions"
    );
    Ok(imageops::resize(
        &cutout,
        image.width(),
        image.height(),
        FilterType::Lanczos3,
    ))
}

/// Draw `subject` over a solid canvas of `backdrop`, alpha-blended.
pub fn composite_onto_backdrop(subject: &RgbaImage, backdrop: Rgb) -> RgbaImage {
    let [r, g, b] = backdrop.0;
    let mut canvas = RgbaImage::from_pixel(subject.width(), subject.height(), Rgba([r, g, b, 255]));
    imageops::overlay(&mut canvas, subject, 0, 0);
    canvas
}

/// Blend `image` over `backdrop` using `matte` as the coverage. The image's
/// own alpha is ignored and the output is opaque.
pub fn apply_matte(image: &RgbaImage, matte: &Matte, backdrop: Rgb) -> Result<RgbaImage> {
    if matte.dimensions() != image.dimensions() {
        return Err(PhotosheetError::BackgroundService(format!(
            "matte is {:?} but image is {:?}",
            matte.dimensions(),
            image.dimensions()
        )));
    }

    let back = backdrop.0;
    Ok(RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let Rgba([r, g, b, _]) = *image.get_pixel(x, y);
        let a = u32::from(matte.coverage(x, y));
        let mix = |fg: u8, bg: u8| -> u8 {
            ((u32::from(fg) * a + u32::from(bg) * (255 - a) + 127) / 255) as u8
        };
        Rgba([mix(r, back[0]), mix(g, back[1]), mix(b, back[2]), 255])
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns the input with its left half made transparent.
    struct HalfCutout {
        scale_down: bool,
    }

    impl SegmentationService for HalfCutout {
        async fn remove_background(&self, png: Vec<u8>) -> Result<Vec<u8>> {
            let mut img = image::load_from_memory(&png).unwrap().to_rgba8();
            let half = img.width() / 2;
            for (x, _, px) in img.enumerate_pixels_mut() {
                if x < half {
                    px.0[3] = 0;
                }
            }
            if self.scale_down {
                img = imageops::resize(&img, img.width() / 2, img.height() / 2, FilterType::Nearest);
            }
            let mut out = Vec::new();
            img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png).unwrap();
            Ok(out)
        }
    }

    struct Failing;

    impl SegmentationService for Failing {
        async fn remove_background(&self, _png: Vec<u8>) -> Result<Vec<u8>> {
            Err(PhotosheetError::BackgroundService("HTTP 402: quota exhausted".into()))
        }
    }

    struct Garbage;

    impl SegmentationService for Garbage {
        async fn remove_background(&self, _png: Vec<u8>) -> Result<Vec<u8>> {
            Ok(b"<html>nope</html>".to_vec())
        }
    }

    fn subject() -> RgbaImage {
        RgbaImage::from_pixel(40, 20, Rgba([200, 10, 10, 255]))
    }

    #[tokio::test]
    async fn background_pixels_take_backdrop_colour() {
        let out = replace_background(&subject(), Rgb::PASSPORT_BLUE, &HalfCutout { scale_down: false })
            .await
            .unwrap();
        assert_eq!(out.image.dimensions(), (40, 20));
        assert_eq!(out.image.get_pixel(2, 10), &Rgba([191, 215, 234, 255]));
        assert_eq!(out.image.get_pixel(35, 10), &Rgba([200, 10, 10, 255]));
        assert_eq!(out.matte.coverage(2, 10), 0);
        assert_eq!(out.matte.coverage(35, 10), 255);
    }

    #[tokio::test]
    async fn smaller_reply_is_resized_to_source() {
        let out = replace_background(&subject(), Rgb::WHITE, &HalfCutout { scale_down: true })
            .await
            .unwrap();
        assert_eq!(out.image.dimensions(), (40, 20));
        assert_eq!(out.matte.dimensions(), (40, 20));
    }

    #[tokio::test]
    async fn service_failure_propagates() {
        let err = replace_background(&subject(), Rgb::WHITE, &Failing).await.unwrap_err();
        assert!(matches!(err, PhotosheetError::BackgroundService(_)));
    }

    #[tokio::test]
    async fn undecodable_reply_is_malformed() {
        let err = replace_background(&subject(), Rgb::WHITE, &Garbage).await.unwrap_err();
        match err {
            PhotosheetError::BackgroundService(msg) => assert!(msg.contains("malformed")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn matte_reapplies_to_a_rebaked_image() {
        let mut cutout = subject();
        cutout.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        let matte = Matte::extract(&cutout);

        let rebaked = RgbaImage::from_pixel(40, 20, Rgba([250, 250, 250, 255]));
        let out = apply_matte(&rebaked, &matte, Rgb::BLACK).unwrap();
        assert_eq!(out.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(out.get_pixel(1, 0), &Rgba([250, 250, 250, 255]));
    }

    #[test]
    fn matte_size_mismatch_is_rejected() {
        let matte = Matte::extract(&RgbaImage::new(4, 4));
        assert!(apply_matte(&RgbaImage::new(5, 4), &matte, Rgb::WHITE).is_err());
    }
}
