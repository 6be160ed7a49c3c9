// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Background replacement. Segmentation is delegated to an external service
// behind `SegmentationService`; compositing onto the backdrop colour happens
// locally.

pub mod compositor;
pub mod remove_bg;

use std::future::Future;

use photosheet_core::error::Result;

/// Separates a subject from its background.
pub trait SegmentationService {
    /// Take a PNG and return an encoded image of the same scene whose
    /// background pixels are fully transparent.
    ///
    /// Failures of any kind (transport, auth, quota, undecodable reply) are
    /// reported as `PhotosheetError::BackgroundService`.
    fn remove_background(&self, png: Vec<u8>) -> impl Future<Output = Result<Vec<u8>>> + Send;
}
