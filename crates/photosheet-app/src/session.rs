// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline session — one user's documents moving through
// rasterize -> crop -> bake -> (background) -> compose.
//
// Each slot keeps the rendered page, the baseline (crop result), the current
// adjustment parameters, and a lazily baked processed image. Every baseline
// replacement or parameter change bumps the slot's generation; asynchronous
// background results stamped with an older generation are dropped.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use image::RgbaImage;
use photosheet_core::error::{LockReason, PhotosheetError, Result};
use photosheet_core::types::{AdjustmentParams, CropRegion, Generation, Rgb, Slot};
use photosheet_document::{
    Matte, Rasterizer, RasterFrame, SegmentationService, SourceDocument, apply_matte, bake, crop,
    request_cutout,
};
use photosheet_layout::{LayoutKind, resolve_tiling};
use photosheet_print::{ComposeOptions, PrintPayload, Sheet, SheetContent, SheetWriter, compose};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Unique identifier for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What happened when a source was loaded or unlocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The first page is rendered and is the slot's baseline.
    Ready { page_count: usize },
    /// The PDF is encrypted; call [`Session::submit_password`] or
    /// [`Session::cancel_unlock`].
    NeedsPassword { attempt: u32, rejected: bool },
}

/// A locked PDF waiting for its password.
#[derive(Debug, Clone)]
pub struct PendingUnlock {
    slot: Slot,
    source: SourceDocument,
    attempt: u32,
    rejected: bool,
}

impl PendingUnlock {
    pub fn slot(&self) -> Slot {
        self.slot
    }

    /// Prompt number, from 1.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Whether the last password offered was wrong.
    pub fn rejected(&self) -> bool {
        self.rejected
    }
}

/// Work order for an asynchronous background replacement.
///
/// Produced by [`Session::begin_background`]; the session is not borrowed
/// while the service runs.
#[derive(Debug, Clone)]
pub struct BackgroundTicket {
    pub slot: Slot,
    pub generation: Generation,
    pub backdrop: Rgb,
    image: RgbaImage,
}

impl BackgroundTicket {
    /// Run the segmentation service for this ticket.
    pub async fn run<S: SegmentationService>(self, service: &S) -> Result<BackgroundResult> {
        let cutout = request_cutout(&self.image, service).await?;
        Ok(BackgroundResult {
            slot: self.slot,
            generation: self.generation,
            backdrop: self.backdrop,
            matte: Matte::extract(&cutout),
        })
    }
}

/// A finished segmentation, not yet applied.
#[derive(Debug, Clone)]
pub struct BackgroundResult {
    pub slot: Slot,
    pub generation: Generation,
    pub backdrop: Rgb,
    matte: Matte,
}

/// Whether an asynchronous result took effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Applied,
    /// The slot moved on while the result was in flight.
    Discarded,
}

/// Read-only summary of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotStatus {
    pub page_count: usize,
    pub page_number: usize,
    pub generation: Generation,
    pub params: AdjustmentParams,
    pub has_background: bool,
    /// Bakes performed since the slot was created.
    pub bakes: u64,
}

#[derive(Debug, Clone)]
struct BackgroundLayer {
    matte: Matte,
    backdrop: Rgb,
}

#[derive(Debug, Clone, Default)]
struct SlotState {
    source: Option<SourceDocument>,
    page_count: usize,
    page_number: usize,
    frame: Option<RasterFrame>,
    baseline: Option<RgbaImage>,
    params: AdjustmentParams,
    background: Option<BackgroundLayer>,
    processed: Option<RgbaImage>,
    generation: Generation,
    bakes: u64,
}

impl SlotState {
    /// Replace the baseline. Adjustments survive; the background matte does
    /// not, because it describes the old pixels.
    fn set_baseline(&mut self, baseline: RgbaImage) {
        self.baseline = Some(baseline);
        self.background = None;
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.processed = None;
        self.generation = self.generation.next();
    }

    fn processed(&mut self, slot: Slot) -> Result<&RgbaImage> {
        let baseline = self
            .baseline
            .as_ref()
            .ok_or(PhotosheetError::MissingContent(slot))?;
        if self.processed.is_none() {
            let baked = bake(baseline, self.params);
            let out = match &self.background {
                Some(layer) => apply_matte(&baked, &layer.matte, layer.backdrop)?,
                None => baked,
            };
            self.bakes += 1;
            debug!(%slot, generation = %self.generation, "processed image rebuilt");
            self.processed = Some(out);
        }
        self.processed
            .as_ref()
            .ok_or(PhotosheetError::MissingContent(slot))
    }
}

/// One user's pipeline state.
pub struct Session {
    id: SessionId,
    created_at: DateTime<Utc>,
    rasterizer: Rasterizer,
    layout: LayoutKind,
    slots: HashMap<Slot, SlotState>,
    pending: Option<PendingUnlock>,
}

impl Session {
    pub fn new(rasterizer: Rasterizer, layout: LayoutKind) -> Self {
        let id = SessionId::new();
        info!(session = %id, layout = layout.name(), "session started");
        Self {
            id,
            created_at: Utc::now(),
            rasterizer,
            layout,
            slots: HashMap::new(),
            pending: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn layout(&self) -> LayoutKind {
        self.layout
    }

    /// Switch layout. Moving to a different kind of layout discards all slot
    /// content and any pending unlock; changing only the count or paper keeps
    /// it.
    ///
    /// Cleared slots keep advancing their generation, so background results
    /// still in flight are discarded when they land.
    pub fn set_layout(&mut self, layout: LayoutKind) {
        let same_kind = std::mem::discriminant(&self.layout) == std::mem::discriminant(&layout);
        debug!(from = self.layout.name(), to = layout.name(), same_kind, "layout changed");
        self.layout = layout;
        if same_kind {
            return;
        }
        for state in self.slots.values_mut() {
            *state = SlotState {
                generation: state.generation.next(),
                ..SlotState::default()
            };
        }
        if let Some(pending) = self.pending.take() {
            info!(slot = %pending.slot, "pending unlock dropped by layout change");
        }
    }

    pub fn pending_unlock(&self) -> Option<&PendingUnlock> {
        self.pending.as_ref()
    }

    pub fn status(&self, slot: Slot) -> Option<SlotStatus> {
        let state = self.slots.get(&slot)?;
        Some(SlotStatus {
            page_count: state.page_count,
            page_number: state.page_number,
            generation: state.generation,
            params: state.params,
            has_background: state.background.is_some(),
            bakes: state.bakes,
        })
    }

    /// The rendered page the crop rectangle is drawn on.
    pub fn frame(&self, slot: Slot) -> Option<&RasterFrame> {
        self.slots.get(&slot)?.frame.as_ref()
    }

    // -- Loading --------------------------------------------------------------

    /// Load `source` into `slot` and render its first page.
    ///
    /// A locked PDF parks the source as a pending unlock and returns
    /// `NeedsPassword`; the slot keeps its previous content until the unlock
    /// completes.
    #[instrument(skip(self, source), fields(session = %self.id, %slot, origin = ?source.origin()))]
    pub fn load_source(&mut self, slot: Slot, source: SourceDocument) -> Result<LoadOutcome> {
        let opened = self
            .rasterizer
            .open(&source, source.password())
            .map(|o| o.page_count());
        let page_count = match opened {
            Ok(page_count) => page_count,
            Err(PhotosheetError::DocumentLocked(reason)) if reason != LockReason::Cancelled => {
                let rejected = reason == LockReason::PasswordRejected;
                info!(rejected, "source is password protected");
                self.pending = Some(PendingUnlock {
                    slot,
                    source,
                    attempt: 1,
                    rejected,
                });
                return Ok(LoadOutcome::NeedsPassword {
                    attempt: 1,
                    rejected,
                });
            }
            Err(err) => return Err(err),
        };
        self.commit_source(slot, source, page_count)
    }

    /// Retry the pending unlock with `password`.
    ///
    /// A wrong password fails with `DocumentLocked(PasswordRejected)` and
    /// leaves the unlock pending for another try, until the attempt limit is
    /// reached.
    #[instrument(skip(self, password), fields(session = %self.id))]
    pub fn submit_password(&mut self, password: &str) -> Result<LoadOutcome> {
        let pending = self.pending.take().ok_or(PhotosheetError::NoSource)?;
        let source = pending.source.clone().with_password(password);

        let opened = self
            .rasterizer
            .open(&source, Some(password))
            .map(|o| o.page_count());
        match opened {
            Ok(page_count) => {
                info!(attempt = pending.attempt, "document unlocked");
                self.commit_source(pending.slot, source, page_count)
            }
            Err(PhotosheetError::DocumentLocked(LockReason::PasswordRejected)) => {
                if pending.attempt >= self.rasterizer.max_password_attempts() {
                    warn!(attempt = pending.attempt, "password attempts exhausted");
                } else {
                    debug!(attempt = pending.attempt, "password rejected");
                    self.pending = Some(PendingUnlock {
                        attempt: pending.attempt + 1,
                        rejected: true,
                        ..pending
                    });
                }
                Err(PhotosheetError::DocumentLocked(LockReason::PasswordRejected))
            }
            Err(err) => Err(err),
        }
    }

    /// Abandon the pending unlock. Slot content is untouched.
    pub fn cancel_unlock(&mut self) -> Result<()> {
        let pending = self.pending.take().ok_or(PhotosheetError::NoSource)?;
        info!(slot = %pending.slot, "unlock cancelled");
        Ok(())
    }

    fn commit_source(
        &mut self,
        slot: Slot,
        source: SourceDocument,
        page_count: usize,
    ) -> Result<LoadOutcome> {
        let frame = self.rasterizer.rasterize(&source, Some(1), None)?;
        let state = self.slots.entry(slot).or_default();
        state.source = Some(source);
        state.page_count = page_count;
        state.page_number = 1;
        state.set_baseline(frame.pixels().clone());
        state.frame = Some(frame);
        info!(%slot, page_count, "source loaded");
        Ok(LoadOutcome::Ready { page_count })
    }

    /// Render another page of the slot's PDF and make it the baseline.
    #[instrument(skip(self), fields(session = %self.id))]
    pub fn select_page(&mut self, slot: Slot, page_number: usize) -> Result<()> {
        let state = self
            .slots
            .get(&slot)
            .ok_or(PhotosheetError::MissingContent(slot))?;
        let source = state
            .source
            .as_ref()
            .ok_or(PhotosheetError::MissingContent(slot))?;
        let frame = self.rasterizer.rasterize(source, Some(page_number), None)?;

        let state = self.slots.entry(slot).or_default();
        state.page_number = page_number;
        state.set_baseline(frame.pixels().clone());
        state.frame = Some(frame);
        Ok(())
    }

    // -- Crop and adjust ------------------------------------------------------

    /// Record the on-screen size of the slot's frame, in display pixels.
    pub fn set_display_size(&mut self, slot: Slot, width: u32, height: u32) -> Result<()> {
        let state = self
            .slots
            .get_mut(&slot)
            .ok_or(PhotosheetError::MissingContent(slot))?;
        let frame = state
            .frame
            .take()
            .ok_or(PhotosheetError::MissingContent(slot))?;
        match frame.clone().with_display_size(width, height) {
            Ok(resized) => {
                state.frame = Some(resized);
                Ok(())
            }
            Err(err) => {
                state.frame = Some(frame);
                Err(err)
            }
        }
    }

    /// Crop the slot's frame to `region` (display space) and make the result
    /// the baseline. Invalid regions leave the slot unchanged.
    #[instrument(skip(self), fields(session = %self.id, region = %region))]
    pub fn apply_crop(&mut self, slot: Slot, region: CropRegion) -> Result<()> {
        let state = self
            .slots
            .get_mut(&slot)
            .ok_or(PhotosheetError::MissingContent(slot))?;
        let frame = state
            .frame
            .as_ref()
            .ok_or(PhotosheetError::MissingContent(slot))?;
        let cropped = crop(frame, &region)?;
        info!(
            width = cropped.native_width(),
            height = cropped.native_height(),
            "crop applied"
        );
        state.set_baseline(cropped.into_pixels());
        Ok(())
    }

    /// Change brightness/contrast. The bake itself is deferred until the
    /// processed image is next read, so bursts of changes cost one bake.
    pub fn set_adjustments(&mut self, slot: Slot, params: AdjustmentParams) -> Result<()> {
        let state = self
            .slots
            .get_mut(&slot)
            .ok_or(PhotosheetError::MissingContent(slot))?;
        if state.params == params {
            return Ok(());
        }
        state.params = params;
        state.invalidate();
        debug!(%slot, generation = %state.generation, "adjustments changed");
        Ok(())
    }

    /// The slot's baseline with adjustments (and background) applied.
    pub fn processed(&mut self, slot: Slot) -> Result<&RgbaImage> {
        self.slots
            .get_mut(&slot)
            .ok_or(PhotosheetError::MissingContent(slot))?
            .processed(slot)
    }

    // -- Background -----------------------------------------------------------

    /// Snapshot the slot's adjusted image for segmentation.
    pub fn begin_background(&mut self, slot: Slot, backdrop: Rgb) -> Result<BackgroundTicket> {
        let state = self
            .slots
            .get_mut(&slot)
            .ok_or(PhotosheetError::MissingContent(slot))?;
        let baseline = state
            .baseline
            .as_ref()
            .ok_or(PhotosheetError::MissingContent(slot))?;
        // The service must see the subject without any earlier backdrop.
        let image = bake(baseline, state.params);
        state.bakes += 1;
        debug!(%slot, generation = %state.generation, "background requested");
        Ok(BackgroundTicket {
            slot,
            generation: state.generation,
            backdrop,
            image,
        })
    }

    /// Apply a finished segmentation if its slot has not moved on.
    pub fn finish_background(&mut self, result: BackgroundResult) -> Result<Applied> {
        let state = self
            .slots
            .get_mut(&result.slot)
            .ok_or(PhotosheetError::MissingContent(result.slot))?;
        if state.generation != result.generation {
            warn!(
                slot = %result.slot,
                result_generation = %result.generation,
                current = %state.generation,
                "discarding stale background result"
            );
            return Ok(Applied::Discarded);
        }
        let matches_baseline = state
            .baseline
            .as_ref()
            .is_some_and(|b| b.dimensions() == result.matte.dimensions());
        if !matches_baseline {
            return Ok(Applied::Discarded);
        }

        state.background = Some(BackgroundLayer {
            matte: result.matte,
            backdrop: result.backdrop,
        });
        state.invalidate();
        info!(slot = %result.slot, backdrop = %result.backdrop, "background applied");
        Ok(Applied::Applied)
    }

    /// Run a background replacement end to end.
    pub async fn replace_background<S: SegmentationService>(
        &mut self,
        slot: Slot,
        backdrop: Rgb,
        service: &S,
    ) -> Result<Applied> {
        let ticket = self.begin_background(slot, backdrop)?;
        let result = ticket.run(service).await?;
        self.finish_background(result)
    }

    /// Drop the background layer, restoring the plain adjusted image.
    pub fn clear_background(&mut self, slot: Slot) -> Result<()> {
        let state = self
            .slots
            .get_mut(&slot)
            .ok_or(PhotosheetError::MissingContent(slot))?;
        if state.background.take().is_some() {
            state.invalidate();
        }
        Ok(())
    }

    // -- Output ---------------------------------------------------------------

    /// Compose the current layout. Fails if any slot the layout needs is
    /// empty.
    #[instrument(skip(self), fields(session = %self.id, layout = self.layout.name()))]
    pub fn compose_sheet(&mut self, options: ComposeOptions) -> Result<Sheet> {
        let spec = resolve_tiling(self.layout)?;
        let needed = self.layout.slots();
        for &slot in &needed {
            let loaded = self.slots.get(&slot).is_some_and(|s| s.baseline.is_some());
            if !loaded {
                warn!(%slot, "refusing to compose with an empty slot");
                return Err(PhotosheetError::MissingContent(slot));
            }
        }

        let content = match self.layout {
            LayoutKind::DualSidedId => SheetContent::Pair {
                front: Some(self.processed(Slot::Front)?.clone()),
                back: Some(self.processed(Slot::Back)?.clone()),
            },
            LayoutKind::MultiPage { .. } => {
                let mut images = Vec::with_capacity(needed.len());
                for &slot in &needed {
                    images.push(Some(self.processed(slot)?.clone()));
                }
                SheetContent::Many(images)
            }
            _ => SheetContent::Single(Some(self.processed(Slot::Single)?.clone())),
        };
        compose(&spec, &content, options)
    }

    /// Compose and package the sheet for a print collaborator.
    pub fn print_sheet(
        &mut self,
        writer: &SheetWriter,
        options: ComposeOptions,
    ) -> Result<PrintPayload> {
        let sheet = self.compose_sheet(options)?;
        PrintPayload::from_sheet(writer, &sheet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgba};
    use photosheet_document::FakePdfBackend;
    use photosheet_core::types::PaperSize;
    use photosheet_layout::SmallGridCount;
    use std::io::Cursor;

    fn png_source(width: u32, height: u32) -> SourceDocument {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            let v = 40 + ((x + y) % 176) as u8;
            Rgba([v, v, v, 255])
        });
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        SourceDocument::ingest(bytes, Some("image/png")).unwrap()
    }

    fn locked_pdf_session() -> Session {
        let backend = FakePdfBackend::new(vec![(72.0, 96.0), (72.0, 72.0)]).locked("1984");
        Session::new(Rasterizer::new(Some(Box::new(backend))), LayoutKind::PassportGrid)
    }

    fn pdf_source() -> SourceDocument {
        SourceDocument::ingest(b"%PDF-1.7 test".to_vec(), Some("application/pdf")).unwrap()
    }

    /// Makes the left half of every image transparent.
    struct LeftHalfBackground;

    impl SegmentationService for LeftHalfBackground {
        async fn remove_background(&self, png: Vec<u8>) -> Result<Vec<u8>> {
            let mut img = image::load_from_memory(&png).unwrap().to_rgba8();
            let half = img.width() / 2;
            for (x, _, px) in img.enumerate_pixels_mut() {
                if x < half {
                    px.0[3] = 0;
                }
            }
            let mut out = Vec::new();
            img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png).unwrap();
            Ok(out)
        }
    }

    fn opts() -> ComposeOptions {
        ComposeOptions {
            dpi: 96,
            cut_borders: true,
        }
    }

    #[test]
    fn photo_to_small_grid_end_to_end() {
        let mut session = Session::new(
            Rasterizer::new(None),
            LayoutKind::SmallGrid {
                count: SmallGridCount::NINE,
            },
        );
        let outcome = session.load_source(Slot::Single, png_source(300, 400)).unwrap();
        assert_eq!(outcome, LoadOutcome::Ready { page_count: 1 });

        session.set_display_size(Slot::Single, 60, 80).unwrap();
        session
            .apply_crop(Slot::Single, CropRegion::new(4.0, 4.0, 24.0, 32.0))
            .unwrap();
        assert_eq!(
            session.processed(Slot::Single).unwrap().dimensions(),
            (120, 160)
        );

        let before = session.processed(Slot::Single).unwrap().clone();
        session
            .set_adjustments(Slot::Single, AdjustmentParams::new(130, 100).unwrap())
            .unwrap();
        let after = session.processed(Slot::Single).unwrap();
        let sum = |img: &RgbaImage| img.pixels().map(|p| u64::from(p.0[0])).sum::<u64>();
        assert!(sum(after) > sum(&before));

        let sheet = session.compose_sheet(opts()).unwrap();
        assert_eq!(sheet.width().to_inches(), 4.0);
        assert_eq!(sheet.height().to_inches(), 6.0);
        assert_eq!(sheet.tiles().len(), 9);
        let tiles = sheet.tiles();
        for (i, a) in tiles.iter().enumerate() {
            for b in &tiles[i + 1..] {
                assert!(!a.placement.overlaps(&b.placement));
            }
        }
    }

    #[test]
    fn invalid_crop_leaves_slot_unchanged() {
        let mut session = Session::new(Rasterizer::new(None), LayoutKind::IdCard);
        session.load_source(Slot::Single, png_source(50, 50)).unwrap();
        let generation = session.status(Slot::Single).unwrap().generation;

        let err = session
            .apply_crop(Slot::Single, CropRegion::new(40.0, 40.0, 20.0, 20.0))
            .unwrap_err();
        assert!(matches!(err, PhotosheetError::OutOfBounds { .. }));
        assert_eq!(session.status(Slot::Single).unwrap().generation, generation);
        assert_eq!(
            session.processed(Slot::Single).unwrap().dimensions(),
            (50, 50)
        );
    }

    #[test]
    fn crops_are_taken_from_the_frame_not_the_last_crop() {
        let mut session = Session::new(Rasterizer::new(None), LayoutKind::IdCard);
        session.load_source(Slot::Single, png_source(100, 100)).unwrap();
        session
            .apply_crop(Slot::Single, CropRegion::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        session
            .apply_crop(Slot::Single, CropRegion::new(50.0, 50.0, 50.0, 50.0))
            .unwrap();
        assert_eq!(
            session.processed(Slot::Single).unwrap().dimensions(),
            (50, 50)
        );
    }

    #[test]
    fn adjustment_bursts_bake_once() {
        let mut session = Session::new(Rasterizer::new(None), LayoutKind::IdCard);
        session.load_source(Slot::Single, png_source(20, 20)).unwrap();
        session.processed(Slot::Single).unwrap();
        let bakes = session.status(Slot::Single).unwrap().bakes;

        for pct in [110, 120, 130, 140] {
            session
                .set_adjustments(Slot::Single, AdjustmentParams::new(pct, 100).unwrap())
                .unwrap();
        }
        session.processed(Slot::Single).unwrap();
        session.processed(Slot::Single).unwrap();
        assert_eq!(session.status(Slot::Single).unwrap().bakes, bakes + 1);
    }

    #[test]
    fn returning_to_neutral_restores_baseline() {
        let mut session = Session::new(Rasterizer::new(None), LayoutKind::IdCard);
        session.load_source(Slot::Single, png_source(20, 20)).unwrap();
        let original = session.processed(Slot::Single).unwrap().clone();
        session
            .set_adjustments(Slot::Single, AdjustmentParams::new(150, 50).unwrap())
            .unwrap();
        session
            .set_adjustments(Slot::Single, AdjustmentParams::default())
            .unwrap();
        assert_eq!(session.processed(Slot::Single).unwrap(), &original);
    }

    #[test]
    fn wrong_then_right_password() {
        let mut session = locked_pdf_session();
        let outcome = session.load_source(Slot::Single, pdf_source()).unwrap();
        assert_eq!(
            outcome,
            LoadOutcome::NeedsPassword {
                attempt: 1,
                rejected: false
            }
        );

        let err = session.submit_password("1985").unwrap_err();
        assert!(matches!(
            err,
            PhotosheetError::DocumentLocked(LockReason::PasswordRejected)
        ));
        let pending = session.pending_unlock().unwrap();
        assert_eq!((pending.attempt(), pending.rejected()), (2, true));

        let outcome = session.submit_password("1984").unwrap();
        assert_eq!(outcome, LoadOutcome::Ready { page_count: 2 });
        assert!(session.pending_unlock().is_none());
        let frame = session.frame(Slot::Single).unwrap();
        // Page 1 is 72x96pt rendered at the default scale of 8.
        assert_eq!((frame.native_width(), frame.native_height()), (576, 768));

        // The unlocked password is remembered for paging.
        session.select_page(Slot::Single, 2).unwrap();
        assert_eq!(session.status(Slot::Single).unwrap().page_number, 2);
        assert!(session.select_page(Slot::Single, 3).is_err());
    }

    #[test]
    fn cancelled_unlock_keeps_previous_content() {
        let mut session = locked_pdf_session();
        session.load_source(Slot::Single, png_source(30, 30)).unwrap();
        session.load_source(Slot::Single, pdf_source()).unwrap();
        session.cancel_unlock().unwrap();

        assert!(session.pending_unlock().is_none());
        assert_eq!(
            session.processed(Slot::Single).unwrap().dimensions(),
            (30, 30)
        );
        assert!(matches!(session.cancel_unlock(), Err(PhotosheetError::NoSource)));
    }

    #[test]
    fn compose_fails_closed_on_missing_back() {
        let mut session = Session::new(Rasterizer::new(None), LayoutKind::DualSidedId);
        session.load_source(Slot::Front, png_source(40, 25)).unwrap();
        let err = session.compose_sheet(opts()).unwrap_err();
        assert!(matches!(err, PhotosheetError::MissingContent(Slot::Back)));

        session.load_source(Slot::Back, png_source(40, 25)).unwrap();
        let payload = session.print_sheet(&SheetWriter::new(), opts()).unwrap();
        assert_eq!(payload.page_size, "4in 6in");
    }

    #[tokio::test]
    async fn background_applies_and_survives_rebake() {
        let mut session = Session::new(Rasterizer::new(None), LayoutKind::IdCard);
        session.load_source(Slot::Single, png_source(40, 20)).unwrap();

        let applied = session
            .replace_background(Slot::Single, Rgb::PASSPORT_BLUE, &LeftHalfBackground)
            .await
            .unwrap();
        assert_eq!(applied, Applied::Applied);
        let blue = Rgba([191, 215, 234, 255]);
        assert_eq!(session.processed(Slot::Single).unwrap().get_pixel(3, 3), &blue);

        session
            .set_adjustments(Slot::Single, AdjustmentParams::new(60, 100).unwrap())
            .unwrap();
        let img = session.processed(Slot::Single).unwrap();
        assert_eq!(img.get_pixel(3, 3), &blue);
        assert_ne!(img.get_pixel(35, 3), &blue);
        assert!(session.status(Slot::Single).unwrap().has_background);
    }

    #[tokio::test]
    async fn stale_background_result_is_discarded() {
        let mut session = Session::new(Rasterizer::new(None), LayoutKind::IdCard);
        session.load_source(Slot::Single, png_source(40, 20)).unwrap();
        let before = session.processed(Slot::Single).unwrap().clone();

        let ticket = session.begin_background(Slot::Single, Rgb::WHITE).unwrap();
        // The user keeps editing while the request is in flight.
        session
            .set_adjustments(Slot::Single, AdjustmentParams::new(120, 100).unwrap())
            .unwrap();
        let result = ticket.run(&LeftHalfBackground).await.unwrap();

        assert_eq!(session.finish_background(result).unwrap(), Applied::Discarded);
        assert!(!session.status(Slot::Single).unwrap().has_background);
        let now = session.processed(Slot::Single).unwrap();
        assert_eq!(now, &bake(&before, AdjustmentParams::new(120, 100).unwrap()));
    }

    #[test]
    fn new_baseline_drops_background() {
        let mut session = Session::new(Rasterizer::new(None), LayoutKind::IdCard);
        session.load_source(Slot::Single, png_source(40, 20)).unwrap();
        let ticket = session.begin_background(Slot::Single, Rgb::WHITE).unwrap();
        let result = BackgroundResult {
            slot: ticket.slot,
            generation: ticket.generation,
            backdrop: ticket.backdrop,
            matte: Matte::extract(&RgbaImage::new(40, 20)),
        };
        session.finish_background(result).unwrap();
        assert!(session.status(Slot::Single).unwrap().has_background);

        session
            .apply_crop(Slot::Single, CropRegion::new(0.0, 0.0, 20.0, 20.0))
            .unwrap();
        assert!(!session.status(Slot::Single).unwrap().has_background);
    }

    #[test]
    fn switching_layout_kind_discards_content() {
        let mut session = Session::new(Rasterizer::new(None), LayoutKind::IdCard);
        session.load_source(Slot::Single, png_source(40, 20)).unwrap();
        let ticket = session.begin_background(Slot::Single, Rgb::WHITE).unwrap();

        session.set_layout(LayoutKind::PassportGrid);
        assert!(matches!(
            session.processed(Slot::Single),
            Err(PhotosheetError::MissingContent(Slot::Single))
        ));
        assert!(matches!(
            session.compose_sheet(opts()),
            Err(PhotosheetError::MissingContent(Slot::Single))
        ));

        // A segmentation started under the old layout must not land.
        let result = BackgroundResult {
            slot: ticket.slot,
            generation: ticket.generation,
            backdrop: ticket.backdrop,
            matte: Matte::extract(&RgbaImage::new(40, 20)),
        };
        assert_eq!(session.finish_background(result).unwrap(), Applied::Discarded);
        assert!(!session.status(Slot::Single).unwrap().has_background);
    }

    #[test]
    fn changing_count_within_a_kind_keeps_content() {
        let mut session = Session::new(
            Rasterizer::new(None),
            LayoutKind::SmallGrid {
                count: SmallGridCount::NINE,
            },
        );
        session.load_source(Slot::Single, png_source(40, 20)).unwrap();
        session.set_layout(LayoutKind::SmallGrid {
            count: SmallGridCount::THREE,
        });
        assert_eq!(
            session.processed(Slot::Single).unwrap().dimensions(),
            (40, 20)
        );
        assert_eq!(session.compose_sheet(opts()).unwrap().tiles().len(), 3);
    }

    #[test]
    fn switching_layout_kind_drops_pending_unlock() {
        let mut session = locked_pdf_session();
        let outcome = session.load_source(Slot::Single, pdf_source()).unwrap();
        assert!(matches!(outcome, LoadOutcome::NeedsPassword { .. }));
        assert!(session.pending_unlock().is_some());

        session.set_layout(LayoutKind::IdCard);
        assert!(session.pending_unlock().is_none());
        assert!(matches!(
            session.submit_password("1984"),
            Err(PhotosheetError::NoSource)
        ));
    }

    #[test]
    fn multi_page_composes_one_image_per_tile() {
        let mut session = Session::new(
            Rasterizer::new(None),
            LayoutKind::MultiPage {
                paper: PaperSize::A4,
                count: 2,
            },
        );
        session.load_source(Slot::Item(0), png_source(30, 40)).unwrap();
        assert!(matches!(
            session.compose_sheet(opts()),
            Err(PhotosheetError::MissingContent(Slot::Item(1)))
        ));

        session.load_source(Slot::Item(1), png_source(40, 30)).unwrap();
        let sheet = session.compose_sheet(opts()).unwrap();
        assert_eq!(sheet.tiles().len(), 2);
        assert!(sheet.is_complete());
        assert_eq!(sheet.tiles()[1].placement.slot, Slot::Item(1));
    }
}
