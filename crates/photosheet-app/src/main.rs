// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Photosheet — photo and ID-document print layouts
//
// Entry point. Initialises logging and services, then runs one pipeline
// session per invocation: load -> unlock -> crop -> adjust -> background ->
// compose -> write.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use photosheet_app::{AppServices, Applied, LoadOutcome, Session};
use photosheet_core::error::LockReason;
use photosheet_core::human_errors::humanize_error;
use photosheet_core::types::{AdjustmentParams, CropRegion, PaperSize, Rgb, Slot};
use photosheet_core::PhotosheetError;
use photosheet_document::SourceDocument;
use photosheet_layout::{LayoutKind, placements, resolve_tiling};

#[derive(Parser)]
#[command(
    name = "photosheet",
    about = "Lay out photos and ID documents on exact-size print sheets",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a print sheet from a photo or PDF page
    Compose {
        /// Photo or PDF (front side for dual-sided layouts; one per tile for
        /// multi)
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        /// Back side, for dual-sided layouts
        #[arg(long)]
        back: Option<PathBuf>,

        /// Output file (.pdf, .png, or .html)
        #[arg(short, long)]
        output: PathBuf,

        /// Layout: 4x6[:3|9|12], a4, pvc, passport, aadhar, multi[:N], custom:WxH[in|mm]:N
        #[arg(short, long, default_value = "4x6")]
        layout: String,

        /// Paper for full-page and custom layouts (a4, letter, 4x6, ...)
        #[arg(long)]
        paper: Option<String>,

        /// PDF page to use (1-based)
        #[arg(long, default_value = "1")]
        page: usize,

        /// Password for an encrypted PDF; prompted for when omitted
        #[arg(long)]
        password: Option<String>,

        /// On-screen size the crop is measured against, as WxH
        #[arg(long)]
        display: Option<String>,

        /// Crop rectangle as x,y,w,h in display pixels (first input only)
        #[arg(long)]
        crop: Option<String>,

        /// Crop rectangle for the back side
        #[arg(long)]
        back_crop: Option<String>,

        /// Brightness percent (100 = unchanged)
        #[arg(long, default_value = "100")]
        brightness: u16,

        /// Contrast percent (100 = unchanged)
        #[arg(long, default_value = "100")]
        contrast: u16,

        /// Replace the photo background with this colour (#rrggbb, white, blue)
        #[arg(long)]
        background: Option<String>,

        /// Output resolution; defaults to the configured print DPI
        #[arg(long)]
        dpi: Option<u32>,

        /// Omit the thin cut guide around each tile
        #[arg(long)]
        no_cut_borders: bool,
    },

    /// List the built-in layouts
    Layouts,

    /// Show page count and rendered size of a document
    Info {
        input: PathBuf,

        #[arg(long)]
        password: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Layouts => list_layouts(),
        Commands::Info { input, password } => {
            let services = AppServices::init()?;
            let mut session = services.new_session(LayoutKind::default())?;
            let pages = load(&mut session, Slot::Single, &input, password.as_deref())?;
            let frame = session
                .frame(Slot::Single)
                .context("document produced no frame")?;
            println!("{}", input.display());
            println!("  pages: {pages}");
            println!(
                "  page 1: {} x {} px",
                frame.native_width(),
                frame.native_height()
            );
            Ok(())
        }
        Commands::Compose {
            inputs,
            back,
            output,
            layout,
            paper,
            page,
            password,
            display,
            crop,
            back_crop,
            brightness,
            contrast,
            background,
            dpi,
            no_cut_borders,
        } => {
            let mut kind: LayoutKind = layout.parse()?;
            if let LayoutKind::MultiPage { paper, .. } = kind
                && !layout.contains(':')
            {
                kind = LayoutKind::MultiPage {
                    paper,
                    count: u32::try_from(inputs.len())?,
                };
            }
            if let Some(name) = paper {
                let paper = PaperSize::from_name(&name)
                    .with_context(|| format!("unknown paper size {name:?}"))?;
                kind = kind.with_paper(paper);
            }

            let services = AppServices::init()?;
            let mut session = services.new_session(kind)?;
            let params = AdjustmentParams::new(brightness, contrast)?;
            let display = display.as_deref().map(parse_size).transpose()?;
            let backdrop = background.as_deref().map(Rgb::parse).transpose()?;

            let sides = assign_sides(kind, inputs, back, crop, back_crop)?;
            for (slot, path, region) in sides {
                load(&mut session, slot, &path, password.as_deref())?;
                if page != 1 {
                    session.select_page(slot, page)?;
                }
                if let Some((w, h)) = display {
                    session.set_display_size(slot, w, h)?;
                }
                if let Some(region) = region.as_deref() {
                    session.apply_crop(slot, parse_region(region)?)?;
                }
                session.set_adjustments(slot, params)?;
                if let Some(colour) = backdrop {
                    let service = services.segmentation()?;
                    if session.replace_background(slot, colour, &service).await?
                        == Applied::Discarded
                    {
                        bail!("background for the {slot} side was discarded");
                    }
                }
            }

            let mut options = services.compose_options(!no_cut_borders);
            if let Some(dpi) = dpi {
                options.dpi = dpi;
            }
            let sheet = session.compose_sheet(options)?;
            let mut writer = services.sheet_writer();
            if let Some(stem) = output.file_stem().and_then(|s| s.to_str()) {
                writer.set_title(stem);
            }
            writer.write_file(&sheet, &output)?;
            println!(
                "{} -> {} ({} tiles, {})",
                kind.name(),
                output.display(),
                sheet.tiles().len(),
                sheet.physical_size()
            );
            Ok(())
        }
    }
}

/// Load a file into `slot`, asking on the terminal for a password when the
/// document is locked and none was given.
fn load(session: &mut Session, slot: Slot, path: &Path, password: Option<&str>) -> Result<usize> {
    let mut source = SourceDocument::open(path)?;
    if let Some(password) = password {
        source = source.with_password(password);
    }

    let mut outcome = session.load_source(slot, source)?;
    loop {
        match outcome {
            LoadOutcome::Ready { page_count } => return Ok(page_count),
            LoadOutcome::NeedsPassword { attempt, rejected } => {
                let Some(entered) = prompt_password(path, attempt, rejected)? else {
                    session.cancel_unlock()?;
                    return Err(PhotosheetError::DocumentLocked(LockReason::Cancelled).into());
                };
                outcome = match session.submit_password(&entered) {
                    Ok(outcome) => outcome,
                    Err(PhotosheetError::DocumentLocked(LockReason::PasswordRejected)) => {
                        match session.pending_unlock() {
                            Some(pending) => LoadOutcome::NeedsPassword {
                                attempt: pending.attempt(),
                                rejected: true,
                            },
                            None => {
                                return Err(PhotosheetError::DocumentLocked(
                                    LockReason::PasswordRejected,
                                )
                                .into());
                            }
                        }
                    }
                    Err(err) => return Err(err.into()),
                };
            }
        }
    }
}

/// Read a password from stdin. An empty line cancels.
fn prompt_password(path: &Path, attempt: u32, rejected: bool) -> Result<Option<String>> {
    let mut stderr = std::io::stderr();
    if rejected {
        writeln!(stderr, "That password did not work.")?;
    }
    write!(
        stderr,
        "Password for {} (attempt {attempt}, empty to cancel): ",
        path.display()
    )?;
    stderr.flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let entered = line.trim_end_matches(['\r', '\n']);
    Ok((!entered.is_empty()).then(|| entered.to_owned()))
}

/// One input file bound to the slot it fills, with its optional crop.
type Side = (Slot, PathBuf, Option<String>);

/// Match the command-line inputs to the slots `kind` needs.
fn assign_sides(
    kind: LayoutKind,
    inputs: Vec<PathBuf>,
    back: Option<PathBuf>,
    crop: Option<String>,
    back_crop: Option<String>,
) -> Result<Vec<Side>> {
    let slots = kind.slots();
    if let LayoutKind::MultiPage { count, .. } = kind {
        if back.is_some() {
            bail!("layout {} has no back side", kind.name());
        }
        if inputs.len() != slots.len() {
            bail!(
                "layout {}:{count} needs {} images, got {}",
                kind.name(),
                slots.len(),
                inputs.len()
            );
        }
        let crops = std::iter::once(crop).chain(std::iter::repeat(None));
        return Ok(slots
            .into_iter()
            .zip(inputs)
            .zip(crops)
            .map(|((slot, path), region)| (slot, path, region))
            .collect());
    }

    let [input] = <[PathBuf; 1]>::try_from(inputs).map_err(|extra| {
        anyhow::anyhow!("layout {} takes one input, got {}", kind.name(), extra.len())
    })?;
    let mut sides = vec![(slots[0], input, crop)];
    match (slots.as_slice(), back) {
        ([_, back_slot], Some(path)) => sides.push((*back_slot, path, back_crop)),
        ([_, _], None) => {
            bail!("layout {} needs a back side (--back)", kind.name())
        }
        (_, Some(_)) => bail!("layout {} has no back side", kind.name()),
        (_, None) => {}
    }
    Ok(sides)
}

fn list_layouts() -> Result<()> {
    for name in ["4x6:3", "4x6:9", "4x6:12", "a4", "pvc", "passport", "aadhar", "multi"] {
        let kind: LayoutKind = name.parse()?;
        let spec = resolve_tiling(kind)?;
        let fitted = placements(&spec).len();
        println!(
            "{name:<8} sheet {:<14} tile {:<16} x{:<3} {:?}{}",
            spec.sheet.to_string(),
            spec.tile.to_string(),
            spec.count,
            spec.arrangement,
            if fitted < spec.count as usize {
                format!(" (only {fitted} fit)")
            } else {
                String::new()
            }
        );
    }
    Ok(())
}

/// Parse `WxH`.
fn parse_size(text: &str) -> Result<(u32, u32)> {
    let (w, h) = text
        .split_once(['x', 'X'])
        .with_context(|| format!("expected WxH, got {text:?}"))?;
    Ok((w.trim().parse()?, h.trim().parse()?))
}

/// Parse `x,y,w,h`.
fn parse_region(text: &str) -> Result<CropRegion> {
    let values = text
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("invalid crop {text:?}"))?;
    let &[x, y, w, h] = values.as_slice() else {
        bail!("crop needs four values x,y,w,h, got {text:?}");
    };
    Ok(CropRegion::new(x, y, w, h))
}

fn report(err: &anyhow::Error) {
    match err.downcast_ref::<PhotosheetError>() {
        Some(domain) => {
            let human = humanize_error(domain);
            eprintln!("{}", human.message);
            eprintln!("  {}", human.suggestion);
            tracing::debug!(error = %domain, severity = ?human.severity, "command failed");
        }
        None => eprintln!("error: {err:#}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_display_size() {
        assert_eq!(parse_size("600x800").unwrap(), (600, 800));
        assert_eq!(parse_size("600X800").unwrap(), (600, 800));
        assert!(parse_size("600").is_err());
    }

    #[test]
    fn parses_crop_region() {
        let region = parse_region("20, 20, 120, 160").unwrap();
        assert_eq!(region, CropRegion::new(20.0, 20.0, 120.0, 160.0));
        assert!(parse_region("1,2,3").is_err());
        assert!(parse_region("a,b,c,d").is_err());
    }

    #[test]
    fn inputs_are_assigned_to_slots() {
        let paths = |names: &[&str]| names.iter().map(PathBuf::from).collect::<Vec<_>>();

        let multi = LayoutKind::MultiPage {
            paper: PaperSize::A4,
            count: 3,
        };
        let crop = Some("0,0,1,1".to_owned());
        let sides = assign_sides(multi, paths(&["a.png", "b.png", "c.pdf"]), None, crop, None).unwrap();
        let slots: Vec<Slot> = sides.iter().map(|(slot, _, _)| *slot).collect();
        assert_eq!(slots, vec![Slot::Item(0), Slot::Item(1), Slot::Item(2)]);
        assert_eq!(sides[2].1, PathBuf::from("c.pdf"));
        assert!(sides[0].2.is_some() && sides[1].2.is_none());
        assert!(assign_sides(multi, paths(&["a.png"]), None, None, None).is_err());

        let back = || Some(PathBuf::from("b.png"));
        let dual = LayoutKind::DualSidedId;
        let sides = assign_sides(dual, paths(&["f.png"]), back(), None, None).unwrap();
        assert_eq!((sides[0].0, sides[1].0), (Slot::Front, Slot::Back));
        assert!(assign_sides(dual, paths(&["f.png"]), None, None, None).is_err());

        let card = LayoutKind::IdCard;
        assert!(assign_sides(card, paths(&["a.png", "b.png"]), None, None, None).is_err());
        assert!(assign_sides(card, paths(&["a.png"]), back(), None, None).is_err());
    }

    #[test]
    fn built_in_layouts_list() {
        list_layouts().unwrap();
    }

    #[test]
    fn photo_on_disk_to_sheet_file() {
        use image::{Rgba, RgbaImage};
        use photosheet_document::Rasterizer;
        use photosheet_print::{ComposeOptions, SheetWriter};

        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("photo.png");
        RgbaImage::from_pixel(30, 40, Rgba([10, 20, 30, 255]))
            .save(&photo)
            .unwrap();

        let mut session = Session::new(Rasterizer::new(None), LayoutKind::PassportGrid);
        assert_eq!(load(&mut session, Slot::Single, &photo, None).unwrap(), 1);

        let sheet = session
            .compose_sheet(ComposeOptions {
                dpi: 24,
                cut_borders: false,
            })
            .unwrap();
        let out = dir.path().join("sheet.pdf");
        SheetWriter::new().write_file(&sheet, &out).unwrap();
        assert!(std::fs::read(&out).unwrap().starts_with(b"%PDF"));
    }
}
