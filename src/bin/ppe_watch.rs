//! ppe_watch - live PPE detection with missing-equipment warnings
//!
//! This binary:
//! 1. Reads frames from a camera (or a directory of stills)
//! 2. Resizes each frame to 640x480 and runs the PPE detector
//! 3. Draws detections and reports Hardhat / Mask / Safety Vest status
//! 4. Warns about missing equipment at most once per 20s per item
//!
//! Press Ctrl-C to stop the session.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ppe_watch::ui::{Ui, UiMode};
use ppe_watch::{
    CameraSource, ConsoleDisplay, DetectorAdapter, DetectorBackend, EndReason, FrameDisplay,
    FrameSource, ImageDirSource, MonotonicClock, PpeConfig, ScriptedBackend, Session,
    SnapshotDisplay,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Camera device path, or stub://<name> for synthetic frames.
    #[arg(long)]
    device: Option<String>,
    /// Replay PNG/JPEG stills from this directory instead of a camera.
    #[arg(long, conflicts_with = "device")]
    images: Option<PathBuf>,
    /// ONNX model path (requires the backend-tract feature).
    #[arg(long)]
    model: Option<PathBuf>,
    /// JSON detection script to replay instead of running a model.
    #[arg(long, conflicts_with = "model")]
    script: Option<PathBuf>,
    /// Write the latest annotated frame to this JPEG path.
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// Map boxes from 640x480 inference space back to the camera resolution.
    #[arg(long)]
    rescale_boxes: bool,
    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<u64>,
    /// Progress output style.
    #[arg(long, value_enum, default_value_t = UiMode::Auto, env = "PPE_UI")]
    ui: UiMode,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let ui = Ui::for_stderr(args.ui);

    let mut cfg = PpeConfig::load()?;
    if let Some(device) = args.device.clone() {
        cfg.camera.device = device;
    }
    if let Some(model) = args.model.clone() {
        cfg.model.path = Some(model);
    }
    if let Some(snapshot) = args.snapshot.clone() {
        cfg.snapshot_path = Some(snapshot);
    }
    if args.rescale_boxes {
        cfg.rescale_boxes = true;
    }
    cfg.validate()?;

    let backend = {
        let _stage = ui.stage("load detector");
        build_backend(&args, &cfg)?
    };
    let mut detector = DetectorAdapter::new(backend).with_rescale(cfg.rescale_boxes);
    {
        let _stage = ui.stage("warm up detector");
        detector.warm_up()?;
    }

    let mut source: Box<dyn FrameSource> = {
        let _stage = ui.stage("open frame source");
        match &args.images {
            Some(dir) => Box::new(ImageDirSource::new(dir)?),
            None => {
                let mut camera = CameraSource::new(cfg.camera.clone())?;
                camera.connect()?;
                Box::new(camera)
            }
        }
    };

    let mut display: Box<dyn FrameDisplay> = match &cfg.snapshot_path {
        Some(path) => {
            log::info!("writing snapshots to {}", path.display());
            Box::new(SnapshotDisplay::new(path))
        }
        None => Box::new(ConsoleDisplay::new()),
    };

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))
            .context("install Ctrl-C handler")?;
    }

    let mut session =
        Session::new(detector, MonotonicClock::new()).with_max_frames(args.max_frames);
    let summary = session.run(source.as_mut(), display.as_mut(), &stop)?;

    println!("session summary:");
    println!("  frames processed: {}", summary.frames_processed);
    println!("  warnings emitted: {}", summary.warnings_emitted);
    match &summary.end_reason {
        EndReason::CameraLost(err) => println!("  ended: camera lost ({})", err),
        other => println!("  ended: {:?}", other),
    }
    Ok(())
}

fn build_backend(args: &Args, cfg: &PpeConfig) -> Result<Box<dyn DetectorBackend>> {
    if let Some(script) = &args.script {
        return Ok(Box::new(ScriptedBackend::from_json_file(script)?));
    }
    let model_path = cfg.model.path.clone().ok_or_else(|| {
        anyhow!("no model configured: pass --model, set PPE_MODEL_PATH, or use --script")
    })?;
    load_model(model_path, cfg)
}

#[cfg(feature = "backend-tract")]
fn load_model(model_path: PathBuf, cfg: &PpeConfig) -> Result<Box<dyn DetectorBackend>> {
    use ppe_watch::{TractBackend, INFERENCE_HEIGHT, INFERENCE_WIDTH};

    let backend = TractBackend::new(
        &model_path,
        cfg.model.labels.clone(),
        INFERENCE_WIDTH,
        INFERENCE_HEIGHT,
    )?
    .with_threshold(cfg.model.confidence_threshold)
    .with_iou_threshold(cfg.model.iou_threshold);
    log::info!("loaded model {}", model_path.display());
    Ok(Box::new(backend))
}

#[cfg(not(feature = "backend-tract"))]
fn load_model(model_path: PathBuf, _cfg: &PpeConfig) -> Result<Box<dyn DetectorBackend>> {
    Err(anyhow!(
        "model {} needs the backend-tract feature",
        model_path.display()
    ))
}
