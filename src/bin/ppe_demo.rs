//! ppe_demo - end-to-end synthetic run of the PPE warning pipeline
//!
//! Uses the stub camera and a scripted detector, with simulated time advancing
//! a fixed step per frame, so the warning cooldown can be watched without a
//! camera or a model.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::cell::Cell;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use ppe_watch::{
    BoundingBox, CameraConfig, CameraSource, Clock, Detection, DetectorAdapter, ScriptedBackend,
    Session, SnapshotDisplay,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Number of synthetic frames.
    #[arg(long, default_value_t = 60)]
    frames: u64,
    /// Simulated seconds between frames.
    #[arg(long, default_value_t = 1.0)]
    step: f64,
    /// Output directory for the snapshot and status files.
    #[arg(long, default_value = "demo_out")]
    out: String,
}

/// Advances by `step` every time it is read.
struct SteppingClock {
    step: Duration,
    ticks: Cell<u32>,
}

impl Clock for SteppingClock {
    fn now(&self) -> Duration {
        let tick = self.ticks.get();
        self.ticks.set(tick.saturating_add(1));
        self.step.checked_mul(tick).unwrap_or(Duration::MAX)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.frames == 0 {
        return Err(anyhow!("frames must be >= 1"));
    }
    let step = parse_step(args.step)?;

    let out_dir = PathBuf::from(&args.out);
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    stage("open synthetic camera");
    let mut source = CameraSource::new(CameraConfig {
        device: "stub://demo".to_string(),
        target_fps: 10,
        width: 640,
        height: 480,
    })?;
    source.connect()?;

    stage("run session");
    let clock = SteppingClock {
        step,
        ticks: Cell::new(0),
    };
    let detector = DetectorAdapter::new(ScriptedBackend::new(demo_script()));
    let mut session = Session::new(detector, clock).with_max_frames(Some(args.frames));
    let mut display = SnapshotDisplay::new(out_dir.join("latest.jpg"));
    let stop = AtomicBool::new(false);
    let summary = session.run(&mut source, &mut display, &stop)?;

    println!("demo summary:");
    println!("  frames processed: {}", summary.frames_processed);
    println!("  warnings emitted: {}", summary.warnings_emitted);
    println!("  snapshot: {}", display.image_path().display());
    println!("  status: {}", display.status_path().display());
    Ok(())
}

/// Longest simulated gap between frames.
const MAX_STEP_SECS: f64 = 3600.0;

fn parse_step(secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(anyhow!("step must be a non-negative number of seconds"));
    }
    if secs > MAX_STEP_SECS {
        return Err(anyhow!("step must be at most {} seconds", MAX_STEP_SECS));
    }
    Ok(Duration::from_secs_f64(secs))
}

fn stage(msg: &str) {
    eprintln!("demo: {}", msg);
}

/// A worker with a hardhat but no mask, who later also loses the vest.
fn demo_script() -> Vec<Vec<Detection>> {
    let person = BoundingBox::new(220, 80, 420, 460);
    let head = BoundingBox::new(270, 80, 370, 150);
    let face = BoundingBox::new(285, 150, 355, 200);
    let torso = BoundingBox::new(240, 210, 400, 360);

    let mut script = Vec::new();
    for _ in 0..10 {
        script.push(vec![
            Detection::new("Person", person, 0.92),
            Detection::new("Hardhat", head, 0.88),
            Detection::new("NO-Mask", face, 0.71),
            Detection::new("Safety Vest", torso, 0.83),
        ]);
    }
    for _ in 0..10 {
        script.push(vec![
            Detection::new("Person", person, 0.90),
            Detection::new("Hardhat", head, 0.86),
            Detection::new("NO-Mask", face, 0.69),
            Detection::new("NO-Safety Vest", torso, 0.77),
        ]);
    }
    script
}
