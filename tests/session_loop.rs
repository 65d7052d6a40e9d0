use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{anyhow, Result};
use image::RgbImage;

use ppe_watch::{
    BoundingBox, CameraConfig, CameraSource, Clock, Detection, DetectorAdapter, DetectorBackend,
    EndReason, Frame, FrameDisplay, FrameSource, ScriptedBackend, Session, CAMERA_LOST_NOTICE,
};

/// Test clock shared with the test body so time can be moved between frames.
#[derive(Clone)]
struct ManualClock(Rc<Cell<Duration>>);

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.0.get()
    }
}

/// Yields `frames` blank frames, then fails like an unplugged camera.
struct FlakyCamera {
    frames: u64,
    served: u64,
    clock: Option<(ManualClock, Duration)>,
}

impl FrameSource for FlakyCamera {
    fn describe(&self) -> String {
        "flaky camera".to_string()
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.served >= self.frames {
            return Err(anyhow!("device disconnected"));
        }
        if let Some((clock, step)) = &self.clock {
            if self.served > 0 {
                clock.0.set(clock.0.get() + *step);
            }
        }
        self.served += 1;
        let frame = Frame::from_rgb(vec![0u8; 640 * 480 * 3], 640, 480, self.served)?;
        Ok(Some(frame))
    }
}

struct EmptySource;

impl FrameSource for EmptySource {
    fn describe(&self) -> String {
        "empty".to_string()
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        Ok(None)
    }
}

struct BrokenModel;

impl DetectorBackend for BrokenModel {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn detect(&mut self, _pixels: &[u8], _width: u32, _height: u32) -> Result<Vec<Detection>> {
        Err(anyhow!("inference failed"))
    }
}

#[derive(Default)]
struct RecordingDisplay {
    statuses: Vec<String>,
    warnings: Vec<Option<String>>,
    notices: Vec<String>,
}

impl FrameDisplay for RecordingDisplay {
    fn render(&mut self, _frame: &RgbImage, status: &str, warning: Option<&str>) -> Result<()> {
        self.statuses.push(status.to_string());
        self.warnings.push(warning.map(str::to_string));
        Ok(())
    }

    fn notice(&mut self, text: &str) {
        self.notices.push(text.to_string());
    }
}

fn det(label: &str) -> Detection {
    Detection::new(label, BoundingBox::new(100, 100, 200, 200), 0.8)
}

fn manual_clock() -> ManualClock {
    ManualClock(Rc::new(Cell::new(Duration::ZERO)))
}

#[test]
fn camera_failure_ends_session_with_notice() -> Result<()> {
    let backend = ScriptedBackend::new(vec![vec![det("Hardhat")]]);
    let mut session = Session::new(DetectorAdapter::new(backend), manual_clock());
    let mut camera = FlakyCamera {
        frames: 3,
        served: 0,
        clock: None,
    };
    let mut display = RecordingDisplay::default();
    let stop = AtomicBool::new(false);

    let summary = session.run(&mut camera, &mut display, &stop)?;

    assert_eq!(summary.frames_processed, 3);
    assert!(matches!(
        summary.end_reason,
        EndReason::CameraLost(ref e) if e.contains("disconnected")
    ));
    assert_eq!(display.notices, vec![CAMERA_LOST_NOTICE.to_string()]);
    assert_eq!(display.statuses.len(), 3);
    assert!(display.statuses[0].starts_with("**Hardhat** : Yes"));
    Ok(())
}

#[test]
fn detector_failure_propagates() {
    let mut session = Session::new(DetectorAdapter::new(BrokenModel), manual_clock());
    let mut camera = FlakyCamera {
        frames: 5,
        served: 0,
        clock: None,
    };
    let mut display = RecordingDisplay::default();
    let stop = AtomicBool::new(false);

    let err = session.run(&mut camera, &mut display, &stop).unwrap_err();
    assert!(format!("{err:#}").contains("inference failed"));
    assert!(display.statuses.is_empty());
}

#[test]
fn warnings_respect_cooldown_across_frames() -> Result<()> {
    let clock = manual_clock();
    let backend = ScriptedBackend::new(vec![vec![det("Hardhat"), det("NO-Mask")]]);
    let mut session = Session::new(DetectorAdapter::new(backend), clock.clone());
    // Frames at t = 0, 5, 10, ..., 45.
    let mut camera = FlakyCamera {
        frames: 10,
        served: 0,
        clock: Some((clock, Duration::from_secs(5))),
    };
    let mut display = RecordingDisplay::default();
    let stop = AtomicBool::new(false);

    let summary = session.run(&mut camera, &mut display, &stop)?;

    let fired: Vec<usize> = display
        .warnings
        .iter()
        .enumerate()
        .filter(|(_, w)| w.is_some())
        .map(|(i, _)| i)
        .collect();
    // t=0 fires, t=25 is the first > 20s later, then t=50 would be next.
    assert_eq!(fired, vec![0, 5]);
    assert_eq!(summary.warnings_emitted, 2);
    assert_eq!(
        display.warnings[0].as_deref(),
        Some("WARNING: Risk of respiratory injury. Please wear Mask")
    );
    Ok(())
}

#[test]
fn stop_flag_and_frame_limit_end_the_loop() -> Result<()> {
    let stop = AtomicBool::new(false);
    let mut display = RecordingDisplay::default();

    let mut session = Session::new(
        DetectorAdapter::new(ScriptedBackend::new(vec![])),
        manual_clock(),
    )
    .with_max_frames(Some(4));
    let mut camera = FlakyCamera {
        frames: 100,
        served: 0,
        clock: None,
    };
    let summary = session.run(&mut camera, &mut display, &stop)?;
    assert_eq!(summary.end_reason, EndReason::FrameLimit);
    assert_eq!(summary.frames_processed, 4);

    stop.store(true, Ordering::SeqCst);
    let summary = session.run(&mut camera, &mut display, &stop)?;
    assert_eq!(summary.end_reason, EndReason::Stopped);
    assert_eq!(summary.frames_processed, 0);
    Ok(())
}

#[test]
fn end_of_stream_is_not_a_camera_failure() -> Result<()> {
    let mut session = Session::new(
        DetectorAdapter::new(ScriptedBackend::new(vec![])),
        manual_clock(),
    );
    let mut display = RecordingDisplay::default();
    let summary = session.run(&mut EmptySource, &mut display, &AtomicBool::new(false))?;
    assert_eq!(summary.end_reason, EndReason::EndOfStream);
    assert!(display.notices.is_empty());
    Ok(())
}

#[test]
fn stub_camera_feeds_the_session() -> Result<()> {
    let mut camera = CameraSource::new(CameraConfig {
        device: "stub://integration".to_string(),
        target_fps: 10,
        width: 1280,
        height: 720,
    })?;
    camera.connect()?;

    let backend = ScriptedBackend::new(vec![vec![det("Safety Vest"), det("NO-Hardhat")]]);
    let mut session = Session::new(DetectorAdapter::new(backend), manual_clock());

    let frame = camera.capture()?;
    let report = session.process_frame(frame)?;
    // Annotated image keeps the camera resolution.
    assert_eq!(report.image.dimensions(), (1280, 720));
    assert_eq!(
        report.status.to_markdown(),
        "**Hardhat** : No  \n**Mask** : No  \n**Safety Vest** : Yes  \n"
    );
    assert_eq!(
        report.warning_text().as_deref(),
        Some("WARNING: Risk of head injury. Please wear Hardhat")
    );
    Ok(())
}
