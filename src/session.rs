//! The capture -> detect -> annotate -> display loop.
//!
//! Single-threaded and blocking. The only shared state is the stop flag, which
//! the operator (Ctrl-C handler) sets from another thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Result;
use image::RgbImage;

use crate::annotate::Annotator;
use crate::detect::{Detection, DetectorAdapter, DetectorBackend};
use crate::display::FrameDisplay;
use crate::frame::Frame;
use crate::ingest::FrameSource;
use crate::ppe::{EquipmentStatus, Warning, WarningPolicy};

/// Notice shown when the camera stops delivering frames.
pub const CAMERA_LOST_NOTICE: &str = "Camera not detected";

/// Session-relative time source for the warning policy.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Wall-clock time since the clock was created.
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Everything produced for one frame.
pub struct FrameReport {
    pub sequence: u64,
    pub detections: Vec<Detection>,
    pub status: EquipmentStatus,
    pub warning: Option<Warning>,
    /// Source frame with boxes, labels and warning drawn in.
    pub image: RgbImage,
}

impl FrameReport {
    pub fn warning_text(&self) -> Option<String> {
        self.warning.as_ref().map(Warning::message)
    }
}

/// Why a session loop stopped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EndReason {
    /// The operator set the stop flag.
    Stopped,
    /// The configured frame limit was reached.
    FrameLimit,
    /// The source ran out of frames.
    EndOfStream,
    /// The source failed to deliver a frame.
    CameraLost(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSummary {
    pub frames_processed: u64,
    pub warnings_emitted: u64,
    pub end_reason: EndReason,
}

pub struct Session<B: DetectorBackend, C: Clock> {
    detector: DetectorAdapter<B>,
    policy: WarningPolicy,
    annotator: Annotator,
    clock: C,
    max_frames: Option<u64>,
}

impl<B: DetectorBackend, C: Clock> Session<B, C> {
    pub fn new(detector: DetectorAdapter<B>, clock: C) -> Self {
        Self {
            detector,
            policy: WarningPolicy::new(),
            annotator: Annotator::default(),
            clock,
            max_frames: None,
        }
    }

    /// Stop after this many processed frames.
    pub fn with_max_frames(mut self, max_frames: Option<u64>) -> Self {
        self.max_frames = max_frames;
        self
    }

    pub fn with_annotator(mut self, annotator: Annotator) -> Self {
        self.annotator = annotator;
        self
    }

    pub fn policy(&self) -> &WarningPolicy {
        &self.policy
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Run one frame through detection, status, warning policy and annotation.
    ///
    /// Detector errors propagate; the frame is not annotated or displayed.
    pub fn process_frame(&mut self, mut frame: Frame) -> Result<FrameReport> {
        let detections = self.detector.detect(&frame)?;
        let status = EquipmentStatus::from_detections(&detections);
        let warning = self.policy.evaluate(&detections, self.clock.now());
        let text = warning.as_ref().map(Warning::message);
        self.annotator
            .annotate(frame.image_mut(), &detections, text.as_deref());

        Ok(FrameReport {
            sequence: frame.sequence,
            detections,
            status,
            warning,
            image: frame.into_image(),
        })
    }

    /// Loop until stopped, out of frames, the frame limit, or a camera failure.
    pub fn run<S, D>(
        &mut self,
        source: &mut S,
        display: &mut D,
        stop: &AtomicBool,
    ) -> Result<SessionSummary>
    where
        S: FrameSource + ?Sized,
        D: FrameDisplay + ?Sized,
    {
        let mut frames_processed = 0u64;
        let mut warnings_emitted = 0u64;

        log::info!(
            "session: reading from {} with detector {}",
            source.describe(),
            self.detector.backend_name()
        );

        let end_reason = loop {
            if stop.load(Ordering::SeqCst) {
                break EndReason::Stopped;
            }
            if self.max_frames.is_some_and(|max| frames_processed >= max) {
                break EndReason::FrameLimit;
            }

            let frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break EndReason::EndOfStream,
                Err(err) => {
                    log::warn!("session: frame read failed: {:#}", err);
                    display.notice(CAMERA_LOST_NOTICE);
                    break EndReason::CameraLost(format!("{:#}", err));
                }
            };

            let report = self.process_frame(frame)?;
            frames_processed += 1;
            let warning = report.warning_text();
            if warning.is_some() {
                warnings_emitted += 1;
            }
            display.render(
                &report.image,
                &report.status.to_markdown(),
                warning.as_deref(),
            )?;
        };

        log::info!(
            "session: ended ({:?}) after {} frames, {} warnings",
            end_reason,
            frames_processed,
            warnings_emitted
        );

        Ok(SessionSummary {
            frames_processed,
            warnings_emitted,
            end_reason,
        })
    }
}
