use anyhow::{Context, Result};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;
use crate::frame::Frame;

/// Resizes frames to the detector resolution and runs the backend.
///
/// Boxes come back in inference space (640x480). With `rescale_boxes` off they
/// are returned as-is and will be drawn unscaled onto the source frame, which
/// is only exact when the camera already delivers 640x480.
pub struct DetectorAdapter<B: DetectorBackend> {
    backend: B,
    rescale_boxes: bool,
    warned_unscaled: bool,
}

impl<B: DetectorBackend> DetectorAdapter<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            rescale_boxes: false,
            warned_unscaled: false,
        }
    }

    /// Map boxes back to the source frame size before returning them.
    pub fn with_rescale(mut self, rescale_boxes: bool) -> Self {
        self.rescale_boxes = rescale_boxes;
        self
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn warm_up(&mut self) -> Result<()> {
        self.backend
            .warm_up()
            .with_context(|| format!("warm up detector backend {}", self.backend.name()))
    }

    pub fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        let view = frame.inference_view();
        let mut detections = self
            .backend
            .detect(view.pixels(), view.width(), view.height())
            .with_context(|| {
                format!(
                    "detector backend {} failed on frame {}",
                    self.backend.name(),
                    frame.sequence
                )
            })?;

        if view.was_resized() {
            if self.rescale_boxes {
                let from = (view.width(), view.height());
                let to = view.source_size();
                for detection in &mut detections {
                    detection.bbox = detection.bbox.rescale(from, to);
                }
            } else if !self.warned_unscaled {
                let (w, h) = view.source_size();
                log::warn!(
                    "detector: source frames are {}x{} but boxes are in {}x{} inference space; \
                     drawing unscaled (enable rescale_boxes to map them back)",
                    w,
                    h,
                    view.width(),
                    view.height()
                );
                self.warned_unscaled = true;
            }
        }

        Ok(detections)
    }
}
