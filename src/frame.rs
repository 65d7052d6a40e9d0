//! Captured frames.
//!
//! - `Frame`: owned RGB image plus capture metadata. Produced by a `FrameSource`,
//!   annotated in place by the session and handed to the display.
//! - `InferenceView`: the frame resized to the fixed detector resolution.

use anyhow::{anyhow, Result};
use image::imageops::{self, FilterType};
use image::RgbImage;

/// Width every frame is resized to before detection.
pub const INFERENCE_WIDTH: u32 = 640;

/// Height every frame is resized to before detection.
pub const INFERENCE_HEIGHT: u32 = 480;

// ----------------------------------------------------------------------------
// Frame: captured RGB image
// ----------------------------------------------------------------------------

/// One captured RGB frame.
///
/// Pixel data is tightly packed RGB24. The session draws detection boxes and
/// warning text directly into `image`.
pub struct Frame {
    image: RgbImage,

    /// Monotonic sequence number assigned by the source (starts at 1).
    pub sequence: u64,
}

impl Frame {
    pub fn new(image: RgbImage, sequence: u64) -> Self {
        Self { image, sequence }
    }

    /// Build a frame from packed RGB24 bytes.
    pub fn from_rgb(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{}, received {}",
                expected,
                width,
                height,
                pixels.len()
            ));
        }
        let image = RgbImage::from_raw(width, height, pixels)
            .ok_or_else(|| anyhow!("failed to wrap {}x{} RGB buffer", width, height))?;
        Ok(Self::new(image, sequence))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbImage {
        &mut self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Resize to the detector resolution. The source frame is untouched.
    pub fn inference_view(&self) -> InferenceView {
        let image = if self.width() == INFERENCE_WIDTH && self.height() == INFERENCE_HEIGHT {
            self.image.clone()
        } else {
            imageops::resize(
                &self.image,
                INFERENCE_WIDTH,
                INFERENCE_HEIGHT,
                FilterType::Triangle,
            )
        };
        InferenceView {
            image,
            source_width: self.width(),
            source_height: self.height(),
        }
    }
}

// ----------------------------------------------------------------------------
// InferenceView: detector-sized copy
// ----------------------------------------------------------------------------

/// Frame resized to `INFERENCE_WIDTH` x `INFERENCE_HEIGHT`.
///
/// Keeps the source dimensions so boxes can be mapped back when requested.
pub struct InferenceView {
    image: RgbImage,
    source_width: u32,
    source_height: u32,
}

impl InferenceView {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn source_size(&self) -> (u32, u32) {
        (self.source_width, self.source_height)
    }

    /// True when the source frame had a different size than the detector input.
    pub fn was_resized(&self) -> bool {
        self.source_width != self.width() || self.source_height != self.height()
    }

    /// Packed RGB24 pixels for the detector backend.
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
