//! Frame sources.
//!
//! - Camera: local V4L2 device (feature: ingest-v4l2) or `stub://` synthetic
//! - Image directory: PNG/JPEG stills replayed in name order
//!
//! Every source yields RGB `Frame`s. `Ok(None)` means the stream ended;
//! an `Err` is a read failure. The session treats both as the end of the run.

pub mod camera;
pub mod images;
mod normalize;

use anyhow::Result;

use crate::frame::Frame;

pub use camera::{CameraConfig, CameraSource, CameraStats};
pub use images::ImageDirSource;
pub use normalize::{normalize_to_rgb, PixelFormat};

/// Something that produces frames for the session loop.
pub trait FrameSource {
    /// Short description for logs (device path, directory, ...).
    fn describe(&self) -> String;

    /// Blocking read of the next frame.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}
