//! Display surfaces.
//!
//! A display receives the annotated RGB frame plus the status markdown every
//! frame, and one-off operator notices (e.g. camera loss).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::RgbImage;

pub trait FrameDisplay {
    /// Show one processed frame. Called once per loop iteration.
    fn render(&mut self, frame: &RgbImage, status: &str, warning: Option<&str>) -> Result<()>;

    /// Show a message outside the per-frame flow.
    fn notice(&mut self, text: &str);
}

/// Logs status changes and warnings. Frames are not shown.
#[derive(Debug, Default)]
pub struct ConsoleDisplay {
    last_status: Option<String>,
    frames: u64,
}

impl ConsoleDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }
}

impl FrameDisplay for ConsoleDisplay {
    fn render(&mut self, _frame: &RgbImage, status: &str, warning: Option<&str>) -> Result<()> {
        self.frames += 1;
        if self.last_status.as_deref() != Some(status) {
            let compact = status
                .lines()
                .map(|line| line.trim().replace("**", ""))
                .collect::<Vec<_>>()
                .join(", ");
            log::info!("status: {}", compact);
            self.last_status = Some(status.to_string());
        }
        if let Some(text) = warning {
            log::warn!("{}", text);
        }
        Ok(())
    }

    fn notice(&mut self, text: &str) {
        log::warn!("notice: {}", text);
    }
}

/// Console output plus the latest frame written to a JPEG file and the status
/// block written next to it as markdown.
pub struct SnapshotDisplay {
    console: ConsoleDisplay,
    image_path: PathBuf,
    status_path: PathBuf,
}

impl SnapshotDisplay {
    pub fn new<P: AsRef<Path>>(image_path: P) -> Self {
        let image_path = image_path.as_ref().to_path_buf();
        let status_path = image_path.with_extension("md");
        Self {
            console: ConsoleDisplay::new(),
            image_path,
            status_path,
        }
    }

    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    pub fn status_path(&self) -> &Path {
        &self.status_path
    }
}

impl FrameDisplay for SnapshotDisplay {
    fn render(&mut self, frame: &RgbImage, status: &str, warning: Option<&str>) -> Result<()> {
        self.console.render(frame, status, warning)?;

        // Write-then-rename so viewers never see a half-written file.
        let tmp = self.image_path.with_extension("tmp.jpg");
        frame
            .save_with_format(&tmp, image::ImageFormat::Jpeg)
            .with_context(|| format!("writing snapshot to {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.image_path)
            .with_context(|| format!("replacing snapshot {}", self.image_path.display()))?;

        let mut text = status.to_string();
        if let Some(warning) = warning {
            text.push('\n');
            text.push_str(warning);
            text.push('\n');
        }
        std::fs::write(&self.status_path, text)
            .with_context(|| format!("writing status to {}", self.status_path.display()))?;
        Ok(())
    }

    fn notice(&mut self, text: &str) {
        self.console.notice(text);
        if let Err(err) = std::fs::write(&self.status_path, format!("{}\n", text)) {
            log::warn!(
                "failed to write notice to {}: {}",
                self.status_path.display(),
                err
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_counts_frames() -> Result<()> {
        let mut display = ConsoleDisplay::new();
        let frame = RgbImage::new(4, 4);
        display.render(&frame, "**Hardhat** : No  \n", None)?;
        display.render(&frame, "**Hardhat** : No  \n", Some("WARNING: x"))?;
        assert_eq!(display.frames_rendered(), 2);
        Ok(())
    }

    #[test]
    fn snapshot_writes_image_and_status() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut display = SnapshotDisplay::new(dir.path().join("latest.jpg"));
        let frame = RgbImage::new(16, 8);

        display.render(
            &frame,
            "**Mask** : Yes  \n",
            Some("WARNING: Risk of head injury. Please wear Hardhat"),
        )?;

        let written = image::open(display.image_path())?;
        assert_eq!((written.width(), written.height()), (16, 8));
        let status = std::fs::read_to_string(display.status_path())?;
        assert!(status.starts_with("**Mask** : Yes"));
        assert!(status.contains("Please wear Hardhat"));

        display.notice("Camera not detected");
        let status = std::fs::read_to_string(display.status_path())?;
        assert_eq!(status, "Camera not detected\n");
        Ok(())
    }
}
