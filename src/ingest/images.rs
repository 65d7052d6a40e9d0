//! Image directory source.
//!
//! Replays PNG/JPEG stills from a local directory in file name order, then
//! reports end-of-stream. Useful for offline runs against recorded stills.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use super::FrameSource;
use crate::frame::Frame;

const EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

pub struct ImageDirSource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    cursor: usize,
}

impl ImageDirSource {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&dir)
            .with_context(|| format!("failed to read image directory {}", dir.display()))?
        {
            let path = entry?.path();
            if path.is_file() && has_image_extension(&path) {
                files.push(path);
            }
        }
        if files.is_empty() {
            return Err(anyhow!("no PNG/JPEG images found in {}", dir.display()));
        }
        files.sort();
        log::info!(
            "ImageDirSource: {} images queued from {}",
            files.len(),
            dir.display()
        );
        Ok(Self {
            dir,
            files,
            cursor: 0,
        })
    }

    pub fn remaining(&self) -> usize {
        self.files.len() - self.cursor
    }
}

impl FrameSource for ImageDirSource {
    fn describe(&self) -> String {
        format!("images {}", self.dir.display())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.files.get(self.cursor) else {
            return Ok(None);
        };
        let image = image::open(path)
            .with_context(|| format!("failed to decode {}", path.display()))?
            .to_rgb8();
        self.cursor += 1;
        Ok(Some(Frame::new(image, self.cursor as u64)))
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn replays_images_in_name_order() -> Result<()> {
        let dir = tempfile::tempdir()?;
        RgbImage::from_pixel(4, 2, Rgb([255, 0, 0])).save(dir.path().join("b.png"))?;
        RgbImage::from_pixel(8, 6, Rgb([0, 0, 255])).save(dir.path().join("a.png"))?;
        std::fs::write(dir.path().join("notes.txt"), "ignored")?;

        let mut source = ImageDirSource::new(dir.path())?;
        assert_eq!(source.remaining(), 2);

        let first = source.next_frame()?.expect("first frame");
        assert_eq!((first.width(), first.height()), (8, 6));
        assert_eq!(first.sequence, 1);

        let second = source.next_frame()?.expect("second frame");
        assert_eq!((second.width(), second.height()), (4, 2));

        assert!(source.next_frame()?.is_none());
        Ok(())
    }

    #[test]
    fn empty_directory_is_an_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        assert!(ImageDirSource::new(dir.path()).is_err());
        Ok(())
    }
}
