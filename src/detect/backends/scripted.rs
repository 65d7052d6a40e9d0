use std::path::Path;

use anyhow::{anyhow, Context, Result};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;

/// Scripted backend for demos and tests.
///
/// Replays one list of detections per call, cycling through the script. Pixels
/// are ignored apart from a size check.
pub struct ScriptedBackend {
    script: Vec<Vec<Detection>>,
    cursor: usize,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Vec<Detection>>) -> Self {
        Self { script, cursor: 0 }
    }

    /// Load a script from a JSON file: an array of frames, each an array of
    /// `{"label": .., "bbox": {"x1": .., ..}, "confidence": ..}` objects.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read detection script {}", path.display()))?;
        let script: Vec<Vec<Detection>> = serde_json::from_str(&raw)
            .with_context(|| format!("invalid detection script {}", path.display()))?;
        Ok(Self::new(script))
    }

    /// Number of frames consumed so far.
    pub fn calls(&self) -> usize {
        self.cursor
    }
}

impl DetectorBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>> {
        let expected = (width as usize) * (height as usize) * 3;
        if pixels.len() != expected {
            return Err(anyhow!(
                "expected {} RGB bytes, received {}",
                expected,
                pixels.len()
            ));
        }
        let detections = if self.script.is_empty() {
            Vec::new()
        } else {
            self.script[self.cursor % self.script.len()].clone()
        };
        self.cursor += 1;
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::result::BoundingBox;
    use std::io::Write;

    #[test]
    fn scripted_backend_cycles() {
        let bbox = BoundingBox::new(0, 0, 10, 10);
        let mut backend = ScriptedBackend::new(vec![
            vec![Detection::new("Hardhat", bbox, 0.9)],
            vec![],
        ]);
        let pixels = [0u8; 12];

        assert_eq!(backend.detect(&pixels, 2, 2).unwrap().len(), 1);
        assert!(backend.detect(&pixels, 2, 2).unwrap().is_empty());
        assert_eq!(backend.detect(&pixels, 2, 2).unwrap()[0].label, "Hardhat");
        assert_eq!(backend.calls(), 3);
    }

    #[test]
    fn scripted_backend_rejects_bad_pixels() {
        let mut backend = ScriptedBackend::new(vec![]);
        assert!(backend.detect(&[0u8; 5], 2, 2).is_err());
    }

    #[test]
    fn loads_script_from_json() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(
            file,
            r#"[[{{"label": "NO-Mask", "bbox": {{"x1": 1, "y1": 2, "x2": 3, "y2": 4}}}}]]"#
        )?;
        let mut backend = ScriptedBackend::from_json_file(file.path())?;
        let detections = backend.detect(&[0u8; 3], 1, 1)?;
        assert_eq!(detections[0].label, "NO-Mask");
        assert_eq!(detections[0].bbox, BoundingBox::new(1, 2, 3, 4));
        assert_eq!(detections[0].confidence, 0.0);
        Ok(())
    }
}
