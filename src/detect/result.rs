use serde::{Deserialize, Serialize};

/// Class names of the bundled PPE model, in model output order.
pub const DEFAULT_LABELS: [&str; 10] = [
    "Hardhat",
    "Mask",
    "NO-Hardhat",
    "NO-Mask",
    "NO-Safety Vest",
    "Person",
    "Safety Cone",
    "Safety Vest",
    "machinery",
    "vehicle",
];

/// Axis-aligned box in integer pixel coordinates (top-left, bottom-right).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Map a box from a `from` sized image into a `to` sized image.
    pub fn rescale(&self, from: (u32, u32), to: (u32, u32)) -> Self {
        let sx = to.0 as f32 / from.0.max(1) as f32;
        let sy = to.1 as f32 / from.1.max(1) as f32;
        Self {
            x1: (self.x1 as f32 * sx).round() as i32,
            y1: (self.y1 as f32 * sy).round() as i32,
            x2: (self.x2 as f32 * sx).round() as i32,
            y2: (self.y2 as f32 * sy).round() as i32,
        }
    }
}

/// One labelled detection produced by a backend for a single frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub bbox: BoundingBox,
    /// Reported by the model, never used for status or warnings.
    #[serde(default)]
    pub confidence: f32,
}

impl Detection {
    pub fn new(label: impl Into<String>, bbox: BoundingBox, confidence: f32) -> Self {
        Self {
            label: label.into(),
            bbox,
            confidence,
        }
    }

    /// Labels containing "NO" mark missing equipment and are drawn in red.
    pub fn is_negative(&self) -> bool {
        self.label.contains("NO")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescale_maps_inference_space_to_source() {
        let bbox = BoundingBox::new(64, 48, 320, 240);
        let scaled = bbox.rescale((640, 480), (1280, 960));
        assert_eq!(scaled, BoundingBox::new(128, 96, 640, 480));
    }

    #[test]
    fn negative_labels_contain_no() {
        let bbox = BoundingBox::default();
        assert!(Detection::new("NO-Mask", bbox, 0.9).is_negative());
        assert!(!Detection::new("Mask", bbox, 0.9).is_negative());
        assert!(!Detection::new("machinery", bbox, 0.9).is_negative());
    }
}
