use std::fmt::Write as _;

use crate::detect::Detection;
use crate::ppe::equipment::Equipment;

/// Presence of each required item in the current frame only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EquipmentStatus {
    present: [bool; 3],
}

impl EquipmentStatus {
    /// A class is present iff some detection carries its exact positive label.
    pub fn from_detections(detections: &[Detection]) -> Self {
        let mut status = Self::default();
        for detection in detections {
            if let Some(item) = Equipment::from_label(&detection.label) {
                status.present[Self::index(item)] = true;
            }
        }
        status
    }

    pub fn is_present(&self, item: Equipment) -> bool {
        self.present[Self::index(item)]
    }

    /// "Yes" / "No", as shown to the operator.
    pub fn answer(&self, item: Equipment) -> &'static str {
        if self.is_present(item) {
            "Yes"
        } else {
            "No"
        }
    }

    /// One markdown line per item: `**Hardhat** : Yes  `.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        for item in Equipment::ALL {
            let _ = writeln!(out, "**{}** : {}  ", item.label(), self.answer(item));
        }
        out
    }

    fn index(item: Equipment) -> usize {
        match item {
            Equipment::Hardhat => 0,
            Equipment::Mask => 1,
            Equipment::SafetyVest => 2,
        }
    }
}
