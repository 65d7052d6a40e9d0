//! PPE status tracking and missing-equipment warnings.
//!
//! Positive and negative classes are tracked independently from the same
//! detection set: a missing `Mask` detection does not imply `NO-Mask`.

mod equipment;
mod status;
mod warning;

pub use equipment::{Equipment, MissingEquipment};
pub use status::EquipmentStatus;
pub use warning::{Warning, WarningCooldownState, WarningPolicy, WARNING_INTERVAL};
