use std::fmt;

/// Required equipment, detected by its positive class label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Equipment {
    Hardhat,
    Mask,
    SafetyVest,
}

impl Equipment {
    /// Display and reporting order.
    pub const ALL: [Equipment; 3] = [Equipment::Hardhat, Equipment::Mask, Equipment::SafetyVest];

    pub fn label(self) -> &'static str {
        match self {
            Equipment::Hardhat => "Hardhat",
            Equipment::Mask => "Mask",
            Equipment::SafetyVest => "Safety Vest",
        }
    }

    /// Exact match against a model label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|item| item.label() == label)
    }
}

impl fmt::Display for Equipment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Confirmed absence of a required item (a `NO-` class).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MissingEquipment {
    NoHardhat,
    NoMask,
    NoSafetyVest,
}

impl MissingEquipment {
    pub const ALL: [MissingEquipment; 3] = [
        MissingEquipment::NoHardhat,
        MissingEquipment::NoMask,
        MissingEquipment::NoSafetyVest,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MissingEquipment::NoHardhat => "NO-Hardhat",
            MissingEquipment::NoMask => "NO-Mask",
            MissingEquipment::NoSafetyVest => "NO-Safety Vest",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|item| item.label() == label)
    }

    /// Hazard phrase used in the warning message.
    pub fn risk(self) -> &'static str {
        match self {
            MissingEquipment::NoHardhat => "Risk of head injury",
            MissingEquipment::NoMask => "Risk of respiratory injury",
            MissingEquipment::NoSafetyVest => "Risk of low visibility",
        }
    }

    /// The item the operator is asked to put on.
    pub fn required(self) -> Equipment {
        match self {
            MissingEquipment::NoHardhat => Equipment::Hardhat,
            MissingEquipment::NoMask => Equipment::Mask,
            MissingEquipment::NoSafetyVest => Equipment::SafetyVest,
        }
    }
}

impl fmt::Display for MissingEquipment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
