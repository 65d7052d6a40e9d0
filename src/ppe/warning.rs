use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use crate::detect::Detection;
use crate::ppe::equipment::MissingEquipment;

/// Minimum time between two warnings for the same missing item.
pub const WARNING_INTERVAL: Duration = Duration::from_secs(20);

/// Last time each missing-equipment warning fired, relative to session start.
///
/// An absent entry means the warning has never fired this session. Entries only
/// move forward and only when a warning for that item is emitted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WarningCooldownState {
    last_fired: HashMap<MissingEquipment, Duration>,
}

impl WarningCooldownState {
    pub fn last_fired(&self, item: MissingEquipment) -> Option<Duration> {
        self.last_fired.get(&item).copied()
    }

    fn is_eligible(&self, item: MissingEquipment, now: Duration) -> bool {
        match self.last_fired(item) {
            None => true,
            Some(last) => now.saturating_sub(last) > WARNING_INTERVAL,
        }
    }

    fn record(&mut self, item: MissingEquipment, now: Duration) {
        let entry = self.last_fired.entry(item).or_insert(now);
        *entry = (*entry).max(now);
    }
}

/// A warning emitted for one frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Warning {
    /// Items that fired this frame, in reporting order.
    pub items: Vec<MissingEquipment>,
}

impl Warning {
    /// `WARNING: <risk> and <risk>. Please wear <item> and <item>`.
    pub fn message(&self) -> String {
        let risks: Vec<&str> = self.items.iter().map(|item| item.risk()).collect();
        let apparel: Vec<&str> = self
            .items
            .iter()
            .map(|item| item.required().label())
            .collect();
        format!(
            "WARNING: {}. Please wear {}",
            risks.join(" and "),
            apparel.join(" and ")
        )
    }
}

/// Per-item debounce for missing-equipment warnings.
#[derive(Clone, Debug, Default)]
pub struct WarningPolicy {
    cooldown: WarningCooldownState,
}

impl WarningPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from an existing cooldown state.
    pub fn with_state(cooldown: WarningCooldownState) -> Self {
        Self { cooldown }
    }

    pub fn state(&self) -> &WarningCooldownState {
        &self.cooldown
    }

    /// Evaluate one frame's detections at session time `now`.
    ///
    /// Every detected missing item whose cooldown has elapsed fires and has its
    /// timestamp updated. Items still cooling down are suppressed untouched.
    pub fn evaluate(&mut self, detections: &[Detection], now: Duration) -> Option<Warning> {
        let missing: BTreeSet<MissingEquipment> = detections
            .iter()
            .filter(|d| d.is_negative())
            .filter_map(|d| {
                let item = MissingEquipment::from_label(&d.label);
                if item.is_none() {
                    log::debug!("warning: ignoring unknown negative label {:?}", d.label);
                }
                item
            })
            .collect();

        let mut fired = Vec::new();
        for item in missing {
            if self.cooldown.is_eligible(item, now) {
                self.cooldown.record(item, now);
                fired.push(item);
            } else {
                log::trace!("warning: {} suppressed (cooling down)", item);
            }
        }

        if fired.is_empty() {
            None
        } else {
            Some(Warning { items: fired })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BoundingBox;

    fn det(label: &str) -> Detection {
        Detection::new(label, BoundingBox::new(5, 5, 50, 50), 0.7)
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn first_sighting_fires_immediately() {
        let mut policy = WarningPolicy::new();
        let warning = policy.evaluate(&[det("NO-Mask")], secs(0)).unwrap();
        assert_eq!(
            warning.message(),
            "WARNING: Risk of respiratory injury. Please wear Mask"
        );
        assert_eq!(policy.state().last_fired(MissingEquipment::NoMask), Some(secs(0)));
    }

    #[test]
    fn repeat_within_interval_is_suppressed() {
        let mut policy = WarningPolicy::new();
        let frame = [det("NO-Hardhat")];
        assert!(policy.evaluate(&frame, secs(0)).is_some());
        assert!(policy.evaluate(&frame, secs(19)).is_none());
        assert!(policy.evaluate(&frame, secs(20)).is_none());
        assert!(policy.evaluate(&frame, secs(21)).is_some());
        assert_eq!(
            policy.state().last_fired(MissingEquipment::NoHardhat),
            Some(secs(21))
        );
    }

    #[test]
    fn suppression_does_not_touch_state() {
        let mut policy = WarningPolicy::new();
        policy.evaluate(&[det("NO-Mask")], secs(3));
        let before = policy.state().clone();
        assert!(policy.evaluate(&[det("NO-Mask")], secs(10)).is_none());
        assert_eq!(policy.state(), &before);
    }

    #[test]
    fn combines_eligible_items_in_one_message() {
        let mut policy = WarningPolicy::new();
        let warning = policy
            .evaluate(&[det("NO-Safety Vest"), det("NO-Hardhat")], secs(0))
            .unwrap();
        let message = warning.message();
        assert_eq!(
            message,
            "WARNING: Risk of head injury and Risk of low visibility. \
             Please wear Hardhat and Safety Vest"
        );
        assert_eq!(message.matches("Risk of head injury").count(), 1);
        assert_eq!(message.matches("Risk of low visibility").count(), 1);
    }

    #[test]
    fn cooldowns_are_independent_per_item() {
        let mut policy = WarningPolicy::new();
        policy.evaluate(&[det("NO-Mask")], secs(0));
        let warning = policy
            .evaluate(&[det("NO-Mask"), det("NO-Hardhat")], secs(5))
            .unwrap();
        assert_eq!(warning.items, vec![MissingEquipment::NoHardhat]);
        assert_eq!(
            warning.message(),
            "WARNING: Risk of head injury. Please wear Hardhat"
        );
    }

    #[test]
    fn duplicate_detections_fire_once() {
        let mut policy = WarningPolicy::new();
        let warning = policy
            .evaluate(&[det("NO-Mask"), det("NO-Mask")], secs(0))
            .unwrap();
        assert_eq!(warning.items, vec![MissingEquipment::NoMask]);
    }

    #[test]
    fn positive_and_unknown_labels_never_warn() {
        let mut policy = WarningPolicy::new();
        assert!(policy
            .evaluate(&[det("Hardhat"), det("Mask"), det("NO-Gloves")], secs(0))
            .is_none());
        assert_eq!(policy.state(), &WarningCooldownState::default());
    }

    #[test]
    fn resumes_from_existing_state() {
        let mut policy = WarningPolicy::new();
        policy.evaluate(&[det("NO-Mask")], secs(100));
        let mut resumed = WarningPolicy::with_state(policy.state().clone());
        assert!(resumed.evaluate(&[det("NO-Mask")], secs(110)).is_none());
        assert!(resumed.evaluate(&[det("NO-Mask")], secs(121)).is_some());
    }
}
