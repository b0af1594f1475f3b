//! Wear toggle
//!
//! Wear is a discrete per-avatar switch (glasses, armour, an alternate eye
//! style). It is independent of the per-tick retargeting: toggling writes
//! fixed values once instead of a continuously computed weight.

use crate::{RigProfile, RigSink, WearAction};

/// Weight written to wear outputs while worn
pub const WEAR_ON_WEIGHT: f32 = 100.0;

/// Per-avatar wear flag
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WearState {
    wearing: bool,
}

impl WearState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_wearing(&self) -> bool {
        self.wearing
    }

    /// Flip the flag and write the profile's wear outputs.
    ///
    /// Rigs without a wear action are left untouched and the flag does not
    /// change. Returns the flag after the call.
    pub fn toggle(&mut self, profile: &RigProfile, sink: &mut dyn RigSink) -> bool {
        if profile.wear.is_none() {
            return self.wearing;
        }
        self.wearing = !self.wearing;
        self.apply(profile, sink);
        self.wearing
    }

    /// Write the current flag to the rig without changing it
    pub fn apply(&self, profile: &RigProfile, sink: &mut dyn RigSink) {
        match &profile.wear {
            Some(WearAction::Weights { outputs }) => {
                let weight = if self.wearing { WEAR_ON_WEIGHT } else { 0.0 };
                for output in outputs {
                    sink.set_weight(output, weight);
                }
            }
            Some(WearAction::Visibility { parts }) => {
                for part in parts {
                    sink.set_visible(part, self.wearing);
                }
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{builtin, RecordingSink};

    #[test]
    fn test_toggle_weights() {
        let profile = builtin::shaclo();
        let mut sink = RecordingSink::new();
        let mut wear = WearState::new();

        assert!(wear.toggle(&profile, &mut sink));
        assert_eq!(sink.weight("30"), Some(100.0));
        assert_eq!(sink.weight("31"), Some(100.0));

        assert!(!wear.toggle(&profile, &mut sink));
        assert_eq!(sink.weight("30"), Some(0.0));
        assert_eq!(sink.weight("31"), Some(0.0));
    }

    #[test]
    fn test_toggle_visibility() {
        let profile = builtin::fencer();
        let mut sink = RecordingSink::new();
        let mut wear = WearState::new();

        wear.toggle(&profile, &mut sink);
        for part in ["mantle", "breastplate", "gauntlet", "hair_acc"] {
            assert_eq!(sink.visible(part), Some(true));
        }
        assert!(sink.weights().is_empty());
    }

    #[test]
    fn test_double_toggle_restores_outputs() {
        for profile in builtin::builtin_profiles() {
            let mut sink = RecordingSink::new();
            let mut wear = WearState::new();
            wear.apply(&profile, &mut sink);
            let before = sink.clone();

            wear.toggle(&profile, &mut sink);
            wear.toggle(&profile, &mut sink);

            assert_eq!(sink.weights(), before.weights(), "rig {}", profile.id);
            assert_eq!(sink.visibility(), before.visibility(), "rig {}", profile.id);
            assert!(!wear.is_wearing());
        }
    }

    #[test]
    fn test_toggle_without_wear_action() {
        let profile = RigProfile::new("plain");
        let mut sink = RecordingSink::new();
        let mut wear = WearState::new();

        assert!(!wear.toggle(&profile, &mut sink));
        assert_eq!(sink.writes(), 0);
    }
}
