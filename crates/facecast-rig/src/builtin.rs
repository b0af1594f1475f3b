//! Built-in rig profiles
//!
//! Output names are blend-shape indices on each rig's face mesh, as strings.

use crate::{RigProfile, Source, WearAction};

fn weights(outputs: &[&str]) -> WearAction {
    WearAction::Weights {
        outputs: outputs.iter().map(|s| s.to_string()).collect(),
    }
}

/// Sana v1.01
pub fn sana() -> RigProfile {
    RigProfile::new("sana")
        .display_name("Sana v1.01")
        .bind("10", Source::Jaw)
        .bind("6", Source::EyeWide)
        .bind("9", Source::EyeWide)
        .bind("2", Source::BlinkLeft)
        .bind("3", Source::BlinkRight)
        .bind("16", Source::MouthSmile)
        .wear(weights(&["20"]))
}

/// Yuni v1.02
pub fn yuni() -> RigProfile {
    RigProfile::new("yuni")
        .display_name("Yuni v1.02")
        .bind("10", Source::Jaw)
        .bind("3", Source::EyeWide)
        .bind("8", Source::EyeWide)
        .bind("1", Source::BlinkLeft)
        .bind("2", Source::BlinkRight)
        .bind("16", Source::MouthSmile)
        .wear(weights(&["18"]))
}

/// Inaba Haneru (MMD 1.0.1); the mouth shape flattens instead of smiling
pub fn haneru() -> RigProfile {
    RigProfile::new("haneru")
        .display_name("Inaba Haneru MMD 1.0.1")
        .bind("0", Source::Jaw)
        .bind("12", Source::EyeWide)
        .bind("13", Source::BlinkLeft)
        .bind("14", Source::BlinkRight)
        .bind("7", Source::MouthFlat { constant: 0.8 })
        .wear(weights(&["28"]))
}

/// Andelte v1.6; no eye-wide shape, but has look-direction shapes
pub fn andelte() -> RigProfile {
    RigProfile::new("andelte")
        .display_name("Andelte v1.6")
        .bind("0", Source::Jaw)
        .bind("21", Source::BlinkLeft)
        .bind("22", Source::BlinkRight)
        .bind("10", Source::MouthFlat { constant: 0.6 })
        .bind("26", Source::LookRight)
        .bind("27", Source::LookLeft)
        .bind_scaled("25", Source::LookUp, 80.0)
        .bind_scaled("28", Source::LookDown, 80.0)
        .wear(weights(&["30"]))
}

/// Fencer (2018.08.26); one combined blink shape, wear toggles armour parts
pub fn fencer() -> RigProfile {
    RigProfile::new("fencer")
        .display_name("Fencer 2018.08.26")
        .bind("15", Source::Jaw)
        .bind("26", Source::EyeWide)
        .bind("20", Source::BlinkBoth)
        .bind("28", Source::MouthSmile)
        .wear(WearAction::Visibility {
            parts: ["mantle", "breastplate", "gauntlet", "hair_acc"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        })
}

/// Shaclo v1.1.2; blink shapes are numbered right before left
pub fn shaclo() -> RigProfile {
    RigProfile::new("shaclo")
        .display_name("Shaclo v1.1.2")
        .bind("4", Source::Jaw)
        .bind("20", Source::BlinkLeft)
        .bind("19", Source::BlinkRight)
        .bind("40", Source::MouthSmile)
        .wear(weights(&["30", "31"]))
}

/// VRoid Studio v0.2.11 export
pub fn vroid() -> RigProfile {
    RigProfile::new("vroid")
        .display_name("VRoid Studio v0.2.11")
        .bind("25", Source::Jaw)
        .bind("16", Source::BlinkLeft)
        .bind("15", Source::BlinkRight)
        .bind("24", Source::MouthSmile)
        .wear(weights(&["19", "39"]))
}

/// Every built-in profile, in avatar-switch order
pub fn builtin_profiles() -> Vec<RigProfile> {
    vec![sana(), yuni(), haneru(), andelte(), fencer(), shaclo(), vroid()]
}
