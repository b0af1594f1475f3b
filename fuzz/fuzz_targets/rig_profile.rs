#![no_main]

use facecast_core::{Channel, TrackingSnapshot};
use facecast_rig::{RigProfile, Retargeter};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

// Hand-authored profiles are untrusted input: loading must never panic,
// and a profile that loads must evaluate.
fuzz_target!(|data: &[u8]| {
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(profile) = RigProfile::from_json(json) {
        let snapshot = TrackingSnapshot::zeroed().with(Channel::JawOpen, 0.5);
        let frame = Retargeter::new(Arc::new(profile)).evaluate(&snapshot);
        assert!(frame.eyes.left.is_finite());
    }
});
