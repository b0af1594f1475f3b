//! Retargeting engine
//!
//! Turns one tracking snapshot into the active rig's output weights plus the
//! two eye-joint rotations.

use std::sync::Arc;

use facecast_core::{Channel, TrackingSnapshot, Vec3};

use crate::{RigProfile, RigSink, Source};

/// Resting mouth tension added to the smile average
pub const MOUTH_SMILE_BASELINE: f32 = 0.2;

/// Eye pitch at full look-up/look-down, degrees
pub const EYE_PITCH_RANGE: f32 = 10.0;

/// Eye yaw at full look-in/look-out, degrees
pub const EYE_YAW_RANGE: f32 = 15.0;

#[inline]
fn avg(a: f32, b: f32) -> f32 {
    (a + b) * 0.5
}

/// Derived inputs shared by every profile
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Composites {
    pub eye_wide: f32,
    pub mouth_smile: f32,
    pub look_right: f32,
    pub look_left: f32,
    pub look_up: f32,
    pub look_down: f32,
}

impl Composites {
    pub fn from_snapshot(s: &TrackingSnapshot) -> Self {
        Composites {
            eye_wide: avg(s.get(Channel::EyeWideLeft), s.get(Channel::EyeWideRight)),
            mouth_smile: MOUTH_SMILE_BASELINE
                + avg(s.get(Channel::MouthSmileLeft), s.get(Channel::MouthSmileRight)),
            look_right: avg(s.get(Channel::EyeLookInLeft), s.get(Channel::EyeLookOutRight)),
            look_left: avg(s.get(Channel::EyeLookOutLeft), s.get(Channel::EyeLookInRight)),
            look_up: avg(s.get(Channel::EyeLookUpLeft), s.get(Channel::EyeLookUpRight)),
            // Reads the left channel twice; rigs are calibrated against this
            look_down: avg(s.get(Channel::EyeLookDownLeft), s.get(Channel::EyeLookDownLeft)),
        }
    }
}

/// Local Euler rotations (degrees) for the two eye joints
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EyeRotations {
    pub left: Vec3,
    pub right: Vec3,
}

/// Eye joint rotations; independent of the active profile
pub fn eye_rotations(s: &TrackingSnapshot) -> EyeRotations {
    let left = Vec3::new(
        (s.get(Channel::EyeLookDownLeft) - s.get(Channel::EyeLookUpLeft)) * EYE_PITCH_RANGE,
        (s.get(Channel::EyeLookInLeft) - s.get(Channel::EyeLookOutLeft)) * EYE_YAW_RANGE,
        0.0,
    );
    let right = Vec3::new(
        (s.get(Channel::EyeLookDownRight) - s.get(Channel::EyeLookUpRight)) * EYE_PITCH_RANGE,
        (s.get(Channel::EyeLookOutRight) - s.get(Channel::EyeLookInRight)) * EYE_YAW_RANGE,
        0.0,
    );
    EyeRotations { left, right }
}

/// One named output value
#[derive(Clone, Debug, PartialEq)]
pub struct OutputWeight {
    pub output: String,
    pub weight: f32,
}

/// Everything one tick produces for one avatar
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RetargetFrame {
    pub weights: Vec<OutputWeight>,
    pub eyes: EyeRotations,
}

impl RetargetFrame {
    /// Weight computed for `output`, if the profile binds it
    pub fn weight(&self, output: &str) -> Option<f32> {
        self.weights
            .iter()
            .find(|w| w.output == output)
            .map(|w| w.weight)
    }

    /// Write every weight to the rig
    pub fn apply_weights(&self, sink: &mut dyn RigSink) {
        for w in &self.weights {
            sink.set_weight(&w.output, w.weight);
        }
    }
}

/// Evaluates one profile against snapshots
#[derive(Clone, Debug)]
pub struct Retargeter {
    profile: Arc<RigProfile>,
}

impl Retargeter {
    pub fn new(profile: Arc<RigProfile>) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &Arc<RigProfile> {
        &self.profile
    }

    /// Unscaled value of a source
    pub fn source_value(&self, source: &Source, s: &TrackingSnapshot, c: &Composites) -> f32 {
        let profile = &self.profile;
        match source {
            Source::Jaw => profile.jaw_curve.evaluate(s.get(Channel::JawOpen)),
            Source::BlinkLeft => profile.blink_curve.evaluate(s.get(Channel::EyeBlinkLeft)),
            Source::BlinkRight => profile.blink_curve.evaluate(s.get(Channel::EyeBlinkRight)),
            Source::BlinkBoth => profile.blink_curve.evaluate(avg(
                s.get(Channel::EyeBlinkLeft),
                s.get(Channel::EyeBlinkRight),
            )),
            Source::EyeWide => c.eye_wide,
            Source::MouthSmile => c.mouth_smile,
            Source::MouthFlat { constant } => constant - c.mouth_smile,
            Source::LookRight => c.look_right,
            Source::LookLeft => c.look_left,
            Source::LookUp => c.look_up,
            Source::LookDown => c.look_down,
            Source::Channel { channel } => s.get(*channel),
        }
    }

    /// Compute the profile's outputs and the eye rotations
    pub fn evaluate(&self, s: &TrackingSnapshot) -> RetargetFrame {
        let composites = Composites::from_snapshot(s);
        let weights = self
            .profile
            .bindings
            .iter()
            .map(|b| OutputWeight {
                output: b.output.clone(),
                weight: self.source_value(&b.source, s, &composites) * b.scale,
            })
            .collect();

        RetargetFrame {
            weights,
            eyes: eye_rotations(s),
        }
    }

    /// Evaluate and write the weights straight to the rig
    pub fn drive(&self, s: &TrackingSnapshot, sink: &mut dyn RigSink) -> RetargetFrame {
        let frame = self.evaluate(s);
        frame.apply_weights(sink);
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{builtin, RecordingSink, ResponseCurve};

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn retargeter(profile: RigProfile) -> Retargeter {
        Retargeter::new(Arc::new(profile))
    }

    #[test]
    fn test_eye_wide_average() {
        let s = TrackingSnapshot::zeroed()
            .with(Channel::EyeWideLeft, 0.4)
            .with(Channel::EyeWideRight, 0.6);
        assert!(approx(Composites::from_snapshot(&s).eye_wide, 0.5));
    }

    #[test]
    fn test_mouth_smile_baseline() {
        let c = Composites::from_snapshot(&TrackingSnapshot::zeroed());
        assert_eq!(c.mouth_smile, 0.2);

        let s = TrackingSnapshot::zeroed()
            .with(Channel::MouthSmileLeft, 0.2)
            .with(Channel::MouthSmileRight, 0.4);
        assert!(approx(Composites::from_snapshot(&s).mouth_smile, 0.5));
    }

    #[test]
    fn test_look_composites() {
        let s = TrackingSnapshot::zeroed()
            .with(Channel::EyeLookInLeft, 0.2)
            .with(Channel::EyeLookOutRight, 0.4)
            .with(Channel::EyeLookOutLeft, 0.6)
            .with(Channel::EyeLookInRight, 0.8)
            .with(Channel::EyeLookUpLeft, 0.1)
            .with(Channel::EyeLookUpRight, 0.3);
        let c = Composites::from_snapshot(&s);
        assert!(approx(c.look_right, 0.3));
        assert!(approx(c.look_left, 0.7));
        assert!(approx(c.look_up, 0.2));
    }

    #[test]
    fn test_look_down_reads_left_channel_only() {
        let s = TrackingSnapshot::zeroed()
            .with(Channel::EyeLookDownLeft, 0.6)
            .with(Channel::EyeLookDownRight, 0.0);
        assert!(approx(Composites::from_snapshot(&s).look_down, 0.6));

        let s = TrackingSnapshot::zeroed().with(Channel::EyeLookDownRight, 1.0);
        assert_eq!(Composites::from_snapshot(&s).look_down, 0.0);
    }

    #[test]
    fn test_jaw_identity_full_open() {
        let s = TrackingSnapshot::zeroed().with(Channel::JawOpen, 1.0);
        let frame = retargeter(builtin::sana()).evaluate(&s);
        assert_eq!(frame.weight("10"), Some(100.0));
    }

    #[test]
    fn test_curves_applied_before_scaling() {
        let profile = RigProfile::new("curved")
            .jaw_curve(ResponseCurve::linear(0.5, 0.0))
            .blink_curve(ResponseCurve::linear(2.0, 0.0))
            .bind("jaw", Source::Jaw)
            .bind("blink_l", Source::BlinkLeft)
            .bind("blink_r", Source::BlinkRight);
        let s = TrackingSnapshot::zeroed()
            .with(Channel::JawOpen, 0.8)
            .with(Channel::EyeBlinkLeft, 0.25)
            .with(Channel::EyeBlinkRight, 0.1);

        let frame = retargeter(profile).evaluate(&s);
        assert!(approx(frame.weight("jaw").unwrap(), 40.0));
        assert!(approx(frame.weight("blink_l").unwrap(), 50.0));
        assert!(approx(frame.weight("blink_r").unwrap(), 20.0));
    }

    #[test]
    fn test_combined_blink_uses_average() {
        let s = TrackingSnapshot::zeroed()
            .with(Channel::EyeBlinkLeft, 1.0)
            .with(Channel::EyeBlinkRight, 0.0);
        let frame = retargeter(builtin::fencer()).evaluate(&s);
        assert!(approx(frame.weight("20").unwrap(), 50.0));
    }

    #[test]
    fn test_mouth_flat_constants_per_rig() {
        let s = TrackingSnapshot::zeroed();
        let haneru = retargeter(builtin::haneru()).evaluate(&s);
        let andelte = retargeter(builtin::andelte()).evaluate(&s);

        // 0.8 - 0.2 and 0.6 - 0.2
        assert!(approx(haneru.weight("7").unwrap(), 60.0));
        assert!(approx(andelte.weight("10").unwrap(), 40.0));
    }

    #[test]
    fn test_andelte_look_scales() {
        let s = TrackingSnapshot::zeroed()
            .with(Channel::EyeLookUpLeft, 1.0)
            .with(Channel::EyeLookUpRight, 1.0)
            .with(Channel::EyeLookInLeft, 1.0)
            .with(Channel::EyeLookOutRight, 1.0);
        let frame = retargeter(builtin::andelte()).evaluate(&s);
        assert!(approx(frame.weight("25").unwrap(), 80.0));
        assert!(approx(frame.weight("26").unwrap(), 100.0));
        assert!(approx(frame.weight("27").unwrap(), 0.0));
    }

    #[test]
    fn test_missing_eye_wide_is_omitted() {
        let s = TrackingSnapshot::zeroed().with(Channel::EyeWideLeft, 1.0);
        for profile in [builtin::andelte(), builtin::shaclo(), builtin::vroid()] {
            let r = retargeter(profile);
            assert!(!r.profile().uses(&Source::EyeWide));
            let frame = r.evaluate(&s);
            assert_eq!(frame.weights.len(), r.profile().bindings.len());
        }
    }

    #[test]
    fn test_eye_rotations_mirror_yaw() {
        let s = TrackingSnapshot::zeroed()
            .with(Channel::EyeLookDownLeft, 0.5)
            .with(Channel::EyeLookInLeft, 1.0)
            .with(Channel::EyeLookUpRight, 0.5)
            .with(Channel::EyeLookInRight, 1.0);
        let eyes = eye_rotations(&s);

        assert!(approx(eyes.left.x, 5.0));
        assert!(approx(eyes.left.y, 15.0));
        assert_eq!(eyes.left.z, 0.0);
        assert!(approx(eyes.right.x, -5.0));
        assert!(approx(eyes.right.y, -15.0));
    }

    #[test]
    fn test_drive_writes_sink() {
        let s = TrackingSnapshot::zeroed()
            .with(Channel::EyeWideLeft, 0.4)
            .with(Channel::EyeWideRight, 0.6);
        let mut sink = RecordingSink::new();
        retargeter(builtin::sana()).drive(&s, &mut sink);

        assert!(approx(sink.weight("6").unwrap(), 50.0));
        assert!(approx(sink.weight("9").unwrap(), 50.0));
        assert!(approx(sink.weight("16").unwrap(), 20.0));
        assert_eq!(sink.weights().len(), builtin::sana().bindings.len());
    }
}
