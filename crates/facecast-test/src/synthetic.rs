//! Synthetic capture source
//!
//! Produces plausible, deterministic face motion: a slow head sway, talking
//! jaw, a drifting gaze and blinks at seeded random intervals.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use facecast_core::{CaptureSample, Channel, TrackingSnapshot, Vec3};

/// Seconds an eye takes to close and reopen
pub const BLINK_DURATION: f32 = 0.15;

/// Deterministic fake face tracker
pub struct SyntheticFace {
    rng: StdRng,
    next_blink: f32,
}

impl SyntheticFace {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let next_blink = rng.gen_range(1.0..3.0);
        SyntheticFace { rng, next_blink }
    }

    fn blink(&mut self, t: f32) -> f32 {
        if t > self.next_blink + BLINK_DURATION {
            self.next_blink = t + self.rng.gen_range(2.0..5.0);
        }
        let phase = (t - self.next_blink) / BLINK_DURATION;
        if (0.0..=1.0).contains(&phase) {
            (phase * std::f32::consts::PI).sin()
        } else {
            0.0
        }
    }

    /// Capture sample at time `t` seconds; `t` should not decrease
    pub fn sample(&mut self, t: f32) -> CaptureSample {
        let unit = |x: f32| (0.5 + 0.5 * x).clamp(0.0, 1.0);

        let position = Vec3::new(
            0.02 * (t * 0.7).sin(),
            0.01 * (t * 1.1).sin(),
            -0.4 + 0.02 * (t * 0.5).sin(),
        );
        let rotation = Vec3::new(6.0 * (t * 0.9).sin(), 12.0 * (t * 0.6).sin(), 4.0 * (t * 0.4).sin());

        let blink = self.blink(t);
        let gaze = (t * 0.8).sin();
        let lift = (t * 0.3).sin();

        CaptureSample::uniform(position, rotation, 0.0)
            .with_expression(Channel::JawOpen, unit((t * 6.0).sin()) * unit((t * 0.5).sin()))
            .with_expression(Channel::MouthSmileLeft, unit((t * 0.4).sin()) * 0.6)
            .with_expression(Channel::MouthSmileRight, unit((t * 0.4 + 0.2).sin()) * 0.6)
            .with_expression(Channel::EyeWideLeft, unit((t * 0.25).sin()) * 0.3)
            .with_expression(Channel::EyeWideRight, unit((t * 0.25).sin()) * 0.3)
            .with_expression(Channel::EyeBlinkLeft, blink)
            .with_expression(Channel::EyeBlinkRight, blink)
            .with_expression(Channel::EyeLookInLeft, gaze.max(0.0))
            .with_expression(Channel::EyeLookOutLeft, (-gaze).max(0.0))
            .with_expression(Channel::EyeLookInRight, (-gaze).max(0.0))
            .with_expression(Channel::EyeLookOutRight, gaze.max(0.0))
            .with_expression(Channel::EyeLookUpLeft, lift.max(0.0))
            .with_expression(Channel::EyeLookUpRight, lift.max(0.0))
            .with_expression(Channel::EyeLookDownLeft, (-lift).max(0.0))
            .with_expression(Channel::EyeLookDownRight, (-lift).max(0.0))
    }

    /// Packed snapshot at time `t`
    pub fn snapshot(&mut self, t: f32) -> TrackingSnapshot {
        let sample = self.sample(t);
        // Every expression key is set above
        TrackingSnapshot::from_capture(&sample).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_are_complete_and_in_range() {
        let mut face = SyntheticFace::new(7);
        for i in 0..600 {
            let t = i as f32 / 60.0;
            let snapshot = TrackingSnapshot::from_capture(&face.sample(t)).unwrap();
            assert!(snapshot.first_non_finite().is_none());
            for channel in Channel::EXPRESSIONS {
                let v = snapshot.get(channel);
                assert!((0.0..=1.0).contains(&v), "{} = {}", channel, v);
            }
        }
    }

    #[test]
    fn test_same_seed_same_motion() {
        let mut a = SyntheticFace::new(42);
        let mut b = SyntheticFace::new(42);
        for i in 0..300 {
            let t = i as f32 / 30.0;
            assert_eq!(a.snapshot(t), b.snapshot(t));
        }
    }

    #[test]
    fn test_blinks_happen() {
        let mut face = SyntheticFace::new(3);
        let closed = (0..1200)
            .map(|i| face.snapshot(i as f32 / 60.0).get(Channel::EyeBlinkLeft))
            .filter(|v| *v > 0.9)
            .count();
        assert!(closed > 0);
    }
}
