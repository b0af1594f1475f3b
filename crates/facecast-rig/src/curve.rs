//! Response curves
//!
//! A response curve remaps a normalized input (jaw open, eye blink) before it
//! is scaled to the rig's weight range. Keyframed curves use cubic Hermite
//! segments with per-key tangents and hold their end values outside the
//! keyed range.

use serde::{Deserialize, Serialize};

/// One key of a keyframed curve
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    /// Slope arriving at this key
    #[serde(default)]
    pub in_tangent: f32,
    /// Slope leaving this key
    #[serde(default)]
    pub out_tangent: f32,
}

impl Keyframe {
    pub fn new(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            in_tangent: 0.0,
            out_tangent: 0.0,
        }
    }

    pub fn with_tangents(mut self, in_tangent: f32, out_tangent: f32) -> Self {
        self.in_tangent = in_tangent;
        self.out_tangent = out_tangent;
        self
    }
}

/// Monotonic remapping applied before scaling
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseCurve {
    /// Output equals input
    #[default]
    Identity,
    /// `gain * x + offset`
    Linear {
        gain: f32,
        #[serde(default)]
        offset: f32,
    },
    /// Hermite keyframe curve
    Keyframes { keys: Vec<Keyframe> },
}

impl ResponseCurve {
    pub fn linear(gain: f32, offset: f32) -> Self {
        ResponseCurve::Linear { gain, offset }
    }

    /// Keyframed curve; keys are sorted by time
    pub fn keyframes(mut keys: Vec<Keyframe>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        ResponseCurve::Keyframes { keys }
    }

    /// S-shaped curve from `(t0, v0)` to `(t1, v1)` with flat ends
    pub fn ease_in_out(t0: f32, v0: f32, t1: f32, v1: f32) -> Self {
        Self::keyframes(vec![Keyframe::new(t0, v0), Keyframe::new(t1, v1)])
    }

    /// Evaluate the curve at `x`
    pub fn evaluate(&self, x: f32) -> f32 {
        match self {
            ResponseCurve::Identity => x,
            ResponseCurve::Linear { gain, offset } => gain * x + offset,
            ResponseCurve::Keyframes { keys } => evaluate_keys(keys, x),
        }
    }

    /// Structural problems, if any. Used at profile load time.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            ResponseCurve::Identity => Ok(()),
            ResponseCurve::Linear { gain, offset } => {
                if gain.is_finite() && offset.is_finite() {
                    Ok(())
                } else {
                    Err("linear curve has a non-finite coefficient".into())
                }
            }
            ResponseCurve::Keyframes { keys } => {
                if keys.is_empty() {
                    return Err("keyframe curve has no keys".into());
                }
                for key in keys {
                    let finite = key.time.is_finite()
                        && key.value.is_finite()
                        && key.in_tangent.is_finite()
                        && key.out_tangent.is_finite();
                    if !finite {
                        return Err(format!("keyframe at t={} is not finite", key.time));
                    }
                }
                if keys.windows(2).any(|w| w[1].time <= w[0].time) {
                    return Err("keyframe times must be strictly increasing".into());
                }
                Ok(())
            }
        }
    }
}

fn evaluate_keys(keys: &[Keyframe], x: f32) -> f32 {
    let (first, last) = match (keys.first(), keys.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return x,
    };
    if x <= first.time {
        return first.value;
    }
    if x >= last.time {
        return last.value;
    }

    // First key strictly after x; x > first.time guarantees idx >= 1
    let idx = keys.partition_point(|k| k.time <= x);
    let k0 = &keys[idx - 1];
    let k1 = &keys[idx];

    let dt = k1.time - k0.time;
    let s = (x - k0.time) / dt;
    let s2 = s * s;
    let s3 = s2 * s;

    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;

    h00 * k0.value + h10 * dt * k0.out_tangent + h01 * k1.value + h11 * dt * k1.in_tangent
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_identity_and_linear() {
        assert_eq!(ResponseCurve::Identity.evaluate(0.37), 0.37);
        assert_eq!(ResponseCurve::linear(2.0, 0.5).evaluate(0.25), 1.0);
    }

    #[test]
    fn test_keyframes_hit_keys_and_clamp() {
        let curve = ResponseCurve::keyframes(vec![
            Keyframe::new(1.0, 1.0),
            Keyframe::new(0.0, 0.0),
            Keyframe::new(0.5, 0.8),
        ]);

        assert_eq!(curve.evaluate(0.0), 0.0);
        assert!((curve.evaluate(0.5) - 0.8).abs() < 1e-6);
        assert_eq!(curve.evaluate(1.0), 1.0);
        assert_eq!(curve.evaluate(-3.0), 0.0);
        assert_eq!(curve.evaluate(7.0), 1.0);
    }

    #[test]
    fn test_linear_tangents_reproduce_line() {
        let curve = ResponseCurve::keyframes(vec![
            Keyframe::new(0.0, 0.0).with_tangents(1.0, 1.0),
            Keyframe::new(1.0, 1.0).with_tangents(1.0, 1.0),
        ]);
        for i in 0..=10 {
            let x = i as f32 / 10.0;
            assert!((curve.evaluate(x) - x).abs() < 1e-5);
        }
    }

    #[test]
    fn test_ease_in_out_midpoint() {
        let curve = ResponseCurve::ease_in_out(0.0, 0.0, 1.0, 1.0);
        assert!((curve.evaluate(0.5) - 0.5).abs() < 1e-6);
        assert!(curve.evaluate(0.1) < 0.1);
        assert!(curve.evaluate(0.9) > 0.9);
    }

    #[test]
    fn test_single_key_is_constant() {
        let curve = ResponseCurve::keyframes(vec![Keyframe::new(0.3, 0.7)]);
        assert_eq!(curve.evaluate(0.0), 0.7);
        assert_eq!(curve.evaluate(1.0), 0.7);
    }

    #[test]
    fn test_validate() {
        assert!(ResponseCurve::Identity.validate().is_ok());
        assert!(ResponseCurve::linear(f32::NAN, 0.0).validate().is_err());
        assert!(ResponseCurve::Keyframes { keys: vec![] }.validate().is_err());

        let duplicate_time = ResponseCurve::Keyframes {
            keys: vec![Keyframe::new(0.5, 0.0), Keyframe::new(0.5, 1.0)],
        };
        assert!(duplicate_time.validate().is_err());
    }

    #[test]
    fn test_curve_json() {
        let curve: ResponseCurve =
            serde_json::from_str(r#"{"kind":"keyframes","keys":[{"time":0,"value":0},{"time":1,"value":1,"in_tangent":2}]}"#)
                .unwrap();
        match curve {
            ResponseCurve::Keyframes { ref keys } => assert_eq!(keys[1].in_tangent, 2.0),
            _ => panic!("expected keyframes"),
        }

        let identity: ResponseCurve = serde_json::from_str(r#"{"kind":"identity"}"#).unwrap();
        assert_eq!(identity, ResponseCurve::Identity);
    }

    proptest! {
        #[test]
        fn prop_flat_tangent_curve_is_monotonic(
            mut values in proptest::collection::vec(0.0f32..1.0, 2..6),
            a in 0.0f32..1.0,
            b in 0.0f32..1.0,
        ) {
            values.sort_by(|x, y| x.total_cmp(y));
            let n = values.len();
            let keys = values
                .iter()
                .enumerate()
                .map(|(i, v)| Keyframe::new(i as f32 / (n - 1) as f32, *v))
                .collect();
            let curve = ResponseCurve::keyframes(keys);

            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(curve.evaluate(lo) <= curve.evaluate(hi) + 1e-5);
            prop_assert!(curve.evaluate(lo) >= values[0] - 1e-5);
            prop_assert!(curve.evaluate(hi) <= values[n - 1] + 1e-5);
        }
    }
}
