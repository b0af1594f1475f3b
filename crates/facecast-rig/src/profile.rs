//! Rig profiles
//!
//! A profile declares, for one avatar rig, which tracking inputs drive which
//! named outputs, the two response curves, and what the wear toggle does.
//! Profiles are built once (built-in tables or hand-authored JSON), validated
//! at load time, and never change afterwards.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use facecast_core::{Channel, FacecastError, FacecastResult};

use crate::ResponseCurve;

/// Weight range of a rig output: inputs in [0, 1] map to [0, 100]
pub const DEFAULT_SCALE: f32 = 100.0;

fn default_scale() -> f32 {
    DEFAULT_SCALE
}

/// Where a binding's value comes from
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Source {
    /// Jaw curve applied to `jawOpen`
    Jaw,
    /// Blink curve applied to the left blink channel
    BlinkLeft,
    /// Blink curve applied to the right blink channel
    BlinkRight,
    /// Blink curve applied to the average of both blink channels
    BlinkBoth,
    /// Average of the two eye-wide channels
    EyeWide,
    /// Resting baseline plus the average of the two smile channels
    MouthSmile,
    /// `constant - mouthSmile`, for rigs whose shape flattens the mouth
    MouthFlat { constant: f32 },
    LookRight,
    LookLeft,
    LookUp,
    LookDown,
    /// A raw channel, unmodified
    Channel { channel: Channel },
}

/// One named output driven by one source
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputBinding {
    /// Output name on the rig (blend shape or parameter)
    pub output: String,
    pub source: Source,
    /// Multiplier from the source value to the output weight
    #[serde(default = "default_scale")]
    pub scale: f32,
}

impl OutputBinding {
    pub fn new(output: impl Into<String>, source: Source) -> Self {
        Self {
            output: output.into(),
            source,
            scale: DEFAULT_SCALE,
        }
    }

    pub fn scaled(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }
}

/// What toggling wear does on this rig
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WearAction {
    /// Drive these outputs to 100 (wearing) or 0
    Weights { outputs: Vec<String> },
    /// Show (wearing) or hide these sub-parts, found by name
    Visibility { parts: Vec<String> },
}

impl WearAction {
    fn names(&self) -> &[String] {
        match self {
            WearAction::Weights { outputs } => outputs,
            WearAction::Visibility { parts } => parts,
        }
    }
}

/// Calibration table for one avatar rig
///
/// Unknown keys are rejected so a misspelled field fails at load time
/// instead of silently falling back to its default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RigProfile {
    /// Registry key
    pub id: String,
    /// Human-readable rig name and version
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub jaw_curve: ResponseCurve,
    #[serde(default)]
    pub blink_curve: ResponseCurve,
    #[serde(default)]
    pub bindings: Vec<OutputBinding>,
    #[serde(default)]
    pub wear: Option<WearAction>,
}

impl RigProfile {
    /// Empty profile with identity curves
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: String::new(),
            jaw_curve: ResponseCurve::Identity,
            blink_curve: ResponseCurve::Identity,
            bindings: Vec::new(),
            wear: None,
        }
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn jaw_curve(mut self, curve: ResponseCurve) -> Self {
        self.jaw_curve = curve;
        self
    }

    pub fn blink_curve(mut self, curve: ResponseCurve) -> Self {
        self.blink_curve = curve;
        self
    }

    /// Add a binding at the default scale
    pub fn bind(mut self, output: impl Into<String>, source: Source) -> Self {
        self.bindings.push(OutputBinding::new(output, source));
        self
    }

    /// Add a binding with an explicit scale
    pub fn bind_scaled(mut self, output: impl Into<String>, source: Source, scale: f32) -> Self {
        self.bindings.push(OutputBinding::new(output, source).scaled(scale));
        self
    }

    pub fn wear(mut self, wear: WearAction) -> Self {
        self.wear = Some(wear);
        self
    }

    /// Does any binding read this source kind?
    pub fn uses(&self, source: &Source) -> bool {
        self.bindings
            .iter()
            .any(|b| std::mem::discriminant(&b.source) == std::mem::discriminant(source))
    }

    /// Parse and validate a hand-authored JSON profile
    pub fn from_json(json: &str) -> FacecastResult<Self> {
        let profile: RigProfile = serde_json::from_str(json).map_err(|e| {
            // Name the profile in the error when the id is readable
            let id = serde_json::from_str::<serde_json::Value>(json)
                .ok()
                .and_then(|v| v.get("id").and_then(|id| id.as_str()).map(str::to_owned))
                .unwrap_or_else(|| "<unnamed>".to_owned());
            FacecastError::profile(id, e.to_string())
        })?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn to_json(&self) -> String {
        // A profile holds only strings, numbers and enums
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Check the profile for configuration errors
    pub fn validate(&self) -> FacecastResult<()> {
        let fail = |reason: String| Err(FacecastError::profile(self.id.clone(), reason));

        if self.id.trim().is_empty() {
            return fail("profile id is empty".into());
        }
        if let Err(reason) = self.jaw_curve.validate() {
            return fail(format!("jaw curve: {}", reason));
        }
        if let Err(reason) = self.blink_curve.validate() {
            return fail(format!("blink curve: {}", reason));
        }

        let mut seen = HashSet::new();
        for binding in &self.bindings {
            if binding.output.trim().is_empty() {
                return fail("binding has an empty output name".into());
            }
            if !seen.insert(binding.output.as_str()) {
                return fail(format!("output '{}' is bound twice", binding.output));
            }
            if !binding.scale.is_finite() {
                return fail(format!("output '{}' has a non-finite scale", binding.output));
            }
            if let Source::MouthFlat { constant } = binding.source {
                if !constant.is_finite() {
                    return fail(format!(
                        "output '{}' has a non-finite flatness constant",
                        binding.output
                    ));
                }
            }
        }

        if let Some(wear) = &self.wear {
            if wear.names().is_empty() {
                return fail("wear action names nothing".into());
            }
            if wear.names().iter().any(|n| n.trim().is_empty()) {
                return fail("wear action has an empty name".into());
            }
        }

        Ok(())
    }

    /// Check that every bound output exists on the target rig
    pub fn check_outputs<'a>(&self, available: impl IntoIterator<Item = &'a str>) -> FacecastResult<()> {
        let available: HashSet<&str> = available.into_iter().collect();
        let mut required: Vec<&str> = self.bindings.iter().map(|b| b.output.as_str()).collect();
        if let Some(WearAction::Weights { outputs }) = &self.wear {
            required.extend(outputs.iter().map(String::as_str));
        }

        match required.into_iter().find(|name| !available.contains(name)) {
            Some(missing) => Err(FacecastError::profile(
                self.id.clone(),
                format!("rig has no output '{}'", missing),
            )),
            None => Ok(()),
        }
    }
}
