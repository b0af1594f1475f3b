//! Profile registry

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use facecast_core::{FacecastError, FacecastResult};

use crate::{builtin_profiles, RigProfile};

/// Validated profiles keyed by id, in registration order
#[derive(Clone, Debug, Default)]
pub struct ProfileRegistry {
    profiles: HashMap<String, Arc<RigProfile>>,
    order: Vec<String>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with the built-in rigs
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for profile in builtin_profiles() {
            // Built-in tables are covered by tests
            if let Err(e) = registry.insert(profile) {
                tracing::error!("built-in profile rejected: {}", e);
            }
        }
        registry
    }

    /// Validate and register a profile, replacing any with the same id
    pub fn insert(&mut self, profile: RigProfile) -> FacecastResult<Arc<RigProfile>> {
        profile.validate()?;

        let id = profile.id.clone();
        let profile = Arc::new(profile);
        if self.profiles.insert(id.clone(), Arc::clone(&profile)).is_some() {
            tracing::debug!(profile = %id, "replaced rig profile");
        } else {
            tracing::debug!(profile = %id, bindings = profile.bindings.len(), "registered rig profile");
            self.order.push(id);
        }
        Ok(profile)
    }

    /// Parse, validate and register a JSON profile
    pub fn load_json(&mut self, json: &str) -> FacecastResult<Arc<RigProfile>> {
        self.insert(RigProfile::from_json(json)?)
    }

    /// Load a JSON profile from disk
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> FacecastResult<Arc<RigProfile>> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| FacecastError::Config(format!("{}: {}", path.display(), e)))?;
        self.load_json(&json)
    }

    pub fn get(&self, id: &str) -> FacecastResult<Arc<RigProfile>> {
        self.profiles
            .get(id)
            .cloned()
            .ok_or_else(|| FacecastError::UnknownRig(id.to_owned()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.profiles.contains_key(id)
    }

    /// Profile ids in registration order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Source;

    #[test]
    fn test_builtin_registry() {
        let registry = ProfileRegistry::with_builtin();
        assert_eq!(registry.len(), 7);
        assert_eq!(
            registry.ids().collect::<Vec<_>>(),
            ["sana", "yuni", "haneru", "andelte", "fencer", "shaclo", "vroid"]
        );
        assert_eq!(registry.get("fencer").unwrap().display_name, "Fencer 2018.08.26");
    }

    #[test]
    fn test_unknown_rig() {
        let registry = ProfileRegistry::with_builtin();
        assert_eq!(
            registry.get("nobody").unwrap_err(),
            FacecastError::UnknownRig("nobody".into())
        );
    }

    #[test]
    fn test_invalid_profile_not_registered() {
        let mut registry = ProfileRegistry::new();
        let bad = RigProfile::new("bad")
            .bind("x", Source::Jaw)
            .bind("x", Source::BlinkLeft);

        assert!(registry.insert(bad).is_err());
        assert!(registry.is_empty());
        assert!(!registry.contains("bad"));
    }

    #[test]
    fn test_replace_keeps_order() {
        let mut registry = ProfileRegistry::with_builtin();
        registry
            .insert(RigProfile::new("yuni").bind("0", Source::Jaw))
            .unwrap();

        assert_eq!(registry.len(), 7);
        assert_eq!(registry.ids().nth(1), Some("yuni"));
        assert_eq!(registry.get("yuni").unwrap().bindings.len(), 1);
    }

    #[test]
    fn test_load_json() {
        let mut registry = ProfileRegistry::new();
        let profile = registry
            .load_json(r#"{ "id": "custom", "bindings": [{ "output": "mouth", "source": { "kind": "jaw" } }] }"#)
            .unwrap();
        assert_eq!(profile.id, "custom");
        assert!(registry.contains("custom"));

        let err = registry.load_json(r#"{ "id": "broken", "bindings": 3 }"#).unwrap_err();
        assert!(matches!(err, FacecastError::ProfileValidation { ref profile, .. } if profile == "broken"));
    }

    #[test]
    fn test_load_missing_file() {
        let mut registry = ProfileRegistry::new();
        let err = registry.load_file("/nonexistent/facecast/profile.json").unwrap_err();
        assert!(matches!(err, FacecastError::Config(_)));
    }
}
