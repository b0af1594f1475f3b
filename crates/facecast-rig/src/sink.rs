//! Rig output interface
//!
//! The engine only ever writes to a rig; it never reads weights back.

use std::collections::BTreeMap;

/// Named weight and visibility outputs of an avatar rig
pub trait RigSink {
    /// Set a blend weight, nominally in [0, 100]
    fn set_weight(&mut self, output: &str, weight: f32);

    /// Show or hide a named sub-part
    fn set_visible(&mut self, part: &str, visible: bool);
}

impl<S: RigSink + ?Sized> RigSink for &mut S {
    fn set_weight(&mut self, output: &str, weight: f32) {
        (**self).set_weight(output, weight);
    }

    fn set_visible(&mut self, part: &str, visible: bool) {
        (**self).set_visible(part, visible);
    }
}

/// Sink that remembers the last value written to every output
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordingSink {
    weights: BTreeMap<String, f32>,
    visibility: BTreeMap<String, bool>,
    writes: u64,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn weight(&self, output: &str) -> Option<f32> {
        self.weights.get(output).copied()
    }

    pub fn visible(&self, part: &str) -> Option<bool> {
        self.visibility.get(part).copied()
    }

    pub fn weights(&self) -> &BTreeMap<String, f32> {
        &self.weights
    }

    pub fn visibility(&self) -> &BTreeMap<String, bool> {
        &self.visibility
    }

    /// Total number of writes received
    pub fn writes(&self) -> u64 {
        self.writes
    }
}

impl RigSink for RecordingSink {
    fn set_weight(&mut self, output: &str, weight: f32) {
        self.weights.insert(output.to_owned(), weight);
        self.writes += 1;
    }

    fn set_visible(&mut self, part: &str, visible: bool) {
        self.visibility.insert(part.to_owned(), visible);
        self.writes += 1;
    }
}
