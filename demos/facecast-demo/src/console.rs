//! Rig that renders its outputs to the terminal

use std::collections::BTreeMap;
use std::fmt::Write;

use facecast_rig::RigSink;

/// Console stand-in for an avatar's face mesh
pub struct ConsoleRig {
    name: String,
    weights: BTreeMap<String, f32>,
    visible: BTreeMap<String, bool>,
}

impl ConsoleRig {
    pub fn new(name: &str) -> Self {
        ConsoleRig {
            name: name.to_string(),
            weights: BTreeMap::new(),
            visible: BTreeMap::new(),
        }
    }

    /// One status line: every weight as a bar, then shown parts
    pub fn render(&self) -> String {
        let mut line = format!("{:<8}", self.name);
        for (output, weight) in &self.weights {
            let filled = (weight.clamp(0.0, 100.0) / 10.0).round() as usize;
            let _ = write!(line, " {:>2}[{:<10}]", output, "#".repeat(filled));
        }
        let shown: Vec<&str> = self
            .visible
            .iter()
            .filter(|(_, v)| **v)
            .map(|(k, _)| k.as_str())
            .collect();
        if !shown.is_empty() {
            let _ = write!(line, "  +{}", shown.join("+"));
        }
        line
    }
}

impl RigSink for ConsoleRig {
    fn set_weight(&mut self, output: &str, weight: f32) {
        self.weights.insert(output.to_string(), weight);
    }

    fn set_visible(&mut self, part: &str, visible: bool) {
        println!("   [{}] {} {}", self.name, if visible { "show" } else { "hide" }, part);
        self.visible.insert(part.to_string(), visible);
    }
}
