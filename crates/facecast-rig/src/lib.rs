//! FaceCast Rig - Retargeting tracking snapshots onto avatar rigs
//!
//! Rigs differ in which expressions they support, how their blend shapes
//! are numbered and which way their shapes point. Those differences live in
//! data (`RigProfile`), not in code: the engine evaluates whatever bindings
//! the active profile declares.
//!
//! # Per-tick flow
//!
//! snapshot → composites → response curves → scaled weights → `RigSink`

pub mod builtin;
pub mod curve;
pub mod profile;
pub mod registry;
pub mod retarget;
pub mod sink;
pub mod wear;

pub use builtin::*;
pub use curve::*;
pub use profile::*;
pub use registry::*;
pub use retarget::*;
pub use sink::*;
pub use wear::*;
