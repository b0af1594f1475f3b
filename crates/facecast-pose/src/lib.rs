//! FaceCast Pose - Driving a head joint chain from tracking samples
//!
//! The `Poser` owns the joints it drives while active and hands them back
//! when deactivated. Rest rotations are captured at activation and every
//! tick is computed from rest, so errors never accumulate.

pub mod bone;
pub mod poser;
pub mod remap;

pub use bone::*;
pub use poser::*;
pub use remap::*;
