//! FaceCast Runtime - Node orchestration
//!
//! A node is either a sender or a receiver for its whole lifetime:
//! - Sender: capture sample → snapshot → broadcast, and drive local avatars
//! - Receiver: receive loop → latest-snapshot slot → drive local avatars
//!
//! Both sides share the same per-tick avatar update:
//! 1. Pull the newest snapshot (skip the tick if none has arrived yet)
//! 2. Remap head pose and buffer it in the poser
//! 3. Apply the pose to the joint chain
//! 4. Retarget expressions onto the active rig's outputs
//! 5. Rotate the eye joints

pub mod avatar;
pub mod config;
pub mod node;
pub mod roster;
pub mod telemetry;

pub use avatar::*;
pub use config::*;
pub use node::*;
pub use roster::*;
pub use telemetry::*;
