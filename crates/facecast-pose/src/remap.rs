//! Tracking space to rig space
//!
//! The capture device reports the head in camera space with the device held
//! in landscape. The rig's root is upright and faces the viewer, so axes are
//! swapped and the roll is offset by a quarter turn.

use facecast_core::{Quat, TrackingSnapshot, Vec3};

/// Depth is exaggerated so leaning in reads on screen
pub const DEPTH_SCALE: f32 = 1.5;

/// Roll offset for the landscape capture orientation, degrees
pub const ROLL_OFFSET_DEGREES: f32 = 90.0;

/// Convert a tracked head position and Euler rotation (degrees) into the
/// root position and head rotation the poser expects.
pub fn remap_tracking(position: Vec3, rotation: Vec3) -> (Vec3, Quat) {
    let p = Vec3::new(position.y, -position.x, position.z * DEPTH_SCALE);
    let r = Quat::from_euler_degrees(Vec3::new(
        -rotation.y,
        -rotation.x,
        -rotation.z + ROLL_OFFSET_DEGREES,
    ));
    (p, r)
}

/// `remap_tracking` on a snapshot's head channels
pub fn remap_snapshot(snapshot: &TrackingSnapshot) -> (Vec3, Quat) {
    remap_tracking(snapshot.head_position(), snapshot.head_rotation())
}
