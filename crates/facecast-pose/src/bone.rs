//! Joint interface

use facecast_core::{Quat, Vec3};

/// A rig joint the poser can move
pub trait Bone {
    fn local_position(&self) -> Vec3;
    fn set_position(&mut self, position: Vec3);
    fn local_rotation(&self) -> Quat;
    fn set_local_rotation(&mut self, rotation: Quat);
}

impl<B: Bone + ?Sized> Bone for &mut B {
    fn local_position(&self) -> Vec3 {
        (**self).local_position()
    }

    fn set_position(&mut self, position: Vec3) {
        (**self).set_position(position);
    }

    fn local_rotation(&self) -> Quat {
        (**self).local_rotation()
    }

    fn set_local_rotation(&mut self, rotation: Quat) {
        (**self).set_local_rotation(rotation);
    }
}

/// Plain position + rotation joint
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn from_rotation(rotation: Quat) -> Self {
        Self::new(Vec3::ZERO, rotation)
    }
}

impl Bone for Transform {
    fn local_position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn local_rotation(&self) -> Quat {
        self.rotation
    }

    fn set_local_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }
}
