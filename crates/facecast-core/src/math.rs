//! Vector and rotation math
//!
//! Rotations follow the rig engine's conventions: left-handed, Euler angles
//! in degrees applied Z first, then X, then Y.

use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// 3D vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
    pub const X: Vec3 = Vec3 { x: 1.0, y: 0.0, z: 0.0 };
    pub const Y: Vec3 = Vec3 { x: 0.0, y: 1.0, z: 0.0 };
    pub const Z: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 1.0 };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Linear interpolation
    pub fn lerp(self, other: Vec3, t: f32) -> Vec3 {
        Vec3 {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }

    /// Distance to another position
    pub fn distance(self, other: Vec3) -> f32 {
        (self - other).length()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, s: f32) -> Vec3 {
        Vec3::new(self.x * s, self.y * s, self.z * s)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

/// Unit quaternion rotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quat {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Quat = Quat {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// Rotation of `radians` around `axis` (need not be normalized)
    pub fn from_axis_angle(axis: Vec3, radians: f32) -> Self {
        let len = axis.length();
        if len < 1e-6 {
            return Self::IDENTITY;
        }
        let axis = axis * (1.0 / len);
        let (s, c) = (radians * 0.5).sin_cos();
        Quat {
            w: c,
            x: axis.x * s,
            y: axis.y * s,
            z: axis.z * s,
        }
    }

    /// Rotation from Euler angles in degrees, applied Z, then X, then Y
    pub fn from_euler_degrees(euler: Vec3) -> Self {
        let qx = Quat::from_axis_angle(Vec3::X, euler.x.to_radians());
        let qy = Quat::from_axis_angle(Vec3::Y, euler.y.to_radians());
        let qz = Quat::from_axis_angle(Vec3::Z, euler.z.to_radians());
        qy * qx * qz
    }

    pub fn dot(&self, other: &Quat) -> f32 {
        self.w * other.w + self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn conjugate(&self) -> Quat {
        Quat::new(self.w, -self.x, -self.y, -self.z)
    }

    pub fn normalize(&self) -> Quat {
        let len = self.dot(self).sqrt();
        if len < 0.0001 {
            return Quat::IDENTITY;
        }
        Quat {
            w: self.w / len,
            x: self.x / len,
            y: self.y / len,
            z: self.z / len,
        }
    }

    /// Rotate a vector
    pub fn rotate(&self, v: Vec3) -> Vec3 {
        let p = Quat::new(0.0, v.x, v.y, v.z);
        let r = *self * p * self.conjugate();
        Vec3::new(r.x, r.y, r.z)
    }

    /// Spherical linear interpolation along the shorter arc
    pub fn slerp(&self, other: &Quat, t: f32) -> Quat {
        let mut dot = self.dot(other);

        let other = if dot < 0.0 {
            dot = -dot;
            Quat::new(-other.w, -other.x, -other.y, -other.z)
        } else {
            *other
        };

        if dot > 0.9995 {
            // Nearly parallel: lerp and renormalize
            let result = Quat {
                w: self.w + (other.w - self.w) * t,
                x: self.x + (other.x - self.x) * t,
                y: self.y + (other.y - self.y) * t,
                z: self.z + (other.z - self.z) * t,
            };
            return result.normalize();
        }

        let theta_0 = dot.clamp(-1.0, 1.0).acos();
        let theta = theta_0 * t;
        let sin_theta_0 = theta_0.sin();

        let s0 = (theta_0 - theta).sin() / sin_theta_0;
        let s1 = theta.sin() / sin_theta_0;

        Quat {
            w: self.w * s0 + other.w * s1,
            x: self.x * s0 + other.x * s1,
            y: self.y * s0 + other.y * s1,
            z: self.z * s0 + other.z * s1,
        }
    }

    /// Angle between two rotations, radians in [0, π]
    pub fn angle_to(&self, other: &Quat) -> f32 {
        // atan2 form stays accurate near zero where acos(dot) does not
        let d = self.conjugate() * *other;
        let v = (d.x * d.x + d.y * d.y + d.z * d.z).sqrt();
        2.0 * v.atan2(d.w.abs())
    }

    /// Same rotation within `epsilon` radians (q and -q compare equal)
    pub fn approx_eq(&self, other: &Quat, epsilon: f32) -> bool {
        self.angle_to(other) <= epsilon
    }
}

/// Hamilton product: `a * b` applies `b` first, then `a`
impl Mul for Quat {
    type Output = Quat;
    fn mul(self, b: Quat) -> Quat {
        let a = self;
        Quat {
            w: a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
            x: a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            y: a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            z: a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
        }
    }
}
