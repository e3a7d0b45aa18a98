//! Unit quaternion for 3D orientation
//!
//! Stored as `(w, x, y, z)`, which is also the order the orientation occupies
//! inside a floating-base generalized coordinate.

use serde::{Serialize, Deserialize};
use crate::Vec3;

/// Quaternion `w + xi + yj + zk`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Self = Self { w: 1.0, x: 0.0, y: 0.0, z: 0.0 };

    #[inline]
    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Rotation of `angle` radians about `axis` (need not be unit length)
    pub fn from_axis_angle(axis: Vec3, angle: f64) -> Self {
        let axis = axis.normalized();
        let half = angle * 0.5;
        let s = half.sin();
        Self::new(half.cos(), axis.x * s, axis.y * s, axis.z * s)
    }

    /// Fixed-axis roll/pitch/yaw (X, then Y, then Z), the URDF convention
    pub fn from_rpy(roll: f64, pitch: f64, yaw: f64) -> Self {
        let qx = Self::from_axis_angle(Vec3::X, roll);
        let qy = Self::from_axis_angle(Vec3::Y, pitch);
        let qz = Self::from_axis_angle(Vec3::Z, yaw);
        qz * qy * qx
    }

    /// Rotation vector exponential map (axis * angle)
    pub fn from_scaled_axis(v: Vec3) -> Self {
        let angle = v.length();
        if angle < 1e-12 {
            return Self::new(1.0, v.x * 0.5, v.y * 0.5, v.z * 0.5).normalized();
        }
        Self::from_axis_angle(v, angle)
    }

    /// Build from a `[w, x, y, z]` slice
    pub fn from_slice(values: &[f64]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }

    #[inline]
    pub fn norm(self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Normalize to unit length; a zero quaternion becomes the identity
    pub fn normalized(self) -> Self {
        let n = self.norm();
        if n > 1e-12 {
            Self::new(self.w / n, self.x / n, self.y / n, self.z / n)
        } else {
            Self::IDENTITY
        }
    }

    #[inline]
    pub fn conjugate(self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Rotate a vector by this (unit) quaternion
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let u = Vec3::new(self.x, self.y, self.z);
        let t = u.cross(v) * 2.0;
        v + t * self.w + u.cross(t)
    }

    /// Rotate a vector by the inverse of this (unit) quaternion
    pub fn inverse_rotate(self, v: Vec3) -> Vec3 {
        self.conjugate().rotate(v)
    }

    /// Integrate a world-frame angular velocity over `dt`
    pub fn integrate(self, angular_velocity: Vec3, dt: f64) -> Self {
        (Self::from_scaled_axis(angular_velocity * dt) * self).normalized()
    }

    /// Column-major 3x3 rotation, single precision, for rendering
    pub fn to_rotation_columns(self) -> [[f32; 3]; 3] {
        let c0 = self.rotate(Vec3::X).to_f32_array();
        let c1 = self.rotate(Vec3::Y).to_f32_array();
        let c2 = self.rotate(Vec3::Z).to_f32_array();
        [c0, c1, c2]
    }

    #[inline]
    pub fn to_array(self) -> [f64; 4] {
        [self.w, self.x, self.y, self.z]
    }
}

impl std::ops::Mul for Quat {
    type Output = Self;
    /// Hamilton product: `self * other` applies `other` first
    fn mul(self, o: Self) -> Self {
        Self::new(
            self.w * o.w - self.x * o.x - self.y * o.y - self.z * o.z,
            self.w * o.x + self.x * o.w + self.y * o.z - self.z * o.y,
            self.w * o.y - self.x * o.z + self.y * o.w + self.z * o.x,
            self.w * o.z + self.x * o.y - self.y * o.x + self.z * o.w,
        )
    }
}
