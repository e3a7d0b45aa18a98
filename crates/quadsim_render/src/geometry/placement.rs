//! Rigid placement of local-frame geometry into the world

use quadsim_math::{Quat, Vec3};
use quadsim_physics::Pose;

/// Rotation and translation in single precision
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Column-major rotation
    pub rotation: [[f32; 3]; 3],
    pub translation: [f32; 3],
}

impl Placement {
    pub const IDENTITY: Self = Self {
        rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        translation: [0.0; 3],
    };

    pub fn from_pose(pose: &Pose) -> Self {
        Self {
            rotation: pose.rotation.to_rotation_columns(),
            translation: pose.position.to_f32_array(),
        }
    }

    pub fn from_translation(translation: [f32; 3]) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Placement whose local z axis points along `direction`, starting at `origin`
    pub fn aligned_z(origin: Vec3, direction: Vec3) -> Self {
        let dir = direction.normalized();
        let axis = Vec3::Z.cross(dir);
        let cos = Vec3::Z.dot(dir).clamp(-1.0, 1.0);
        let rotation = if axis.length_squared() > 1e-12 {
            Quat::from_axis_angle(axis.normalized(), cos.acos())
        } else if cos < 0.0 {
            Quat::from_axis_angle(Vec3::X, std::f64::consts::PI)
        } else {
            Quat::IDENTITY
        };
        Self::from_pose(&Pose::new(origin, rotation))
    }

    pub fn transform_point(&self, p: [f32; 3]) -> [f32; 3] {
        let r = self.rotate(p);
        [
            r[0] + self.translation[0],
            r[1] + self.translation[1],
            r[2] + self.translation[2],
        ]
    }

    pub fn rotate(&self, v: [f32; 3]) -> [f32; 3] {
        let c = &self.rotation;
        [
            c[0][0] * v[0] + c[1][0] * v[1] + c[2][0] * v[2],
            c[0][1] * v[0] + c[1][1] * v[1] + c[2][1] * v[2],
            c[0][2] * v[0] + c[1][2] * v[1] + c[2][2] * v[2],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: [f32; 3], b: [f32; 3]) -> bool {
        (0..3).all(|i| (a[i] - b[i]).abs() < EPSILON)
    }

    #[test]
    fn test_from_pose() {
        let pose = Pose::new(
            Vec3::new(1.0, 0.0, 0.5),
            Quat::from_axis_angle(Vec3::Z, std::f64::consts::FRAC_PI_2),
        );
        let placement = Placement::from_pose(&pose);
        assert!(approx_eq(placement.transform_point([1.0, 0.0, 0.0]), [1.0, 1.0, 0.5]));
        assert!(approx_eq(placement.rotate([0.0, 1.0, 0.0]), [-1.0, 0.0, 0.0]));
    }

    #[test]
    fn test_aligned_z() {
        let placement = Placement::aligned_z(Vec3::ZERO, Vec3::new(0.0, 2.0, 0.0));
        assert!(approx_eq(placement.rotate([0.0, 0.0, 1.0]), [0.0, 1.0, 0.0]));

        let down = Placement::aligned_z(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        assert!(approx_eq(down.rotate([0.0, 0.0, 1.0]), [0.0, 0.0, -1.0]));

        let up = Placement::aligned_z(Vec3::new(0.0, 0.0, 1.0), Vec3::Z);
        assert!(approx_eq(up.transform_point([0.0, 0.0, 0.5]), [0.0, 0.0, 1.5]));
    }
}
