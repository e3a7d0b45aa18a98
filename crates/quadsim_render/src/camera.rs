//! Orbit camera for a z-up world
//!
//! The camera looks at a target point from `distance` away. Yaw turns the
//! view direction about the world z axis (yaw 0 looks along +x) and a
//! negative pitch looks down at the target. In follow mode the target
//! tracks a point, usually the robot base, plus an offset the user can
//! move with the free-look keys.

use quadsim_input::CameraControl;
use quadsim_math::mat4::{self, Mat4};

const MIN_DISTANCE: f32 = 0.2;
const MAX_DISTANCE: f32 = 100.0;
const PITCH_LIMIT: f32 = 89.0 * std::f32::consts::PI / 180.0;

/// World up axis
pub const UP: [f32; 3] = [0.0, 0.0, 1.0];

#[derive(Clone, Debug, PartialEq)]
pub struct OrbitCamera {
    target: [f32; 3],
    follow_offset: [f32; 3],
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    /// Vertical field of view, radians
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    pub follow: bool,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(0.0, -std::f32::consts::FRAC_PI_4, 2.0)
    }
}

impl OrbitCamera {
    pub fn new(yaw: f32, pitch: f32, distance: f32) -> Self {
        Self {
            target: [0.0; 3],
            follow_offset: [0.0; 3],
            yaw,
            pitch: pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            distance: distance.clamp(MIN_DISTANCE, MAX_DISTANCE),
            fov_y: 45f32.to_radians(),
            near: 0.05,
            far: 1000.0,
            follow: true,
        }
    }

    /// Builder: set the projection
    pub fn with_projection(mut self, fov_y_degrees: f32, near: f32, far: f32) -> Self {
        self.fov_y = fov_y_degrees.to_radians();
        self.near = near;
        self.far = far;
        self
    }

    /// Builder: set follow mode
    pub fn with_follow(mut self, follow: bool) -> Self {
        self.follow = follow;
        self
    }

    /// Unit view direction
    pub fn forward(&self) -> [f32; 3] {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        [cp * cy, cp * sy, sp]
    }

    /// Unit right vector, always horizontal
    pub fn right(&self) -> [f32; 3] {
        let (sy, cy) = self.yaw.sin_cos();
        [sy, -cy, 0.0]
    }

    /// Unit up vector of the view
    pub fn up(&self) -> [f32; 3] {
        let f = self.forward();
        let r = self.right();
        [
            r[1] * f[2] - r[2] * f[1],
            r[2] * f[0] - r[0] * f[2],
            r[0] * f[1] - r[1] * f[0],
        ]
    }

    pub fn eye(&self) -> [f32; 3] {
        let f = self.forward();
        [
            self.target[0] - f[0] * self.distance,
            self.target[1] - f[1] * self.distance,
            self.target[2] - f[2] * self.distance,
        ]
    }

    pub fn target(&self) -> [f32; 3] {
        self.target
    }

    /// Place the target, dropping any follow offset
    pub fn set_target(&mut self, target: [f32; 3]) {
        self.target = target;
        self.follow_offset = [0.0; 3];
    }

    /// Track `anchor` when following
    pub fn follow_point(&mut self, anchor: [f32; 3]) {
        if self.follow {
            for axis in 0..3 {
                self.target[axis] = anchor[axis] + self.follow_offset[axis];
            }
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        mat4::look_at(self.eye(), self.target, UP)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        mat4::perspective(self.fov_y, aspect, self.near, self.far)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        mat4::mul(self.projection_matrix(aspect), self.view_matrix())
    }
}

impl CameraControl for OrbitCamera {
    fn translate(&mut self, forward: f32, right: f32, up: f32) {
        let (sy, cy) = self.yaw.sin_cos();
        let delta = [
            cy * forward + sy * right,
            sy * forward - cy * right,
            up,
        ];
        for axis in 0..3 {
            self.target[axis] += delta[axis];
            self.follow_offset[axis] += delta[axis];
        }
    }

    fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw = (self.yaw + delta_yaw) % std::f32::consts::TAU;
        self.pitch = (self.pitch + delta_pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    fn zoom(&mut self, factor: f32) {
        self.distance = (self.distance * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    fn target(&self) -> [f32; 3] {
        self.target
    }
}
