//! Scene description
//!
//! A [`Scene`] bundles everything the demo sets up once at startup: the
//! ground, which robot to load and how to pose it, lighting, shadows, sky,
//! camera and contact visualisation. Scenes are RON files; every section
//! falls back to the ANYmal demo defaults when omitted.

use std::f64::consts::FRAC_PI_2;
use std::f32::consts::FRAC_PI_4;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use quadsim_math::{Quat, Vec3};

use crate::controller::ANYMAL_RESET_POSE;

/// A serializable scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    /// Scene name (for display/debugging)
    pub name: String,
    pub ground: GroundSettings,
    pub robot: RobotSettings,
    pub lighting: LightSettings,
    pub shadows: ShadowSettings,
    pub sky: SkySettings,
    pub camera: CameraSettings,
    pub contacts: ContactVisSettings,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            name: "ANYmal PD demo".to_string(),
            ground: GroundSettings::default(),
            robot: RobotSettings::default(),
            lighting: LightSettings::default(),
            shadows: ShadowSettings::default(),
            sky: SkySettings::default(),
            camera: CameraSettings::default(),
            contacts: ContactVisSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundSettings {
    /// Height of the ground plane
    pub height: f64,
    /// Drawn half-extent of the checkerboard, metres
    pub visual_size: f32,
    /// Edge length of one checker square
    pub checker_size: f32,
    /// Named contact material (`steel`, `rubber`, `concrete`, `ice`)
    pub material: String,
    /// Overrides the named material's friction
    pub friction: Option<f64>,
    /// Overrides the named material's restitution
    pub restitution: Option<f64>,
}

impl Default for GroundSettings {
    fn default() -> Self {
        Self {
            height: 0.0,
            visual_size: 10.0,
            checker_size: 0.5,
            material: "steel".to_string(),
            friction: None,
            restitution: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotSettings {
    /// Robot description, relative to a resource root
    pub resource: String,
    pub name: String,
    /// Generalized coordinate at startup
    pub initial_pose: Vec<f64>,
    /// Proportional gain on the actuated joints
    pub p_gain: f64,
    /// Derivative gain on the actuated joints
    pub d_gain: f64,
    /// Trailing generalized velocity entries that receive the gains
    pub actuated_joints: usize,
}

impl Default for RobotSettings {
    fn default() -> Self {
        Self {
            resource: "anymal/anymal.urdf".to_string(),
            name: "anymal".to_string(),
            initial_pose: ANYMAL_RESET_POSE.to_vec(),
            p_gain: 200.0,
            d_gain: 10.0,
            actuated_joints: 12,
        }
    }
}

impl RobotSettings {
    /// Gain vectors of length `dof`: zero on the base, configured gains on the tail
    pub fn gain_vectors(&self, dof: usize) -> (Vec<f64>, Vec<f64>) {
        let start = dof.saturating_sub(self.actuated_joints);
        let mut p = vec![0.0; dof];
        let mut d = vec![0.0; dof];
        p[start..].fill(self.p_gain);
        d[start..].fill(self.d_gain);
        (p, d)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightSettings {
    /// Direction the light travels (need not be normalized)
    pub direction: [f64; 3],
    pub diffuse: [f32; 3],
    pub ambient: [f32; 3],
    pub cast_shadows: bool,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            direction: [-3.0, -3.0, -0.5],
            diffuse: [1.0, 1.0, 1.0],
            ambient: [0.25, 0.25, 0.28],
            cast_shadows: true,
        }
    }
}

impl LightSettings {
    /// Normalized light direction
    pub fn unit_direction(&self) -> Vec3 {
        Vec3::from(self.direction).normalized()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadowTechnique {
    /// Shadow maps split over the view distance
    Cascaded,
    /// One shadow map
    Single,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowSettings {
    pub technique: ShadowTechnique,
    pub texture_size: u32,
    pub texture_count: u32,
    /// Shadows are not drawn beyond this distance from the camera
    pub far_distance: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            technique: ShadowTechnique::Cascaded,
            texture_size: 2048,
            texture_count: 3,
            far_distance: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkySettings {
    pub enabled: bool,
    pub material: String,
    pub distance: f32,
    /// Rotation axis of the sky dome
    pub rotation_axis: [f64; 3],
    /// Rotation angle about `rotation_axis`, radians
    pub rotation_angle: f64,
}

impl Default for SkySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            material: "Examples/StormySkyBox".to_string(),
            distance: 500.0,
            rotation_axis: [1.0, 0.0, 0.0],
            rotation_angle: FRAC_PI_2,
        }
    }
}

impl SkySettings {
    pub fn rotation(&self) -> Quat {
        Quat::from_axis_angle(Vec3::from(self.rotation_axis), self.rotation_angle)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Orbit speed, degrees per 1000 px of mouse drag
    pub speed: f32,
    /// Free-look movement top speed, m/s
    pub top_speed: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    /// Keep the camera centred on the robot base
    pub follow_robot: bool,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            speed: 300.0,
            top_speed: 5.0,
            yaw: 0.0,
            pitch: -FRAC_PI_4,
            distance: 2.0,
            follow_robot: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactVisSettings {
    /// Contact marker diameter
    pub point_size: f32,
    /// Length of the arrow for the largest contact force
    pub force_scale: f32,
}

impl Default for ContactVisSettings {
    fn default() -> Self {
        Self {
            point_size: 0.03,
            force_scale: 0.6,
        }
    }
}

impl Scene {
    /// Load a scene from a RON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SceneLoadError> {
        let contents = fs::read_to_string(path)?;
        let scene = ron::from_str(&contents)?;
        Ok(scene)
    }
}

/// Error loading a scene
#[derive(Debug)]
pub enum SceneLoadError {
    /// IO error (file not found, permission denied, etc.)
    Io(io::Error),
    /// Parse error (invalid RON syntax)
    Parse(ron::error::SpannedError),
}

impl From<io::Error> for SceneLoadError {
    fn from(e: io::Error) -> Self {
        SceneLoadError::Io(e)
    }
}

impl From<ron::error::SpannedError> for SceneLoadError {
    fn from(e: ron::error::SpannedError) -> Self {
        SceneLoadError::Parse(e)
    }
}

impl std::fmt::Display for SceneLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneLoadError::Io(e) => write!(f, "IO error: {}", e),
            SceneLoadError::Parse(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for SceneLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SceneLoadError::Io(e) => Some(e),
            SceneLoadError::Parse(e) => Some(e),
        }
    }
}
