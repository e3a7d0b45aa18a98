//! GPU-compatible data types for the render pipelines
//!
//! These types are designed to match the shader layouts exactly.
//! All types derive Pod and Zeroable for safe GPU buffer operations.

use bytemuck::{Pod, Zeroable};
use quadsim_math::mat4::{self, Mat4};

/// Most shadow cascades the scene shader can sample
pub const MAX_CASCADES: usize = 4;

/// A lit mesh vertex
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex3D {
    /// Position in world space (z up)
    pub position: [f32; 3],
    /// Surface normal for lighting
    pub normal: [f32; 3],
    /// RGBA color
    pub color: [f32; 4],
}

impl Vertex3D {
    pub fn new(position: [f32; 3], normal: [f32; 3], color: [f32; 4]) -> Self {
        Self { position, normal, color }
    }
}

impl Default for Vertex3D {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            normal: [0.0, 0.0, 1.0],
            color: [1.0; 4],
        }
    }
}

/// A 2D overlay vertex in normalized device coordinates
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct OverlayVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl OverlayVertex {
    pub fn new(position: [f32; 2], color: [f32; 4]) -> Self {
        Self { position, color }
    }
}

/// Uniforms for the lit scene pass
/// Layout: 400 bytes total (must match scene.wgsl SceneUniforms)
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SceneUniforms {
    /// Camera view-projection (64 bytes)
    pub view_projection: Mat4,
    /// Light view-projection per cascade (256 bytes)
    pub light_view_projection: [Mat4; MAX_CASCADES],
    /// Camera position + cascade count (16 bytes)
    pub camera_position: [f32; 3],
    pub cascade_count: u32,
    /// Direction the light travels + shadow switch (16 bytes)
    pub light_direction: [f32; 3],
    pub shadows_enabled: u32,
    /// Diffuse light color (16 bytes)
    pub light_color: [f32; 3],
    pub _padding: f32,
    /// Ambient color + shadow far distance (16 bytes)
    pub ambient_color: [f32; 3],
    pub shadow_far: f32,
    /// Far end of each cascade, distance from the camera (16 bytes)
    pub cascade_splits: [f32; MAX_CASCADES],
}

impl Default for SceneUniforms {
    fn default() -> Self {
        Self {
            view_projection: mat4::IDENTITY,
            light_view_projection: [mat4::IDENTITY; MAX_CASCADES],
            camera_position: [0.0; 3],
            cascade_count: 0,
            light_direction: [0.0, 0.0, -1.0],
            shadows_enabled: 0,
            light_color: [1.0; 3],
            _padding: 0.0,
            ambient_color: [0.3; 3],
            shadow_far: 10.0,
            cascade_splits: [0.0; MAX_CASCADES],
        }
    }
}

/// Uniforms for one shadow cascade pass
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ShadowUniforms {
    pub light_view_projection: Mat4,
}

/// Uniforms for the sky pass
/// Layout: 96 bytes total (must match sky.wgsl SkyUniforms)
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SkyUniforms {
    pub camera_right: [f32; 3],
    pub tan_half_fov: f32,
    pub camera_up: [f32; 3],
    pub aspect: f32,
    pub camera_forward: [f32; 3],
    pub _padding: f32,
    /// Sky dome rotation, columns padded to vec4
    pub sky_rotation: [[f32; 4]; 3],
}

impl SkyUniforms {
    /// Pack a column-major 3x3 rotation
    pub fn rotation_from_columns(columns: [[f32; 3]; 3]) -> [[f32; 4]; 3] {
        columns.map(|c| [c[0], c[1], c[2], 0.0])
    }
}
