//! Mathematics library for quadsim
//!
//! Rigid-body math for the simulator and matrix helpers for the renderer.
//!
//! ## Core Types
//!
//! - [`Vec3`] - 3D vector in double precision (simulation space, z-up)
//! - [`Quat`] - Unit quaternion for orientations
//! - [`Mat4`] - 4x4 single precision matrix (column-major, GPU layout)

mod vec3;
mod quat;
pub mod mat4;

pub use vec3::Vec3;
pub use quat::Quat;
pub use mat4::Mat4;
