//! Rendering for the quadsim viewer
//!
//! This crate draws the simulated robot, the ground and the telemetry
//! overlay with wgpu.
//!
//! ## Key Components
//!
//! - [`context::RenderContext`] - WGPU device, queue, and surface management
//! - [`camera::OrbitCamera`] - z-up orbit camera that can follow the robot
//! - [`pipeline::ShadowPipeline`] - cascaded depth maps from the sun light
//! - [`pipeline::ScenePipeline`] - lit, shadowed triangle meshes
//! - [`pipeline::SkyPipeline`] - procedural stormy sky behind the scene
//! - [`pipeline::OverlayPipeline`] - 2D panels and line plots
//! - [`renderable::RenderableGeometry`] - CPU meshes built from the robot state
//! - [`plot`] - telemetry to overlay line conversion

pub mod camera;
pub mod context;
pub mod geometry;
pub mod pipeline;
pub mod plot;
pub mod renderable;

pub use camera::OrbitCamera;
pub use context::{ContextError, RenderContext};
pub use geometry::{Placement, VisualFlags};
pub use renderable::{CheckerboardGeometry, RenderableGeometry};
