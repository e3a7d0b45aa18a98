//! Rendering pipeline components
//!
//! A frame runs the shadow passes, then sky, lit scene and overlay passes
//! into the same color target; the overlay pass resolves multisampling.

pub mod gpu_buffer;
pub mod overlay_pipeline;
pub mod scene_pipeline;
pub mod shadow_pipeline;
pub mod sky_pipeline;
pub mod targets;
pub mod types;

// Re-export types
pub use types::{OverlayVertex, SceneUniforms, ShadowUniforms, SkyUniforms, Vertex3D, MAX_CASCADES};

// Re-export pipelines
pub use gpu_buffer::{DynamicBuffer, MeshBuffers};
pub use overlay_pipeline::{OverlayGeometry, OverlayPipeline};
pub use scene_pipeline::{mesh_vertex_layout, ScenePipeline};
pub use shadow_pipeline::{cascade_matrices, cascade_splits, light_view_projection, ShadowPipeline};
pub use sky_pipeline::SkyPipeline;
pub use targets::{FrameTargets, DEPTH_FORMAT};
