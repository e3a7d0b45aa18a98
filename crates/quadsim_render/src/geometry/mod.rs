//! Geometry generation for the viewer
//!
//! Primitive meshes, world placement, and robot/contact geometry built
//! from the simulator state.

pub mod placement;
pub mod primitives;
pub mod robot;

pub use placement::Placement;
pub use primitives::PrimitiveMesh;
pub use robot::{contact_geometry, robot_geometry, ContactStyle, VisualFlags};
