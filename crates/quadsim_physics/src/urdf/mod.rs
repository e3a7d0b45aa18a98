//! URDF robot descriptions
//!
//! Parses the subset of URDF the simulator understands: links with inertial,
//! visual and collision data, joints with limits and dynamics, and named
//! materials.

mod error;
mod parser;
mod types;

use std::path::Path;

pub use error::UrdfError;
pub use parser::parse_urdf_str;
pub use types::{
    UrdfCollision, UrdfGeometry, UrdfInertia, UrdfInertial, UrdfJoint, UrdfJointDynamics,
    UrdfJointLimit, UrdfJointType, UrdfLink, UrdfMaterial, UrdfOrigin, UrdfRobot, UrdfVisual,
};

/// Read and parse a URDF file
pub fn load_urdf<P: AsRef<Path>>(path: P) -> Result<UrdfRobot, UrdfError> {
    let xml = std::fs::read_to_string(path)?;
    parse_urdf_str(&xml)
}
