//! Articulated rigid-body simulation for quadsim
//!
//! This crate provides just enough physics to animate a floating-base robot:
//! - URDF parsing into a kinematic tree
//! - Forward kinematics, joint-space mass matrix and bias forces
//! - Penalty ground contacts with anchored stick/slip friction
//! - Joint PD control with feed-forward torque and effort limits

pub mod articulated;
pub mod collision;
pub mod dynamics;
pub mod error;
pub mod linalg;
pub mod material;
pub mod model;
pub mod shapes;
pub mod urdf;
pub mod world;

// Re-export commonly used types
pub use articulated::{ArticulatedSystem, ContactInfo, ControlMode};
pub use collision::{sphere_vs_plane, CollisionLayer, Contact};
pub use dynamics::{JointSpaceDynamics, PointJacobian, JOINT_ARMATURE};
pub use error::PhysicsError;
pub use linalg::DenseMatrix;
pub use material::PhysicsMaterial;
pub use model::{
    ContactPoint, JointKind, JointLimits, KinematicTree, Kinematics, Link, LinkVisual, Pose,
};
pub use shapes::{Plane, Shape, Sphere};
pub use urdf::{load_urdf, parse_urdf_str, UrdfError, UrdfRobot};
pub use world::{Ground, GroundKey, PhysicsConfig, PhysicsWorld, SystemKey, DEFAULT_TIME_STEP};
