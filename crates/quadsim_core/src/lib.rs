//! Core of the quadsim demo
//!
//! This crate ties the simulator to the demo behaviour:
//!
//! - [`PdDemoController`] - periodic pose reset and randomized PD re-targeting
//! - [`PeriodicTimer`] - step-count cadence shared by the controller's actions
//! - [`TelemetryBuffer`] - joint speed/torque samples for the overlay plots
//! - [`Scene`] - RON scene description (ground, robot, light, sky, camera)
//! - [`ResourceLocator`] - resolves robot descriptions against resource roots
//! - [`DemoWorld`] - physics world bootstrapped from a scene

mod asset_error;
mod controller;
mod demo;
mod error;
mod resource;
mod scene;
mod telemetry;
mod timer;

pub use asset_error::AssetError;
pub use controller::{
    ControlCommand, ControllerConfig, PdDemoController, RobotHandle, StepOutcome,
    ANYMAL_REFERENCE_POSE, ANYMAL_RESET_POSE,
};
pub use demo::{DemoError, DemoWorld, SimulationSettings};
pub use error::ControlError;
pub use resource::ResourceLocator;
pub use scene::{
    CameraSettings, ContactVisSettings, GroundSettings, LightSettings, RobotSettings, Scene,
    SceneLoadError, ShadowSettings, ShadowTechnique, SkySettings,
};
pub use telemetry::{SeriesKind, TelemetryBuffer, TelemetrySample, TelemetrySink};
pub use timer::PeriodicTimer;

// Re-export the simulator types callers need alongside the demo world
pub use quadsim_physics::{ArticulatedSystem, ContactInfo, PhysicsConfig, PhysicsWorld, Pose};
