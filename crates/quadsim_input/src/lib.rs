//! Input handling for the quadsim viewer
//!
//! This crate turns raw window input into camera motion (orbit, zoom,
//! free-look movement) and simulation toggles (pause, single step, reset,
//! debug layers).

mod camera_controller;
mod toggles;

pub use camera_controller::{CameraControl, CameraController};
pub use toggles::{SimulationToggles, ToggleAction};
