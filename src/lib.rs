//! quadsim - ANYmal PD control demo
//!
//! Library half of the viewer binary: configuration loading and the
//! window, simulation and render systems.

pub mod config;
pub mod systems;
