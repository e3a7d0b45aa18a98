//! Application systems
//!
//! Window, simulation and rendering, each owning its own state so the
//! event loop in `main.rs` only wires them together.

mod render;
mod simulation;
mod window;

pub use render::{RenderError, RenderSystem};
pub use simulation::{steps_due, FrameReport, SimulationSystem};
pub use window::{format_title, TitleStatus, WindowError, WindowSystem};
