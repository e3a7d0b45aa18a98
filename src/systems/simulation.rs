//! Simulation system
//!
//! Drives the demo world at real time:
//! - Frame delta measurement
//! - Fixed-step accumulation with a per-frame step cap
//! - Pause, single-step and reset requests

use std::time::Instant;

use quadsim_core::{DemoError, DemoWorld, PdDemoController, TelemetryBuffer};
use quadsim_input::SimulationToggles;

use crate::config::SimulationConfig;

/// What one simulation frame did
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameReport {
    /// Physics steps taken
    pub steps: u32,
    pub resets: u32,
    pub retargets: u32,
    /// Wall time discarded because the step cap was hit, seconds
    pub dropped_time: f64,
}

/// Number of whole steps in `accumulator`, capped at `max_steps`
///
/// Returns the step count and the time left over. Time beyond the cap is
/// dropped rather than carried, so a long stall never triggers a burst of
/// catch-up steps.
pub fn steps_due(accumulator: f64, time_step: f64, max_steps: u32) -> (u32, f64) {
    if time_step <= 0.0 || accumulator < time_step {
        return (0, accumulator.max(0.0));
    }
    let whole = (accumulator / time_step).floor();
    if whole > max_steps as f64 {
        (max_steps, 0.0)
    } else {
        (whole as u32, accumulator - whole * time_step)
    }
}

/// Owns the demo world, its controller and the telemetry they produce
pub struct SimulationSystem {
    demo: DemoWorld,
    controller: PdDemoController,
    telemetry: TelemetryBuffer,
    accumulator: f64,
    max_steps_per_frame: u32,
    real_time_factor: f64,
    last_frame: Instant,
}

impl SimulationSystem {
    pub fn new(
        demo: DemoWorld,
        controller: PdDemoController,
        telemetry: TelemetryBuffer,
        config: &SimulationConfig,
    ) -> Self {
        Self {
            demo,
            controller,
            telemetry,
            accumulator: 0.0,
            max_steps_per_frame: config.max_steps_per_frame.max(1),
            real_time_factor: config.real_time_factor.max(0.0),
            last_frame: Instant::now(),
        }
    }

    /// Wall time since the previous call, seconds
    ///
    /// Capped at a quarter second so a stalled window does not count as
    /// simulated time.
    pub fn frame_delta(&mut self) -> f64 {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f64().min(0.25);
        self.last_frame = now;
        dt
    }

    /// Advance the simulation by `dt` seconds of wall time
    pub fn update(
        &mut self,
        dt: f64,
        toggles: &mut SimulationToggles,
    ) -> Result<FrameReport, DemoError> {
        let mut report = FrameReport::default();

        // A reset rewinds the controller so its next call is a reset tick;
        // that call runs now even while paused.
        let reset = toggles.take_reset_request();
        if reset {
            self.controller.restart();
            log::info!("Robot reset requested");
        }

        let steps = if toggles.paused {
            self.accumulator = 0.0;
            let single = toggles.take_step_request();
            u32::from(single || reset)
        } else {
            let time_step = self.demo.time_step();
            self.accumulator += dt * self.real_time_factor;
            let (due, remaining) = steps_due(self.accumulator, time_step, self.max_steps_per_frame);
            if due == self.max_steps_per_frame && remaining == 0.0 {
                report.dropped_time = self.accumulator - due as f64 * time_step;
                if report.dropped_time > 0.0 {
                    log::debug!(
                        "Simulation behind real time, dropping {:.4} s",
                        report.dropped_time
                    );
                }
            }
            self.accumulator = remaining;
            due.max(u32::from(reset))
        };

        for _ in 0..steps {
            let outcome = self.demo.step(&mut self.controller, &mut self.telemetry)?;
            report.steps += 1;
            report.resets += u32::from(outcome.pose_reset);
            report.retargets += u32::from(outcome.command.is_some());
        }

        Ok(report)
    }

    pub fn demo(&self) -> &DemoWorld {
        &self.demo
    }

    pub fn controller(&self) -> &PdDemoController {
        &self.controller
    }

    pub fn telemetry(&self) -> &TelemetryBuffer {
        &self.telemetry
    }

    /// Base position of the robot, for the follow camera
    pub fn robot_base(&self) -> Option<[f32; 3]> {
        self.demo
            .robot()
            .map(|robot| robot.base_pose().position.to_f32_array())
    }
}
