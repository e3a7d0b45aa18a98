//! Headless Rollout
//!
//! Runs the ANYmal PD demo without a window and prints what the overlay
//! would plot: one telemetry sample per re-target, cleared at every pose
//! reset.
//!
//! This example demonstrates:
//! - Bootstrapping the demo world from the shipped scene
//! - Driving the controller with a fixed seed
//! - Reading joint speed/torque series from the telemetry buffer
//!
//! Run with: `cargo run --example headless_rollout`

use quadsim::config::AppConfig;
use quadsim_core::{
    ControllerConfig, DemoWorld, PdDemoController, Scene, SeriesKind, TelemetryBuffer,
};

/// Two and a half reset periods
const STEPS: u64 = 6250;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load()?;
    let scene = Scene::load(&config.scene.path)?;
    let mut demo = DemoWorld::bootstrap(
        &scene,
        &config.resources.locator(),
        &config.simulation.to_settings(),
    )?;
    let mut controller = PdDemoController::new(ControllerConfig {
        seed: Some(config.controller.seed.unwrap_or(1)),
        ..config.controller.clone()
    })?;
    let mut telemetry = TelemetryBuffer::new();

    let mut resets = 0;
    let mut retargets = 0;
    for _ in 0..STEPS {
        let outcome = demo.step(&mut controller, &mut telemetry)?;
        if outcome.pose_reset {
            resets += 1;
            log::info!("Pose reset at t = {:.3} s", demo.world_time());
        }
        if outcome.command.is_some() {
            retargets += 1;
        }
    }

    println!(
        "{} steps ({:.2} s simulated): {} resets, {} re-targets",
        STEPS,
        demo.world_time(),
        resets,
        retargets
    );
    println!(
        "{} samples since the last reset, elapsed {:.4} s",
        telemetry.len(),
        controller.elapsed()
    );

    for kind in SeriesKind::ALL {
        if let Some((lo, hi)) = telemetry.value_range(kind) {
            println!("{}: [{:.3}, {:.3}]", kind.label(), lo, hi);
        }
    }

    if let Some(latest) = telemetry.latest() {
        println!("latest sample at t = {:.3} s", latest.time);
        let joints = latest.joint_speed.iter().zip(&latest.joint_torque);
        for (joint, (speed, torque)) in joints.enumerate() {
            println!(
                "  joint {:2}: speed {:+8.3} rad/s  torque {:+8.3} N·m",
                joint, speed, torque
            );
        }
    }

    Ok(())
}
