//! Integration tests for the demo loop
//!
//! These tests drive the real ANYmal description through the controller:
//! 1. Bootstrapping from the default scene
//! 2. Reset and re-target cadence over two full reset periods
//! 3. Telemetry contents coming from the simulator
//! 4. The robot keeping its feet through a whole reset period

use std::path::PathBuf;

use quadsim_core::{
    ControllerConfig, DemoWorld, PdDemoController, ResourceLocator, Scene, SimulationSettings,
    TelemetryBuffer, ANYMAL_RESET_POSE,
};
use quadsim_math::Vec3;

fn locator() -> ResourceLocator {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../resources");
    ResourceLocator::new().with_root(root)
}

fn demo() -> DemoWorld {
    DemoWorld::bootstrap(&Scene::default(), &locator(), &SimulationSettings::default())
        .expect("default scene should bootstrap")
}

fn controller() -> PdDemoController {
    controller_with_seed(7)
}

fn controller_with_seed(seed: u64) -> PdDemoController {
    seeded_controller(seed, ControllerConfig::default().noise_std)
}

fn seeded_controller(seed: u64, noise_std: f64) -> PdDemoController {
    PdDemoController::new(ControllerConfig {
        seed: Some(seed),
        noise_std,
        ..ControllerConfig::default()
    })
    .unwrap()
}

/// Base height and the z component of the base's up axis
fn posture(demo: &DemoWorld) -> (f64, f64) {
    let robot = demo.robot().unwrap();
    let up = robot.base_pose().rotation.rotate(Vec3::Z);
    (robot.generalized_coordinate()[2], up.z)
}

#[test]
fn test_bootstrap_default_scene() {
    let demo = demo();
    let robot = demo.robot().unwrap();
    assert_eq!(robot.name(), "anymal");
    assert_eq!(robot.generalized_coordinate(), ANYMAL_RESET_POSE.to_vec());
    assert_eq!(robot.generalized_force(), &[0.0; 18]);
    assert_eq!(demo.time_step(), 0.0025);

    let (p, d) = robot.pd_gains();
    assert_eq!(&p[..6], &[0.0; 6]);
    assert!(p[6..].iter().all(|&g| g == 200.0));
    assert!(d[6..].iter().all(|&g| g == 10.0));
}

#[test]
fn test_two_reset_periods() {
    let mut demo = demo();
    let mut controller = controller();
    let mut telemetry = TelemetryBuffer::new();

    let mut resets = Vec::new();
    let mut retargets = 0;
    for call in 0..5001u64 {
        let outcome = demo.step(&mut controller, &mut telemetry).unwrap();
        if outcome.pose_reset {
            resets.push(call);
            // one integration step after the reset
            let (z, up) = posture(&demo);
            assert!((z - 0.54).abs() < 0.01, "base at {} right after reset", z);
            assert!(up > 0.999, "base tilted right after reset");
        }
        if let Some(command) = outcome.command {
            retargets += 1;
            assert_eq!(command.position_target.len(), 19);
            assert_eq!(command.sample.joint_speed.len(), 12);
            assert_eq!(command.sample.joint_torque.len(), 12);
            assert!(command.sample.joint_torque.iter().all(|t| t.abs() <= 80.0 + 1e-9));
            assert!(command.sample.joint_speed.iter().all(|v| v.is_finite()));
        }
        // fallen or not, the ground holds the robot up
        assert!(posture(&demo).0 > 0.05, "sank through the ground at call {}", call);
    }

    assert_eq!(resets, vec![0, 2500, 5000]);
    assert_eq!(retargets, 100);
    // cleared by the reset on the last call
    assert!(telemetry.is_empty());
    assert!((demo.world_time() - 5001.0 * 0.0025).abs() < 1e-6);

    let gc = demo.robot().unwrap().generalized_coordinate();
    assert!(gc.iter().all(|v| v.is_finite()));
}

#[test]
fn test_robot_stays_upright_under_random_targets() {
    for seed in [3, 7, 11] {
        let mut demo = demo();
        let mut controller = seeded_controller(seed, 0.1);
        let mut telemetry = TelemetryBuffer::new();

        for call in 0..2499 {
            demo.step(&mut controller, &mut telemetry).unwrap();
            let (z, up) = posture(&demo);
            assert!(z > 0.3, "seed {}: base down to {} at call {}", seed, z, call);
            assert!(up > 0.8, "seed {}: base tipped to {} at call {}", seed, up, call);
        }
        assert_eq!(telemetry.len(), 49);
        assert!(!demo.robot().unwrap().contacts().is_empty());

        let times = telemetry.times();
        assert!(times.windows(2).all(|w| w[1] > w[0]));
        assert!((times[0] - 49.0 * 0.0025).abs() < 1e-9);
    }
}

#[test]
fn test_default_noise_does_not_always_topple() {
    // single target windows can tip the robot, a whole batch of periods cannot
    let standing = [1, 2, 3, 7, 42, 99, 1234]
        .into_iter()
        .filter(|&seed| {
            let mut demo = demo();
            let mut controller = controller_with_seed(seed);
            let mut telemetry = TelemetryBuffer::new();
            for _ in 0..2499 {
                demo.step(&mut controller, &mut telemetry).unwrap();
            }
            let (z, up) = posture(&demo);
            z > 0.3 && up > 0.8
        })
        .count();
    assert!(standing >= 1, "every period ended on the ground");
}

#[test]
fn test_planted_feet_do_not_skate() {
    let mut demo = demo();
    let mut controller = seeded_controller(7, 0.0);
    let mut telemetry = TelemetryBuffer::new();

    for _ in 0..400 {
        demo.step(&mut controller, &mut telemetry).unwrap();
    }
    let start = demo.robot().unwrap().generalized_coordinate();
    for _ in 0..1000 {
        demo.step(&mut controller, &mut telemetry).unwrap();
    }
    let robot = demo.robot().unwrap();
    let end = robot.generalized_coordinate();

    let drift = (end[0] - start[0]).hypot(end[1] - start[1]);
    assert!(drift < 1e-3, "base drifted {} m while standing", drift);
    assert_eq!(robot.contacts().len(), 4);
    assert!(robot.contacts().iter().all(|c| !c.sliding));
}
