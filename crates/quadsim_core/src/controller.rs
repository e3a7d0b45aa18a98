//! Periodic PD demo controller
//!
//! Called once per physics step. Two cadences share a single step counter:
//!
//! - **reset**, checked on the counter *before* it is incremented: the robot
//!   is put back into the reset pose, telemetry is cleared and the elapsed
//!   time restarts at zero. Counter value 0 is a reset tick, so the very
//!   first call always resets.
//! - **re-target**, checked on the counter *after* it is incremented: the
//!   reference pose is perturbed with Gaussian noise and issued as the PD
//!   position target together with an all-zero velocity target, and one
//!   telemetry sample is recorded.
//!
//! With the default periods (2500 and 50) the first re-target happens on the
//! 50th call and a reset tick never re-targets.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use quadsim_physics::ArticulatedSystem;

use crate::error::ControlError;
use crate::telemetry::{TelemetrySample, TelemetrySink};
use crate::timer::PeriodicTimer;

/// Nominal standing pose the robot is reset into
pub const ANYMAL_RESET_POSE: [f64; 19] = [
    0.0, 0.0, 0.54, 1.0, 0.0, 0.0, 0.0, 0.03, 0.4, -0.8, -0.03, 0.4, -0.8, 0.03, -0.4, 0.8, -0.03,
    -0.4, 0.8,
];

/// Pose the random targets are centred on
pub const ANYMAL_REFERENCE_POSE: [f64; 19] = [
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.03, 0.3, -0.6, -0.03, 0.3, -0.6, 0.03, -0.3, 0.6, -0.03,
    -0.3, 0.6,
];

/// The robot operations the controller needs
pub trait RobotHandle {
    fn generalized_coordinate_dim(&self) -> usize;
    fn dof(&self) -> usize;
    fn set_generalized_coordinate(&mut self, gc: &[f64]) -> Result<(), ControlError>;
    fn set_pd_target(&mut self, position: &[f64], velocity: &[f64]) -> Result<(), ControlError>;
    fn generalized_force(&self) -> Vec<f64>;
    fn generalized_velocity(&self) -> Vec<f64>;
}

impl RobotHandle for ArticulatedSystem {
    fn generalized_coordinate_dim(&self) -> usize {
        ArticulatedSystem::generalized_coordinate_dim(self)
    }

    fn dof(&self) -> usize {
        ArticulatedSystem::dof(self)
    }

    fn set_generalized_coordinate(&mut self, gc: &[f64]) -> Result<(), ControlError> {
        Ok(ArticulatedSystem::set_generalized_coordinate(self, gc)?)
    }

    fn set_pd_target(&mut self, position: &[f64], velocity: &[f64]) -> Result<(), ControlError> {
        Ok(ArticulatedSystem::set_pd_target(self, position, velocity)?)
    }

    fn generalized_force(&self) -> Vec<f64> {
        ArticulatedSystem::generalized_force(self).to_vec()
    }

    fn generalized_velocity(&self) -> Vec<f64> {
        ArticulatedSystem::generalized_velocity(self)
    }
}

/// Controller settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Steps between pose resets
    pub reset_period: u64,
    /// Steps between re-targets
    pub control_period: u64,
    /// Standard deviation of the target perturbation
    pub noise_std: f64,
    /// Fixed RNG seed; `None` seeds from the OS
    pub seed: Option<u64>,
    /// Perturb only the last N coordinates; `None` perturbs all of them
    pub perturbed_tail: Option<usize>,
    /// Number of trailing velocity/force entries recorded as telemetry
    pub telemetry_joints: usize,
    pub reset_pose: Vec<f64>,
    pub reference_pose: Vec<f64>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            reset_period: 2500,
            control_period: 50,
            noise_std: 0.2,
            seed: None,
            perturbed_tail: None,
            telemetry_joints: 12,
            reset_pose: ANYMAL_RESET_POSE.to_vec(),
            reference_pose: ANYMAL_REFERENCE_POSE.to_vec(),
        }
    }
}

/// Target issued on a re-target tick
#[derive(Clone, Debug, PartialEq)]
pub struct ControlCommand {
    pub position_target: Vec<f64>,
    pub velocity_target: Vec<f64>,
    /// The telemetry recorded alongside
    pub sample: TelemetrySample,
}

/// What one controller call did
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepOutcome {
    pub pose_reset: bool,
    pub command: Option<ControlCommand>,
}

/// Stateful controller; one instance per robot
#[derive(Debug)]
pub struct PdDemoController {
    config: ControllerConfig,
    reset_timer: PeriodicTimer,
    control_timer: PeriodicTimer,
    noise: Normal<f64>,
    rng: StdRng,
    elapsed: f64,
    counter: u64,
}

impl PdDemoController {
    pub fn new(config: ControllerConfig) -> Result<Self, ControlError> {
        let reset_timer = PeriodicTimer::new(config.reset_period)?;
        let control_timer = PeriodicTimer::new(config.control_period)?;
        if !(config.noise_std.is_finite() && config.noise_std >= 0.0) {
            return Err(ControlError::InvalidNoise(config.noise_std));
        }
        let noise = Normal::new(0.0, config.noise_std)
            .map_err(|_| ControlError::InvalidNoise(config.noise_std))?;
        if config.reference_pose.len() != config.reset_pose.len() {
            return Err(ControlError::DimensionMismatch {
                what: "reference pose",
                expected: config.reset_pose.len(),
                actual: config.reference_pose.len(),
            });
        }
        if let Some(tail) = config.perturbed_tail {
            if tail > config.reference_pose.len() {
                return Err(ControlError::DimensionMismatch {
                    what: "perturbed tail",
                    expected: config.reference_pose.len(),
                    actual: tail,
                });
            }
        }
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            config,
            reset_timer,
            control_timer,
            noise,
            rng,
            elapsed: 0.0,
            counter: 0,
        })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Seconds since the last pose reset
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Number of calls so far
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Rewind so the next call is a reset tick
    pub fn restart(&mut self) {
        self.counter = 0;
        self.elapsed = 0.0;
    }

    /// Run one control tick
    ///
    /// Dimensions are checked before any state changes, so a rejected call
    /// leaves the counter and the elapsed time untouched.
    pub fn step<R, T>(
        &mut self,
        dt: f64,
        robot: &mut R,
        telemetry: &mut T,
    ) -> Result<StepOutcome, ControlError>
    where
        R: RobotHandle + ?Sized,
        T: TelemetrySink + ?Sized,
    {
        let dim = robot.generalized_coordinate_dim();
        if self.config.reset_pose.len() != dim {
            return Err(ControlError::DimensionMismatch {
                what: "reset pose",
                expected: dim,
                actual: self.config.reset_pose.len(),
            });
        }
        let dof = robot.dof();
        if dof + 1 != dim {
            return Err(ControlError::DimensionMismatch {
                what: "generalized velocity",
                expected: dim.saturating_sub(1),
                actual: dof,
            });
        }

        self.elapsed += dt;

        let pose_reset = self.reset_timer.is_due(self.counter);
        if pose_reset {
            robot.set_generalized_coordinate(&self.config.reset_pose)?;
            telemetry.clear();
            self.elapsed = 0.0;
            log::debug!("Pose reset at step {}", self.counter);
        }

        self.counter += 1;

        if !self.control_timer.is_due(self.counter) {
            return Ok(StepOutcome {
                pose_reset,
                command: None,
            });
        }

        let position_target = self.perturbed_reference();
        let velocity_target = vec![0.0; dof];
        robot.set_pd_target(&position_target, &velocity_target)?;

        let joints = self.config.telemetry_joints;
        let sample = TelemetrySample {
            time: self.elapsed,
            joint_speed: tail(&robot.generalized_velocity(), joints),
            joint_torque: tail(&robot.generalized_force(), joints),
        };
        telemetry.push(sample.clone());

        Ok(StepOutcome {
            pose_reset,
            command: Some(ControlCommand {
                position_target,
                velocity_target,
                sample,
            }),
        })
    }

    fn perturbed_reference(&mut self) -> Vec<f64> {
        let mut target = self.config.reference_pose.clone();
        let len = target.len();
        let start = len - self.config.perturbed_tail.unwrap_or(len);
        for value in &mut target[start..] {
            *value += self.noise.sample(&mut self.rng);
        }
        target
    }
}

fn tail(values: &[f64], n: usize) -> Vec<f64> {
    values[values.len().saturating_sub(n)..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::TelemetryBuffer;

    /// Records what the controller asks of it
    struct StubRobot {
        gc: Vec<f64>,
        dof: usize,
        position_target: Option<Vec<f64>>,
        velocity_target: Option<Vec<f64>>,
        resets: usize,
        targets: usize,
    }

    impl StubRobot {
        fn new() -> Self {
            Self {
                gc: vec![0.0; 19],
                dof: 18,
                position_target: None,
                velocity_target: None,
                resets: 0,
                targets: 0,
            }
        }
    }

    impl RobotHandle for StubRobot {
        fn generalized_coordinate_dim(&self) -> usize {
            19
        }

        fn dof(&self) -> usize {
            self.dof
        }

        fn set_generalized_coordinate(&mut self, gc: &[f64]) -> Result<(), ControlError> {
            self.gc = gc.to_vec();
            self.resets += 1;
            Ok(())
        }

        fn set_pd_target(
            &mut self,
            position: &[f64],
            velocity: &[f64],
        ) -> Result<(), ControlError> {
            self.position_target = Some(position.to_vec());
            self.velocity_target = Some(velocity.to_vec());
            self.targets += 1;
            Ok(())
        }

        fn generalized_force(&self) -> Vec<f64> {
            (0..18).map(|i| i as f64).collect()
        }

        fn generalized_velocity(&self) -> Vec<f64> {
            (0..18).map(|i| -(i as f64)).collect()
        }
    }

    fn seeded(seed: u64) -> PdDemoController {
        PdDemoController::new(ControllerConfig {
            seed: Some(seed),
            ..ControllerConfig::default()
        })
        .unwrap()
    }

    const DT: f64 = 0.0025;

    #[test]
    fn test_first_call_resets() {
        let mut controller = seeded(1);
        let mut robot = StubRobot::new();
        let mut telemetry = TelemetryBuffer::new();

        let outcome = controller.step(DT, &mut robot, &mut telemetry).unwrap();
        assert!(outcome.pose_reset);
        assert!(outcome.command.is_none());
        assert_eq!(robot.gc, ANYMAL_RESET_POSE.to_vec());
        assert_eq!(controller.elapsed(), 0.0);
        assert_eq!(controller.counter(), 1);
    }

    #[test]
    fn test_retarget_on_fiftieth_call() {
        let mut controller = seeded(2);
        let mut robot = StubRobot::new();
        let mut telemetry = TelemetryBuffer::new();

        for call in 1..=49 {
            let outcome = controller.step(DT, &mut robot, &mut telemetry).unwrap();
            assert!(outcome.command.is_none(), "call {} should not re-target", call);
        }
        assert!(telemetry.is_empty());
        assert_eq!(robot.targets, 0);

        let outcome = controller.step(DT, &mut robot, &mut telemetry).unwrap();
        let command = outcome.command.expect("50th call re-targets");
        assert!(!outcome.pose_reset);
        assert_eq!(command.velocity_target, vec![0.0; 18]);
        assert_eq!(robot.velocity_target, Some(vec![0.0; 18]));
        assert_eq!(robot.position_target, Some(command.position_target.clone()));
        assert_eq!(telemetry.len(), 1);
        assert!((command.sample.time - 49.0 * DT).abs() < 1e-12);
    }

    #[test]
    fn test_telemetry_records_joint_tail() {
        let mut controller = seeded(3);
        let mut robot = StubRobot::new();
        let mut telemetry = TelemetryBuffer::new();
        for _ in 0..50 {
            controller.step(DT, &mut robot, &mut telemetry).unwrap();
        }
        let sample = telemetry.latest().unwrap();
        assert_eq!(sample.joint_torque, (6..18).map(|i| i as f64).collect::<Vec<_>>());
        assert_eq!(sample.joint_speed, (6..18).map(|i| -(i as f64)).collect::<Vec<_>>());
    }

    #[test]
    fn test_every_coordinate_perturbed_by_default() {
        let mut controller = seeded(4);
        let mut robot = StubRobot::new();
        let mut telemetry = TelemetryBuffer::new();
        for _ in 0..50 {
            controller.step(DT, &mut robot, &mut telemetry).unwrap();
        }
        let target = robot.position_target.unwrap();
        assert_eq!(target.len(), 19);
        let changed = target
            .iter()
            .zip(ANYMAL_REFERENCE_POSE.iter())
            .filter(|(a, b)| a != b)
            .count();
        assert_eq!(changed, 19);
    }

    #[test]
    fn test_perturbed_tail_leaves_base_untouched() {
        let mut controller = PdDemoController::new(ControllerConfig {
            seed: Some(5),
            perturbed_tail: Some(12),
            ..ControllerConfig::default()
        })
        .unwrap();
        let mut robot = StubRobot::new();
        let mut telemetry = TelemetryBuffer::new();
        for _ in 0..50 {
            controller.step(DT, &mut robot, &mut telemetry).unwrap();
        }
        let target = robot.position_target.unwrap();
        assert_eq!(&target[..7], &ANYMAL_REFERENCE_POSE[..7]);
        assert!(target[7..]
            .iter()
            .zip(&ANYMAL_REFERENCE_POSE[7..])
            .all(|(a, b)| a != b));
    }

    #[test]
    fn test_reset_every_2500_calls() {
        let mut controller = seeded(6);
        let mut robot = StubRobot::new();
        let mut telemetry = TelemetryBuffer::new();

        let mut reset_calls = Vec::new();
        for call in 0..5001u64 {
            let outcome = controller.step(DT, &mut robot, &mut telemetry).unwrap();
            if outcome.pose_reset {
                reset_calls.push(call);
                assert!(telemetry.is_empty());
                assert_eq!(controller.elapsed(), 0.0);
            }
            // reset ticks never re-target with the default periods
            assert!(!(outcome.pose_reset && outcome.command.is_some()));
        }
        assert_eq!(reset_calls, vec![0, 2500, 5000]);
        assert_eq!(robot.resets, 3);
    }

    #[test]
    fn test_elapsed_time_accumulates() {
        let mut controller = seeded(7);
        let mut robot = StubRobot::new();
        let mut telemetry = TelemetryBuffer::new();
        for _ in 0..2500 {
            controller.step(DT, &mut robot, &mut telemetry).unwrap();
        }
        assert!((controller.elapsed() - 2499.0 * DT).abs() < 1e-9);
    }

    #[test]
    fn test_telemetry_length_tracks_retargets() {
        let mut controller = seeded(8);
        let mut robot = StubRobot::new();
        let mut telemetry = TelemetryBuffer::new();
        for n in 1..=5000usize {
            controller.step(DT, &mut robot, &mut telemetry).unwrap();
            let expected = if n <= 2500 { n / 50 } else { n / 50 - 50 };
            assert_eq!(telemetry.len(), expected, "after {} calls", n);
        }
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        let run = |seed: u64| {
            let mut controller = seeded(seed);
            let mut robot = StubRobot::new();
            let mut telemetry = TelemetryBuffer::new();
            let mut targets = Vec::new();
            for _ in 0..500 {
                let outcome = controller.step(DT, &mut robot, &mut telemetry).unwrap();
                if let Some(command) = outcome.command {
                    targets.push(command.position_target);
                }
            }
            targets
        };
        let a = run(42);
        assert_eq!(a.len(), 10);
        assert_eq!(a, run(42));
        assert_ne!(a, run(43));
    }

    #[test]
    fn test_noise_statistics() {
        let mut controller = seeded(9);
        let mut robot = StubRobot::new();
        let mut telemetry = TelemetryBuffer::new();
        let mut deviations = Vec::new();
        for _ in 0..50 * 200 {
            let outcome = controller.step(DT, &mut robot, &mut telemetry).unwrap();
            if let Some(command) = outcome.command {
                for (t, r) in command.position_target.iter().zip(ANYMAL_REFERENCE_POSE.iter()) {
                    deviations.push(t - r);
                }
            }
        }
        let n = deviations.len() as f64;
        let mean = deviations.iter().sum::<f64>() / n;
        let std = (deviations.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n).sqrt();
        assert!(mean.abs() < 0.02, "mean {}", mean);
        assert!((std - 0.2).abs() < 0.02, "std {}", std);
    }

    #[test]
    fn test_restart_resets_on_next_call() {
        let mut controller = seeded(10);
        let mut robot = StubRobot::new();
        let mut telemetry = TelemetryBuffer::new();
        for _ in 0..120 {
            controller.step(DT, &mut robot, &mut telemetry).unwrap();
        }
        assert_eq!(telemetry.len(), 2);
        controller.restart();
        let outcome = controller.step(DT, &mut robot, &mut telemetry).unwrap();
        assert!(outcome.pose_reset);
        assert!(telemetry.is_empty());
    }

    #[test]
    fn test_invalid_config() {
        let zero = ControllerConfig {
            control_period: 0,
            ..ControllerConfig::default()
        };
        assert!(matches!(PdDemoController::new(zero), Err(ControlError::ZeroPeriod)));

        let negative = ControllerConfig {
            noise_std: -1.0,
            ..ControllerConfig::default()
        };
        assert!(matches!(PdDemoController::new(negative), Err(ControlError::InvalidNoise(_))));

        let nan = ControllerConfig {
            noise_std: f64::NAN,
            ..ControllerConfig::default()
        };
        assert!(matches!(PdDemoController::new(nan), Err(ControlError::InvalidNoise(_))));

        let silent = ControllerConfig {
            noise_std: 0.0,
            ..ControllerConfig::default()
        };
        assert!(PdDemoController::new(silent).is_ok());

        let short = ControllerConfig {
            reference_pose: vec![0.0; 12],
            ..ControllerConfig::default()
        };
        assert!(matches!(
            PdDemoController::new(short),
            Err(ControlError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_robot_dimension_mismatch() {
        let mut controller = PdDemoController::new(ControllerConfig {
            seed: Some(11),
            reset_pose: vec![0.0; 10],
            reference_pose: vec![0.0; 10],
            ..ControllerConfig::default()
        })
        .unwrap();
        let mut robot = StubRobot::new();
        let mut telemetry = TelemetryBuffer::new();
        assert!(matches!(
            controller.step(DT, &mut robot, &mut telemetry),
            Err(ControlError::DimensionMismatch { expected: 19, actual: 10, .. })
        ));
    }

    #[test]
    fn test_rejected_call_leaves_state_untouched() {
        let mut controller = seeded(12);
        let mut robot = StubRobot::new();
        robot.dof = 12;
        let mut telemetry = TelemetryBuffer::new();
        for _ in 0..3 {
            assert!(matches!(
                controller.step(DT, &mut robot, &mut telemetry),
                Err(ControlError::DimensionMismatch { expected: 18, actual: 12, .. })
            ));
        }
        assert_eq!(controller.counter(), 0);
        assert_eq!(controller.elapsed(), 0.0);
        assert_eq!(robot.resets, 0);

        robot.dof = 18;
        let outcome = controller.step(DT, &mut robot, &mut telemetry).unwrap();
        assert!(outcome.pose_reset);
    }
}
