//! Demo world: physics world, ground and robot set up from a [`Scene`]

use std::fmt;

use serde::{Deserialize, Serialize};

use quadsim_physics::{
    ArticulatedSystem, ControlMode, GroundKey, PhysicsConfig, PhysicsError, PhysicsMaterial,
    PhysicsWorld, SystemKey, DEFAULT_TIME_STEP,
};

use crate::asset_error::AssetError;
use crate::controller::{PdDemoController, StepOutcome};
use crate::error::ControlError;
use crate::resource::ResourceLocator;
use crate::scene::Scene;
use crate::telemetry::TelemetrySink;

/// Physics parameters for the demo world
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Integration step, seconds
    pub time_step: f64,
    pub physics: PhysicsConfig,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            time_step: DEFAULT_TIME_STEP,
            physics: PhysicsConfig::default(),
        }
    }
}

/// Error setting up or stepping the demo
#[derive(Debug)]
pub enum DemoError {
    Asset(AssetError),
    Physics(PhysicsError),
    Control(ControlError),
}

impl fmt::Display for DemoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemoError::Asset(e) => write!(f, "{}", e),
            DemoError::Physics(e) => write!(f, "physics: {}", e),
            DemoError::Control(e) => write!(f, "controller: {}", e),
        }
    }
}

impl std::error::Error for DemoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DemoError::Asset(e) => Some(e),
            DemoError::Physics(e) => Some(e),
            DemoError::Control(e) => Some(e),
        }
    }
}

impl From<AssetError> for DemoError {
    fn from(e: AssetError) -> Self {
        DemoError::Asset(e)
    }
}

impl From<PhysicsError> for DemoError {
    fn from(e: PhysicsError) -> Self {
        DemoError::Physics(e)
    }
}

impl From<ControlError> for DemoError {
    fn from(e: ControlError) -> Self {
        DemoError::Control(e)
    }
}

/// A physics world holding one ground and one PD-controlled robot
pub struct DemoWorld {
    world: PhysicsWorld,
    robot: SystemKey,
    ground: GroundKey,
    scene: Scene,
}

impl DemoWorld {
    /// Build the world described by `scene`
    ///
    /// The robot starts in the scene's initial pose with zero feed-forward
    /// force and PD control on its actuated joints.
    pub fn bootstrap(
        scene: &Scene,
        locator: &ResourceLocator,
        settings: &SimulationSettings,
    ) -> Result<Self, DemoError> {
        let mut world = PhysicsWorld::with_config(settings.physics.clone());
        world.set_time_step(settings.time_step)?;

        let ground = world.add_ground(scene.ground.height, ground_material(scene));

        let path = locator.resolve(&scene.robot.resource)?;
        let robot = world.load_articulated_system(&path)?;

        let system = world.try_system_mut(robot)?;
        system.set_name(scene.robot.name.clone());
        system.set_generalized_coordinate(&scene.robot.initial_pose)?;
        system.set_generalized_force(&vec![0.0; system.dof()])?;
        system.set_control_mode(ControlMode::PdPlusFeedforwardTorque);
        let (p_gain, d_gain) = scene.robot.gain_vectors(system.dof());
        system.set_pd_gains(&p_gain, &d_gain)?;
        system.set_pd_target(&scene.robot.initial_pose, &vec![0.0; system.dof()])?;

        log::info!(
            "Scene '{}' ready: robot '{}' ({} dof), dt = {} s",
            scene.name,
            system.name(),
            system.dof(),
            settings.time_step
        );

        Ok(Self {
            world,
            robot,
            ground,
            scene: scene.clone(),
        })
    }

    /// Run the controller for the current step, then integrate once
    pub fn step<T>(
        &mut self,
        controller: &mut PdDemoController,
        telemetry: &mut T,
    ) -> Result<StepOutcome, DemoError>
    where
        T: TelemetrySink + ?Sized,
    {
        let dt = self.world.time_step();
        let robot = self.world.try_system_mut(self.robot)?;
        let outcome = controller.step(dt, robot, telemetry)?;
        self.world.integrate();
        Ok(outcome)
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    pub fn robot_key(&self) -> SystemKey {
        self.robot
    }

    pub fn ground_key(&self) -> GroundKey {
        self.ground
    }

    pub fn robot(&self) -> Option<&ArticulatedSystem> {
        self.world.system(self.robot)
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn time_step(&self) -> f64 {
        self.world.time_step()
    }

    pub fn world_time(&self) -> f64 {
        self.world.world_time()
    }
}

fn ground_material(scene: &Scene) -> PhysicsMaterial {
    let settings = &scene.ground;
    let base = PhysicsMaterial::named(&settings.material).unwrap_or_else(|| {
        log::warn!("Unknown ground material '{}', using default", settings.material);
        PhysicsMaterial::default()
    });
    PhysicsMaterial::new(
        settings.friction.unwrap_or(base.friction),
        settings.restitution.unwrap_or(base.restitution),
    )
}
