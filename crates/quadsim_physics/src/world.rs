//! Physics world and simulation

use std::path::Path;

use quadsim_math::Vec3;
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

use crate::articulated::ArticulatedSystem;
use crate::collision::CollisionLayer;
use crate::error::PhysicsError;
use crate::material::PhysicsMaterial;
use crate::shapes::Plane;
use crate::urdf::load_urdf;

new_key_type! {
    /// Key to an articulated system in the physics world
    pub struct SystemKey;
    /// Key to a ground plane in the physics world
    pub struct GroundKey;
}

/// Default integration step, seconds
pub const DEFAULT_TIME_STEP: f64 = 0.0025;

/// Configuration for the physics simulation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity acceleration (z-up world)
    pub gravity: Vec3,
    /// Penalty spring per contact point, N/m
    pub contact_stiffness: f64,
    /// Contact damper per contact point, N·s/m
    pub contact_damping: f64,
    /// Tangential anchor spring per contact point, N/m
    pub friction_stiffness: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, 0.0, -9.81),
            contact_stiffness: 3.0e4,
            contact_damping: 1.0e3,
            friction_stiffness: 3.0e4,
        }
    }
}

/// A static infinite ground
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ground {
    pub plane: Plane,
    pub material: PhysicsMaterial,
    /// Contact point layers this ground pushes on
    pub filter: CollisionLayer,
}

impl Ground {
    /// Horizontal ground at `height` colliding with everything
    pub fn horizontal(height: f64, material: PhysicsMaterial) -> Self {
        Self {
            plane: Plane::horizontal(height),
            material,
            filter: CollisionLayer::ALL,
        }
    }
}

/// The physics world containing robots and grounds
pub struct PhysicsWorld {
    systems: SlotMap<SystemKey, ArticulatedSystem>,
    grounds: SlotMap<GroundKey, Ground>,
    time_step: f64,
    time: f64,
    /// Physics configuration
    pub config: PhysicsConfig,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Create a new physics world with default configuration
    pub fn new() -> Self {
        Self::with_config(PhysicsConfig::default())
    }

    pub fn with_config(config: PhysicsConfig) -> Self {
        Self {
            systems: SlotMap::with_key(),
            grounds: SlotMap::with_key(),
            time_step: DEFAULT_TIME_STEP,
            time: 0.0,
            config,
        }
    }

    pub fn set_time_step(&mut self, dt: f64) -> Result<(), PhysicsError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(PhysicsError::InvalidTimeStep(dt));
        }
        self.time_step = dt;
        Ok(())
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Simulated seconds since creation
    pub fn world_time(&self) -> f64 {
        self.time
    }

    pub fn add_ground(&mut self, height: f64, material: PhysicsMaterial) -> GroundKey {
        self.add_ground_plane(Ground::horizontal(height, material))
    }

    pub fn add_ground_plane(&mut self, ground: Ground) -> GroundKey {
        self.grounds.insert(ground)
    }

    pub fn ground(&self, key: GroundKey) -> Option<&Ground> {
        self.grounds.get(key)
    }

    pub fn grounds(&self) -> impl Iterator<Item = &Ground> + '_ {
        self.grounds.values()
    }

    pub fn add_articulated_system(&mut self, system: ArticulatedSystem) -> SystemKey {
        self.systems.insert(system)
    }

    /// Load a URDF file and add the robot it describes
    pub fn load_articulated_system<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> Result<SystemKey, PhysicsError> {
        let path = path.as_ref();
        let robot = load_urdf(path)?;
        let system = ArticulatedSystem::from_urdf(&robot)?;
        log::info!(
            "Loaded '{}' from {}: {} links, {} joints, {:.2} kg",
            system.name(),
            path.display(),
            system.tree().links().len(),
            system.tree().joint_count(),
            system.tree().total_mass()
        );
        Ok(self.add_articulated_system(system))
    }

    pub fn remove_system(&mut self, key: SystemKey) -> Option<ArticulatedSystem> {
        self.systems.remove(key)
    }

    pub fn system(&self, key: SystemKey) -> Option<&ArticulatedSystem> {
        self.systems.get(key)
    }

    pub fn system_mut(&mut self, key: SystemKey) -> Option<&mut ArticulatedSystem> {
        self.systems.get_mut(key)
    }

    pub fn try_system_mut(
        &mut self,
        key: SystemKey,
    ) -> Result<&mut ArticulatedSystem, PhysicsError> {
        self.systems.get_mut(key).ok_or(PhysicsError::UnknownSystem)
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Advance every system by one time step
    pub fn integrate(&mut self) {
        let grounds: Vec<&Ground> = self.grounds.values().collect();
        for system in self.systems.values_mut() {
            system.step(self.time_step, &self.config, &grounds);
        }
        self.time += self.time_step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::urdf::parse_urdf_str;

    const BALL: &str = r#"
        <robot name="ball">
          <link name="body">
            <inertial>
              <mass value="2"/>
              <inertia ixx="0.01" iyy="0.01" izz="0.01" ixy="0" ixz="0" iyz="0"/>
            </inertial>
            <collision><geometry><sphere radius="0.1"/></geometry></collision>
          </link>
        </robot>"#;

    fn ball() -> ArticulatedSystem {
        ArticulatedSystem::from_urdf(&parse_urdf_str(BALL).unwrap()).unwrap()
    }

    #[test]
    fn test_physics_config_default() {
        let config = PhysicsConfig::default();
        assert_eq!(config.gravity, Vec3::new(0.0, 0.0, -9.81));
        assert_eq!(config.friction_stiffness, 3.0e4);
    }

    #[test]
    fn test_time_step() {
        let mut world = PhysicsWorld::new();
        assert_eq!(world.time_step(), 0.0025);
        assert!(world.set_time_step(0.0).is_err());
        assert!(world.set_time_step(f64::NAN).is_err());
        world.set_time_step(0.001).unwrap();
        world.integrate();
        world.integrate();
        assert!((world.world_time() - 0.002).abs() < 1e-12);
    }

    #[test]
    fn test_stale_key_returns_none() {
        let mut world = PhysicsWorld::new();
        let key = world.add_articulated_system(ball());
        assert!(world.remove_system(key).is_some());
        let _other = world.add_articulated_system(ball());
        assert!(world.system(key).is_none());
        assert!(matches!(world.try_system_mut(key), Err(PhysicsError::UnknownSystem)));
    }

    #[test]
    fn test_ball_rests_on_ground() {
        let mut world = PhysicsWorld::new();
        world.add_ground(0.0, PhysicsMaterial::default());
        let key = world.add_articulated_system(ball());
        world
            .system_mut(key)
            .unwrap()
            .set_generalized_coordinate(&[0.0, 0.0, 0.3, 1.0, 0.0, 0.0, 0.0])
            .unwrap();

        for _ in 0..2000 {
            world.integrate();
        }

        let system = world.system(key).unwrap();
        let z = system.generalized_coordinate()[2];
        // sinks by m*g/k below the radius
        assert!(z > 0.09 && z < 0.1, "ball at {}", z);
        assert!(system.generalized_velocity()[2].abs() < 1e-3);
        assert_eq!(system.contacts().len(), 1);
        assert!((system.contacts()[0].force.z - 2.0 * 9.81).abs() < 0.1);
    }

    #[test]
    fn test_ground_filter() {
        let mut world = PhysicsWorld::new();
        world.add_ground_plane(Ground {
            filter: CollisionLayer::BODY,
            ..Ground::horizontal(0.0, PhysicsMaterial::default())
        });
        let key = world.add_articulated_system(ball());
        world
            .system_mut(key)
            .unwrap()
            .set_generalized_coordinate(&[0.0, 0.0, 0.05, 1.0, 0.0, 0.0, 0.0])
            .unwrap();
        world.integrate();
        assert!(world.system(key).unwrap().contacts().is_empty());
    }
}
