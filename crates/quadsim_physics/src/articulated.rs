//! Floating-base articulated system
//!
//! State is exposed in generalized coordinates:
//!
//! - generalized coordinate (dim `7 + n`): base position, base orientation
//!   quaternion `w x y z`, joint angles
//! - generalized velocity / force (dim `6 + n`): velocity of the base frame
//!   origin, base angular velocity (both world frame), joint rates
//!
//! Each step solves the joint-space equations of motion from
//! [`crate::dynamics`] for the new generalized velocity. Every spring and
//! damper (PD, joint damping, contacts) enters implicitly, so the system
//! matrix stays symmetric positive definite.
//!
//! A contact pushes along the ground normal with a penalty spring. Along
//! the ground it pulls toward an anchor, the ground point where it started
//! sticking, until the Coulomb limit is reached; from then on it slides with
//! the limiting force and the anchor follows it. A short active-set loop
//! settles contact modes and actuator saturation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use quadsim_math::{Quat, Vec3};

use crate::collision::sphere_vs_plane;
use crate::dynamics::{JointSpaceDynamics, PointJacobian};
use crate::error::PhysicsError;
use crate::linalg::DenseMatrix;
use crate::material::PhysicsMaterial;
use crate::model::{JointKind, KinematicTree, Kinematics, Pose};
use crate::shapes::Sphere;
use crate::urdf::UrdfRobot;
use crate::world::{Ground, PhysicsConfig};

/// Solves per step while contact modes or saturation keep changing
const MAX_ACTIVE_SET_ITERATIONS: usize = 8;

/// Relative change of a sliding force still treated as settled
const SLIP_TOLERANCE: f64 = 1e-6;

/// How actuator torques are produced
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlMode {
    /// Only the feed-forward generalized force is applied
    #[default]
    ForceAndTorque,
    /// Stable PD toward the targets plus the feed-forward force
    PdPlusFeedforwardTorque,
}

/// A resolved ground contact from the last step
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactInfo {
    /// Link index in the kinematic tree
    pub link: usize,
    pub position: Vec3,
    pub normal: Vec3,
    /// Force exerted by the ground on the robot
    pub force: Vec3,
    pub penetration: f64,
    /// The tangential force sat at the friction limit
    pub sliding: bool,
}

/// One contact point against one ground, stable across steps
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct ContactKey {
    link: usize,
    point: usize,
    ground: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Friction {
    /// Tangential spring toward the anchor
    Stick,
    /// Fixed tangential force at the Coulomb limit
    Slip(Vec3),
}

/// A penetrating contact point while one step is solved
struct ContactCandidate {
    key: ContactKey,
    point: Vec3,
    normal: Vec3,
    penetration: f64,
    jacobian: PointJacobian,
    anchor: Vec3,
    friction_coefficient: f64,
    normal_damping: f64,
    friction: Friction,
    separated: bool,
    normal_force: f64,
    tangential_force: Vec3,
    velocity: Vec3,
}

impl ContactCandidate {
    fn tangential(&self, v: Vec3) -> Vec3 {
        v - self.normal * v.dot(self.normal)
    }

    /// `∂f/∂v` along the normal, the spring looking one step ahead
    fn normal_rate(&self, dt: f64, config: &PhysicsConfig) -> f64 {
        self.normal_damping + dt * config.contact_stiffness
    }

    fn stick_rate(dt: f64, config: &PhysicsConfig) -> f64 {
        config.contact_damping + dt * config.friction_stiffness
    }

    /// Add the force at zero point velocity to `rhs` and its velocity
    /// dependence to `matrix`
    fn assemble(
        &self,
        dt: f64,
        config: &PhysicsConfig,
        matrix: &mut DenseMatrix,
        rhs: &mut [f64],
    ) {
        let normal = self.normal;
        let normal_rate = self.normal_rate(dt, config);
        let (tangential_force, tangential_rate) = match self.friction {
            Friction::Stick => (
                self.tangential(self.point - self.anchor) * -config.friction_stiffness,
                Self::stick_rate(dt, config),
            ),
            Friction::Slip(force) => (force, 0.0),
        };
        let force = normal * (config.contact_stiffness * self.penetration) + tangential_force;
        self.jacobian.apply_transpose(force * dt, rhs);
        self.jacobian.add_congruence(
            dt,
            |v| normal * (normal_rate * v.dot(normal)) + self.tangential(v) * tangential_rate,
            matrix,
        );
    }

    /// Read the contact force back from a solved velocity
    ///
    /// Returns true when the contact changed mode and the step has to be
    /// solved again.
    fn update(&mut self, velocity: &[f64], dt: f64, config: &PhysicsConfig) -> bool {
        self.velocity = self.jacobian.velocity(velocity);
        let normal_force = config.contact_stiffness * self.penetration
            - self.normal_rate(dt, config) * self.velocity.dot(self.normal);
        if normal_force <= 0.0 {
            self.separated = true;
            return true;
        }
        self.normal_force = normal_force;
        let limit = self.friction_coefficient * normal_force;

        match self.friction {
            Friction::Stick => {
                let force = self.tangential(self.point - self.anchor) * -config.friction_stiffness
                    - self.tangential(self.velocity) * Self::stick_rate(dt, config);
                let magnitude = force.length();
                if magnitude > limit {
                    let limited = force * (limit / magnitude);
                    self.friction = Friction::Slip(limited);
                    self.tangential_force = limited;
                    return true;
                }
                self.tangential_force = force;
                false
            }
            Friction::Slip(force) => {
                let magnitude = force.length();
                let resized = if magnitude > 0.0 {
                    force * (limit / magnitude)
                } else {
                    Vec3::ZERO
                };
                self.tangential_force = resized;
                if (resized - force).length() > SLIP_TOLERANCE * limit.max(1.0) {
                    self.friction = Friction::Slip(resized);
                    return true;
                }
                false
            }
        }
    }

    /// Anchor for the next step: kept while sticking, dragged along the
    /// ground while sliding so the spring starts at the friction limit
    fn next_anchor(&self, dt: f64, config: &PhysicsConfig) -> Vec3 {
        match self.friction {
            Friction::Stick => self.anchor,
            Friction::Slip(force) if config.friction_stiffness > 0.0 => {
                self.point + self.velocity * dt + force / config.friction_stiffness
            }
            Friction::Slip(_) => self.point + self.velocity * dt,
        }
    }

    fn info(&self) -> ContactInfo {
        ContactInfo {
            link: self.key.link,
            position: self.point,
            normal: self.normal,
            force: self.normal * self.normal_force + self.tangential_force,
            penetration: self.penetration,
            sliding: matches!(self.friction, Friction::Slip(_)),
        }
    }
}

/// A robot in the world
#[derive(Clone, Debug)]
pub struct ArticulatedSystem {
    name: String,
    tree: KinematicTree,
    base_position: Vec3,
    base_rotation: Quat,
    base_linear_velocity: Vec3,
    base_angular_velocity: Vec3,
    joint_positions: Vec<f64>,
    joint_velocities: Vec<f64>,
    feedforward: Vec<f64>,
    generalized_force: Vec<f64>,
    p_gain: Vec<f64>,
    d_gain: Vec<f64>,
    position_target: Vec<f64>,
    velocity_target: Vec<f64>,
    control_mode: ControlMode,
    /// Material of the robot's contact geometry
    pub material: PhysicsMaterial,
    contacts: Vec<ContactInfo>,
    /// Ground points held by the contacts of the last step
    anchors: HashMap<ContactKey, Vec3>,
}

impl ArticulatedSystem {
    /// Create a system resting at the origin with all joints at zero
    pub fn new(tree: KinematicTree) -> Self {
        let n = tree.joint_count();
        let dof = 6 + n;
        let mut position_target = vec![0.0; 7 + n];
        position_target[3] = 1.0;
        Self {
            name: tree.name().to_string(),
            tree,
            base_position: Vec3::ZERO,
            base_rotation: Quat::IDENTITY,
            base_linear_velocity: Vec3::ZERO,
            base_angular_velocity: Vec3::ZERO,
            joint_positions: vec![0.0; n],
            joint_velocities: vec![0.0; n],
            feedforward: vec![0.0; dof],
            generalized_force: vec![0.0; dof],
            p_gain: vec![0.0; dof],
            d_gain: vec![0.0; dof],
            position_target,
            velocity_target: vec![0.0; dof],
            control_mode: ControlMode::default(),
            material: PhysicsMaterial::RUBBER,
            contacts: Vec::new(),
            anchors: HashMap::new(),
        }
    }

    pub fn from_urdf(robot: &UrdfRobot) -> Result<Self, PhysicsError> {
        Ok(Self::new(KinematicTree::from_urdf(robot)?))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn tree(&self) -> &KinematicTree {
        &self.tree
    }

    /// Degrees of freedom (generalized velocity dimension)
    pub fn dof(&self) -> usize {
        6 + self.tree.joint_count()
    }

    pub fn generalized_coordinate_dim(&self) -> usize {
        7 + self.tree.joint_count()
    }

    /// Set the full configuration; the quaternion is normalized
    ///
    /// Contacts stop sticking to the ground points they held before.
    pub fn set_generalized_coordinate(&mut self, gc: &[f64]) -> Result<(), PhysicsError> {
        let dim = self.generalized_coordinate_dim();
        PhysicsError::check_dim("generalized coordinate", dim, gc.len())?;
        self.base_position = Vec3::from_slice(&gc[0..3]);
        self.base_rotation = Quat::from_slice(&gc[3..7]).normalized();
        self.joint_positions.copy_from_slice(&gc[7..]);
        self.anchors.clear();
        Ok(())
    }

    pub fn generalized_coordinate(&self) -> Vec<f64> {
        let mut gc = Vec::with_capacity(self.generalized_coordinate_dim());
        gc.extend_from_slice(&self.base_position.to_array());
        gc.extend_from_slice(&self.base_rotation.to_array());
        gc.extend_from_slice(&self.joint_positions);
        gc
    }

    pub fn set_generalized_velocity(&mut self, gv: &[f64]) -> Result<(), PhysicsError> {
        PhysicsError::check_dim("generalized velocity", self.dof(), gv.len())?;
        self.base_linear_velocity = Vec3::from_slice(&gv[0..3]);
        self.base_angular_velocity = Vec3::from_slice(&gv[3..6]);
        self.joint_velocities.copy_from_slice(&gv[6..]);
        Ok(())
    }

    pub fn generalized_velocity(&self) -> Vec<f64> {
        let mut gv = Vec::with_capacity(self.dof());
        gv.extend_from_slice(&self.base_linear_velocity.to_array());
        gv.extend_from_slice(&self.base_angular_velocity.to_array());
        gv.extend_from_slice(&self.joint_velocities);
        gv
    }

    /// Set the feed-forward generalized force
    ///
    /// The base entries are a world-frame force at the base origin and a
    /// torque. Until the next step this is also what
    /// [`Self::generalized_force`] reports.
    pub fn set_generalized_force(&mut self, tau: &[f64]) -> Result<(), PhysicsError> {
        PhysicsError::check_dim("generalized force", self.dof(), tau.len())?;
        self.feedforward.copy_from_slice(tau);
        self.generalized_force.copy_from_slice(tau);
        Ok(())
    }

    /// Actuation applied during the last step
    pub fn generalized_force(&self) -> &[f64] {
        &self.generalized_force
    }

    pub fn set_control_mode(&mut self, mode: ControlMode) {
        self.control_mode = mode;
    }

    pub fn control_mode(&self) -> ControlMode {
        self.control_mode
    }

    /// Proportional and derivative gains, one per generalized velocity entry
    ///
    /// Gains on the six base entries are stored but not applied.
    pub fn set_pd_gains(&mut self, p_gain: &[f64], d_gain: &[f64]) -> Result<(), PhysicsError> {
        PhysicsError::check_dim("P gain", self.dof(), p_gain.len())?;
        PhysicsError::check_dim("D gain", self.dof(), d_gain.len())?;
        self.p_gain.copy_from_slice(p_gain);
        self.d_gain.copy_from_slice(d_gain);
        Ok(())
    }

    pub fn pd_gains(&self) -> (&[f64], &[f64]) {
        (&self.p_gain, &self.d_gain)
    }

    /// Position target (coordinate dim) and velocity target (velocity dim)
    pub fn set_pd_target(
        &mut self,
        position: &[f64],
        velocity: &[f64],
    ) -> Result<(), PhysicsError> {
        let dim = self.generalized_coordinate_dim();
        PhysicsError::check_dim("position target", dim, position.len())?;
        PhysicsError::check_dim("velocity target", self.dof(), velocity.len())?;
        self.position_target.copy_from_slice(position);
        self.velocity_target.copy_from_slice(velocity);
        Ok(())
    }

    pub fn pd_target(&self) -> (&[f64], &[f64]) {
        (&self.position_target, &self.velocity_target)
    }

    pub fn base_pose(&self) -> Pose {
        Pose::new(self.base_position, self.base_rotation)
    }

    /// World pose of every link, in tree order
    pub fn link_poses(&self) -> Vec<Pose> {
        self.tree
            .forward_kinematics(self.base_pose(), &self.joint_positions)
            .link_poses
    }

    /// Contacts resolved during the last step
    pub fn contacts(&self) -> &[ContactInfo] {
        &self.contacts
    }

    /// Explicit part of a joint's actuation and its rate `−∂τ/∂q̇` at the
    /// end of the step
    fn joint_drive(&self, joint: usize, pd_active: bool, dt: f64) -> (f64, f64) {
        let i = 6 + joint;
        let feedforward = self.feedforward[i];
        if !pd_active {
            return (feedforward, 0.0);
        }
        let kp = self.p_gain[i];
        let kd = self.d_gain[i];
        let error = self.position_target[7 + joint] - self.joint_positions[joint];
        (
            feedforward + kp * error + kd * self.velocity_target[i],
            kd + dt * kp,
        )
    }

    fn collect_contacts(
        &self,
        kin: &Kinematics,
        config: &PhysicsConfig,
        grounds: &[&Ground],
    ) -> Vec<ContactCandidate> {
        let mut contacts = Vec::new();
        for (link, body) in self.tree.links().iter().enumerate() {
            let pose = kin.link_poses[link];
            for (point, contact_point) in body.contact_points.iter().enumerate() {
                let center = pose.transform_point(contact_point.offset);
                let sphere = Sphere::new(center, contact_point.radius);
                for (ground_index, ground) in grounds.iter().enumerate() {
                    if !ground.filter.intersects(contact_point.layer) {
                        continue;
                    }
                    let Some(contact) = sphere_vs_plane(&sphere, &ground.plane) else {
                        continue;
                    };
                    let key = ContactKey {
                        link,
                        point,
                        ground: ground_index,
                    };
                    let material = self.material.combine(&ground.material);
                    contacts.push(ContactCandidate {
                        key,
                        point: contact.point,
                        normal: contact.normal,
                        penetration: contact.penetration,
                        jacobian: PointJacobian::linear(&self.tree, kin, link, contact.point),
                        anchor: self.anchors.get(&key).copied().unwrap_or(contact.point),
                        friction_coefficient: material.friction,
                        normal_damping: config.contact_damping * (1.0 - material.restitution),
                        friction: Friction::Stick,
                        separated: false,
                        normal_force: 0.0,
                        tangential_force: Vec3::ZERO,
                        velocity: Vec3::ZERO,
                    });
                }
            }
        }
        contacts
    }

    /// Advance the system by `dt`
    pub(crate) fn step(&mut self, dt: f64, config: &PhysicsConfig, grounds: &[&Ground]) {
        let n = self.tree.joint_count();
        let kin = self
            .tree
            .forward_kinematics(self.base_pose(), &self.joint_positions);
        let velocity = self.generalized_velocity();
        let dynamics = JointSpaceDynamics::compute(&self.tree, &kin, &velocity, config.gravity);

        // M v − dt h, plus the feed-forward wrench on the base
        let mut free_rhs = dynamics.mass_matrix.mul_vec(&velocity);
        for (i, rhs) in free_rhs.iter_mut().enumerate() {
            *rhs -= dt * dynamics.bias[i];
            if i < 6 {
                *rhs += dt * self.feedforward[i];
            }
        }

        let pd_active = self.control_mode == ControlMode::PdPlusFeedforwardTorque;
        let mut contacts = self.collect_contacts(&kin, config, grounds);
        let mut saturated: Vec<Option<f64>> = vec![None; n];
        let mut torques = vec![0.0; n];
        let mut solution = velocity;

        for _ in 0..MAX_ACTIVE_SET_ITERATIONS {
            let mut matrix = dynamics.mass_matrix.clone();
            let mut rhs = free_rhs.clone();
            for joint in 0..n {
                let i = 6 + joint;
                let (drive, rate) = match saturated[joint] {
                    Some(torque) => (torque, 0.0),
                    None => self.joint_drive(joint, pd_active, dt),
                };
                matrix[(i, i)] += dt * (rate + self.tree.joint_link(joint).damping);
                rhs[i] += dt * drive;
            }
            for contact in contacts.iter().filter(|c| !c.separated) {
                contact.assemble(dt, config, &mut matrix, &mut rhs);
            }

            let Some(next) = matrix.solve_spd(rhs) else {
                log::warn!(
                    "'{}': joint-space inertia is not positive definite, state held",
                    self.name
                );
                return;
            };
            solution = next;

            let mut changed = false;
            for contact in contacts.iter_mut().filter(|c| !c.separated) {
                changed |= contact.update(&solution, dt, config);
            }
            for joint in 0..n {
                let torque = match saturated[joint] {
                    Some(torque) => torque,
                    None => {
                        let (drive, rate) = self.joint_drive(joint, pd_active, dt);
                        drive - rate * solution[6 + joint]
                    }
                };
                let effort = self
                    .tree
                    .joint_link(joint)
                    .limits
                    .map(|l| l.effort)
                    .unwrap_or(0.0);
                if saturated[joint].is_none() && effort > 0.0 && torque.abs() > effort {
                    saturated[joint] = Some(torque.clamp(-effort, effort));
                    changed = true;
                }
                torques[joint] = saturated[joint].unwrap_or(torque);
            }
            if !changed {
                break;
            }
        }

        self.base_linear_velocity = Vec3::from_slice(&solution[0..3]);
        self.base_angular_velocity = Vec3::from_slice(&solution[3..6]);
        self.base_position += self.base_linear_velocity * dt;
        self.base_rotation = self
            .base_rotation
            .integrate(self.base_angular_velocity, dt);

        let mut actuation = vec![0.0; self.dof()];
        actuation[..6].copy_from_slice(&self.feedforward[..6]);
        for joint in 0..n {
            let link = self.tree.joint_link(joint);
            let mut rate = solution[6 + joint];
            let mut position = self.joint_positions[joint] + dt * rate;
            let limits = link
                .limits
                .filter(|l| link.joint == JointKind::Revolute && l.lower < l.upper);
            if let Some(limits) = limits {
                if position < limits.lower {
                    position = limits.lower;
                    rate = rate.max(0.0);
                } else if position > limits.upper {
                    position = limits.upper;
                    rate = rate.min(0.0);
                }
            }
            self.joint_positions[joint] = position;
            self.joint_velocities[joint] = rate;
            actuation[6 + joint] = torques[joint];
        }
        self.generalized_force = actuation;

        self.anchors.clear();
        self.contacts.clear();
        for contact in contacts.iter().filter(|c| !c.separated) {
            self.anchors
                .insert(contact.key, contact.next_anchor(dt, config));
            self.contacts.push(contact.info());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::urdf::parse_urdf_str;

    const PENDULUM: &str = r#"
        <robot name="pendulum">
          <link name="base">
            <inertial>
              <mass value="5"/>
              <inertia ixx="0.1" iyy="0.1" izz="0.1" ixy="0" ixz="0" iyz="0"/>
            </inertial>
          </link>
          <link name="arm">
            <inertial>
              <origin xyz="0 0 -0.2"/><mass value="1"/>
              <inertia ixx="0.01" iyy="0.01" izz="0.01" ixy="0" ixz="0" iyz="0"/>
            </inertial>
          </link>
          <joint name="hinge" type="revolute">
            <parent link="base"/><child link="arm"/>
            <axis xyz="0 1 0"/>
            <limit lower="-2" upper="2" effort="40" velocity="10"/>
          </joint>
        </robot>"#;

    const CRATE: &str = r#"
        <robot name="crate">
          <link name="body">
            <inertial>
              <mass value="10"/>
              <inertia ixx="0.17" iyy="0.17" izz="0.27" ixy="0" ixz="0" iyz="0"/>
            </inertial>
            <collision><geometry><box size="0.4 0.4 0.2"/></geometry></collision>
          </link>
        </robot>"#;

    fn pendulum() -> ArticulatedSystem {
        ArticulatedSystem::from_urdf(&parse_urdf_str(PENDULUM).unwrap()).unwrap()
    }

    /// A box resting on its four bottom corners
    fn resting_crate(ground: &Ground) -> ArticulatedSystem {
        let mut system = ArticulatedSystem::from_urdf(&parse_urdf_str(CRATE).unwrap()).unwrap();
        system
            .set_generalized_coordinate(&[0.0, 0.0, 0.1, 1.0, 0.0, 0.0, 0.0])
            .unwrap();
        let config = PhysicsConfig::default();
        for _ in 0..400 {
            system.step(0.0025, &config, &[ground]);
        }
        system
    }

    fn zero_gravity() -> PhysicsConfig {
        PhysicsConfig {
            gravity: Vec3::ZERO,
            ..PhysicsConfig::default()
        }
    }

    fn joint_gains(p: f64, d: f64) -> ([f64; 7], [f64; 7]) {
        let mut p_gain = [0.0; 7];
        let mut d_gain = [0.0; 7];
        p_gain[6] = p;
        d_gain[6] = d;
        (p_gain, d_gain)
    }

    #[test]
    fn test_dimensions() {
        let system = pendulum();
        assert_eq!(system.dof(), 7);
        assert_eq!(system.generalized_coordinate_dim(), 8);
        assert_eq!(
            system.generalized_coordinate(),
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]
        );
        assert_eq!(system.name(), "pendulum");
    }

    #[test]
    fn test_set_generalized_coordinate_normalizes_quaternion() {
        let mut system = pendulum();
        system
            .set_generalized_coordinate(&[1.0, 2.0, 3.0, 2.0, 0.0, 0.0, 0.0, 0.5])
            .unwrap();
        let gc = system.generalized_coordinate();
        assert_eq!(&gc[0..3], &[1.0, 2.0, 3.0]);
        assert_eq!(&gc[3..7], &[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(gc[7], 0.5);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut system = pendulum();
        assert!(matches!(
            system.set_generalized_coordinate(&[0.0; 7]),
            Err(PhysicsError::DimensionMismatch { expected: 8, actual: 7, .. })
        ));
        assert!(system.set_pd_gains(&[0.0; 7], &[0.0; 6]).is_err());
        assert!(system.set_pd_target(&[0.0; 8], &[0.0; 8]).is_err());
        assert!(system.set_generalized_force(&[0.0; 3]).is_err());
    }

    #[test]
    fn test_generalized_force_reports_feedforward_before_step() {
        let mut system = pendulum();
        system
            .set_generalized_force(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.5])
            .unwrap();
        assert_eq!(system.generalized_force()[6], 1.5);
    }

    #[test]
    fn test_free_fall() {
        let mut system = pendulum();
        let config = PhysicsConfig::default();
        for _ in 0..100 {
            system.step(0.0025, &config, &[]);
        }
        let gv = system.generalized_velocity();
        assert!((gv[2] - (-9.81 * 0.25)).abs() < 1e-6);
        assert!(gv[6].abs() < 1e-9, "gravity alone does not swing a hanging arm");
    }

    #[test]
    fn test_pd_converges_to_target() {
        let mut system = pendulum();
        system.set_control_mode(ControlMode::PdPlusFeedforwardTorque);
        let (p_gain, d_gain) = joint_gains(200.0, 10.0);
        system.set_pd_gains(&p_gain, &d_gain).unwrap();
        let mut target = system.generalized_coordinate();
        target[7] = 0.5;
        system.set_pd_target(&target, &[0.0; 7]).unwrap();

        let config = zero_gravity();
        for _ in 0..2000 {
            system.step(0.0025, &config, &[]);
        }
        let q = system.generalized_coordinate()[7];
        assert!((q - 0.5).abs() < 1e-3, "joint at {}", q);
        assert!(system.generalized_force()[6].abs() < 0.5);
    }

    #[test]
    fn test_effort_limit_clamps_torque() {
        let mut system = pendulum();
        system.set_control_mode(ControlMode::PdPlusFeedforwardTorque);
        let (p_gain, d_gain) = joint_gains(1000.0, 0.0);
        system.set_pd_gains(&p_gain, &d_gain).unwrap();
        let mut target = system.generalized_coordinate();
        target[7] = 1.5;
        system.set_pd_target(&target, &[0.0; 7]).unwrap();
        system.step(0.0025, &zero_gravity(), &[]);
        assert!((system.generalized_force()[6] - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_force_and_torque_mode_ignores_pd() {
        let mut system = pendulum();
        let (p_gain, d_gain) = joint_gains(200.0, 0.0);
        system.set_pd_gains(&p_gain, &d_gain).unwrap();
        let mut target = system.generalized_coordinate();
        target[7] = 1.0;
        system.set_pd_target(&target, &[0.0; 7]).unwrap();
        system
            .set_generalized_force(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 2.0])
            .unwrap();
        system.step(0.0025, &zero_gravity(), &[]);
        assert_eq!(system.generalized_force()[6], 2.0);
        assert!(system.generalized_velocity()[6] > 0.0);
    }

    #[test]
    fn test_joint_torque_reacts_on_base() {
        let mut system = pendulum();
        system
            .set_generalized_force(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 2.0])
            .unwrap();
        for _ in 0..10 {
            system.step(0.0025, &zero_gravity(), &[]);
        }
        let gv = system.generalized_velocity();
        assert!(gv[6] > 0.0);
        assert!(gv[4] < 0.0, "base should spin against the arm, got {}", gv[4]);
        // the arm's center of mass swings in x, so the base recoils
        assert!(gv[0].abs() > 0.0);
    }

    #[test]
    fn test_joint_limit() {
        let mut system = pendulum();
        system
            .set_generalized_velocity(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 100.0])
            .unwrap();
        system.step(0.05, &zero_gravity(), &[]);
        assert_eq!(system.generalized_coordinate()[7], 2.0);
        assert_eq!(system.generalized_velocity()[6], 0.0);
    }

    #[test]
    fn test_planted_contacts_hold_below_friction_limit() {
        let ground = Ground::horizontal(0.0, PhysicsMaterial::default());
        let mut system = resting_crate(&ground);
        assert_eq!(system.contacts().len(), 4);

        // μ ≈ 0.85 holds up to about 83 N on a 10 kg box
        system
            .set_generalized_force(&[40.0, 0.0, 0.0, 0.0, 0.0, 0.0])
            .unwrap();
        let config = PhysicsConfig::default();
        for _ in 0..200 {
            system.step(0.0025, &config, &[&ground]);
        }
        let settled = system.generalized_coordinate()[0];
        for _ in 0..400 {
            system.step(0.0025, &config, &[&ground]);
        }
        let x = system.generalized_coordinate()[0];

        assert!(settled < 1e-3, "crept {} before holding", settled);
        assert!((x - settled).abs() < 1e-6, "drifted from {} to {}", settled, x);
        assert!(system.contacts().iter().all(|c| !c.sliding));
        let friction: f64 = system.contacts().iter().map(|c| c.force.x).sum();
        assert!((friction + 40.0).abs() < 1e-3, "friction {}", friction);
    }

    #[test]
    fn test_contacts_slide_above_friction_limit() {
        let ground = Ground::horizontal(0.0, PhysicsMaterial::default());
        let mut system = resting_crate(&ground);
        system
            .set_generalized_force(&[120.0, 0.0, 0.0, 0.0, 0.0, 0.0])
            .unwrap();
        let config = PhysicsConfig::default();
        for _ in 0..400 {
            system.step(0.0025, &config, &[&ground]);
        }

        let gv = system.generalized_velocity();
        assert!(gv[0] > 1.0, "box should be sliding, speed {}", gv[0]);
        assert!(!system.contacts().is_empty());
        assert!(system.contacts().iter().all(|c| c.sliding));
        let mu = PhysicsMaterial::RUBBER
            .combine(&PhysicsMaterial::default())
            .friction;
        for contact in system.contacts() {
            let tangential = Vec3::new(contact.force.x, contact.force.y, 0.0).length();
            assert!((tangential - mu * contact.force.z).abs() < 1e-6 * contact.force.z.max(1.0));
        }
    }

    #[test]
    fn test_reset_releases_anchors() {
        let ground = Ground::horizontal(0.0, PhysicsMaterial::default());
        let mut system = resting_crate(&ground);
        assert_eq!(system.anchors.len(), 4);
        system
            .set_generalized_coordinate(&[1.0, 0.0, 0.1, 1.0, 0.0, 0.0, 0.0])
            .unwrap();
        assert!(system.anchors.is_empty());

        // the box lands in place instead of being pulled back toward x = 0
        let config = PhysicsConfig::default();
        for _ in 0..200 {
            system.step(0.0025, &config, &[&ground]);
        }
        assert!((system.generalized_coordinate()[0] - 1.0).abs() < 1e-6);
    }
}
