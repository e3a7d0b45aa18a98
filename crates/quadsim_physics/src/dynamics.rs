//! Joint-space dynamics of a floating-base tree
//!
//! Equations of motion in the generalized velocity of
//! [`ArticulatedSystem`](crate::ArticulatedSystem):
//!
//! ```text
//! M(q) v̇ + h(q, v) = τ + Σ Jᵀ f
//! ```
//!
//! `M` is summed link by link through each center-of-mass Jacobian. `h`
//! holds gravity and the velocity-product terms, taken from one outward
//! pass that propagates link angular velocities and the accelerations
//! each link would have with `v̇ = 0`.

use quadsim_math::Vec3;

use crate::linalg::DenseMatrix;
use crate::model::{KinematicTree, Kinematics};

/// Rotor inertia added to every movable joint
pub const JOINT_ARMATURE: f64 = 0.01;

/// Sparse columns of a Jacobian mapping generalized velocity to a 3-vector
///
/// Only the six base columns and the joints between the root and the link
/// are non-zero.
#[derive(Clone, Debug, PartialEq)]
pub struct PointJacobian {
    columns: Vec<(usize, Vec3)>,
}

impl PointJacobian {
    /// Linear velocity Jacobian of a world point rigidly attached to `link`
    pub fn linear(tree: &KinematicTree, kin: &Kinematics, link: usize, point: Vec3) -> Self {
        let arm = point - kin.link_poses[0].position;
        let mut columns = vec![
            (0, Vec3::X),
            (1, Vec3::Y),
            (2, Vec3::Z),
            (3, Vec3::X.cross(arm)),
            (4, Vec3::Y.cross(arm)),
            (5, Vec3::Z.cross(arm)),
        ];
        columns.extend(
            tree.ancestor_dofs(link)
                .iter()
                .map(|&dof| (6 + dof, kin.lever(dof, point))),
        );
        Self { columns }
    }

    /// Angular velocity Jacobian of `link`
    pub fn angular(tree: &KinematicTree, kin: &Kinematics, link: usize) -> Self {
        let mut columns = vec![(3, Vec3::X), (4, Vec3::Y), (5, Vec3::Z)];
        columns.extend(
            tree.ancestor_dofs(link)
                .iter()
                .map(|&dof| (6 + dof, kin.joint_axes[dof])),
        );
        Self { columns }
    }

    /// `J v`
    pub fn velocity(&self, generalized_velocity: &[f64]) -> Vec3 {
        self.columns
            .iter()
            .fold(Vec3::ZERO, |acc, &(i, column)| {
                acc + column * generalized_velocity[i]
            })
    }

    /// `out += Jᵀ f`
    pub fn apply_transpose(&self, force: Vec3, out: &mut [f64]) {
        for &(i, column) in &self.columns {
            out[i] += column.dot(force);
        }
    }

    /// `out += scale · Jᵀ K J` for the symmetric 3×3 `K` given as a closure
    pub fn add_congruence(
        &self,
        scale: f64,
        stiffness: impl Fn(Vec3) -> Vec3,
        out: &mut DenseMatrix,
    ) {
        for &(b, column_b) in &self.columns {
            let k_column = stiffness(column_b) * scale;
            for &(a, column_a) in &self.columns {
                out[(a, b)] += column_a.dot(k_column);
            }
        }
    }
}

/// Mass matrix and bias force at one state
#[derive(Clone, Debug)]
pub struct JointSpaceDynamics {
    pub mass_matrix: DenseMatrix,
    /// Gravity plus Coriolis and centrifugal terms, `h(q, v)`
    pub bias: Vec<f64>,
}

impl JointSpaceDynamics {
    pub fn compute(
        tree: &KinematicTree,
        kin: &Kinematics,
        velocity: &[f64],
        gravity: Vec3,
    ) -> Self {
        let dof = 6 + tree.joint_count();
        let mut mass_matrix = DenseMatrix::zeros(dof);
        let mut bias = vec![0.0; dof];

        let links = tree.links();
        let mut angular_velocity = vec![Vec3::ZERO; links.len()];
        let mut angular_bias = vec![Vec3::ZERO; links.len()];
        let mut origin_bias = vec![Vec3::ZERO; links.len()];

        for (index, link) in links.iter().enumerate() {
            let pose = kin.link_poses[index];
            match link.parent {
                None => angular_velocity[index] = Vec3::from_slice(&velocity[3..6]),
                Some(parent) => {
                    let omega = angular_velocity[parent];
                    let alpha = angular_bias[parent];
                    let r = pose.position - kin.link_poses[parent].position;
                    origin_bias[index] =
                        origin_bias[parent] + alpha.cross(r) + omega.cross(omega.cross(r));
                    let spin = link
                        .dof
                        .map(|d| kin.joint_axes[d] * velocity[6 + d])
                        .unwrap_or(Vec3::ZERO);
                    angular_velocity[index] = omega + spin;
                    angular_bias[index] = alpha + omega.cross(spin);
                }
            }

            if link.mass <= 0.0 && link.inertia == Vec3::ZERO {
                continue;
            }

            let rotation = pose.rotation;
            let inertia = |v: Vec3| -> Vec3 {
                rotation.rotate(link.inertia.component_mul(rotation.inverse_rotate(v)))
            };
            let com = pose.transform_point(link.com);
            let linear = PointJacobian::linear(tree, kin, index, com);
            let angular = PointJacobian::angular(tree, kin, index);

            linear.add_congruence(link.mass, |v| v, &mut mass_matrix);
            angular.add_congruence(1.0, inertia, &mut mass_matrix);

            let omega = angular_velocity[index];
            let alpha = angular_bias[index];
            let arm = com - pose.position;
            let com_bias = origin_bias[index] + alpha.cross(arm) + omega.cross(omega.cross(arm));
            linear.apply_transpose((com_bias - gravity) * link.mass, &mut bias);
            angular.apply_transpose(inertia(alpha) + omega.cross(inertia(omega)), &mut bias);
        }

        for joint in 0..tree.joint_count() {
            mass_matrix[(6 + joint, 6 + joint)] += JOINT_ARMATURE;
        }

        Self { mass_matrix, bias }
    }
}
