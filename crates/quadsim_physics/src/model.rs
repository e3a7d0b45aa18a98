//! Kinematic tree built from a robot description
//!
//! Links are stored in depth-first order following joint declaration order,
//! so a parent always precedes its children and the movable joints of one
//! leg occupy consecutive coordinate indices. The root link is the floating
//! base; every other link hangs off a fixed, revolute or continuous joint.

use std::collections::HashMap;

use quadsim_math::{Quat, Vec3};

use crate::collision::CollisionLayer;
use crate::shapes::Shape;
use crate::urdf::{UrdfError, UrdfGeometry, UrdfJointType, UrdfRobot};

const DEFAULT_LINK_COLOR: [f32; 4] = [0.7, 0.7, 0.7, 1.0];

/// Rigid transform: rotate, then translate
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation.rotate(point)
    }

    /// `self * child`: express a pose given in this frame in the parent frame
    pub fn compose(&self, child: &Pose) -> Pose {
        Pose {
            position: self.transform_point(child.position),
            rotation: (self.rotation * child.rotation).normalized(),
        }
    }
}

/// How a link is attached to its parent
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JointKind {
    /// Root link, six free coordinates
    Floating,
    Fixed,
    Revolute,
    Continuous,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JointLimits {
    pub lower: f64,
    pub upper: f64,
    /// Maximum actuator torque; zero means unlimited
    pub effort: f64,
    pub velocity: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinkVisual {
    /// Visual frame relative to the link frame
    pub origin: Pose,
    pub shape: Shape,
    pub color: [f32; 4],
}

/// A point of the link that can touch the ground
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactPoint {
    /// Center in the link frame
    pub offset: Vec3,
    /// Sphere radius, zero for box corners
    pub radius: f64,
    pub layer: CollisionLayer,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Link {
    pub name: String,
    pub parent: Option<usize>,
    /// Name of the joint attaching this link, `None` for the root
    pub joint_name: Option<String>,
    pub joint: JointKind,
    /// Joint frame in the parent link frame
    pub origin: Pose,
    /// Joint axis in the joint frame (unit length)
    pub axis: Vec3,
    /// Index among the movable joints
    pub dof: Option<usize>,
    pub limits: Option<JointLimits>,
    /// Viscous joint damping
    pub damping: f64,
    pub mass: f64,
    /// Center of mass in the link frame
    pub com: Vec3,
    /// Principal moments about the center of mass
    pub inertia: Vec3,
    pub visuals: Vec<LinkVisual>,
    pub contact_points: Vec<ContactPoint>,
}

/// World-frame quantities from one forward kinematics pass
#[derive(Clone, Debug)]
pub struct Kinematics {
    pub link_poses: Vec<Pose>,
    /// Per movable joint: joint origin in world
    pub joint_origins: Vec<Vec3>,
    /// Per movable joint: unit axis in world
    pub joint_axes: Vec<Vec3>,
}

impl Kinematics {
    /// Column of the point Jacobian for one joint: `axis × (point − origin)`
    pub fn lever(&self, dof: usize, point: Vec3) -> Vec3 {
        self.joint_axes[dof].cross(point - self.joint_origins[dof])
    }
}

/// Links, movable joints and mass properties of one robot
#[derive(Clone, Debug)]
pub struct KinematicTree {
    name: String,
    links: Vec<Link>,
    /// Link index driven by each movable joint
    joint_links: Vec<usize>,
    /// Movable joints between the root and each link, root first
    ancestors: Vec<Vec<usize>>,
    total_mass: f64,
}

impl KinematicTree {
    /// Build the tree from a parsed description
    pub fn from_urdf(robot: &UrdfRobot) -> Result<Self, UrdfError> {
        let root = robot.validate()?;

        let mut children: HashMap<&str, Vec<usize>> = HashMap::new();
        for (index, joint) in robot.joints.iter().enumerate() {
            children.entry(joint.parent.as_str()).or_default().push(index);
        }

        let mut links: Vec<Link> = Vec::with_capacity(robot.links.len());
        let mut joint_links = Vec::new();
        let mut ancestors: Vec<Vec<usize>> = Vec::with_capacity(robot.links.len());

        // (link name, joint index, parent link index)
        let mut stack: Vec<(&str, Option<usize>, Option<usize>)> = vec![(root, None, None)];
        while let Some((link_name, joint_index, parent)) = stack.pop() {
            let Some(urdf_link) = robot.link(link_name) else {
                return Err(UrdfError::UndefinedLink {
                    link: link_name.to_string(),
                    joint: joint_index
                        .map(|i| robot.joints[i].name.clone())
                        .unwrap_or_default(),
                });
            };
            let index = links.len();

            let mut link = Link {
                name: urdf_link.name.clone(),
                parent,
                joint_name: None,
                joint: JointKind::Floating,
                origin: Pose::IDENTITY,
                axis: Vec3::X,
                dof: None,
                limits: None,
                damping: 0.0,
                mass: 0.0,
                com: Vec3::ZERO,
                inertia: Vec3::ZERO,
                visuals: Vec::new(),
                contact_points: Vec::new(),
            };

            let mut chain = parent.map(|p| ancestors[p].clone()).unwrap_or_default();
            if let Some(joint_index) = joint_index {
                let joint = &robot.joints[joint_index];
                link.joint_name = Some(joint.name.clone());
                link.joint = match joint.joint_type {
                    UrdfJointType::Fixed => JointKind::Fixed,
                    UrdfJointType::Revolute => JointKind::Revolute,
                    UrdfJointType::Continuous => JointKind::Continuous,
                    other => {
                        return Err(UrdfError::Unsupported(format!(
                            "{:?} joint '{}'",
                            other, joint.name
                        )))
                    }
                };
                link.origin = Pose::new(joint.origin.xyz, joint.origin.rotation());
                link.axis = joint.axis.normalized();
                link.limits = joint.limit.map(|l| JointLimits {
                    lower: l.lower,
                    upper: l.upper,
                    effort: l.effort,
                    velocity: l.velocity,
                });
                link.damping = joint.dynamics.map(|d| d.damping).unwrap_or(0.0);
                if link.joint != JointKind::Fixed {
                    let dof = joint_links.len();
                    link.dof = Some(dof);
                    joint_links.push(index);
                    chain.push(dof);
                }
            }

            if let Some(inertial) = &urdf_link.inertial {
                link.mass = inertial.mass;
                link.com = inertial.origin.xyz;
                link.inertia = inertial.inertia.diagonal();
            }

            for visual in &urdf_link.visuals {
                let color = visual
                    .color
                    .or_else(|| visual.material.as_deref().and_then(|m| robot.material_color(m)))
                    .unwrap_or(DEFAULT_LINK_COLOR);
                link.visuals.push(LinkVisual {
                    origin: Pose::new(visual.origin.xyz, visual.origin.rotation()),
                    shape: Shape::from(&visual.geometry),
                    color,
                });
            }

            for collision in &urdf_link.collisions {
                let origin = Pose::new(collision.origin.xyz, collision.origin.rotation());
                match &collision.geometry {
                    UrdfGeometry::Sphere { radius } => link.contact_points.push(ContactPoint {
                        offset: origin.position,
                        radius: *radius,
                        layer: CollisionLayer::FEET,
                    }),
                    geometry @ UrdfGeometry::Box { .. } => {
                        for corner in Shape::from(geometry).box_corners() {
                            link.contact_points.push(ContactPoint {
                                offset: origin.transform_point(corner),
                                radius: 0.0,
                                layer: CollisionLayer::BODY,
                            });
                        }
                    }
                    _ => {}
                }
            }

            links.push(link);
            ancestors.push(chain);

            if let Some(child_joints) = children.get(link_name) {
                for &child_joint in child_joints.iter().rev() {
                    let child = robot.joints[child_joint].child.as_str();
                    stack.push((child, Some(child_joint), Some(index)));
                }
            }
        }

        let total_mass: f64 = links.iter().map(|l| l.mass).sum();
        Ok(Self {
            name: robot.name.clone(),
            links,
            joint_links,
            ancestors,
            total_mass,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn link_index(&self, name: &str) -> Option<usize> {
        self.links.iter().position(|l| l.name == name)
    }

    /// Number of movable joints
    pub fn joint_count(&self) -> usize {
        self.joint_links.len()
    }

    /// Link driven by movable joint `dof`
    pub fn joint_link(&self, dof: usize) -> &Link {
        &self.links[self.joint_links[dof]]
    }

    /// Movable joint names in coordinate order
    pub fn joint_names(&self) -> Vec<&str> {
        self.joint_links
            .iter()
            .map(|&i| self.links[i].joint_name.as_deref().unwrap_or(""))
            .collect()
    }

    pub fn ancestor_dofs(&self, link: usize) -> &[usize] {
        &self.ancestors[link]
    }

    pub fn total_mass(&self) -> f64 {
        self.total_mass
    }

    /// World poses of every link for the given base pose and joint angles
    pub fn forward_kinematics(&self, base: Pose, joint_positions: &[f64]) -> Kinematics {
        let n = self.joint_count();
        let mut link_poses = Vec::with_capacity(self.links.len());
        let mut joint_origins = vec![Vec3::ZERO; n];
        let mut joint_axes = vec![Vec3::Z; n];

        for link in &self.links {
            let Some(parent) = link.parent else {
                link_poses.push(base);
                continue;
            };
            let joint_frame = link_poses[parent].compose(&link.origin);
            let pose = match link.dof {
                Some(dof) => {
                    let angle = joint_positions.get(dof).copied().unwrap_or(0.0);
                    joint_origins[dof] = joint_frame.position;
                    joint_axes[dof] = joint_frame.rotation.rotate(link.axis);
                    let rotation = Quat::from_axis_angle(link.axis, angle);
                    joint_frame.compose(&Pose::new(Vec3::ZERO, rotation))
                }
                None => joint_frame,
            };
            link_poses.push(pose);
        }

        Kinematics {
            link_poses,
            joint_origins,
            joint_axes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::urdf::parse_urdf_str;

    const LEG: &str = r#"
        <robot name="leg">
          <material name="dark"><color rgba="0.1 0.1 0.1 1"/></material>
          <link name="base">
            <inertial>
              <mass value="10"/>
              <inertia ixx="0.1" iyy="0.2" izz="0.3" ixy="0" ixz="0" iyz="0"/>
            </inertial>
            <visual><geometry><box size="0.4 0.2 0.1"/></geometry><material name="dark"/></visual>
            <collision><geometry><box size="0.4 0.2 0.1"/></geometry></collision>
          </link>
          <link name="thigh">
            <inertial>
              <origin xyz="0 0 -0.1"/>
              <mass value="1"/>
              <inertia ixx="0.01" iyy="0.01" izz="0.001" ixy="0" ixz="0" iyz="0"/>
            </inertial>
          </link>
          <link name="shank">
            <inertial>
              <origin xyz="0 0 -0.1"/>
              <mass value="0.5"/>
              <inertia ixx="0.005" iyy="0.005" izz="0.001" ixy="0" ixz="0" iyz="0"/>
            </inertial>
            <collision>
              <origin xyz="0 0 -0.2"/>
              <geometry><sphere radius="0.03"/></geometry>
            </collision>
          </link>
          <joint name="HFE" type="revolute">
            <parent link="base"/><child link="thigh"/>
            <origin xyz="0.2 0 0"/><axis xyz="0 1 0"/>
            <limit lower="-3" upper="3" effort="80" velocity="10"/>
          </joint>
          <joint name="KFE" type="revolute">
            <parent link="thigh"/><child link="shank"/>
            <origin xyz="0 0 -0.2"/><axis xyz="0 1 0"/>
            <limit lower="-3" upper="3" effort="80" velocity="10"/>
            <dynamics damping="0.1"/>
          </joint>
        </robot>"#;

    fn leg() -> KinematicTree {
        KinematicTree::from_urdf(&parse_urdf_str(LEG).unwrap()).unwrap()
    }

    #[test]
    fn test_topological_order() {
        let tree = leg();
        let names: Vec<&str> = tree.links().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["base", "thigh", "shank"]);
        assert_eq!(tree.joint_names(), vec!["HFE", "KFE"]);
        assert_eq!(tree.links()[0].joint, JointKind::Floating);
        assert_eq!(tree.links()[2].parent, Some(1));
        assert_eq!(tree.ancestor_dofs(2), &[0, 1]);
        assert_eq!(tree.joint_link(1).damping, 0.1);
    }

    #[test]
    fn test_mass_properties() {
        let tree = leg();
        assert!((tree.total_mass() - 11.5).abs() < 1e-12);
        assert_eq!(tree.links()[2].com, Vec3::new(0.0, 0.0, -0.1));
    }

    #[test]
    fn test_contact_points() {
        let tree = leg();
        assert_eq!(tree.links()[0].contact_points.len(), 8);
        assert!(tree.links()[0]
            .contact_points
            .iter()
            .all(|p| p.layer == CollisionLayer::BODY && p.radius == 0.0));
        let foot = tree.links()[2].contact_points[0];
        assert_eq!(foot.layer, CollisionLayer::FEET);
        assert_eq!(foot.offset, Vec3::new(0.0, 0.0, -0.2));
    }

    #[test]
    fn test_visual_material_color() {
        let tree = leg();
        assert_eq!(tree.links()[0].visuals[0].color, [0.1, 0.1, 0.1, 1.0]);
    }

    #[test]
    fn test_forward_kinematics() {
        let tree = leg();
        let half_pi = std::f64::consts::FRAC_PI_2;
        let kin = tree.forward_kinematics(Pose::IDENTITY, &[half_pi, 0.0]);
        // rotating +90° about y swings the thigh's -z toward -x
        let knee = kin.link_poses[2].position;
        assert!((knee.x - 0.0).abs() < 1e-9);
        assert!(knee.z.abs() < 1e-9);
        assert_eq!(kin.joint_origins[0], Vec3::new(0.2, 0.0, 0.0));
        assert!((kin.joint_axes[1] - Vec3::Y).length() < 1e-12);
    }

    #[test]
    fn test_joint_levers() {
        let tree = leg();
        let kin = tree.forward_kinematics(Pose::IDENTITY, &[0.0, 0.0]);
        let foot = Vec3::new(0.2, 0.0, -0.4);
        assert_eq!(tree.ancestor_dofs(2), &[0, 1]);
        // spinning about y moves a point 0.4 (hip) or 0.2 (knee) below the joint toward -x
        assert!((kin.lever(0, foot) - Vec3::new(-0.4, 0.0, 0.0)).length() < 1e-12);
        assert!((kin.lever(1, foot) - Vec3::new(-0.2, 0.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_prismatic_unsupported() {
        let xml = r#"<robot name="r"><link name="a"/><link name="b"/>
            <joint name="slide" type="prismatic"><parent link="a"/><child link="b"/>
            <limit lower="0" upper="1" effort="1" velocity="1"/></joint></robot>"#;
        let robot = parse_urdf_str(xml).unwrap();
        assert!(matches!(
            KinematicTree::from_urdf(&robot),
            Err(UrdfError::Unsupported(_))
        ));
    }
}
