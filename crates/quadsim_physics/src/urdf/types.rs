//! Parsed URDF structure
//!
//! These types mirror the URDF XML schema closely; [`crate::model`] turns
//! them into something the simulator can integrate.

use std::collections::{HashMap, HashSet};

use quadsim_math::{Quat, Vec3};

use super::error::UrdfError;

/// `<origin xyz=".." rpy=".."/>`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UrdfOrigin {
    pub xyz: Vec3,
    pub rpy: Vec3,
}

impl UrdfOrigin {
    pub fn new(xyz: Vec3, rpy: Vec3) -> Self {
        Self { xyz, rpy }
    }

    /// Rotation of the origin frame (fixed-axis roll, pitch, yaw)
    pub fn rotation(&self) -> Quat {
        Quat::from_rpy(self.rpy.x, self.rpy.y, self.rpy.z)
    }
}

/// Upper-triangular inertia tensor entries
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UrdfInertia {
    pub ixx: f64,
    pub ixy: f64,
    pub ixz: f64,
    pub iyy: f64,
    pub iyz: f64,
    pub izz: f64,
}

impl UrdfInertia {
    /// Principal diagonal; products of inertia are dropped
    pub fn diagonal(&self) -> Vec3 {
        Vec3::new(self.ixx, self.iyy, self.izz)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UrdfInertial {
    pub origin: UrdfOrigin,
    pub mass: f64,
    pub inertia: UrdfInertia,
}

impl Default for UrdfInertial {
    fn default() -> Self {
        Self {
            origin: UrdfOrigin::default(),
            mass: 1.0,
            inertia: UrdfInertia::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UrdfGeometry {
    /// Full edge lengths
    Box { size: Vec3 },
    Cylinder { radius: f64, length: f64 },
    Sphere { radius: f64 },
    Mesh { filename: String, scale: Option<Vec3> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct UrdfVisual {
    pub name: Option<String>,
    pub origin: UrdfOrigin,
    pub geometry: UrdfGeometry,
    /// Material name, resolved against the robot's named materials
    pub material: Option<String>,
    /// Inline `<color rgba=".."/>`
    pub color: Option<[f32; 4]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UrdfCollision {
    pub name: Option<String>,
    pub origin: UrdfOrigin,
    pub geometry: UrdfGeometry,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UrdfLink {
    pub name: String,
    pub inertial: Option<UrdfInertial>,
    pub visuals: Vec<UrdfVisual>,
    pub collisions: Vec<UrdfCollision>,
}

impl UrdfLink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inertial: None,
            visuals: Vec::new(),
            collisions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrdfJointType {
    Revolute,
    Continuous,
    Prismatic,
    Fixed,
    Floating,
    Planar,
}

impl UrdfJointType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "revolute" => Some(Self::Revolute),
            "continuous" => Some(Self::Continuous),
            "prismatic" => Some(Self::Prismatic),
            "fixed" => Some(Self::Fixed),
            "floating" => Some(Self::Floating),
            "planar" => Some(Self::Planar),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UrdfJointLimit {
    pub lower: f64,
    pub upper: f64,
    pub effort: f64,
    pub velocity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UrdfJointDynamics {
    pub damping: f64,
    pub friction: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UrdfJoint {
    pub name: String,
    pub joint_type: UrdfJointType,
    pub parent: String,
    pub child: String,
    pub origin: UrdfOrigin,
    pub axis: Vec3,
    pub limit: Option<UrdfJointLimit>,
    pub dynamics: Option<UrdfJointDynamics>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UrdfMaterial {
    pub name: String,
    pub color: Option<[f32; 4]>,
}

/// A parsed `<robot>` document
#[derive(Debug, Clone, PartialEq)]
pub struct UrdfRobot {
    pub name: String,
    pub links: Vec<UrdfLink>,
    pub joints: Vec<UrdfJoint>,
    pub materials: Vec<UrdfMaterial>,
}

impl UrdfRobot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            links: Vec::new(),
            joints: Vec::new(),
            materials: Vec::new(),
        }
    }

    pub fn link(&self, name: &str) -> Option<&UrdfLink> {
        self.links.iter().find(|l| l.name == name)
    }

    pub fn joint(&self, name: &str) -> Option<&UrdfJoint> {
        self.joints.iter().find(|j| j.name == name)
    }

    /// Colour of a named top-level material
    pub fn material_color(&self, name: &str) -> Option<[f32; 4]> {
        self.materials
            .iter()
            .find(|m| m.name == name)
            .and_then(|m| m.color)
    }

    /// Check the link/joint graph is a tree and return the root link name
    pub fn validate(&self) -> Result<&str, UrdfError> {
        let mut link_names = HashSet::new();
        for link in &self.links {
            if !link_names.insert(link.name.as_str()) {
                return Err(UrdfError::DuplicateLink(link.name.clone()));
            }
        }

        let mut joint_names = HashSet::new();
        let mut parent_of: HashMap<&str, &str> = HashMap::new();
        for joint in &self.joints {
            if !joint_names.insert(joint.name.as_str()) {
                return Err(UrdfError::DuplicateJoint(joint.name.clone()));
            }
            for link in [&joint.parent, &joint.child] {
                if !link_names.contains(link.as_str()) {
                    return Err(UrdfError::UndefinedLink {
                        link: link.clone(),
                        joint: joint.name.clone(),
                    });
                }
            }
            if parent_of.insert(joint.child.as_str(), joint.parent.as_str()).is_some() {
                return Err(UrdfError::KinematicLoop(joint.child.clone()));
            }
        }

        let roots: Vec<&str> = self
            .links
            .iter()
            .map(|l| l.name.as_str())
            .filter(|name| !parent_of.contains_key(name))
            .collect();

        match roots.as_slice() {
            [] => Err(UrdfError::NoRootLink),
            [root] => Ok(root),
            _ => Err(UrdfError::MultipleRootLinks(
                roots.iter().map(|s| s.to_string()).collect(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joint(name: &str, parent: &str, child: &str) -> UrdfJoint {
        UrdfJoint {
            name: name.to_string(),
            joint_type: UrdfJointType::Revolute,
            parent: parent.to_string(),
            child: child.to_string(),
            origin: UrdfOrigin::default(),
            axis: Vec3::Z,
            limit: None,
            dynamics: None,
        }
    }

    #[test]
    fn test_validate_finds_root() {
        let mut robot = UrdfRobot::new("r");
        robot.links.push(UrdfLink::new("base"));
        robot.links.push(UrdfLink::new("thigh"));
        robot.joints.push(joint("hip", "base", "thigh"));
        assert_eq!(robot.validate().unwrap(), "base");
    }

    #[test]
    fn test_validate_multiple_roots() {
        let mut robot = UrdfRobot::new("r");
        robot.links.push(UrdfLink::new("a"));
        robot.links.push(UrdfLink::new("b"));
        assert!(matches!(robot.validate(), Err(UrdfError::MultipleRootLinks(_))));
    }

    #[test]
    fn test_validate_undefined_link() {
        let mut robot = UrdfRobot::new("r");
        robot.links.push(UrdfLink::new("a"));
        robot.joints.push(joint("j", "a", "ghost"));
        assert!(matches!(robot.validate(), Err(UrdfError::UndefinedLink { .. })));
    }

    #[test]
    fn test_validate_two_parents() {
        let mut robot = UrdfRobot::new("r");
        for name in ["a", "b", "c"] {
            robot.links.push(UrdfLink::new(name));
        }
        robot.joints.push(joint("j1", "a", "c"));
        robot.joints.push(joint("j2", "b", "c"));
        assert!(matches!(robot.validate(), Err(UrdfError::KinematicLoop(_))));
    }

    #[test]
    fn test_joint_type_parse() {
        assert_eq!(UrdfJointType::parse("continuous"), Some(UrdfJointType::Continuous));
        assert_eq!(UrdfJointType::parse("hinge"), None);
    }
}
