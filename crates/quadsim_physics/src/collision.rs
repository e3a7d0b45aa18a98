//! Contact detection against ground planes
//!
//! Robot contact geometry is reduced to spheres (feet) and points (box
//! corners, radius zero). Layers decide which of them a ground reacts to.

use bitflags::bitflags;

use crate::shapes::{Plane, Sphere};
use quadsim_math::Vec3;

bitflags! {
    /// Collision layers for filtering which contact points a ground pushes on
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct CollisionLayer: u32 {
        /// Sphere collision geometry, typically feet
        const FEET = 1 << 0;
        /// Box corners of the trunk and other links
        const BODY = 1 << 1;
        /// All layers
        const ALL = 0xFFFFFFFF;
    }
}

/// Contact information from a collision
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    /// Deepest point of the sphere, on the plane side
    pub point: Vec3,
    /// Plane normal, pointing out of the ground
    pub normal: Vec3,
    /// How far the sphere reaches below the plane
    pub penetration: f64,
}

impl Contact {
    pub fn new(point: Vec3, normal: Vec3, penetration: f64) -> Self {
        Self {
            point,
            normal,
            penetration,
        }
    }

    pub fn is_colliding(&self) -> bool {
        self.penetration > 0.0
    }
}

/// Test a sphere against a plane
///
/// Returns `None` when the sphere is entirely above the plane.
pub fn sphere_vs_plane(sphere: &Sphere, plane: &Plane) -> Option<Contact> {
    let distance = plane.signed_distance(sphere.center);
    let penetration = sphere.radius - distance;
    if penetration <= 0.0 {
        return None;
    }
    let point = sphere.center - plane.normal * sphere.radius;
    Some(Contact::new(point, plane.normal, penetration))
}
