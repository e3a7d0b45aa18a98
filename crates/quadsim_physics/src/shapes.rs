//! Collision and visual shapes
//!
//! [`Sphere`] and [`Plane`] are the primitives contact detection works on.
//! [`Shape`] describes link geometry as it appears in a robot description.

use quadsim_math::Vec3;

use crate::urdf::UrdfGeometry;

/// A sphere defined by center and radius
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f64,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f64) -> Self {
        Self { center, radius }
    }
}

/// An infinite plane defined by normal and distance from origin
///
/// The plane equation is: normal · point = distance
/// Points with normal · point > distance are "above" the plane (positive side)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    /// Unit normal vector pointing to the positive side
    pub normal: Vec3,
    /// Signed distance from origin along the normal
    pub distance: f64,
}

impl Plane {
    /// Create a new plane; the normal is normalized
    pub fn new(normal: Vec3, distance: f64) -> Self {
        Self {
            normal: normal.normalized(),
            distance,
        }
    }

    /// Horizontal ground plane at the given height (z-up)
    pub fn horizontal(height: f64) -> Self {
        Self::new(Vec3::Z, height)
    }

    /// Signed distance from the plane (positive above)
    pub fn signed_distance(&self, point: Vec3) -> f64 {
        self.normal.dot(point) - self.distance
    }

    /// Project a point onto the plane
    pub fn project(&self, point: Vec3) -> Vec3 {
        point - self.normal * self.signed_distance(point)
    }
}

/// Geometry attached to a link
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Box { half_extents: Vec3 },
    /// Axis along the local z axis
    Cylinder { radius: f64, half_length: f64 },
    Sphere { radius: f64 },
    /// External mesh file; not simulated and only drawn if the renderer can load it
    Mesh { filename: String, scale: Vec3 },
}

impl Shape {
    /// Corner points of a box in its local frame, empty for other shapes
    pub fn box_corners(&self) -> Vec<Vec3> {
        match self {
            Shape::Box { half_extents: h } => {
                let mut corners = Vec::with_capacity(8);
                for sx in [-1.0, 1.0] {
                    for sy in [-1.0, 1.0] {
                        for sz in [-1.0, 1.0] {
                            corners.push(Vec3::new(h.x * sx, h.y * sy, h.z * sz));
                        }
                    }
                }
                corners
            }
            _ => Vec::new(),
        }
    }
}

impl From<&UrdfGeometry> for Shape {
    fn from(geometry: &UrdfGeometry) -> Self {
        match geometry {
            UrdfGeometry::Box { size } => Shape::Box {
                half_extents: *size * 0.5,
            },
            UrdfGeometry::Cylinder { radius, length } => Shape::Cylinder {
                radius: *radius,
                half_length: length * 0.5,
            },
            UrdfGeometry::Sphere { radius } => Shape::Sphere { radius: *radius },
            UrdfGeometry::Mesh { filename, scale } => Shape::Mesh {
                filename: filename.clone(),
                scale: scale.unwrap_or(Vec3::new(1.0, 1.0, 1.0)),
            },
        }
    }
}
