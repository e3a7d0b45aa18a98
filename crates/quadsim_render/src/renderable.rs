//! Renderable geometry - bridges simulator shapes to GPU buffers
//!
//! This module turns primitive shapes placed in the world into one
//! indexed triangle list ready for upload.

use quadsim_math::Vec3;
use quadsim_physics::Shape;

use crate::geometry::primitives::{self, PrimitiveMesh};
use crate::geometry::Placement;
use crate::pipeline::Vertex3D;

/// Tessellation for round shapes
const SEGMENTS: u32 = 20;
const RINGS: u32 = 10;

/// GPU-ready geometry
///
/// This struct holds world-space vertices and triangle indices in a
/// format ready for upload to GPU buffers.
#[derive(Clone, Debug, Default)]
pub struct RenderableGeometry {
    pub vertices: Vec<Vertex3D>,
    pub indices: Vec<u32>,
}

impl RenderableGeometry {
    /// Create an empty renderable geometry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create renderable geometry with pre-allocated capacity
    pub fn with_capacity(vertex_capacity: usize, index_capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_capacity),
            indices: Vec::with_capacity(index_capacity),
        }
    }

    /// Add a local-frame mesh placed in the world
    pub fn add_mesh(&mut self, mesh: &PrimitiveMesh, placement: &Placement, color: [f32; 4]) {
        let offset = self.vertices.len() as u32;
        for (p, n) in mesh.positions.iter().zip(&mesh.normals) {
            self.vertices.push(Vertex3D::new(
                placement.transform_point(*p),
                placement.rotate(*n),
                color,
            ));
        }
        self.indices.extend(mesh.indices.iter().map(|i| i + offset));
    }

    /// Add a simulator shape
    ///
    /// Returns false for shapes that cannot be drawn (external meshes).
    pub fn add_shape(&mut self, shape: &Shape, placement: &Placement, color: [f32; 4]) -> bool {
        let mesh = match shape {
            Shape::Box { half_extents } => primitives::cuboid(half_extents.to_f32_array()),
            Shape::Cylinder { radius, half_length } => {
                primitives::cylinder(*radius as f32, *half_length as f32, SEGMENTS)
            }
            Shape::Sphere { radius } => primitives::sphere(*radius as f32, RINGS, SEGMENTS),
            Shape::Mesh { .. } => return false,
        };
        self.add_mesh(&mesh, placement, color);
        true
    }

    pub fn add_sphere(&mut self, center: [f32; 3], radius: f32, color: [f32; 4]) {
        let mesh = primitives::sphere(radius, RINGS, SEGMENTS);
        self.add_mesh(&mesh, &Placement::from_translation(center), color);
    }

    /// Add an arrow from `start` along `vector`; the head takes a fifth of the length
    pub fn add_arrow(&mut self, start: Vec3, vector: Vec3, radius: f32, color: [f32; 4]) {
        let length = vector.length() as f32;
        if length <= f32::EPSILON {
            return;
        }
        let placement = Placement::aligned_z(start, vector);
        let head = (0.2 * length).min(6.0 * radius);
        let shaft = length - head;

        let shaft_mesh = primitives::cylinder(radius, 0.5 * shaft, SEGMENTS / 2);
        let head_mesh = primitives::frustum(2.0 * radius, 0.0, 0.5 * head, SEGMENTS / 2);
        self.add_mesh(&shaft_mesh, &shifted(&placement, 0.5 * shaft), color);
        self.add_mesh(&head_mesh, &shifted(&placement, shaft + 0.5 * head), color);
    }

    /// Append another geometry
    pub fn extend(&mut self, other: &RenderableGeometry) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| i + offset));
    }

    /// Clear all geometry
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Move a placement along its own z axis
fn shifted(placement: &Placement, distance: f32) -> Placement {
    let z = placement.rotate([0.0, 0.0, distance]);
    let t = placement.translation;
    Placement {
        rotation: placement.rotation,
        translation: [t[0] + z[0], t[1] + z[1], t[2] + z[2]],
    }
}

/// Utility struct for building geometry with checkerboard patterns
#[derive(Clone, Debug, PartialEq)]
pub struct CheckerboardGeometry {
    /// Colors for the checkerboard pattern
    pub color_a: [f32; 4],
    pub color_b: [f32; 4],
    /// Size of each checker cell
    pub cell_size: f32,
}

impl CheckerboardGeometry {
    /// Create a new checkerboard with the given colors and cell size
    pub fn new(color_a: [f32; 4], color_b: [f32; 4], cell_size: f32) -> Self {
        Self {
            color_a,
            color_b,
            cell_size: cell_size.max(1e-3),
        }
    }

    /// Green and pale tiles
    pub fn green(cell_size: f32) -> Self {
        Self::new([0.30, 0.52, 0.30, 1.0], [0.78, 0.84, 0.76, 1.0], cell_size)
    }

    /// Get the color for a ground position
    pub fn color_for_position(&self, x: f32, y: f32) -> [f32; 4] {
        let cx = (x / self.cell_size).floor() as i32;
        let cy = (y / self.cell_size).floor() as i32;
        if (cx + cy).rem_euclid(2) == 0 {
            self.color_a
        } else {
            self.color_b
        }
    }

    /// Square tiled floor spanning `[-half_size, half_size]` on x and y at `height`
    pub fn build(&self, half_size: f32, height: f32) -> RenderableGeometry {
        let cells = ((2.0 * half_size / self.cell_size).ceil() as i32).max(1);
        let cell_count = (cells * cells) as usize;
        let mut geometry = RenderableGeometry::with_capacity(cell_count * 4, cell_count * 6);
        let normal = [0.0, 0.0, 1.0];

        for i in 0..cells {
            for j in 0..cells {
                let x0 = -half_size + i as f32 * self.cell_size;
                let y0 = -half_size + j as f32 * self.cell_size;
                let x1 = (x0 + self.cell_size).min(half_size);
                let y1 = (y0 + self.cell_size).min(half_size);
                let color = self.color_for_position(0.5 * (x0 + x1), 0.5 * (y0 + y1));

                let base = geometry.vertices.len() as u32;
                for (x, y) in [(x0, y0), (x1, y0), (x1, y1), (x0, y1)] {
                    geometry.vertices.push(Vertex3D::new([x, y, height], normal, color));
                }
                geometry
                    .indices
                    .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
            }
        }
        geometry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

    #[test]
    fn test_renderable_geometry_new() {
        let geometry = RenderableGeometry::new();
        assert_eq!(geometry.vertex_count(), 0);
        assert!(geometry.is_empty());
    }

    #[test]
    fn test_add_shape_box() {
        let mut geometry = RenderableGeometry::new();
        let shape = Shape::Box { half_extents: Vec3::new(0.5, 0.5, 0.5) };
        assert!(geometry.add_shape(&shape, &Placement::from_translation([0.0, 0.0, 2.0]), RED));
        assert_eq!(geometry.vertex_count(), 24);
        assert_eq!(geometry.triangle_count(), 12);
        assert!(geometry.vertices.iter().all(|v| v.position[2] >= 1.5 && v.position[2] <= 2.5));
        assert!(geometry.vertices.iter().all(|v| v.color == RED));
    }

    #[test]
    fn test_mesh_shape_skipped() {
        let mut geometry = RenderableGeometry::new();
        let shape = Shape::Mesh {
            filename: "base.dae".to_string(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        };
        assert!(!geometry.add_shape(&shape, &Placement::IDENTITY, RED));
        assert!(geometry.is_empty());
    }

    #[test]
    fn test_indices_offset() {
        let mut geometry = RenderableGeometry::new();
        geometry.add_sphere([0.0; 3], 0.1, RED);
        let first = geometry.vertex_count() as u32;
        geometry.add_sphere([1.0, 0.0, 0.0], 0.1, RED);
        assert_eq!(geometry.indices.iter().copied().max(), Some(2 * first - 1));
        let second_half = &geometry.indices[geometry.indices.len() / 2..];
        assert!(second_half.iter().all(|&i| i >= first));
    }

    #[test]
    fn test_arrow_spans_vector() {
        let mut geometry = RenderableGeometry::new();
        geometry.add_arrow(Vec3::new(0.0, 0.0, 0.1), Vec3::new(0.0, 0.0, 0.5), 0.01, RED);
        let max_z = geometry.vertices.iter().map(|v| v.position[2]).fold(f32::MIN, f32::max);
        let min_z = geometry.vertices.iter().map(|v| v.position[2]).fold(f32::MAX, f32::min);
        assert!((max_z - 0.6).abs() < 1e-5);
        assert!((min_z - 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_zero_arrow_skipped() {
        let mut geometry = RenderableGeometry::new();
        geometry.add_arrow(Vec3::ZERO, Vec3::ZERO, 0.01, RED);
        assert!(geometry.is_empty());
    }

    #[test]
    fn test_checkerboard_color() {
        let checker = CheckerboardGeometry::new(RED, [0.0, 0.0, 1.0, 1.0], 1.0);
        assert_eq!(checker.color_for_position(0.5, 0.5), RED);
        assert_eq!(checker.color_for_position(1.5, 0.5), [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(checker.color_for_position(-0.5, -0.5), RED);
    }

    #[test]
    fn test_checkerboard_build() {
        let checker = CheckerboardGeometry::green(0.5);
        let floor = checker.build(10.0, 0.0);
        assert_eq!(floor.triangle_count(), 40 * 40 * 2);
        assert!(floor.vertices.iter().all(|v| v.position[2] == 0.0 && v.normal == [0.0, 0.0, 1.0]));
        let max_x = floor.vertices.iter().map(|v| v.position[0]).fold(f32::MIN, f32::max);
        assert!((max_x - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_extend() {
        let mut a = RenderableGeometry::new();
        a.add_sphere([0.0; 3], 0.1, RED);
        let mut b = RenderableGeometry::new();
        b.add_sphere([1.0, 0.0, 0.0], 0.1, RED);
        let count = a.vertex_count();
        a.extend(&b);
        assert_eq!(a.vertex_count(), 2 * count);
        assert_eq!(a.indices[a.indices.len() - 1], b.indices[b.indices.len() - 1] + count as u32);
    }
}
