//! Triangle meshes for primitive shapes
//!
//! Each primitive is built in its local frame, centered at the origin, with
//! counter-clockwise front faces and outward normals. Cylinders and cones
//! run along the local z axis.

use std::f32::consts::{PI, TAU};

/// A local-frame mesh: positions, normals and triangle indices
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrimitiveMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl PrimitiveMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn push(&mut self, position: [f32; 3], normal: [f32; 3]) -> u32 {
        self.positions.push(position);
        self.normals.push(normal);
        (self.positions.len() - 1) as u32
    }
}

/// Axis-aligned box with the given half extents
pub fn cuboid(half_extents: [f32; 3]) -> PrimitiveMesh {
    let mut mesh = PrimitiveMesh::default();
    for axis in 0..3 {
        let u_axis = (axis + 1) % 3;
        let v_axis = (axis + 2) % 3;
        for sign in [1.0f32, -1.0] {
            // u x v must point along the face normal
            let (u_axis, v_axis) = if sign > 0.0 { (u_axis, v_axis) } else { (v_axis, u_axis) };
            let mut normal = [0.0; 3];
            normal[axis] = sign;

            let base = mesh.positions.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let mut p = [0.0; 3];
                p[axis] = sign * half_extents[axis];
                p[u_axis] = su * half_extents[u_axis];
                p[v_axis] = sv * half_extents[v_axis];
                mesh.push(p, normal);
            }
            mesh.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
    }
    mesh
}

/// UV sphere
pub fn sphere(radius: f32, rings: u32, segments: u32) -> PrimitiveMesh {
    let rings = rings.max(2);
    let segments = segments.max(3);
    let mut mesh = PrimitiveMesh::default();

    for ring in 0..=rings {
        let theta = PI * ring as f32 / rings as f32;
        let (st, ct) = theta.sin_cos();
        for segment in 0..=segments {
            let phi = TAU * segment as f32 / segments as f32;
            let (sp, cp) = phi.sin_cos();
            let n = [st * cp, st * sp, ct];
            mesh.push([n[0] * radius, n[1] * radius, n[2] * radius], n);
        }
    }

    let stride = segments + 1;
    for ring in 0..rings {
        for segment in 0..segments {
            let a = ring * stride + segment;
            let b = a + stride;
            mesh.indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }
    mesh
}

/// Capped frustum along z; equal radii give a cylinder, a zero top radius a cone
pub fn frustum(
    bottom_radius: f32,
    top_radius: f32,
    half_length: f32,
    segments: u32,
) -> PrimitiveMesh {
    let segments = segments.max(3);
    let mut mesh = PrimitiveMesh::default();
    let slope = (bottom_radius - top_radius) / (2.0 * half_length).max(f32::EPSILON);

    for segment in 0..=segments {
        let phi = TAU * segment as f32 / segments as f32;
        let (sp, cp) = phi.sin_cos();
        let n = normalize([cp, sp, slope]);
        mesh.push([bottom_radius * cp, bottom_radius * sp, -half_length], n);
        mesh.push([top_radius * cp, top_radius * sp, half_length], n);
    }
    for segment in 0..segments {
        let i0 = 2 * segment;
        let (i1, i2, i3) = (i0 + 1, i0 + 2, i0 + 3);
        mesh.indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
    }

    for (z, radius, normal) in [
        (half_length, top_radius, [0.0, 0.0, 1.0f32]),
        (-half_length, bottom_radius, [0.0, 0.0, -1.0]),
    ] {
        if radius <= 0.0 {
            continue;
        }
        let center = mesh.push([0.0, 0.0, z], normal);
        let first = center + 1;
        for segment in 0..=segments {
            let phi = TAU * segment as f32 / segments as f32;
            let (sp, cp) = phi.sin_cos();
            mesh.push([radius * cp, radius * sp, z], normal);
        }
        for segment in 0..segments {
            let (a, b) = (first + segment, first + segment + 1);
            if normal[2] > 0.0 {
                mesh.indices.extend_from_slice(&[center, a, b]);
            } else {
                mesh.indices.extend_from_slice(&[center, b, a]);
            }
        }
    }
    mesh
}

/// Cylinder along z
pub fn cylinder(radius: f32, half_length: f32, segments: u32) -> PrimitiveMesh {
    frustum(radius, radius, half_length, segments)
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len > 0.0 {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        v
    }
}
