//! Shadow map pass
//!
//! Renders scene depth from the directional light into one layer per
//! cascade. Cascades split the distance from the camera up to the shadow
//! far distance; each covers the bounding sphere of its slice of the view
//! frustum with an orthographic projection.

use wgpu::util::DeviceExt;

use quadsim_math::mat4::{self, Mat4};

use super::gpu_buffer::MeshBuffers;
use super::scene_pipeline::mesh_vertex_layout;
use super::targets::DEPTH_FORMAT;
use super::types::{ShadowUniforms, MAX_CASCADES};
use crate::camera::OrbitCamera;

/// Room behind each cascade for casters outside the view
const CASTER_MARGIN: f32 = 10.0;

/// Blend between logarithmic (1) and uniform (0) cascade splits
pub const SPLIT_LAMBDA: f32 = 0.6;

/// Depth-only pipeline writing a layered shadow map
pub struct ShadowPipeline {
    pipeline: wgpu::RenderPipeline,
    layer_views: Vec<wgpu::TextureView>,
    array_view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    cascades: Vec<(wgpu::Buffer, wgpu::BindGroup)>,
    size: u32,
}

impl ShadowPipeline {
    /// Create a shadow map of `size`² texels with `cascade_count` layers (1 to 4)
    pub fn new(device: &wgpu::Device, size: u32, cascade_count: u32) -> Self {
        let cascade_count = cascade_count.clamp(1, MAX_CASCADES as u32);
        let size = size.clamp(16, device.limits().max_texture_dimension_2d);

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Shadow Map"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: cascade_count,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let layer_views = (0..cascade_count)
            .map(|layer| {
                texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some("Shadow Cascade View"),
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    base_array_layer: layer,
                    array_layer_count: Some(1),
                    ..Default::default()
                })
            })
            .collect();

        let array_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Shadow Map Array View"),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let cascades = (0..cascade_count)
            .map(|_| {
                let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Shadow Uniform Buffer"),
                    contents: bytemuck::bytes_of(&ShadowUniforms {
                        light_view_projection: mat4::IDENTITY,
                    }),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Shadow Bind Group"),
                    layout: &bind_group_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    }],
                });
                (buffer, bind_group)
            })
            .collect();

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shadow Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shadow Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/shadow.wgsl").into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shadow Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[mesh_vertex_layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        log::info!("Shadow map: {}x{} texels, {} cascade(s)", size, size, cascade_count);

        Self {
            pipeline,
            layer_views,
            array_view,
            sampler,
            cascades,
            size,
        }
    }

    pub fn cascade_count(&self) -> usize {
        self.cascades.len()
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// View over all cascade layers, for sampling
    pub fn array_view(&self) -> &wgpu::TextureView {
        &self.array_view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// Upload the light matrix of each cascade
    pub fn update_cascades(&self, queue: &wgpu::Queue, matrices: &[Mat4]) {
        for ((buffer, _), matrix) in self.cascades.iter().zip(matrices) {
            let uniforms = ShadowUniforms {
                light_view_projection: *matrix,
            };
            queue.write_buffer(buffer, 0, bytemuck::bytes_of(&uniforms));
        }
    }

    /// Render every mesh into every cascade
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, meshes: &[&MeshBuffers]) {
        for ((_, bind_group), view) in self.cascades.iter().zip(&self.layer_views) {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            for mesh in meshes {
                mesh.draw(&mut pass);
            }
        }
    }
}

/// Far distance of each cascade, from the camera
///
/// Blends logarithmic and uniform splitting of `[near, far]`; the last
/// split is always `far`.
pub fn cascade_splits(near: f32, far: f32, count: usize, lambda: f32) -> Vec<f32> {
    let count = count.max(1);
    let near = near.max(1e-3);
    (1..=count)
        .map(|i| {
            let t = i as f32 / count as f32;
            let log = near * (far / near).powf(t);
            let uniform = near + (far - near) * t;
            lambda * log + (1.0 - lambda) * uniform
        })
        .collect()
}

/// Bounding sphere of the view frustum between two distances
pub fn frustum_slice_bounds(
    camera: &OrbitCamera,
    aspect: f32,
    near: f32,
    far: f32,
) -> ([f32; 3], f32) {
    let eye = camera.eye();
    let f = camera.forward();
    let r = camera.right();
    let u = camera.up();
    let mid = 0.5 * (near + far);
    let center = [eye[0] + f[0] * mid, eye[1] + f[1] * mid, eye[2] + f[2] * mid];

    let tan = (0.5 * camera.fov_y).tan();
    let mut radius: f32 = 0.0;
    for depth in [near, far] {
        let half_h = depth * tan;
        let half_w = half_h * aspect;
        for (sw, sh) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let corner = [
                eye[0] + f[0] * depth + r[0] * sw * half_w + u[0] * sh * half_h,
                eye[1] + f[1] * depth + r[1] * sw * half_w + u[1] * sh * half_h,
                eye[2] + f[2] * depth + r[2] * sw * half_w + u[2] * sh * half_h,
            ];
            let d = [corner[0] - center[0], corner[1] - center[1], corner[2] - center[2]];
            radius = radius.max((d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt());
        }
    }
    (center, radius)
}

/// Orthographic light view-projection covering a sphere
///
/// `light_direction` is the direction the light travels.
pub fn light_view_projection(light_direction: [f32; 3], center: [f32; 3], radius: f32) -> Mat4 {
    let len = light_direction.iter().map(|c| c * c).sum::<f32>().sqrt();
    let dir = if len > 0.0 {
        [light_direction[0] / len, light_direction[1] / len, light_direction[2] / len]
    } else {
        [0.0, 0.0, -1.0]
    };
    let back = radius + CASTER_MARGIN;
    let eye = [center[0] - dir[0] * back, center[1] - dir[1] * back, center[2] - dir[2] * back];
    let up = if dir[2].abs() > 0.99 { [1.0, 0.0, 0.0] } else { [0.0, 0.0, 1.0] };

    let view = mat4::look_at(eye, center, up);
    let projection = mat4::orthographic(-radius, radius, -radius, radius, 0.0, back + radius);
    mat4::mul(projection, view)
}

/// Light matrices for each cascade plus their split distances
pub fn cascade_matrices(
    camera: &OrbitCamera,
    aspect: f32,
    light_direction: [f32; 3],
    shadow_far: f32,
    cascade_count: usize,
) -> (Vec<Mat4>, Vec<f32>) {
    let splits = cascade_splits(camera.near, shadow_far, cascade_count, SPLIT_LAMBDA);
    let mut near = camera.near;
    let matrices = splits
        .iter()
        .map(|&far| {
            let (center, radius) = frustum_slice_bounds(camera, aspect, near, far);
            near = far;
            light_view_projection(light_direction, center, radius)
        })
        .collect();
    (matrices, splits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_split_is_far() {
        let splits = cascade_splits(0.05, 10.0, 1, SPLIT_LAMBDA);
        assert_eq!(splits.len(), 1);
        assert!((splits[0] - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_splits_increase_to_far() {
        let splits = cascade_splits(0.05, 10.0, 3, SPLIT_LAMBDA);
        assert_eq!(splits.len(), 3);
        assert!(splits.windows(2).all(|w| w[1] > w[0]));
        assert!((splits[2] - 10.0).abs() < 1e-4);
        assert!(splits[0] > 0.05);
    }

    #[test]
    fn test_uniform_splits() {
        let splits = cascade_splits(1.0, 4.0, 3, 0.0);
        for (split, expected) in splits.iter().zip([2.0, 3.0, 4.0]) {
            assert!((split - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn test_slice_bounds_contain_corners() {
        let camera = OrbitCamera::default();
        let (center, radius) = frustum_slice_bounds(&camera, 1.5, 1.0, 3.0);
        let eye = camera.eye();
        let f = camera.forward();
        let on_axis = [eye[0] + f[0] * 3.0, eye[1] + f[1] * 3.0, eye[2] + f[2] * 3.0];
        let d: f32 = (0..3).map(|i| (on_axis[i] - center[i]).powi(2)).sum::<f32>().sqrt();
        assert!(d <= radius);
        assert!((d - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_light_matrix_centers_sphere() {
        let center = [1.0, -2.0, 0.3];
        let m = light_view_projection([-3.0, -3.0, -0.5], center, 2.0);
        let p = mat4::transform_point(m, center);
        assert!(p[0].abs() < 1e-4 && p[1].abs() < 1e-4);
        assert!(p[2] > 0.0 && p[2] < 1.0);
    }

    #[test]
    fn test_light_matrix_vertical_light() {
        let m = light_view_projection([0.0, 0.0, -1.0], [0.0; 3], 1.0);
        let p = mat4::transform_point(m, [0.5, 0.0, 0.0]);
        assert!(p.iter().all(|v| v.is_finite()));
        assert!(p[0].abs() <= 1.0 && p[1].abs() <= 1.0);
    }

    #[test]
    fn test_cascade_matrices_count() {
        let camera = OrbitCamera::default();
        let (matrices, splits) = cascade_matrices(&camera, 1.5, [-3.0, -3.0, -0.5], 10.0, 3);
        assert_eq!(matrices.len(), 3);
        assert_eq!(splits.len(), 3);
    }
}
