//! 2D overlay pass: translucent panels and line plots in screen space

use super::gpu_buffer::DynamicBuffer;
use super::targets::FrameTargets;
use super::types::OverlayVertex;

/// Overlay geometry for one frame
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlayGeometry {
    /// Triangle list
    pub panels: Vec<OverlayVertex>,
    /// Line list
    pub lines: Vec<OverlayVertex>,
}

impl OverlayGeometry {
    pub fn is_empty(&self) -> bool {
        self.panels.is_empty() && self.lines.is_empty()
    }

    /// Add an axis-aligned rectangle as two triangles
    pub fn add_rect(&mut self, min: [f32; 2], max: [f32; 2], color: [f32; 4]) {
        let corners = [
            [min[0], min[1]],
            [max[0], min[1]],
            [max[0], max[1]],
            [min[0], max[1]],
        ];
        for i in [0, 1, 2, 0, 2, 3] {
            self.panels.push(OverlayVertex::new(corners[i], color));
        }
    }

    pub fn add_line(&mut self, a: [f32; 2], b: [f32; 2], color: [f32; 4]) {
        self.lines.push(OverlayVertex::new(a, color));
        self.lines.push(OverlayVertex::new(b, color));
    }

    /// Add a polyline as separate segments
    pub fn add_strip(&mut self, points: &[[f32; 2]], color: [f32; 4]) {
        for pair in points.windows(2) {
            self.add_line(pair[0], pair[1], color);
        }
    }
}

/// Screen-space renderer for panels and lines
pub struct OverlayPipeline {
    panel_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    panels: DynamicBuffer,
    lines: DynamicBuffer,
}

impl OverlayPipeline {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Overlay Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/overlay.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Overlay Pipeline Layout"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });

        let create = |label: &str, topology: wgpu::PrimitiveTopology| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[Self::vertex_buffer_layout()],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState {
                    count: sample_count,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
                cache: None,
            })
        };

        Self {
            panel_pipeline: create("Overlay Panel Pipeline", wgpu::PrimitiveTopology::TriangleList),
            line_pipeline: create("Overlay Line Pipeline", wgpu::PrimitiveTopology::LineList),
            panels: DynamicBuffer::new(device, "Overlay Panels", wgpu::BufferUsages::VERTEX),
            lines: DynamicBuffer::new(device, "Overlay Lines", wgpu::BufferUsages::VERTEX),
        }
    }

    fn vertex_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<OverlayVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // position: vec2<f32>
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 0,
                    shader_location: 0,
                },
                // color: vec4<f32>
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: 8,
                    shader_location: 1,
                },
            ],
        }
    }

    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        geometry: &OverlayGeometry,
    ) {
        self.panels.write(device, queue, &geometry.panels);
        self.lines.write(device, queue, &geometry.lines);
    }

    /// Draw the uploaded overlay and resolve the frame into the surface
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        targets: &FrameTargets,
        surface_view: &wgpu::TextureView,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Overlay Pass"),
            color_attachments: &[Some(targets.color_attachment(
                surface_view,
                wgpu::LoadOp::Load,
                true,
            ))],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if !self.panels.is_empty() {
            pass.set_pipeline(&self.panel_pipeline);
            pass.set_vertex_buffer(0, self.panels.buffer().slice(..));
            pass.draw(0..self.panels.len(), 0..1);
        }
        if !self.lines.is_empty() {
            pass.set_pipeline(&self.line_pipeline);
            pass.set_vertex_buffer(0, self.lines.buffer().slice(..));
            pass.draw(0..self.lines.len(), 0..1);
        }
    }
}
