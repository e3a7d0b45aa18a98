//! GPU rendering system
//!
//! Manages GPU rendering including:
//! - Render context, surface and frame targets
//! - Shadow, sky, scene and overlay pipelines
//! - Ground and robot meshes
//! - Frame rendering

use std::sync::Arc;
use winit::window::Window;

use quadsim_core::{ArticulatedSystem, LightSettings, Scene, ShadowTechnique, TelemetryBuffer};
use quadsim_math::mat4::Mat4;
use quadsim_render::{
    camera::OrbitCamera,
    context::{ContextError, RenderContext},
    geometry::{contact_geometry, robot_geometry, ContactStyle, VisualFlags},
    pipeline::{
        cascade_matrices, FrameTargets, MeshBuffers, OverlayGeometry, OverlayPipeline,
        ScenePipeline, SceneUniforms, ShadowPipeline, SkyPipeline, MAX_CASCADES,
    },
    plot::{build_overlay, PlotLayout},
    CheckerboardGeometry,
};
use crate::config::RenderingConfig;

/// Render error types
#[derive(Debug)]
pub enum RenderError {
    /// GPU setup failed
    Context(ContextError),
    /// Surface was lost (window resized, minimized, etc.)
    SurfaceLost,
    /// GPU out of memory
    OutOfMemory,
    /// Other surface error
    Other(String),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::Context(e) => write!(f, "GPU setup failed: {}", e),
            RenderError::SurfaceLost => write!(f, "Surface lost"),
            RenderError::OutOfMemory => write!(f, "Out of memory"),
            RenderError::Other(msg) => write!(f, "Render error: {}", msg),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Context(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ContextError> for RenderError {
    fn from(e: ContextError) -> Self {
        RenderError::Context(e)
    }
}

/// Scene-derived settings the renderer needs every frame
struct SceneLook {
    lighting: LightSettings,
    shadow_far: f32,
    sky_enabled: bool,
    sky_rotation: [[f32; 3]; 3],
    contact_style: ContactStyle,
}

/// Manages GPU rendering
pub struct RenderSystem {
    context: RenderContext,
    targets: FrameTargets,
    shadows: ShadowPipeline,
    scene: ScenePipeline,
    sky: SkyPipeline,
    overlay: OverlayPipeline,
    ground: MeshBuffers,
    robot: MeshBuffers,
    look: SceneLook,
    render_config: RenderingConfig,
    plot_layout: PlotLayout,
}

impl RenderSystem {
    /// Create render system from window, scene and config
    pub fn new(
        window: Arc<Window>,
        scene: &Scene,
        render_config: RenderingConfig,
        vsync: bool,
    ) -> Result<Self, RenderError> {
        let context = pollster::block_on(RenderContext::new(
            window,
            vsync,
            render_config.msaa_samples,
        ))?;
        let format = context.config.format;
        let sample_count = context.sample_count;

        let targets = FrameTargets::new(
            &context.device,
            format,
            context.size.width,
            context.size.height,
            sample_count,
        );

        let cascade_count = match scene.shadows.technique {
            ShadowTechnique::Cascaded => scene.shadows.texture_count,
            ShadowTechnique::Single => 1,
        };
        let shadows =
            ShadowPipeline::new(&context.device, scene.shadows.texture_size, cascade_count);
        let scene_pipeline = ScenePipeline::new(&context.device, format, sample_count, &shadows);
        let sky = SkyPipeline::new(&context.device, format, sample_count);
        let overlay = OverlayPipeline::new(&context.device, format, sample_count);

        let ground_geometry = CheckerboardGeometry::green(scene.ground.checker_size)
            .build(scene.ground.visual_size, scene.ground.height as f32);
        let mut ground = MeshBuffers::new(&context.device, "Ground");
        ground.upload(
            &context.device,
            &context.queue,
            &ground_geometry.vertices,
            &ground_geometry.indices,
        );

        log::info!(
            "Renderer ready: {:?}, {}x MSAA, {} shadow cascade(s) at {}px",
            format,
            sample_count,
            shadows.cascade_count(),
            shadows.size()
        );

        let robot = MeshBuffers::new(&context.device, "Robot");

        Ok(Self {
            context,
            targets,
            shadows,
            scene: scene_pipeline,
            sky,
            overlay,
            ground,
            robot,
            look: SceneLook {
                lighting: scene.lighting.clone(),
                shadow_far: scene.shadows.far_distance,
                sky_enabled: scene.sky.enabled,
                sky_rotation: scene.sky.rotation().to_rotation_columns(),
                contact_style: ContactStyle::from(&scene.contacts),
            },
            render_config,
            plot_layout: PlotLayout::default(),
        })
    }

    /// Handle window resize
    pub fn resize(&mut self, width: u32, height: u32) {
        self.context.resize(winit::dpi::PhysicalSize::new(width, height));
        self.targets.resize(&self.context.device, width, height);
    }

    /// Reconfigure the surface at its current size
    pub fn reconfigure(&mut self) {
        let size = self.context.size;
        self.resize(size.width, size.height);
    }

    /// Rebuild the robot mesh from the current link poses and contacts
    pub fn update_robot(&mut self, system: &ArticulatedSystem, flags: VisualFlags) {
        let mut geometry = robot_geometry(system, flags);
        geometry.extend(&contact_geometry(system.contacts(), &self.look.contact_style, flags));
        self.robot.upload(
            &self.context.device,
            &self.context.queue,
            &geometry.vertices,
            &geometry.indices,
        );
    }

    /// Render a single frame; `telemetry` is plotted when given
    pub fn render_frame(
        &mut self,
        camera: &OrbitCamera,
        telemetry: Option<&TelemetryBuffer>,
    ) -> Result<(), RenderError> {
        let aspect = self.context.aspect_ratio();
        let light_direction = self.look.lighting.unit_direction().to_f32_array();
        let shadows_enabled = self.render_config.shadows && self.look.lighting.cast_shadows;

        let (matrices, splits) = cascade_matrices(
            camera,
            aspect,
            light_direction,
            self.look.shadow_far,
            self.shadows.cascade_count(),
        );
        self.shadows.update_cascades(&self.context.queue, &matrices);

        let uniforms = scene_uniforms(
            camera,
            aspect,
            &self.look.lighting,
            self.look.shadow_far,
            shadows_enabled,
            &matrices,
            &splits,
        );
        self.scene.update_uniforms(&self.context.queue, &uniforms);
        self.sky
            .update(&self.context.queue, camera, aspect, self.look.sky_rotation);

        let overlay = telemetry
            .map(|t| build_overlay(t, &self.plot_layout))
            .unwrap_or_default();
        self.upload_overlay(&overlay);

        // Get surface texture
        let output = match self.context.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost) => return Err(RenderError::SurfaceLost),
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(RenderError::OutOfMemory),
            Err(e) => return Err(RenderError::Other(format!("{:?}", e))),
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        if shadows_enabled {
            self.shadows.render(&mut encoder, &[&self.robot]);
        }

        let bg = &self.render_config.background_color;
        self.sky.render(
            &mut encoder,
            &self.targets,
            &view,
            wgpu::Color {
                r: bg[0] as f64,
                g: bg[1] as f64,
                b: bg[2] as f64,
                a: bg[3] as f64,
            },
            self.look.sky_enabled,
        );
        self.scene
            .render(&mut encoder, &self.targets, &view, &[&self.ground, &self.robot]);
        self.overlay.render(&mut encoder, &self.targets, &view);

        self.context.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    fn upload_overlay(&mut self, overlay: &OverlayGeometry) {
        self.overlay
            .upload(&self.context.device, &self.context.queue, overlay);
    }

    /// Get current surface size
    pub fn size(&self) -> (u32, u32) {
        (self.context.size.width, self.context.size.height)
    }
}

/// Pack the per-frame scene uniforms
fn scene_uniforms(
    camera: &OrbitCamera,
    aspect: f32,
    lighting: &LightSettings,
    shadow_far: f32,
    shadows_enabled: bool,
    light_matrices: &[Mat4],
    splits: &[f32],
) -> SceneUniforms {
    let mut uniforms = SceneUniforms {
        view_projection: camera.view_projection(aspect),
        camera_position: camera.eye(),
        cascade_count: light_matrices.len().min(MAX_CASCADES) as u32,
        light_direction: lighting.unit_direction().to_f32_array(),
        shadows_enabled: u32::from(shadows_enabled),
        light_color: lighting.diffuse,
        ambient_color: lighting.ambient,
        shadow_far,
        ..SceneUniforms::default()
    };
    for (slot, matrix) in uniforms.light_view_projection.iter_mut().zip(light_matrices) {
        *slot = *matrix;
    }
    for (slot, split) in uniforms.cascade_splits.iter_mut().zip(splits) {
        *slot = *split;
    }
    uniforms
}
