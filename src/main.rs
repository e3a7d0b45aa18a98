//! quadsim - ANYmal PD control demo
//!
//! Opens a window showing the ANYmal quadruped on a checkerboard ground
//! while the demo controller re-targets its joints with random
//! perturbations, resets its pose periodically and plots joint telemetry.

use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, ElementState, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowId,
};

use quadsim::config::AppConfig;
use quadsim::systems::{RenderError, RenderSystem, SimulationSystem, TitleStatus, WindowSystem};
use quadsim_core::{DemoWorld, PdDemoController, Scene};
use quadsim_input::{CameraController, SimulationToggles};
use quadsim_render::{OrbitCamera, VisualFlags};

/// Main application state
struct App {
    config: AppConfig,
    scene: Scene,
    simulation: SimulationSystem,
    window: Option<WindowSystem>,
    render: Option<RenderSystem>,
    camera: OrbitCamera,
    controller: CameraController,
    toggles: SimulationToggles,
}

impl App {
    /// Load the scene and bootstrap the demo world
    fn new(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let scene = match Scene::load(&config.scene.path) {
            Ok(scene) => scene,
            Err(e) => {
                log::warn!("Failed to load scene '{}': {}. Using defaults.", config.scene.path, e);
                Scene::default()
            }
        };

        let demo = DemoWorld::bootstrap(
            &scene,
            &config.resources.locator(),
            &config.simulation.to_settings(),
        )?;
        let controller = PdDemoController::new(config.controller.clone())?;
        let simulation =
            SimulationSystem::new(demo, controller, config.telemetry.buffer(), &config.simulation);

        let view = &scene.camera;
        let mut camera = OrbitCamera::new(view.yaw, view.pitch, view.distance)
            .with_projection(config.camera.fov, config.camera.near, config.camera.far)
            .with_follow(scene.camera.follow_robot);
        if let Some(base) = simulation.robot_base() {
            camera.set_target(base);
        }

        let mut camera_controller = CameraController::new()
            .with_orbit_speed(scene.camera.speed)
            .with_top_speed(scene.camera.top_speed)
            .with_zoom_step(config.input.zoom_step)
            .with_smoothing_half_life(config.input.smoothing_half_life)
            .with_smoothing(config.input.smoothing_enabled);
        camera_controller.acceleration = config.input.acceleration;

        let mut toggles = SimulationToggles::new();
        toggles.paused = config.simulation.start_paused;
        toggles.show_contact_points = config.debug.show_contact_points;
        toggles.show_contact_forces = config.debug.show_contact_forces;
        toggles.show_collision_bodies = config.debug.show_collision_bodies;
        toggles.show_overlay = config.telemetry.show_overlay;
        toggles.follow_robot = scene.camera.follow_robot;

        Ok(Self {
            config,
            scene,
            simulation,
            window: None,
            render: None,
            camera,
            controller: camera_controller,
            toggles,
        })
    }

    /// Step the simulation, move the camera and draw one frame
    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let dt = self.simulation.frame_delta();
        match self.simulation.update(dt, &mut self.toggles) {
            Ok(report) if report.resets > 0 => {
                log::debug!("Pose reset during frame ({} steps)", report.steps)
            }
            Ok(_) => {}
            Err(e) => {
                log::error!("Simulation failed: {}", e);
                event_loop.exit();
                return;
            }
        }

        self.camera.follow = self.toggles.follow_robot;
        if let Some(base) = self.simulation.robot_base() {
            self.camera.follow_point(base);
        }
        self.controller.update(&mut self.camera, dt as f32);

        if let Some(window) = &self.window {
            window.update_title(&TitleStatus {
                elapsed: self.simulation.controller().elapsed(),
                world_time: self.simulation.demo().world_time(),
                paused: self.toggles.paused,
                follow: self.camera.follow,
            });
        }

        if let Some(render) = &mut self.render {
            if let Some(robot) = self.simulation.demo().robot() {
                render.update_robot(robot, visual_flags(&self.toggles));
            }
            let telemetry = self.toggles.show_overlay.then(|| self.simulation.telemetry());
            match render.render_frame(&self.camera, telemetry) {
                Ok(()) => {}
                Err(RenderError::SurfaceLost) => render.reconfigure(),
                Err(RenderError::OutOfMemory) => {
                    log::error!("GPU out of memory");
                    event_loop.exit();
                    return;
                }
                Err(e) => log::warn!("{}", e),
            }
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key: KeyCode, state: ElementState) {
        if state == ElementState::Pressed {
            match key {
                KeyCode::Escape => {
                    event_loop.exit();
                    return;
                }
                KeyCode::KeyF => {
                    if let Some(window) = &self.window {
                        window.toggle_fullscreen();
                    }
                    return;
                }
                KeyCode::KeyG => {
                    let enabled = self.controller.toggle_smoothing();
                    log::info!("Input smoothing: {}", if enabled { "ON" } else { "OFF" });
                    return;
                }
                _ => {}
            }
        }

        if let Some(action) = self.toggles.process_keyboard(key, state) {
            log::info!("{:?} -> {:?}", action, self.toggles);
            return;
        }
        self.controller.process_keyboard(key, state);
    }
}

/// Robot layers to draw for the current toggles
fn visual_flags(toggles: &SimulationToggles) -> VisualFlags {
    let mut flags = VisualFlags::VISUALS;
    flags.set(VisualFlags::CONTACT_POINTS, toggles.show_contact_points);
    flags.set(VisualFlags::CONTACT_FORCES, toggles.show_contact_forces);
    flags.set(VisualFlags::COLLISION_BODIES, toggles.show_collision_bodies);
    flags
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match WindowSystem::create(event_loop, &self.config.window) {
            Ok(window) => window,
            Err(e) => {
                log::error!("{}", e);
                event_loop.exit();
                return;
            }
        };

        let render = RenderSystem::new(
            Arc::clone(window.window()),
            &self.scene,
            self.config.rendering.clone(),
            self.config.window.vsync,
        );
        match render {
            Ok(render) => self.render = Some(render),
            Err(e) => {
                log::error!("{}", e);
                event_loop.exit();
                return;
            }
        }

        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                if let Some(render) = &mut self.render {
                    render.resize(physical_size.width, physical_size.height);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.handle_key(event_loop, key, event.state);
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                self.controller.process_mouse_button(button, state);
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
                self.controller.process_scroll(lines);
            }

            WindowEvent::RedrawRequested => self.frame(event_loop),

            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.controller.process_mouse_motion(delta.0, delta.1);
        }
    }
}

fn main() {
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load config: {}. Using defaults.", e);
        AppConfig::default()
    });

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&config.debug.log_level),
    )
    .init();
    log::info!("Starting quadsim");

    let mut app = match App::new(config) {
        Ok(app) => app,
        Err(e) => {
            log::error!("Startup failed: {}", e);
            std::process::exit(1);
        }
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("Failed to create event loop: {}", e);
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {}", e);
        std::process::exit(1);
    }
}
