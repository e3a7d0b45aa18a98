//! Camera controller for the robot viewer
//!
//! Controls:
//! - Left mouse drag: orbit around the target
//! - Scroll wheel: zoom in/out
//! - W/S: move target forward/backward
//! - A/D: strafe left/right
//! - Q/E: move target down/up
//!
//! Keyboard movement accelerates toward a top speed and coasts to a stop
//! when released.

use winit::event::{ElementState, MouseButton};
use winit::keyboard::KeyCode;

/// Velocity below which free-look movement snaps to rest
const REST_SPEED: f32 = 1e-3;

/// Camera controller for handling input
pub struct CameraController {
    // Movement state
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
    up: bool,
    down: bool,
    velocity: [f32; 3],

    // Mouse state
    orbiting: bool,
    pending_yaw: f32,
    pending_pitch: f32,
    pending_zoom: f32,

    // Input smoothing state
    smooth_yaw: f32,
    smooth_pitch: f32,

    // Configuration
    /// Orbit rate, degrees per 1000 pixels of drag
    pub orbit_speed: f32,
    /// Free-look top speed, m/s
    pub top_speed: f32,
    /// Multiples of top speed gained (or shed) per second
    pub acceleration: f32,
    /// Fraction of the distance removed per scroll line
    pub zoom_step: f32,
    pub smoothing_half_life: f32,
    pub smoothing_enabled: bool,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraController {
    pub fn new() -> Self {
        Self {
            forward: false,
            backward: false,
            left: false,
            right: false,
            up: false,
            down: false,
            velocity: [0.0; 3],

            orbiting: false,
            pending_yaw: 0.0,
            pending_pitch: 0.0,
            pending_zoom: 0.0,

            smooth_yaw: 0.0,
            smooth_pitch: 0.0,

            orbit_speed: 300.0,
            top_speed: 5.0,
            acceleration: 10.0,
            zoom_step: 0.1,
            smoothing_half_life: 0.05,
            smoothing_enabled: false,
        }
    }

    /// Process keyboard input; returns true if the key moves the camera
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) -> bool {
        let pressed = state == ElementState::Pressed;

        match key {
            KeyCode::KeyW => { self.forward = pressed; true }
            KeyCode::KeyS => { self.backward = pressed; true }
            KeyCode::KeyA => { self.left = pressed; true }
            KeyCode::KeyD => { self.right = pressed; true }
            KeyCode::KeyE => { self.up = pressed; true }
            KeyCode::KeyQ => { self.down = pressed; true }
            _ => false,
        }
    }

    /// Process mouse button input
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.orbiting = state == ElementState::Pressed;
        }
    }

    /// Process mouse movement
    pub fn process_mouse_motion(&mut self, delta_x: f64, delta_y: f64) {
        self.pending_yaw += delta_x as f32;
        self.pending_pitch += delta_y as f32;
    }

    /// Process scroll wheel input in lines (positive = away from the user = zoom in)
    pub fn process_scroll(&mut self, lines: f32) {
        self.pending_zoom += lines;
    }

    /// Apply accumulated input to the camera
    ///
    /// Returns the camera target for debug display.
    pub fn update<C: CameraControl>(&mut self, camera: &mut C, dt: f32) -> [f32; 3] {
        self.update_velocity(dt);
        if self.velocity != [0.0; 3] {
            camera.translate(
                self.velocity[0] * dt,
                self.velocity[1] * dt,
                self.velocity[2] * dt,
            );
        }

        let (yaw_input, pitch_input) = if self.smoothing_enabled && dt > 0.0 {
            // factor = 2^(-dt / half_life)
            let smooth_factor = 2.0f32.powf(-dt / self.smoothing_half_life);
            self.smooth_yaw =
                self.smooth_yaw * smooth_factor + self.pending_yaw * (1.0 - smooth_factor);
            self.smooth_pitch =
                self.smooth_pitch * smooth_factor + self.pending_pitch * (1.0 - smooth_factor);
            (self.smooth_yaw, self.smooth_pitch)
        } else {
            (self.pending_yaw, self.pending_pitch)
        };

        if self.orbiting {
            let radians_per_pixel = self.orbit_speed.to_radians() / 1000.0;
            // Drag right turns the view right; drag down looks further down
            camera.orbit(-yaw_input * radians_per_pixel, -pitch_input * radians_per_pixel);
        }

        if self.pending_zoom != 0.0 {
            let factor = (1.0 - self.zoom_step).powf(self.pending_zoom);
            camera.zoom(factor);
        }

        self.pending_yaw = 0.0;
        self.pending_pitch = 0.0;
        self.pending_zoom = 0.0;

        camera.target()
    }

    fn update_velocity(&mut self, dt: f32) {
        let direction = [
            (self.forward as i32 - self.backward as i32) as f32,
            (self.right as i32 - self.left as i32) as f32,
            (self.up as i32 - self.down as i32) as f32,
        ];

        if direction != [0.0; 3] {
            for axis in 0..3 {
                self.velocity[axis] += direction[axis] * self.top_speed * self.acceleration * dt;
            }
        } else {
            let decay = (1.0 - self.acceleration * dt).max(0.0);
            for v in &mut self.velocity {
                *v *= decay;
            }
        }

        let speed = self.velocity.iter().map(|v| v * v).sum::<f32>().sqrt();
        if speed > self.top_speed && speed > 0.0 {
            let scale = self.top_speed / speed;
            for v in &mut self.velocity {
                *v *= scale;
            }
        } else if speed < REST_SPEED {
            self.velocity = [0.0; 3];
        }
    }

    /// Check if any movement keys are pressed
    pub fn is_moving(&self) -> bool {
        self.forward || self.backward || self.left || self.right || self.up || self.down
    }

    /// Current free-look velocity (forward, right, up)
    pub fn velocity(&self) -> [f32; 3] {
        self.velocity
    }

    /// Toggle input smoothing on/off
    pub fn toggle_smoothing(&mut self) -> bool {
        self.smoothing_enabled = !self.smoothing_enabled;
        self.smooth_yaw = 0.0;
        self.smooth_pitch = 0.0;
        self.smoothing_enabled
    }

    pub fn is_smoothing_enabled(&self) -> bool {
        self.smoothing_enabled
    }

    /// Builder: set orbit speed
    pub fn with_orbit_speed(mut self, speed: f32) -> Self {
        self.orbit_speed = speed;
        self
    }

    /// Builder: set free-look top speed
    pub fn with_top_speed(mut self, speed: f32) -> Self {
        self.top_speed = speed;
        self
    }

    /// Builder: set zoom step per scroll line
    pub fn with_zoom_step(mut self, step: f32) -> Self {
        self.zoom_step = step.clamp(0.0, 0.9);
        self
    }

    /// Builder: set smoothing half-life (lower = more responsive)
    pub fn with_smoothing_half_life(mut self, half_life: f32) -> Self {
        self.smoothing_half_life = half_life;
        self
    }

    /// Builder: enable or disable smoothing
    pub fn with_smoothing(mut self, enabled: bool) -> Self {
        self.smoothing_enabled = enabled;
        self
    }
}

/// Trait for camera control
/// Allows the controller to work with different camera implementations
pub trait CameraControl {
    /// Move the target in the camera's ground-projected frame
    fn translate(&mut self, forward: f32, right: f32, up: f32);
    /// Change yaw and pitch about the target, radians
    fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32);
    /// Multiply the distance to the target
    fn zoom(&mut self, factor: f32);
    fn target(&self) -> [f32; 3];
}
