//! Simulation toggles driven by the keyboard
//!
//! Key bindings:
//! - Space: pause/resume the simulation
//! - N: advance one step while paused
//! - R: reset the robot to its initial pose
//! - P: show contact points
//! - K: show contact forces
//! - B: show collision bodies
//! - O: show the telemetry overlay
//! - T: follow the robot with the camera

use winit::event::ElementState;
use winit::keyboard::KeyCode;

/// An action bound to a key press
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleAction {
    Pause,
    SingleStep,
    ResetRobot,
    ContactPoints,
    ContactForces,
    CollisionBodies,
    Overlay,
    FollowRobot,
}

impl ToggleAction {
    /// Look up the action bound to a key
    pub fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::Space => Some(ToggleAction::Pause),
            KeyCode::KeyN => Some(ToggleAction::SingleStep),
            KeyCode::KeyR => Some(ToggleAction::ResetRobot),
            KeyCode::KeyP => Some(ToggleAction::ContactPoints),
            KeyCode::KeyK => Some(ToggleAction::ContactForces),
            KeyCode::KeyB => Some(ToggleAction::CollisionBodies),
            KeyCode::KeyO => Some(ToggleAction::Overlay),
            KeyCode::KeyT => Some(ToggleAction::FollowRobot),
            _ => None,
        }
    }
}

/// Viewer and simulation switches
///
/// One-shot requests (single step, reset) stay set until taken.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulationToggles {
    pub paused: bool,
    pub show_contact_points: bool,
    pub show_contact_forces: bool,
    pub show_collision_bodies: bool,
    pub show_overlay: bool,
    pub follow_robot: bool,
    step_requested: bool,
    reset_requested: bool,
}

impl Default for SimulationToggles {
    fn default() -> Self {
        Self {
            paused: false,
            show_contact_points: false,
            show_contact_forces: false,
            show_collision_bodies: false,
            show_overlay: true,
            follow_robot: true,
            step_requested: false,
            reset_requested: false,
        }
    }
}

impl SimulationToggles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a key event; returns the action applied, if any
    ///
    /// Only presses count, so holding a key or releasing it does nothing.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) -> Option<ToggleAction> {
        if state != ElementState::Pressed {
            return None;
        }
        let action = ToggleAction::from_key(key)?;
        self.apply(action);
        Some(action)
    }

    pub fn apply(&mut self, action: ToggleAction) {
        match action {
            ToggleAction::Pause => self.paused = !self.paused,
            ToggleAction::SingleStep => {
                if self.paused {
                    self.step_requested = true;
                }
            }
            ToggleAction::ResetRobot => self.reset_requested = true,
            ToggleAction::ContactPoints => self.show_contact_points = !self.show_contact_points,
            ToggleAction::ContactForces => self.show_contact_forces = !self.show_contact_forces,
            ToggleAction::CollisionBodies => {
                self.show_collision_bodies = !self.show_collision_bodies
            }
            ToggleAction::Overlay => self.show_overlay = !self.show_overlay,
            ToggleAction::FollowRobot => self.follow_robot = !self.follow_robot,
        }
    }

    /// Take a pending single-step request
    pub fn take_step_request(&mut self) -> bool {
        std::mem::take(&mut self.step_requested)
    }

    /// Take a pending reset request
    pub fn take_reset_request(&mut self) -> bool {
        std::mem::take(&mut self.reset_requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let toggles = SimulationToggles::new();
        assert!(!toggles.paused);
        assert!(toggles.show_overlay);
        assert!(toggles.follow_robot);
        assert!(!toggles.show_contact_points);
    }

    #[test]
    fn test_release_ignored() {
        let mut toggles = SimulationToggles::new();
        assert_eq!(toggles.process_keyboard(KeyCode::Space, ElementState::Released), None);
        assert!(!toggles.paused);
    }

    #[test]
    fn test_pause_toggles() {
        let mut toggles = SimulationToggles::new();
        assert_eq!(
            toggles.process_keyboard(KeyCode::Space, ElementState::Pressed),
            Some(ToggleAction::Pause)
        );
        assert!(toggles.paused);
        toggles.process_keyboard(KeyCode::Space, ElementState::Pressed);
        assert!(!toggles.paused);
    }

    #[test]
    fn test_single_step_only_while_paused() {
        let mut toggles = SimulationToggles::new();
        toggles.apply(ToggleAction::SingleStep);
        assert!(!toggles.take_step_request());

        toggles.apply(ToggleAction::Pause);
        toggles.apply(ToggleAction::SingleStep);
        assert!(toggles.take_step_request());
        assert!(!toggles.take_step_request());
    }

    #[test]
    fn test_reset_request_taken_once() {
        let mut toggles = SimulationToggles::new();
        toggles.process_keyboard(KeyCode::KeyR, ElementState::Pressed);
        assert!(toggles.take_reset_request());
        assert!(!toggles.take_reset_request());
    }

    #[test]
    fn test_debug_layer_keys() {
        let mut toggles = SimulationToggles::new();
        toggles.process_keyboard(KeyCode::KeyP, ElementState::Pressed);
        toggles.process_keyboard(KeyCode::KeyK, ElementState::Pressed);
        toggles.process_keyboard(KeyCode::KeyB, ElementState::Pressed);
        toggles.process_keyboard(KeyCode::KeyO, ElementState::Pressed);
        assert!(toggles.show_contact_points);
        assert!(toggles.show_contact_forces);
        assert!(toggles.show_collision_bodies);
        assert!(!toggles.show_overlay);
    }

    #[test]
    fn test_unbound_key() {
        let mut toggles = SimulationToggles::new();
        assert_eq!(toggles.process_keyboard(KeyCode::KeyW, ElementState::Pressed), None);
        assert_eq!(toggles, SimulationToggles::new());
    }
}
