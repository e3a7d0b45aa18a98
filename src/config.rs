//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`QS_SECTION__KEY`)
//!
//! Scene content (ground, robot, light, sky, camera pose) lives in the RON
//! scene file named by `scene.path`; this file only tunes the application.

use figment::{Figment, providers::{Format, Toml, Env}};
use serde::{Serialize, Deserialize};
use std::path::Path;

use quadsim_core::{
    ControllerConfig, PhysicsConfig, ResourceLocator, SimulationSettings, TelemetryBuffer,
};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub window: WindowConfig,
    /// Fixed-step loop and physics parameters
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Demo controller cadence, noise and poses
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub resources: ResourcesConfig,
    /// Projection; the initial orbit comes from the scene
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub rendering: RenderingConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`QS_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // QS_WINDOW__TITLE=Test -> window.title = "Test"
        figment = figment.merge(Env::prefixed("QS_").split("__"));

        figment.extract().map_err(ConfigError::from)
    }
}

/// Window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "quadsim - ANYmal PD demo".to_string(),
            width: 1800,
            height: 1200,
            fullscreen: false,
            vsync: true,
        }
    }
}

/// Simulation loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Physics step, seconds
    pub time_step: f64,
    /// Upper bound on physics steps run for one rendered frame
    pub max_steps_per_frame: u32,
    /// Simulated seconds per wall-clock second
    pub real_time_factor: f64,
    pub start_paused: bool,
    pub physics: PhysicsConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let settings = SimulationSettings::default();
        Self {
            time_step: settings.time_step,
            max_steps_per_frame: 40,
            real_time_factor: 1.0,
            start_paused: false,
            physics: settings.physics,
        }
    }
}

impl SimulationConfig {
    pub fn to_settings(&self) -> SimulationSettings {
        SimulationSettings {
            time_step: self.time_step,
            physics: self.physics.clone(),
        }
    }
}

/// Scene file selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    /// RON scene file, relative to the working directory
    pub path: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            path: "scenes/anymal.ron".to_string(),
        }
    }
}

/// Where robot descriptions are looked up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourcesConfig {
    /// Searched in order
    pub roots: Vec<String>,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            roots: vec!["resources".to_string()],
        }
    }
}

impl ResourcesConfig {
    pub fn locator(&self) -> ResourceLocator {
        self.roots
            .iter()
            .fold(ResourceLocator::new(), |locator, root| locator.with_root(root))
    }
}

/// Camera projection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 45.0,
            near: 0.05,
            far: 1000.0,
        }
    }
}

/// Input configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Multiples of the free-look top speed gained per second
    pub acceleration: f32,
    /// Fraction of the orbit distance removed per scroll line
    pub zoom_step: f32,
    /// Input smoothing half-life in seconds (lower = more responsive)
    pub smoothing_half_life: f32,
    pub smoothing_enabled: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            acceleration: 10.0,
            zoom_step: 0.1,
            smoothing_half_life: 0.05,
            smoothing_enabled: false,
        }
    }
}

/// Rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderingConfig {
    /// Requested MSAA samples; falls back to what the adapter supports
    pub msaa_samples: u32,
    /// Clear color behind the sky [r, g, b, a]
    pub background_color: [f32; 4],
    /// Master switch over the scene's shadow settings
    pub shadows: bool,
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            msaa_samples: 4,
            background_color: [0.32, 0.34, 0.38, 1.0],
            shadows: true,
        }
    }
}

/// Telemetry buffer and overlay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Oldest samples are dropped past this count; 0 keeps everything
    pub max_samples: usize,
    pub show_overlay: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            max_samples: 0,
            show_overlay: true,
        }
    }
}

impl TelemetryConfig {
    pub fn buffer(&self) -> TelemetryBuffer {
        match self.max_samples {
            0 => TelemetryBuffer::new(),
            cap => TelemetryBuffer::with_capacity(cap),
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugConfig {
    /// Log level (error, warn, info, debug, trace); `RUST_LOG` wins
    pub log_level: String,
    pub show_contact_points: bool,
    pub show_contact_forces: bool,
    pub show_collision_bodies: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            show_contact_points: false,
            show_contact_forces: false,
            show_collision_bodies: false,
        }
    }
}

/// Configuration error
#[derive(Debug)]
pub struct ConfigError {
    message: String,
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError {
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.window.width, 1800);
        assert_eq!(config.window.height, 1200);
        assert_eq!(config.simulation.time_step, 0.0025);
        assert_eq!(config.controller.reset_period, 2500);
        assert_eq!(config.controller.control_period, 50);
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("title"));
        assert!(toml.contains("time_step"));
        assert!(toml.contains("noise_std"));
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: AppConfig = Figment::new()
            .merge(Toml::string("[simulation]\nmax_steps_per_frame = 8\n[controller]\nseed = 3"))
            .extract()
            .unwrap();
        assert_eq!(config.simulation.max_steps_per_frame, 8);
        assert_eq!(config.simulation.time_step, 0.0025);
        assert_eq!(config.controller.seed, Some(3));
        assert_eq!(config.controller.noise_std, 0.2);
        assert_eq!(config.window.title, "quadsim - ANYmal PD demo");
    }

    #[test]
    fn test_missing_config_dir_uses_defaults() {
        let config = AppConfig::load_from("/no/such/config/dir").unwrap();
        assert_eq!(config.scene.path, "scenes/anymal.ron");
    }

    #[test]
    fn test_resource_locator_roots() {
        let resources = ResourcesConfig {
            roots: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(resources.locator().roots().len(), 2);
    }

    #[test]
    fn test_telemetry_buffer_capacity() {
        assert_eq!(TelemetryConfig::default().buffer().capacity(), None);
        let capped = TelemetryConfig {
            max_samples: 100,
            show_overlay: true,
        };
        assert_eq!(capped.buffer().capacity(), Some(100));
    }
}
