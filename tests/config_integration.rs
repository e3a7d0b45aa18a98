//! Integration tests for configuration loading
//!
//! Tests that verify config loading from files and environment variables,
//! and that the shipped config and scene describe the ANYmal demo.

use quadsim::config::AppConfig;
use quadsim_core::{DemoWorld, Scene, ShadowTechnique};
use serial_test::serial;

#[test]
#[serial]
fn test_env_override() {
    std::env::set_var("QS_WINDOW__TITLE", "Test From Env");
    let config = AppConfig::load().unwrap();
    assert_eq!(config.window.title, "Test From Env");
    std::env::remove_var("QS_WINDOW__TITLE");
}

#[test]
#[serial]
fn test_env_override_nested() {
    std::env::set_var("QS_CONTROLLER__SEED", "42");
    std::env::set_var("QS_SIMULATION__START_PAUSED", "true");
    let config = AppConfig::load().unwrap();
    std::env::remove_var("QS_CONTROLLER__SEED");
    std::env::remove_var("QS_SIMULATION__START_PAUSED");

    assert_eq!(config.controller.seed, Some(42));
    assert!(config.simulation.start_paused);
}

#[test]
#[serial]
fn test_default_file_matches_defaults() {
    std::env::remove_var("QS_WINDOW__TITLE");

    let config = AppConfig::load_from("config").unwrap();
    let defaults = AppConfig::default();
    assert_eq!(config.window.width, defaults.window.width);
    assert_eq!(config.window.height, defaults.window.height);
    assert_eq!(config.simulation.time_step, defaults.simulation.time_step);
    assert_eq!(config.simulation.physics, defaults.simulation.physics);
    assert_eq!(config.controller, defaults.controller);
    assert_eq!(config.scene.path, defaults.scene.path);
    assert_eq!(config.resources.roots, defaults.resources.roots);
}

#[test]
#[serial]
fn test_user_config_overrides_default() {
    let dir = std::env::temp_dir().join(format!("quadsim-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::copy("config/default.toml", dir.join("default.toml")).unwrap();
    let user = r#"
[window]
title = "User"
width = 640
height = 480
fullscreen = false
vsync = false
"#;
    std::fs::write(dir.join("user.toml"), user).unwrap();

    let config = AppConfig::load_from(&dir).unwrap();
    std::fs::remove_dir_all(&dir).unwrap();

    assert_eq!(config.window.title, "User");
    assert_eq!(config.window.width, 640);
    assert!(!config.window.vsync);
    assert_eq!(config.controller.control_period, 50);
}

#[test]
fn test_shipped_scene_is_anymal_demo() {
    let scene = Scene::load("scenes/anymal.ron").unwrap();
    assert_eq!(scene, Scene::default());
    assert_eq!(scene.shadows.technique, ShadowTechnique::Cascaded);
    assert_eq!(scene.shadows.texture_size, 2048);
    assert_eq!(scene.robot.resource, "anymal/anymal.urdf");
}

#[test]
fn test_shipped_config_bootstraps() {
    let config = AppConfig::default();
    let scene = Scene::load(&config.scene.path).unwrap();
    let demo = DemoWorld::bootstrap(
        &scene,
        &config.resources.locator(),
        &config.simulation.to_settings(),
    )
    .unwrap();
    assert_eq!(demo.robot().unwrap().dof(), 18);
}
