//! Configuration loading, saving and validation

use cloud_sim_core::{ConfigError, Simulation, SimulationConfig, SourceSpec, Vec3};
use std::path::PathBuf;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("cloud-sim-{}-{name}.json", std::process::id()))
}

#[test]
fn test_save_and_load_roundtrip() {
    let mut config = SimulationConfig::new_3d(12, 10, 8, Vec3::new(1200.0, 1000.0, 800.0));
    config.fluid.pressure_iterations = 10;
    config.wind.speed = 7.5;
    config.explicit_sources = vec![
        SourceSpec::new(Vec3::new(6.0, 1.5, 4.0), 2.0, 0.0002, 0.3).with_phase(1.0),
    ];

    let path = temp_path("roundtrip");
    config.save(&path).expect("save config");
    let loaded = SimulationConfig::load(&path).expect("load config");
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded, config);
    let sim = Simulation::new(loaded).expect("valid config");
    assert_eq!(sim.sources().len(), 1);
}

#[test]
fn test_load_missing_file_is_io_error() {
    let result = SimulationConfig::load(temp_path("does-not-exist"));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn test_load_rejects_invalid_values() {
    let path = temp_path("invalid");
    std::fs::write(&path, r#"{ "grid": { "nx": 64, "ny": 64, "nz": 2, "domain_size": [1.0, 1.0, 1.0] } }"#)
        .expect("write config");
    let result = SimulationConfig::load(&path);
    let _ = std::fs::remove_file(&path);

    let err = result.expect_err("nz = 2 must be rejected");
    assert!(matches!(err, ConfigError::UnsupportedDepth(2)));
    assert!(err.to_string().contains("nz = 2"));
}

#[test]
fn test_simulation_new_validates() {
    let mut config = SimulationConfig::default();
    config.atmosphere.layer_count = 1;
    assert!(matches!(
        Simulation::new(config),
        Err(ConfigError::TooFewLayers(1))
    ));
}
