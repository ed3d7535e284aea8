use std::fs;

use candle_core::Device;
use tempfile::tempdir;
use windowed_attention::{
    core::config::{ENV_BACKEND, ENV_EVALUATION, ENV_PRECISION},
    AttentionAdapter, BackendSelection, Config, Evaluation, PrecisionPolicy,
};

// Kept as a single test: it mutates process-wide environment variables.
#[test]
fn config_files_and_env_overrides() {
    for key in [ENV_BACKEND, ENV_EVALUATION, ENV_PRECISION] {
        std::env::remove_var(key);
    }
    let dir = tempdir().unwrap();

    let toml_path = dir.path().join("attention.toml");
    fs::write(
        &toml_path,
        "backend = \"reference_only\"\nevaluation = \"lazy\"\nprecision = \"f32\"\n",
    )
    .unwrap();
    let config = Config::from_path(&toml_path).unwrap();
    assert_eq!(
        config,
        Config {
            backend: BackendSelection::ReferenceOnly,
            evaluation: Evaluation::Lazy,
            precision: PrecisionPolicy::ForceF32,
        }
    );

    let json_path = dir.path().join("attention.json");
    fs::write(&json_path, r#"{ "evaluation": "eager" }"#).unwrap();
    let config = Config::from_path(&json_path).unwrap();
    assert_eq!(config, Config::default());

    std::env::set_var(ENV_EVALUATION, "lazy");
    std::env::set_var(ENV_PRECISION, "bogus");
    let config = Config::from_path(&json_path).unwrap();
    assert_eq!(config.evaluation, Evaluation::Lazy);
    assert_eq!(config.precision, PrecisionPolicy::Inherit);

    let adapter = AttentionAdapter::from_config(&config, &Device::Cpu).unwrap();
    assert_eq!(adapter.evaluation(), Evaluation::Lazy);
    assert_eq!(adapter.kernel_name(), "reference");

    fs::write(&toml_path, "backend = \"tpu\"\n").unwrap();
    assert!(Config::from_path(&toml_path).is_err());

    for key in [ENV_BACKEND, ENV_EVALUATION, ENV_PRECISION] {
        std::env::remove_var(key);
    }
}
