//! Shared fixtures and helper functions for config tests.

use crate::config::HarborConfig;
use ortho_config::MergeComposer;
use rstest::fixture;
use std::sync::Arc;

/// Fixture providing a `HarborConfig` parsed from a full TOML example.
#[fixture]
pub fn harbor_config_from_full_toml() -> HarborConfig {
    let toml = r#"
        runtime = "podman"
        command_timeout_secs = 90

        [wait]
        poll_interval_ms = 100
        timeout_secs = 30

        [teardown]
        stop_timeout_secs = 3
        force_remove = true
    "#;

    toml::from_str(toml).expect("TOML parsing should succeed")
}

/// Fixture providing a `HarborConfig` parsed from a minimal TOML example.
#[fixture]
pub fn harbor_config_from_partial_toml() -> HarborConfig {
    let toml = r#"
        runtime = "docker"

        [wait]
        timeout_secs = 5
    "#;

    toml::from_str(toml).expect("TOML parsing should succeed")
}

/// Helper: Creates a `MergeComposer` with defaults layer already pushed.
pub fn create_composer_with_defaults() -> Result<MergeComposer, serde_json::Error> {
    let mut composer = MergeComposer::new();
    let defaults = ortho_config::serde_json::to_value(HarborConfig::default())?;
    composer.push_defaults(defaults);
    Ok(composer)
}

/// Helper: Merges layers from a composer into `HarborConfig`.
pub fn merge_config(
    composer: MergeComposer,
) -> Result<HarborConfig, Arc<ortho_config::OrthoError>> {
    HarborConfig::merge_from_layers(composer.layers())
}

/// Helper: Asserts that a config has all default values.
pub fn assert_config_has_defaults(config: &HarborConfig) {
    assert!(config.runtime.is_none(), "runtime should be None");
    assert!(
        config.command_timeout_secs.is_none(),
        "command_timeout_secs should be None"
    );
    assert_eq!(
        config.wait.poll_interval_ms, 250,
        "wait.poll_interval_ms should be 250"
    );
    assert_eq!(config.wait.timeout_secs, 60, "wait.timeout_secs should be 60");
    assert_eq!(
        config.teardown.stop_timeout_secs, 10,
        "teardown.stop_timeout_secs should be 10"
    );
    assert!(
        !config.teardown.force_remove,
        "teardown.force_remove should be false"
    );
}

/// Helper: Creates a `MergeComposer` with defaults, file, and env layers for
/// testing layer precedence.
pub fn create_composer_with_file_and_env() -> Result<MergeComposer, serde_json::Error> {
    use ortho_config::serde_json::json;

    let mut composer = create_composer_with_defaults()?;

    composer.push_file(
        json!({
            "runtime": "podman",
            "command_timeout_secs": 30
        }),
        None,
    );

    composer.push_environment(json!({
        "runtime": "nerdctl"
    }));

    Ok(composer)
}
