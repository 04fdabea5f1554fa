//! Configuration loading with layered precedence.
//!
//! This module loads configuration with the precedence order (lowest to
//! highest): defaults, configuration file, environment variables, programmatic
//! overrides.
//!
//! Layers are composed manually with `MergeComposer` rather than through the
//! derive's `load()`, which expects to own command-line parsing. The crate has
//! no command line; callers pass [`ConfigOverrides`] instead.
//!
//! # Environment Variable Handling
//!
//! Environment variables with unparseable values (e.g.,
//! `HARBOR_TEARDOWN_FORCE_REMOVE=maybe` instead of `true`/`false`) return an
//! error immediately rather than silently falling back to defaults.
//!
//! String fields (e.g., `HARBOR_RUNTIME`) are always accepted. Typed fields
//! like booleans (`HARBOR_TEARDOWN_FORCE_REMOVE`) or integers
//! (`HARBOR_WAIT_TIMEOUT_SECS`) must have valid values.

use camino::Utf8PathBuf;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use ortho_config::discovery::ConfigDiscovery;
use ortho_config::serde_json::{self, Map, Value};
use ortho_config::{MergeComposer, toml};
use tracing::debug;

use crate::config::HarborConfig;
use crate::error::{ConfigError, Result};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV_VAR: &str = "HARBOR_CONFIG_PATH";

// ============================================================================
// Environment Variable Specification Table
// ============================================================================

/// The type of value expected from an environment variable.
#[derive(Clone, Copy)]
enum EnvVarType {
    /// String value (always accepted).
    String,
    /// Boolean value (`true`/`false`). Invalid values return an error.
    Bool,
    /// Unsigned 64-bit integer. Invalid values return an error.
    U64,
}

/// Specification for a single environment variable mapping.
struct EnvVarSpec {
    /// The environment variable name (e.g., `HARBOR_RUNTIME`).
    env_var: &'static str,
    /// The JSON path segments (e.g., `["wait", "timeout_secs"]`).
    path: &'static [&'static str],
    /// The expected value type.
    var_type: EnvVarType,
}

/// Table of all environment variables and their JSON paths.
const ENV_VAR_SPECS: &[EnvVarSpec] = &[
    EnvVarSpec {
        env_var: "HARBOR_RUNTIME",
        path: &["runtime"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "HARBOR_COMMAND_TIMEOUT_SECS",
        path: &["command_timeout_secs"],
        var_type: EnvVarType::U64,
    },
    EnvVarSpec {
        env_var: "HARBOR_WAIT_POLL_INTERVAL_MS",
        path: &["wait", "poll_interval_ms"],
        var_type: EnvVarType::U64,
    },
    EnvVarSpec {
        env_var: "HARBOR_WAIT_TIMEOUT_SECS",
        path: &["wait", "timeout_secs"],
        var_type: EnvVarType::U64,
    },
    EnvVarSpec {
        env_var: "HARBOR_TEARDOWN_STOP_TIMEOUT_SECS",
        path: &["teardown", "stop_timeout_secs"],
        var_type: EnvVarType::U64,
    },
    EnvVarSpec {
        env_var: "HARBOR_TEARDOWN_FORCE_REMOVE",
        path: &["teardown", "force_remove"],
        var_type: EnvVarType::Bool,
    },
];

/// Returns the list of environment variable names recognised by the config loader.
///
/// Tests use this to clear every `HARBOR_*` variable without keeping a second
/// list in sync.
#[must_use]
pub fn env_var_names() -> Vec<&'static str> {
    ENV_VAR_SPECS.iter().map(|spec| spec.env_var).collect()
}

/// Highest-precedence values supplied by the embedding application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Explicit configuration file. Ignored when the file does not exist.
    pub config_path: Option<Utf8PathBuf>,
    /// Runtime binary override.
    pub runtime: Option<String>,
    /// Per-invocation timeout override, in seconds.
    pub command_timeout_secs: Option<u64>,
}

/// Load a configuration file and push it to the composer.
///
/// Uses `cap_std::fs_utf8`: the parent directory is opened with ambient
/// authority and the file is read relative to it.
fn load_config_file(path: &Utf8PathBuf, composer: &mut MergeComposer) -> Result<()> {
    let current_dir = Utf8PathBuf::from(".");
    let parent = match path.parent() {
        Some(dir) if !dir.as_str().is_empty() => dir,
        _ => current_dir.as_ref(),
    };
    let file_name = path.file_name().unwrap_or(path.as_str());

    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|e| {
        ConfigError::ParseError {
            message: format!("failed to open directory {parent}: {e}"),
        }
    })?;

    let content = dir
        .read_to_string(file_name)
        .map_err(|e| ConfigError::ParseError {
            message: format!("failed to read {path}: {e}"),
        })?;

    let value =
        toml::from_str::<serde_json::Value>(&content).map_err(|e| ConfigError::ParseError {
            message: format!("failed to parse {path}: {e}"),
        })?;

    debug!(%path, "loaded configuration file");
    composer.push_file(value, Some(path.clone()));
    Ok(())
}

/// Find the configuration file: the override path if it exists, otherwise
/// the first existing discovery candidate.
fn discover_config_path(overrides: &ConfigOverrides) -> Option<Utf8PathBuf> {
    overrides
        .config_path
        .clone()
        .filter(|p| p.exists())
        .or_else(|| {
            let discovery = ConfigDiscovery::builder("harbor")
                .env_var(CONFIG_PATH_ENV_VAR)
                .config_file_name("config.toml")
                .dotfile_name(".harbor.toml")
                .build();
            discovery
                .candidates()
                .into_iter()
                .filter(|p| p.exists())
                .find_map(|p| Utf8PathBuf::try_from(p).ok())
        })
}

/// Load configuration with full layer precedence.
///
/// This function loads configuration from all available sources:
/// 1. Defaults defined on [`HarborConfig`]
/// 2. Configuration file (explicit path, `HARBOR_CONFIG_PATH`, or discovery)
/// 3. Environment variables prefixed with `HARBOR_`
/// 4. The provided [`ConfigOverrides`]
///
/// Later sources override earlier ones. The merged result is validated.
///
/// # Errors
///
/// Returns `ConfigError` if configuration loading fails due to:
/// - Malformed configuration files
/// - Invalid typed environment variable values (e.g., a non-integer
///   `HARBOR_WAIT_TIMEOUT_SECS`)
/// - A blank runtime or zero wait duration after merging
pub fn load_config(overrides: &ConfigOverrides) -> Result<HarborConfig> {
    let mut composer = MergeComposer::new();

    let defaults =
        serde_json::to_value(HarborConfig::default()).map_err(|e| ConfigError::ParseError {
            message: format!("failed to serialise defaults: {e}"),
        })?;
    composer.push_defaults(defaults);

    if let Some(ref path) = discover_config_path(overrides) {
        load_config_file(path, &mut composer)?;
    }

    let env_values = collect_env_vars()?;
    if !env_values.is_null() {
        composer.push_environment(env_values);
    }

    let override_values = build_overrides(overrides);
    if !override_values.is_null() {
        composer.push_cli(override_values);
    }

    let config =
        HarborConfig::merge_from_layers(composer.layers()).map_err(ConfigError::OrthoConfig)?;
    config.validate()?;
    Ok(config)
}

/// Collect `HARBOR_*` environment variables into a JSON value.
///
/// All mappings are defined in [`ENV_VAR_SPECS`].
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` if a typed environment variable (bool,
/// u64) has an unparseable value.
fn collect_env_vars() -> Result<Value> {
    let mut root = Map::new();

    for spec in ENV_VAR_SPECS {
        let Ok(raw_value) = std::env::var(spec.env_var) else {
            continue;
        };

        let json_value = match spec.var_type {
            EnvVarType::String => Value::String(raw_value),
            EnvVarType::Bool => match raw_value.parse::<bool>() {
                Ok(b) => Value::Bool(b),
                Err(_) => {
                    return Err(ConfigError::InvalidValue {
                        field: spec.env_var.to_owned(),
                        reason: format!("expected bool (true/false), got '{raw_value}'"),
                    }
                    .into());
                }
            },
            EnvVarType::U64 => match raw_value.parse::<u64>() {
                Ok(n) => Value::Number(n.into()),
                Err(_) => {
                    return Err(ConfigError::InvalidValue {
                        field: spec.env_var.to_owned(),
                        reason: format!("expected unsigned integer, got '{raw_value}'"),
                    }
                    .into());
                }
            },
        };

        insert_at_path(&mut root, spec.path, json_value);
    }

    if root.is_empty() {
        Ok(Value::Null)
    } else {
        Ok(Value::Object(root))
    }
}

/// Insert a value at a nested path in a JSON map, creating intermediate
/// objects as needed.
fn insert_at_path(root: &mut Map<String, Value>, path: &[&str], value: Value) {
    let Some((&field, parents)) = path.split_last() else {
        return;
    };

    let mut current = root;
    for &segment in parents {
        let entry = current
            .entry(segment.to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        let Some(obj) = entry.as_object_mut() else {
            return;
        };
        current = obj;
    }

    current.insert(field.to_owned(), value);
}

/// Build a JSON value containing programmatic overrides.
fn build_overrides(overrides: &ConfigOverrides) -> Value {
    let mut values = Map::new();

    if let Some(ref runtime) = overrides.runtime {
        values.insert("runtime".to_owned(), Value::String(runtime.clone()));
    }

    if let Some(secs) = overrides.command_timeout_secs {
        values.insert("command_timeout_secs".to_owned(), Value::Number(secs.into()));
    }

    if values.is_empty() {
        Value::Null
    } else {
        Value::Object(values)
    }
}
