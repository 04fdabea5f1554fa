//! Configuration data types for harbor.

use std::time::Duration;

use ortho_config::{OrthoConfig, OrthoResult, PostMergeContext, PostMergeHook};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Readiness wait defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WaitConfig {
    /// Pause between readiness checks, in milliseconds.
    pub poll_interval_ms: u64,

    /// Total time allowed for a readiness wait, in seconds.
    pub timeout_secs: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 250,
            timeout_secs: 60,
        }
    }
}

/// Scoped container teardown defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TeardownConfig {
    /// Grace period passed to `stop`, in seconds.
    pub stop_timeout_secs: u64,

    /// Force removal of the container during teardown.
    pub force_remove: bool,
}

impl Default for TeardownConfig {
    fn default() -> Self {
        Self {
            stop_timeout_secs: 10,
            force_remove: false,
        }
    }
}

/// Root library configuration.
///
/// This structure is loaded from configuration files, environment variables,
/// and programmatic overrides with layered precedence. The precedence order
/// (lowest to highest) is: defaults, configuration file, environment
/// variables, overrides.
///
/// Configuration files are discovered in this order:
/// 1. Path specified via `HARBOR_CONFIG_PATH` environment variable
/// 2. `.harbor.toml` in the current working directory
/// 3. `.harbor.toml` in the home directory
/// 4. `~/.config/harbor/config.toml` (XDG default)
#[derive(Debug, Clone, Default, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(
    prefix = "HARBOR",
    post_merge_hook,
    discovery(
        app_name = "harbor",
        env_var = "HARBOR_CONFIG_PATH",
        config_file_name = "config.toml",
        dotfile_name = ".harbor.toml",
        config_cli_long = "config",
        config_cli_visible = true,
    )
)]
pub struct HarborConfig {
    /// The runtime binary, for example `docker` or `podman`.
    pub runtime: Option<String>,

    /// Per-invocation timeout in seconds. Unset or zero means no timeout.
    pub command_timeout_secs: Option<u64>,

    /// Readiness wait defaults.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub wait: WaitConfig,

    /// Teardown defaults for scoped containers.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub teardown: TeardownConfig,
}

impl HarborConfig {
    /// Return the per-invocation timeout, treating zero as none.
    #[must_use]
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Reject values that can never produce a working engine.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a blank runtime or a zero wait
    /// interval or timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self
            .runtime
            .as_deref()
            .is_some_and(|runtime| runtime.trim().is_empty())
        {
            return Err(invalid("runtime", "must not be blank"));
        }
        if self.wait.poll_interval_ms == 0 {
            return Err(invalid("wait.poll_interval_ms", "must be greater than zero"));
        }
        if self.wait.timeout_secs == 0 {
            return Err(invalid("wait.timeout_secs", "must be greater than zero"));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: String::from(field),
        reason: String::from(reason),
    }
}

impl PostMergeHook for HarborConfig {
    fn post_merge(&mut self, _ctx: &PostMergeContext) -> OrthoResult<()> {
        if let Some(runtime) = self.runtime.as_mut() {
            let trimmed = String::from(runtime.trim());
            *runtime = trimmed;
        }
        Ok(())
    }
}
