//! Configuration system for harbor.
//!
//! Settings are merged by the `ortho_config` crate. Programmatic overrides
//! take precedence over environment variables, which override configuration
//! files, which override defaults.
//!
//! The configuration file is discovered at `~/.config/harbor/config.toml` by
//! default, or `.harbor.toml` in the working or home directory.
//!
//! # Example Configuration
//!
//! ```toml
//! runtime = "podman"
//! command_timeout_secs = 120
//!
//! [wait]
//! poll_interval_ms = 250
//! timeout_secs = 60
//!
//! [teardown]
//! stop_timeout_secs = 10
//! force_remove = false
//! ```

mod loader;
mod types;


pub use loader::{CONFIG_PATH_ENV_VAR, ConfigOverrides, env_var_names, load_config};
pub use types::{HarborConfig, TeardownConfig, WaitConfig};
