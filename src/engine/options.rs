//! Typed options for each runtime verb.
//!
//! Every option struct states its defaults and is validated before any process
//! is spawned, so a request that can never succeed fails without touching the
//! runtime.

use std::collections::{BTreeMap, HashSet};

use smart_default::SmartDefault;

use super::mapping::{PortMapping, VolumeMount};
use super::signal::Signal;
use crate::error::InputValidationError;

/// Options for `pull`.
#[derive(Debug, Clone, PartialEq, Eq, SmartDefault)]
pub struct PullOptions {
    /// Tag to pull. Defaults to `latest`.
    #[default = "latest"]
    pub tag: String,
}

impl PullOptions {
    /// Pull the given tag.
    #[must_use]
    pub fn tag(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

/// Options for the container listing verbs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Include stopped containers. Defaults to running containers only.
    pub all: bool,
}

/// Options for `run`.
#[derive(Debug, Clone, PartialEq, Eq, SmartDefault)]
pub struct RunOptions {
    /// Container name. When absent the runtime picks one, except for attached
    /// runs, which receive a generated `harbor-<pid>-<n>` name.
    pub name: Option<String>,

    /// Published ports.
    pub ports: Vec<PortMapping>,

    /// Bind mounts and named volumes.
    pub volumes: Vec<VolumeMount>,

    /// Environment variables, passed in key order.
    pub env: BTreeMap<String, String>,

    /// Command overriding the image default.
    pub command: Option<Vec<String>>,

    /// Return as soon as the container starts. When `false` the call blocks
    /// until the container exits.
    #[default = true]
    pub detach: bool,
}

impl RunOptions {
    /// Set the container name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Publish a port.
    #[must_use]
    pub fn with_port(mut self, mapping: PortMapping) -> Self {
        self.ports.push(mapping);
        self
    }

    /// Add a volume mount.
    #[must_use]
    pub fn with_volume(mut self, mount: VolumeMount) -> Self {
        self.volumes.push(mount);
        self
    }

    /// Set an environment variable.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Override the image command.
    #[must_use]
    pub fn with_command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = Some(command.into_iter().map(Into::into).collect());
        self
    }

    /// Choose between detached and attached execution.
    #[must_use]
    pub const fn detached(mut self, detach: bool) -> Self {
        self.detach = detach;
        self
    }

    /// Check every option that can be rejected without the runtime.
    ///
    /// # Errors
    ///
    /// Returns [`InputValidationError`] for an invalid name, a zero or
    /// duplicated host port, an invalid volume, a malformed environment key, or
    /// an empty command.
    pub fn validate(&self) -> Result<(), InputValidationError> {
        if let Some(name) = &self.name {
            validate_container_name(name)?;
        }
        validate_ports(&self.ports)?;
        validate_volumes(&self.volumes)?;
        self.env.keys().try_for_each(|key| validate_env_key(key))?;
        if self.command.as_ref().is_some_and(Vec::is_empty) {
            return Err(InputValidationError::MissingRequired {
                field: String::from("command"),
            });
        }
        Ok(())
    }
}

/// Options for `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, SmartDefault)]
pub struct StopOptions {
    /// Grace period in seconds before the runtime kills the container.
    #[default = 10]
    pub timeout_secs: u64,
}

/// Options for `restart`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, SmartDefault)]
pub struct RestartOptions {
    /// Grace period in seconds before the runtime kills the container.
    #[default = 10]
    pub timeout_secs: u64,
}

/// Options for `kill`.
#[derive(Debug, Clone, PartialEq, Eq, SmartDefault)]
pub struct KillOptions {
    /// Signal name (`SIGTERM`, `TERM`) or number. Defaults to `SIGTERM`.
    #[default = "SIGTERM"]
    pub signal: String,
}

impl KillOptions {
    /// Send the given signal.
    #[must_use]
    pub fn signal(signal: impl Into<String>) -> Self {
        Self {
            signal: signal.into(),
        }
    }

    pub(crate) fn resolve(&self) -> Result<Signal, InputValidationError> {
        self.signal.parse()
    }
}

/// Options for `rm`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveOptions {
    /// Remove a running container.
    pub force: bool,
    /// Remove anonymous volumes attached to the container.
    pub volumes: bool,
}

/// Options for `rmi`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveImageOptions {
    /// Remove the image even when containers use it.
    pub force: bool,
}

/// How much log history to return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tail {
    /// The whole history.
    #[default]
    All,
    /// The last `n` lines.
    Lines(u32),
}

impl Tail {
    pub(crate) fn to_arg(self) -> String {
        match self {
            Self::All => String::from("all"),
            Self::Lines(count) => count.to_string(),
        }
    }
}

/// Options for `logs`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogsOptions {
    /// Keep streaming new output.
    pub follow: bool,
    /// History to include.
    pub tail: Tail,
}

/// Options for `exec`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOptions {
    /// Start the command and return without waiting for it.
    pub detach: bool,
}

/// Check a container name against `[a-zA-Z0-9][a-zA-Z0-9_.-]*`.
pub(crate) fn validate_container_name(name: &str) -> Result<(), InputValidationError> {
    let mut chars = name.chars();
    let valid_first = chars.next().is_some_and(|first| first.is_ascii_alphanumeric());
    let valid_rest = chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-'));
    if valid_first && valid_rest {
        return Ok(());
    }
    Err(InputValidationError::InvalidValue {
        field: String::from("name"),
        reason: format!("'{name}' must match [a-zA-Z0-9][a-zA-Z0-9_.-]*"),
    })
}

fn validate_ports(ports: &[PortMapping]) -> Result<(), InputValidationError> {
    let mut bound: Vec<&PortMapping> = Vec::with_capacity(ports.len());
    for mapping in ports {
        mapping.validate()?;
        if bound.iter().any(|earlier| earlier.collides_with(mapping)) {
            return Err(InputValidationError::DuplicateHostPort {
                port: mapping.host_port(),
            });
        }
        bound.push(mapping);
    }
    Ok(())
}

fn validate_volumes(volumes: &[VolumeMount]) -> Result<(), InputValidationError> {
    let mut targets = HashSet::with_capacity(volumes.len());
    for mount in volumes {
        mount.validate()?;
        if !targets.insert(mount.target()) {
            return Err(InputValidationError::InvalidValue {
                field: String::from("volumes"),
                reason: format!("target '{}' is mounted more than once", mount.target()),
            });
        }
    }
    Ok(())
}

fn validate_env_key(key: &str) -> Result<(), InputValidationError> {
    if key.is_empty() {
        return Err(InputValidationError::MissingRequired {
            field: String::from("env key"),
        });
    }
    if key.contains('=') || key.contains(char::is_whitespace) {
        return Err(InputValidationError::InvalidValue {
            field: String::from("env"),
            reason: format!("key '{key}' must not contain '=' or whitespace"),
        });
    }
    Ok(())
}

/// Check an image repository and tag before they reach the command line.
pub(crate) fn validate_image_reference(
    repository: &str,
    tag: &str,
) -> Result<(), InputValidationError> {
    if repository.trim().is_empty() {
        return Err(InputValidationError::MissingRequired {
            field: String::from("repository"),
        });
    }
    if tag.trim().is_empty() {
        return Err(InputValidationError::MissingRequired {
            field: String::from("tag"),
        });
    }
    if repository.contains(char::is_whitespace) {
        return Err(InputValidationError::InvalidValue {
            field: String::from("repository"),
            reason: String::from("must not contain whitespace"),
        });
    }
    let last_segment = repository.rsplit('/').next().unwrap_or(repository);
    if last_segment.contains(':') || repository.contains('@') {
        return Err(InputValidationError::InvalidValue {
            field: String::from("repository"),
            reason: format!(
                "'{repository}' carries an embedded tag or digest; pass the tag separately"
            ),
        });
    }
    if tag.contains(char::is_whitespace) || tag.contains(':') || tag.contains('/') {
        return Err(InputValidationError::InvalidValue {
            field: String::from("tag"),
            reason: format!("'{tag}' is not a valid tag"),
        });
    }
    Ok(())
}
