//! Immutable domain values for images and containers.
//!
//! Every value here is a snapshot of what the runtime reported at one moment.
//! Holding a [`Container`] says nothing about the container's current state;
//! operations that depend on current state re-query the runtime.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::DecodeError;

/// Lifecycle status of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerStatus {
    /// Created but never started.
    Created,
    /// Running.
    Running,
    /// Paused.
    Paused,
    /// Exited, with or without error.
    Exited,
    /// Any state the runtime reports outside the four above.
    Unknown,
}

impl ContainerStatus {
    /// Map a runtime status word onto a status.
    ///
    /// Transitional or terminal runtime states (`restarting`, `removing`,
    /// `dead`) and unrecognised words map to [`ContainerStatus::Unknown`].
    #[must_use]
    pub fn from_runtime(state: &str) -> Self {
        match state.trim().to_ascii_lowercase().as_str() {
            "created" | "configured" => Self::Created,
            "running" => Self::Running,
            "paused" => Self::Paused,
            "exited" | "stopped" => Self::Exited,
            _ => Self::Unknown,
        }
    }

    /// Return the lowercase name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Exited => "exited",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContainerStatus {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_runtime(value))
    }
}

/// A pulled or listed image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Image {
    repository: String,
    tag: String,
    id: String,
}

impl Image {
    /// Build an image value from its identity.
    #[must_use]
    pub fn new(
        repository: impl Into<String>,
        tag: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            repository: repository.into(),
            tag: tag.into(),
            id: id.into(),
        }
    }

    /// Return the repository, for example `alpine` or `ghcr.io/org/app`.
    #[must_use]
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Return the tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Return the content digest or image id reported by the runtime.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Return the `repository:tag` reference used on the command line.
    #[must_use]
    pub fn reference(&self) -> String {
        format!("{}:{}", self.repository, self.tag)
    }
}

/// A snapshot of a container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Container {
    id: String,
    name: String,
    status: ContainerStatus,
    image: String,
}

impl Container {
    /// Build a container snapshot.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        status: ContainerStatus,
        image: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status,
            image: image.into(),
        }
    }

    /// Build a snapshot from an inspect document.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when the document lacks the id, name, state, or
    /// image fields.
    pub fn from_inspect(record: &InspectRecord) -> Result<Self, DecodeError> {
        let id = record.required_str("/Id")?;
        let name = record.required_str("/Name")?;
        let status = record.required_str("/State/Status")?;
        let image = record.required_str("/Config/Image")?;

        Ok(Self {
            id: String::from(id),
            name: String::from(name.trim_start_matches('/')),
            status: ContainerStatus::from_runtime(status),
            image: String::from(image),
        })
    }

    /// Return the full container id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Return the container name without the leading slash.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the status observed when this snapshot was taken.
    #[must_use]
    pub const fn status(&self) -> ContainerStatus {
        self.status
    }

    /// Return the image reference the container was created from.
    #[must_use]
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Return whether the snapshot observed a running container.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status == ContainerStatus::Running
    }
}

/// The structured document returned by `inspect`.
///
/// The document is kept opaque; typed accessors cover the fields harbor
/// itself relies on and [`InspectRecord::pointer`] reaches everything else.
#[derive(Debug, Clone, PartialEq)]
pub struct InspectRecord {
    document: Value,
}

impl InspectRecord {
    /// Wrap a decoded JSON object.
    #[must_use]
    pub const fn new(document: Map<String, Value>) -> Self {
        Self {
            document: Value::Object(document),
        }
    }

    /// Look up a top-level key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.document.get(key)
    }

    /// Look up a nested value by RFC 6901 JSON pointer, for example
    /// `/State/Status` or `/Config/Labels/com.example~1role`.
    #[must_use]
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.document.pointer(pointer)
    }

    /// Return the container id.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.pointer("/Id").and_then(Value::as_str)
    }

    /// Return the status reported under `State.Status`.
    #[must_use]
    pub fn status(&self) -> Option<ContainerStatus> {
        self.pointer("/State/Status")
            .and_then(Value::as_str)
            .map(ContainerStatus::from_runtime)
    }

    /// Return the health status (`starting`, `healthy`, `unhealthy`) when the
    /// image defines a health check.
    #[must_use]
    pub fn health_status(&self) -> Option<&str> {
        self.pointer("/State/Health/Status").and_then(Value::as_str)
    }

    /// Return the exit code recorded under `State.ExitCode`.
    #[must_use]
    pub fn exit_code(&self) -> Option<i64> {
        self.pointer("/State/ExitCode").and_then(Value::as_i64)
    }

    /// Borrow the whole document.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.document
    }

    /// Consume the record, returning the document.
    #[must_use]
    pub fn into_inner(self) -> Value {
        self.document
    }

    fn required_str(&self, pointer: &str) -> Result<&str, DecodeError> {
        self.pointer(pointer).and_then(Value::as_str).ok_or_else(|| {
            DecodeError::new(
                "inspect document",
                format!("missing string field '{pointer}'"),
                self.document.to_string(),
            )
        })
    }
}
