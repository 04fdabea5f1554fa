//! Per-verb record schemas for JSON-lines output.
//!
//! Docker and Podman spell some fields differently; aliases cover both.

use serde::Deserialize;

use crate::model::{Container, ContainerStatus, Image};

/// One line of `ps --format '{{json .}}'`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PsRecord {
    /// Full container id.
    #[serde(rename = "ID", alias = "Id")]
    pub id: String,
    /// Container name or names.
    #[serde(rename = "Names")]
    pub names: Names,
    /// Image reference.
    #[serde(rename = "Image")]
    pub image: String,
    /// Runtime state word, for example `running`.
    #[serde(rename = "State")]
    pub state: String,
}

/// Docker prints names as one comma-separated string, Podman as an array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Names {
    /// Comma-separated names.
    Joined(String),
    /// Individual names.
    List(Vec<String>),
}

impl Names {
    /// Return the primary name.
    #[must_use]
    pub fn primary(&self) -> &str {
        match self {
            Self::Joined(joined) => joined.split(',').next().unwrap_or_default(),
            Self::List(names) => names.first().map_or("", String::as_str),
        }
    }
}

impl From<PsRecord> for Container {
    fn from(record: PsRecord) -> Self {
        let name = String::from(record.names.primary().trim_start_matches('/'));
        Self::new(
            record.id,
            name,
            ContainerStatus::from_runtime(&record.state),
            record.image,
        )
    }
}

/// One line of `images --format '{{json .}}'`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageRecord {
    /// Repository name, `<none>` for dangling images.
    #[serde(rename = "Repository")]
    pub repository: String,
    /// Tag, `<none>` for untagged images.
    #[serde(rename = "Tag")]
    pub tag: String,
    /// Image id.
    #[serde(rename = "ID", alias = "Id")]
    pub id: String,
}

impl From<ImageRecord> for Image {
    fn from(record: ImageRecord) -> Self {
        Self::new(record.repository, record.tag, record.id)
    }
}

/// The single line of `image inspect --format '{{json .}}'`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageInspectRecord {
    /// Content-addressed image id, for example `sha256:…`.
    #[serde(rename = "Id")]
    pub id: String,
}
