//! Type definitions for runtime inspection results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A running container as reported by a container listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSummary {
    /// Runtime container id
    pub id: String,
    /// Names as reported by the runtime (usually prefixed with `/`)
    pub names: Vec<String>,
    /// Image reference the container was started from
    pub image: String,
}

impl ContainerSummary {
    /// Create a new summary
    pub fn new(id: impl Into<String>, name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            names: vec![name.into()],
            image: image.into(),
        }
    }

    /// First name with the leading separator stripped, falling back to the id
    #[must_use]
    pub fn display_name(&self) -> String {
        self.names
            .first()
            .map(|n| n.trim_start_matches('/').to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.id.clone())
    }
}

/// Container inspection details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerDetails {
    /// Runtime container id
    pub id: String,
    /// Container name without leading separator
    pub name: String,
    /// Configured image reference
    pub image: String,
    /// Container creation time
    pub created_at: Option<DateTime<Utc>>,
}

/// Image inspection details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageDetails {
    /// Content-addressed image id (`sha256:...`)
    pub id: String,
    /// `repo@sha256:...` entries known for this image
    pub repo_digests: Vec<String>,
    /// Image build time
    pub created_at: Option<DateTime<Utc>>,
}

impl ImageDetails {
    /// Digest portion of the first repo-digest entry
    ///
    /// Images known under several registries are not disambiguated.
    #[must_use]
    pub fn first_digest(&self) -> Option<&str> {
        self.repo_digests.first().and_then(|d| repo_digest(d))
    }
}

/// Result of a registry pull
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PullOutcome {
    /// Digest reported by the registry, if any
    pub digest: Option<String>,
}

/// Extract the digest part of a `repo@digest` entry
#[must_use]
pub fn repo_digest(entry: &str) -> Option<&str> {
    entry
        .split_once('@')
        .map(|(_, digest)| digest)
        .filter(|d| !d.is_empty())
}

/// Parse an RFC 3339 timestamp as reported by the Docker API
pub(crate) fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
