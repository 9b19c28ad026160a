//! Image reference parsing

use std::fmt;

use crate::error::RuntimeError;

/// Tag that is rewritten on every publish
pub const MUTABLE_TAG: &str = "latest";

/// How an image reference resolves over time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// `latest` or no tag at all; compared by local image id
    Mutable,
    /// Any other tag or a digest reference; compared by registry digest
    Pinned,
}

/// A parsed `[registry[:port]/]repository[:tag][@digest]` reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    repository: String,
    tag: Option<String>,
    digest: Option<String>,
}

impl ImageReference {
    /// Parse an image reference string
    ///
    /// # Errors
    /// Returns `RuntimeError::InvalidReference` if the repository part is empty
    pub fn parse(raw: &str) -> Result<Self, RuntimeError> {
        let raw = raw.trim();
        let (name, digest) = match raw.split_once('@') {
            Some((name, digest)) => (name, Some(digest.to_string())),
            None => (raw, None),
        };

        // A colon only starts a tag when it comes after the last path separator,
        // otherwise it belongs to a registry port.
        let last_slash = name.rfind('/').map_or(0, |i| i + 1);
        let (repository, tag) = match name[last_slash..].rfind(':') {
            Some(i) => {
                let split = last_slash + i;
                (&name[..split], Some(name[split + 1..].to_string()))
            }
            None => (name, None),
        };

        if repository.is_empty() || tag.as_deref() == Some("") || digest.as_deref() == Some("") {
            return Err(RuntimeError::InvalidReference(raw.to_string()));
        }

        Ok(Self {
            repository: repository.to_string(),
            tag,
            digest,
        })
    }

    /// Repository including any registry prefix
    #[must_use]
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Explicit tag, if any
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Explicit digest, if any
    #[must_use]
    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    /// Tag or digest to request from the registry
    #[must_use]
    pub fn pull_tag(&self) -> String {
        match (&self.digest, &self.tag) {
            (Some(digest), _) => digest.clone(),
            (None, Some(tag)) => tag.clone(),
            (None, None) => MUTABLE_TAG.to_string(),
        }
    }

    /// Classify the reference
    #[must_use]
    pub fn tag_kind(&self) -> TagKind {
        if self.digest.is_some() {
            return TagKind::Pinned;
        }
        match self.tag.as_deref() {
            None | Some(MUTABLE_TAG) => TagKind::Mutable,
            Some(_) => TagKind::Pinned,
        }
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repository)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{tag}")?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{digest}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_repository() {
        let r = ImageReference::parse("nginx").unwrap();
        assert_eq!(r.repository(), "nginx");
        assert_eq!(r.tag(), None);
        assert_eq!(r.pull_tag(), "latest");
        assert_eq!(r.tag_kind(), TagKind::Mutable);
    }

    #[test]
    fn test_parse_latest_tag() {
        let r = ImageReference::parse("app:latest").unwrap();
        assert_eq!(r.tag_kind(), TagKind::Mutable);
    }

    #[test]
    fn test_parse_pinned_tag() {
        let r = ImageReference::parse("ghcr.io/acme/app:1.0").unwrap();
        assert_eq!(r.repository(), "ghcr.io/acme/app");
        assert_eq!(r.tag(), Some("1.0"));
        assert_eq!(r.tag_kind(), TagKind::Pinned);
    }

    #[test]
    fn test_parse_registry_port_is_not_a_tag() {
        let r = ImageReference::parse("registry.local:5000/team/app").unwrap();
        assert_eq!(r.repository(), "registry.local:5000/team/app");
        assert_eq!(r.tag(), None);
        assert_eq!(r.tag_kind(), TagKind::Mutable);

        let r = ImageReference::parse("registry.local:5000/team/app:2.3").unwrap();
        assert_eq!(r.repository(), "registry.local:5000/team/app");
        assert_eq!(r.tag(), Some("2.3"));
    }

    #[test]
    fn test_parse_digest_reference() {
        let r = ImageReference::parse("app@sha256:abc").unwrap();
        assert_eq!(r.digest(), Some("sha256:abc"));
        assert_eq!(r.pull_tag(), "sha256:abc");
        assert_eq!(r.tag_kind(), TagKind::Pinned);
    }

    #[test]
    fn test_display_round_trips_input() {
        for raw in ["nginx", "app:1.0", "registry.local:5000/app:2@sha256:abc"] {
            assert_eq!(ImageReference::parse(raw).unwrap().to_string(), raw);
        }
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(ImageReference::parse("").is_err());
        assert!(ImageReference::parse("app:").is_err());
        assert!(ImageReference::parse(":tag").is_err());
    }
}
