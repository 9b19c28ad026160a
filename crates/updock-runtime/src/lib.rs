//! updock-runtime: Container runtime abstraction
//!
//! Provides the `RuntimeClient` capability consumed by the update engine and
//! its Docker implementation.

pub mod docker;
pub mod error;
pub mod reference;
pub mod traits;
pub mod types;

pub use docker::DockerRuntime;
pub use error::RuntimeError;
pub use reference::{ImageReference, TagKind};
pub use traits::RuntimeClient;
pub use types::{ContainerDetails, ContainerSummary, ImageDetails, PullOutcome, repo_digest};
