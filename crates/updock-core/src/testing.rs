//! In-crate runtime mocks for unit tests

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use updock_runtime::{
    ContainerDetails, ContainerSummary, ImageDetails, ImageReference, PullOutcome, RuntimeClient,
    RuntimeError,
};

use crate::registry::RuntimeFactory;

/// Scriptable runtime; images switch to their pulled variant once pulled
#[derive(Default)]
pub struct MockRuntime {
    unreachable: bool,
    hang_listing: bool,
    containers: Vec<ContainerSummary>,
    images: HashMap<String, ImageDetails>,
    pulled_images: HashMap<String, ImageDetails>,
    pull_digests: HashMap<String, String>,
    remote_digests: HashMap<String, String>,
    failing_pulls: HashSet<String>,
    pulled: Mutex<HashSet<String>>,
    calls: AtomicUsize,
}

impl MockRuntime {
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// Listing never completes
    pub fn hanging() -> Self {
        Self {
            hang_listing: true,
            ..Self::default()
        }
    }

    pub fn with_container(mut self, id: &str, name: &str, image: &str) -> Self {
        self.containers
            .push(ContainerSummary::new(id, format!("/{name}"), image));
        self
    }

    pub fn with_image(mut self, reference: &str, id: &str, digest: Option<&str>) -> Self {
        self.images
            .insert(reference.to_string(), image(reference, id, digest));
        self
    }

    pub fn with_pulled_image(mut self, reference: &str, id: &str, digest: Option<&str>) -> Self {
        self.pulled_images
            .insert(reference.to_string(), image(reference, id, digest));
        self
    }

    pub fn with_pull_digest(mut self, reference: &str, digest: &str) -> Self {
        self.pull_digests
            .insert(reference.to_string(), digest.to_string());
        self
    }

    pub fn with_remote_digest(mut self, reference: &str, digest: &str) -> Self {
        self.remote_digests
            .insert(reference.to_string(), digest.to_string());
        self
    }

    pub fn with_failing_pull(mut self, reference: &str) -> Self {
        self.failing_pulls.insert(reference.to_string());
        self
    }

    /// Number of runtime calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Whether `reference` was pulled
    pub fn was_pulled(&self, reference: &str) -> bool {
        self.pulled
            .lock()
            .map(|p| p.contains(reference))
            .unwrap_or(false)
    }

    fn enter(&self) -> Result<(), RuntimeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(RuntimeError::Unreachable("connection refused".to_string()));
        }
        Ok(())
    }
}

fn image(reference: &str, id: &str, digest: Option<&str>) -> ImageDetails {
    let repository = reference.split(':').next().unwrap_or(reference);
    ImageDetails {
        id: id.to_string(),
        repo_digests: digest
            .map(|d| vec![format!("{repository}@{d}")])
            .unwrap_or_default(),
        created_at: None,
    }
}

#[async_trait]
impl RuntimeClient for MockRuntime {
    async fn ping(&self) -> Result<(), RuntimeError> {
        self.enter()
    }

    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, RuntimeError> {
        self.enter()?;
        if self.hang_listing {
            std::future::pending::<()>().await;
        }
        Ok(self.containers.clone())
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails, RuntimeError> {
        self.enter()?;
        self.containers
            .iter()
            .find(|c| c.id == id)
            .map(|c| ContainerDetails {
                id: c.id.clone(),
                name: c.display_name(),
                image: c.image.clone(),
                created_at: None,
            })
            .ok_or_else(|| RuntimeError::ContainerNotFound(id.to_string()))
    }

    async fn inspect_image(&self, reference: &str) -> Result<ImageDetails, RuntimeError> {
        self.enter()?;
        if self.was_pulled(reference)
            && let Some(image) = self.pulled_images.get(reference)
        {
            return Ok(image.clone());
        }
        self.images
            .get(reference)
            .cloned()
            .ok_or_else(|| RuntimeError::ImageNotFound(reference.to_string()))
    }

    async fn pull_image(&self, reference: &ImageReference) -> Result<PullOutcome, RuntimeError> {
        self.enter()?;
        let key = reference.to_string();
        if self.failing_pulls.contains(&key) {
            return Err(RuntimeError::PullFailed {
                image: key,
                message: "manifest unknown".to_string(),
            });
        }
        if let Ok(mut pulled) = self.pulled.lock() {
            pulled.insert(key.clone());
        }
        Ok(PullOutcome {
            digest: self.pull_digests.get(&key).cloned(),
        })
    }

    async fn remote_digest(
        &self,
        reference: &ImageReference,
    ) -> Result<Option<String>, RuntimeError> {
        self.enter()?;
        Ok(self.remote_digests.get(&reference.to_string()).cloned())
    }

    fn runtime_type(&self) -> &'static str {
        "mock"
    }
}

/// Factory handing out prepared mocks
#[derive(Default)]
pub struct MockFactory {
    local: Option<Arc<MockRuntime>>,
    remotes: HashMap<String, Arc<MockRuntime>>,
    remote_created: Arc<AtomicUsize>,
}

impl MockFactory {
    pub fn with_local(runtime: MockRuntime) -> Self {
        Self {
            local: Some(Arc::new(runtime)),
            ..Self::default()
        }
    }

    pub fn with_remote(mut self, hostname: &str, runtime: Arc<MockRuntime>) -> Self {
        self.remotes.insert(hostname.to_string(), runtime);
        self
    }

    /// Counter of remote handles built
    pub fn remote_created(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.remote_created)
    }
}

#[async_trait]
impl RuntimeFactory for MockFactory {
    async fn local(&self) -> Result<Arc<dyn RuntimeClient>, RuntimeError> {
        match &self.local {
            Some(runtime) => Ok(Arc::clone(runtime) as Arc<dyn RuntimeClient>),
            None => Err(RuntimeError::Unreachable("no local runtime".to_string())),
        }
    }

    async fn remote(
        &self,
        hostname: &str,
        _port: u16,
    ) -> Result<Arc<dyn RuntimeClient>, RuntimeError> {
        self.remote_created.fetch_add(1, Ordering::SeqCst);
        let runtime = self
            .remotes
            .get(hostname)
            .cloned()
            .unwrap_or_else(|| Arc::new(MockRuntime::default()));
        Ok(runtime as Arc<dyn RuntimeClient>)
    }
}
