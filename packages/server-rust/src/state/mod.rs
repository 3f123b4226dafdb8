//! Durable per-server configuration state.
//!
//! One snapshot record per server id, holding the full set of container
//! descriptors. Snapshots are replaced whole on every mutation -- there are
//! no partial or delta records.

pub mod file;
pub mod memory;
pub mod repository;

pub use file::FileStateRepository;
pub use memory::InMemoryStateRepository;
pub use repository::{StateError, StateRepository};

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Release identifier of a deployed container artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseId {
    pub artifact: String,
    pub version: String,
}

impl ReleaseId {
    #[must_use]
    pub fn new(artifact: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            artifact: artifact.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for ReleaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.artifact, self.version)
    }
}

/// Lifecycle status of a deployed container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerStatus {
    /// Accepting execution requests.
    #[serde(rename = "STARTED")]
    Started,
    /// Deployed but not routable.
    #[serde(rename = "STOPPED")]
    Stopped,
    /// Failed to start; not routable.
    #[serde(rename = "FAILED")]
    Failed,
}

/// Descriptor of one container hosted by a server instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDescriptor {
    pub container_id: String,
    pub release: ReleaseId,
    #[serde(default)]
    pub config: BTreeMap<String, String>,
    pub status: ContainerStatus,
}

impl ContainerDescriptor {
    /// A freshly deployed container in the `Started` state.
    #[must_use]
    pub fn new(container_id: impl Into<String>, release: ReleaseId) -> Self {
        Self {
            container_id: container_id.into(),
            release,
            config: BTreeMap::new(),
            status: ContainerStatus::Started,
        }
    }

    /// `true` when the container accepts execution requests.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.status == ContainerStatus::Started
    }
}

/// The full configuration snapshot of one server instance.
///
/// The server id is immutable after creation; container ids are unique
/// within a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerState {
    server_id: String,
    pub containers: Vec<ContainerDescriptor>,
    #[serde(default)]
    pub controller_urls: Vec<String>,
    pub last_modified_ms: i64,
}

impl ServerState {
    /// An empty snapshot for a freshly bootstrapped server.
    #[must_use]
    pub fn new(server_id: impl Into<String>) -> Self {
        Self {
            server_id: server_id.into(),
            containers: Vec::new(),
            controller_urls: Vec::new(),
            last_modified_ms: 0,
        }
    }

    /// The immutable server identity.
    #[must_use]
    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    /// Looks up a container by id.
    #[must_use]
    pub fn container(&self, container_id: &str) -> Option<&ContainerDescriptor> {
        self.containers
            .iter()
            .find(|c| c.container_id == container_id)
    }

    /// Mutable lookup of a container by id.
    pub fn container_mut(&mut self, container_id: &str) -> Option<&mut ContainerDescriptor> {
        self.containers
            .iter_mut()
            .find(|c| c.container_id == container_id)
    }

    /// Adds a container. Returns `false` when the id is already taken.
    pub fn add_container(&mut self, descriptor: ContainerDescriptor) -> bool {
        if self.container(&descriptor.container_id).is_some() {
            return false;
        }
        self.containers.push(descriptor);
        true
    }

    /// Removes a container by id, returning its descriptor.
    pub fn remove_container(&mut self, container_id: &str) -> Option<ContainerDescriptor> {
        let index = self
            .containers
            .iter()
            .position(|c| c.container_id == container_id)?;
        Some(self.containers.remove(index))
    }

    /// Stamps the snapshot with a new last-modified time.
    pub fn touch(&mut self, now_ms: i64) {
        self.last_modified_ms = now_ms;
    }
}
