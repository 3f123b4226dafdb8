//! Administrative path for container lifecycle and server info.
//!
//! All server-state mutations flow through here -- the request router only
//! reads. Each operation loads the current snapshot, applies one change,
//! and persists the whole snapshot back through the repository. A single
//! mutation lock keeps the load-modify-store sequence single-writer.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::state::{
    ContainerDescriptor, ContainerStatus, ReleaseId, ServerState, StateError, StateRepository,
};

/// Errors from administrative operations.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("container {container_id} already exists")]
    DuplicateContainer { container_id: String },
    #[error("container {container_id} is not deployed")]
    UnknownContainer { container_id: String },
    #[error(transparent)]
    State(#[from] StateError),
}

/// Summary information about a running server instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub server_id: String,
    pub version: String,
    pub containers: usize,
}

/// Container lifecycle management for one server instance.
pub struct ServerAdmin {
    server_id: String,
    repository: Arc<dyn StateRepository>,
    mutation: Mutex<()>,
}

impl ServerAdmin {
    #[must_use]
    pub fn new(server_id: impl Into<String>, repository: Arc<dyn StateRepository>) -> Self {
        Self {
            server_id: server_id.into(),
            repository,
            mutation: Mutex::new(()),
        }
    }

    /// The server id this admin manages.
    #[must_use]
    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    /// Loads the server state, creating and persisting an empty snapshot on
    /// first bootstrap.
    ///
    /// # Errors
    ///
    /// Propagates repository read/write failures.
    pub fn bootstrap(&self) -> Result<ServerState, StateError> {
        let _guard = self.mutation.lock();
        if let Some(state) = self.repository.load(&self.server_id)? {
            return Ok(state);
        }
        let mut state = ServerState::new(self.server_id.as_str());
        state.touch(now_ms());
        self.repository.store(&state)?;
        info!(server_id = %self.server_id, "server state bootstrapped");
        Ok(state)
    }

    /// Deploys a new container in the `Started` state.
    ///
    /// # Errors
    ///
    /// [`AdminError::DuplicateContainer`] when the id is already taken.
    pub fn create_container(
        &self,
        container_id: impl Into<String>,
        release: ReleaseId,
        config: BTreeMap<String, String>,
    ) -> Result<ContainerDescriptor, AdminError> {
        let container_id = container_id.into();
        let _guard = self.mutation.lock();
        let mut state = self.load_or_new()?;

        if state.container(&container_id).is_some() {
            return Err(AdminError::DuplicateContainer { container_id });
        }

        let mut descriptor = ContainerDescriptor::new(container_id.clone(), release);
        descriptor.config = config;
        state.add_container(descriptor.clone());
        self.persist(state)?;

        info!(container_id, release = %descriptor.release, "container created");
        Ok(descriptor)
    }

    /// Undeploys a container, returning its final descriptor.
    ///
    /// # Errors
    ///
    /// [`AdminError::UnknownContainer`] when the id is not deployed.
    pub fn dispose_container(&self, container_id: &str) -> Result<ContainerDescriptor, AdminError> {
        let _guard = self.mutation.lock();
        let mut state = self.load_or_new()?;

        let Some(descriptor) = state.remove_container(container_id) else {
            return Err(AdminError::UnknownContainer {
                container_id: container_id.to_string(),
            });
        };
        self.persist(state)?;

        info!(container_id, "container disposed");
        Ok(descriptor)
    }

    /// Marks a container as started (routable).
    ///
    /// # Errors
    ///
    /// [`AdminError::UnknownContainer`] when the id is not deployed.
    pub fn start_container(&self, container_id: &str) -> Result<ContainerDescriptor, AdminError> {
        self.set_status(container_id, ContainerStatus::Started)
    }

    /// Marks a container as stopped (deployed, not routable).
    ///
    /// # Errors
    ///
    /// [`AdminError::UnknownContainer`] when the id is not deployed.
    pub fn stop_container(&self, container_id: &str) -> Result<ContainerDescriptor, AdminError> {
        self.set_status(container_id, ContainerStatus::Stopped)
    }

    /// Sets one configuration item on a container.
    ///
    /// # Errors
    ///
    /// [`AdminError::UnknownContainer`] when the id is not deployed.
    pub fn update_container_config(
        &self,
        container_id: &str,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<ContainerDescriptor, AdminError> {
        let _guard = self.mutation.lock();
        let mut state = self.load_or_new()?;

        let Some(descriptor) = state.container_mut(container_id) else {
            return Err(AdminError::UnknownContainer {
                container_id: container_id.to_string(),
            });
        };
        descriptor.config.insert(key.into(), value.into());
        let updated = descriptor.clone();
        self.persist(state)?;
        Ok(updated)
    }

    /// Lists all deployed containers.
    ///
    /// # Errors
    ///
    /// Propagates repository read failures.
    pub fn list_containers(&self) -> Result<Vec<ContainerDescriptor>, AdminError> {
        Ok(self.load_or_new()?.containers)
    }

    /// Summary info for the server.
    ///
    /// # Errors
    ///
    /// Propagates repository read failures.
    pub fn server_info(&self) -> Result<ServerInfo, AdminError> {
        let state = self.load_or_new()?;
        Ok(ServerInfo {
            server_id: self.server_id.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            containers: state.containers.len(),
        })
    }

    fn set_status(
        &self,
        container_id: &str,
        status: ContainerStatus,
    ) -> Result<ContainerDescriptor, AdminError> {
        let _guard = self.mutation.lock();
        let mut state = self.load_or_new()?;

        let Some(descriptor) = state.container_mut(container_id) else {
            return Err(AdminError::UnknownContainer {
                container_id: container_id.to_string(),
            });
        };
        descriptor.status = status;
        let updated = descriptor.clone();
        self.persist(state)?;

        info!(container_id, ?status, "container status changed");
        Ok(updated)
    }

    fn load_or_new(&self) -> Result<ServerState, StateError> {
        Ok(self
            .repository
            .load(&self.server_id)?
            .unwrap_or_else(|| ServerState::new(self.server_id.as_str())))
    }

    fn persist(&self, mut state: ServerState) -> Result<(), StateError> {
        state.touch(now_ms());
        self.repository.store(&state)
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use crate::state::{FileStateRepository, InMemoryStateRepository};

    use super::*;

    fn admin() -> ServerAdmin {
        ServerAdmin::new("srv-1", Arc::new(InMemoryStateRepository::new()))
    }

    fn release() -> ReleaseId {
        ReleaseId::new("orders-rules", "1.0.0")
    }

    #[test]
    fn bootstrap_creates_then_reuses_state() {
        let admin = admin();
        let first = admin.bootstrap().expect("bootstrap");
        assert_eq!(first.server_id(), "srv-1");
        assert!(first.containers.is_empty());

        admin
            .create_container("c1", release(), BTreeMap::new())
            .unwrap();
        let second = admin.bootstrap().expect("bootstrap again");
        assert_eq!(second.containers.len(), 1);
    }

    #[test]
    fn create_list_dispose_round_trip() {
        let admin = admin();
        admin.bootstrap().unwrap();

        let created = admin
            .create_container("c1", release(), BTreeMap::new())
            .expect("create");
        assert!(created.is_started());
        assert_eq!(admin.list_containers().unwrap().len(), 1);

        let disposed = admin.dispose_container("c1").expect("dispose");
        assert_eq!(disposed.container_id, "c1");
        assert!(admin.list_containers().unwrap().is_empty());
    }

    #[test]
    fn duplicate_container_is_rejected() {
        let admin = admin();
        admin
            .create_container("c1", release(), BTreeMap::new())
            .unwrap();

        let err = admin
            .create_container("c1", release(), BTreeMap::new())
            .unwrap_err();
        assert!(matches!(
            err,
            AdminError::DuplicateContainer { ref container_id } if container_id == "c1"
        ));
        assert_eq!(admin.list_containers().unwrap().len(), 1);
    }

    #[test]
    fn dispose_unknown_container_is_an_error() {
        let admin = admin();
        let err = admin.dispose_container("ghost").unwrap_err();
        assert!(matches!(err, AdminError::UnknownContainer { .. }));
    }

    #[test]
    fn stop_and_start_toggle_status() {
        let admin = admin();
        admin
            .create_container("c1", release(), BTreeMap::new())
            .unwrap();

        let stopped = admin.stop_container("c1").unwrap();
        assert_eq!(stopped.status, ContainerStatus::Stopped);

        let started = admin.start_container("c1").unwrap();
        assert_eq!(started.status, ContainerStatus::Started);
    }

    #[test]
    fn config_update_persists() {
        let admin = admin();
        admin
            .create_container("c1", release(), BTreeMap::new())
            .unwrap();

        admin
            .update_container_config("c1", "session", "stateless")
            .unwrap();
        let containers = admin.list_containers().unwrap();
        assert_eq!(
            containers[0].config.get("session").map(String::as_str),
            Some("stateless")
        );
    }

    #[test]
    fn server_info_reports_container_count() {
        let admin = admin();
        admin
            .create_container("c1", release(), BTreeMap::new())
            .unwrap();
        admin
            .create_container("c2", release(), BTreeMap::new())
            .unwrap();

        let info = admin.server_info().unwrap();
        assert_eq!(info.server_id, "srv-1");
        assert_eq!(info.containers, 2);
        assert!(!info.version.is_empty());
    }

    #[test]
    fn mutations_survive_a_restart_with_a_file_repository() {
        let dir = tempfile::tempdir().unwrap();

        {
            let repo = Arc::new(FileStateRepository::new(dir.path()).unwrap());
            let admin = ServerAdmin::new("srv-1", repo);
            admin.bootstrap().unwrap();
            admin
                .create_container("c1", release(), BTreeMap::new())
                .unwrap();
            admin
                .update_container_config("c1", "ruleBase", "default")
                .unwrap();
        }

        let repo = Arc::new(FileStateRepository::new(dir.path()).unwrap());
        let admin = ServerAdmin::new("srv-1", repo);
        let containers = admin.list_containers().unwrap();
        assert_eq!(containers.len(), 1);
        assert_eq!(
            containers[0].config.get("ruleBase").map(String::as_str),
            Some("default")
        );
    }
}
