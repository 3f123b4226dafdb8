//! Filesystem-backed [`StateRepository`]: one JSON file per server id.
//!
//! Writes are atomic: the snapshot is serialized to a temporary file in the
//! same directory and renamed over the previous one, so a reader opening
//! the file mid-write still sees the last complete snapshot and a failed
//! write leaves it untouched. Writers for the same server id are serialized
//! by a per-id mutex; readers take no lock.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use super::repository::{StateError, StateRepository};
use super::ServerState;

/// Durable state repository persisting snapshots under a state directory.
pub struct FileStateRepository {
    dir: PathBuf,
    write_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl FileStateRepository {
    /// Opens (and creates if needed) the state directory.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error when the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            write_locks: DashMap::new(),
        })
    }

    fn path_for(&self, server_id: &str) -> PathBuf {
        self.dir.join(format!("{server_id}.json"))
    }

    fn write_lock(&self, server_id: &str) -> Arc<Mutex<()>> {
        self.write_locks
            .entry(server_id.to_string())
            .or_default()
            .clone()
    }

    fn write_failure(server_id: &str, reason: impl ToString) -> StateError {
        StateError::WriteFailure {
            server_id: server_id.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl StateRepository for FileStateRepository {
    fn store(&self, state: &ServerState) -> Result<(), StateError> {
        let server_id = state.server_id();
        let lock = self.write_lock(server_id);
        let _guard = lock.lock();

        let bytes = serde_json::to_vec_pretty(state)
            .map_err(|e| Self::write_failure(server_id, e))?;

        let path = self.path_for(server_id);
        let tmp_path = self.dir.join(format!("{server_id}.json.tmp"));
        fs::write(&tmp_path, &bytes).map_err(|e| Self::write_failure(server_id, e))?;
        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(Self::write_failure(server_id, e));
        }

        debug!(server_id, path = %path.display(), "server state persisted");
        Ok(())
    }

    fn load(&self, server_id: &str) -> Result<Option<ServerState>, StateError> {
        let path = self.path_for(server_id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StateError::ReadFailure {
                    server_id: server_id.to_string(),
                    reason: e.to_string(),
                })
            }
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StateError::Corrupted {
                server_id: server_id.to_string(),
                reason: e.to_string(),
            })
    }

    fn delete(&self, server_id: &str) -> Result<(), StateError> {
        let lock = self.write_lock(server_id);
        let _guard = lock.lock();

        match fs::remove_file(self.path_for(server_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::write_failure(server_id, e)),
        }
    }
}

impl std::fmt::Debug for FileStateRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStateRepository")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}
