//! Persistence contract for server state snapshots.

use super::ServerState;

/// Errors from a state repository.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// The snapshot could not be persisted. Recoverable: the previous
    /// snapshot is still intact and the caller may retry.
    #[error("failed to persist state for server {server_id}: {reason}")]
    WriteFailure { server_id: String, reason: String },
    /// Stored data exists but cannot be decoded. Fatal for this server id
    /// only -- other ids and the process itself are unaffected.
    #[error("stored state for server {server_id} is corrupted: {reason}")]
    Corrupted { server_id: String, reason: String },
    /// The backing store could not be read.
    #[error("failed to read state for server {server_id}: {reason}")]
    ReadFailure { server_id: String, reason: String },
}

/// Durable key-value persistence of [`ServerState`] snapshots, keyed by
/// server id.
///
/// `store` replaces any prior snapshot atomically: readers never observe a
/// partially written state. Reads may proceed concurrently; writes for the
/// same server id are serialized by the implementation.
pub trait StateRepository: Send + Sync {
    /// Persists the full snapshot, replacing any prior snapshot for the
    /// same server id.
    ///
    /// # Errors
    ///
    /// [`StateError::WriteFailure`] when persistence fails; the previous
    /// snapshot remains intact.
    fn store(&self, state: &ServerState) -> Result<(), StateError>;

    /// Loads the most recently stored snapshot, or `Ok(None)` when no
    /// snapshot exists for the id. Never returns a partially constructed
    /// state.
    ///
    /// # Errors
    ///
    /// [`StateError::Corrupted`] when stored data cannot be decoded;
    /// [`StateError::ReadFailure`] when the store cannot be read.
    fn load(&self, server_id: &str) -> Result<Option<ServerState>, StateError>;

    /// Removes the snapshot for `server_id`. Removing an absent snapshot is
    /// not an error -- decommissioning is idempotent.
    ///
    /// # Errors
    ///
    /// [`StateError::WriteFailure`] when the removal cannot be performed.
    fn delete(&self, server_id: &str) -> Result<(), StateError>;
}
