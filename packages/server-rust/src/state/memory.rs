//! In-memory [`StateRepository`] backed by [`DashMap`].
//!
//! Whole snapshots are swapped on store, so concurrent readers always see
//! either the previous or the new state, never a mix. Used by tests and
//! embedded deployments without a state directory.

use dashmap::DashMap;

use super::repository::{StateError, StateRepository};
use super::ServerState;

/// Non-durable state repository keeping snapshots in process memory.
#[derive(Debug, Default)]
pub struct InMemoryStateRepository {
    entries: DashMap<String, ServerState>,
}

impl InMemoryStateRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl StateRepository for InMemoryStateRepository {
    fn store(&self, state: &ServerState) -> Result<(), StateError> {
        self.entries
            .insert(state.server_id().to_string(), state.clone());
        Ok(())
    }

    fn load(&self, server_id: &str) -> Result<Option<ServerState>, StateError> {
        Ok(self.entries.get(server_id).map(|entry| entry.clone()))
    }

    fn delete(&self, server_id: &str) -> Result<(), StateError> {
        self.entries.remove(server_id);
        Ok(())
    }
}
