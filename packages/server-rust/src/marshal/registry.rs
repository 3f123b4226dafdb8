//! Format-token to codec bindings.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rulegrid_core::MarshallingFormat;
use tracing::debug;

use super::{JsonMarshaller, MarshalError, Marshaller, MsgpackMarshaller};

/// Registry mapping each format token to its single codec instance.
///
/// Bindings are populated before the registry is shared (`register` takes
/// `&mut self`) and are immutable for the process lifetime afterwards, so
/// lookups need no locking. Looking up a format with no binding is an
/// error -- there is no default codec.
pub struct MarshallerRegistry {
    bindings: HashMap<MarshallingFormat, Arc<dyn Marshaller>>,
    disposed: AtomicBool,
}

impl MarshallerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
            disposed: AtomicBool::new(false),
        }
    }

    /// Creates a registry with the standard JSON and MessagePack bindings.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(JsonMarshaller::new()));
        registry.register(Arc::new(MsgpackMarshaller::new()));
        registry
    }

    /// Binds a codec to its format, replacing any previous binding.
    pub fn register(&mut self, marshaller: Arc<dyn Marshaller>) {
        let format = marshaller.format();
        debug!(%format, "registering marshaller");
        self.bindings.insert(format, marshaller);
    }

    /// Resolves the codec bound to `format`.
    ///
    /// # Errors
    ///
    /// Returns [`MarshalError::UnknownFormat`] when no codec is bound.
    pub fn resolve(&self, format: MarshallingFormat) -> Result<Arc<dyn Marshaller>, MarshalError> {
        self.bindings
            .get(&format)
            .cloned()
            .ok_or(MarshalError::UnknownFormat { format })
    }

    /// The formats currently bound.
    #[must_use]
    pub fn formats(&self) -> Vec<MarshallingFormat> {
        self.bindings.keys().copied().collect()
    }

    /// Disposes every bound codec. Idempotent: only the first call reaches
    /// the codecs.
    pub fn dispose(&self) {
        if self
            .disposed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            for marshaller in self.bindings.values() {
                marshaller.dispose();
            }
        }
    }
}

impl Default for MarshallerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
