//! Server lifecycle phases and the graceful-drain signal.

use arc_swap::ArcSwap;
use std::sync::Arc;
use tokio::sync::watch;

/// Phase of the server lifecycle: Starting -> Serving -> Draining.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// Initializing; not yet accepting requests.
    Starting,
    /// Fully operational.
    Serving,
    /// Draining in-flight requests; no new requests accepted.
    Draining,
}

impl LifecyclePhase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Serving => "serving",
            Self::Draining => "draining",
        }
    }
}

/// Lock-free lifecycle state plus a watch channel for drain notification.
///
/// Health probes read the phase; transports subscribe to the drain signal
/// and stop accepting work when it fires.
#[derive(Debug)]
pub struct Lifecycle {
    phase: ArcSwap<LifecyclePhase>,
    signal: watch::Sender<bool>,
}

impl Lifecycle {
    /// Creates a controller in the `Starting` phase.
    #[must_use]
    pub fn new() -> Self {
        let (signal, _rx) = watch::channel(false);
        Self {
            phase: ArcSwap::from_pointee(LifecyclePhase::Starting),
            signal,
        }
    }

    /// Transitions to `Serving`.
    pub fn set_serving(&self) {
        self.phase.store(Arc::new(LifecyclePhase::Serving));
    }

    /// Transitions to `Draining` and fires the drain signal.
    pub fn begin_drain(&self) {
        self.phase.store(Arc::new(LifecyclePhase::Draining));
        // Receivers may all have been dropped already.
        let _ = self.signal.send(true);
    }

    /// The current phase.
    #[must_use]
    pub fn phase(&self) -> LifecyclePhase {
        **self.phase.load()
    }

    /// `true` while the server accepts new requests.
    #[must_use]
    pub fn is_serving(&self) -> bool {
        self.phase() == LifecyclePhase::Serving
    }

    /// A receiver notified when draining begins.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.signal.subscribe()
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
