//! Background re-aggregation of the persisted pattern snapshot.
//!
//! Recording a shot never aggregates inline. Instead the recorder pokes a
//! [`ReaggregationTrigger`]; a tokio task wakes, re-derives patterns for
//! every scope over the configured recent window, and replaces the snapshot
//! in the [`PatternSink`]. The trigger channel holds at most one pending
//! signal, so a burst of shots costs one refresh, not one per shot.
//!
//! Store I/O is blocking, so each refresh runs on the blocking pool.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::aggregation;
use crate::clock::Clock;
use crate::config::{ReaggregationConfig, WindowConfig};
use crate::error::{CaddieError, Result};
use crate::store::{PatternSink, ShotStore};

/// Handle used to request a background refresh.
#[derive(Debug, Clone)]
pub struct ReaggregationTrigger {
    tx: mpsc::Sender<()>,
}

impl ReaggregationTrigger {
    /// Ask for a refresh. Never blocks.
    ///
    /// Returns `false` only if the background task has stopped.
    pub fn request(&self) -> bool {
        match self.tx.try_send(()) {
            // A pending signal already covers this request.
            Ok(()) | Err(TrySendError::Full(())) => true,
            Err(TrySendError::Closed(())) => false,
        }
    }
}

/// Rebuilds the pattern snapshot from recent shots.
pub struct Reaggregator {
    shots: Arc<dyn ShotStore>,
    sink: Arc<dyn PatternSink>,
    clock: Arc<dyn Clock>,
    window: WindowConfig,
}

impl std::fmt::Debug for Reaggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reaggregator")
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl Reaggregator {
    /// Create a reaggregator over the given collaborators.
    #[must_use]
    pub fn new(
        shots: Arc<dyn ShotStore>,
        sink: Arc<dyn PatternSink>,
        clock: Arc<dyn Clock>,
        config: &ReaggregationConfig,
    ) -> Self {
        Self {
            shots,
            sink,
            clock,
            window: config.window.clone(),
        }
    }

    /// Run one refresh synchronously. Returns the number of patterns written.
    ///
    /// # Errors
    /// Propagates shot store and pattern sink failures.
    pub fn refresh_once(&self) -> Result<usize> {
        let now = self.clock.now();
        let shots = self.shots.recent_shots(&self.window.window(now))?;
        let patterns = aggregation::aggregate_all_scopes(&shots, now);
        self.sink.persist_patterns(&patterns)?;
        debug!(shots = shots.len(), patterns = patterns.len(), "Snapshot rebuilt");
        Ok(patterns.len())
    }

    /// Run one refresh on the blocking pool.
    ///
    /// # Errors
    /// Propagates store failures, or [`CaddieError::Reaggregation`] if the
    /// blocking task panicked or was cancelled.
    pub async fn refresh(self: &Arc<Self>) -> Result<usize> {
        let this = Arc::clone(self);
        tokio::task::spawn_blocking(move || this.refresh_once())
            .await
            .map_err(|e| CaddieError::Reaggregation(e.to_string()))?
    }

    /// Start the background loop on the current tokio runtime.
    ///
    /// The loop ends once every clone of the returned trigger is dropped and
    /// any pending refresh has run.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn spawn(self) -> (ReaggregationTrigger, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<()>(1);
        let this = Arc::new(self);

        let handle = tokio::spawn(async move {
            while rx.recv().await.is_some() {
                match this.refresh().await {
                    Ok(patterns) => info!(patterns, "Pattern snapshot refreshed"),
                    Err(e) => warn!(error = %e, "Pattern snapshot refresh failed"),
                }
            }
            debug!("Re-aggregation loop stopped");
        });

        (ReaggregationTrigger { tx }, handle)
    }
}
