//! Write path: append a shot, optionally nudge background re-aggregation.
//!
//! The recorder validates nothing beyond what [`Shot`] already guarantees and
//! never retries. Retry and backoff, if any, belong to the store.

use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::reaggregation::ReaggregationTrigger;
use crate::store::ShotStore;
use crate::types::Shot;

/// Appends shots to the shot store.
#[derive(Clone)]
pub struct ShotRecorder {
    store: Arc<dyn ShotStore>,
    trigger: Option<ReaggregationTrigger>,
}

impl std::fmt::Debug for ShotRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShotRecorder")
            .field("reaggregates", &self.trigger.is_some())
            .finish_non_exhaustive()
    }
}

impl ShotRecorder {
    /// A recorder that only writes.
    #[must_use]
    pub fn new(store: Arc<dyn ShotStore>) -> Self {
        Self { store, trigger: None }
    }

    /// Also request a background refresh after each successful write.
    #[must_use]
    pub fn with_reaggregation(mut self, trigger: ReaggregationTrigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Record `shot`.
    ///
    /// # Errors
    /// Propagates the store's failure unchanged. No refresh is requested
    /// when the write fails.
    pub fn record_shot(&self, shot: Shot) -> Result<()> {
        self.store.record_shot(&shot)?;
        debug!(
            shot = %shot.id,
            direction = %shot.direction,
            club = ?shot.club.as_ref().map(|c| c.as_str()),
            pressure = shot.pressure,
            "Shot recorded"
        );

        if let Some(trigger) = &self.trigger {
            if !trigger.request() {
                debug!("Re-aggregation task has stopped; snapshot will not refresh");
            }
        }
        Ok(())
    }
}
