//! Wiring: one recorder, one pattern view, and (optionally) the background
//! refresh loop, all sharing the same stores and clock.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use crate::clock::Clock;
use crate::config::CaddieConfig;
use crate::pattern_memory::PatternMemory;
use crate::reaggregation::Reaggregator;
use crate::recorder::ShotRecorder;
use crate::store::{PatternSink, PatternStore, ShotStore};

/// The assembled engine.
#[derive(Debug)]
pub struct CaddieEngine {
    /// Write path. Clones share its refresh trigger, see [`Self::shutdown`].
    pub recorder: ShotRecorder,
    /// Read path.
    pub memory: PatternMemory,
    refresh_task: Option<JoinHandle<()>>,
}

impl CaddieEngine {
    /// Assemble the engine from its collaborators.
    ///
    /// When `config.reaggregation.enabled` is set the background loop is
    /// spawned on the current tokio runtime and the recorder is wired to it.
    ///
    /// # Panics
    /// Panics if re-aggregation is enabled and there is no tokio runtime.
    #[must_use]
    pub fn new(
        shots: Arc<dyn ShotStore>,
        patterns: Arc<dyn PatternStore>,
        sink: Arc<dyn PatternSink>,
        clock: Arc<dyn Clock>,
        config: &CaddieConfig,
    ) -> Self {
        let memory =
            PatternMemory::new(Arc::clone(&shots), patterns, Arc::clone(&clock)).with_window(config.window.clone());
        let mut recorder = ShotRecorder::new(Arc::clone(&shots));

        let refresh_task = if config.reaggregation.enabled {
            let (trigger, handle) = Reaggregator::new(shots, sink, clock, &config.reaggregation).spawn();
            recorder = recorder.with_reaggregation(trigger);
            Some(handle)
        } else {
            None
        };

        info!(
            reaggregation = refresh_task.is_some(),
            window_days = config.window.recent_days,
            "Caddie engine assembled"
        );

        Self {
            recorder,
            memory,
            refresh_task,
        }
    }

    /// Stop accepting writes and wait for any pending refresh to finish.
    ///
    /// The refresh loop runs until every handle to its trigger is gone. A
    /// clone of [`Self::recorder`] holds one, so drop every clone before
    /// awaiting this or it will not return.
    pub async fn shutdown(self) {
        let Self {
            recorder,
            refresh_task,
            ..
        } = self;
        drop(recorder);
        if let Some(handle) = refresh_task {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Re-aggregation task ended abnormally");
            }
        }
    }
}
