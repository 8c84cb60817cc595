//! Fixed-step countdown driver for the round state machine.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tokio::task::JoinHandle;

use super::GameEngine;

/// Owns the background task that advances the engine clock. One tick
/// decrements the countdown by one second regardless of how long the
/// interval actually took.
pub struct Scheduler {
    handle: JoinHandle<()>,
}

impl Scheduler {
    /// Spawn the tick loop. The engine resolves and reopens rounds from
    /// inside `tick`, so this task never holds any lock across awaits.
    pub fn spawn(engine: Arc<GameEngine>, tick_interval: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(tick_interval);
            // First tick completes immediately; skip it so the opening
            // round keeps its full window.
            ticker.tick().await;

            info!("Round scheduler started ({}ms per tick)", tick_interval.as_millis());
            loop {
                ticker.tick().await;
                if let Some(record) = engine.tick().await {
                    debug!(
                        "Scheduler observed resolution of period {} (outcome {})",
                        record.period,
                        record.outcome.digit()
                    );
                }
            }
        });

        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the clock. In-flight state is left as-is.
    pub fn shutdown(self) {
        self.handle.abort();
        info!("Round scheduler stopped");
    }
}
