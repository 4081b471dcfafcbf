//! Background liveness sweep

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::hub::EventHub;

impl EventHub {
    /// Run [`EventHub::sweep_once`] every `events.sweep_interval_secs` on a
    /// tokio task until `token` is cancelled
    pub fn spawn_sweeper(self: &Arc<Self>, token: CancellationToken) -> JoinHandle<()> {
        let period = Duration::from_secs(self.config().sweep_interval_secs.max(1));
        self.spawn_sweeper_every(period, token)
    }

    /// Same as [`EventHub::spawn_sweeper`] with an explicit period
    pub fn spawn_sweeper_every(
        self: &Arc<Self>,
        period: Duration,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        let hub = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::debug!(period_secs = period.as_secs_f64(), "listener sweeper started");

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = hub.sweep_once();
                        if !removed.is_empty() {
                            tracing::info!(removed = removed.len(), "sweep removed remote listeners");
                        }
                    }
                }
            }

            tracing::debug!("listener sweeper stopped");
        })
    }
}
