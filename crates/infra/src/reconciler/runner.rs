use std::sync::Arc;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{PassOutcome, Reconciler, Ticker};

/// Background task that runs one reconciliation pass per tick.
pub struct ReplenishmentRunner;

/// Handle for the running task (shutdown).
#[derive(Debug)]
pub struct ReplenishmentRunnerHandle {
    shutdown: Arc<Notify>,
    join: Option<JoinHandle<()>>,
}

impl ReplenishmentRunnerHandle {
    /// Stop the runner and wait for it. A pass already in progress completes first.
    pub async fn shutdown(mut self) {
        self.shutdown.notify_one();
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().is_none_or(|j| j.is_finished())
    }
}

impl ReplenishmentRunner {
    /// Spawn the runner on the current tokio runtime.
    ///
    /// Pass failures are logged by the reconciler and never stop the loop; the
    /// next tick simply tries again.
    pub fn spawn<T: Ticker>(reconciler: Arc<Reconciler>, mut ticker: T) -> ReplenishmentRunnerHandle {
        let shutdown = Arc::new(Notify::new());
        let signal = shutdown.clone();

        let join = tokio::spawn(async move {
            info!("replenishment runner started");
            loop {
                tokio::select! {
                    _ = signal.notified() => {
                        info!("replenishment runner received shutdown signal");
                        break;
                    }
                    more = ticker.tick() => {
                        if !more {
                            debug!("ticker exhausted");
                            break;
                        }
                        if let Ok(PassOutcome::OrderCreated { order, .. }) = reconciler.run_pass().await {
                            debug!(order_number = %order.order_number(), "pass created an order");
                        }
                    }
                }
            }
            info!("replenishment runner stopped");
        });

        ReplenishmentRunnerHandle {
            shutdown,
            join: Some(join),
        }
    }
}
