use futures::StreamExt;
use futures::stream;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::executor::CheckExecutor;
use crate::error::HealthError;

/// Outcome counts of one scheduler tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub checked: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

struct RunningLoop {
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

/// Monitoring scheduler - checks every registered service once per interval
pub struct MonitoringScheduler {
    executor: Arc<CheckExecutor>,
    interval: Duration,
    max_concurrent_checks: usize,
    running: Mutex<Option<RunningLoop>>,
}

impl MonitoringScheduler {
    /// Create a new, stopped scheduler
    pub fn new(executor: Arc<CheckExecutor>, interval: Duration, max_concurrent_checks: usize) -> Self {
        Self { executor, interval, max_concurrent_checks: max_concurrent_checks.max(1), running: Mutex::new(None) }
    }

    /// Start ticking in the background.
    ///
    /// The first tick runs immediately. Returns `false` if the scheduler was
    /// already running, in which case nothing changes.
    pub async fn start(&self) -> bool {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return false;
        }

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(run_loop(
            self.executor.clone(),
            self.interval,
            self.max_concurrent_checks,
            shutdown.clone(),
        ));

        info!("Started health check scheduler (interval {:?})", self.interval);
        *running = Some(RunningLoop { shutdown, handle });
        true
    }

    /// Stop scheduling further ticks.
    ///
    /// A tick already in progress runs to completion before this returns.
    /// Returns `false` if the scheduler was not running.
    pub async fn stop(&self) -> bool {
        let Some(running) = self.running.lock().await.take() else {
            return false;
        };

        running.shutdown.cancel();
        if let Err(e) = running.handle.await {
            warn!("Health check scheduler task ended abnormally: {}", e);
        }

        info!("Stopped health check scheduler");
        true
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Run a single tick on the caller's task
    pub async fn tick(&self) -> TickSummary {
        run_tick(&self.executor, self.max_concurrent_checks).await
    }
}

impl Drop for MonitoringScheduler {
    fn drop(&mut self) {
        if let Some(running) = self.running.get_mut().take() {
            running.shutdown.cancel();
        }
    }
}

async fn run_loop(
    executor: Arc<CheckExecutor>,
    period: Duration,
    max_concurrent_checks: usize,
    shutdown: CancellationToken,
) {
    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = timer.tick() => {}
        }

        let summary = run_tick(&executor, max_concurrent_checks).await;
        debug!(
            "Tick complete: {} checked, {} up, {} down, {} skipped",
            summary.checked, summary.succeeded, summary.failed, summary.skipped
        );
    }
}

/// Check every registered service exactly once
async fn run_tick(executor: &CheckExecutor, max_concurrent_checks: usize) -> TickSummary {
    let service_ids = executor.registry().list().await;

    stream::iter(service_ids)
        .map(|service_id| executor.check_one(service_id))
        .buffer_unordered(max_concurrent_checks)
        .fold(TickSummary::default(), |mut summary, result| async move {
            match result {
                Ok(result) => {
                    summary.checked += 1;
                    if result.success {
                        summary.succeeded += 1;
                    } else {
                        summary.failed += 1;
                    }
                }
                Err(HealthError::NotFound(service_id)) => {
                    warn!("Skipping service {} - no longer registered", service_id);
                    summary.skipped += 1;
                }
                Err(e) => {
                    warn!("Skipping check: {}", e);
                    summary.skipped += 1;
                }
            }
            summary
        })
        .await
}
