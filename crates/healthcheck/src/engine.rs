//! Engine facade - owns every component of one health checker
//!
//! The engine:
//! - Registers services and runs manual checks
//! - Starts and stops the periodic scheduler
//! - Answers health, uptime and report queries
//!
//! Engines share nothing, so several can run side by side.

use std::sync::Arc;
use tracing::info;

use crate::aggregator::{Aggregator, FleetView, HealthReport, HealthView};
use crate::config::Config;
use crate::error::Result;
use crate::history::HistoryStore;
use crate::monitoring::{CheckExecutor, CheckKind, MonitoringScheduler, ProbeResult, ProbeSet};
use crate::registry::{Service, ServiceId, ServiceRegistry};

pub struct HealthEngine {
    config: Config,
    registry: Arc<ServiceRegistry>,
    history: Arc<HistoryStore>,
    executor: Arc<CheckExecutor>,
    scheduler: MonitoringScheduler,
    aggregator: Aggregator,
}

impl HealthEngine {
    /// Create an engine with the simulated checkers
    pub fn new(config: Config) -> Result<Self> {
        let probes = ProbeSet::simulated(config.thresholds);
        Self::with_probes(config, probes)
    }

    /// Create an engine with a custom set of checkers
    pub fn with_probes(config: Config, probes: ProbeSet) -> Result<Self> {
        config.validate()?;

        let registry = Arc::new(ServiceRegistry::new());
        let history = Arc::new(HistoryStore::new(config.engine.history_cap));
        let executor = Arc::new(CheckExecutor::new(
            registry.clone(),
            history.clone(),
            probes,
            config.engine.check_timeout,
        ));
        let scheduler = MonitoringScheduler::new(
            executor.clone(),
            config.engine.check_interval,
            config.engine.max_concurrent_checks,
        );
        let aggregator = Aggregator::new(
            registry.clone(),
            history.clone(),
            config.engine.recent_window,
            config.thresholds,
        );

        Ok(Self { config, registry, history, executor, scheduler, aggregator })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn register_service(
        &self,
        name: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        check_kind: CheckKind,
    ) -> Result<ServiceId> {
        self.registry.register(name, host, port, check_kind).await
    }

    /// Start periodic checks; no-op if already monitoring
    pub async fn start_monitoring(&self) {
        if self.scheduler.start().await {
            info!("Monitoring {} services", self.registry.len().await);
        }
    }

    /// Stop periodic checks; no-op if not monitoring
    pub async fn stop_monitoring(&self) {
        self.scheduler.stop().await;
    }

    pub async fn is_monitoring(&self) -> bool {
        self.scheduler.is_running().await
    }

    /// Check one service right now, outside the schedule
    pub async fn check_service(&self, service_id: ServiceId) -> Result<ProbeResult> {
        self.executor.check_one(service_id).await
    }

    pub async fn get_service(&self, service_id: ServiceId) -> Result<Service> {
        self.registry.get(service_id).await
    }

    pub async fn list_services(&self) -> Vec<ServiceId> {
        self.registry.list().await
    }

    /// Recorded history of a service, oldest first
    pub async fn get_history(&self, service_id: ServiceId) -> Result<Vec<ProbeResult>> {
        self.registry.get(service_id).await?;
        Ok(self.history.all(service_id).await)
    }

    /// Most recent result of a service, `None` before its first check
    pub async fn latest_result(&self, service_id: ServiceId) -> Result<Option<ProbeResult>> {
        self.registry.get(service_id).await?;
        Ok(self.history.latest(service_id).await)
    }

    pub async fn get_service_health(&self, service_id: ServiceId) -> Result<HealthView> {
        self.aggregator.service_health(service_id).await
    }

    pub async fn get_overall_health(&self) -> FleetView {
        self.aggregator.overall_health().await
    }

    pub async fn get_uptime(&self, service_id: ServiceId, window_hours: u32) -> Result<f64> {
        self.aggregator.uptime(service_id, window_hours).await
    }

    pub async fn list_unhealthy(&self) -> Vec<Service> {
        self.aggregator.unhealthy_services().await
    }

    pub async fn get_report(&self) -> HealthReport {
        self.aggregator.report().await
    }
}
