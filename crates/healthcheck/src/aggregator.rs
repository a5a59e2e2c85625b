//! Read-only health views derived from the registry and history.
//!
//! None of these fail for lack of data: an unchecked service is `unknown`,
//! an empty fleet is 0% healthy, a window without results is 0% uptime.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Thresholds;
use crate::error::Result;
use crate::history::HistoryStore;
use crate::registry::{Service, ServiceId, ServiceRegistry, ServiceStatus};

/// Health of one service over its recent results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthView {
    pub service_id: ServiceId,
    pub service_name: String,
    pub status: ServiceStatus,
    pub checks_performed: u64,
    pub successes: u64,
    pub failures: u64,
    /// Number of recent results the rates were computed over
    pub sampled: usize,
    /// Fraction of sampled results that succeeded, 0.0..=1.0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_rate: Option<f64>,
    /// Mean duration of the sampled results that carry one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_duration_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_check: Option<DateTime<Utc>>,
    /// Mean duration is above the latency threshold
    pub slow: bool,
}

/// Fleet-wide status counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetView {
    pub total_services: usize,
    pub healthy: usize,
    pub unhealthy: usize,
    pub unknown: usize,
    pub health_percentage: f64,
    pub timestamp: DateTime<Utc>,
}

/// Point-in-time composite of the fleet and every service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub generated_at: DateTime<Utc>,
    pub overall: FleetView,
    pub services: Vec<HealthView>,
}

pub struct Aggregator {
    registry: Arc<ServiceRegistry>,
    history: Arc<HistoryStore>,
    recent_window: usize,
    thresholds: Thresholds,
}

impl Aggregator {
    pub fn new(
        registry: Arc<ServiceRegistry>,
        history: Arc<HistoryStore>,
        recent_window: usize,
        thresholds: Thresholds,
    ) -> Self {
        Self { registry, history, recent_window: recent_window.max(1), thresholds }
    }

    pub async fn service_health(&self, service_id: ServiceId) -> Result<HealthView> {
        let service = self.registry.get(service_id).await?;
        Ok(self.health_view(&service).await)
    }

    async fn health_view(&self, service: &Service) -> HealthView {
        let recent = self.history.recent(service.id, self.recent_window).await;

        let mut view = HealthView {
            service_id: service.id,
            service_name: service.name.clone(),
            status: ServiceStatus::Unknown,
            checks_performed: service.checks_performed,
            successes: service.successes,
            failures: service.failures,
            sampled: recent.len(),
            success_rate: None,
            avg_duration_ms: None,
            last_check: None,
            slow: false,
        };

        let Some(last) = recent.last() else {
            return view;
        };

        let successes = recent.iter().filter(|result| result.success).count();
        let durations: Vec<u64> = recent.iter().filter_map(|result| result.duration_ms).collect();

        view.status = service.status;
        view.success_rate = Some(successes as f64 / recent.len() as f64);
        view.last_check = Some(last.timestamp);
        if !durations.is_empty() {
            let avg = durations.iter().sum::<u64>() as f64 / durations.len() as f64;
            view.avg_duration_ms = Some(avg);
            view.slow = avg > self.thresholds.latency_ms as f64;
        }

        view
    }

    /// Status counts taken from the registry, not from history
    pub async fn overall_health(&self) -> FleetView {
        Self::fleet_view(&self.registry.snapshot().await)
    }

    fn fleet_view(services: &[Service]) -> FleetView {
        let total_services = services.len();
        let healthy = services.iter().filter(|s| s.status == ServiceStatus::Healthy).count();
        let unhealthy = services.iter().filter(|s| s.status == ServiceStatus::Unhealthy).count();

        FleetView {
            total_services,
            healthy,
            unhealthy,
            unknown: total_services - healthy - unhealthy,
            health_percentage: if total_services > 0 {
                healthy as f64 / total_services as f64 * 100.0
            } else {
                0.0
            },
            timestamp: Utc::now(),
        }
    }

    /// Percentage of successful checks over the trailing `window_hours`
    pub async fn uptime(&self, service_id: ServiceId, window_hours: u32) -> Result<f64> {
        self.uptime_at(service_id, TimeDelta::hours(i64::from(window_hours)), Utc::now()).await
    }

    /// Uptime over `[now - window, now]`.
    ///
    /// Returns 0.0 both for a window without results and for a window where
    /// every check failed.
    pub async fn uptime_at(&self, service_id: ServiceId, window: TimeDelta, now: DateTime<Utc>) -> Result<f64> {
        // Unknown ids are an error, not 0%
        self.registry.get(service_id).await?;

        // A window reaching past the representable range covers everything
        let since = now.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC);
        let (successes, total) = self.history.counts_since(service_id, since).await;
        if total == 0 {
            return Ok(0.0);
        }

        Ok(successes as f64 / total as f64 * 100.0)
    }

    /// Services whose latest check failed, sorted by id
    pub async fn unhealthy_services(&self) -> Vec<Service> {
        self.registry
            .snapshot()
            .await
            .into_iter()
            .filter(|service| service.status == ServiceStatus::Unhealthy)
            .collect()
    }

    /// Composite report built from a single registry snapshot
    pub async fn report(&self) -> HealthReport {
        let generated_at = Utc::now();
        let snapshot = self.registry.snapshot().await;
        let overall = Self::fleet_view(&snapshot);

        let mut services = Vec::with_capacity(snapshot.len());
        for service in &snapshot {
            services.push(self.health_view(service).await);
        }

        HealthReport { generated_at, overall, services }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HealthError;
    use crate::monitoring::{CheckKind, ProbeOutcome, ProbePayload, ProbeResult, ResourceMetrics};

    struct Fixture {
        registry: Arc<ServiceRegistry>,
        history: Arc<HistoryStore>,
        aggregator: Aggregator,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(ServiceRegistry::new());
        let history = Arc::new(HistoryStore::new(100));
        let aggregator = Aggregator::new(registry.clone(), history.clone(), 10, Thresholds::default());
        Fixture { registry, history, aggregator }
    }

    impl Fixture {
        /// Record a check the way the executor would
        async fn record(&self, service_id: ServiceId, outcome: ProbeOutcome, timestamp: DateTime<Utc>) {
            let service = self.registry.update_after_check(service_id, outcome.success).await.unwrap();
            self.history.append(ProbeResult::from_outcome(&service, outcome, timestamp)).await;
        }
    }

    #[tokio::test]
    async fn test_empty_fleet() {
        let fixture = fixture();
        let overall = fixture.aggregator.overall_health().await;

        assert_eq!(overall.total_services, 0);
        assert_eq!(overall.health_percentage, 0.0);

        let report = fixture.aggregator.report().await;
        assert!(report.services.is_empty());
    }

    #[tokio::test]
    async fn test_unchecked_service_is_unknown() {
        let fixture = fixture();
        let id = fixture.registry.register("api-1", "api-1.internal", 80, CheckKind::Http).await.unwrap();

        let view = fixture.aggregator.service_health(id).await.unwrap();
        assert_eq!(view.status, ServiceStatus::Unknown);
        assert_eq!(view.checks_performed, 0);
        assert_eq!(view.sampled, 0);
        assert!(view.success_rate.is_none());
        assert!(view.last_check.is_none());
    }

    #[tokio::test]
    async fn test_service_health_uses_recent_window() {
        let fixture = fixture();
        let id = fixture.registry.register("web-2", "web-2.cluster", 443, CheckKind::Http).await.unwrap();
        let now = Utc::now();

        // 5 old failures fall outside the 10-result window
        for i in 0..5 {
            fixture.record(id, ProbeOutcome::down().with_duration(900), now + TimeDelta::seconds(i)).await;
        }
        for i in 5..15 {
            let outcome = if i % 2 == 0 { ProbeOutcome::down() } else { ProbeOutcome::up() };
            fixture.record(id, outcome.with_duration(100), now + TimeDelta::seconds(i)).await;
        }

        let view = fixture.aggregator.service_health(id).await.unwrap();
        assert_eq!(view.sampled, 10);
        assert_eq!(view.success_rate, Some(0.5));
        assert_eq!(view.avg_duration_ms, Some(100.0));
        assert_eq!(view.checks_performed, 15);
        assert_eq!(view.last_check, Some(now + TimeDelta::seconds(14)));
        assert_eq!(view.status, ServiceStatus::Unhealthy);
        assert!(!view.slow);
    }

    #[tokio::test]
    async fn test_duration_average_skips_metric_results() {
        let fixture = fixture();
        let id = fixture.registry.register("worker-1", "worker-1.backend", 9200, CheckKind::Custom).await.unwrap();
        let now = Utc::now();
        let metrics = ResourceMetrics { cpu_usage: 95.0, memory_usage: 10.0, disk_usage: 10.0, connections: 5 };

        fixture.record(id, ProbeOutcome::up().with_duration(600), now).await;
        fixture
            .record(id, ProbeOutcome::down().with_payload(ProbePayload::Metrics(metrics)), now + TimeDelta::seconds(1))
            .await;

        let view = fixture.aggregator.service_health(id).await.unwrap();
        assert_eq!(view.success_rate, Some(0.5));
        assert_eq!(view.avg_duration_ms, Some(600.0));
        assert!(view.slow);
    }

    #[tokio::test]
    async fn test_uptime_window() {
        let fixture = fixture();
        let id = fixture.registry.register("auth-1", "auth-1.internal", 3000, CheckKind::Grpc).await.unwrap();
        let t = Utc::now();

        fixture.record(id, ProbeOutcome::down(), t - TimeDelta::seconds(7200)).await;
        fixture.record(id, ProbeOutcome::up(), t - TimeDelta::seconds(3600)).await;
        fixture.record(id, ProbeOutcome::down(), t - TimeDelta::seconds(100)).await;

        let uptime = fixture.aggregator.uptime_at(id, TimeDelta::hours(1), t).await.unwrap();
        assert_eq!(uptime, 50.0);

        let uptime = fixture.aggregator.uptime_at(id, TimeDelta::hours(3), t).await.unwrap();
        assert!((uptime - 100.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_uptime_with_huge_window() {
        let fixture = fixture();
        let id = fixture.registry.register("api-9", "api-9.internal", 80, CheckKind::Http).await.unwrap();
        let t = Utc::now();

        fixture.record(id, ProbeOutcome::up(), t - TimeDelta::days(3650)).await;
        fixture.record(id, ProbeOutcome::down(), t - TimeDelta::seconds(10)).await;

        assert_eq!(fixture.aggregator.uptime(id, u32::MAX).await, Ok(50.0));
        assert_eq!(fixture.aggregator.uptime_at(id, TimeDelta::MAX, t).await, Ok(50.0));
    }

    #[tokio::test]
    async fn test_uptime_without_data() {
        let fixture = fixture();
        let id = fixture.registry.register("db-1", "db-1.backend", 5432, CheckKind::Tcp).await.unwrap();

        assert_eq!(fixture.aggregator.uptime(id, 24).await, Ok(0.0));

        let ghost = ServiceId::derive("ghost", "ghost.local", 1);
        assert_eq!(fixture.aggregator.uptime(ghost, 24).await, Err(HealthError::NotFound(ghost)));
    }

    #[tokio::test]
    async fn test_fleet_counts_add_up() {
        let fixture = fixture();
        let now = Utc::now();
        let mut ids = Vec::new();
        for i in 0..5 {
            ids.push(fixture.registry.register(format!("svc-{i}"), "svc.local", 80, CheckKind::Tcp).await.unwrap());
        }

        fixture.record(ids[0], ProbeOutcome::up(), now).await;
        fixture.record(ids[1], ProbeOutcome::up(), now).await;
        fixture.record(ids[2], ProbeOutcome::down(), now).await;

        let overall = fixture.aggregator.overall_health().await;
        assert_eq!(overall.total_services, 5);
        assert_eq!(overall.healthy, 2);
        assert_eq!(overall.unhealthy, 1);
        assert_eq!(overall.unknown, 2);
        assert_eq!(overall.healthy + overall.unhealthy + overall.unknown, overall.total_services);
        assert_eq!(overall.health_percentage, 40.0);

        let unhealthy = fixture.aggregator.unhealthy_services().await;
        assert_eq!(unhealthy.len(), 1);
        assert_eq!(unhealthy[0].id, ids[2]);
    }

    #[tokio::test]
    async fn test_report_covers_every_service() {
        let fixture = fixture();
        let a = fixture.registry.register("api-1", "api.local", 80, CheckKind::Http).await.unwrap();
        fixture.registry.register("api-2", "api.local", 81, CheckKind::Http).await.unwrap();
        fixture.record(a, ProbeOutcome::up().with_duration(40), Utc::now()).await;

        let report = fixture.aggregator.report().await;
        assert_eq!(report.overall.total_services, 2);
        assert_eq!(report.services.len(), 2);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["generated_at"].is_string());
        assert_eq!(json["overall"]["healthy"], 1);
        assert_eq!(json["services"].as_array().unwrap().len(), 2);
    }
}
