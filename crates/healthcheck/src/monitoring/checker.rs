use rand::Rng;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::types::{CheckKind, ProbeOutcome, ProbePayload, ResourceMetrics};
use crate::config::Thresholds;
use crate::registry::Service;

/// Checker trait for the different kinds of health checks.
///
/// A service being down is a normal outcome (`success == false`), never a
/// panic. Implementations must not block indefinitely; the executor bounds
/// every call with the configured timeout anyway.
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    async fn check(&self, service: &Service) -> ProbeOutcome;
}

/// Wait a random round-trip time and roll for success.
///
/// Returns the measured latency in milliseconds.
async fn simulate_round_trip(latency_ms: &RangeInclusive<u64>, success_probability: f64) -> (u64, bool) {
    let (delay, success) = {
        let mut rng = rand::thread_rng();
        (rng.gen_range(latency_ms.clone()), rng.gen_bool(success_probability))
    };

    let start = Instant::now();
    tokio::time::sleep(Duration::from_millis(delay)).await;
    (start.elapsed().as_millis() as u64, success)
}

fn ordered(range: RangeInclusive<u64>) -> RangeInclusive<u64> {
    let (start, end) = range.into_inner();
    start.min(end)..=start.max(end)
}

/// Clamp to a valid probability, treating NaN and infinities as 0
fn probability(value: f64) -> f64 {
    if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 }
}

/// HTTP-like checker
pub struct HttpChecker {
    latency_ms: RangeInclusive<u64>,
    success_probability: f64,
}

impl HttpChecker {
    /// Server error codes reported by failed checks
    pub const FAILURE_CODES: [u16; 4] = [500, 502, 503, 504];

    pub fn new(latency_ms: RangeInclusive<u64>, success_probability: f64) -> Self {
        Self { latency_ms: ordered(latency_ms), success_probability: probability(success_probability) }
    }
}

impl Default for HttpChecker {
    fn default() -> Self {
        Self::new(50..=300, 0.90)
    }
}

#[async_trait::async_trait]
impl Checker for HttpChecker {
    async fn check(&self, _service: &Service) -> ProbeOutcome {
        let (latency, success) = simulate_round_trip(&self.latency_ms, self.success_probability).await;

        let status_code = if success {
            200
        } else {
            Self::FAILURE_CODES[rand::thread_rng().gen_range(0..Self::FAILURE_CODES.len())]
        };

        let outcome = if success { ProbeOutcome::up() } else { ProbeOutcome::down() };
        outcome.with_duration(latency).with_payload(ProbePayload::Http { status_code })
    }
}

/// TCP connect-style checker
pub struct TcpChecker {
    latency_ms: RangeInclusive<u64>,
    success_probability: f64,
}

impl TcpChecker {
    pub fn new(latency_ms: RangeInclusive<u64>, success_probability: f64) -> Self {
        Self { latency_ms: ordered(latency_ms), success_probability: probability(success_probability) }
    }
}

impl Default for TcpChecker {
    fn default() -> Self {
        Self::new(10..=100, 0.95)
    }
}

#[async_trait::async_trait]
impl Checker for TcpChecker {
    async fn check(&self, _service: &Service) -> ProbeOutcome {
        let (latency, success) = simulate_round_trip(&self.latency_ms, self.success_probability).await;
        let outcome = if success { ProbeOutcome::up() } else { ProbeOutcome::down() };
        outcome.with_duration(latency)
    }
}

/// gRPC health-endpoint style checker
pub struct GrpcChecker {
    latency_ms: RangeInclusive<u64>,
    success_probability: f64,
}

impl GrpcChecker {
    pub fn new(latency_ms: RangeInclusive<u64>, success_probability: f64) -> Self {
        Self { latency_ms: ordered(latency_ms), success_probability: probability(success_probability) }
    }
}

impl Default for GrpcChecker {
    fn default() -> Self {
        Self::new(20..=150, 0.92)
    }
}

#[async_trait::async_trait]
impl Checker for GrpcChecker {
    async fn check(&self, _service: &Service) -> ProbeOutcome {
        let (latency, success) = simulate_round_trip(&self.latency_ms, self.success_probability).await;
        let outcome = if success { ProbeOutcome::up() } else { ProbeOutcome::down() };
        outcome.with_duration(latency)
    }
}

/// Resource-utilization checker, judged against [`Thresholds`]
pub struct CustomMetricChecker {
    thresholds: Thresholds,
}

impl CustomMetricChecker {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    fn sample() -> ResourceMetrics {
        let mut rng = rand::thread_rng();
        ResourceMetrics {
            cpu_usage: rng.gen_range(10.0..90.0),
            memory_usage: rng.gen_range(20.0..85.0),
            disk_usage: rng.gen_range(30.0..95.0),
            connections: rng.gen_range(10..=500),
        }
    }

    /// All of cpu, memory and disk must be strictly below their ceiling
    pub fn evaluate(&self, metrics: &ResourceMetrics) -> bool {
        metrics.cpu_usage < self.thresholds.cpu
            && metrics.memory_usage < self.thresholds.memory
            && metrics.disk_usage < self.thresholds.disk
    }
}

#[async_trait::async_trait]
impl Checker for CustomMetricChecker {
    async fn check(&self, _service: &Service) -> ProbeOutcome {
        let metrics = Self::sample();
        let outcome = if self.evaluate(&metrics) { ProbeOutcome::up() } else { ProbeOutcome::down() };
        outcome.with_payload(ProbePayload::Metrics(metrics))
    }
}

/// One checker per [`CheckKind`]
#[derive(Clone)]
pub struct ProbeSet {
    http: Arc<dyn Checker>,
    tcp: Arc<dyn Checker>,
    grpc: Arc<dyn Checker>,
    custom: Arc<dyn Checker>,
}

impl ProbeSet {
    /// The simulated checkers, custom metrics judged against `thresholds`
    pub fn simulated(thresholds: Thresholds) -> Self {
        Self {
            http: Arc::new(HttpChecker::default()),
            tcp: Arc::new(TcpChecker::default()),
            grpc: Arc::new(GrpcChecker::default()),
            custom: Arc::new(CustomMetricChecker::new(thresholds)),
        }
    }

    /// Replace the checker used for `kind`
    pub fn with_checker(mut self, kind: CheckKind, checker: Arc<dyn Checker>) -> Self {
        match kind {
            CheckKind::Http => self.http = checker,
            CheckKind::Tcp => self.tcp = checker,
            CheckKind::Grpc => self.grpc = checker,
            CheckKind::Custom => self.custom = checker,
        }
        self
    }

    /// Use `checker` for every kind
    pub fn uniform(checker: Arc<dyn Checker>) -> Self {
        Self { http: checker.clone(), tcp: checker.clone(), grpc: checker.clone(), custom: checker }
    }

    pub fn checker_for(&self, kind: CheckKind) -> &dyn Checker {
        match kind {
            CheckKind::Http => self.http.as_ref(),
            CheckKind::Tcp => self.tcp.as_ref(),
            CheckKind::Grpc => self.grpc.as_ref(),
            CheckKind::Custom => self.custom.as_ref(),
        }
    }
}
