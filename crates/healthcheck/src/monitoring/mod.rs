pub mod checker;
/// Monitoring engine module - handles execution of health checks
///
/// This module is responsible for:
/// - Simulated HTTP/TCP/gRPC/custom-metric checks behind one `Checker` trait
/// - Running a single check and recording its outcome
/// - Scheduling periodic checks of the whole fleet
pub mod executor;
pub mod scheduler;
pub mod types;

pub use checker::{Checker, CustomMetricChecker, GrpcChecker, HttpChecker, ProbeSet, TcpChecker};
pub use executor::CheckExecutor;
pub use scheduler::{MonitoringScheduler, TickSummary};
pub use types::{CheckKind, ProbeOutcome, ProbePayload, ProbeResult, ResourceMetrics};
