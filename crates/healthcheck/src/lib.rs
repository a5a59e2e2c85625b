//! Uppe health-check engine
//!
//! Keeps a registry of services, probes each one on a fixed interval,
//! records bounded per-service history and derives service and fleet
//! health from it.
//!
//! ```no_run
//! use healthcheck::{CheckKind, Config, HealthEngine};
//!
//! # async fn run() -> healthcheck::Result<()> {
//! let engine = HealthEngine::new(Config::default())?;
//! let id = engine.register_service("api-1", "api-1.internal", 8080, CheckKind::Http).await?;
//!
//! engine.start_monitoring().await;
//! tokio::time::sleep(std::time::Duration::from_secs(10)).await;
//! engine.stop_monitoring().await;
//!
//! println!("{:?}", engine.get_service_health(id).await?);
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod config;
pub mod engine;
pub mod error;
pub mod fleet;
pub mod history;
pub mod monitoring;
pub mod registry;
pub mod validation;

pub use aggregator::{Aggregator, FleetView, HealthReport, HealthView};
pub use config::{Config, ConfigError, EngineSettings, Thresholds};
pub use engine::HealthEngine;
pub use error::{HealthError, Result};
pub use fleet::generate_service_pool;
pub use history::HistoryStore;
pub use monitoring::{CheckKind, Checker, ProbeOutcome, ProbePayload, ProbeResult, ProbeSet, ResourceMetrics};
pub use registry::{Service, ServiceId, ServiceRegistry, ServiceStatus};
