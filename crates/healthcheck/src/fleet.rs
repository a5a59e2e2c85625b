//! Synthetic service pools for demonstrations and load testing.

use rand::seq::SliceRandom;
use tracing::info;

use crate::engine::HealthEngine;
use crate::error::Result;
use crate::monitoring::CheckKind;
use crate::registry::ServiceId;

const SERVICE_TYPES: [&str; 8] = ["api", "web", "auth", "db", "cache", "worker", "scheduler", "queue"];
const DOMAINS: [&str; 4] = ["internal", "service.local", "cluster", "backend"];
const PORTS: [u16; 8] = [80, 443, 3000, 5432, 6379, 8080, 9200, 11211];

/// A service definition before registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub check_kind: CheckKind,
}

/// Draw `count` random service definitions.
///
/// Names carry a 1-based index, so every spec in one pool is distinct.
pub fn random_specs(count: usize) -> Vec<ServiceSpec> {
    let mut rng = rand::thread_rng();

    (1..=count)
        .map(|index| {
            let service_type = SERVICE_TYPES.choose(&mut rng).copied().unwrap_or("api");
            let domain = DOMAINS.choose(&mut rng).copied().unwrap_or("internal");
            let name = format!("{service_type}-{index}");

            ServiceSpec {
                host: format!("{name}.{domain}"),
                name,
                port: PORTS.choose(&mut rng).copied().unwrap_or(80),
                check_kind: CheckKind::ALL.choose(&mut rng).copied().unwrap_or(CheckKind::Http),
            }
        })
        .collect()
}

/// Register `count` random services with `engine`
pub async fn generate_service_pool(engine: &HealthEngine, count: usize) -> Result<Vec<ServiceId>> {
    let mut ids = Vec::with_capacity(count);
    for spec in random_specs(count) {
        ids.push(engine.register_service(spec.name, spec.host, spec.port, spec.check_kind).await?);
    }

    info!("Generated a pool of {} services", ids.len());
    Ok(ids)
}
