//! Registry of monitored services.
//!
//! Services are keyed by a [`ServiceId`] derived from their name, host and
//! port. Counters and status only change through
//! [`ServiceRegistry::update_after_check`], under a single write lock, so a
//! reader never sees a half-applied check.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::error::{HealthError, Result};
use crate::monitoring::CheckKind;
use crate::validation::validate_registration;

/// Namespace for name-based service ids
const SERVICE_NAMESPACE: Uuid = Uuid::from_u128(0x5f1e_93c2_7a4b_4d1e_9c3f_2b8a_6d04_e711);

/// Stable identifier of a registered service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(Uuid);

impl ServiceId {
    /// Derive the id for a (name, host, port) triple.
    ///
    /// Fields are length-prefixed so that `("a_b", "c")` and `("a", "b_c")`
    /// never collide.
    pub fn derive(name: &str, host: &str, port: u16) -> Self {
        let key = format!("{}:{}|{}:{}|{}", name.len(), name, host.len(), host, port);
        Self(Uuid::new_v5(&SERVICE_NAMESPACE, key.as_bytes()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Coarse health classification, set by the most recent check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    #[default]
    Unknown,
    Healthy,
    Unhealthy,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceStatus::Unknown => write!(f, "unknown"),
            ServiceStatus::Healthy => write!(f, "healthy"),
            ServiceStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// A monitored target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub check_kind: CheckKind,
    pub registered_at: DateTime<Utc>,
    pub checks_performed: u64,
    pub successes: u64,
    pub failures: u64,
    pub status: ServiceStatus,
}

impl Service {
    /// Create a service that has never been checked
    pub fn new(name: String, host: String, port: u16, check_kind: CheckKind) -> Self {
        Self {
            id: ServiceId::derive(&name, &host, port),
            name,
            host,
            port,
            check_kind,
            registered_at: Utc::now(),
            checks_performed: 0,
            successes: 0,
            failures: 0,
            status: ServiceStatus::Unknown,
        }
    }

    /// `host:port`, as a probe would dial it
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn record_check(&mut self, success: bool) {
        self.checks_performed += 1;
        if success {
            self.successes += 1;
            self.status = ServiceStatus::Healthy;
        } else {
            self.failures += 1;
            self.status = ServiceStatus::Unhealthy;
        }
    }
}

/// Set of monitored services
#[derive(Default)]
pub struct ServiceRegistry {
    services: RwLock<HashMap<ServiceId, Service>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service and return its id.
    ///
    /// Fails with [`HealthError::InvalidConfiguration`] for malformed input
    /// and [`HealthError::DuplicateService`] when the derived id is already
    /// taken. In both cases the registry is left unchanged.
    pub async fn register(
        &self,
        name: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        check_kind: CheckKind,
    ) -> Result<ServiceId> {
        let name = name.into();
        let host = host.into();
        validate_registration(&name, &host, port)?;

        let service = Service::new(name, host, port, check_kind);
        let id = service.id;

        let mut services = self.services.write().await;
        if services.contains_key(&id) {
            return Err(HealthError::DuplicateService(id));
        }

        info!("Registered {} service {} ({}) as {}", check_kind, service.name, service.target(), id);
        services.insert(id, service);

        Ok(id)
    }

    /// Snapshot of a single service
    pub async fn get(&self, id: ServiceId) -> Result<Service> {
        self.services.read().await.get(&id).cloned().ok_or(HealthError::NotFound(id))
    }

    /// All registered ids, sorted, taken under one read lock
    pub async fn list(&self) -> Vec<ServiceId> {
        let mut ids: Vec<ServiceId> = self.services.read().await.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Snapshot of every service, sorted by id
    pub async fn snapshot(&self) -> Vec<Service> {
        let mut services: Vec<Service> = self.services.read().await.values().cloned().collect();
        services.sort_by_key(|service| service.id);
        services
    }

    /// Apply the outcome of one completed check and return the updated service
    pub async fn update_after_check(&self, id: ServiceId, success: bool) -> Result<Service> {
        let mut services = self.services.write().await;
        let service = services.get_mut(&id).ok_or(HealthError::NotFound(id))?;
        service.record_check(success);
        Ok(service.clone())
    }

    pub async fn len(&self) -> usize {
        self.services.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.services.read().await.is_empty()
    }
}
