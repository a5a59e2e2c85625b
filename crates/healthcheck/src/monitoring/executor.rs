use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::checker::ProbeSet;
use super::types::{CheckKind, ProbeOutcome, ProbeResult};
use crate::error::Result;
use crate::history::HistoryStore;
use crate::registry::{ServiceId, ServiceRegistry};

/// Check executor - runs one check and records its outcome
pub struct CheckExecutor {
    registry: Arc<ServiceRegistry>,
    history: Arc<HistoryStore>,
    probes: ProbeSet,
    timeout: Duration,
}

impl CheckExecutor {
    /// Create a new check executor
    pub fn new(
        registry: Arc<ServiceRegistry>,
        history: Arc<HistoryStore>,
        probes: ProbeSet,
        timeout: Duration,
    ) -> Self {
        Self { registry, history, probes, timeout }
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    /// Check a single service.
    ///
    /// Resolves the service, runs the checker for its kind under the
    /// per-check timeout, then updates the registry counters and appends the
    /// result to history. A failed or timed out probe is returned as a
    /// result with `success == false`; only an unknown id is an error.
    pub async fn check_one(&self, service_id: ServiceId) -> Result<ProbeResult> {
        let service = self.registry.get(service_id).await?;
        let checker = self.probes.checker_for(service.check_kind);

        let outcome = match timeout(self.timeout, checker.check(&service)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!("{} check for {} timed out after {:?}", service.check_kind, service.name, self.timeout);
                let mut outcome = ProbeOutcome::timed_out(self.timeout);
                // Custom-metric results never carry a duration
                if service.check_kind == CheckKind::Custom {
                    outcome.duration_ms = None;
                }
                outcome
            }
        };

        let result = ProbeResult::from_outcome(&service, outcome, Utc::now());

        self.registry.update_after_check(service_id, result.success).await?;
        self.history.append(result.clone()).await;

        if result.success {
            debug!("{} check for {} succeeded ({:?}ms)", result.check_kind, result.service_name, result.duration_ms);
        } else {
            warn!("{} check for {} failed ({})", result.check_kind, result.service_name, service.target());
        }

        Ok(result)
    }
}
