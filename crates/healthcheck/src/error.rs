use thiserror::Error;

use crate::registry::ServiceId;

/// Errors surfaced by the engine's public operations.
///
/// A probe that finds a service down is not an error: it is reported as a
/// [`ProbeResult`](crate::monitoring::ProbeResult) with `success == false`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HealthError {
    #[error("Service not found: {0}")]
    NotFound(ServiceId),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Service already registered: {0}")]
    DuplicateService(ServiceId),
}

/// Engine result type
pub type Result<T> = std::result::Result<T, HealthError>;
