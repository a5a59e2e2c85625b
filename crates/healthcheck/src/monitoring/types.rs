use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::HealthError;
use crate::registry::{Service, ServiceId};

/// Type of check to perform against a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    Http,
    Tcp,
    #[serde(alias = "rpc")]
    Grpc,
    Custom,
}

impl CheckKind {
    pub const ALL: [CheckKind; 4] = [CheckKind::Http, CheckKind::Tcp, CheckKind::Grpc, CheckKind::Custom];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::Http => "http",
            CheckKind::Tcp => "tcp",
            CheckKind::Grpc => "grpc",
            CheckKind::Custom => "custom",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckKind {
    type Err = HealthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(CheckKind::Http),
            "tcp" => Ok(CheckKind::Tcp),
            "grpc" | "rpc" => Ok(CheckKind::Grpc),
            "custom" => Ok(CheckKind::Custom),
            other => Err(HealthError::InvalidConfiguration(format!("Unsupported check type: {other}"))),
        }
    }
}

/// Resource utilization sampled by a custom-metric check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceMetrics {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub disk_usage: f64,
    pub connections: u32,
}

/// Kind-specific part of a probe result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProbePayload {
    #[default]
    None,
    Http { status_code: u16 },
    Metrics(ResourceMetrics),
}

/// What a checker reports back, before the executor stamps it
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    pub success: bool,
    pub duration_ms: Option<u64>,
    pub payload: ProbePayload,
    pub error_message: Option<String>,
}

impl ProbeOutcome {
    /// Check passed
    pub fn up() -> Self {
        Self { success: true, duration_ms: None, payload: ProbePayload::None, error_message: None }
    }

    /// Check ran to completion and found the service unhealthy
    pub fn down() -> Self {
        Self { success: false, ..Self::up() }
    }

    /// Check did not complete within `timeout`
    pub fn timed_out(timeout: Duration) -> Self {
        Self {
            duration_ms: Some(timeout.as_millis() as u64),
            error_message: Some(format!("Check timed out after {}ms", timeout.as_millis())),
            ..Self::down()
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_payload(mut self, payload: ProbePayload) -> Self {
        self.payload = payload;
        self
    }
}

/// Result of one check, as recorded in history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Service that was checked
    pub service_id: ServiceId,

    pub service_name: String,

    pub check_kind: CheckKind,

    pub success: bool,

    /// Round-trip time, absent for custom-metric checks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    pub payload: ProbePayload,

    /// Set when the check timed out
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// When the check completed
    pub timestamp: DateTime<Utc>,
}

impl ProbeResult {
    /// Stamp a checker outcome with the identity of `service`
    pub fn from_outcome(service: &Service, outcome: ProbeOutcome, timestamp: DateTime<Utc>) -> Self {
        Self {
            service_id: service.id,
            service_name: service.name.clone(),
            check_kind: service.check_kind,
            success: outcome.success,
            duration_ms: outcome.duration_ms,
            payload: outcome.payload,
            error_message: outcome.error_message,
            timestamp,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self.payload {
            ProbePayload::Http { status_code } => Some(status_code),
            _ => None,
        }
    }

    pub fn metrics(&self) -> Option<&ResourceMetrics> {
        match &self.payload {
            ProbePayload::Metrics(metrics) => Some(metrics),
            _ => None,
        }
    }
}
