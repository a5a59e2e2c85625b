//! Input validation for service registration and engine configuration.

use std::time::Duration;

use crate::config::{EngineSettings, Thresholds};
use crate::error::{HealthError, Result};

fn invalid(message: impl Into<String>) -> HealthError {
    HealthError::InvalidConfiguration(message.into())
}

/// Validate the (name, host, port) of a service about to be registered
pub fn validate_registration(name: &str, host: &str, port: u16) -> Result<()> {
    if name.trim().is_empty() {
        return Err(invalid("Service name must not be empty"));
    }

    if host.trim().is_empty() {
        return Err(invalid("Service host must not be empty"));
    }

    if host.chars().any(char::is_whitespace) {
        return Err(invalid(format!("Service host contains whitespace: {host:?}")));
    }

    validate_port(port)
}

/// Validate port is in valid range
fn validate_port(port: u16) -> Result<()> {
    if port == 0 {
        return Err(invalid("Port 0 is not valid"));
    }
    Ok(())
}

/// Validate the tick interval of the scheduler
pub fn validate_check_interval(interval: Duration) -> Result<()> {
    const MAX_INTERVAL: Duration = Duration::from_secs(86400); // 24 hours

    if interval.is_zero() {
        return Err(invalid("Check interval must be greater than zero"));
    }

    if interval > MAX_INTERVAL {
        return Err(invalid(format!(
            "Check interval too long: {}s (maximum: {}s)",
            interval.as_secs(),
            MAX_INTERVAL.as_secs()
        )));
    }

    Ok(())
}

/// Validate timeout is reasonable
pub fn validate_timeout(timeout: Duration) -> Result<()> {
    const MAX_TIMEOUT: Duration = Duration::from_secs(300); // 5 minutes

    if timeout.is_zero() {
        return Err(invalid("Check timeout must be greater than zero"));
    }

    if timeout > MAX_TIMEOUT {
        return Err(invalid(format!(
            "Check timeout too long: {}s (maximum: {}s)",
            timeout.as_secs(),
            MAX_TIMEOUT.as_secs()
        )));
    }

    Ok(())
}

/// Validate the sizing knobs of the engine
pub fn validate_engine_settings(settings: &EngineSettings) -> Result<()> {
    validate_check_interval(settings.check_interval)?;
    validate_timeout(settings.check_timeout)?;

    if settings.max_concurrent_checks == 0 {
        return Err(invalid("max_concurrent_checks must be at least 1"));
    }
    if settings.history_cap == 0 {
        return Err(invalid("history_cap must be at least 1"));
    }
    if settings.recent_window == 0 {
        return Err(invalid("recent_window must be at least 1"));
    }

    Ok(())
}

/// Validate utilization ceilings are percentages and the latency ceiling is set
pub fn validate_thresholds(thresholds: &Thresholds) -> Result<()> {
    for (label, value) in [("cpu", thresholds.cpu), ("memory", thresholds.memory), ("disk", thresholds.disk)] {
        if !(value > 0.0 && value <= 100.0) {
            return Err(invalid(format!("{label} threshold must be within (0, 100], got {value}")));
        }
    }

    if thresholds.latency_ms == 0 {
        return Err(invalid("latency threshold must be greater than zero"));
    }

    Ok(())
}
