use std::time::Duration;
use std::{env, fmt, fs, io, path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::HealthError;
use crate::validation::{validate_engine_settings, validate_thresholds};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFailed(#[source] io::Error),

    #[error("Failed to write config file: {0}")]
    WriteFailed(#[source] io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseFailed(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeFailed(#[from] toml::ser::Error),

    #[error("No config path available, neither XDG_CONFIG_HOME nor HOME is set")]
    ConfigPathUnavailable,

    #[error(transparent)]
    Invalid(#[from] HealthError),
}

/// Full engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineSettings,
    pub thresholds: Thresholds,
}

/// Scheduling and retention knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Time between two scheduler ticks
    #[serde(with = "humantime_serde")]
    pub check_interval: Duration,

    /// Upper bound on a single probe, after which it counts as failed
    #[serde(with = "humantime_serde")]
    pub check_timeout: Duration,

    /// How many services are probed at once within a tick
    pub max_concurrent_checks: usize,

    /// Results kept per service
    pub history_cap: usize,

    /// Results sampled by per-service health views
    pub recent_window: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(5),
            check_timeout: Duration::from_secs(2),
            max_concurrent_checks: 8,
            history_cap: 100,
            recent_window: 10,
        }
    }
}

/// Ceilings consulted by custom-metric checks and slow-service detection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// CPU utilization, percent
    pub cpu: f64,
    /// Memory utilization, percent
    pub memory: f64,
    /// Disk utilization, percent
    pub disk: f64,
    /// Mean probe latency above which a service is flagged slow
    pub latency_ms: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { cpu: 80.0, memory: 85.0, disk: 90.0, latency_ms: 500 }
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/uppe-health/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, ConfigError> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(ConfigError::ConfigPathUnavailable);
    };

    Ok(path.join("uppe-health/config.toml"))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Current Internal Configuration State:")?;
        write_title_1(f, "Engine")?;
        write_1(f, "Check Interval", &humantime::format_duration(self.engine.check_interval))?;
        write_1(f, "Check Timeout", &humantime::format_duration(self.engine.check_timeout))?;
        write_1(f, "Max Concurrent Checks", &self.engine.max_concurrent_checks)?;
        write_1(f, "History Cap", &self.engine.history_cap)?;
        write_1(f, "Recent Window", &self.engine.recent_window)?;
        write_title_1(f, "Thresholds")?;
        write_1(f, "CPU (%)", &self.thresholds.cpu)?;
        write_1(f, "Memory (%)", &self.thresholds.memory)?;
        write_1(f, "Disk (%)", &self.thresholds.disk)?;
        write_1(f, "Latency (ms)", &self.thresholds.latency_ms)?;

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/uppe-health/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    ///
    /// ```no_run
    /// use healthcheck::Config;
    ///
    /// let cfg = Config::from_config(None::<&std::path::Path>)?;
    /// println!("{}", cfg);
    /// # Ok::<(), healthcheck::ConfigError>(())
    /// ```
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, ConfigError> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        let config = if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path).map_err(ConfigError::ReadFailed)?;
            toml::from_str::<Self>(raw_string.as_str())?
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            config
        };

        config.validate()?;
        Ok(config)
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), ConfigError> {
        let config_str: String = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::WriteFailed)?;
        }

        fs::write(path, config_str).map_err(ConfigError::WriteFailed)
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<(), HealthError> {
        validate_engine_settings(&self.engine)?;
        validate_thresholds(&self.thresholds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.engine.check_interval, Duration::from_secs(5));
        assert_eq!(config.engine.check_timeout, Duration::from_secs(2));
        assert_eq!(config.engine.history_cap, 100);
        assert_eq!(config.engine.recent_window, 10);
        assert_eq!(config.thresholds, Thresholds { cpu: 80.0, memory: 85.0, disk: 90.0, latency_ms: 500 });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/health");

        let config = Config::from_config(Some(&path)).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join("nested/health.toml").exists());

        // Second load reads what was written
        let reloaded = Config::from_config(Some(&path)).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[engine]\ncheck_interval = \"250ms\"\n\n[thresholds]\ncpu = 70.0\n").unwrap();

        let config = Config::from_config(Some(&path)).unwrap();
        assert_eq!(config.engine.check_interval, Duration::from_millis(250));
        assert_eq!(config.engine.check_timeout, Duration::from_secs(2));
        assert_eq!(config.thresholds.cpu, 70.0);
        assert_eq!(config.thresholds.disk, 90.0);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        fs::write(&path, "[engine]\nhistory_cap = 0\n").unwrap();
        assert!(matches!(Config::from_config(Some(&path)), Err(ConfigError::Invalid(_))));

        fs::write(&path, "[engine\n").unwrap();
        assert!(matches!(Config::from_config(Some(&path)), Err(ConfigError::ParseFailed(_))));
    }

    #[test]
    fn test_display_lists_settings() {
        let rendered = Config::default().to_string();
        assert!(rendered.contains("Check Interval: 5s"));
        assert!(rendered.contains("History Cap: 100"));
        assert!(rendered.contains("Latency (ms): 500"));
    }
}
