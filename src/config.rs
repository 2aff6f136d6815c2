//! Configuration loading.
//!
//! Run settings live in a TOML file (default `config.toml`) with three sections
//! matching the pipeline stages:
//!
//! ```toml
//! [data]
//! ticker = "SPY"
//! weeks_back = 4
//! interval = "1m"
//! market_open = "09:30:00"
//! market_close = "16:00:00"
//! open_window = "09:35:00"
//! close_start = "15:55:00"
//!
//! [bridge]
//! time_steps = 100
//! diffusion = 0.0
//! horizon = "session"
//!
//! [paths]
//! processed_data = "data/processed"
//! ```
//!
//! Every field has a default, so partial files are fine. CLI flags are applied
//! on top of the loaded values by `app`.

use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::returns::SessionClock;
use crate::domain::CouplingLaw;
use crate::error::AppError;

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataSection,
    pub bridge: BridgeSection,
    pub paths: PathsSection,
}

/// Market data and clock windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    pub ticker: String,
    /// Number of 7-day chunks to download (most recent first).
    pub weeks_back: u32,
    /// Bar interval as understood by the chart API ("1m", "5m", "1h", ...).
    pub interval: String,
    pub market_open: NaiveTime,
    pub market_close: NaiveTime,
    /// Last time of day included in the open window.
    pub open_window: NaiveTime,
    /// First time of day included in the close window.
    pub close_start: NaiveTime,
    /// Drop returns that span an overnight gap.
    pub intraday_only: bool,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            ticker: "SPY".to_string(),
            weeks_back: 4,
            interval: "1m".to_string(),
            market_open: hms(9, 30),
            market_close: hms(16, 0),
            open_window: hms(9, 35),
            close_start: hms(15, 55),
            intraday_only: false,
        }
    }
}

/// Unit in which the bridge horizon `T` is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HorizonUnit {
    /// Normalized session time: `T = 1`.
    #[default]
    Session,
    /// Hours between market open and close.
    Hours,
    /// Minutes between market open and close.
    Minutes,
}

/// Bridge computation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSection {
    pub time_steps: usize,
    /// Reference variance rate `σ²` (per unit of horizon).
    pub diffusion: f64,
    /// Estimate `σ²` from session residual variance instead of using `diffusion`.
    pub estimate_diffusion: bool,
    pub horizon: HorizonUnit,
    pub coupling: CouplingLaw,
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            time_steps: 100,
            diffusion: 0.0,
            estimate_diffusion: false,
            horizon: HorizonUnit::Session,
            coupling: CouplingLaw::Entropic,
        }
    }
}

/// Where fetched data and result tables are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    pub raw_data: PathBuf,
    pub processed_data: PathBuf,
    pub results_tables: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            raw_data: PathBuf::from("data/raw"),
            processed_data: PathBuf::from("data/processed"),
            results_tables: PathBuf::from("results/tables"),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    Validation(String),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::new(2, format!("Configuration error: {err}"))
    }
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Resolve the configuration for a run.
///
/// - explicit path: must exist and parse
/// - no path: use `config.toml` when present, otherwise defaults
pub fn resolve_config(path: Option<&Path>) -> Result<AppConfig, AppError> {
    match path {
        Some(p) => {
            let config = load_config(p)?;
            tracing::info!(path = %p.display(), "loaded configuration");
            Ok(config)
        }
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                let config = load_config(default_path)?;
                tracing::info!(path = DEFAULT_CONFIG_FILE, "loaded configuration");
                Ok(config)
            } else {
                tracing::debug!("no config file found, using defaults");
                Ok(AppConfig::default())
            }
        }
    }
}

impl AppConfig {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data.ticker.trim().is_empty() {
            return Err(ConfigError::Validation("ticker cannot be empty".to_string()));
        }
        if self.data.weeks_back == 0 {
            return Err(ConfigError::Validation("weeks_back must be > 0".to_string()));
        }
        self.interval_minutes()?;
        self.session_clock()?;

        if self.bridge.time_steps < 2 {
            return Err(ConfigError::Validation(format!(
                "time_steps must be >= 2, got {}",
                self.bridge.time_steps
            )));
        }
        if !(self.bridge.diffusion.is_finite() && self.bridge.diffusion >= 0.0) {
            return Err(ConfigError::Validation(format!(
                "diffusion must be finite and >= 0, got {}",
                self.bridge.diffusion
            )));
        }
        Ok(())
    }

    /// Bar interval in minutes.
    pub fn interval_minutes(&self) -> Result<f64, ConfigError> {
        parse_interval_minutes(&self.data.interval)
    }

    /// Clock windows as a validated [`SessionClock`].
    pub fn session_clock(&self) -> Result<SessionClock, ConfigError> {
        SessionClock::new(
            self.data.market_open,
            self.data.open_window,
            self.data.close_start,
            self.data.market_close,
        )
        .map_err(|e| ConfigError::Validation(e.to_string()))
    }

    /// Bridge horizon `T` in the configured unit.
    pub fn horizon(&self) -> Result<f64, ConfigError> {
        let clock = self.session_clock()?;
        Ok(horizon_in(self.bridge.horizon, &clock))
    }
}

/// Horizon between market open and close expressed in `unit`.
pub fn horizon_in(unit: HorizonUnit, clock: &SessionClock) -> f64 {
    match unit {
        HorizonUnit::Session => 1.0,
        HorizonUnit::Hours => clock.session_minutes() / 60.0,
        HorizonUnit::Minutes => clock.session_minutes(),
    }
}

/// Parse a chart-API interval string ("1m", "15m", "1h", "90m") into minutes.
pub fn parse_interval_minutes(raw: &str) -> Result<f64, ConfigError> {
    let raw = raw.trim();
    let invalid = || ConfigError::Validation(format!("invalid interval '{raw}' (expected e.g. 1m, 5m, 1h)"));

    let (digits, scale) = if let Some(d) = raw.strip_suffix('m') {
        (d, 1.0)
    } else if let Some(d) = raw.strip_suffix('h') {
        (d, 60.0)
    } else {
        return Err(invalid());
    };

    let n: u32 = digits.parse().map_err(|_| invalid())?;
    if n == 0 {
        return Err(invalid());
    }
    Ok(n as f64 * scale)
}

fn hms(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[data]
ticker = "QQQ"
weeks_back = 2
interval = "5m"
market_open = "09:30:00"
market_close = "16:00:00"
open_window = "09:45:00"
close_start = "15:45:00"
intraday_only = true

[bridge]
time_steps = 250
diffusion = 1.5e-6
horizon = "hours"
coupling = "independent"

[paths]
processed_data = "out/processed"
"#
        .to_string()
    }

    #[test]
    fn test_load_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(create_valid_config().as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.data.ticker, "QQQ");
        assert_eq!(config.data.weeks_back, 2);
        assert!(config.data.intraday_only);
        assert_eq!(config.interval_minutes().unwrap(), 5.0);
        assert_eq!(config.bridge.time_steps, 250);
        assert_eq!(config.bridge.coupling, CouplingLaw::Independent);
        assert!((config.horizon().unwrap() - 6.5).abs() < 1e-12);
        assert_eq!(config.paths.processed_data, PathBuf::from("out/processed"));
        // Unspecified fields keep their defaults.
        assert_eq!(config.paths.raw_data, PathBuf::from("data/raw"));
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let file = NamedTempFile::new().unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.data.ticker, "SPY");
        assert_eq!(config.bridge.time_steps, 100);
        assert_eq!(config.horizon().unwrap(), 1.0);
    }

    #[test]
    fn test_invalid_steps_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[bridge]\ntime_steps = 1\n").unwrap();
        assert!(matches!(load_config(file.path()), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_window_order_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[data]\nopen_window = \"15:58:00\"\n").unwrap();
        assert!(matches!(load_config(file.path()), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_malformed_toml() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[bridge\ntime_steps = ").unwrap();
        assert!(matches!(load_config(file.path()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = resolve_config(Some(Path::new("/nonexistent/sb-config.toml"))).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn interval_parsing() {
        assert_eq!(parse_interval_minutes("1m").unwrap(), 1.0);
        assert_eq!(parse_interval_minutes("90m").unwrap(), 90.0);
        assert_eq!(parse_interval_minutes("1h").unwrap(), 60.0);
        assert!(parse_interval_minutes("1d").is_err());
        assert!(parse_interval_minutes("0m").is_err());
        assert!(parse_interval_minutes("m").is_err());
    }
}
