//! Configuration management for the outcome predictor

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Log output format
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub assets: AssetsConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Asset bundle location
#[derive(Debug, Clone, Deserialize)]
pub struct AssetsConfig {
    /// Path to the serialized asset bundle
    pub bundle_path: PathBuf,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    #[serde(default)]
    pub format: LogFormat,
}

/// Metrics reporting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Seconds between logged summaries; 0 disables the reporter
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,
}

fn default_report_interval() -> u64 {
    300
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: default_report_interval(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path, with `PREDICTOR__*`
    /// environment variables taking precedence
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("PREDICTOR").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            assets: AssetsConfig {
                bundle_path: PathBuf::from("models/dropout_prediction_model.json"),
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8501,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Pretty,
            },
            metrics: MetricsConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(
            config.assets.bundle_path,
            PathBuf::from("models/dropout_prediction_model.json")
        );
        assert_eq!(config.server.port, 8501);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.metrics.report_interval_secs, 300);
        assert!(config.server.socket_addr().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[assets]
bundle_path = "assets/bundle.json"

[server]
host = "0.0.0.0"
port = 9000

[logging]
level = "debug"
format = "json"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.assets.bundle_path, PathBuf::from("assets/bundle.json"));
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.metrics.report_interval_secs, 300);
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[assets]
bundle_path = "assets/bundle.json"

[server]
host = "127.0.0.1"
port = 8501

[logging]
level = "info"
"#
        )
        .unwrap();

        // No other test asserts on the log level
        std::env::set_var("PREDICTOR__LOGGING__LEVEL", "trace");
        let config = AppConfig::load_from_path(file.path());
        std::env::remove_var("PREDICTOR__LOGGING__LEVEL");

        let config = config.unwrap();
        assert_eq!(config.logging.level, "trace");
        assert_eq!(config.server.port, 8501);
    }
}
