use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub health: HealthConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a daily-rolled file under `directory`.
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "indexer_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Directory for log files. Falls back to `~/.indexer/logs`.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_host")]
    pub host: String,

    #[serde(default = "default_http_port")]
    pub port: u16,
}

fn default_http_host() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    8098
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_http_host(),
            port: default_http_port(),
        }
    }
}

impl HttpConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Seconds between background probe passes.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Upper bound for a single store call.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    #[serde(default)]
    pub stores: Vec<StoreConfig>,
}

fn default_interval_secs() -> u64 {
    10
}

fn default_probe_timeout_ms() -> u64 {
    3000
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            probe_timeout_ms: default_probe_timeout_ms(),
            stores: Vec::new(),
        }
    }
}

impl HealthConfig {
    /// Probe interval, never shorter than one second.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

/// A backing store to watch, addressed as `host:port`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub name: String,
    pub address: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_document_yields_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.http.bind_addr(), "127.0.0.1:8098");
        assert_eq!(cfg.health.interval(), Duration::from_secs(10));
        assert_eq!(cfg.health.probe_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [http]
            port = 9000

            [health]
            interval_secs = 0

            [[health.stores]]
            name = "postgres"
            address = "127.0.0.1:5432"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.http.host, "127.0.0.1");
        assert_eq!(cfg.http.port, 9000);
        assert_eq!(cfg.health.interval(), Duration::from_secs(1));
        assert_eq!(
            cfg.health.stores,
            vec![StoreConfig {
                name: "postgres".into(),
                address: "127.0.0.1:5432".into(),
            }]
        );
        assert_eq!(cfg.logging, LoggingConfig::default());
    }
}
