use std::str::FromStr;

use serde::Deserialize;

use crate::models::WindowSpec;
use crate::worker::WorkerConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub publishing: PublishingConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    /// Windows reported by GET /get/{server}, in response order.
    #[serde(default = "default_windows")]
    pub windows: Vec<WindowConfig>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            windows: default_windows(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WindowConfig {
    pub length_secs: u64,
    pub bucket_secs: u64,
}

fn default_windows() -> Vec<WindowConfig> {
    vec![
        WindowConfig {
            length_secs: 3600,
            bucket_secs: 60,
        },
        WindowConfig {
            length_secs: 86_400,
            bucket_secs: 3600,
        },
    ]
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    /// Samples older than this are dropped. Must cover the longest query window.
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Cron expression (seconds field first, local time). Replaces sweep_interval_secs when set.
    #[serde(default)]
    pub sweep_schedule: Option<String>,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_age_secs: default_max_age_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            sweep_schedule: None,
        }
    }
}

fn default_max_age_secs() -> u64 {
    86_400
}

fn default_sweep_interval_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishingConfig {
    /// Push period for WS /ws/get/{server}.
    #[serde(default = "default_stream_frequency_ms")]
    pub stream_frequency_ms: u64,
}

impl Default for PublishingConfig {
    fn default() -> Self {
        Self {
            stream_frequency_ms: default_stream_frequency_ms(),
        }
    }
}

fn default_stream_frequency_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// How often to log app stats (servers, samples, swept) at INFO level.
    #[serde(default = "default_stats_log_interval_secs")]
    pub stats_log_interval_secs: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            stats_log_interval_secs: default_stats_log_interval_secs(),
        }
    }
}

fn default_stats_log_interval_secs() -> u64 {
    60
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &str) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {}", path, e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Query windows as validated specs, in configured order.
    pub fn windows(&self) -> anyhow::Result<Vec<WindowSpec>> {
        self.query
            .windows
            .iter()
            .map(|w| {
                WindowSpec::from_secs(w.length_secs, w.bucket_secs).map_err(|e| {
                    anyhow::anyhow!(
                        "query.windows ({}s, {}s): {}",
                        w.length_secs,
                        w.bucket_secs,
                        e
                    )
                })
            })
            .collect()
    }

    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            max_age_secs: self.retention.max_age_secs,
            sweep_interval_secs: self.retention.sweep_interval_secs,
            sweep_schedule: self.retention.sweep_schedule.clone(),
            stats_log_interval_secs: self.monitoring.stats_log_interval_secs,
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(!self.server.host.is_empty(), "server.host must be non-empty");
        anyhow::ensure!(
            !self.query.windows.is_empty(),
            "query.windows must list at least one window"
        );
        self.windows()?;
        let longest = self
            .query
            .windows
            .iter()
            .map(|w| w.length_secs)
            .max()
            .unwrap_or(0);
        anyhow::ensure!(
            self.retention.max_age_secs >= longest,
            "retention.max_age_secs must be >= the longest query window ({}s), got {}",
            longest,
            self.retention.max_age_secs
        );
        anyhow::ensure!(
            self.retention.sweep_interval_secs > 0,
            "retention.sweep_interval_secs must be > 0, got {}",
            self.retention.sweep_interval_secs
        );
        if let Some(ref schedule) = self.retention.sweep_schedule {
            cron::Schedule::from_str(schedule).map_err(|e| {
                anyhow::anyhow!("retention.sweep_schedule '{}' is invalid: {}", schedule, e)
            })?;
        }
        anyhow::ensure!(
            self.publishing.stream_frequency_ms > 0,
            "publishing.stream_frequency_ms must be > 0, got {}",
            self.publishing.stream_frequency_ms
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        Ok(())
    }
}
