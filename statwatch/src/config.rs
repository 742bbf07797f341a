use anyhow::{Context, Result, bail};
use reqwest::Url;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_STATS_URL: &str = "http://srv.msk01.gigacorp.local/_stats";

/// Upper bound for the polling interval and HTTP timeout (one day).
pub const MAX_INTERVAL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub endpoint: EndpointConfig,
    pub polling: PollingConfig,
    pub thresholds: ThresholdConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct EndpointConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_STATS_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl EndpointConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_secs: 5 }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Alert thresholds. All comparisons are strict: a value equal to its
/// threshold does not alert.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Absolute load average.
    pub load_average: u64,
    /// Percent of total memory in use.
    pub memory_percent: f64,
    /// Percent of total disk in use.
    pub disk_percent: f64,
    /// Percent of network capacity in use.
    pub network_percent: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            load_average: 30,
            memory_percent: 80.0,
            disk_percent: 90.0,
            network_percent: 90.0,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.endpoint.url)
            .with_context(|| format!("invalid endpoint url {:?}", self.endpoint.url))?;
        if self.endpoint.timeout_secs == 0 {
            bail!("endpoint.timeout_secs must be greater than zero");
        }
        if self.polling.interval_secs == 0 {
            bail!("polling.interval_secs must be greater than zero");
        }
        if self.polling.interval_secs > MAX_INTERVAL_SECS {
            bail!("polling.interval_secs must be at most {MAX_INTERVAL_SECS}");
        }
        if self.endpoint.timeout_secs > MAX_INTERVAL_SECS {
            bail!("endpoint.timeout_secs must be at most {MAX_INTERVAL_SECS}");
        }
        self.thresholds.validate()
    }
}

impl ThresholdConfig {
    /// Percent thresholds must be finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("thresholds.memory_percent", self.memory_percent),
            ("thresholds.disk_percent", self.disk_percent),
            ("thresholds.network_percent", self.network_percent),
        ] {
            if !value.is_finite() || value < 0.0 {
                bail!("{name} must be a finite, non-negative number (got {value})");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_stock_settings() {
        let cfg = Config::default();
        assert_eq!(cfg.endpoint.url, DEFAULT_STATS_URL);
        assert_eq!(cfg.endpoint.timeout(), Duration::from_secs(30));
        assert_eq!(cfg.polling.interval(), Duration::from_secs(5));
        assert_eq!(cfg.thresholds.load_average, 30);
        assert_eq!(cfg.thresholds.memory_percent, 80.0);
        assert_eq!(cfg.thresholds.disk_percent, 90.0);
        assert_eq!(cfg.thresholds.network_percent, 90.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let cfg = Config::from_toml(
            r#"
            [endpoint]
            url = "http://127.0.0.1:8080/_stats"

            [thresholds]
            memory_percent = 75.5
            "#,
        )
        .unwrap();
        assert_eq!(cfg.endpoint.url, "http://127.0.0.1:8080/_stats");
        assert_eq!(cfg.endpoint.timeout_secs, 30);
        assert_eq!(cfg.polling.interval_secs, 5);
        assert_eq!(cfg.thresholds.memory_percent, 75.5);
        assert_eq!(cfg.thresholds.load_average, 30);
    }

    #[test]
    fn rejects_unparsable_toml() {
        assert!(Config::from_toml("[polling]\ninterval_secs = \"fast\"").is_err());
    }

    #[test]
    fn validate_rejects_zero_durations() {
        let mut cfg = Config::default();
        cfg.polling.interval_secs = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.endpoint.timeout_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_oversized_durations() {
        let mut cfg = Config::default();
        cfg.polling.interval_secs = u64::MAX;
        let err = cfg.validate().unwrap_err();
        assert!(format!("{err}").contains("polling.interval_secs"));

        let mut cfg = Config::default();
        cfg.endpoint.timeout_secs = u64::MAX;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.polling.interval_secs = MAX_INTERVAL_SECS;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_nan_threshold() {
        let cfg = Config::from_toml("[thresholds]\nmemory_percent = nan").unwrap();
        assert!(cfg.thresholds.memory_percent.is_nan());
        let err = cfg.validate().unwrap_err();
        assert!(format!("{err}").contains("thresholds.memory_percent"));
    }

    #[test]
    fn validate_rejects_negative_or_infinite_thresholds() {
        let cfg = Config::from_toml("[thresholds]\ndisk_percent = -1.0").unwrap();
        assert!(cfg.validate().is_err());

        let cfg = Config::from_toml("[thresholds]\nnetwork_percent = inf").unwrap();
        assert!(cfg.validate().is_err());

        let cfg = Config::from_toml("[thresholds]\nnetwork_percent = 0.0").unwrap();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_url() {
        let mut cfg = Config::default();
        cfg.endpoint.url = "not a url".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[polling]\ninterval_secs = 12").unwrap();
        let cfg = Config::load(file.path()).unwrap();
        assert_eq!(cfg.polling.interval(), Duration::from_secs(12));
    }

    #[test]
    fn missing_file_names_path() {
        let err = Config::load(Path::new("/nonexistent/statwatch.toml")).unwrap_err();
        assert!(format!("{err}").contains("/nonexistent/statwatch.toml"));
    }
}
