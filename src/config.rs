//! Configuration types for dast-orchestrator

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

/// Scan backend connection settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the scan backend (default: "http://localhost:8000")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (default: 10 seconds)
    #[serde(default = "default_request_timeout", with = "duration_millis_serde")]
    pub request_timeout: Duration,

    /// Substring of a JSON `/screenshot` message that signals the end of the
    /// screenshot phase (default: "Scraping finished")
    #[serde(default = "default_finish_marker")]
    pub finish_marker: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: default_request_timeout(),
            finish_marker: default_finish_marker(),
        }
    }
}

/// Live feed polling settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Fixed interval between poll ticks (default: 2 seconds)
    ///
    /// Ticks fire on this schedule whether or not the previous request has
    /// resolved.
    #[serde(default = "default_poll_interval", with = "duration_millis_serde")]
    pub interval: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: default_poll_interval(),
        }
    }
}

/// Progress estimator settings
///
/// Progress is estimated from elapsed wall-clock time only; it does not
/// reflect backend state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Estimator tick period (default: 1 second)
    #[serde(default = "default_progress_tick", with = "duration_millis_serde")]
    pub tick: Duration,

    /// Time for the estimate to reach 100% (default: 40 seconds)
    #[serde(default = "default_total_duration", with = "duration_millis_serde")]
    pub total_duration: Duration,

    /// Ordered stage labels mapped onto equal-width percentage bands
    ///
    /// Label `k` is shown once `(k + 1) / N` of the run has elapsed, so the
    /// last label is reached together with 100%.
    #[serde(default = "default_stages")]
    pub stages: Vec<String>,

    /// Label shown until the first band is crossed (default: "Initializing scan...")
    #[serde(default = "default_initializing_label")]
    pub initializing_label: String,

    /// Label shown once progress reaches 100% (default: "Scan completed")
    #[serde(default = "default_completed_label")]
    pub completed_label: String,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            tick: default_progress_tick(),
            total_duration: default_total_duration(),
            stages: default_stages(),
            initializing_label: default_initializing_label(),
            completed_label: default_completed_label(),
        }
    }
}

impl ProgressConfig {
    /// Number of ticks needed to reach 100%
    pub fn total_ticks(&self) -> u64 {
        let tick = self.tick.as_millis().max(1);
        let total = self.total_duration.as_millis();
        (total.div_ceil(tick)).max(1) as u64
    }
}

/// Main configuration for ScanOrchestrator
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend connection settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Feed polling settings
    #[serde(default)]
    pub polling: PollingConfig,

    /// Progress estimator settings
    #[serde(default)]
    pub progress: ProgressConfig,
}

impl Config {
    /// Load configuration from a JSON file
    ///
    /// Missing fields take their defaults. The result is validated.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Parsed backend base URL
    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.backend.base_url).map_err(|e| {
            Error::config(
                "backend.base_url",
                format!("invalid base URL '{}': {}", self.backend.base_url, e),
            )
        })
    }

    /// Check the configuration for values the orchestrator cannot run with
    pub fn validate(&self) -> Result<()> {
        let base = self.base_url()?;
        if base.cannot_be_a_base() {
            return Err(Error::config(
                "backend.base_url",
                format!("'{}' cannot be used as a base URL", self.backend.base_url),
            ));
        }

        if self.backend.request_timeout.is_zero() {
            return Err(Error::config(
                "backend.request_timeout",
                "request timeout must be greater than zero",
            ));
        }

        if self.backend.finish_marker.trim().is_empty() {
            return Err(Error::config(
                "backend.finish_marker",
                "finish marker must not be empty",
            ));
        }

        if self.polling.interval.is_zero() {
            return Err(Error::config(
                "polling.interval",
                "poll interval must be greater than zero",
            ));
        }

        if self.progress.tick.is_zero() {
            return Err(Error::config(
                "progress.tick",
                "progress tick must be greater than zero",
            ));
        }

        if self.progress.total_duration < self.progress.tick {
            return Err(Error::config(
                "progress.total_duration",
                "total duration must be at least one tick",
            ));
        }

        if self.progress.stages.is_empty() {
            return Err(Error::config(
                "progress.stages",
                "at least one stage label is required",
            ));
        }

        Ok(())
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_finish_marker() -> String {
    "Scraping finished".to_string()
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_progress_tick() -> Duration {
    Duration::from_secs(1)
}

fn default_total_duration() -> Duration {
    Duration::from_secs(40)
}

fn default_initializing_label() -> String {
    "Initializing scan...".to_string()
}

fn default_completed_label() -> String {
    "Scan completed".to_string()
}

fn default_stages() -> Vec<String> {
    [
        "Crawling website structure...",
        "Testing authentication...",
        "Scanning for XSS vulnerabilities...",
        "Testing SQL injection points...",
        "Checking for CSRF vulnerabilities...",
        "Analyzing HTTP security headers...",
        "Testing for sensitive data exposure...",
        "Checking access controls...",
        "Finalizing results...",
        "Generating report...",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

// Durations are stored as integer milliseconds
mod duration_millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
