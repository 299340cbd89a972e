//! Test configuration helpers for mock and live scan backends

use std::time::Duration;

use dast_orchestrator::config::{BackendConfig, PollingConfig, ProgressConfig};
use dast_orchestrator::{Config, Credentials, ScanOrchestrator};

/// Configuration pointing at `base_url` with timings short enough for real-time tests
///
/// Polls every 50ms and completes the progress estimate after one second.
pub fn fast_config(base_url: &str) -> Config {
    Config {
        backend: BackendConfig {
            base_url: base_url.to_string(),
            request_timeout: Duration::from_secs(2),
            ..Default::default()
        },
        polling: PollingConfig {
            interval: Duration::from_millis(50),
        },
        progress: ProgressConfig {
            tick: Duration::from_millis(20),
            total_duration: Duration::from_secs(1),
            ..Default::default()
        },
    }
}

/// Orchestrator over HTTP using [`fast_config`]
pub fn fast_orchestrator(base_url: &str) -> ScanOrchestrator {
    ScanOrchestrator::new(fast_config(base_url)).expect("valid test configuration")
}

/// Check whether a live backend is configured in the environment
pub fn has_live_backend() -> bool {
    dotenvy::dotenv().ok();
    std::env::var("DAST_BACKEND_URL").is_ok() && std::env::var("DAST_TARGET_URL").is_ok()
}

/// Live backend settings from `.env`
///
/// Required environment variables:
/// - `DAST_BACKEND_URL` - Scan backend base URL
/// - `DAST_TARGET_URL` - Site to scan
///
/// Optional environment variables:
/// - `DAST_TARGET_USERNAME` / `DAST_TARGET_PASSWORD` - Login on the target (default: empty)
pub fn load_live_settings() -> Option<(Config, url::Url, Credentials)> {
    dotenvy::dotenv().ok();

    let base_url = std::env::var("DAST_BACKEND_URL").ok()?;
    let target = std::env::var("DAST_TARGET_URL").ok()?.parse().ok()?;
    let credentials = Credentials::new(
        std::env::var("DAST_TARGET_USERNAME").unwrap_or_default(),
        std::env::var("DAST_TARGET_PASSWORD").unwrap_or_default(),
    );

    let config = Config {
        backend: BackendConfig {
            base_url,
            ..Default::default()
        },
        ..Default::default()
    };
    Some((config, target, credentials))
}

/// Initialize test logging once, honoring `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dast_orchestrator=debug".into()),
        )
        .with_test_writer()
        .try_init();
}
