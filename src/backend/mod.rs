//! Scan backend wire layer
//!
//! The orchestrator talks to the scan backend through the [`ScanBackend`]
//! trait. [`HttpBackend`] is the production implementation over HTTP; tests
//! and embedders can supply their own.
//!
//! Responses are turned into a typed [`FeedPayload`] before the polling loop
//! sees them, so the loop dispatches on the payload tag instead of inspecting
//! headers.
//!
//! ## Endpoints
//!
//! | Call | Request | Response |
//! |------|---------|----------|
//! | [`start_scan`](ScanBackend::start_scan) | `POST /start_latitude` `{url, username, password}` | JSON `{success, message}` |
//! | [`fetch_screenshot`](ScanBackend::fetch_screenshot) | `GET /screenshot` | image bytes, or JSON `{message}` |
//! | [`fetch_logs`](ScanBackend::fetch_logs) | `GET /logs` | plain text, or JSON `{logs: [...]}` |
//! | [`fetch_report`](ScanBackend::fetch_report) | `GET /report` | HTML text |

mod decode;
mod http;

pub use decode::{FeedPayload, decode_logs, decode_screenshot};
pub use http::HttpBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Body of the launch request
#[derive(Clone, Serialize)]
pub struct LaunchRequest {
    /// URL to scan
    pub url: String,
    /// Username on the target site
    pub username: String,
    /// Password on the target site
    pub password: String,
}

impl std::fmt::Debug for LaunchRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchRequest")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Acknowledgement returned by the backend for a launch request
///
/// Both fields are optional; a 2xx response with an unparseable body is
/// still an accepted launch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct LaunchResponse {
    /// Backend success flag
    #[serde(default)]
    pub success: Option<bool>,
    /// Backend message (e.g., "Scan started in background")
    #[serde(default)]
    pub message: Option<String>,
}

/// Trait for the remote scan backend
///
/// Every call is a single request with no retry. A failed call returns an
/// error and leaves retry policy to the caller.
#[async_trait]
pub trait ScanBackend: Send + Sync {
    /// Ask the backend to start scanning
    async fn start_scan(&self, request: &LaunchRequest) -> Result<LaunchResponse>;

    /// Poll the screenshot feed
    ///
    /// Returns [`FeedPayload::Image`], [`FeedPayload::FinishSignal`] or
    /// [`FeedPayload::Status`].
    async fn fetch_screenshot(&self) -> Result<FeedPayload>;

    /// Poll the log feed
    ///
    /// Returns [`FeedPayload::Text`] or [`FeedPayload::LogList`].
    async fn fetch_logs(&self) -> Result<FeedPayload>;

    /// Fetch the finished HTML report
    async fn fetch_report(&self) -> Result<String>;

    /// Backend name, for logging
    fn name(&self) -> &str;
}
