//! HTTP implementation of the scan backend.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use super::decode::{FeedPayload, decode_logs, decode_screenshot};
use super::{LaunchRequest, LaunchResponse, ScanBackend};
use crate::config::BackendConfig;
use crate::error::{Error, Result};

const START_ENDPOINT: &str = "/start_latitude";
const SCREENSHOT_ENDPOINT: &str = "/screenshot";
const LOGS_ENDPOINT: &str = "/logs";
const REPORT_ENDPOINT: &str = "/report";

/// Scan backend reached over HTTP
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: reqwest::Client,
    base: Url,
    finish_marker: String,
}

impl HttpBackend {
    /// Build a backend client from configuration
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let mut base = Url::parse(&config.base_url)?;
        // Url::join replaces the last path segment unless the base ends with '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base,
            finish_marker: config.finish_marker.clone(),
        })
    }

    /// Base URL requests are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url_for(&self, endpoint: &'static str) -> Result<Url> {
        Ok(self.base.join(endpoint.trim_start_matches('/'))?)
    }

    async fn get(&self, endpoint: &'static str) -> Result<reqwest::Response> {
        let url = self.url_for(endpoint)?;
        tracing::trace!(url = %url, "GET");
        let response = self.client.get(url).send().await?;
        check_status(endpoint, response)
    }
}

fn check_status(endpoint: &'static str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(Error::HttpStatus {
            endpoint,
            status: status.as_u16(),
        })
    }
}

fn content_type(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

#[async_trait]
impl ScanBackend for HttpBackend {
    async fn start_scan(&self, request: &LaunchRequest) -> Result<LaunchResponse> {
        let url = self.url_for(START_ENDPOINT)?;
        tracing::debug!(url = %url, target = %request.url, "sending scan launch request");

        let response = self.client.post(url).json(request).send().await?;
        let response = check_status(START_ENDPOINT, response)?;

        let body = response.bytes().await?;
        match serde_json::from_slice::<LaunchResponse>(&body) {
            Ok(ack) => Ok(ack),
            Err(e) => {
                tracing::debug!(
                    error = %e,
                    "launch acknowledgement was not JSON, accepting anyway"
                );
                Ok(LaunchResponse::default())
            }
        }
    }

    async fn fetch_screenshot(&self) -> Result<FeedPayload> {
        let response = self.get(SCREENSHOT_ENDPOINT).await?;
        let content_type = content_type(&response);
        let body = response.bytes().await?;
        decode_screenshot(content_type.as_deref(), &body, &self.finish_marker)
    }

    async fn fetch_logs(&self) -> Result<FeedPayload> {
        let response = self.get(LOGS_ENDPOINT).await?;
        let content_type = content_type(&response);
        let body = response.bytes().await?;
        decode_logs(content_type.as_deref(), &body)
    }

    async fn fetch_report(&self) -> Result<String> {
        let response = self.get(REPORT_ENDPOINT).await?;
        Ok(response.text().await?)
    }

    fn name(&self) -> &str {
        "http"
    }
}
