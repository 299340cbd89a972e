//! Typed decoding of feed responses.

use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::Screenshot;

const SCREENSHOT_ENDPOINT: &str = "/screenshot";
const LOGS_ENDPOINT: &str = "/logs";

/// A decoded feed response
#[derive(Clone, Debug)]
pub enum FeedPayload {
    /// Screenshot frame
    Image(Screenshot),
    /// JSON reply whose message carries the finish marker
    FinishSignal {
        /// Message sent by the backend
        message: String,
    },
    /// JSON reply without the finish marker (e.g., "Driver not ready")
    Status {
        /// Message sent by the backend, if any
        message: Option<String>,
    },
    /// Plain-text log buffer
    Text(String),
    /// Structured log collection
    LogList(Vec<String>),
}

impl FeedPayload {
    /// Normalize a log payload into a single text buffer
    ///
    /// Returns `None` for screenshot-feed payloads.
    pub fn into_log_text(self) -> Option<String> {
        match self {
            FeedPayload::Text(text) => Some(text),
            FeedPayload::LogList(lines) => Some(lines.join("\n")),
            _ => None,
        }
    }

    /// Short tag name, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            FeedPayload::Image(_) => "image",
            FeedPayload::FinishSignal { .. } => "finish_signal",
            FeedPayload::Status { .. } => "status",
            FeedPayload::Text(_) => "text",
            FeedPayload::LogList(_) => "log_list",
        }
    }
}

#[derive(Deserialize)]
struct MessageBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LogsBody {
    Object { logs: Vec<String> },
    List(Vec<String>),
    Single(String),
}

fn is_json(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
        .unwrap_or(false)
}

/// Decode a `/screenshot` response
///
/// JSON bodies are messages: one containing `finish_marker` becomes a
/// [`FeedPayload::FinishSignal`], any other a [`FeedPayload::Status`].
/// Everything else is treated as image bytes.
pub fn decode_screenshot(
    content_type: Option<&str>,
    body: &[u8],
    finish_marker: &str,
) -> Result<FeedPayload> {
    if is_json(content_type) {
        let parsed: MessageBody = serde_json::from_slice(body).map_err(|e| Error::Decode {
            endpoint: SCREENSHOT_ENDPOINT,
            reason: format!("invalid JSON message: {e}"),
        })?;

        return Ok(match parsed.message {
            Some(message) if message.contains(finish_marker) => {
                FeedPayload::FinishSignal { message }
            }
            message => FeedPayload::Status { message },
        });
    }

    if body.is_empty() {
        return Err(Error::Decode {
            endpoint: SCREENSHOT_ENDPOINT,
            reason: "empty image body".to_string(),
        });
    }

    Ok(FeedPayload::Image(Screenshot {
        content_type: content_type
            .unwrap_or("application/octet-stream")
            .to_string(),
        data: Arc::from(body),
        received_at: Utc::now(),
    }))
}

/// Decode a `/logs` response
///
/// JSON bodies may be `{"logs": [...]}`, a bare array of lines or a bare
/// string. Any other content type is read as UTF-8 text.
pub fn decode_logs(content_type: Option<&str>, body: &[u8]) -> Result<FeedPayload> {
    if !is_json(content_type) {
        return Ok(FeedPayload::Text(String::from_utf8_lossy(body).into_owned()));
    }

    let parsed: LogsBody = serde_json::from_slice(body).map_err(|e| Error::Decode {
        endpoint: LOGS_ENDPOINT,
        reason: format!("expected a log collection: {e}"),
    })?;

    Ok(match parsed {
        LogsBody::Object { logs } | LogsBody::List(logs) => FeedPayload::LogList(logs),
        LogsBody::Single(text) => FeedPayload::Text(text),
    })
}
