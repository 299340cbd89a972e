//! Error types for dast-orchestrator
//!
//! This module provides error handling for the library, including:
//! - A top-level [`Error`] covering configuration, transport and decode failures
//! - [`SessionError`] for the session-scoped failure taxonomy (launch, poll, report)
//! - Machine-readable error codes for consumers that surface errors to a UI

use thiserror::Error;

use crate::types::{FeedMode, SessionId};

/// Result type alias for dast-orchestrator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for dast-orchestrator
///
/// No variant is fatal to the process. Everything the orchestrator raises is
/// scoped to a single session or a single request.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "polling.interval")
        key: Option<String>,
    },

    /// Network error (connect failure, timeout, body read failure)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Backend answered with a non-success HTTP status
    #[error("{endpoint} returned HTTP {status}")]
    HttpStatus {
        /// Backend path that was requested (e.g., "/start_latitude")
        endpoint: &'static str,
        /// HTTP status code returned
        status: u16,
    },

    /// Response body did not match any shape expected for the endpoint
    #[error("unexpected response from {endpoint}: {reason}")]
    Decode {
        /// Backend path that was requested
        endpoint: &'static str,
        /// What was wrong with the payload
        reason: String,
    },

    /// Invalid URL (backend base URL or scan target)
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Session-scoped failure
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Shutdown in progress - not accepting new sessions
    #[error("shutdown in progress: not accepting new sessions")]
    ShuttingDown,
}

/// Session-scoped failures
#[derive(Debug, Error)]
pub enum SessionError {
    /// The launch request was rejected or the backend was unreachable.
    /// The session has been rolled back to idle.
    #[error("scan launch for session {id} failed: {reason}")]
    LaunchFailed {
        /// The session whose launch failed
        id: SessionId,
        /// The reason the launch failed
        reason: String,
    },

    /// A single poll tick failed; the loop keeps running
    #[error("{feed} poll for session {id} failed: {reason}")]
    PollFailed {
        /// The session being polled
        id: SessionId,
        /// The feed that was being polled
        feed: FeedMode,
        /// The reason the poll failed
        reason: String,
    },

    /// The report fetch failed; the artifact stays not-ready and may be re-requested
    #[error("report fetch for session {id} failed: {reason}")]
    ReportFailed {
        /// The session whose report was requested
        id: SessionId,
        /// The reason the fetch failed
        reason: String,
    },

    /// The launch succeeded but a newer session or a teardown replaced this
    /// one before it started scanning
    #[error("session {id} was replaced before scanning started")]
    Superseded {
        /// The superseded session
        id: SessionId,
    },
}

impl Error {
    /// Create a configuration error for the given key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Machine-readable error code (e.g., "launch_failed")
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Network(_) => "network_error",
            Error::HttpStatus { .. } => "http_status",
            Error::Decode { .. } => "decode_error",
            Error::InvalidUrl(_) => "invalid_url",
            Error::Serialization(_) => "serialization_error",
            Error::Io(_) => "io_error",
            Error::Session(e) => match e {
                SessionError::LaunchFailed { .. } => "launch_failed",
                SessionError::PollFailed { .. } => "poll_failed",
                SessionError::ReportFailed { .. } => "report_failed",
                SessionError::Superseded { .. } => "superseded",
            },
            Error::ShuttingDown => "shutting_down",
        }
    }
}
