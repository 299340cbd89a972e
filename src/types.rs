//! Core types for dast-orchestrator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

/// Unique identifier for a scan session
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl SessionId {
    /// Create a new SessionId
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner u64 value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for SessionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session status
///
/// `Idle → Starting → Scanning → Complete`, with `Starting → Idle` as the
/// rollback edge on launch failure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// No session
    #[default]
    Idle,
    /// Launch request in flight
    Starting,
    /// Backend accepted the launch; feed and progress loops are running
    Scanning,
    /// Progress reached 100%; loops are stopped and the report may be fetched
    Complete,
    /// Reserved for backends that report a terminal scan failure
    Failed,
}

impl Status {
    /// Whether a session in this status owns running or pending background work
    pub fn is_active(&self) -> bool {
        matches!(self, Status::Starting | Status::Scanning)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Status::Idle => "idle",
            Status::Starting => "starting",
            Status::Scanning => "scanning",
            Status::Complete => "complete",
            Status::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Login credentials the backend uses to authenticate against the scan target
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Username on the target site
    pub username: String,
    /// Password on the target site
    pub password: String,
}

impl Credentials {
    /// Create credentials from a username and password
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Which live feed is currently authoritative
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedMode {
    /// Live browser screenshots from `/screenshot`
    #[default]
    Screenshot,
    /// Textual scan logs from `/logs`
    Log,
}

impl FeedMode {
    /// Backend path polled for this feed
    pub fn endpoint(&self) -> &'static str {
        match self {
            FeedMode::Screenshot => "/screenshot",
            FeedMode::Log => "/logs",
        }
    }
}

impl std::fmt::Display for FeedMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedMode::Screenshot => f.write_str("screenshot"),
            FeedMode::Log => f.write_str("log"),
        }
    }
}

/// A single screenshot frame received from the backend
///
/// The image bytes are shared; replacing the frame in [`FeedState`] releases
/// the previous buffer once no snapshot holds it.
#[derive(Clone)]
pub struct Screenshot {
    /// MIME type reported by the backend (e.g., "image/png")
    pub content_type: String,
    /// Raw image bytes
    pub data: Arc<[u8]>,
    /// When the frame was received
    pub received_at: DateTime<Utc>,
}

impl Screenshot {
    /// Size of the image in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the image is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl std::fmt::Debug for Screenshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Screenshot")
            .field("content_type", &self.content_type)
            .field("bytes", &self.data.len())
            .field("received_at", &self.received_at)
            .finish()
    }
}

/// Live feed state of a session
#[derive(Clone, Debug, Default)]
pub struct FeedState {
    /// Currently authoritative feed
    pub mode: FeedMode,
    /// Latest screenshot frame, if any arrived
    pub last_screenshot: Option<Screenshot>,
    /// Normalized log buffer
    pub log_text: String,
    /// Set once the initial log snapshot has been fetched after the switch to log mode
    pub scraping_finished: bool,
}

/// Cosmetic progress estimate of a session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressState {
    /// Progress percentage (0.0 to 100.0)
    pub percent: f64,
    /// Index of the current stage label
    pub stage_index: usize,
    /// Human-readable stage label
    pub stage_label: String,
}

/// Report content fetched after completion
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportArtifact {
    /// HTML report body, once fetched
    pub content: Option<String>,
    /// Whether `content` holds a successfully fetched report
    pub ready: bool,
    /// When the report was fetched
    pub fetched_at: Option<DateTime<Utc>>,
}

/// Public, credential-free description of a session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Session ID
    pub id: SessionId,
    /// URL being scanned
    pub target_url: Url,
    /// Username submitted with the launch request
    pub username: String,
    /// When the session was created
    pub created_at: DateTime<Utc>,
}

/// Read-only view of the orchestrator state
#[derive(Clone, Debug, Default)]
pub struct SessionSnapshot {
    /// Current status
    pub status: Status,
    /// Current session, absent when idle
    pub session: Option<SessionInfo>,
    /// Feed state, present once the session is scanning
    pub feed: Option<FeedState>,
    /// Progress state, present once the session is scanning
    pub progress: Option<ProgressState>,
    /// Report state, present once the session is complete
    pub report: Option<ReportArtifact>,
}

impl SessionSnapshot {
    /// Stage label to display; "Waiting to start" before any session scans
    pub fn progress_label(&self) -> &str {
        self.progress
            .as_ref()
            .map(|p| p.stage_label.as_str())
            .unwrap_or(crate::progress::WAITING_LABEL)
    }
}

/// Event emitted during the session lifecycle
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Launch request is being sent
    SessionStarting {
        /// Session ID
        id: SessionId,
        /// URL being scanned
        target_url: String,
    },

    /// Backend accepted the launch; loops are running
    SessionStarted {
        /// Session ID
        id: SessionId,
    },

    /// Launch failed; state rolled back to idle
    LaunchFailed {
        /// Session ID
        id: SessionId,
        /// Error message
        error: String,
    },

    /// New screenshot frame stored
    ScreenshotUpdated {
        /// Session ID
        id: SessionId,
        /// Frame size in bytes
        bytes: usize,
    },

    /// Backend signaled the end of the screenshot phase
    FeedSwitched {
        /// Session ID
        id: SessionId,
        /// Feed now authoritative
        mode: FeedMode,
    },

    /// Log buffer replaced
    LogsUpdated {
        /// Session ID
        id: SessionId,
        /// Number of lines in the buffer
        lines: usize,
        /// Whether this snapshot finished the log feed
        scraping_finished: bool,
    },

    /// A poll tick failed; polling continues
    PollFailed {
        /// Session ID
        id: SessionId,
        /// Feed that was polled
        feed: FeedMode,
        /// Error message
        error: String,
    },

    /// Progress estimate advanced
    Progress {
        /// Session ID
        id: SessionId,
        /// Progress percentage (0.0 to 100.0)
        percent: f64,
        /// Current stage index
        stage_index: usize,
    },

    /// Stage label changed
    StageChanged {
        /// Session ID
        id: SessionId,
        /// New stage index
        stage_index: usize,
        /// New stage label
        label: String,
    },

    /// Scan complete; the report may now be fetched
    ScanComplete {
        /// Session ID
        id: SessionId,
    },

    /// Session canceled before completion (new session, teardown or shutdown)
    SessionCancelled {
        /// Session ID
        id: SessionId,
    },

    /// Report fetched
    ReportReady {
        /// Session ID
        id: SessionId,
        /// Report size in bytes
        bytes: usize,
    },

    /// Report fetch failed; it may be requested again
    ReportFailed {
        /// Session ID
        id: SessionId,
        /// Error message
        error: String,
    },

    /// Orchestrator is shutting down
    Shutdown,
}
