//! Scan session controller split into focused submodules.
//!
//! The `ScanOrchestrator` struct and its methods are organized by concern:
//! - [`lifecycle`] - Session start, rollback, completion, teardown and shutdown
//! - [`polling`] - Live feed polling loop
//! - [`background_tasks`] - Progress estimator timer
//! - [`report`] - Report handoff after completion

mod background_tasks;
mod lifecycle;
mod polling;
mod report;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64};

use tokio::sync::{Mutex, RwLock, broadcast};
use tokio_util::sync::CancellationToken;

use crate::backend::{HttpBackend, ScanBackend};
use crate::config::Config;
use crate::error::Result;
use crate::types::{
    Event, FeedState, ProgressState, ReportArtifact, SessionId, SessionInfo, SessionSnapshot,
    Status,
};

/// The session currently owned by the orchestrator
pub(crate) struct ActiveSession {
    pub(crate) info: SessionInfo,
    /// Canceled on teardown, replacement or completion; stops both loops
    pub(crate) cancel: CancellationToken,
}

/// Shared session state
///
/// Each field has a single writer: the controller owns `status`, `session`
/// and `report`, the polling loop owns `feed`, the progress loop owns
/// `progress`. Readers may take a snapshot at any time.
#[derive(Default)]
pub(crate) struct SessionState {
    pub(crate) status: Status,
    pub(crate) session: Option<ActiveSession>,
    pub(crate) feed: Option<FeedState>,
    pub(crate) progress: Option<ProgressState>,
    pub(crate) report: Option<ReportArtifact>,
}

impl SessionState {
    /// Whether `id` is the session currently held (canceled or not)
    pub(crate) fn is_current(&self, id: SessionId) -> bool {
        self.session.as_ref().is_some_and(|s| s.info.id == id)
    }

    /// Whether `id` is the current session and its loops may still write
    pub(crate) fn is_live(&self, id: SessionId) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.info.id == id && !s.cancel.is_cancelled())
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            session: self.session.as_ref().map(|s| s.info.clone()),
            feed: self.feed.clone(),
            progress: self.progress.clone(),
            report: self.report.clone(),
        }
    }
}

/// Handle given to a session's background loops
///
/// Writes go through [`SessionContext::update`], which re-checks under the
/// state lock that the session is still live. Cancellation also happens
/// under that lock, so a canceled session can never write afterwards.
#[derive(Clone)]
pub(crate) struct SessionContext {
    pub(crate) id: SessionId,
    pub(crate) state: Arc<RwLock<SessionState>>,
    pub(crate) event_tx: broadcast::Sender<Event>,
    pub(crate) cancel: CancellationToken,
}

impl SessionContext {
    /// Apply `f` to the shared state if this session is still live
    pub(crate) async fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut SessionState),
    {
        let mut state = self.state.write().await;
        if !state.is_live(self.id) {
            return false;
        }
        f(&mut state);
        true
    }

    /// Emit an event unless the session has been canceled
    pub(crate) fn emit(&self, event: Event) {
        if !self.cancel.is_cancelled() {
            self.event_tx.send(event).ok();
        }
    }
}

/// Client-side orchestrator for remote scan sessions (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct ScanOrchestrator {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Scan backend (trait object for pluggable implementations)
    pub(crate) backend: Arc<dyn ScanBackend>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Session state shared with the background loops
    pub(crate) state: Arc<RwLock<SessionState>>,
    /// Next session ID
    pub(crate) next_session_id: Arc<AtomicU64>,
    /// Background loop handles, awaited on shutdown
    pub(crate) tasks: Arc<Mutex<Vec<tokio::task::JoinHandle<()>>>>,
    /// Flag to indicate whether new sessions are accepted (set to false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
}

impl ScanOrchestrator {
    /// Create an orchestrator talking to the HTTP backend named in `config`
    ///
    /// The configuration is validated first.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let backend = HttpBackend::new(&config.backend)?;
        tracing::info!(base_url = %backend.base_url(), "scan orchestrator initialized");
        Self::with_backend(config, Arc::new(backend))
    }

    /// Create an orchestrator over a custom backend implementation
    pub fn with_backend(config: Config, backend: Arc<dyn ScanBackend>) -> Result<Self> {
        config.validate()?;
        tracing::debug!(backend = backend.name(), "using scan backend");

        // Buffer 1000 events; slower subscribers get RecvError::Lagged
        let (event_tx, _rx) = broadcast::channel(1000);

        Ok(Self {
            config: Arc::new(config),
            backend,
            event_tx,
            state: Arc::new(RwLock::new(SessionState::default())),
            next_session_id: Arc::new(AtomicU64::new(1)),
            tasks: Arc::new(Mutex::new(Vec::new())),
            accepting_new: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Subscribe to session events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events
    /// independently. [`Event::ScanComplete`] is the completion notification.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dast_orchestrator::{Config, Event, ScanOrchestrator};
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let orchestrator = ScanOrchestrator::new(Config::default())?;
    ///
    /// let mut events = orchestrator.subscribe();
    /// tokio::spawn(async move {
    ///     while let Ok(event) = events.recv().await {
    ///         if let Event::ScanComplete { id } = event {
    ///             println!("session {id} complete");
    ///         }
    ///     }
    /// });
    /// # Ok(())
    /// # }
    /// ```
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Read-only snapshot of status, feed, progress and report
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.read().await.snapshot()
    }

    /// Current session status
    pub async fn status(&self) -> Status {
        self.state.read().await.status
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers, the event is silently dropped.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}
