//! Session start, rollback, completion, teardown and shutdown.

use std::sync::atomic::Ordering;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::{
    ActiveSession, ScanOrchestrator, SessionContext, SessionState, background_tasks, polling,
};
use crate::backend::LaunchRequest;
use crate::error::{Error, Result, SessionError};
use crate::progress::ProgressEstimator;
use crate::types::{
    Credentials, Event, FeedState, ProgressState, ReportArtifact, SessionId, SessionInfo, Status,
};

/// How long shutdown waits for background loops to exit
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

impl ScanOrchestrator {
    /// Start a new scan session
    ///
    /// Any session in progress is canceled first. The orchestrator enters
    /// `Starting` and sends one launch request. On success the session moves
    /// to `Scanning` with fresh feed and progress state, and the polling and
    /// progress loops start. On failure everything is rolled back to `Idle`.
    ///
    /// The target URL and the contact details are expected to have been
    /// validated by the caller's form layer.
    ///
    /// # Errors
    ///
    /// - [`Error::ShuttingDown`] after [`shutdown`](Self::shutdown)
    /// - [`SessionError::LaunchFailed`] if the backend rejected or never received the launch
    /// - [`SessionError::Superseded`] if another session or a teardown replaced this one
    ///   while the launch was in flight
    pub async fn start_session(
        &self,
        target_url: Url,
        credentials: Credentials,
    ) -> Result<SessionId> {
        if !self.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let id = SessionId::new(self.next_session_id.fetch_add(1, Ordering::SeqCst));
        let cancel = CancellationToken::new();
        let info = SessionInfo {
            id,
            target_url: target_url.clone(),
            username: credentials.username.clone(),
            created_at: Utc::now(),
        };

        {
            let mut state = self.state.write().await;
            // shutdown() may have torn down between the check above and this lock
            if !self.accepting_new.load(Ordering::SeqCst) {
                return Err(Error::ShuttingDown);
            }
            self.cancel_current(&mut state);
            *state = SessionState {
                status: Status::Starting,
                session: Some(ActiveSession {
                    info,
                    cancel: cancel.clone(),
                }),
                ..Default::default()
            };
        }

        tracing::info!(session_id = %id, target = %target_url, "starting scan session");
        self.emit_event(Event::SessionStarting {
            id,
            target_url: target_url.to_string(),
        });

        let request = LaunchRequest {
            url: target_url.to_string(),
            username: credentials.username,
            password: credentials.password,
        };

        let ack = match self.backend.start_scan(&request).await {
            Ok(ack) => ack,
            Err(e) => {
                self.rollback_launch(id, &e).await;
                return Err(SessionError::LaunchFailed {
                    id,
                    reason: e.to_string(),
                }
                .into());
            }
        };

        tracing::debug!(
            session_id = %id,
            success = ?ack.success,
            message = ?ack.message,
            "launch acknowledged"
        );

        {
            let mut state = self.state.write().await;
            if !state.is_live(id) {
                tracing::info!(
                    session_id = %id,
                    "session replaced while launching, not starting loops"
                );
                return Err(SessionError::Superseded { id }.into());
            }

            let estimator = ProgressEstimator::new(&self.config.progress);
            state.status = Status::Scanning;
            state.feed = Some(FeedState::default());
            state.progress = Some(estimator.state().clone());
            state.report = None;

            let ctx = SessionContext {
                id,
                state: self.state.clone(),
                event_tx: self.event_tx.clone(),
                cancel,
            };
            let poll = polling::spawn_poll_task(
                ctx.clone(),
                self.backend.clone(),
                self.config.polling.interval,
            );
            let progress =
                background_tasks::spawn_progress_task(ctx, estimator, self.config.progress.tick);
            self.track_tasks([poll, progress]).await;
        }

        tracing::info!(session_id = %id, "scan session running");
        self.emit_event(Event::SessionStarted { id });
        Ok(id)
    }

    /// Tear down the current session (consumer unmount)
    ///
    /// Cancels both loops and discards the session: status returns to `Idle`
    /// with no feed, progress or report. Returns `false` if there was nothing
    /// to tear down.
    pub async fn teardown(&self) -> bool {
        let mut state = self.state.write().await;
        if state.session.is_none() && state.status == Status::Idle {
            return false;
        }
        self.cancel_current(&mut state);
        *state = SessionState::default();
        tracing::info!("session torn down");
        true
    }

    /// Gracefully shut down the orchestrator
    ///
    /// 1. Stops accepting new sessions
    /// 2. Tears down the current session
    /// 3. Waits (bounded) for background loops to exit
    /// 4. Emits [`Event::Shutdown`]
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");
        self.accepting_new.store(false, Ordering::SeqCst);

        self.teardown().await;

        let handles: Vec<_> = self.tasks.lock().await.drain(..).collect();
        let wait = async {
            for handle in handles {
                if let Err(e) = handle.await {
                    tracing::warn!(error = %e, "background loop ended abnormally");
                }
            }
        };
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, wait).await.is_err() {
            tracing::warn!("Timeout waiting for background loops, proceeding with shutdown");
        }

        self.emit_event(Event::Shutdown);
        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    /// Cancel the held session's loops. Caller holds the state write lock.
    fn cancel_current(&self, state: &mut SessionState) {
        let Some(previous) = state.session.as_ref() else {
            return;
        };
        if previous.cancel.is_cancelled() {
            return;
        }
        previous.cancel.cancel();

        if state.status.is_active() {
            let id = previous.info.id;
            tracing::info!(session_id = %id, status = %state.status, "canceling active session");
            self.emit_event(Event::SessionCancelled { id });
        }
    }

    /// Return to `Idle` after a failed launch, keeping no partial state
    async fn rollback_launch(&self, id: SessionId, error: &Error) {
        {
            let mut state = self.state.write().await;
            if state.is_current(id) {
                if let Some(session) = state.session.as_ref() {
                    session.cancel.cancel();
                }
                *state = SessionState::default();
            }
        }

        tracing::warn!(session_id = %id, error = %error, "scan launch failed, rolled back to idle");
        self.emit_event(Event::LaunchFailed {
            id,
            error: error.to_string(),
        });
    }

    async fn track_tasks(&self, new: [tokio::task::JoinHandle<()>; 2]) {
        let mut tasks = self.tasks.lock().await;
        tasks.retain(|handle| !handle.is_finished());
        tasks.extend(new);
    }
}

/// Move a scanning session to `Complete` with its final progress
///
/// Called once by the progress loop when the estimate reaches 100%. Cancels
/// the session token, which stops the polling loop. Returns `false` if the
/// session was no longer live.
pub(crate) async fn complete_session(
    ctx: &SessionContext,
    final_progress: ProgressState,
) -> bool {
    let completed = {
        let mut state = ctx.state.write().await;
        if !state.is_live(ctx.id) || state.status != Status::Scanning {
            false
        } else {
            state.progress = Some(final_progress);
            state.status = Status::Complete;
            state.report = Some(ReportArtifact::default());
            ctx.cancel.cancel();
            true
        }
    };

    if completed {
        tracing::info!(session_id = %ctx.id, "scan complete");
        ctx.event_tx.send(Event::ScanComplete { id: ctx.id }).ok();
    }
    completed
}
