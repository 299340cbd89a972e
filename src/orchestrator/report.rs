//! Report handoff after completion.

use chrono::Utc;

use super::ScanOrchestrator;
use crate::error::{Result, SessionError};
use crate::types::{Event, ReportArtifact, Status};

impl ScanOrchestrator {
    /// Fetch the finished report
    ///
    /// Does nothing and returns `Ok(None)` unless the current session is
    /// `Complete`. Each call issues exactly one request; a failure is returned
    /// to the caller, the artifact stays not-ready and the call may be
    /// repeated.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ReportFailed`] if the backend request failed.
    pub async fn fetch_report(&self) -> Result<Option<String>> {
        let id = {
            let state = self.state.read().await;
            match state.session.as_ref() {
                Some(session) if state.status == Status::Complete => session.info.id,
                _ => {
                    tracing::debug!(
                        status = %state.status,
                        "report requested before completion, ignoring"
                    );
                    return Ok(None);
                }
            }
        };

        tracing::info!(session_id = %id, "fetching scan report");
        let content = match self.backend.fetch_report().await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(session_id = %id, error = %e, "report fetch failed");
                self.emit_event(Event::ReportFailed {
                    id,
                    error: e.to_string(),
                });
                return Err(SessionError::ReportFailed {
                    id,
                    reason: e.to_string(),
                }
                .into());
            }
        };

        {
            let mut state = self.state.write().await;
            if !state.is_current(id) || state.status != Status::Complete {
                tracing::debug!(
                    session_id = %id,
                    "session replaced while fetching report, discarding"
                );
                return Ok(None);
            }
            state.report = Some(ReportArtifact {
                content: Some(content.clone()),
                ready: true,
                fetched_at: Some(Utc::now()),
            });
        }

        tracing::info!(session_id = %id, bytes = content.len(), "report ready");
        self.emit_event(Event::ReportReady {
            id,
            bytes: content.len(),
        });
        Ok(Some(content))
    }
}
