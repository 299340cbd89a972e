//! Live feed polling loop.
//!
//! One tick per interval issues one request for the feed the switch currently
//! points at. Ticks are not held back by slow responses; every request runs in
//! a `JoinSet` and its result is matched against the mode it was issued for.
//! A response for an abandoned mode, or a screenshot older than the last one
//! applied, is dropped.
//!
//! A failed poll is logged and the next tick proceeds unchanged. There is no
//! backoff and no failure budget.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};

use super::SessionContext;
use crate::backend::{FeedPayload, ScanBackend};
use crate::error::{Result, SessionError};
use crate::feed::FeedSwitch;
use crate::types::{Event, FeedMode};

/// Result of one poll request, tagged with the tick that issued it
struct PollResponse {
    seq: u64,
    mode: FeedMode,
    result: Result<FeedPayload>,
}

/// What the loop should do after handling a response
enum Next {
    Continue,
    Stop,
}

struct PollLoop {
    ctx: SessionContext,
    backend: Arc<dyn ScanBackend>,
    switch: FeedSwitch,
    in_flight: JoinSet<PollResponse>,
    seq: u64,
    last_screenshot_seq: u64,
}

/// Spawn the polling loop for a session.
pub(crate) fn spawn_poll_task(
    ctx: SessionContext,
    backend: Arc<dyn ScanBackend>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let cancel = ctx.cancel.clone();
        let mut poll = PollLoop {
            ctx,
            backend,
            switch: FeedSwitch::new(),
            in_flight: JoinSet::new(),
            seq: 0,
            last_screenshot_seq: 0,
        };

        tracing::debug!(session_id = %poll.ctx.id, ?interval, "feed polling started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    break;
                }
                _ = ticker.tick() => {
                    match poll.switch.next_poll() {
                        Some(mode) => poll.issue(mode),
                        None => break,
                    }
                }
                Some(joined) = poll.in_flight.join_next(), if !poll.in_flight.is_empty() => {
                    let response = match joined {
                        Ok(response) => response,
                        Err(e) => {
                            tracing::warn!(
                                session_id = %poll.ctx.id,
                                error = %e,
                                "poll request task failed"
                            );
                            continue;
                        }
                    };
                    if let Next::Stop = poll.handle(response).await {
                        break;
                    }
                }
            }
        }

        // Requests still in flight belong to a finished or canceled session
        poll.in_flight.abort_all();
        tracing::debug!(
            session_id = %poll.ctx.id,
            finished = poll.switch.is_finished(),
            "feed polling stopped"
        );
    })
}

impl PollLoop {
    fn issue(&mut self, mode: FeedMode) {
        self.seq += 1;
        let seq = self.seq;
        let backend = self.backend.clone();
        tracing::trace!(session_id = %self.ctx.id, seq, feed = %mode, "poll tick");

        self.in_flight.spawn(async move {
            let result = match mode {
                FeedMode::Screenshot => backend.fetch_screenshot().await,
                FeedMode::Log => backend.fetch_logs().await,
            };
            PollResponse { seq, mode, result }
        });
    }

    async fn handle(&mut self, response: PollResponse) -> Next {
        let PollResponse { seq, mode, result } = response;
        let id = self.ctx.id;

        if mode != self.switch.mode() {
            tracing::debug!(
                session_id = %id,
                seq,
                issued_for = %mode,
                current = %self.switch.mode(),
                "discarding response for abandoned feed"
            );
            return Next::Continue;
        }

        let payload = match result {
            Ok(payload) => payload,
            Err(e) => {
                let failure = SessionError::PollFailed {
                    id,
                    feed: mode,
                    reason: e.to_string(),
                };
                tracing::warn!(session_id = %id, seq, error = %failure, "poll failed, continuing");
                self.ctx.emit(Event::PollFailed {
                    id,
                    feed: mode,
                    error: e.to_string(),
                });
                return Next::Continue;
            }
        };

        match payload {
            FeedPayload::Image(shot) => {
                if seq < self.last_screenshot_seq {
                    tracing::debug!(session_id = %id, seq, "discarding stale screenshot");
                    return Next::Continue;
                }
                self.last_screenshot_seq = seq;
                let bytes = shot.len();
                if self.switch.record_screenshot(shot) {
                    if !self.publish().await {
                        return Next::Stop;
                    }
                    self.ctx.emit(Event::ScreenshotUpdated { id, bytes });
                }
                Next::Continue
            }
            FeedPayload::FinishSignal { message } => {
                if !self.switch.apply_finish_signal() {
                    return Next::Continue;
                }
                tracing::info!(
                    session_id = %id,
                    %message,
                    "scraping finished, switching to log feed"
                );
                if !self.publish().await {
                    return Next::Stop;
                }
                self.ctx.emit(Event::FeedSwitched {
                    id,
                    mode: FeedMode::Log,
                });
                // Initial log snapshot, without waiting for the next tick
                self.issue(FeedMode::Log);
                Next::Continue
            }
            FeedPayload::Status { message } => {
                tracing::debug!(
                    session_id = %id,
                    ?message,
                    "screenshot feed returned a status message"
                );
                Next::Continue
            }
            payload @ (FeedPayload::Text(_) | FeedPayload::LogList(_)) => {
                if mode != FeedMode::Log {
                    tracing::debug!(
                        session_id = %id,
                        kind = payload.kind(),
                        "ignoring log payload on screenshot feed"
                    );
                    return Next::Continue;
                }
                let text = payload.into_log_text().unwrap_or_default();
                let lines = text.lines().count();
                if !self.switch.record_logs(text) {
                    return Next::Continue;
                }
                if !self.publish().await {
                    return Next::Stop;
                }
                tracing::info!(session_id = %id, lines, "log snapshot received, polling finished");
                self.ctx.emit(Event::LogsUpdated {
                    id,
                    lines,
                    scraping_finished: true,
                });
                Next::Stop
            }
        }
    }

    /// Replace the shared feed state with the switch's current state
    async fn publish(&mut self) -> bool {
        let feed = self.switch.state().clone();
        self.ctx.update(move |state| state.feed = Some(feed)).await
    }
}
