//! Progress estimator timer.
//!
//! The estimate runs on its own clock and is not synchronized with the feed
//! polling loop. It can report completion before or after the feed switches
//! to logs; both orders are expected.

use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};

use super::SessionContext;
use super::lifecycle::complete_session;
use crate::progress::{ProgressEstimator, TickOutcome};
use crate::types::Event;

/// Spawn a background task that advances the progress estimate once per tick.
///
/// Elapsed ticks are derived from the time since the task started, so a late
/// wake-up advances several bands at once instead of drifting.
pub(crate) fn spawn_progress_task(
    ctx: SessionContext,
    mut estimator: ProgressEstimator,
    tick: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let started = Instant::now();
        let mut interval = tokio::time::interval_at(started + tick, tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let tick_millis = tick.as_millis().max(1);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let elapsed = (started.elapsed().as_millis() / tick_millis) as u64;
                    let outcome = estimator.advance_to(elapsed);
                    let progress = estimator.state().clone();

                    match outcome {
                        TickOutcome::Unchanged => {}
                        TickOutcome::Advanced { stage_changed } => {
                            let published = progress.clone();
                            if !ctx.update(move |state| state.progress = Some(published)).await {
                                break;
                            }
                            tracing::debug!(
                                session_id = %ctx.id,
                                percent = progress.percent,
                                stage = progress.stage_index,
                                "progress advanced"
                            );
                            ctx.emit(Event::Progress {
                                id: ctx.id,
                                percent: progress.percent,
                                stage_index: progress.stage_index,
                            });
                            if stage_changed {
                                ctx.emit(Event::StageChanged {
                                    id: ctx.id,
                                    stage_index: progress.stage_index,
                                    label: progress.stage_label,
                                });
                            }
                        }
                        TickOutcome::Completed { stage_changed } => {
                            ctx.emit(Event::Progress {
                                id: ctx.id,
                                percent: progress.percent,
                                stage_index: progress.stage_index,
                            });
                            if stage_changed {
                                ctx.emit(Event::StageChanged {
                                    id: ctx.id,
                                    stage_index: progress.stage_index,
                                    label: progress.stage_label.clone(),
                                });
                            }
                            complete_session(&ctx, progress).await;
                            break;
                        }
                    }
                }
                _ = ctx.cancel.cancelled() => {
                    break;
                }
            }
        }
    })
}
