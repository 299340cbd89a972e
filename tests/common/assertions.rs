//! Event-waiting helpers for integration tests

use std::time::Duration;

use dast_orchestrator::{Event, ScanOrchestrator, SessionId};
use tokio::sync::broadcast;

/// Result of waiting for a session to finish
#[derive(Debug)]
pub enum WaitResult {
    /// `ScanComplete` received for the session
    Completed,
    /// The session was canceled before completing
    Cancelled,
    /// Timeout waiting for completion
    Timeout,
    /// Channel closed unexpectedly
    ChannelClosed,
}

/// Wait for a session to complete, collecting every event seen on the way
pub async fn wait_for_completion(
    events: &mut broadcast::Receiver<Event>,
    id: SessionId,
    timeout: Duration,
) -> (WaitResult, Vec<Event>) {
    let mut seen = Vec::new();

    let result = tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let outcome = match &event {
                        Event::ScanComplete { id: event_id } if *event_id == id => {
                            Some(WaitResult::Completed)
                        }
                        Event::SessionCancelled { id: event_id } if *event_id == id => {
                            Some(WaitResult::Cancelled)
                        }
                        _ => None,
                    };
                    seen.push(event);
                    if let Some(outcome) = outcome {
                        return outcome;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return WaitResult::ChannelClosed,
            }
        }
    })
    .await;

    (result.unwrap_or(WaitResult::Timeout), seen)
}

/// Poll the snapshot until the log feed has finished
pub async fn wait_for_logs(orchestrator: &ScanOrchestrator, timeout: Duration) -> bool {
    tokio::time::timeout(timeout, async {
        loop {
            let finished = orchestrator
                .snapshot()
                .await
                .feed
                .is_some_and(|feed| feed.scraping_finished);
            if finished {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .is_ok()
}
