//! Shared test helpers: a scripted in-memory scan backend and orchestrator builders.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::broadcast;

use crate::backend::{FeedPayload, LaunchRequest, LaunchResponse, ScanBackend};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::orchestrator::ScanOrchestrator;
use crate::types::{Credentials, Event, Screenshot};

/// Scripted reply for a feed poll
pub(crate) enum Reply {
    Image(&'static [u8]),
    Finish,
    Status(&'static str),
    Text(&'static str),
    Logs(Vec<&'static str>),
    Fail(u16),
    Delayed(Duration, Box<Reply>),
}

impl Reply {
    pub(crate) fn delayed(delay: Duration, reply: Reply) -> Self {
        Reply::Delayed(delay, Box::new(reply))
    }

    fn into_result(self, endpoint: &'static str) -> Result<FeedPayload> {
        match self {
            Reply::Image(bytes) => Ok(FeedPayload::Image(Screenshot {
                content_type: "image/png".to_string(),
                data: Arc::from(bytes),
                received_at: Utc::now(),
            })),
            Reply::Finish => Ok(FeedPayload::FinishSignal {
                message: "Scraping finished".to_string(),
            }),
            Reply::Status(message) => Ok(FeedPayload::Status {
                message: Some(message.to_string()),
            }),
            Reply::Text(text) => Ok(FeedPayload::Text(text.to_string())),
            Reply::Logs(lines) => Ok(FeedPayload::LogList(
                lines.into_iter().map(String::from).collect(),
            )),
            Reply::Fail(status) => Err(Error::HttpStatus { endpoint, status }),
            Reply::Delayed(_, inner) => inner.into_result(endpoint),
        }
    }
}

/// Scripted reply for the launch request
pub(crate) enum LaunchReply {
    Accept,
    Reject(u16),
    Delayed(Duration),
}

/// Scripted reply for the report request
pub(crate) enum ReportReply {
    Html(&'static str),
    Fail(u16),
}

/// In-memory backend that replays scripted replies and counts calls
///
/// Once a script runs dry, the screenshot feed answers "Driver not ready",
/// the log feed answers an empty buffer and launches are accepted.
#[derive(Default)]
pub(crate) struct ScriptedBackend {
    launches: Mutex<VecDeque<LaunchReply>>,
    screenshots: Mutex<VecDeque<Reply>>,
    logs: Mutex<VecDeque<Reply>>,
    reports: Mutex<VecDeque<ReportReply>>,
    pub(crate) launch_calls: AtomicUsize,
    pub(crate) screenshot_calls: AtomicUsize,
    pub(crate) log_calls: AtomicUsize,
    pub(crate) report_calls: AtomicUsize,
    pub(crate) last_launch: Mutex<Option<LaunchRequest>>,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn script_launch(&self, reply: LaunchReply) {
        self.launches.lock().unwrap().push_back(reply);
    }

    pub(crate) fn script_screenshots(&self, replies: impl IntoIterator<Item = Reply>) {
        self.screenshots.lock().unwrap().extend(replies);
    }

    pub(crate) fn script_logs(&self, replies: impl IntoIterator<Item = Reply>) {
        self.logs.lock().unwrap().extend(replies);
    }

    pub(crate) fn script_report(&self, reply: ReportReply) {
        self.reports.lock().unwrap().push_back(reply);
    }

    pub(crate) fn screenshot_calls(&self) -> usize {
        self.screenshot_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn log_calls(&self) -> usize {
        self.log_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn launch_calls(&self) -> usize {
        self.launch_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn report_calls(&self) -> usize {
        self.report_calls.load(Ordering::SeqCst)
    }

    async fn play(
        queue: &Mutex<VecDeque<Reply>>,
        fallback: Reply,
        endpoint: &'static str,
    ) -> Result<FeedPayload> {
        let reply = queue.lock().unwrap().pop_front().unwrap_or(fallback);
        if let Reply::Delayed(delay, _) = &reply {
            tokio::time::sleep(*delay).await;
        }
        reply.into_result(endpoint)
    }
}

#[async_trait]
impl ScanBackend for ScriptedBackend {
    async fn start_scan(&self, request: &LaunchRequest) -> Result<LaunchResponse> {
        self.launch_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_launch.lock().unwrap() = Some(request.clone());

        let reply = self
            .launches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(LaunchReply::Accept);
        match reply {
            LaunchReply::Accept => {}
            LaunchReply::Reject(status) => {
                return Err(Error::HttpStatus {
                    endpoint: "/start_latitude",
                    status,
                });
            }
            LaunchReply::Delayed(delay) => tokio::time::sleep(delay).await,
        }

        Ok(LaunchResponse {
            success: Some(true),
            message: Some("Scan started in background".to_string()),
        })
    }

    async fn fetch_screenshot(&self) -> Result<FeedPayload> {
        self.screenshot_calls.fetch_add(1, Ordering::SeqCst);
        Self::play(&self.screenshots, Reply::Status("Driver not ready"), "/screenshot").await
    }

    async fn fetch_logs(&self) -> Result<FeedPayload> {
        self.log_calls.fetch_add(1, Ordering::SeqCst);
        Self::play(&self.logs, Reply::Text(""), "/logs").await
    }

    async fn fetch_report(&self) -> Result<String> {
        self.report_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .reports
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ReportReply::Html("<html>report</html>"));
        match reply {
            ReportReply::Html(html) => Ok(html.to_string()),
            ReportReply::Fail(status) => Err(Error::HttpStatus {
                endpoint: "/report",
                status,
            }),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Orchestrator over `backend` with the default timings (2s polls, 1s ticks, 40s run)
pub(crate) fn create_test_orchestrator(backend: Arc<ScriptedBackend>) -> ScanOrchestrator {
    ScanOrchestrator::with_backend(Config::default(), backend).unwrap()
}

pub(crate) fn target() -> url::Url {
    "https://target.example.com/login".parse().unwrap()
}

pub(crate) fn credentials() -> Credentials {
    Credentials::new("admin", "hunter2")
}

/// Receive events until one matches, failing after `limit` of (paused) time
pub(crate) async fn wait_for<F>(
    rx: &mut broadcast::Receiver<Event>,
    limit: Duration,
    mut matches: F,
) -> Event
where
    F: FnMut(&Event) -> bool,
{
    tokio::time::timeout(limit, async {
        loop {
            let event = rx.recv().await.unwrap();
            if matches(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

/// Events already buffered in `rx`
pub(crate) fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
