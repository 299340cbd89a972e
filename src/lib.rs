//! # dast-orchestrator
//!
//! Client-side session orchestrator for a remote DAST (dynamic application
//! security testing) scan backend.
//!
//! The orchestrator starts a scan job, polls the backend's two live feeds
//! (a screenshot stream, then a textual log stream once the backend signals
//! that scraping has finished), runs a time-based progress estimate, raises a
//! completion notification and hands off the finished report on request.
//! It does not scan anything itself, parse results or render UI.
//!
//! ## Quick Start
//!
//! ```no_run
//! use dast_orchestrator::{Config, Credentials, Event, ScanOrchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orchestrator = ScanOrchestrator::new(Config::default())?;
//!
//!     let mut events = orchestrator.subscribe();
//!     orchestrator
//!         .start_session(
//!             "https://example.com".parse()?,
//!             Credentials::new("admin", "secret"),
//!         )
//!         .await?;
//!
//!     while let Ok(event) = events.recv().await {
//!         if let Event::ScanComplete { .. } = event {
//!             break;
//!         }
//!     }
//!
//!     if let Some(html) = orchestrator.fetch_report().await? {
//!         println!("report: {} bytes", html.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Known simplification
//!
//! The progress estimate is driven by a wall-clock timer over a fixed total
//! duration. It is not evidence of backend progress, and it may report
//! completion before or after the feed has switched to logs.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Scan backend wire layer
pub mod backend;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Feed mode switch
pub mod feed;
/// Session controller and background loops
pub mod orchestrator;
/// Progress estimator
pub mod progress;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use backend::{FeedPayload, HttpBackend, LaunchRequest, LaunchResponse, ScanBackend};
pub use config::Config;
pub use error::{Error, Result, SessionError};
pub use orchestrator::ScanOrchestrator;
pub use types::{
    Credentials, Event, FeedMode, FeedState, ProgressState, ReportArtifact, Screenshot,
    SessionId, SessionInfo, SessionSnapshot, Status,
};

/// Block until the process is asked to stop, then tear the orchestrator down
///
/// SIGTERM and SIGINT are watched on Unix; elsewhere, or when neither handler
/// can be installed, Ctrl+C is the only trigger.
///
/// ```no_run
/// use dast_orchestrator::{Config, ScanOrchestrator, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let orchestrator = ScanOrchestrator::new(Config::default())?;
///     run_with_shutdown(orchestrator).await?;
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(orchestrator: ScanOrchestrator) -> Result<()> {
    wait_for_signal().await;
    orchestrator.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{Signal, SignalKind, signal};

    fn register(name: &'static str, kind: SignalKind) -> Option<Signal> {
        signal(kind)
            .map_err(|e| tracing::warn!(signal = name, error = %e, "signal handler unavailable"))
            .ok()
    }

    async fn next(stream: Option<&mut Signal>) -> Option<()> {
        match stream {
            Some(stream) => stream.recv().await,
            None => std::future::pending().await,
        }
    }

    let mut term = register("SIGTERM", SignalKind::terminate());
    let mut int = register("SIGINT", SignalKind::interrupt());
    if term.is_none() && int.is_none() {
        wait_for_ctrl_c().await;
        return;
    }

    let received = tokio::select! {
        Some(()) = next(term.as_mut()) => "SIGTERM",
        Some(()) = next(int.as_mut()) => "SIGINT",
        else => "closed signal stream",
    };
    tracing::info!(signal = received, "stopping scan orchestrator");
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!(signal = "ctrl_c", "stopping scan orchestrator"),
        Err(e) => tracing::error!(error = %e, "ctrl_c listener failed, stopping anyway"),
    }
}
