//! Watch a scan session from launch to report
//!
//! Starts one scan, prints every orchestrator event as it arrives, and writes
//! the HTML report to disk once the scan completes.
//!
//! ```bash
//! RUST_LOG=dast_orchestrator=debug \
//!     cargo run --example watch_scan -- https://target.example.com admin secret
//! ```
//!
//! Set `DAST_BACKEND_URL` to point at a backend other than `http://localhost:8000`,
//! or `DAST_CONFIG` to load a JSON configuration file.

use dast_orchestrator::{Config, Credentials, Event, ScanOrchestrator};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dast_orchestrator=info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let target = args
        .next()
        .ok_or("usage: watch_scan <target-url> [username] [password]")?
        .parse()?;
    let username = args.next().unwrap_or_default();
    let password = args.next().unwrap_or_default();

    let mut config = match std::env::var("DAST_CONFIG") {
        Ok(path) => Config::from_json_file(path)?,
        Err(_) => Config::default(),
    };
    if let Ok(base_url) = std::env::var("DAST_BACKEND_URL") {
        config.backend.base_url = base_url;
    }

    let orchestrator = ScanOrchestrator::new(config)?;
    let mut events = orchestrator.subscribe();

    let id = orchestrator
        .start_session(target, Credentials::new(username, password))
        .await?;
    println!("▶ Session #{id} scanning");

    while let Ok(event) = events.recv().await {
        match event {
            Event::ScreenshotUpdated { bytes, .. } => {
                println!("🖼  Screenshot ({bytes} bytes)");
            }
            Event::FeedSwitched { mode, .. } => {
                println!("⇄ Feed switched to {mode}");
            }
            Event::LogsUpdated { lines, .. } => {
                println!("📜 Logs received ({lines} lines)");
                if let Some(feed) = orchestrator.snapshot().await.feed {
                    for line in feed.log_text.lines() {
                        println!("   {line}");
                    }
                }
            }
            Event::PollFailed { feed, error, .. } => {
                println!("⚠ {feed} poll failed: {error}");
            }
            Event::Progress { percent, .. } => {
                println!("… {percent:.1}%");
            }
            Event::StageChanged { label, .. } => {
                println!("➜ {label}");
            }
            Event::ScanComplete { .. } => {
                println!("✓ Scan complete");
                break;
            }
            _ => {}
        }
    }

    match orchestrator.fetch_report().await? {
        Some(html) => {
            let path = format!("scan-report-{id}.html");
            std::fs::write(&path, html)?;
            println!("✓ Report written to {path}");
        }
        None => println!("✗ No report available"),
    }

    orchestrator.shutdown().await?;
    Ok(())
}
