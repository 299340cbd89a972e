//! Response bodies served by the mock scan backend

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// PNG signature followed by filler; the orchestrator never decodes the image
pub const PNG_FRAME: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR frame";

/// Log buffer served as plain text after the switch
pub const SCAN_LOG: &str = "[12:00:01] crawling https://target.example.com/app\n\
[12:00:09] testing login form\n\
[12:00:15] scraping finished";

/// Finished report
pub const REPORT_HTML: &str =
    "<!DOCTYPE html><html><body><h1>Scan report</h1><p>3 findings</p></body></html>";

/// Target scanned in the integration tests
pub const TARGET_URL: &str = "https://target.example.com/app";

/// Launch acknowledgement sent by the backend
pub fn launch_ack() -> serde_json::Value {
    serde_json::json!({"success": true, "message": "Scan started in background"})
}

/// Screenshot reply carrying the finish marker
pub fn finish_message() -> serde_json::Value {
    serde_json::json!({"message": "Scraping finished. Switch to logs."})
}

/// Mount a full, well-behaved backend: `frames` screenshots, then the
/// finish signal, then a plain-text log snapshot and an HTML report.
pub async fn mount_happy_backend(server: &MockServer, frames: u64) {
    Mock::given(method("POST"))
        .and(path("/start_latitude"))
        .respond_with(ResponseTemplate::new(200).set_body_json(launch_ack()))
        .mount(server)
        .await;

    if frames > 0 {
        Mock::given(method("GET"))
            .and(path("/screenshot"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(PNG_FRAME),
            )
            .up_to_n_times(frames)
            .mount(server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/screenshot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(finish_message()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/logs"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/plain; charset=utf-8")
                .set_body_string(SCAN_LOG),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/report"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(REPORT_HTML),
        )
        .mount(server)
        .await;
}

/// Number of requests the server received for `endpoint`
pub async fn request_count(server: &MockServer, endpoint: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == endpoint)
        .count()
}
