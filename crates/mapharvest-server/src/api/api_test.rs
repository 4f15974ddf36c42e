use std::path::Path as FsPath;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::Request;
use mapharvest_core::build_app_config;
use mapharvest_export::XlsxExporter;
use mapharvest_scraper::testing::{ScriptedLauncher, ScriptedPage};
use mapharvest_scraper::HarvestSettings;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::*;
use crate::middleware::RateLimitState;

const SEARCH_URL: &str = "https://www.google.com/maps/search/pizza+berlin";

fn test_state(launcher: ScriptedLauncher, export_dir: &FsPath) -> AppState {
    let mut config =
        build_app_config(|_| Err(std::env::VarError::NotPresent)).expect("default config");
    config.export_dir = export_dir.to_path_buf();

    AppState {
        config: Arc::new(config),
        settings: Arc::new(HarvestSettings::immediate()),
        launcher: Arc::new(launcher),
        exporter: Arc::new(XlsxExporter::default()),
        exports: ExportStore::new(export_dir, Duration::from_secs(300))
            .with_download_grace(Duration::from_millis(10)),
        events: EventBus::default(),
    }
}

fn app(state: AppState) -> Router {
    build_app(state, RateLimitState::per_minute(100))
}

fn scrape_request(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/scrape")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&bytes).expect("json parse")
}

fn pizza_page(businesses: usize) -> ScriptedPage {
    ScriptedPage::with_businesses(businesses)
        .with_search_label("Results for Pizza Berlin")
        .hides_search_label_on_click()
}

#[test]
fn api_error_validation_error_maps_to_bad_request() {
    let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_returns_ok_and_echoes_request_id() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = test_state(ScriptedLauncher::new(pizza_page(1)), dir.path());

    let response = app(state)
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-request-id").map(|v| v.as_bytes()),
        Some(&b"req-42"[..])
    );
    let json = json_body(response).await;
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["meta"]["request_id"], "req-42");
}

#[tokio::test]
async fn scrape_without_url_is_rejected_before_launch() {
    let dir = tempfile::tempdir().expect("tempdir");
    let launcher = ScriptedLauncher::new(pizza_page(1));
    let state = test_state(launcher.clone(), dir.path());

    let response = app(state)
        .oneshot(scrape_request(&json!({ "maxCards": 5 })))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({ "success": false, "error": "URL is required" })
    );
    assert!(launcher.opened_urls().is_empty());
}

#[tokio::test]
async fn scrape_with_foreign_url_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let launcher = ScriptedLauncher::new(pizza_page(1));
    let state = test_state(launcher.clone(), dir.path());

    let response = app(state)
        .oneshot(scrape_request(&json!({ "url": "https://example.com/maps/" })))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Invalid Google Maps URL");
    assert!(launcher.opened_urls().is_empty());
}

#[tokio::test]
async fn scrape_harvests_exports_and_closes_the_page() {
    let dir = tempfile::tempdir().expect("tempdir");
    let launcher = ScriptedLauncher::new(pizza_page(5));
    let state = test_state(launcher.clone(), dir.path());

    let response = app(state)
        .oneshot(scrape_request(&json!({ "url": SEARCH_URL, "maxCards": 2 })))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Successfully scraped 2 places");
    let data = json["data"].as_array().expect("data array");
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["name"], "Business 1");
    assert_eq!(data[0]["address"], "Business 1 Street 1");
    assert!(data[0]["locationCode"].is_null());

    let filename = json["filename"].as_str().expect("filename");
    assert!(filename.starts_with("pizza-berlin-"), "{filename}");
    assert!(filename.ends_with(".xlsx"), "{filename}");
    assert!(dir.path().join(filename).is_file());

    assert_eq!(launcher.opened_urls(), [SEARCH_URL]);
    assert!(launcher.page().is_closed());
}

#[tokio::test]
async fn scrape_uses_default_cap_for_invalid_max_cards() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = test_state(ScriptedLauncher::new(pizza_page(12)), dir.path());

    let response = app(state)
        .oneshot(scrape_request(&json!({ "url": SEARCH_URL, "maxCards": "lots" })))
        .await
        .expect("response");

    let json = json_body(response).await;
    assert_eq!(json["data"].as_array().map(Vec::len), Some(10));
}

#[tokio::test]
async fn scrape_clamps_max_cards_to_configured_limit() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut state = test_state(ScriptedLauncher::new(pizza_page(8)), dir.path());
    let mut config = (*state.config).clone();
    config.max_cards_limit = 5;
    state.config = Arc::new(config);

    let response = app(state)
        .oneshot(scrape_request(&json!({ "url": SEARCH_URL, "maxCards": 50 })))
        .await
        .expect("response");

    let json = json_body(response).await;
    assert_eq!(json["data"].as_array().map(Vec::len), Some(5));
}

#[tokio::test]
async fn scrape_with_no_results_reports_no_data() {
    let dir = tempfile::tempdir().expect("tempdir");
    let launcher = ScriptedLauncher::new(ScriptedPage::new([0], Vec::new()));
    let state = test_state(launcher.clone(), dir.path());

    let response = app(state)
        .oneshot(scrape_request(&json!({ "url": SEARCH_URL })))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "success": false, "error": "No data was scraped from the provided URL" })
    );
    assert!(launcher.page().is_closed());
}

#[tokio::test]
async fn scrape_navigation_failure_is_a_server_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = test_state(ScriptedLauncher::failing(pizza_page(1)), dir.path());

    let response = app(state)
        .oneshot(scrape_request(&json!({ "url": SEARCH_URL })))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert_eq!(json["success"], false);
    let error = json["error"].as_str().expect("error message");
    assert!(error.starts_with("Scraping failed: "), "{error}");
}

#[tokio::test]
async fn scrape_missing_feed_closes_page_and_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let launcher = ScriptedLauncher::new(pizza_page(3).without_feed());
    let state = test_state(launcher.clone(), dir.path());

    let response = app(state)
        .oneshot(scrape_request(&json!({ "url": SEARCH_URL })))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(launcher.page().is_closed());
}

#[tokio::test]
async fn scrape_publishes_progress_and_completion_events() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = test_state(ScriptedLauncher::new(pizza_page(2)), dir.path());
    let mut rx = state.events.subscribe();

    let response = app(state.clone())
        .oneshot(scrape_request(&json!({ "url": SEARCH_URL, "maxCards": 2 })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let mut progress = 0;
    let mut completion = None;
    while let Ok(event) = rx.try_recv() {
        match event {
            ServerEvent::Progress(_) => progress += 1,
            ServerEvent::Complete(outcome) => completion = Some(outcome),
        }
    }
    // processing + scraped for each of the two cards
    assert_eq!(progress, 4);
    let outcome = completion.expect("completion event");
    assert!(outcome.success);
    assert_eq!(outcome.data.map(|d| d.len()), Some(2));
}

#[tokio::test]
async fn download_streams_export_then_removes_it() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = test_state(ScriptedLauncher::new(pizza_page(1)), dir.path());
    let router = app(state);

    let scraped = router
        .clone()
        .oneshot(scrape_request(&json!({ "url": SEARCH_URL })))
        .await
        .expect("response");
    let filename = json_body(scraped).await["filename"]
        .as_str()
        .expect("filename")
        .to_string();
    let path = dir.path().join(&filename);
    assert!(path.is_file());

    let response = router
        .oneshot(get(&format!("/download/{filename}")))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        format!("attachment; filename=\"{filename}\"").as_str()
    );
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    assert!(bytes.starts_with(b"PK"));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!path.exists());
}

#[tokio::test]
async fn download_of_unknown_file_is_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = test_state(ScriptedLauncher::new(pizza_page(1)), dir.path());

    let response = app(state)
        .oneshot(get("/download/pizza-123.xlsx"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"]["message"], "File not found");
}

#[tokio::test]
async fn download_rejects_names_outside_the_export_pattern() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = test_state(ScriptedLauncher::new(pizza_page(1)), dir.path());

    let response = app(state)
        .oneshot(get("/download/Cargo.toml"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn scrape_is_rate_limited() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = test_state(ScriptedLauncher::new(pizza_page(1)), dir.path());
    let router = build_app(state, RateLimitState::per_minute(1));

    let first = router
        .clone()
        .oneshot(scrape_request(&json!({})))
        .await
        .expect("response");
    assert_eq!(first.status(), StatusCode::BAD_REQUEST);

    let second = router
        .oneshot(scrape_request(&json!({})))
        .await
        .expect("response");
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}
