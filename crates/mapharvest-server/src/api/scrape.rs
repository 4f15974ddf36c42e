use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use mapharvest_core::BusinessRecord;
use mapharvest_export::{export_filename, ExportError};
use mapharvest_scraper::{harvest, HarvestError, PageError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::{AppState, ServerEvent};

const NO_DATA: &str = "No data was scraped from the provided URL";

#[derive(Debug, Deserialize)]
pub(super) struct ScrapeRequest {
    url: Option<String>,
    /// Number or numeric string; anything else falls back to the default.
    #[serde(rename = "maxCards")]
    max_cards: Option<Value>,
}

/// Body of a `POST /scrape` response and payload of the `scraping-complete` event.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<BusinessRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScrapeOutcome {
    fn succeeded(records: Vec<BusinessRecord>, filename: String) -> Self {
        Self {
            success: true,
            message: Some(format!("Successfully scraped {} places", records.len())),
            data: Some(records),
            filename: Some(filename),
            error: None,
        }
    }

    pub(super) fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            filename: None,
            message: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Error)]
enum ScrapeError {
    #[error(transparent)]
    Launch(#[from] PageError),
    #[error(transparent)]
    Harvest(#[from] HarvestError),
}

#[derive(Debug, Error)]
enum ExportFailure {
    #[error("could not prepare export directory: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("export task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

struct Harvested {
    records: Vec<BusinessRecord>,
    search_name: String,
}

pub(super) async fn scrape(
    State(state): State<AppState>,
    body: Result<Json<ScrapeRequest>, JsonRejection>,
) -> (StatusCode, Json<ScrapeOutcome>) {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return reject(format!("Invalid request body: {}", rejection.body_text()));
        }
    };

    let url = match validate_url(request.url.as_deref(), &state.config.url_prefix) {
        Ok(url) => url.to_owned(),
        Err(message) => return reject(message),
    };
    let cap = resolve_max_cards(
        request.max_cards.as_ref(),
        state.config.default_max_cards,
        state.config.max_cards_limit,
    );
    tracing::info!(url = %url, cap, "scrape requested");

    let harvested = match harvest_url(&state, &url, cap).await {
        Ok(harvested) => harvested,
        Err(err) => {
            tracing::error!(url = %url, error = %err, "scrape failed");
            return complete(
                &state,
                StatusCode::INTERNAL_SERVER_ERROR,
                ScrapeOutcome::failure(format!("Scraping failed: {err}")),
            );
        }
    };

    if harvested.records.is_empty() {
        tracing::info!(url = %url, "scrape produced no records");
        return complete(&state, StatusCode::OK, ScrapeOutcome::failure(NO_DATA));
    }

    match export(&state, &harvested).await {
        Ok(filename) => {
            tracing::info!(
                url = %url,
                records = harvested.records.len(),
                filename = %filename,
                "scrape complete"
            );
            complete(
                &state,
                StatusCode::OK,
                ScrapeOutcome::succeeded(harvested.records, filename),
            )
        }
        Err(err) => {
            tracing::error!(url = %url, error = %err, "export failed");
            let outcome = ScrapeOutcome {
                data: Some(harvested.records),
                ..ScrapeOutcome::failure(format!("Export failed: {err}"))
            };
            complete(&state, StatusCode::INTERNAL_SERVER_ERROR, outcome)
        }
    }
}

fn reject(message: impl Into<String>) -> (StatusCode, Json<ScrapeOutcome>) {
    (StatusCode::BAD_REQUEST, Json(ScrapeOutcome::failure(message)))
}

fn complete(
    state: &AppState,
    status: StatusCode,
    outcome: ScrapeOutcome,
) -> (StatusCode, Json<ScrapeOutcome>) {
    state.events.publish(ServerEvent::Complete(outcome.clone()));
    (status, Json(outcome))
}

/// Opens the page, harvests it and closes it again on every path.
async fn harvest_url(state: &AppState, url: &str, cap: usize) -> Result<Harvested, ScrapeError> {
    let page = state.launcher.open(url).await?;

    let result = harvest(&*page, &state.settings, Some(cap), &state.events).await;

    if let Err(err) = page.close().await {
        tracing::warn!(error = %err, "failed to close browser");
    }

    let report = result?;
    Ok(Harvested {
        records: report.records,
        search_name: report.search_name,
    })
}

async fn export(state: &AppState, harvested: &Harvested) -> Result<String, ExportFailure> {
    state.exports.prepare().await?;

    let filename = export_filename(&harvested.search_name, Utc::now().timestamp_millis());
    let path = state.exports.dir().join(&filename);

    let exporter = Arc::clone(&state.exporter);
    let rows = harvested.records.clone();
    let target = path.clone();
    tokio::task::spawn_blocking(move || exporter.export(&rows, &target)).await??;

    state.exports.expire_later(path);
    Ok(filename)
}

fn validate_url<'a>(url: Option<&'a str>, prefix: &str) -> Result<&'a str, &'static str> {
    let url = url
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or("URL is required")?;
    if !url.starts_with(prefix) {
        return Err("Invalid Google Maps URL");
    }
    Ok(url)
}

/// Positive numbers (or numeric strings) are truncated to an integer; anything
/// else yields `default`. The result never exceeds `limit`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(super) fn resolve_max_cards(raw: Option<&Value>, default: usize, limit: usize) -> usize {
    let requested = raw
        .and_then(|value| match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .filter(|n| n.is_finite() && *n >= 1.0)
        // Finite and >= 1, so the cast saturates at worst.
        .map_or(default, |n| n.trunc() as usize);
    requested.min(limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn max_cards_defaults_when_missing_or_invalid() {
        let invalid = [
            None,
            Some(json!(null)),
            Some(json!("abc")),
            Some(json!(0)),
            Some(json!(-4)),
            Some(json!(0.5)),
            Some(json!(true)),
        ];
        for raw in invalid {
            assert_eq!(resolve_max_cards(raw.as_ref(), 10, 100), 10, "{raw:?}");
        }
    }

    #[test]
    fn max_cards_accepts_numbers_and_numeric_strings() {
        assert_eq!(resolve_max_cards(Some(&json!(25)), 10, 100), 25);
        assert_eq!(resolve_max_cards(Some(&json!("7")), 10, 100), 7);
        assert_eq!(resolve_max_cards(Some(&json!(3.9)), 10, 100), 3);
    }

    #[test]
    fn max_cards_is_clamped_to_limit() {
        assert_eq!(resolve_max_cards(Some(&json!(500)), 10, 100), 100);
        assert_eq!(resolve_max_cards(Some(&json!(1e300)), 10, 100), 100);
    }

    #[test]
    fn url_validation_messages() {
        let prefix = "https://www.google.com/maps/";
        assert_eq!(validate_url(None, prefix), Err("URL is required"));
        assert_eq!(validate_url(Some("  "), prefix), Err("URL is required"));
        assert_eq!(
            validate_url(Some("https://maps.example.com/search"), prefix),
            Err("Invalid Google Maps URL")
        );
        assert_eq!(
            validate_url(Some("https://www.google.com/maps/search/pizza"), prefix),
            Ok("https://www.google.com/maps/search/pizza")
        );
    }
}
