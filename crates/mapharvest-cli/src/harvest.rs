//! One-shot harvest run: open the search page, harvest it, write a spreadsheet.

use std::path::PathBuf;

use anyhow::Context;
use mapharvest_core::{AppConfig, ProgressEvent, ProgressKind};
use mapharvest_export::ExportAdapter;
use mapharvest_scraper::{harvest, HarvestSettings, PageLauncher};

#[derive(Debug, Clone)]
pub(crate) struct HarvestJob {
    pub url: String,
    /// `None` harvests until the feed stops growing.
    pub max_cards: Option<usize>,
    pub output: Option<PathBuf>,
    /// Where `<search-name>.xlsx` lands when no output path is given.
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HarvestSummary {
    pub records: usize,
    pub cards_visited: usize,
    pub cards_failed: usize,
    pub path: PathBuf,
}

fn log_progress(event: ProgressEvent) {
    match event.kind {
        ProgressKind::Scraped { .. } => {
            tracing::info!(current = event.current, total = %event.total, "{}", event.message);
        }
        ProgressKind::Error => {
            tracing::warn!(current = event.current, total = %event.total, "{}", event.message);
        }
        ProgressKind::Processing | ProgressKind::Scrolling => {
            tracing::debug!(current = event.current, total = %event.total, "{}", event.message);
        }
    }
}

/// Runs a single harvest and writes its records to disk.
///
/// # Errors
///
/// Returns an error if the URL is outside the configured prefix, the page
/// cannot be opened, the harvest fails, nothing was scraped, or the
/// spreadsheet cannot be written. The page is closed on every path after it
/// was opened.
pub(crate) async fn run_harvest(
    launcher: &dyn PageLauncher,
    settings: &HarvestSettings,
    exporter: &dyn ExportAdapter,
    config: &AppConfig,
    job: HarvestJob,
) -> anyhow::Result<HarvestSummary> {
    if !job.url.starts_with(&config.url_prefix) {
        anyhow::bail!(
            "Invalid Google Maps URL: expected a URL starting with {}",
            config.url_prefix
        );
    }

    tracing::info!(url = %job.url, max_cards = ?job.max_cards, "starting harvest");
    let page = launcher
        .open(&job.url)
        .await
        .with_context(|| format!("failed to open {}", job.url))?;

    let result = harvest(&*page, settings, job.max_cards, &log_progress).await;
    if let Err(err) = page.close().await {
        tracing::warn!(error = %err, "failed to close browser");
    }

    let report = result.context("harvest failed")?;
    if report.records.is_empty() {
        anyhow::bail!("No data was scraped from the provided URL");
    }

    let default_name = format!("{}.xlsx", report.search_name);
    let path = job.output.unwrap_or_else(|| job.output_dir.join(default_name));
    exporter.export(&report.records, &path)?;
    tracing::info!(
        records = report.records.len(),
        stop = ?report.stop,
        file = %path.display(),
        "harvest exported"
    );

    Ok(HarvestSummary {
        records: report.records.len(),
        cards_visited: report.cards_visited,
        cards_failed: report.cards_failed,
        path,
    })
}

#[cfg(test)]
#[path = "harvest_test.rs"]
mod tests;
