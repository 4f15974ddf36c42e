mod api;
mod exports;
mod middleware;

use std::sync::Arc;
use std::time::Duration;

use mapharvest_export::XlsxExporter;
use mapharvest_scraper::{ChromiumLauncher, HarvestSettings};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState, EventBus},
    exports::ExportStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(mapharvest_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let exports = ExportStore::new(
        config.export_dir.clone(),
        Duration::from_secs(config.download_ttl_secs),
    );
    exports.prepare().await?;
    exports.cleanup_stale().await;

    let launcher = ChromiumLauncher::new(
        config.headless,
        Duration::from_secs(config.navigation_timeout_secs),
    );
    let state = AppState {
        settings: Arc::new(HarvestSettings::from_app_config(&config)),
        launcher: Arc::new(launcher),
        exporter: Arc::new(XlsxExporter::default()),
        exports: exports.clone(),
        events: EventBus::default(),
        config: Arc::clone(&config),
    };
    let app = build_app(state, default_rate_limit_state(&config));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        addr = %config.bind_addr,
        env = %config.env,
        export_dir = %config.export_dir.display(),
        "mapharvest server listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    exports.cleanup_stale().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
