mod harvest;

use std::path::PathBuf;
use std::time::Duration;

use clap::{builder::RangedU64ValueParser, Parser, Subcommand};
use mapharvest_export::XlsxExporter;
use mapharvest_scraper::{ChromiumLauncher, HarvestSettings};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "mapharvest-cli")]
#[command(about = "Harvest business listings from a map search into a spreadsheet")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scroll a search results page, visit every card and export the records.
    Harvest {
        /// Map search URL to open.
        #[arg(long)]
        url: String,
        /// Stop after this many records (at least 1). Unlimited when omitted.
        #[arg(long, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
        max_cards: Option<usize>,
        /// Spreadsheet path. Defaults to `<search-name>.xlsx` in the current directory.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Show the browser window.
        #[arg(long)]
        headed: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    let config = mapharvest_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(Commands::Harvest {
            url,
            max_cards,
            output,
            headed,
        }) => {
            let launcher = ChromiumLauncher::new(
                config.headless && !headed,
                Duration::from_secs(config.navigation_timeout_secs),
            );
            let job = harvest::HarvestJob {
                url,
                max_cards,
                output,
                output_dir: PathBuf::from("."),
            };
            let summary = harvest::run_harvest(
                &launcher,
                &HarvestSettings::from_app_config(&config),
                &XlsxExporter::default(),
                &config,
                job,
            )
            .await?;
            println!(
                "harvested {} records ({} cards visited, {} failed); wrote {}",
                summary.records,
                summary.cards_visited,
                summary.cards_failed,
                summary.path.display()
            );
        }
        None => println!("mapharvest-cli: run with --help to see available commands"),
    }

    Ok(())
}
