use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Process-wide settings shared by the server and the CLI.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Directory where spreadsheet exports are written before download.
    pub export_dir: PathBuf,
    /// Search URLs must start with this prefix to be accepted by `POST /scrape`.
    pub url_prefix: String,
    pub default_max_cards: usize,
    pub max_cards_limit: usize,
    pub headless: bool,
    pub navigation_timeout_secs: u64,
    pub initial_load_delay_ms: u64,
    pub feed_timeout_secs: u64,
    pub detail_timeout_secs: u64,
    pub settle_ms: u64,
    pub scroll_pause_ms: u64,
    pub card_retries: u32,
    /// Undownloaded exports are removed after this many seconds.
    pub download_ttl_secs: u64,
    pub rate_limit_per_minute: usize,
}
