//! Shared domain types and configuration for the mapharvest workspace.

pub mod app_config;
pub mod config;
pub mod progress;
pub mod record;

pub use app_config::{AppConfig, Environment};
pub use config::{build_app_config, load_app_config, load_app_config_from_env};
pub use progress::{ProgressEvent, ProgressKind, ProgressTotal};
pub use record::BusinessRecord;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
