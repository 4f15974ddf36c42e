//! Spreadsheet export of harvested business records.

pub mod files;
pub mod xlsx;

use std::path::{Path, PathBuf};

use mapharvest_core::BusinessRecord;
use thiserror::Error;

pub use files::{cleanup_stale_exports, export_filename, is_generated_export};
pub use xlsx::{XlsxExporter, DEFAULT_SHEET_NAME};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write spreadsheet {path}: {source}")]
    Xlsx {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },

    #[error("{rows} records exceed the worksheet row limit")]
    TooManyRows { rows: usize },
}

/// Persists a finished record set as a tabular file.
///
/// Implementations write one header row followed by one row per record, in
/// input order, and never modify the records.
pub trait ExportAdapter: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ExportError`] if the file cannot be produced.
    fn export(&self, records: &[BusinessRecord], path: &Path) -> Result<(), ExportError>;
}
