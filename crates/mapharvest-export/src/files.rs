//! Naming and housekeeping for export files in a shared directory.

use std::io;
use std::path::Path;

/// `<search-name>-<unix-millis>.xlsx`.
#[must_use]
pub fn export_filename(search_name: &str, unix_millis: i64) -> String {
    format!("{search_name}-{unix_millis}.xlsx")
}

/// Whether `name` looks like a file this service produced: a bare file name
/// (no separators, not hidden) ending in `.xlsx` and containing a `-`.
///
/// Used both to pick stale files for cleanup and to validate download
/// requests, so it must reject anything that could escape the export directory.
#[must_use]
pub fn is_generated_export(name: &str) -> bool {
    let bare = !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.contains("..");
    bare && name.ends_with(".xlsx") && name.contains('-')
}

/// Deletes every generated export in `dir`. A missing directory is not an
/// error. Returns the number of files removed.
///
/// # Errors
///
/// Returns an I/O error if `dir` exists but cannot be read. Failures to
/// remove individual files are logged and skipped.
pub fn cleanup_stale_exports(dir: &Path) -> io::Result<usize> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(err),
    };

    let mut removed = 0;
    for entry in entries {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if !is_generated_export(&name) || !entry.file_type()?.is_file() {
            continue;
        }
        match std::fs::remove_file(entry.path()) {
            Ok(()) => {
                tracing::info!(file = %name, "removed stale export");
                removed += 1;
            }
            Err(err) => tracing::warn!(file = %name, error = %err, "failed to remove stale export"),
        }
    }
    Ok(removed)
}
