use std::path::Path;

use mapharvest_core::BusinessRecord;
use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::{ExportAdapter, ExportError};

pub const DEFAULT_SHEET_NAME: &str = "Google Maps Data";

/// Excel rows are addressed with `u32` and capped at 2^20 per sheet.
const MAX_ROWS: usize = 1_048_576;

/// Writes records to a single-sheet `.xlsx` workbook.
#[derive(Debug, Clone)]
pub struct XlsxExporter {
    sheet_name: String,
}

impl Default for XlsxExporter {
    fn default() -> Self {
        Self::new(DEFAULT_SHEET_NAME)
    }
}

impl XlsxExporter {
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
        }
    }

    fn build(&self, records: &[BusinessRecord]) -> Result<Workbook, XlsxError> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();
        let sheet = workbook.add_worksheet();
        sheet.set_name(&self.sheet_name)?;

        for (row, cells) in (0u32..).zip(rows(records)) {
            for (col, value) in (0u16..).zip(cells) {
                if row == 0 {
                    sheet.write_string_with_format(row, col, value, &header)?;
                } else if !value.is_empty() {
                    // Absent fields stay blank cells.
                    sheet.write_string(row, col, value)?;
                }
            }
        }

        Ok(workbook)
    }
}

/// Sheet contents: the header row, then one row per record in input order.
fn rows(records: &[BusinessRecord]) -> impl Iterator<Item = [&str; 5]> {
    std::iter::once(BusinessRecord::COLUMNS).chain(records.iter().map(BusinessRecord::cells))
}

impl ExportAdapter for XlsxExporter {
    fn export(&self, records: &[BusinessRecord], path: &Path) -> Result<(), ExportError> {
        if records.len() >= MAX_ROWS {
            return Err(ExportError::TooManyRows {
                rows: records.len(),
            });
        }

        let wrap = |source| ExportError::Xlsx {
            path: path.to_path_buf(),
            source,
        };
        let mut workbook = self.build(records).map_err(wrap)?;
        workbook.save(path).map_err(wrap)?;

        tracing::info!(
            path = %path.display(),
            rows = records.len(),
            "wrote spreadsheet"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_start_with_header_and_keep_record_order() {
        let records = [
            BusinessRecord {
                address: Some("A1".to_string()),
                ..BusinessRecord::named("N1")
            },
            BusinessRecord {
                website: Some("n2.example".to_string()),
                location_code: Some("7HQM+2F".to_string()),
                ..BusinessRecord::named("N2")
            },
        ];

        let sheet: Vec<[&str; 5]> = rows(&records).collect();

        assert_eq!(
            sheet,
            [
                ["name", "address", "website", "phone", "locationCode"],
                ["N1", "A1", "", "", ""],
                ["N2", "", "n2.example", "", "7HQM+2F"],
            ]
        );
    }

    #[test]
    fn rows_for_no_records_are_header_only() {
        assert_eq!(rows(&[]).count(), 1);
    }

    #[test]
    fn invalid_sheet_name_is_an_export_error() {
        let exporter = XlsxExporter::new("bad/name");
        let dir = std::env::temp_dir();
        let err = exporter
            .export(&[], &dir.join("never-written-either.xlsx"))
            .expect_err("sheet names cannot contain '/'");
        assert!(matches!(err, ExportError::Xlsx { .. }));
    }
}
