//! Spreadsheet engine: one worksheet per array
//!
//! Each array is written to a worksheet named after its entry, using the
//! same header layout as the csv engine (axis names in the first row, the
//! labels of the last axis across, the leading labels down). Values are
//! stored as numbers or booleans; NaN is an empty cell and infinities are
//! written as text.
//!
//! Workbooks are read with `calamine` (`.xlsx`, `.xlsm`, `.xls`) and written
//! with `rust_xlsxwriter` (`.xlsx` only). Sheet order is preserved. Titles
//! are not stored, and the element type is inferred on read as it is for
//! csv files, so a float array holding only whole numbers comes back as
//! integers.

use crate::engine::{merge_entries, select_names, write_atomically, FormatEngine, ReadOptions, Source};
use crate::error::{EngineError, EngineResult};
use crate::table::{check_encodable, data_rows, decode_rows, format_cell, header_row};
use calamine::{open_workbook_auto, Data, Reader};
use quiver_core::{Dtype, LabeledArray};
use rust_xlsxwriter::{Workbook, Worksheet};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Engine identifier
pub const EXCEL_ENGINE_ID: &str = "excel";

/// Longest worksheet name a workbook accepts
const MAX_SHEET_NAME_LEN: usize = 31;

/// Workbook engine
#[derive(Debug, Clone, Copy, Default)]
pub struct ExcelEngine;

impl ExcelEngine {
    /// Read every worksheet of `path`, in workbook order
    ///
    /// With `skip_invalid`, sheets that do not hold an array are logged and
    /// skipped.
    pub fn read_workbook(path: &Path, skip_invalid: bool) -> EngineResult<Vec<(String, LabeledArray)>> {
        let mut workbook = open_workbook_auto(path)?;
        let mut out = Vec::new();
        for sheet in workbook.sheet_names() {
            let decoded = workbook
                .worksheet_range(&sheet)
                .map_err(EngineError::from)
                .and_then(|range| {
                    let file = format!("{}[{}]", path.display(), sheet);
                    let pad = range.start().map_or(0, |(_, col)| col as usize);
                    let rows = range.rows().map(|row| {
                        let mut cells = vec![String::new(); pad];
                        for cell in row {
                            cells.push(cell_text(cell).ok_or_else(|| {
                                EngineError::decode(&file, format!("error cell {}", cell))
                            })?);
                        }
                        Ok::<_, EngineError>(cells)
                    });
                    decode_rows(&file, rows)
                });
            match decoded {
                Ok(array) => out.push((sheet, array)),
                Err(e) if skip_invalid => {
                    warn!(
                        target: "quiver::durability",
                        path = %path.display(),
                        sheet = %sheet,
                        error = %e,
                        "Skipping invalid worksheet"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }

    /// Write `entries` to a new workbook at `path`
    pub fn write_workbook<'a, I>(path: &Path, entries: I) -> EngineResult<()>
    where
        I: IntoIterator<Item = (&'a str, &'a LabeledArray)>,
    {
        let entries: Vec<(&str, &LabeledArray)> = entries.into_iter().collect();
        let mut seen: Vec<String> = Vec::with_capacity(entries.len());
        for (name, array) in &entries {
            check_sheet_name(name)?;
            check_encodable(array, name)?;
            let folded = name.to_lowercase();
            if seen.contains(&folded) {
                return Err(EngineError::encode(format!(
                    "'{}' clashes with another sheet name (names are case-insensitive)",
                    name
                )));
            }
            seen.push(folded);
        }

        let mut workbook = Workbook::new();
        for (name, array) in &entries {
            let sheet = workbook.add_worksheet();
            sheet
                .set_name(*name)
                .map_err(|e| EngineError::encode(format!("sheet '{}': {}", name, e)))?;
            write_sheet(sheet, array)?;
        }
        write_atomically(path, |temp_path| {
            workbook.save(temp_path)?;
            Ok(())
        })
    }
}

impl FormatEngine for ExcelEngine {
    fn engine_id(&self) -> &str {
        EXCEL_ENGINE_ID
    }

    fn read_named_values(
        &self,
        source: &Source,
        names: Option<&[String]>,
        options: &ReadOptions,
    ) -> EngineResult<Vec<(String, LabeledArray)>> {
        let Source::Path(path) = source else {
            return Err(EngineError::InvalidSource(format!(
                "excel engine reads a single workbook, got [{}]",
                source.display_path()
            )));
        };

        let mut entries = Self::read_workbook(path, options.skip_invalid)?;
        for name in select_names(&mut entries, names) {
            if !options.skip_invalid {
                return Err(EngineError::MissingEntry(name));
            }
            warn!(target: "quiver::durability", name = %name, path = %path.display(), "Requested entry not in workbook");
        }
        debug!(target: "quiver::durability", path = %path.display(), entries = entries.len(), "Read workbook");
        Ok(entries)
    }

    fn write_named_values(
        &self,
        dest: &Path,
        items: &[(String, Arc<LabeledArray>)],
        overwrite: bool,
    ) -> EngineResult<()> {
        let is_xlsx = dest
            .extension()
            .map_or(true, |ext| ext.eq_ignore_ascii_case("xlsx"));
        if !is_xlsx {
            return Err(EngineError::encode(format!(
                "{}: workbooks can only be written as .xlsx",
                dest.display()
            )));
        }

        if overwrite || !dest.exists() {
            Self::write_workbook(dest, items.iter().map(|(n, a)| (n.as_str(), &**a)))?;
            debug!(target: "quiver::durability", path = %dest.display(), entries = items.len(), "Wrote workbook");
            return Ok(());
        }

        let merged = merge_entries(Self::read_workbook(dest, false)?, items);
        Self::write_workbook(dest, merged.iter().map(|(n, a)| (n.as_str(), a)))?;
        debug!(target: "quiver::durability", path = %dest.display(), entries = merged.len(), "Updated workbook");
        Ok(())
    }
}

fn check_sheet_name(name: &str) -> EngineResult<()> {
    let invalid = name.trim().is_empty()
        || name.chars().count() > MAX_SHEET_NAME_LEN
        || name.contains(['[', ']', ':', '*', '?', '/', '\\'])
        || name.starts_with('\'')
        || name.ends_with('\'');
    if invalid {
        return Err(EngineError::encode(format!(
            "'{}' cannot be used as a worksheet name",
            name
        )));
    }
    Ok(())
}

fn column(index: usize) -> EngineResult<u16> {
    u16::try_from(index).map_err(|_| EngineError::encode(format!("column {} out of range", index)))
}

fn row_number(index: usize) -> EngineResult<u32> {
    u32::try_from(index).map_err(|_| EngineError::encode(format!("row {} out of range", index)))
}

fn write_sheet(sheet: &mut Worksheet, array: &LabeledArray) -> EngineResult<()> {
    for (col, cell) in header_row(array).iter().enumerate() {
        sheet.write_string(0, column(col)?, cell)?;
    }
    for (i, row) in data_rows(array).into_iter().enumerate() {
        let r = row_number(i + 1)?;
        for (col, label) in row.labels.iter().enumerate() {
            if !label.is_empty() {
                sheet.write_string(r, column(col)?, label)?;
            }
        }
        let offset = row.labels.len();
        for (j, value) in row.values.iter().enumerate() {
            if value.is_nan() {
                continue;
            }
            let c = column(offset + j)?;
            match array.dtype() {
                Dtype::Bool => {
                    sheet.write_boolean(r, c, *value != 0.0)?;
                }
                _ if value.is_infinite() => {
                    sheet.write_string(r, c, format_cell(*value, Dtype::Float))?;
                }
                _ => {
                    sheet.write_number(r, c, *value)?;
                }
            }
        }
    }
    Ok(())
}

/// Text of a cell as the table decoder expects it; `None` for error cells
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => Some(String::new()),
        Data::String(s) => Some(s.clone()),
        Data::Int(v) => Some(v.to_string()),
        Data::Float(v) => Some(v.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::Error(_) => None,
        other => Some(other.to_string()),
    }
}
