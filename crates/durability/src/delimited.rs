//! Delimited text engine: one `.csv` file per array
//!
//! ## Layout
//!
//! A session is written to a directory holding `<name>.csv` for each array.
//! The first row names the axes; the last leading header cell joins the last
//! two axis names with a backslash and is followed by the labels of the last
//! axis:
//!
//! ```text
//! a,b\c,c0,c1
//! a0,b0,0,1
//! a0,b1,2,3
//! ```
//!
//! Saving only ever touches the files of the entries being written; other
//! files in the directory are left alone. Entry names become file stems, so
//! a name holding a path separator or a relative component is rejected.
//!
//! ## Reading
//!
//! The source can be a directory (every `*.csv` in it), a glob pattern, a
//! single file or an explicit file list. The entry name is the file stem.
//! Files carry no ordering, so entries are returned sorted by name.
//! Titles are not stored.

use crate::engine::{write_atomically, FormatEngine, ReadOptions, Source};
use crate::error::{EngineError, EngineResult};
use crate::table::{check_encodable, data_rows, decode_rows, format_cell, header_row};
use quiver_core::LabeledArray;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Engine identifier
pub const CSV_ENGINE_ID: &str = "csv";

const CSV_EXTENSION: &str = "csv";

/// Directory-of-CSV-files engine
#[derive(Debug, Clone, Copy)]
pub struct CsvEngine {
    delimiter: u8,
}

impl CsvEngine {
    /// Create an engine using `delimiter` between fields
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Field delimiter
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Write one array to `path`
    pub fn write_array(&self, path: &Path, array: &LabeledArray) -> EngineResult<()> {
        check_encodable(array, &path.display().to_string())?;

        write_atomically(path, |temp_path| {
            let mut writer = csv::WriterBuilder::new()
                .delimiter(self.delimiter)
                .flexible(true)
                .from_path(temp_path)?;

            writer.write_record(header_row(array))?;
            for row in data_rows(array) {
                let mut record = row.labels;
                record.extend(row.values.iter().map(|v| format_cell(*v, array.dtype())));
                writer.write_record(&record)?;
            }
            writer.flush()?;
            Ok(())
        })
    }

    /// Read one array from `path`
    pub fn read_array(&self, path: &Path) -> EngineResult<LabeledArray> {
        let file = path.display().to_string();
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;

        let rows = reader.records().map(|record| {
            record
                .map(|r| r.iter().map(String::from).collect::<Vec<_>>())
                .map_err(EngineError::from)
        });
        decode_rows(&file, rows)
    }

    fn resolve_files(source: &Source) -> EngineResult<Vec<PathBuf>> {
        match source {
            Source::Files(files) => Ok(files.clone()),
            Source::Path(path) if path.is_dir() => {
                let mut files = Vec::new();
                for entry in fs::read_dir(path)? {
                    let entry_path = entry?.path();
                    if entry_path.is_file() && has_csv_extension(&entry_path) {
                        files.push(entry_path);
                    }
                }
                Ok(files)
            }
            Source::Path(path) if is_pattern(path) => {
                let pattern = path.display().to_string();
                let paths = glob::glob(&pattern)
                    .map_err(|e| EngineError::InvalidSource(format!("{}: {}", pattern, e)))?;
                let mut files = Vec::new();
                for entry in paths {
                    let entry_path = entry.map_err(|e| EngineError::Io(e.into_error()))?;
                    if entry_path.is_file() {
                        files.push(entry_path);
                    }
                }
                Ok(files)
            }
            Source::Path(path) if path.is_file() => Ok(vec![path.clone()]),
            Source::Path(path) => Err(EngineError::InvalidSource(format!(
                "{} is neither a file, a directory nor a matching pattern",
                path.display()
            ))),
        }
    }
}

impl Default for CsvEngine {
    fn default() -> Self {
        Self::new(b',')
    }
}

impl FormatEngine for CsvEngine {
    fn engine_id(&self) -> &str {
        CSV_ENGINE_ID
    }

    fn read_named_values(
        &self,
        source: &Source,
        names: Option<&[String]>,
        options: &ReadOptions,
    ) -> EngineResult<Vec<(String, LabeledArray)>> {
        let mut files: Vec<(String, PathBuf)> = Self::resolve_files(source)?
            .into_iter()
            .filter_map(|path| {
                let stem = path.file_stem()?.to_string_lossy().to_string();
                Some((stem, path))
            })
            .collect();
        files.sort_by(|a, b| a.0.cmp(&b.0));

        if let Some(names) = names {
            files.retain(|(name, _)| names.contains(name));
            for name in names {
                if files.iter().any(|(n, _)| n == name) {
                    continue;
                }
                if !options.skip_invalid {
                    return Err(EngineError::MissingEntry(name.clone()));
                }
                warn!(target: "quiver::durability", name = %name, "No csv file for requested entry");
            }
        }

        let mut out = Vec::with_capacity(files.len());
        for (name, path) in files {
            match self.read_array(&path) {
                Ok(array) => out.push((name, array)),
                Err(e) if options.skip_invalid => {
                    warn!(
                        target: "quiver::durability",
                        path = %path.display(),
                        error = %e,
                        "Skipping invalid csv file"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        debug!(target: "quiver::durability", source = %source.display_path(), entries = out.len(), "Read csv files");
        Ok(out)
    }

    /// Write one `<name>.csv` per entry into the directory `dest`
    ///
    /// Every entry is its own file, so `overwrite` has no effect: files of
    /// other names already in `dest` are kept.
    fn write_named_values(
        &self,
        dest: &Path,
        items: &[(String, Arc<LabeledArray>)],
        _overwrite: bool,
    ) -> EngineResult<()> {
        if dest.is_file() {
            return Err(EngineError::InvalidSource(format!(
                "{} is a file, csv output needs a directory",
                dest.display()
            )));
        }
        for (name, _) in items {
            check_file_stem(name)?;
        }
        fs::create_dir_all(dest)?;

        for (name, array) in items {
            let path = dest.join(format!("{}.{}", name, CSV_EXTENSION));
            self.write_array(&path, array)?;
        }
        debug!(target: "quiver::durability", path = %dest.display(), entries = items.len(), "Wrote csv directory");
        Ok(())
    }

    fn preserves_order(&self) -> bool {
        false
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case(CSV_EXTENSION))
        .unwrap_or(false)
}

fn is_pattern(path: &Path) -> bool {
    path.to_string_lossy().contains(['*', '?', '['])
}

/// Entry names become file stems: a single plain path component only
fn check_file_stem(name: &str) -> EngineResult<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
        || name.contains(std::path::MAIN_SEPARATOR);
    if invalid {
        return Err(EngineError::encode(format!(
            "'{}' cannot be used as a csv file name",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiver_core::{Axis, Dtype};

    fn arr3() -> LabeledArray {
        LabeledArray::sequence(vec![Axis::range("a", 2), Axis::range("b", 2), Axis::range("c", 3)])
    }

    #[test]
    fn test_layout_of_two_dimensional_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("e.csv");
        let array = LabeledArray::sequence(vec![Axis::range("a", 2), Axis::range("b", 3)]);
        CsvEngine::default().write_array(&path, &array).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["a\\b,b0,b1,b2", "a0,0,1,2", "a1,3,4,5"]);
    }

    #[test]
    fn test_array_roundtrip_by_dimension() {
        let dir = tempfile::tempdir().unwrap();
        let engine = CsvEngine::default();

        let one_d =
            LabeledArray::from_floats(vec![Axis::range("a", 3)], vec![0.5, f64::NAN, -2.0]).unwrap();
        let bools =
            LabeledArray::from_bools(vec![Axis::range("x", 2)], vec![true, false]).unwrap();
        for (i, array) in [one_d, bools, arr3()].iter().enumerate() {
            let path = dir.path().join(format!("a{}.csv", i));
            engine.write_array(&path, array).unwrap();
            let back = engine.read_array(&path).unwrap();
            assert_eq!(back.axes(), array.axes());
            assert_eq!(back.dtype(), array.dtype());
            assert!(back.equals(array, true));
        }
    }

    #[test]
    fn test_zero_dimensional_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = CsvEngine::default()
            .write_array(&dir.path().join("s.csv"), &LabeledArray::scalar(Dtype::Int, 1.0));
        assert!(matches!(result, Err(EngineError::Encode(_))));
    }

    #[test]
    fn test_directory_read_sorted_and_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("session");
        let items: Vec<(String, Arc<LabeledArray>)> = ["g", "e", "f"]
            .iter()
            .map(|n| (n.to_string(), Arc::new(LabeledArray::sequence(vec![Axis::range("a", 2)]))))
            .collect();
        let engine = CsvEngine::default();
        engine.write_named_values(&out, &items, true).unwrap();

        let read = engine
            .read_named_values(&Source::Path(out.clone()), None, &ReadOptions::default())
            .unwrap();
        let names: Vec<&str> = read.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["e", "f", "g"]);

        let pattern = out.join("*.csv");
        let read = engine
            .read_named_values(&Source::Path(pattern.clone()), None, &ReadOptions::default())
            .unwrap();
        assert_eq!(read.len(), 3);

        fs::write(out.join("invalid.csv"), ",\",").unwrap();
        assert!(engine
            .read_named_values(&Source::Path(pattern.clone()), None, &ReadOptions::default())
            .is_err());
        let read = engine
            .read_named_values(&Source::Path(pattern), None, &ReadOptions { skip_invalid: true })
            .unwrap();
        let names: Vec<&str> = read.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["e", "f", "g"]);
    }

    #[test]
    fn test_save_leaves_other_files_alone() {
        let dir = tempfile::tempdir().unwrap();
        let engine = CsvEngine::default();
        let one = |n: &str| (n.to_string(), Arc::new(LabeledArray::sequence(vec![Axis::range("a", 1)])));
        fs::write(dir.path().join("notes.csv"), "kept").unwrap();
        fs::write(dir.path().join("readme.txt"), "kept").unwrap();

        engine.write_named_values(dir.path(), &[one("x"), one("y")], true).unwrap();
        engine.write_named_values(dir.path(), &[one("z")], true).unwrap();
        engine.write_named_values(dir.path(), &[one("y")], false).unwrap();

        for file in ["notes.csv", "readme.txt", "x.csv", "y.csv", "z.csv"] {
            assert!(dir.path().join(file).exists(), "{} was removed", file);
        }
        assert_eq!(fs::read_to_string(dir.path().join("notes.csv")).unwrap(), "kept");
    }

    #[test]
    fn test_entry_names_stay_inside_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out");
        let engine = CsvEngine::default();
        let array = Arc::new(LabeledArray::sequence(vec![Axis::range("a", 2)]));

        for name in ["../../escaped", "../up", "sub/inner", "back\\slash", "..", ".", ""] {
            let items = vec![("ok".to_string(), array.clone()), (name.to_string(), array.clone())];
            let result = engine.write_named_values(&out, &items, true);
            assert!(matches!(result, Err(EngineError::Encode(_))), "{:?} accepted", name);
        }
        assert!(!dir.path().join("escaped.csv").exists());
        assert!(!dir.path().join("nested").join("up.csv").exists());
        assert!(!out.join("ok.csv").exists());
    }

    #[test]
    fn test_custom_delimiter_and_inference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.csv");
        fs::write(&path, "a;b\\c;c0;c1\na0;b0;1;\na0;b1;2.5;3\n").unwrap();
        let array = CsvEngine::new(b';').read_array(&path).unwrap();
        assert_eq!(array.dtype(), Dtype::Float);
        assert_eq!(array.axis_names(), vec!["a", "b", "c"]);
        assert_eq!(array.get(&["a0", "b1", "c0"]), Some(2.5));
        assert!(array.get(&["a0", "b0", "c1"]).unwrap().is_nan());
    }

    #[test]
    fn test_file_list_source() {
        let dir = tempfile::tempdir().unwrap();
        let engine = CsvEngine::default();
        let p1 = dir.path().join("b.csv");
        let p2 = dir.path().join("a.csv");
        engine.write_array(&p1, &arr3()).unwrap();
        engine.write_array(&p2, &arr3()).unwrap();

        let read = engine
            .read_named_values(&Source::Files(vec![p1, p2]), None, &ReadOptions::default())
            .unwrap();
        let names: Vec<&str> = read.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
