//! Format engine contract
//!
//! A format engine reads and writes ordered `(name, array)` pairs. Engines
//! only ever see labeled arrays: the session filters out every other kind
//! of value before saving.

use crate::error::EngineResult;
use quiver_core::LabeledArray;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where to read named arrays from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A single file, a directory or a glob pattern
    Path(PathBuf),
    /// An explicit list of files
    Files(Vec<PathBuf>),
}

impl Source {
    /// Path used for engine selection and messages
    pub fn display_path(&self) -> String {
        match self {
            Source::Path(p) => p.display().to_string(),
            Source::Files(files) => files
                .iter()
                .map(|f| f.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Source::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Source::Path(path)
    }
}

/// Options shared by every read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Log and skip members/files that fail to decode instead of failing the read
    pub skip_invalid: bool,
}

/// Reader/writer of named arrays for one file format
///
/// # Thread Safety
///
/// Engines must be `Send + Sync`; a registry is shared between sessions.
pub trait FormatEngine: Send + Sync {
    /// Unique engine identifier (`"bundle"`, `"binary"`, `"csv"`, ...)
    fn engine_id(&self) -> &str;

    /// Read named arrays
    ///
    /// With `names`, only those entries are returned. A requested name that
    /// is absent from the source is an error unless `skip_invalid` is set.
    fn read_named_values(
        &self,
        source: &Source,
        names: Option<&[String]>,
        options: &ReadOptions,
    ) -> EngineResult<Vec<(String, LabeledArray)>>;

    /// Write named arrays
    ///
    /// With `overwrite == false`, entries already stored at `dest` are kept
    /// and same-named entries are replaced.
    fn write_named_values(
        &self,
        dest: &Path,
        items: &[(String, Arc<LabeledArray>)],
        overwrite: bool,
    ) -> EngineResult<()>;

    /// Whether a read returns entries in the order they were written
    fn preserves_order(&self) -> bool {
        true
    }
}

/// Keep only requested names, preserving source order
///
/// Returns the names that were requested but not found.
pub(crate) fn select_names(
    entries: &mut Vec<(String, LabeledArray)>,
    names: Option<&[String]>,
) -> Vec<String> {
    let Some(names) = names else {
        return Vec::new();
    };
    entries.retain(|(name, _)| names.contains(name));
    names
        .iter()
        .filter(|n| !entries.iter().any(|(name, _)| name == *n))
        .cloned()
        .collect()
}

/// Merge `items` into `existing`: same names replaced in place, new names appended
pub(crate) fn merge_entries(
    existing: Vec<(String, LabeledArray)>,
    items: &[(String, Arc<LabeledArray>)],
) -> Vec<(String, LabeledArray)> {
    let mut merged = existing;
    for (name, array) in items {
        match merged.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = (**array).clone(),
            None => merged.push((name.clone(), (**array).clone())),
        }
    }
    merged
}

/// Write a file through a temporary sibling and rename it into place
///
/// Either the complete file is written or no file is left behind.
pub(crate) fn write_atomically<F>(path: &Path, write: F) -> EngineResult<()>
where
    F: FnOnce(&Path) -> EngineResult<()>,
{
    let temp_path = path.with_extension("tmp");

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    match write(&temp_path) {
        Ok(()) => {
            fs::rename(&temp_path, path)?;
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&temp_path);
            Err(e)
        }
    }
}
