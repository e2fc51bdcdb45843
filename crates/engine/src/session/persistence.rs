//! Load and save through format engines
//!
//! The engine is picked by identifier, or from the file extension when the
//! identifier is `"auto"` (see [`EngineRegistry`](quiver_durability::EngineRegistry)).
//! Only array entries are saved; other values are skipped.
//!
//! # Trust
//!
//! The `binary` engine (`.pkl`, `.pickle`, `.bin`) decodes its payload
//! without validating it. Only load binary files from trusted sources.

use super::Session;
use quiver_core::{Error, LabeledArray, Result};
use quiver_durability::{
    EngineError, FormatEngine, ReadOptions, Source, AUTO_ENGINE, BINARY_ENGINE_ID,
    BUNDLE_ENGINE_ID, CSV_ENGINE_ID, EXCEL_ENGINE_ID,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Options for [`Session::load_with`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Only load these entries (or, without a source, these csv files)
    pub names: Option<Vec<String>>,
    /// Engine identifier; `None` selects by extension
    pub engine: Option<String>,
    /// Log and skip unreadable entries/files; `None` uses the configuration
    pub skip_invalid: Option<bool>,
}

impl LoadOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to `names`
    pub fn names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Use engine `id` regardless of extension
    pub fn engine(mut self, id: impl Into<String>) -> Self {
        self.engine = Some(id.into());
        self
    }

    /// Skip invalid sources instead of failing
    pub fn skip_invalid(mut self, skip: bool) -> Self {
        self.skip_invalid = Some(skip);
        self
    }
}

/// Options for [`Session::save_with`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOptions {
    /// Only save these entries
    pub names: Option<Vec<String>>,
    /// Engine identifier; `None` selects by extension
    pub engine: Option<String>,
    /// Replace the destination (`true`) or update it in place (`false`)
    pub overwrite: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            names: None,
            engine: None,
            overwrite: true,
        }
    }
}

impl SaveOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to `names`
    pub fn names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Use engine `id` regardless of extension
    pub fn engine(mut self, id: impl Into<String>) -> Self {
        self.engine = Some(id.into());
        self
    }

    /// Keep existing entries at the destination
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// Map an engine failure to the session error taxonomy
fn engine_error(engine: &str, err: EngineError) -> Error {
    match err {
        EngineError::UnknownEngine(id) => Error::UnsupportedFormat(id),
        other => Error::persistence(engine, other),
    }
}

fn is_csv_path(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

impl Session {
    /// Load entries from `source`, overlaying existing entries
    ///
    /// `source` is a single file, a directory of csv files or a csv glob
    /// pattern.
    pub fn load(&mut self, source: impl AsRef<Path>) -> Result<()> {
        self.load_with(Some(source.as_ref()), &LoadOptions::default())
    }

    /// Load entries with explicit options
    ///
    /// Loaded entries are merged with [`set`](Self::set): same names are
    /// replaced in place, new names are appended.
    ///
    /// Without a source, `options.names` must all be `.csv` paths; each
    /// file becomes one entry named after its stem.
    ///
    /// # Errors
    ///
    /// - `UnsupportedFormat` for an unknown engine or extension
    /// - `InvalidInput` without a source when names are not csv paths
    /// - `Persistence` when the engine fails
    pub fn load_with(&mut self, source: Option<&Path>, options: &LoadOptions) -> Result<()> {
        let (engine, source, names) = match source {
            Some(path) => {
                let id = options.engine.as_deref().unwrap_or(AUTO_ENGINE);
                let engine = self
                    .engines
                    .resolve(path, id)
                    .map_err(|e| engine_error(id, e))?;
                (engine, Source::Path(path.to_path_buf()), options.names.as_deref())
            }
            None => {
                let files = match options.names.as_deref() {
                    Some(names) if !names.is_empty() && names.iter().all(|n| is_csv_path(n)) => names,
                    _ => {
                        return Err(Error::invalid_input(format!(
                            "without a source, names must be a list of .csv files, got {:?}",
                            options.names
                        )))
                    }
                };
                let engine = self
                    .engines
                    .get(CSV_ENGINE_ID)
                    .map_err(|e| engine_error(CSV_ENGINE_ID, e))?;
                let files: Vec<PathBuf> = files.iter().map(PathBuf::from).collect();
                (engine, Source::Files(files), None)
            }
        };

        let read_options = ReadOptions {
            skip_invalid: options
                .skip_invalid
                .unwrap_or(self.config.skip_invalid_sources),
        };
        let pairs = engine
            .read_named_values(&source, names, &read_options)
            .map_err(|e| engine_error(engine.engine_id(), e))?;
        if !engine.preserves_order() {
            debug!(
                target: "quiver::session",
                engine = engine.engine_id(),
                "Engine does not keep write order, entries arrive sorted by name"
            );
        }

        info!(
            target: "quiver::session",
            engine = engine.engine_id(),
            source = %source.display_path(),
            entries = pairs.len(),
            "Loaded session entries"
        );
        for (name, array) in pairs {
            self.set(name, array);
        }
        Ok(())
    }

    /// Save every array entry to `dest`, engine chosen by extension
    pub fn save(&self, dest: impl AsRef<Path>) -> Result<()> {
        self.save_with(dest, &SaveOptions::default())
    }

    /// Save array entries with explicit options
    ///
    /// # Errors
    ///
    /// - `UnsupportedFormat` for an unknown engine or extension
    /// - `Persistence` when the engine fails
    pub fn save_with(&self, dest: impl AsRef<Path>, options: &SaveOptions) -> Result<()> {
        let dest = dest.as_ref();
        let id = options.engine.as_deref().unwrap_or(AUTO_ENGINE);
        let engine = self
            .engines
            .resolve(dest, id)
            .map_err(|e| engine_error(id, e))?;
        self.write_arrays(engine.as_ref(), dest, options)
    }

    /// Save array entries as a directory of csv files
    pub fn to_csv(&self, dest: impl AsRef<Path>) -> Result<()> {
        self.save_with(dest, &SaveOptions::new().engine(CSV_ENGINE_ID))
    }

    /// Save array entries as an `.xlsx` workbook, one worksheet per array
    pub fn to_excel(&self, dest: impl AsRef<Path>) -> Result<()> {
        self.save_with(dest, &SaveOptions::new().engine(EXCEL_ENGINE_ID))
    }

    /// Save array entries as a bundle archive
    pub fn to_bundle(&self, dest: impl AsRef<Path>) -> Result<()> {
        self.save_with(dest, &SaveOptions::new().engine(BUNDLE_ENGINE_ID))
    }

    /// Save array entries as a binary snapshot
    ///
    /// Binary snapshots must only be loaded back from trusted locations.
    pub fn to_binary(&self, dest: impl AsRef<Path>) -> Result<()> {
        self.save_with(dest, &SaveOptions::new().engine(BINARY_ENGINE_ID))
    }

    fn write_arrays(&self, engine: &dyn FormatEngine, dest: &Path, options: &SaveOptions) -> Result<()> {
        let wanted = |name: &str| match &options.names {
            Some(names) => names.iter().any(|n| n == name),
            None => true,
        };
        let items: Vec<(String, Arc<LabeledArray>)> = self
            .items()
            .filter(|(name, _)| wanted(name))
            .filter_map(|(name, value)| {
                value
                    .as_array()
                    .map(|array| (name.to_string(), Arc::clone(array)))
            })
            .collect();

        let skipped = self.items().filter(|(n, v)| wanted(n) && !v.is_array()).count();
        if skipped > 0 {
            debug!(target: "quiver::session", skipped, "Non-array entries are not saved");
        }

        engine
            .write_named_values(dest, &items, options.overwrite)
            .map_err(|e| engine_error(engine.engine_id(), e))?;

        info!(
            target: "quiver::session",
            engine = engine.engine_id(),
            dest = %dest.display(),
            entries = items.len(),
            overwrite = options.overwrite,
            "Saved session entries"
        );
        Ok(())
    }
}
