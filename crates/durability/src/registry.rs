//! Engine registry
//!
//! Maps engine identifiers and file extensions to [`FormatEngine`]s.
//!
//! | extension               | engine   |
//! |-------------------------|----------|
//! | h5, hdf, hdf5, bundle   | `bundle` |
//! | pkl, pickle, bin        | `binary` |
//! | csv, or no extension    | `csv`    |
//! | xlsx, xlsm, xls         | `excel`  |

use crate::binary::{BinaryEngine, BINARY_ENGINE_ID};
use crate::bundle::{BundleEngine, BUNDLE_ENGINE_ID};
use crate::delimited::{CsvEngine, CSV_ENGINE_ID};
use crate::engine::FormatEngine;
use crate::error::{EngineError, EngineResult};
use crate::excel::{ExcelEngine, EXCEL_ENGINE_ID};
use rustc_hash::FxHashMap;
use std::path::Path;
use std::sync::Arc;

/// Engine name that selects by file extension
pub const AUTO_ENGINE: &str = "auto";

/// Options applied to the built-in engines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Field delimiter for the csv engine
    pub csv_delimiter: u8,
    /// zstd level for the bundle engine
    pub compression_level: i32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            csv_delimiter: b',',
            compression_level: 3,
        }
    }
}

/// Registry of format engines
#[derive(Clone)]
pub struct EngineRegistry {
    engines: FxHashMap<String, Arc<dyn FormatEngine>>,
    extensions: FxHashMap<String, String>,
}

impl EngineRegistry {
    /// Empty registry
    pub fn empty() -> Self {
        Self {
            engines: FxHashMap::default(),
            extensions: FxHashMap::default(),
        }
    }

    /// Registry holding the built-in engines with default options
    pub fn with_defaults() -> Self {
        Self::from_options(EngineOptions::default())
    }

    /// Registry holding the built-in engines configured by `options`
    pub fn from_options(options: EngineOptions) -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(BundleEngine::new(options.compression_level)));
        registry.register(Arc::new(BinaryEngine));
        registry.register(Arc::new(CsvEngine::new(options.csv_delimiter)));
        registry.register(Arc::new(ExcelEngine));

        for ext in ["h5", "hdf", "hdf5", "bundle"] {
            registry.map_extension(ext, BUNDLE_ENGINE_ID);
        }
        for ext in ["pkl", "pickle", "bin"] {
            registry.map_extension(ext, BINARY_ENGINE_ID);
        }
        registry.map_extension("csv", CSV_ENGINE_ID);
        for ext in ["xlsx", "xlsm", "xls"] {
            registry.map_extension(ext, EXCEL_ENGINE_ID);
        }
        registry
    }

    /// Register an engine under its own identifier, replacing any previous one
    pub fn register(&mut self, engine: Arc<dyn FormatEngine>) {
        self.engines.insert(engine.engine_id().to_string(), engine);
    }

    /// Route a file extension (without the dot, case-insensitive) to an engine
    pub fn map_extension(&mut self, ext: &str, engine_id: &str) {
        self.extensions
            .insert(ext.to_ascii_lowercase(), engine_id.to_string());
    }

    /// Look up an engine by identifier
    pub fn get(&self, engine_id: &str) -> EngineResult<Arc<dyn FormatEngine>> {
        self.engines
            .get(engine_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownEngine(engine_id.to_string()))
    }

    /// Engine identifier for a path, based on its extension
    ///
    /// A path without extension (a directory) maps to the csv engine.
    pub fn engine_id_for_path(&self, path: &Path) -> EngineResult<&str> {
        let Some(ext) = path.extension() else {
            return Ok(CSV_ENGINE_ID);
        };
        let ext = ext.to_string_lossy().to_ascii_lowercase();
        self.extensions
            .get(&ext)
            .map(String::as_str)
            .ok_or_else(|| EngineError::UnknownEngine(format!("no engine for '.{}' files", ext)))
    }

    /// Resolve `engine` (an identifier or `"auto"`) for `path`
    pub fn resolve(&self, path: &Path, engine: &str) -> EngineResult<Arc<dyn FormatEngine>> {
        if engine == AUTO_ENGINE {
            let id = self.engine_id_for_path(path)?;
            self.get(id)
        } else {
            self.get(engine)
        }
    }

    /// Registered engine identifiers, sorted
    pub fn engine_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.engines.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("engines", &self.engine_ids())
            .finish()
    }
}
