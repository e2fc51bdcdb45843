//! Bundle: hierarchical single-file archive of named arrays
//!
//! ## Archive Structure
//!
//! ```text
//! session.h5
//! └── quiver/
//!     ├── MANIFEST.json       format version, entry order, checksums
//!     └── arrays/
//!         ├── 000000.msgpack  first array (MessagePack)
//!         └── 000001.msgpack
//! ```
//!
//! Entry order is preserved across a round trip. Titles are stored with
//! the array.
//!
//! The bundle is the default engine for `.h5`, `.hdf`, `.hdf5` and
//! `.bundle` paths.

mod reader;
mod types;
mod writer;

pub use reader::BundleReader;
pub use types::{paths, xxh3_hex, BundleEntry, BundleManifest, BUNDLE_FORMAT_VERSION};
pub use writer::BundleWriter;

use crate::engine::{merge_entries, FormatEngine, ReadOptions, Source};
use crate::error::{EngineError, EngineResult};
use quiver_core::LabeledArray;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Engine identifier
pub const BUNDLE_ENGINE_ID: &str = "bundle";

/// Hierarchical archive engine
#[derive(Debug, Clone, Copy)]
pub struct BundleEngine {
    compression_level: i32,
}

impl BundleEngine {
    /// Create an engine writing with the given zstd level (1-22)
    pub fn new(compression_level: i32) -> Self {
        Self { compression_level }
    }
}

impl Default for BundleEngine {
    fn default() -> Self {
        Self::new(3)
    }
}

impl FormatEngine for BundleEngine {
    fn engine_id(&self) -> &str {
        BUNDLE_ENGINE_ID
    }

    fn read_named_values(
        &self,
        source: &Source,
        names: Option<&[String]>,
        options: &ReadOptions,
    ) -> EngineResult<Vec<(String, LabeledArray)>> {
        match source {
            Source::Path(path) => BundleReader::read(path, names, options),
            Source::Files(_) => Err(EngineError::InvalidSource(format!(
                "bundle engine reads a single file, got [{}]",
                source.display_path()
            ))),
        }
    }

    fn write_named_values(
        &self,
        dest: &Path,
        items: &[(String, Arc<LabeledArray>)],
        overwrite: bool,
    ) -> EngineResult<()> {
        let writer = BundleWriter::new(self.compression_level);
        if overwrite || !dest.exists() {
            let manifest = writer.write(dest, items.iter().map(|(n, a)| (n.as_str(), &**a)))?;
            debug!(target: "quiver::durability", path = %dest.display(), entries = manifest.entries.len(), "Wrote bundle");
            return Ok(());
        }

        let existing = BundleReader::read(dest, None, &ReadOptions::default())?;
        let merged = merge_entries(existing, items);
        let manifest = writer.write(dest, merged.iter().map(|(n, a)| (n.as_str(), a)))?;
        debug!(target: "quiver::durability", path = %dest.display(), entries = manifest.entries.len(), "Updated bundle");
        Ok(())
    }
}
