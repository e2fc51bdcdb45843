//! Persistence layer for quiver
//!
//! This crate handles everything that touches disk:
//!
//! - Format engine contract: read/write ordered `(name, array)` pairs
//! - Bundle: hierarchical tar + zstd archive with checksums, order preserving
//! - Binary: whole-session bincode snapshot, order preserving
//! - Delimited: one csv file per array, sorted by name on read
//! - Excel: one worksheet per array, order preserving
//! - Registry: engine lookup by identifier or file extension
//!
//! Writes go through a temporary file and a rename, so a failed save never
//! leaves a truncated file behind.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod binary;
pub mod bundle;
pub mod delimited;
pub mod engine;
pub mod error;
pub mod excel;
pub mod registry;
mod table;

pub use binary::{BinaryEngine, BINARY_ENGINE_ID};
pub use bundle::{BundleEngine, BundleManifest, BundleReader, BundleWriter, BUNDLE_ENGINE_ID};
pub use delimited::{CsvEngine, CSV_ENGINE_ID};
pub use engine::{FormatEngine, ReadOptions, Source};
pub use error::{EngineError, EngineResult};
pub use excel::{ExcelEngine, EXCEL_ENGINE_ID};
pub use registry::{EngineOptions, EngineRegistry, AUTO_ENGINE};
