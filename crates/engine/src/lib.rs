//! Session container for quiver
//!
//! This crate ties the lower layers together:
//! - Session: ordered named store with dictionary and attribute access
//! - Elementwise dispatch of arithmetic and comparison operators
//! - Persistence dispatch to the format engines of `quiver-durability`
//! - Derived sessions (filter, apply, transpose, compact) and reports
//! - Configuration (`quiver.toml`)
//! - SharedSession: the handle for multi-threaded use
//!
//! A session never holds a lock itself; see [`shared`] when several threads
//! need the same session.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod session;
pub mod shared;

pub use config::{
    BundleConfig, CsvConfig, FloatErrorHandler, FloatErrorPolicy, SessionConfig, CONFIG_FILE_NAME,
};
pub use session::{
    LoadOptions, NamedStore, SaveOptions, Session, DEFAULT_SUMMARY_TEMPLATE, RESERVED_NAMES,
};
pub use shared::{share, snapshot, SharedSession};

pub use quiver_core::{
    Axis, BinaryOp, Dtype, Error, FloatErrors, LabeledArray, NameLookup, OpaqueValue, Operand,
    Result, UnaryOp, Value, ValueKind, ELLIPSIS,
};
pub use quiver_durability::{
    EngineError, EngineOptions, EngineRegistry, FormatEngine, ReadOptions, Source,
    BINARY_ENGINE_ID, BUNDLE_ENGINE_ID, CSV_ENGINE_ID, EXCEL_ENGINE_ID,
};
