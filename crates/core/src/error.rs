//! Error types for quiver
//!
//! Structural lookup errors (`KeyNotFound`, `AttributeNotFound`, ...) are
//! programmer errors and propagate immediately. Errors raised while
//! evaluating a single entry of an elementwise operation never reach the
//! caller: the dispatcher turns them into the undefined sentinel.
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use thiserror::Error;

/// Result type alias for quiver operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed underlying cause carried by [`Error::Persistence`]
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for quiver
#[derive(Debug, Error)]
pub enum Error {
    /// Name absent on a required lookup
    #[error("Key not found: '{0}'")]
    KeyNotFound(String),

    /// Attribute-style lookup of a name that is not stored
    #[error("'{type_name}' object has no attribute '{name}'")]
    AttributeNotFound {
        /// Container type name
        type_name: &'static str,
        /// Missing attribute
        name: String,
    },

    /// Positional access past the end of the store
    #[error("Index {index} out of bounds for session of length {len}")]
    IndexOutOfBounds {
        /// Requested position
        index: usize,
        /// Number of entries
        len: usize,
    },

    /// Name used by the container's own bookkeeping
    #[error("Name '{0}' is reserved")]
    ReservedName(String),

    /// Value added positionally without a name of its own
    #[error("Cannot add a value of type {0} without a name")]
    Unnamed(&'static str),

    /// Wrong value type for the operation (e.g. non-boolean selection mask)
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// Array operands whose axes cannot be combined
    #[error("Incompatible axes: {0}")]
    IncompatibleAxes(String),

    /// Name pattern could not be parsed
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// Invalid argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unknown format engine identifier or file extension
    #[error("Unsupported format: '{0}'")]
    UnsupportedFormat(String),

    /// Engine-level read/write failure
    #[error("Persistence error ({engine}): {source}")]
    Persistence {
        /// Engine that failed
        engine: String,
        /// Underlying cause
        #[source]
        source: BoxedCause,
    },

    /// Configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a type mismatch error
    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        Error::TypeMismatch(msg.into())
    }

    /// Create an incompatible axes error
    pub fn incompatible_axes(msg: impl Into<String>) -> Self {
        Error::IncompatibleAxes(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Wrap an engine failure
    pub fn persistence(
        engine: impl Into<String>,
        source: impl Into<BoxedCause>,
    ) -> Self {
        Error::Persistence {
            engine: engine.into(),
            source: source.into(),
        }
    }

    /// True for lookup failures (`KeyNotFound`, `AttributeNotFound`, `IndexOutOfBounds`)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::KeyNotFound(_) | Error::AttributeNotFound { .. } | Error::IndexOutOfBounds { .. }
        )
    }
}
