//! Format engine error types

use std::io;
use thiserror::Error;

/// Errors raised by format engines
#[derive(Debug, Error)]
pub enum EngineError {
    /// No engine registered under this identifier or extension
    #[error("Unknown engine: {0}")]
    UnknownEngine(String),

    /// Source path or pattern did not resolve to anything readable
    #[error("Invalid source: {0}")]
    InvalidSource(String),

    /// Requested entry is not present in the source
    #[error("Entry not found in source: {0}")]
    MissingEntry(String),

    /// Required file missing from an archive
    #[error("Missing required file in bundle: {0}")]
    MissingFile(String),

    /// Checksum verification failed
    #[error("Checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// File that failed checksum
        file: String,
        /// Expected checksum value
        expected: String,
        /// Actual computed checksum
        actual: String,
    },

    /// Unsupported file format version
    #[error("Unsupported format version: {version}")]
    UnsupportedVersion {
        /// The unsupported version number
        version: u32,
    },

    /// A value could not be encoded for this format
    #[error("Encode error: {0}")]
    Encode(String),

    /// File contents could not be decoded
    #[error("Decode error in {file}: {reason}")]
    Decode {
        /// File (or archive member) being decoded
        file: String,
        /// Description of the problem
        reason: String,
    },

    /// Archive operation failed
    #[error("Archive error: {0}")]
    Archive(String),

    /// Compression/decompression failed
    #[error("Compression error: {0}")]
    Compression(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV reader/writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Workbook could not be opened, read or written
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),
}

impl EngineError {
    /// Create an archive error
    pub fn archive(msg: impl Into<String>) -> Self {
        Self::Archive(msg.into())
    }

    /// Create a compression error
    pub fn compression(msg: impl Into<String>) -> Self {
        Self::Compression(msg.into())
    }

    /// Create an encode error
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Create a decode error for a file
    pub fn decode(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            file: file.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing file error
    pub fn missing_file(path: impl Into<String>) -> Self {
        Self::MissingFile(path.into())
    }
}

impl From<calamine::Error> for EngineError {
    fn from(err: calamine::Error) -> Self {
        Self::Spreadsheet(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for EngineError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::Spreadsheet(err.to_string())
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::decode("e.csv", "bad cell 'x'");
        let msg = err.to_string();
        assert!(msg.contains("e.csv"));
        assert!(msg.contains("bad cell"));

        let err = EngineError::ChecksumMismatch {
            file: "arrays/0.msgpack".to_string(),
            expected: "aa".to_string(),
            actual: "bb".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("aa"));
        assert!(msg.contains("bb"));
    }

    #[test]
    fn test_from_io() {
        let err: EngineError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, EngineError::Io(_)));
    }
}
