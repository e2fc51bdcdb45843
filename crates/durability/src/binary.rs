//! Opaque binary snapshot engine
//!
//! The whole session is serialized with bincode behind a small header:
//!
//! ```text
//! magic("QVRB", 4) + version(u32 LE, 4) + bincode(Vec<(name, array)>)
//! ```
//!
//! # Trust
//!
//! Decoded arrays are checked against their axes, but the payload is
//! otherwise trusted. Only read files this program (or a trusted peer) wrote.

use crate::engine::{merge_entries, select_names, write_atomically, FormatEngine, ReadOptions, Source};
use crate::error::{EngineError, EngineResult};
use quiver_core::LabeledArray;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Engine identifier
pub const BINARY_ENGINE_ID: &str = "binary";

/// Magic bytes at the start of every binary snapshot
pub const BINARY_MAGIC: &[u8; 4] = b"QVRB";

/// Current binary snapshot version
pub const BINARY_FORMAT_VERSION: u32 = 1;

const HEADER_SIZE: usize = 8;

/// Whole-session bincode snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryEngine;

impl BinaryEngine {
    /// Encode entries into a snapshot buffer
    pub fn encode<'a, I>(entries: I) -> EngineResult<Vec<u8>>
    where
        I: IntoIterator<Item = (&'a str, &'a LabeledArray)>,
    {
        let entries: Vec<(&str, &LabeledArray)> = entries.into_iter().collect();
        let payload = bincode::serialize(&entries)
            .map_err(|e| EngineError::encode(format!("bincode: {}", e)))?;

        let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
        buf.extend_from_slice(BINARY_MAGIC);
        buf.extend_from_slice(&BINARY_FORMAT_VERSION.to_le_bytes());
        buf.extend_from_slice(&payload);
        Ok(buf)
    }

    /// Decode a snapshot buffer, validating magic and version
    pub fn decode(data: &[u8], file: &str) -> EngineResult<Vec<(String, LabeledArray)>> {
        if data.len() < HEADER_SIZE {
            return Err(EngineError::decode(
                file,
                format!("too short: {} bytes", data.len()),
            ));
        }
        if &data[0..4] != BINARY_MAGIC {
            return Err(EngineError::decode(file, "invalid magic bytes"));
        }
        let mut version = [0u8; 4];
        version.copy_from_slice(&data[4..HEADER_SIZE]);
        let version = u32::from_le_bytes(version);
        if version != BINARY_FORMAT_VERSION {
            return Err(EngineError::UnsupportedVersion { version });
        }

        bincode::deserialize(&data[HEADER_SIZE..])
            .map_err(|e| EngineError::decode(file, format!("bincode: {}", e)))
    }

    fn read_file(path: &Path) -> EngineResult<Vec<(String, LabeledArray)>> {
        let data = fs::read(path)?;
        Self::decode(&data, &path.display().to_string())
    }
}

impl FormatEngine for BinaryEngine {
    fn engine_id(&self) -> &str {
        BINARY_ENGINE_ID
    }

    fn read_named_values(
        &self,
        source: &Source,
        names: Option<&[String]>,
        options: &ReadOptions,
    ) -> EngineResult<Vec<(String, LabeledArray)>> {
        let Source::Path(path) = source else {
            return Err(EngineError::InvalidSource(format!(
                "binary engine reads a single file, got [{}]",
                source.display_path()
            )));
        };

        let mut entries = Self::read_file(path)?;
        for name in select_names(&mut entries, names) {
            if !options.skip_invalid {
                return Err(EngineError::MissingEntry(name));
            }
            warn!(target: "quiver::durability", name = %name, path = %path.display(), "Requested entry not in snapshot");
        }
        Ok(entries)
    }

    fn write_named_values(
        &self,
        dest: &Path,
        items: &[(String, Arc<LabeledArray>)],
        overwrite: bool,
    ) -> EngineResult<()> {
        let data = if overwrite || !dest.exists() {
            Self::encode(items.iter().map(|(n, a)| (n.as_str(), &**a)))?
        } else {
            let merged = merge_entries(Self::read_file(dest)?, items);
            Self::encode(merged.iter().map(|(n, a)| (n.as_str(), a)))?
        };

        write_atomically(dest, |temp_path| {
            fs::write(temp_path, &data)?;
            Ok(())
        })?;
        debug!(target: "quiver::durability", path = %dest.display(), bytes = data.len(), "Wrote binary snapshot");
        Ok(())
    }
}
