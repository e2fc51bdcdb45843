//! Bundle archive reader
//!
//! Reads tar + zstd bundle archives and validates member checksums.

use crate::bundle::types::{paths, xxh3_hex, BundleEntry, BundleManifest, BUNDLE_FORMAT_VERSION};
use crate::engine::ReadOptions;
use crate::error::{EngineError, EngineResult};
use quiver_core::LabeledArray;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tar::Archive;
use tracing::warn;

/// Reader for bundle archives
pub struct BundleReader;

impl BundleReader {
    /// Read and parse the manifest only
    pub fn read_manifest(path: &Path) -> EngineResult<BundleManifest> {
        let files = Self::extract_all_files(BufReader::new(File::open(path)?))?;
        Self::parse_manifest(&files)
    }

    /// Read arrays from a bundle file, in stored order
    pub fn read(
        path: &Path,
        names: Option<&[String]>,
        options: &ReadOptions,
    ) -> EngineResult<Vec<(String, LabeledArray)>> {
        let files = Self::extract_all_files(BufReader::new(File::open(path)?))?;
        Self::decode_entries(&files, names, options)
    }

    /// Read arrays from an in-memory bundle
    pub fn read_from_bytes(
        data: &[u8],
        names: Option<&[String]>,
        options: &ReadOptions,
    ) -> EngineResult<Vec<(String, LabeledArray)>> {
        let files = Self::extract_all_files(data)?;
        Self::decode_entries(&files, names, options)
    }

    fn parse_manifest(files: &HashMap<String, Vec<u8>>) -> EngineResult<BundleManifest> {
        let manifest_data = files
            .get(paths::MANIFEST)
            .ok_or_else(|| EngineError::missing_file(paths::MANIFEST))?;
        let manifest: BundleManifest = serde_json::from_slice(manifest_data)?;

        if manifest.format_version != BUNDLE_FORMAT_VERSION {
            return Err(EngineError::UnsupportedVersion {
                version: manifest.format_version,
            });
        }

        Ok(manifest)
    }

    fn decode_entries(
        files: &HashMap<String, Vec<u8>>,
        names: Option<&[String]>,
        options: &ReadOptions,
    ) -> EngineResult<Vec<(String, LabeledArray)>> {
        let manifest = Self::parse_manifest(files)?;
        let mut out = Vec::with_capacity(manifest.entries.len());

        for entry in &manifest.entries {
            if let Some(names) = names {
                if !names.contains(&entry.name) {
                    continue;
                }
            }
            match Self::decode_entry(&manifest, entry, files) {
                Ok(array) => out.push((entry.name.clone(), array)),
                Err(e) if options.skip_invalid => {
                    warn!(
                        target: "quiver::durability",
                        name = %entry.name,
                        error = %e,
                        "Skipping invalid bundle entry"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        if let Some(names) = names {
            for name in names {
                if manifest.entries.iter().any(|e| &e.name == name) {
                    continue;
                }
                if options.skip_invalid {
                    warn!(target: "quiver::durability", name = %name, "Requested entry not in bundle");
                } else {
                    return Err(EngineError::MissingEntry(name.clone()));
                }
            }
        }

        Ok(out)
    }

    fn decode_entry(
        manifest: &BundleManifest,
        entry: &BundleEntry,
        files: &HashMap<String, Vec<u8>>,
    ) -> EngineResult<LabeledArray> {
        let data = files
            .get(&entry.member)
            .ok_or_else(|| EngineError::missing_file(entry.member.clone()))?;

        if let Some(expected) = manifest.checksums.get(&entry.member) {
            let actual = xxh3_hex(data);
            if expected != &actual {
                return Err(EngineError::ChecksumMismatch {
                    file: entry.member.clone(),
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        rmp_serde::from_slice(data).map_err(|e| EngineError::decode(&entry.member, e.to_string()))
    }

    /// Extract all files under the archive root into a HashMap
    fn extract_all_files<R: Read>(reader: R) -> EngineResult<HashMap<String, Vec<u8>>> {
        let decoder = zstd::Decoder::new(reader)
            .map_err(|e| EngineError::compression(format!("zstd decode: {}", e)))?;

        let mut archive = Archive::new(decoder);
        let mut files = HashMap::new();
        let prefix = format!("{}/", paths::ROOT);

        for entry in archive
            .entries()
            .map_err(|e| EngineError::archive(e.to_string()))?
        {
            let mut entry = entry.map_err(|e| EngineError::archive(e.to_string()))?;
            let entry_path = entry
                .path()
                .map_err(|e| EngineError::archive(e.to_string()))?
                .to_string_lossy()
                .to_string();

            // Strip prefix to get relative file name
            if let Some(name) = entry_path.strip_prefix(&prefix) {
                if !name.is_empty() {
                    let mut data = Vec::new();
                    entry
                        .read_to_end(&mut data)
                        .map_err(|e| EngineError::archive(format!("read {}: {}", name, e)))?;
                    files.insert(name.to_string(), data);
                }
            }
        }

        Ok(files)
    }
}
