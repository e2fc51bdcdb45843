//! Bundle archive layout and manifest

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current bundle format version
pub const BUNDLE_FORMAT_VERSION: u32 = 1;

/// Paths inside the archive
pub mod paths {
    /// Root directory in the archive
    pub const ROOT: &str = "quiver";
    /// Bundle manifest file (relative to ROOT)
    pub const MANIFEST: &str = "MANIFEST.json";
    /// Directory holding one MessagePack member per array (relative to ROOT)
    pub const ARRAYS_DIR: &str = "arrays";

    /// Relative member path for the array stored at `index`
    pub fn array_member(index: usize) -> String {
        format!("{}/{:06}.msgpack", ARRAYS_DIR, index)
    }
}

/// Bundle manifest: format metadata, entry order and checksums
///
/// The entry list is the source of truth for ordering; member file names
/// carry no meaning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BundleManifest {
    /// Format version
    pub format_version: u32,

    /// quiver version that created this bundle
    pub quiver_version: String,

    /// Checksum algorithm used (currently "xxh3")
    pub checksum_algorithm: String,

    /// Stored arrays, in write order
    pub entries: Vec<BundleEntry>,

    /// Checksums for each member (relative path -> hex)
    pub checksums: BTreeMap<String, String>,
}

impl BundleManifest {
    /// Create an empty manifest
    pub fn new(quiver_version: impl Into<String>) -> Self {
        Self {
            format_version: BUNDLE_FORMAT_VERSION,
            quiver_version: quiver_version.into(),
            checksum_algorithm: "xxh3".to_string(),
            entries: Vec::new(),
            checksums: BTreeMap::new(),
        }
    }

    /// Add a checksum for a member
    pub fn add_checksum(&mut self, path: impl Into<String>, checksum: impl Into<String>) {
        self.checksums.insert(path.into(), checksum.into());
    }

    /// Entry names in order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }
}

/// One stored array
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BundleEntry {
    /// Session name of the array
    pub name: String,
    /// Member path relative to the archive root
    pub member: String,
    /// Axis names, for inspection without decoding
    pub axes: Vec<String>,
    /// Shape, for inspection without decoding
    pub shape: Vec<usize>,
}

/// Compute xxh3 hash as hex string
pub fn xxh3_hex(data: &[u8]) -> String {
    use xxhash_rust::xxh3::xxh3_64;
    format!("{:016x}", xxh3_64(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_new() {
        let manifest = BundleManifest::new("0.1.0");
        assert_eq!(manifest.format_version, BUNDLE_FORMAT_VERSION);
        assert_eq!(manifest.checksum_algorithm, "xxh3");
        assert!(manifest.entries.is_empty());
    }

    #[test]
    fn test_member_paths_sort_in_write_order() {
        assert_eq!(paths::array_member(2), "arrays/000002.msgpack");
        assert!(paths::array_member(9) < paths::array_member(10));
    }

    #[test]
    fn test_xxh3_hex_is_stable() {
        assert_eq!(xxh3_hex(b"abc"), xxh3_hex(b"abc"));
        assert_ne!(xxh3_hex(b"abc"), xxh3_hex(b"abd"));
        assert_eq!(xxh3_hex(b"").len(), 16);
    }

    #[test]
    fn test_manifest_json_roundtrip() {
        let mut manifest = BundleManifest::new("0.1.0");
        manifest.entries.push(BundleEntry {
            name: "e".to_string(),
            member: paths::array_member(0),
            axes: vec!["a".to_string()],
            shape: vec![2],
        });
        manifest.add_checksum(paths::array_member(0), "00ff");
        let json = serde_json::to_string(&manifest).unwrap();
        let back: BundleManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, manifest);
        assert_eq!(back.names(), vec!["e"]);
    }
}
