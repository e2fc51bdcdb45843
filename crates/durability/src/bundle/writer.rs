//! Bundle archive writer
//!
//! Creates tar + zstd archives containing:
//! - MANIFEST.json - format metadata, entry order and checksums
//! - arrays/NNNNNN.msgpack - one MessagePack-encoded array per entry

use crate::bundle::types::{paths, xxh3_hex, BundleEntry, BundleManifest};
use crate::engine::write_atomically;
use crate::error::{EngineError, EngineResult};
use quiver_core::LabeledArray;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tar::{Builder, Header};

/// Writer for bundle archives
pub struct BundleWriter {
    compression_level: i32,
}

impl BundleWriter {
    /// Create a writer with the given zstd compression level
    pub fn new(compression_level: i32) -> Self {
        Self { compression_level }
    }

    /// Write a complete archive to `path`
    ///
    /// This is an atomic operation - either the complete archive is written
    /// or no file is left behind.
    pub fn write<'a, I>(&self, path: &Path, entries: I) -> EngineResult<BundleManifest>
    where
        I: IntoIterator<Item = (&'a str, &'a LabeledArray)>,
    {
        let (manifest, members) = self.encode(entries)?;
        write_atomically(path, |temp_path| {
            let file = File::create(temp_path)?;
            self.write_archive(BufWriter::new(file), &manifest, &members)
        })?;
        Ok(manifest)
    }

    /// Write an archive to a Vec<u8>
    pub fn write_to_vec<'a, I>(&self, entries: I) -> EngineResult<Vec<u8>>
    where
        I: IntoIterator<Item = (&'a str, &'a LabeledArray)>,
    {
        let (manifest, members) = self.encode(entries)?;
        let mut buffer = Vec::new();
        self.write_archive(&mut buffer, &manifest, &members)?;
        Ok(buffer)
    }

    fn encode<'a, I>(&self, entries: I) -> EngineResult<(BundleManifest, Vec<(String, Vec<u8>)>)>
    where
        I: IntoIterator<Item = (&'a str, &'a LabeledArray)>,
    {
        let mut manifest = BundleManifest::new(env!("CARGO_PKG_VERSION"));
        let mut members = Vec::new();

        for (index, (name, array)) in entries.into_iter().enumerate() {
            let member = paths::array_member(index);
            let data = rmp_serde::to_vec_named(array)
                .map_err(|e| EngineError::encode(format!("array '{}': {}", name, e)))?;
            manifest.add_checksum(member.clone(), xxh3_hex(&data));
            manifest.entries.push(BundleEntry {
                name: name.to_string(),
                member: member.clone(),
                axes: array.axis_names().iter().map(|a| a.to_string()).collect(),
                shape: array.shape(),
            });
            members.push((member, data));
        }

        Ok((manifest, members))
    }

    fn write_archive<W: Write>(
        &self,
        writer: W,
        manifest: &BundleManifest,
        members: &[(String, Vec<u8>)],
    ) -> EngineResult<()> {
        let manifest_json = serde_json::to_vec_pretty(manifest)?;

        let zstd_writer = zstd::Encoder::new(writer, self.compression_level)
            .map_err(|e| EngineError::compression(format!("zstd encoder: {}", e)))?;

        let mut tar_builder = Builder::new(zstd_writer);

        self.add_file(&mut tar_builder, paths::MANIFEST, &manifest_json)?;
        for (member, data) in members {
            self.add_file(&mut tar_builder, member, data)?;
        }

        let zstd_writer = tar_builder
            .into_inner()
            .map_err(|e| EngineError::archive(format!("tar finish: {}", e)))?;

        // Finish zstd compression and flush the underlying writer
        let mut inner = zstd_writer
            .finish()
            .map_err(|e| EngineError::compression(format!("zstd finish: {}", e)))?;
        inner.flush()?;
        Ok(())
    }

    /// Add a file to the tar archive
    fn add_file<W: Write>(
        &self,
        builder: &mut Builder<W>,
        relative: &str,
        data: &[u8],
    ) -> EngineResult<()> {
        let path = format!("{}/{}", paths::ROOT, relative);
        let mut header = Header::new_gnu();
        header
            .set_path(&path)
            .map_err(|e| EngineError::archive(format!("set path '{}': {}", path, e)))?;
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(0); // Reproducible output: zero mtime
        header.set_cksum();

        builder
            .append(&header, data)
            .map_err(|e| EngineError::archive(format!("append '{}': {}", path, e)))?;

        Ok(())
    }
}

impl Default for BundleWriter {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::BundleReader;
    use crate::engine::ReadOptions;
    use quiver_core::{Axis, Dtype};
    use serde::Serialize;

    /// Stored array layout without the shape checks
    #[derive(Serialize)]
    struct UncheckedArray {
        axes: Vec<Axis>,
        dtype: Dtype,
        data: Vec<f64>,
        title: String,
    }

    #[test]
    fn test_reader_rejects_data_not_matching_axes() {
        let writer = BundleWriter::default();
        let valid = LabeledArray::sequence(vec![Axis::range("a", 2), Axis::range("b", 3)]);
        let (mut manifest, mut members) = writer.encode([("e", &valid)]).unwrap();

        // checksum is recomputed, so only the array itself is inconsistent
        let short = UncheckedArray {
            axes: valid.axes().to_vec(),
            dtype: Dtype::Float,
            data: vec![1.0],
            title: String::new(),
        };
        let data = rmp_serde::to_vec_named(&short).unwrap();
        manifest.add_checksum(members[0].0.clone(), xxh3_hex(&data));
        members[0].1 = data;
        let mut bytes = Vec::new();
        writer.write_archive(&mut bytes, &manifest, &members).unwrap();

        let err = BundleReader::read_from_bytes(&bytes, None, &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, EngineError::Decode { .. }));

        let skipped =
            BundleReader::read_from_bytes(&bytes, None, &ReadOptions { skip_invalid: true }).unwrap();
        assert!(skipped.is_empty());
    }
}
