//! Compressed copy of the raw dataset for network transfer.
//!
//! The raw dataset is Brotli-compressed next to itself (`<input>.br`) at a
//! fixed moderate quality. A compression failure never invalidates the JSON
//! artifacts already written, so callers log it and carry on.

use brotli::CompressorWriter;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Brotli quality used for the shipped archive.
pub const COMPRESSION_QUALITY: u32 = 5;

/// Brotli window size (log2).
const WINDOW_BITS: u32 = 22;

const BUFFER_SIZE: usize = 4096;

/// Suffix appended to the input path.
pub const COMPRESSED_SUFFIX: &str = "br";

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("Input file not found for compression: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Sizes from one compression run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionReport {
    pub output: PathBuf,
    pub original_size: u64,
    pub compressed_size: u64,
}

impl CompressionReport {
    /// Size reduction as a percentage of the original
    pub fn reduction_percent(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        (1.0 - self.compressed_size as f64 / self.original_size as f64) * 100.0
    }
}

/// Brotli-compress a buffer at [`COMPRESSION_QUALITY`]
pub fn compress_bytes(bytes: &[u8]) -> Result<Vec<u8>, CompressError> {
    let mut encoder =
        CompressorWriter::new(Vec::new(), BUFFER_SIZE, COMPRESSION_QUALITY, WINDOW_BITS);
    encoder.write_all(bytes)?;
    encoder.flush()?;
    Ok(encoder.into_inner())
}

/// `data.json` -> `data.json.br`
pub fn compressed_path(input: &Path) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(".");
    name.push(COMPRESSED_SUFFIX);
    PathBuf::from(name)
}

/// Compress a file to its sibling [`compressed_path`]
pub fn compress_file(input: &Path) -> Result<CompressionReport, CompressError> {
    if !input.exists() {
        return Err(CompressError::NotFound(input.to_path_buf()));
    }

    let data = fs::read(input)?;
    let compressed = compress_bytes(&data)?;
    let output = compressed_path(input);
    fs::write(&output, &compressed)?;

    Ok(CompressionReport {
        output,
        original_size: data.len() as u64,
        compressed_size: compressed.len() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use brotli::Decompressor;
    use std::io::Read;

    #[test]
    fn test_compressed_path() {
        assert_eq!(
            compressed_path(Path::new("/tmp/rollAppraiserData.json")),
            PathBuf::from("/tmp/rollAppraiserData.json.br")
        );
    }

    #[test]
    fn test_compress_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let input = temp_dir.path().join("data.json");
        let payload = r#"{"PerkStats": {}}"#.repeat(500);
        fs::write(&input, &payload).unwrap();

        let report = compress_file(&input).unwrap();
        assert_eq!(report.output, temp_dir.path().join("data.json.br"));
        assert_eq!(report.original_size, payload.len() as u64);
        assert!(report.compressed_size < report.original_size);
        assert!(report.reduction_percent() > 50.0);

        let mut decoded = String::new();
        Decompressor::new(fs::File::open(&report.output).unwrap(), BUFFER_SIZE)
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_compress_unwritable_output() {
        let temp_dir = tempfile::tempdir().unwrap();
        let input = temp_dir.path().join("data.json");
        fs::write(&input, "{}").unwrap();
        fs::create_dir(compressed_path(&input)).unwrap();

        assert!(matches!(compress_file(&input), Err(CompressError::Io(_))));
    }

    #[test]
    fn test_compress_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = compress_file(&temp_dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, CompressError::NotFound(_)));
    }

    #[test]
    fn test_reduction_percent_empty() {
        let report = CompressionReport {
            output: PathBuf::from("x.br"),
            original_size: 0,
            compressed_size: 20,
        };
        assert_eq!(report.reduction_percent(), 0.0);
    }
}
