//! Brotli siblings for text artifacts.
//!
//! Every stage writes its files through [`write_artifact`]: the plain file is
//! always written, and `<path>.br` is written next to it only when it pays
//! off (compression enabled for the extension, output non-empty and strictly
//! smaller than the input). Otherwise a `.br` left over from an earlier
//! build is removed so a server never prefers a stale sibling.

use crate::config::CompressionConfig;
use brotli::enc::BrotliEncoderParams;
use brotli::enc::backward_references::BrotliEncoderMode;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A file written by a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    /// Size of the plain file in bytes.
    pub size: usize,
    /// Size of the `.br` sibling, when one was written.
    pub compressed: Option<usize>,
}

/// Brotli-compress `data` in text mode.
///
/// Returns an empty vector for empty input or when the encoder fails; the
/// failure is logged and callers fall back to the uncompressed file.
pub fn compress(data: &[u8], config: &CompressionConfig) -> Vec<u8> {
    if data.is_empty() {
        return Vec::new();
    }
    let params = BrotliEncoderParams {
        quality: config.quality as i32,
        lgwin: config.window as i32,
        mode: BrotliEncoderMode::BROTLI_MODE_TEXT,
        size_hint: data.len(),
        ..BrotliEncoderParams::default()
    };
    let mut out = Vec::with_capacity(data.len() / 2);
    match brotli::BrotliCompress(&mut &data[..], &mut out, &params) {
        Ok(_) => out,
        Err(e) => {
            tracing::warn!(error = %e, bytes = data.len(), "brotli compression failed");
            Vec::new()
        }
    }
}

/// `<path>.br`
pub fn sibling_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".br");
    PathBuf::from(name)
}

/// Write `data` to `path` (creating parent directories) and, when it pays
/// off, a compressed `.br` sibling.
pub fn write_artifact(
    path: &Path,
    data: &[u8],
    config: &CompressionConfig,
) -> io::Result<Artifact> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, data)?;

    let br_path = sibling_path(path);
    let mut compressed = None;
    if config.applies_to(path) {
        let packed = compress(data, config);
        if !packed.is_empty() && packed.len() < data.len() {
            fs::write(&br_path, &packed)?;
            compressed = Some(packed.len());
        } else {
            tracing::debug!(path = %path.display(), "skipping .br, no size gain");
        }
    }
    if compressed.is_none() && br_path.exists() {
        fs::remove_file(&br_path)?;
    }

    Ok(Artifact {
        path: path.to_path_buf(),
        size: data.len(),
        compressed,
    })
}
