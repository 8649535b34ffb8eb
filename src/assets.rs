//! Output directory cleanup and static asset copying.
//!
//! ```text
//! content/static/                 public/
//! ├── css/style.css        ──→    ├── css/style.css (+ .br)     minified
//! ├── js/search.js.source  ──→    ├── js/search.js (+ .br)      minified, suffix dropped
//! └── images/logo.png      ──→    └── images/logo.png           copied as-is
//! ```
//!
//! Stylesheets and scripts are minified; a trailing `.source` is stripped
//! from the destination name so hand-written sources can sit next to their
//! published names. Everything else is copied byte for byte.

use crate::compress::{self, Artifact};
use crate::config::CompressionConfig;
use crate::minify::AssetKind;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Directories every build expects under the output root.
pub const OUTPUT_SUBDIRS: [&str; 3] = ["p", "archive", "images"];

#[derive(Error, Debug)]
pub enum AssetsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Refusing to clean output directory {0}")]
    UnsafeOutput(PathBuf),
}

/// Remove the output tree and recreate its skeleton.
pub fn clean_output(output_dir: &Path) -> Result<(), AssetsError> {
    let is_root_like = output_dir.as_os_str().is_empty()
        || output_dir.parent().is_none()
        || output_dir == Path::new(".")
        || output_dir == Path::new("..");
    if is_root_like {
        return Err(AssetsError::UnsafeOutput(output_dir.to_path_buf()));
    }

    if output_dir.exists() {
        fs::remove_dir_all(output_dir)?;
    }
    for sub in OUTPUT_SUBDIRS {
        fs::create_dir_all(output_dir.join(sub))?;
    }
    tracing::debug!(path = %output_dir.display(), "output cleaned");
    Ok(())
}

/// Summary of a static asset copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetsReport {
    /// Files written, in source walk order.
    pub files: Vec<Artifact>,
    /// How many of them went through a minifier.
    pub minified: usize,
    /// The static directory did not exist; nothing was copied.
    pub source_missing: bool,
}

/// Destination name with a trailing `.source` removed.
fn published_path(dest: PathBuf) -> PathBuf {
    let stripped = dest
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.strip_suffix(".source"))
        .filter(|name| !name.is_empty())
        .map(str::to_string);
    match stripped {
        Some(name) => dest.with_file_name(name),
        None => dest,
    }
}

/// Copy `static_dir` into `output_dir`, minifying stylesheets and scripts.
///
/// A missing `static_dir` is not an error.
pub fn copy_static(
    static_dir: &Path,
    output_dir: &Path,
    compression: &CompressionConfig,
) -> Result<AssetsReport, AssetsError> {
    let mut report = AssetsReport::default();
    if !static_dir.is_dir() {
        tracing::warn!(path = %static_dir.display(), "static directory not found, nothing to copy");
        report.source_missing = true;
        return Ok(report);
    }

    for entry in WalkDir::new(static_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(static_dir) else {
            continue;
        };
        let dest = published_path(output_dir.join(relative));

        let bytes = fs::read(entry.path())?;
        let kind = AssetKind::from_path(entry.path());
        let data = match kind {
            AssetKind::Css | AssetKind::Js => match String::from_utf8(bytes) {
                Ok(text) => {
                    report.minified += 1;
                    kind.minify(&text).into_bytes()
                }
                Err(e) => {
                    tracing::warn!(path = %entry.path().display(), "not UTF-8, copied unminified");
                    e.into_bytes()
                }
            },
            AssetKind::Html | AssetKind::Other => bytes,
        };

        let artifact = compress::write_artifact(&dest, &data, compression)?;
        tracing::debug!(from = %entry.path().display(), to = %dest.display(), "static file");
        report.files.push(artifact);
    }
    Ok(report)
}
