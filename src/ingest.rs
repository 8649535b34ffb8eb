//! Markdown ingestion: post files in, [`PostRecord`]s out.
//!
//! A post is a markdown file whose stem becomes the post id:
//!
//! ```text
//! posts/hello-world.md
//! ─────────────────────
//! # Hello, World          ← title (first "# " line)
//! Date: 2024-03-01        ← date (first valid "Date: YYYY-MM-DD" line)
//!
//! Body in **markdown**.   ← rendered to HTML
//! ```
//!
//! The title and date lines are taken out of the markdown before rendering
//! so they do not show up twice on the page. Missing values fall back to
//! `Untitled Post <id>` and [`DEFAULT_DATE`].
//!
//! Files are ingested in parallel. A file that cannot be ingested is
//! reported in [`Ingested::failures`]; the others are still produced.

use crate::types::{DEFAULT_DATE, PostRecord, is_iso_date, permalink_for};
use pulldown_cmark::{Parser, html};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Not valid UTF-8: {0}")]
    NotUtf8(PathBuf),
    #[error("Empty post: {0}")]
    Empty(PathBuf),
    #[error("No usable post id in file name: {0}")]
    BadName(PathBuf),
    #[error("Duplicate post id '{id}': {path}")]
    DuplicateId { id: String, path: PathBuf },
}

/// Result of ingesting a batch of files.
#[derive(Debug, Default)]
pub struct Ingested {
    /// Successfully ingested posts, sorted by id.
    pub records: Vec<PostRecord>,
    /// Files that could not be ingested, sorted by path.
    pub failures: Vec<(PathBuf, IngestError)>,
}

impl Ingested {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Build a record from markdown source. Never fails.
pub fn ingest_markdown(id: &str, markdown: &str) -> PostRecord {
    let mut title = None;
    let mut date = None;
    let mut body = String::with_capacity(markdown.len());

    for line in markdown.lines() {
        if title.is_none() {
            if let Some(heading) = line.strip_prefix("# ").map(str::trim) {
                if !heading.is_empty() {
                    title = Some(heading.to_string());
                    continue;
                }
            }
        }
        if date.is_none() {
            if let Some(found) = parse_date_line(line) {
                date = Some(found.to_string());
                continue;
            }
        }
        body.push_str(line);
        body.push('\n');
    }

    let mut body_html = String::new();
    html::push_html(&mut body_html, Parser::new(&body));

    PostRecord {
        id: id.to_string(),
        title: title.unwrap_or_else(|| format!("Untitled Post {id}")),
        date: date.unwrap_or_else(|| DEFAULT_DATE.to_string()),
        permalink: permalink_for(id),
        body_html,
    }
}

fn parse_date_line(line: &str) -> Option<&str> {
    let value = line.trim().strip_prefix("Date:")?.trim();
    is_iso_date(value).then_some(value)
}

/// Ingest one markdown file. The file stem is the post id.
pub fn ingest_file(path: &Path) -> Result<PostRecord, IngestError> {
    let id = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| IngestError::BadName(path.to_path_buf()))?;

    let bytes = fs::read(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let markdown = String::from_utf8(bytes).map_err(|_| IngestError::NotUtf8(path.to_path_buf()))?;
    if markdown.trim().is_empty() {
        return Err(IngestError::Empty(path.to_path_buf()));
    }

    Ok(ingest_markdown(id, &markdown))
}

/// Ingest many files in parallel.
///
/// Two files with the same stem would produce the same id; the first path
/// in sort order wins and the rest are reported as failures.
pub fn ingest_files(paths: &[PathBuf]) -> Ingested {
    let mut paths = paths.to_vec();
    paths.sort();
    paths.dedup();

    let results: Vec<(PathBuf, Result<PostRecord, IngestError>)> = paths
        .into_par_iter()
        .map(|path| {
            let result = ingest_file(&path);
            (path, result)
        })
        .collect();

    let mut ingested = Ingested::default();
    for (path, result) in results {
        match result {
            Ok(post) if ingested.records.iter().any(|p| p.id == post.id) => {
                tracing::warn!(path = %path.display(), id = %post.id, "duplicate post id");
                ingested
                    .failures
                    .push((path.clone(), IngestError::DuplicateId { id: post.id, path }));
            }
            Ok(post) => {
                tracing::debug!(path = %path.display(), id = %post.id, "ingested");
                ingested.records.push(post);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping post");
                ingested.failures.push((path, e));
            }
        }
    }
    ingested.records.sort_by(|a, b| a.id.cmp(&b.id));
    ingested
}

/// Every `*.md` file directly inside `dir` (not recursive), sorted.
pub fn markdown_files(dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let io_err = |source| IngestError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_markdown = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("md"));
        if is_markdown && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Ingest every markdown file directly inside `dir`.
pub fn ingest_dir(dir: &Path) -> Result<Ingested, IngestError> {
    let files = markdown_files(dir)?;
    Ok(ingest_files(&files))
}
