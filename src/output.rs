//! CLI output formatting for all pipeline stages.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Posts lead with their
//! positional index and title; the files written for them follow as
//! secondary context, relative to the output directory, with sizes.
//!
//! # Output Format
//!
//! ## Static
//!
//! ```text
//! Static
//! 001 css/style.css (1.4 KB, br 402 B)
//! 002 images/logo.png (3.1 KB)
//! Copied 2 files, 1 minified
//! ```
//!
//! ## Ingest
//!
//! ```text
//! Posts
//! 001 Hello, World (2024-03-01)
//!     Id: hello-world
//! Failed
//!     content/posts/empty.md: Empty post: content/posts/empty.md
//! Ingested 1 post, 1 failed
//! ```
//!
//! ## Pages
//!
//! ```text
//! Posts
//! 001 Hello, World → p/hello-world.html (2.0 KB, br 880 B)
//! Home → index.html (1.1 KB, br 512 B)
//! Archive → archive/index.html (1.0 KB, br 498 B)
//! Generated 1 post page, home, archive
//! ```
//!
//! ## Search
//!
//! ```text
//! Search index → search-index.js (6.2 KB, br 1.9 KB)
//! Indexed 12 posts, 804 tokens
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::assets::AssetsReport;
use crate::compress::Artifact;
use crate::ingest::Ingested;
use crate::pages::PagesReport;
use crate::search::SearchReport;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Human-readable byte count.
fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// `1 post` / `2 posts`
fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

/// Artifact path relative to `root`, plus sizes.
///
/// ```text
/// p/hello.html (2.0 KB, br 880 B)
/// images/logo.png (3.1 KB)
/// ```
fn artifact_line(artifact: &Artifact, root: &Path) -> String {
    let rel = artifact
        .path
        .strip_prefix(root)
        .unwrap_or(&artifact.path)
        .display();
    match artifact.compressed {
        Some(br) => format!(
            "{} ({}, br {})",
            rel,
            format_size(artifact.size),
            format_size(br)
        ),
        None => format!("{} ({})", rel, format_size(artifact.size)),
    }
}

// ============================================================================
// Static assets
// ============================================================================

pub fn format_static_output(report: &AssetsReport, output_root: &Path) -> Vec<String> {
    let mut lines = vec!["Static".to_string()];
    if report.source_missing {
        lines.push("    (no static directory)".to_string());
    }
    for (i, artifact) in report.files.iter().enumerate() {
        lines.push(format!(
            "{} {}",
            format_index(i + 1),
            artifact_line(artifact, output_root)
        ));
    }
    lines.push(format!(
        "Copied {}, {} minified",
        plural(report.files.len(), "file"),
        report.minified
    ));
    lines
}

pub fn print_static_output(report: &AssetsReport, output_root: &Path) {
    for line in format_static_output(report, output_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Ingest
// ============================================================================

pub fn format_ingest_output(ingested: &Ingested) -> Vec<String> {
    let mut lines = vec!["Posts".to_string()];
    for (i, post) in ingested.records.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            post.title,
            post.date
        ));
        lines.push(format!("    Id: {}", post.id));
    }
    if !ingested.failures.is_empty() {
        lines.push("Failed".to_string());
        for (path, error) in &ingested.failures {
            lines.push(format!("    {}: {}", path.display(), error));
        }
    }
    let mut summary = format!("Ingested {}", plural(ingested.records.len(), "post"));
    if !ingested.failures.is_empty() {
        summary.push_str(&format!(", {} failed", ingested.failures.len()));
    }
    lines.push(summary);
    lines
}

pub fn print_ingest_output(ingested: &Ingested) {
    for line in format_ingest_output(ingested) {
        println!("{}", line);
    }
}

// ============================================================================
// Pages
// ============================================================================

pub fn format_pages_output(report: &PagesReport, output_root: &Path) -> Vec<String> {
    let mut lines = vec!["Posts".to_string()];
    for (i, page) in report.posts.iter().enumerate() {
        lines.push(format!(
            "{} {} \u{2192} {}",
            format_index(i + 1),
            page.title,
            artifact_line(&page.artifact, output_root)
        ));
    }
    lines.push(format!(
        "Home \u{2192} {}",
        artifact_line(&report.index, output_root)
    ));
    lines.push(format!(
        "Archive \u{2192} {}",
        artifact_line(&report.archive, output_root)
    ));
    lines.push(format!(
        "Generated {}, home, archive",
        plural(report.posts.len(), "post page")
    ));
    lines
}

pub fn print_pages_output(report: &PagesReport, output_root: &Path) {
    for line in format_pages_output(report, output_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Search
// ============================================================================

pub fn format_search_output(report: &SearchReport, output_root: &Path) -> Vec<String> {
    vec![
        format!(
            "Search index \u{2192} {}",
            artifact_line(&report.artifact, output_root)
        ),
        format!(
            "Indexed {}, {}",
            plural(report.posts, "post"),
            plural(report.tokens, "token")
        ),
    ]
}

pub fn print_search_output(report: &SearchReport, output_root: &Path) {
    for line in format_search_output(report, output_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
