//! # postmill
//!
//! A small static site builder for markdown blogs. Posts are rendered to
//! HTML, templated into pages, minified, compressed, and indexed for
//! client-side search.
//!
//! # Architecture: Line-Record Pipeline
//!
//! Stages are independent commands that talk through a line-oriented record
//! stream, one post per line:
//!
//! ```text
//! 1. Clean    public/            →  public/{p,archive,images}/
//! 2. Static   content/static/    →  public/ (minified CSS/JS + .br)
//! 3. Ingest   content/posts/*.md →  posts.jsonl           (one record per line)
//! 4. Pages    posts.jsonl        →  public/p/*.html, index.html, archive/
//! 5. Search   posts.jsonl        →  public/search-index.js
//! ```
//!
//! Pages and search read the same record file and never see markdown. Any
//! stage can be run alone (`postmill pages < posts.jsonl`) and the record
//! file can be inspected or produced by other tools.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`ingest`] | Markdown files → [`types::PostRecord`]s (title, date, rendered body) |
//! | [`record`] | Single-line record codec and its escaping contract |
//! | [`pages`] | Placeholder templates → post, home and archive pages |
//! | [`search`] | Inverted index builder and the `search-index.js` artifact |
//! | [`tokenize`] | Lowercase alphanumeric word splitting for the index |
//! | [`minify`] | HTML, CSS and JS minifiers (lexical state machines) |
//! | [`compress`] | Brotli `.br` siblings and the artifact writer every stage uses |
//! | [`assets`] | Output cleanup and static asset copying |
//! | [`config`] | `config.toml` loading, validation and merging |
//! | [`types`] | Shared stage types (`PostRecord`, `PostMeta`) |
//! | [`output`] | CLI output formatting for stage reports |
//!
//! # Design Decisions
//!
//! ## Lexical Minifiers
//!
//! The minifiers are single-pass state machines, not parsers. They never
//! fail and never touch string literals, attribute values or script
//! bodies in ways that change meaning; in exchange they are not
//! byte-optimal. Minification is stable: running it twice changes nothing.
//!
//! ## Exact-Token Search
//!
//! The index maps each word of three or more characters to the set of posts
//! containing it. The browser intersects posting sets; there is no ranking.
//! Ordered maps keep the generated script reproducible.
//!
//! ## Conditional `.br` Siblings
//!
//! A compressed sibling is written only when it is smaller than the
//! original, so servers that prefer `.br` never serve something bigger.

pub mod assets;
pub mod compress;
pub mod config;
pub mod ingest;
pub mod minify;
pub mod output;
pub mod pages;
pub mod record;
pub mod search;
pub mod tokenize;
pub mod types;

/// Markdown posts, relative to the source directory.
pub const POSTS_DIR: &str = "posts";
/// Page templates, relative to the source directory.
pub const TEMPLATES_DIR: &str = "templates";
/// Static assets, relative to the source directory.
pub const STATIC_DIR: &str = "static";
/// Record file written by `build`, relative to the temp directory.
pub const RECORDS_FILE: &str = "posts.jsonl";

#[cfg(test)]
pub(crate) mod test_helpers;
