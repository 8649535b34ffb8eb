//! Inverted index for client-side search.
//!
//! An [`IndexBuilder`] collects two tables while posts are indexed in
//! parallel:
//!
//! ```text
//! searchIndex   token → { post id, … }          only tokens of 3+ chars
//! postMetadata  post id → { title, date, permalink }
//! ```
//!
//! Both live behind one lock. Workers tokenize outside it and hold it only
//! for the inserts. [`IndexBuilder::finish`] turns the builder into an
//! immutable [`SearchIndex`], which renders the `search-index.js` artifact.
//! Tables are ordered maps and sets, so the artifact is byte-for-byte
//! reproducible for the same posts.
//!
//! Search is exact-token membership only: no ranking, no prefix matching.

use crate::compress::{self, Artifact};
use crate::config::CompressionConfig;
use crate::minify::minify_js;
use crate::tokenize::{is_indexable, tokenize};
use crate::types::{PostMeta, PostRecord};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;

/// File name of the search artifact inside the output directory.
pub const SEARCH_INDEX_FILE: &str = "search-index.js";

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default)]
struct IndexTables {
    postings: BTreeMap<String, BTreeSet<String>>,
    metadata: BTreeMap<String, PostMeta>,
}

impl IndexTables {
    fn insert_tokens(&mut self, post_id: &str, tokens: BTreeSet<String>) {
        for token in tokens {
            self.postings
                .entry(token)
                .or_default()
                .insert(post_id.to_string());
        }
    }
}

/// Accumulates postings and metadata; shareable across rayon workers.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    tables: Mutex<IndexTables>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `post_id` to the posting set of every indexable token in `text`.
    pub fn index(&self, post_id: &str, text: &str) {
        let tokens = indexable_tokens(text);
        if tokens.is_empty() {
            return;
        }
        self.tables.lock().insert_tokens(post_id, tokens);
    }

    /// Index a post's title and visible body text and record its metadata.
    pub fn add_post(&self, post: &PostRecord) {
        let text = format!("{} {}", post.title, visible_text(&post.body_html));
        let tokens = indexable_tokens(&text);
        let meta = post.meta();

        let mut tables = self.tables.lock();
        tables.insert_tokens(&post.id, tokens);
        tables.metadata.insert(post.id.clone(), meta);
    }

    pub fn finish(self) -> SearchIndex {
        let tables = self.tables.into_inner();
        SearchIndex {
            postings: tables.postings,
            metadata: tables.metadata,
        }
    }
}

fn indexable_tokens(text: &str) -> BTreeSet<String> {
    tokenize(text)
        .into_iter()
        .filter(|token| is_indexable(token))
        .collect()
}

/// Finished, read-only index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchIndex {
    postings: BTreeMap<String, BTreeSet<String>>,
    metadata: BTreeMap<String, PostMeta>,
}

impl SearchIndex {
    /// Ids of posts containing exactly `token`.
    pub fn postings(&self, token: &str) -> Option<&BTreeSet<String>> {
        self.postings.get(token)
    }

    /// Ids of posts containing every indexable token of `query`.
    ///
    /// A query with no indexable tokens matches nothing.
    pub fn lookup(&self, query: &str) -> BTreeSet<String> {
        let mut sets = indexable_tokens(query)
            .into_iter()
            .map(|token| self.postings.get(&token));
        let Some(Some(first)) = sets.next() else {
            return BTreeSet::new();
        };
        let mut hits = first.clone();
        for set in sets {
            match set {
                Some(set) => hits.retain(|id| set.contains(id)),
                None => return BTreeSet::new(),
            }
        }
        hits
    }

    pub fn metadata(&self, post_id: &str) -> Option<&PostMeta> {
        self.metadata.get(post_id)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.postings.keys().map(String::as_str)
    }

    pub fn token_count(&self) -> usize {
        self.postings.len()
    }

    pub fn post_count(&self) -> usize {
        self.metadata.len()
    }

    /// Render the browser-side data script:
    ///
    /// ```text
    /// const searchIndex={"token":["id",…],…};const postMetadata={"id":{…},…};
    /// ```
    pub fn to_script(&self) -> Result<String, serde_json::Error> {
        let script = format!(
            "const searchIndex={};const postMetadata={};",
            serde_json::to_string(&self.postings)?,
            serde_json::to_string(&self.metadata)?,
        );
        Ok(minify_js(&script))
    }
}

/// Text a reader sees: tags removed, each tag replaced by a space so words
/// on either side stay apart, and the entities markdown rendering emits
/// decoded.
pub fn visible_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Summary of a search stage run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReport {
    pub posts: usize,
    pub tokens: usize,
    pub artifact: Artifact,
}

/// Index `posts` in parallel and write `<output>/search-index.js`.
pub fn generate_search(
    posts: &[PostRecord],
    output_dir: &Path,
    compression: &CompressionConfig,
) -> Result<SearchReport, SearchError> {
    let builder = IndexBuilder::new();
    posts.par_iter().for_each(|post| builder.add_post(post));
    let index = builder.finish();
    tracing::debug!(
        posts = index.post_count(),
        tokens = index.token_count(),
        "search index built"
    );

    let script = index.to_script()?;
    let artifact = compress::write_artifact(
        &output_dir.join(SEARCH_INDEX_FILE),
        script.as_bytes(),
        compression,
    )?;

    Ok(SearchReport {
        posts: index.post_count(),
        tokens: index.token_count(),
        artifact,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::permalink_for;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn post(id: &str, title: &str, body: &str) -> PostRecord {
        PostRecord {
            id: id.to_string(),
            title: title.to_string(),
            date: "2024-01-01".to_string(),
            permalink: permalink_for(id),
            body_html: body.to_string(),
        }
    }

    fn ids(set: &BTreeSet<String>) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    // =========================================================================
    // IndexBuilder
    // =========================================================================

    #[test]
    fn short_tokens_are_not_indexed() {
        let builder = IndexBuilder::new();
        builder.index("p1", "a cat sat");
        let index = builder.finish();

        assert_eq!(index.tokens().collect::<Vec<_>>(), vec!["cat", "sat"]);
        assert_eq!(ids(index.postings("cat").unwrap()), vec!["p1"]);
        assert!(index.postings("a").is_none());
    }

    #[test]
    fn indexing_is_idempotent_per_token_and_id() {
        let builder = IndexBuilder::new();
        builder.index("p1", "rust rust RUST");
        builder.index("p1", "Rust");
        let index = builder.finish();

        assert_eq!(ids(index.postings("rust").unwrap()), vec!["p1"]);
    }

    #[test]
    fn posting_sets_are_sorted() {
        let builder = IndexBuilder::new();
        builder.index("zeta", "shared");
        builder.index("alpha", "shared");
        builder.index("mid", "shared");
        let index = builder.finish();

        assert_eq!(
            ids(index.postings("shared").unwrap()),
            vec!["alpha", "mid", "zeta"]
        );
    }

    #[test]
    fn add_post_indexes_title_and_visible_body() {
        let builder = IndexBuilder::new();
        builder.add_post(&post(
            "p1",
            "Borrow Checker",
            "<p class=\"lead\">Lifetimes <em>explained</em></p>",
        ));
        let index = builder.finish();

        for token in ["borrow", "checker", "lifetimes", "explained"] {
            assert!(index.postings(token).is_some(), "missing {token}");
        }
        assert!(index.postings("class").is_none());
        assert!(index.postings("lead").is_none());
        assert_eq!(index.metadata("p1").unwrap().title, "Borrow Checker");
    }

    #[test]
    fn add_post_without_body_records_metadata() {
        let builder = IndexBuilder::new();
        builder.add_post(&post("p1", "Hi", ""));
        let index = builder.finish();

        assert_eq!(index.post_count(), 1);
        assert_eq!(index.token_count(), 0);
        assert_eq!(index.metadata("p1").unwrap().permalink, "p/p1.html");
    }

    #[test]
    fn concurrent_indexing_loses_nothing() {
        let builder = IndexBuilder::new();
        let posts: Vec<PostRecord> = (0..200)
            .map(|i| post(&format!("post{i:03}"), "common words", &format!("<p>unique{i:03}</p>")))
            .collect();

        posts.par_iter().for_each(|p| builder.add_post(p));
        let index = builder.finish();

        assert_eq!(index.post_count(), 200);
        assert_eq!(index.postings("common").unwrap().len(), 200);
        assert_eq!(ids(index.postings("unique042").unwrap()), vec!["post042"]);
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    #[test]
    fn lookup_intersects_query_tokens() {
        let builder = IndexBuilder::new();
        builder.index("a", "rust async runtime");
        builder.index("b", "rust borrow checker");
        builder.index("c", "async python");
        let index = builder.finish();

        assert_eq!(ids(&index.lookup("Rust")), vec!["a", "b"]);
        assert_eq!(ids(&index.lookup("rust async")), vec!["a"]);
        assert!(index.lookup("rust python").is_empty());
        assert!(index.lookup("missing").is_empty());
    }

    #[test]
    fn lookup_without_indexable_tokens_is_empty() {
        let builder = IndexBuilder::new();
        builder.index("a", "go is ok");
        let index = builder.finish();

        assert!(index.lookup("go").is_empty());
        assert!(index.lookup("").is_empty());
    }

    // =========================================================================
    // Script rendering
    // =========================================================================

    #[test]
    fn script_is_deterministic_json() {
        let builder = IndexBuilder::new();
        builder.add_post(&post("a", "Say \"hi\"", "<p>Rust &amp; C</p>"));
        let script = builder.finish().to_script().unwrap();

        assert_eq!(
            script,
            r#"const searchIndex={"rust":["a"],"say":["a"]};const postMetadata={"a":{"title":"Say \"hi\"","date":"2024-01-01","permalink":"p/a.html"}};"#
        );
    }

    #[test]
    fn script_keeps_escaped_newlines_in_titles() {
        let builder = IndexBuilder::new();
        builder.add_post(&post("a", "two\nlines  here", ""));
        let script = builder.finish().to_script().unwrap();

        assert!(script.contains(r#""title":"two\nlines  here""#));
    }

    #[test]
    fn empty_index_script() {
        let script = IndexBuilder::new().finish().to_script().unwrap();
        assert_eq!(script, "const searchIndex={};const postMetadata={};");
    }

    // =========================================================================
    // visible_text
    // =========================================================================

    #[test]
    fn visible_text_separates_block_elements() {
        assert_eq!(
            tokenize(&visible_text("<p>one</p><p>two</p>")),
            vec!["one", "two"]
        );
    }

    #[test]
    fn visible_text_decodes_entities() {
        assert_eq!(visible_text("a &lt;b&gt; &amp;amp;").trim(), "a <b> &amp;");
    }

    // =========================================================================
    // generate_search
    // =========================================================================

    #[test]
    fn generate_search_writes_artifact() {
        let tmp = TempDir::new().unwrap();
        let posts = vec![
            post("first", "First Post", "<p>Hello search index</p>"),
            post("second", "Second Post", "<p>Another hello</p>"),
        ];

        let report = generate_search(&posts, tmp.path(), &CompressionConfig::default()).unwrap();

        assert_eq!(report.posts, 2);
        let path = tmp.path().join(SEARCH_INDEX_FILE);
        assert_eq!(report.artifact.path, path);
        let script = std::fs::read_to_string(&path).unwrap();
        assert!(script.starts_with("const searchIndex={"));
        assert!(script.contains(r#""hello":["first","second"]"#));
        assert!(script.contains(r#""second":{"title":"Second Post""#));
    }

    proptest! {
        #[test]
        fn every_indexable_token_points_back(text in "[a-zA-Z ,.]{0,80}") {
            let builder = IndexBuilder::new();
            builder.index("doc", &text);
            let index = builder.finish();
            for token in tokenize(&text) {
                if is_indexable(&token) {
                    prop_assert!(index.postings(&token).unwrap().contains("doc"));
                } else {
                    prop_assert!(index.postings(&token).is_none());
                }
            }
        }
    }
}
