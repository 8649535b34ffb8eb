//! Shared test utilities for the postmill test suite.
//!
//! Provides fixture setup and lookup helpers over ingested records.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let ingested = ingest_dir(&tmp.path().join("posts")).unwrap();
//!
//! let post = find_post(&ingested.records, "hello-world");
//! assert_eq!(post.title, "Hello, World");
//! assert_eq!(post_ids(&ingested.records), ["hello-world", "markdown-tour", ...]);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::types::PostRecord;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/content/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Record lookups (panic with a clear message on miss)
// =========================================================================

/// Find a post by id. Panics if not found.
pub fn find_post<'a>(records: &'a [PostRecord], id: &str) -> &'a PostRecord {
    records.iter().find(|p| p.id == id).unwrap_or_else(|| {
        let ids = post_ids(records);
        panic!("post '{id}' not found. Available: {ids:?}")
    })
}

/// All post ids in record order.
pub fn post_ids(records: &[PostRecord]) -> Vec<&str> {
    records.iter().map(|p| p.id.as_str()).collect()
}

// =========================================================================
// Output inspection
// =========================================================================

/// Read a generated file under `root`. Panics with the path on failure.
pub fn read_output(root: &Path, relative: &str) -> String {
    let path = root.join(relative);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}
