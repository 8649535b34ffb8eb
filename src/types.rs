//! Shared types passed between pipeline stages.
//!
//! A [`PostRecord`] is created once by [`ingest`](crate::ingest), encoded onto
//! a single line by [`record`](crate::record), and decoded again by every
//! downstream stage (pages, search). Records are never mutated after
//! ingestion; stages copy or project them (see [`PostRecord::meta`]).

use serde::{Deserialize, Serialize};

/// Date assigned to posts without a `Date: YYYY-MM-DD` line.
pub const DEFAULT_DATE: &str = "2000-01-01";

/// One published article as it flows through the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostRecord {
    /// Filesystem-safe identifier, unique across the corpus (markdown file stem).
    pub id: String,
    /// Human title. May contain quotes, backslashes and control characters.
    pub title: String,
    /// `YYYY-MM-DD`, so string order is chronological order.
    pub date: String,
    /// Path relative to the output root, e.g. `p/hello.html`.
    pub permalink: String,
    /// Rendered HTML fragment. Empty when the record only carries metadata.
    pub body_html: String,
}

impl PostRecord {
    /// Metadata-only view used by the client-side search data.
    pub fn meta(&self) -> PostMeta {
        PostMeta {
            title: self.title.clone(),
            date: self.date.clone(),
            permalink: self.permalink.clone(),
        }
    }

    /// Copy of this record without the rendered body.
    pub fn without_body(&self) -> Self {
        Self {
            body_html: String::new(),
            ..self.clone()
        }
    }

    pub fn has_body(&self) -> bool {
        !self.body_html.is_empty()
    }
}

/// Client-facing post metadata, serialized into `postMetadata`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostMeta {
    pub title: String,
    pub date: String,
    pub permalink: String,
}

/// Permalink for a post id, relative to the output root.
pub fn permalink_for(id: &str) -> String {
    format!("p/{id}.html")
}

/// Sort posts newest first. Ties are broken by id so output is reproducible.
pub fn sort_newest_first(posts: &mut [PostRecord]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
}

/// Whether `date` is a `YYYY-MM-DD` string with month 01-12 and day 01-31.
///
/// Only the shape is checked (no leap-year or month-length rules). That is
/// enough for the property we rely on: for any two such strings, byte
/// order equals calendar order.
pub fn is_iso_date(date: &str) -> bool {
    let bytes = date.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }
    let digits = |range: std::ops::Range<usize>| -> Option<u32> {
        let part = &date[range];
        if part.bytes().all(|b| b.is_ascii_digit()) {
            part.parse().ok()
        } else {
            None
        }
    };
    match (digits(0..4), digits(5..7), digits(8..10)) {
        (Some(_), Some(month), Some(day)) => (1..=12).contains(&month) && (1..=31).contains(&day),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn post(id: &str, date: &str) -> PostRecord {
        PostRecord {
            id: id.to_string(),
            title: format!("Title {id}"),
            date: date.to_string(),
            permalink: permalink_for(id),
            body_html: "<p>body</p>".to_string(),
        }
    }

    #[test]
    fn meta_drops_body() {
        let p = post("hello", "2024-03-01");
        let meta = p.meta();
        assert_eq!(meta.title, "Title hello");
        assert_eq!(meta.date, "2024-03-01");
        assert_eq!(meta.permalink, "p/hello.html");
    }

    #[test]
    fn without_body_keeps_other_fields() {
        let p = post("hello", "2024-03-01");
        let stripped = p.without_body();
        assert!(!stripped.has_body());
        assert_eq!(stripped.id, p.id);
        assert_eq!(stripped.title, p.title);
    }

    #[test]
    fn permalink_uses_p_directory() {
        assert_eq!(permalink_for("first-post"), "p/first-post.html");
    }

    #[test]
    fn sort_newest_first_orders_by_date_then_id() {
        let mut posts = vec![
            post("b", "2023-01-01"),
            post("c", "2024-06-30"),
            post("a", "2023-01-01"),
            post("d", "2021-12-31"),
        ];
        sort_newest_first(&mut posts);
        let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn iso_date_accepts_valid_shapes() {
        assert!(is_iso_date("2024-01-31"));
        assert!(is_iso_date("2000-01-01"));
        assert!(is_iso_date("1999-12-01"));
    }

    #[test]
    fn iso_date_rejects_bad_shapes() {
        assert!(!is_iso_date("2024-1-31"));
        assert!(!is_iso_date("2024-13-01"));
        assert!(!is_iso_date("2024-00-10"));
        assert!(!is_iso_date("2024-01-32"));
        assert!(!is_iso_date("2024/01/01"));
        assert!(!is_iso_date("20x4-01-01"));
        assert!(!is_iso_date(""));
    }

    proptest! {
        #[test]
        fn string_order_matches_calendar_order(
            a in (1000u32..=9999, 1u32..=12, 1u32..=28),
            b in (1000u32..=9999, 1u32..=12, 1u32..=28),
        ) {
            let fmt = |(y, m, d): (u32, u32, u32)| format!("{y:04}-{m:02}-{d:02}");
            let (sa, sb) = (fmt(a), fmt(b));
            prop_assert!(is_iso_date(&sa) && is_iso_date(&sb));
            prop_assert_eq!(sa.cmp(&sb), a.cmp(&b));
        }
    }
}
