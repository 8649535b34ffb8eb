//! Streaming minifiers for HTML, CSS and JavaScript.
//!
//! Each engine is a single pass over the input driven by a small state
//! machine: one `Mode` enum per engine and one transition function per
//! mode. Overlapping modes (say, "in a comment" and "in a string" at once)
//! cannot be represented.
//!
//! Shared policy:
//!
//! - whitespace runs collapse to at most one character where insignificant;
//! - comments are dropped whole, their contents never scanned;
//! - unterminated comments and strings run to the end of input;
//! - the result is trimmed;
//! - no engine fails.
//!
//! These are lexical passes, not parsers. Minification is stable
//! (`minify(minify(x)) == minify(x)`) but not byte-optimal.

mod css;
mod html;
mod js;

pub use css::minify_css;
pub use html::minify_html;
pub use js::minify_js;

use std::path::Path;

/// Which minifier, if any, applies to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Html,
    Css,
    Js,
    Other,
}

impl AssetKind {
    /// Classify by extension. A trailing `.source` is looked through, so
    /// `app.js.source` is JavaScript.
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let name = name.strip_suffix(".source").unwrap_or(&name);
        match name.rsplit_once('.').map(|(_, ext)| ext) {
            Some("html" | "htm") => Self::Html,
            Some("css") => Self::Css,
            Some("js" | "mjs") => Self::Js,
            _ => Self::Other,
        }
    }

    /// Minify `text` with the matching engine. `Other` is returned unchanged.
    pub fn minify(self, text: &str) -> String {
        match self {
            Self::Html => minify_html(text),
            Self::Css => minify_css(text),
            Self::Js => minify_js(text),
            Self::Other => text.to_string(),
        }
    }
}

/// ASCII case-insensitive prefix test.
fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack.len() >= prefix.len()
        && haystack.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Trim the finished buffer in place, without reallocating.
fn finish(mut out: String) -> String {
    let end = out.trim_end().len();
    out.truncate(end);
    let start = out.len() - out.trim_start().len();
    out.drain(..start);
    out
}
