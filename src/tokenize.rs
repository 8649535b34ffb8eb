//! Word tokenizer for the search index.
//!
//! Text is split into runs of alphanumeric characters. Every other
//! character (punctuation, whitespace, markup remnants) ends the current
//! run. Runs are lowercased and emitted in source order, without
//! deduplication:
//!
//! ```text
//! "Hello, World! 123"  →  ["hello", "world", "123"]
//! ```
//!
//! Classification uses Unicode's alphanumeric property, so `café` stays one
//! token. Lowercasing can produce combining marks (`İ` → `i̇`); those are
//! dropped so every token is lowercase alphanumeric only.

/// Tokens shorter than this (in characters) are never indexed.
pub const MIN_TOKEN_CHARS: usize = 3;

/// Split `text` into lowercase alphanumeric tokens, in source order.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        if c.is_alphanumeric() {
            current.extend(c.to_lowercase().filter(|l| l.is_alphanumeric()));
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Whether a token is long enough to be indexed.
pub fn is_indexable(token: &str) -> bool {
    token.chars().count() >= MIN_TOKEN_CHARS
}
