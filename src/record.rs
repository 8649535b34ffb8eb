//! Line-oriented record codec used between pipeline stages.
//!
//! Each [`PostRecord`] travels as one JSON-shaped object per line:
//!
//! ```text
//! {"id":"hello","title":"Say \"hi\"","date":"2024-03-01","permalink":"p/hello.html","html_body":"<p>a\nb</p>"}
//! ```
//!
//! `html_body` is present only when the body is non-empty. Consumers read
//! line by line and skip blank lines.
//!
//! # Escaping
//!
//! Every string value is escaped by three passes, in this order:
//!
//! 1. `\` → `\\`
//! 2. `"` → `\"`
//! 3. newline → `\n` (backslash + `n`)
//!
//! so an encoded record is always exactly one line. Decoding undoes them in
//! one left-to-right scan: at each backslash the following character decides
//! the sequence. That is the exact inverse of the three passes above; undoing
//! them as three separate replace passes is not, and corrupts values such as
//! a literal `\n` (backslash, `n`), which encodes to `\\n`.
//!
//! # Malformed input
//!
//! Decoding never fails. Fields that are missing or cannot be read decode
//! to the empty string; scanning stops at the first structural error and
//! keeps the fields read so far.

use crate::types::PostRecord;
use std::io::{self, BufRead, Write};

const ID: &str = "id";
const TITLE: &str = "title";
const DATE: &str = "date";
const PERMALINK: &str = "permalink";
const HTML_BODY: &str = "html_body";

/// Escape a value for embedding between double quotes on a single line.
pub fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Inverse of [`escape`]. Unknown escape sequences are kept verbatim.
pub fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Encode a record as a single line (no trailing newline).
pub fn encode(post: &PostRecord) -> String {
    let mut line = String::with_capacity(post.body_html.len() + 128);
    line.push('{');
    push_field(&mut line, ID, &post.id);
    line.push(',');
    push_field(&mut line, TITLE, &post.title);
    line.push(',');
    push_field(&mut line, DATE, &post.date);
    line.push(',');
    push_field(&mut line, PERMALINK, &post.permalink);
    if post.has_body() {
        line.push(',');
        push_field(&mut line, HTML_BODY, &post.body_html);
    }
    line.push('}');
    line
}

fn push_field(line: &mut String, key: &str, value: &str) {
    line.push('"');
    line.push_str(key);
    line.push_str("\":\"");
    line.push_str(&escape(value));
    line.push('"');
}

/// Decode a single line. Missing or unreadable fields come back empty.
pub fn decode(line: &str) -> PostRecord {
    let mut post = PostRecord::default();
    for (key, raw) in FieldScanner::new(line) {
        let slot = match key {
            ID => &mut post.id,
            TITLE => &mut post.title,
            DATE => &mut post.date,
            PERMALINK => &mut post.permalink,
            HTML_BODY => &mut post.body_html,
            _ => continue,
        };
        *slot = unescape(raw);
    }
    post
}

/// Iterates `"key":"raw value"` pairs of one encoded record.
///
/// A value is a run of escape sequences or non-quote characters, closed by
/// the first unescaped `"`. A field that is not a string pair (a number,
/// `null`, a nested array or object) is skipped up to the next top-level
/// `,` and scanning resumes. Iteration ends at `}` or at end of input.
struct FieldScanner<'a> {
    rest: &'a str,
}

impl<'a> FieldScanner<'a> {
    fn new(line: &'a str) -> Self {
        let rest = line.trim().strip_prefix('{').unwrap_or("");
        Self { rest }
    }

    /// Consume a quoted run and return its raw (still escaped) contents.
    fn quoted(&mut self) -> Option<&'a str> {
        let body = self.rest.strip_prefix('"')?;
        let mut escaped = false;
        for (i, c) in body.char_indices() {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => {
                    self.rest = &body[i + 1..];
                    return Some(&body[..i]);
                }
                _ => {}
            }
        }
        None
    }

    fn expect(&mut self, token: char) -> Option<()> {
        self.rest = self.rest.trim_start().strip_prefix(token)?;
        self.rest = self.rest.trim_start();
        Some(())
    }

    /// Advance to the next `,` or `}` outside strings and nested brackets.
    /// Returns `false` when the input runs out first.
    fn skip_field(&mut self) -> bool {
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;
        for (i, c) in self.rest.char_indices() {
            if in_string {
                match c {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match c {
                '"' => in_string = true,
                '{' | '[' => depth += 1,
                '}' | ',' if depth == 0 => {
                    self.rest = &self.rest[i..];
                    return true;
                }
                '}' | ']' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        self.rest = "";
        false
    }

    fn pair(&mut self) -> Option<(&'a str, &'a str)> {
        let key = self.quoted()?;
        self.expect(':')?;
        let value = self.quoted()?;
        Some((key, value))
    }
}

impl<'a> Iterator for FieldScanner<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.rest = self.rest.trim_start();
            if self.rest.is_empty() || self.rest.starts_with('}') {
                return None;
            }
            if let Some(after_comma) = self.rest.strip_prefix(',') {
                self.rest = after_comma.trim_start();
            }
            let start = self.rest;
            if let Some(field) = self.pair() {
                return Some(field);
            }
            self.rest = start;
            if !self.skip_field() {
                return None;
            }
        }
    }
}

/// Read records line by line, skipping blank lines.
///
/// A line that decodes without an id cannot be linked or indexed; it is
/// logged and skipped rather than failing the whole stream.
pub fn read_records<R: BufRead>(reader: R) -> io::Result<Vec<PostRecord>> {
    let mut records = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let post = decode(&line);
        if post.id.is_empty() {
            tracing::warn!(line = number + 1, "skipping record without an id");
            continue;
        }
        records.push(post);
    }
    Ok(records)
}

/// Write one encoded record per line.
pub fn write_records<W: Write>(mut writer: W, records: &[PostRecord]) -> io::Result<()> {
    for post in records {
        writeln!(writer, "{}", encode(post))?;
    }
    writer.flush()
}
