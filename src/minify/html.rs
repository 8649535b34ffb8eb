//! HTML minifier.
//!
//! ```text
//!              "<!--"                      "<script…>"
//!   Comment <───────── Outside ──"<"──> InsideTag ──">"──> InsideScript
//!      │    ──"-->"──>   ^                  │  ^                │
//!                        └──────">"─────────┘  └──"</script"────┘
//! ```
//!
//! `<style>` works like `<script>`. Inside script and style bodies only
//! repeated whitespace is dropped; the first character of each whitespace
//! run is kept as-is so line breaks that matter to the embedded language
//! survive.

use super::{finish, starts_with_ignore_case};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawText {
    Script,
    Style,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Outside,
    /// Between `<` and `>`. `raw` is set when the tag opens a script/style
    /// body; `quote` while inside a quoted attribute value.
    InsideTag {
        raw: Option<RawText>,
        quote: Option<char>,
    },
    InsideScript,
    InsideStyle,
    InsideComment,
}

struct HtmlMinifier {
    out: String,
    mode: Mode,
}

/// Minify an HTML document or fragment.
pub fn minify_html(html: &str) -> String {
    let mut m = HtmlMinifier {
        out: String::with_capacity(html.len()),
        mode: Mode::Outside,
    };
    let mut rest = html;
    while let Some(c) = rest.chars().next() {
        let consumed = match m.mode {
            Mode::Outside => m.outside(rest, c),
            Mode::InsideTag { raw, quote } => m.inside_tag(c, raw, quote),
            Mode::InsideScript => m.raw_text(rest, c, "</script"),
            Mode::InsideStyle => m.raw_text(rest, c, "</style"),
            Mode::InsideComment => m.comment(rest, c),
        };
        rest = &rest[consumed..];
    }
    finish(m.out)
}

impl HtmlMinifier {
    fn outside(&mut self, rest: &str, c: char) -> usize {
        if rest.starts_with("<!--") {
            self.mode = Mode::InsideComment;
            return 4;
        }
        match c {
            '<' => {
                let raw = if starts_with_ignore_case(rest, "<script") {
                    Some(RawText::Script)
                } else if starts_with_ignore_case(rest, "<style") {
                    Some(RawText::Style)
                } else {
                    None
                };
                self.out.push('<');
                self.mode = Mode::InsideTag { raw, quote: None };
            }
            _ if c.is_whitespace() => self.push_space(),
            _ => self.out.push(c),
        }
        c.len_utf8()
    }

    fn inside_tag(&mut self, c: char, raw: Option<RawText>, quote: Option<char>) -> usize {
        if let Some(q) = quote {
            self.out.push(c);
            if c == q {
                self.mode = Mode::InsideTag { raw, quote: None };
            }
            return c.len_utf8();
        }
        match c {
            '>' => {
                if self.out.ends_with(' ') {
                    self.out.pop();
                }
                self.out.push('>');
                self.mode = match raw {
                    Some(RawText::Script) => Mode::InsideScript,
                    Some(RawText::Style) => Mode::InsideStyle,
                    None => Mode::Outside,
                };
            }
            '"' | '\'' if self.out.trim_end().ends_with('=') => {
                self.out.push(c);
                self.mode = Mode::InsideTag {
                    raw,
                    quote: Some(c),
                };
            }
            _ if c.is_whitespace() => self.push_space(),
            _ => self.out.push(c),
        }
        c.len_utf8()
    }

    fn raw_text(&mut self, rest: &str, c: char, close: &str) -> usize {
        if starts_with_ignore_case(rest, close) {
            self.out.push('<');
            self.mode = Mode::InsideTag {
                raw: None,
                quote: None,
            };
        } else if !c.is_whitespace() || !self.last_is_whitespace() {
            self.out.push(c);
        }
        c.len_utf8()
    }

    fn comment(&mut self, rest: &str, c: char) -> usize {
        if rest.starts_with("-->") {
            self.mode = Mode::Outside;
            return 3;
        }
        c.len_utf8()
    }

    fn push_space(&mut self) {
        if !self.out.is_empty() && !self.last_is_whitespace() {
            self.out.push(' ');
        }
    }

    fn last_is_whitespace(&self) -> bool {
        self.out.chars().next_back().is_some_and(char::is_whitespace)
    }
}
