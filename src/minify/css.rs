//! CSS minifier.
//!
//! Whitespace is buffered as a pending space and only written between two
//! tokens that would otherwise merge; next to `{ } : ; ,` it is dropped.
//! A `;` is held back the same way so it can be elided before `}`.
//! Comments count as whitespace. Quoted strings pass through untouched.

use super::finish;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    Comment,
    Quoted(char),
}

struct CssMinifier {
    out: String,
    mode: Mode,
    pending_space: bool,
    pending_semicolon: bool,
}

fn is_delimiter(c: char) -> bool {
    matches!(c, '{' | '}' | ':' | ';' | ',')
}

/// Minify a stylesheet.
pub fn minify_css(css: &str) -> String {
    let mut m = CssMinifier {
        out: String::with_capacity(css.len()),
        mode: Mode::Normal,
        pending_space: false,
        pending_semicolon: false,
    };
    let mut rest = css;
    while let Some(c) = rest.chars().next() {
        let consumed = match m.mode {
            Mode::Normal => m.normal(rest, c),
            Mode::Comment => m.comment(rest, c),
            Mode::Quoted(q) => m.quoted(rest, c, q),
        };
        rest = &rest[consumed..];
    }
    if m.pending_semicolon {
        m.out.push(';');
    }
    finish(m.out)
}

impl CssMinifier {
    fn normal(&mut self, rest: &str, c: char) -> usize {
        if rest.starts_with("/*") {
            self.mode = Mode::Comment;
            self.pending_space = true;
            return 2;
        }
        if c.is_whitespace() {
            self.pending_space = true;
            return c.len_utf8();
        }

        if self.pending_semicolon {
            if c == ';' {
                // `;;` declares nothing.
                self.pending_space = false;
                return 1;
            }
            self.pending_semicolon = false;
            if c != '}' {
                self.out.push(';');
            }
        }
        if self.pending_space {
            self.pending_space = false;
            let joins_tokens = self
                .out
                .chars()
                .next_back()
                .is_some_and(|last| !is_delimiter(last));
            if joins_tokens && !is_delimiter(c) {
                self.out.push(' ');
            }
        }

        match c {
            ';' => self.pending_semicolon = true,
            '"' | '\'' => {
                self.out.push(c);
                self.mode = Mode::Quoted(c);
            }
            _ => self.out.push(c),
        }
        c.len_utf8()
    }

    fn comment(&mut self, rest: &str, c: char) -> usize {
        if rest.starts_with("*/") {
            self.mode = Mode::Normal;
            return 2;
        }
        c.len_utf8()
    }

    fn quoted(&mut self, rest: &str, c: char, quote: char) -> usize {
        self.out.push(c);
        if c == '\\' {
            if let Some(escaped) = rest[1..].chars().next() {
                self.out.push(escaped);
                return 1 + escaped.len_utf8();
            }
        } else if c == quote {
            self.mode = Mode::Normal;
        }
        c.len_utf8()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn drops_comment_and_trailing_semicolon() {
        assert_eq!(minify_css("/* drop me */ a{color:red;}"), "a{color:red}");
    }

    #[test]
    fn removes_whitespace_around_delimiters() {
        let css = "body {\n  margin : 0 ;\n  padding: 0;\n}\n\n h1 , h2 { font-weight: bold }";
        assert_eq!(
            minify_css(css),
            "body{margin:0;padding:0}h1,h2{font-weight:bold}"
        );
    }

    #[test]
    fn keeps_single_space_between_words() {
        assert_eq!(
            minify_css(".a  .b {\n  margin: 0   auto;\n  font: 12px   / 1.5  serif;\n}"),
            ".a .b{margin:0 auto;font:12px / 1.5 serif}"
        );
    }

    #[test]
    fn media_query_keeps_space_before_paren() {
        assert_eq!(
            minify_css("@media (max-width: 600px) {\n  .a { color: red }\n}"),
            "@media (max-width:600px){.a{color:red}}"
        );
    }

    #[test]
    fn semicolon_elided_across_whitespace_and_comments() {
        assert_eq!(minify_css("a { b: c; /* last */ }"), "a{b:c}");
    }

    #[test]
    fn duplicate_semicolons_collapse() {
        assert_eq!(minify_css("a{b:c;;d:e;;}"), "a{b:c;d:e}");
    }

    #[test]
    fn comment_separates_tokens() {
        assert_eq!(minify_css("a/* x */b"), "a b");
        assert_eq!(minify_css("a /* x */ , b"), "a,b");
    }

    #[test]
    fn strings_are_verbatim() {
        assert_eq!(
            minify_css("a::after { content: \"a  /* b */  c;\" ; }"),
            "a::after{content:\"a  /* b */  c;\"}"
        );
        assert_eq!(
            minify_css("q { quotes: '\\'' \"\\\"\" ; }"),
            "q{quotes:'\\'' \"\\\"\"}"
        );
    }

    #[test]
    fn unterminated_comment_runs_to_end() {
        assert_eq!(minify_css("a{b:c}/* never closed d{e:f}"), "a{b:c}");
    }

    #[test]
    fn trailing_semicolon_outside_block_is_kept() {
        assert_eq!(minify_css("@import url(a.css) ;"), "@import url(a.css);");
    }

    #[test]
    fn blank_input() {
        assert_eq!(minify_css(""), "");
        assert_eq!(minify_css("  /* only */  \n"), "");
    }

    fn stylesheet() -> impl Strategy<Value = String> {
        let fragment = prop_oneof![
            Just("a"),
            Just(".nav"),
            Just("h1"),
            Just("{"),
            Just("}"),
            Just(":"),
            Just(";"),
            Just(","),
            Just("red"),
            Just("0 auto"),
            Just(" "),
            Just("\n  "),
            Just("/* c */"),
            Just("\"x  ;y\""),
            Just("@media (max-width: 1px)"),
        ];
        proptest::collection::vec(fragment, 0..24).prop_map(|parts| parts.concat())
    }

    proptest! {
        #[test]
        fn minification_is_idempotent(css in stylesheet()) {
            let once = minify_css(&css);
            prop_assert_eq!(minify_css(&once), once);
        }
    }
}
