//! JavaScript minifier.
//!
//! Comments are removed and whitespace runs collapse to one pending gap that
//! is either a space or, when the run held a line break, a newline. Line
//! breaks are kept because automatic semicolon insertion depends on them:
//!
//! ```text
//! let a = 1          let a = 1
//! let b = 2     →    let b = 2
//! ```
//!
//! A pending space is dropped next to `; , { } ( ) [ ] :`. A pending newline
//! is dropped after `; , { ( [ :` and before `) ] } ; , :`.
//!
//! String and template literals are copied verbatim, backslash escapes
//! included. Regular expression literals are not recognised, and
//! `${…}` substitutions are treated as template text.

use super::finish;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    LineComment,
    BlockComment,
    /// Inside a `'…'`, `"…"` or `` `…` `` literal.
    Literal(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Gap {
    None,
    Space,
    Newline,
}

struct JsMinifier {
    out: String,
    mode: Mode,
    gap: Gap,
}

fn is_delimiter(c: char) -> bool {
    matches!(c, ';' | ',' | '{' | '}' | '(' | ')' | '[' | ']' | ':')
}

/// Minify a script.
pub fn minify_js(js: &str) -> String {
    let mut m = JsMinifier {
        out: String::with_capacity(js.len()),
        mode: Mode::Normal,
        gap: Gap::None,
    };
    let mut rest = js;
    while let Some(c) = rest.chars().next() {
        let consumed = match m.mode {
            Mode::Normal => m.normal(rest, c),
            Mode::LineComment => m.line_comment(c),
            Mode::BlockComment => m.block_comment(rest, c),
            Mode::Literal(quote) => m.literal(rest, c, quote),
        };
        rest = &rest[consumed..];
    }
    finish(m.out)
}

impl JsMinifier {
    fn normal(&mut self, rest: &str, c: char) -> usize {
        if rest.starts_with("//") {
            self.mode = Mode::LineComment;
            return 2;
        }
        if rest.starts_with("/*") {
            self.mode = Mode::BlockComment;
            self.widen(Gap::Space);
            return 2;
        }
        if c == '\n' {
            self.widen(Gap::Newline);
            return 1;
        }
        if c.is_whitespace() {
            self.widen(Gap::Space);
            return c.len_utf8();
        }

        self.flush_gap(c);
        self.out.push(c);
        if matches!(c, '\'' | '"' | '`') {
            self.mode = Mode::Literal(c);
        }
        c.len_utf8()
    }

    fn line_comment(&mut self, c: char) -> usize {
        if c == '\n' {
            self.mode = Mode::Normal;
            self.widen(Gap::Newline);
        }
        c.len_utf8()
    }

    fn block_comment(&mut self, rest: &str, c: char) -> usize {
        if rest.starts_with("*/") {
            self.mode = Mode::Normal;
            return 2;
        }
        if c == '\n' {
            self.widen(Gap::Newline);
        }
        c.len_utf8()
    }

    fn literal(&mut self, rest: &str, c: char, quote: char) -> usize {
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

    fn widen(&mut self, gap: Gap) {
        self.gap = self.gap.max(gap);
    }

    /// Write the pending gap, if it is still needed before `next`.
    fn flush_gap(&mut self, next: char) {
        let gap = std::mem::replace(&mut self.gap, Gap::None);
        let Some(last) = self.out.chars().next_back() else {
            return;
        };
        match gap {
            Gap::None => {}
            Gap::Space => {
                if !is_delimiter(last) && !is_delimiter(next) {
                    self.out.push(' ');
                }
            }
            Gap::Newline => {
                let after_opener = matches!(last, ';' | ',' | '{' | '(' | '[' | ':');
                let before_closer = matches!(next, ')' | ']' | '}' | ';' | ',' | ':');
                if !after_opener && !before_closer {
                    self.out.push('\n');
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn string_contents_are_verbatim() {
        assert_eq!(minify_js("var s = 'a  b';"), "var s = 'a  b';");
    }

    #[test]
    fn drops_comments() {
        assert_eq!(
            minify_js("// header\nvar a = 1; /* inline */ var b = 2;"),
            "var a = 1;var b = 2;"
        );
    }

    #[test]
    fn keeps_line_breaks_between_statements() {
        assert_eq!(minify_js("let a = 1\n\n  let b = 2\n"), "let a = 1\nlet b = 2");
        assert_eq!(minify_js("foo()\n\n  bar()"), "foo()\nbar()");
    }

    #[test]
    fn whitespace_around_delimiters_is_dropped() {
        assert_eq!(
            minify_js("function f ( a , b ) {\n  return [ a , b ] ;\n}"),
            "function f(a,b){return[a,b];}"
        );
    }

    #[test]
    fn comment_markers_inside_strings_are_content() {
        assert_eq!(
            minify_js("var u = \"http://x.y/*z*/\";"),
            "var u = \"http://x.y/*z*/\";"
        );
    }

    #[test]
    fn escaped_quotes_do_not_end_strings() {
        assert_eq!(
            minify_js("var q = 'it\\'s  ok' ;  var r = \"say \\\"hi  \\\"\" ;"),
            "var q = 'it\\'s  ok';var r = \"say \\\"hi  \\\"\";"
        );
    }

    #[test]
    fn template_literals_are_verbatim() {
        assert_eq!(
            minify_js("const t = `a  ${b}  // c\n  d`;"),
            "const t = `a  ${b}  // c\n  d`;"
        );
    }

    #[test]
    fn multiline_block_comment_counts_as_line_break() {
        assert_eq!(minify_js("a = 1/*\n*/b = 2"), "a = 1\nb = 2");
        assert_eq!(minify_js("return a /* c */ + b"), "return a + b");
    }

    #[test]
    fn line_comment_at_end_of_input() {
        assert_eq!(minify_js("go(); // done"), "go();");
    }

    #[test]
    fn unterminated_string_runs_to_end() {
        assert_eq!(minify_js("x = 'open   string"), "x = 'open   string");
    }

    #[test]
    fn generated_data_script_is_unchanged() {
        let script = r#"const searchIndex = {"rust":["a","b"]};const postMetadata = {"a":{"title":"A \"q\" \\ b"}};"#;
        assert_eq!(minify_js(script), script);
    }

    #[test]
    fn blank_input() {
        assert_eq!(minify_js(""), "");
        assert_eq!(minify_js(" \n // only a comment\n "), "");
    }

    fn script() -> impl Strategy<Value = String> {
        let fragment = prop_oneof![
            Just("var"),
            Just("x"),
            Just("="),
            Just("1"),
            Just(";"),
            Just("("),
            Just(")"),
            Just("{"),
            Just("}"),
            Just("["),
            Just("]"),
            Just(","),
            Just(":"),
            Just(" "),
            Just("\n"),
            Just("  \n "),
            Just("// c\n"),
            Just("/* c */"),
            Just("'a  b'"),
            Just("\"q\\\"\""),
            Just("`t ${x}`"),
            Just("foo()"),
            Just(".bar"),
        ];
        proptest::collection::vec(fragment, 0..24).prop_map(|parts| parts.concat())
    }

    proptest! {
        #[test]
        fn minification_is_idempotent(js in script()) {
            let once = minify_js(&js);
            prop_assert_eq!(minify_js(&once), once);
        }

        #[test]
        fn output_is_trimmed(js in script()) {
            let out = minify_js(&js);
            prop_assert_eq!(out.trim(), out.as_str());
        }
    }
}
