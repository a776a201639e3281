//! Line-oriented header scanner: an explicit state machine.
//!
//! Walks the header once, collecting `/** ... */` documentation blocks and
//! reassembling declarations that span several physical lines. Every time a
//! candidate declaration is complete it is matched against a structural
//! pattern; matches are yielded together with the documentation block that
//! preceded them.
//!
//! Tolerated inputs: a documentation block not followed by a declaration is
//! dropped when the next block starts, and an unterminated declaration or
//! block comment at end of input is dropped silently. A trailing comment that
//! runs onto the following lines is skipped until it closes.

use regex::Regex;
use std::str::Lines;

/// One matched declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawGroup {
    /// The logical declaration, physical lines joined by spaces.
    pub text: String,
    /// Capture groups of the structural pattern, unmatched groups empty.
    pub groups: Vec<String>,
    /// Documentation block preceding the declaration.
    pub doc: String,
    /// 1-based line on which the declaration ended.
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Scanning,
    /// Inside a `/**` documentation block.
    InDoc,
    /// Inside an ordinary `/* ... */` comment, possibly interrupting a
    /// declaration that resumes once the comment closes.
    InBlockComment(Option<Vec<String>>),
    /// Collecting the physical lines of one declaration.
    Accumulating(Vec<String>),
}

/// Lazy, non-restartable sequence of [`RawGroup`]s.
pub struct Scanner<'a, F> {
    lines: Lines<'a>,
    line_no: usize,
    state: State,
    doc: Vec<String>,
    is_candidate: F,
    pattern: &'a Regex,
    terminator: &'a str,
}

impl<'a, F> Scanner<'a, F>
where
    F: Fn(&str) -> bool,
{
    /// Scan `text` for lines accepted by `is_candidate`, complete once a line
    /// ends with `terminator`, and structurally matched by `pattern`.
    pub fn new(text: &'a str, is_candidate: F, pattern: &'a Regex, terminator: &'a str) -> Self {
        Scanner {
            lines: text.lines(),
            line_no: 0,
            state: State::Scanning,
            doc: Vec::new(),
            is_candidate,
            pattern,
            terminator,
        }
    }

    /// Advance over one physical line, returning a completed declaration.
    fn step(&mut self, raw: &str) -> Option<String> {
        if let Some(rest) = raw.strip_prefix("/**") {
            self.doc = vec![rest.trim_end().to_string()];
            if self.state == State::Scanning {
                self.state = State::InDoc;
            }
            return None;
        }
        if let Some(rest) = raw.strip_prefix(" * ") {
            self.doc.push(rest.trim_end().to_string());
            return None;
        }

        let line = raw.trim();
        match std::mem::replace(&mut self.state, State::Scanning) {
            State::InBlockComment(pending) => {
                self.state = if line.ends_with("*/") {
                    pending.map_or(State::Scanning, State::Accumulating)
                } else {
                    State::InBlockComment(pending)
                };
                None
            }
            State::Accumulating(parts) if line.starts_with("/*") => {
                self.state = if line.ends_with("*/") {
                    State::Accumulating(parts)
                } else {
                    State::InBlockComment(Some(parts))
                };
                None
            }
            _ if line.starts_with("/*") => {
                if !line.ends_with("*/") {
                    self.state = State::InBlockComment(None);
                }
                None
            }
            State::Accumulating(mut parts) => {
                let (code, comment_open) = split_trailing_comment(line);
                parts.push(code.to_string());
                self.resume(parts, comment_open)
            }
            State::Scanning | State::InDoc => {
                if !(self.is_candidate)(line) {
                    return None;
                }
                let (code, comment_open) = split_trailing_comment(line);
                self.resume(vec![code.to_string()], comment_open)
            }
        }
    }

    /// Fire if the declaration is complete, otherwise keep accumulating.
    fn resume(&mut self, parts: Vec<String>, comment_open: bool) -> Option<String> {
        let complete = parts
            .last()
            .is_some_and(|code| code.ends_with(self.terminator));
        if complete {
            if comment_open {
                self.state = State::InBlockComment(None);
            }
            return Some(parts.join(" "));
        }
        self.state = if comment_open {
            State::InBlockComment(Some(parts))
        } else {
            State::Accumulating(parts)
        };
        None
    }

    /// Clean up the collected documentation block.
    fn take_doc(&mut self) -> String {
        let joined = std::mem::take(&mut self.doc).join("\n");
        let doc = joined.trim();
        match doc.strip_suffix("*/") {
            Some(stripped) => stripped.trim_end().to_string(),
            None => doc.to_string(),
        }
    }
}

/// Code part of a line without its trailing comment, and whether that
/// comment continues on the next line.
fn split_trailing_comment(line: &str) -> (&str, bool) {
    match line.find("/*") {
        Some(start) => (line[..start].trim_end(), !line[start + 2..].contains("*/")),
        None => (line, false),
    }
}

impl<F> Iterator for Scanner<'_, F>
where
    F: Fn(&str) -> bool,
{
    type Item = RawGroup;

    fn next(&mut self) -> Option<RawGroup> {
        while let Some(raw) = self.lines.next() {
            self.line_no += 1;
            let Some(decl) = self.step(raw) else {
                continue;
            };
            let Some(caps) = self.pattern.captures(&decl) else {
                continue;
            };
            let groups = caps
                .iter()
                .skip(1)
                .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
                .collect();
            return Some(RawGroup {
                text: decl,
                groups,
                doc: self.take_doc(),
                line: self.line_no,
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::LazyLock;

    static RE_DECL: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^API\s+(\w+)\s+(\w+)\s*\((.*)\);").unwrap());

    fn scan(text: &str) -> Vec<RawGroup> {
        Scanner::new(text, |l: &str| l.starts_with("API"), &RE_DECL, ";").collect()
    }

    #[test]
    fn single_line_declaration_with_doc() {
        let text = "/** Do a thing.\n * \\param x the value\n */\nAPI int thing(int x);\n";
        let groups = scan(text);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].groups, vec!["int", "thing", "int x"]);
        assert_eq!(groups[0].doc, "Do a thing.\n\\param x the value");
        assert_eq!(groups[0].line, 4);
    }

    #[test]
    fn multi_line_declaration_is_joined() {
        let text = "API int\nget_version(void);\n";
        let groups = scan(text);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].groups[1], "get_version");
        assert_eq!(groups[0].text, "API int get_version(void);");
        assert_eq!(groups[0].line, 2);
    }

    #[test]
    fn trailing_comment_dropped_while_accumulating() {
        let text = "API int f(int a, /* first */\n int b); /* done */\n";
        let groups = scan(text);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].groups[2], "int a, int b");
    }

    #[test]
    fn block_comments_are_skipped() {
        let text = "/* API int hidden(void);\nAPI int also_hidden(void);\n*/\nAPI int shown(void);\n";
        let groups = scan(text);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].groups[1], "shown");
        assert_eq!(groups[0].doc, "");
    }

    #[test]
    fn trailing_comment_continued_on_next_line() {
        let text = "API int f(int a, /* the first\n   * of two */\n int b);\n";
        let groups = scan(text);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].groups[2], "int a, int b");
    }

    #[test]
    fn comment_lines_inside_declaration_are_skipped() {
        let text = "API int f(int a,\n/* the second\n   one */\n int b);\n";
        let groups = scan(text);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].groups[2], "int a, int b");
    }

    #[test]
    fn doc_ending_on_text_line_is_stripped() {
        let text = "/** Short doc. */\nAPI void f(void);\n";
        let groups = scan(text);
        assert_eq!(groups[0].doc, "Short doc.");
    }

    #[test]
    fn doc_is_consumed_by_first_match_only() {
        let text = "/** First. */\nAPI void a(void);\nAPI void b(void);\n";
        let groups = scan(text);
        assert_eq!(groups[0].doc, "First.");
        assert_eq!(groups[1].doc, "");
    }

    #[test]
    fn orphan_doc_replaced_by_next_block() {
        let text = "/** Orphan. */\n#define X 1\n/** Real. */\nAPI void a(void);\n";
        let groups = scan(text);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].doc, "Real.");
    }

    #[test]
    fn unterminated_declaration_is_dropped() {
        let text = "API void a(void);\nAPI void b(int x,\n";
        let groups = scan(text);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].groups[1], "a");
    }

    #[test]
    fn unterminated_block_comment_is_dropped() {
        let text = "API void a(void);\n/* never closed\nAPI void b(void);\n";
        let groups = scan(text);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].groups[1], "a");
    }

    #[test]
    fn unterminated_comment_inside_declaration_is_dropped() {
        let text = "API void a(void);\nAPI void b(int x, /* never closed\n int y);\n";
        let groups = scan(text);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].groups[1], "a");
    }

    #[test]
    fn pattern_mismatch_yields_nothing() {
        let text = "API garbage;\nAPI void ok(void);\n";
        let groups = scan(text);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].groups[1], "ok");
    }
}
