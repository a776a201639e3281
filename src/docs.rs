//! Documentation transformer: rewrites the header's Doxygen-style comments
//! into a target dialect and splits them into emitted line groups.
//!
//! A [`Dialect`] is a table: ordered text substitutions followed by tag
//! rules. Lines are classified by the tag they start with; untagged lines
//! continue the group opened last, and lines before any tag are heads.

use crate::model::{DocLines, Function};
use crate::parser::header::RE_DOC_PARAM;
use regex::Regex;
use std::sync::LazyLock;

/// Marker of output parameters in `@param` lines.
pub const OUT_MARKER: &str = "[OUT]";

/// Explanatory phrase that accompanies [`OUT_MARKER`].
const OUT_PHRASE: &str = "pointer to get the ";

/// Characters accepted as sentence ends.
const SENTENCE_END: &str = ".,:;?!";

static RE_AT_PARAM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(@param\s+\S+)(.+)").unwrap());

/// Which line group a tag opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagClass {
    Param,
    Return,
    Version,
    Bug,
}

/// Tag recognized at the start of a line after substitution.
#[derive(Debug, Clone, Copy)]
pub struct TagRule {
    pub tag: &'static str,
    pub class: TagClass,
    /// Text the tag is rewritten to in emitted output.
    pub rewrite: &'static str,
}

/// A documentation dialect: substitution table plus tag rules.
#[derive(Debug, Clone, Copy)]
pub struct Dialect {
    pub substitutions: &'static [(&'static str, &'static str)],
    pub tags: &'static [TagRule],
    /// Inline head tags rewritten in place, e.g. `@note ` → `@note: `.
    pub head_rewrites: &'static [(&'static str, &'static str)],
}

/// Doxygen to epydoc.
pub const EPYDOC: Dialect = Dialect {
    substitutions: &[
        ("@{", ""),
        ("@}", ""),
        ("\\ingroup", ""),
        ("{", ""),
        ("}", ""),
        ("<b>", "B{"),
        ("</b>", "}"),
        ("@see", "See"),
        ("\\see", "See"),
        ("\\bug", "@bug"),
        ("\\version", "@version"),
        ("\\note", "@note"),
        ("\\warning", "@warning"),
        ("\\param", "@param"),
        ("\\return", "@return"),
    ],
    tags: &[
        TagRule {
            tag: "@param",
            class: TagClass::Param,
            rewrite: "@param",
        },
        TagRule {
            tag: "@return ",
            class: TagClass::Return,
            rewrite: "@return: ",
        },
        TagRule {
            tag: "@return",
            class: TagClass::Return,
            rewrite: "@return",
        },
        TagRule {
            tag: "@bug ",
            class: TagClass::Bug,
            rewrite: "@bug: ",
        },
        TagRule {
            tag: "@bug",
            class: TagClass::Bug,
            rewrite: "@bug",
        },
        TagRule {
            tag: "@version ",
            class: TagClass::Version,
            rewrite: "@version: ",
        },
        TagRule {
            tag: "@version",
            class: TagClass::Version,
            rewrite: "@version",
        },
    ],
    head_rewrites: &[("@note ", "@note: "), ("@warning ", "@warning: ")],
};

/// Doxygen normalized to `@` tags, otherwise kept as written.
pub const JAVADOC: Dialect = Dialect {
    substitutions: &[
        ("@{", ""),
        ("@}", ""),
        ("\\ingroup", ""),
        ("\\see", "@see"),
        ("\\bug", "@bug"),
        ("\\version", "@version"),
        ("\\note", "@note"),
        ("\\warning", "@warning"),
        ("\\param", "@param"),
        ("\\return", "@return"),
    ],
    tags: &[
        TagRule {
            tag: "@param",
            class: TagClass::Param,
            rewrite: "@param",
        },
        TagRule {
            tag: "@return",
            class: TagClass::Return,
            rewrite: "@return",
        },
        TagRule {
            tag: "@bug",
            class: TagClass::Bug,
            rewrite: "@bug",
        },
        TagRule {
            tag: "@version",
            class: TagClass::Version,
            rewrite: "@version",
        },
    ],
    head_rewrites: &[],
};

impl Dialect {
    fn substitute(&self, docs: &str) -> String {
        self.substitutions
            .iter()
            .fold(docs.to_string(), |text, (from, to)| text.replace(from, to))
    }

    fn classify<'l>(&self, line: &'l str) -> Option<(&TagRule, &'l str)> {
        let trimmed = line.trim_start();
        self.tags
            .iter()
            .find_map(|rule| trimmed.strip_prefix(rule.tag).map(|rest| (rule, rest)))
    }

    /// `@param name rest` → `@param name: rest` for the epydoc family.
    fn param_line(&self, line: &str) -> String {
        if self.head_rewrites.is_empty() {
            return line.to_string();
        }
        RE_AT_PARAM.replace(line, "$1:$2").into_owned()
    }
}

/// Terminate `text` with a period unless it already ends a sentence.
pub fn endot(text: &str) -> String {
    match text.chars().last() {
        Some(c) if !SENTENCE_END.contains(c) => format!("{}.", text),
        _ => text.to_string(),
    }
}

#[derive(Clone, Copy)]
enum Open {
    Param,
    Return,
    Version,
    Bug,
    /// Continuations of an `[OUT]` parameter line are dropped.
    Discard,
}

/// Split raw documentation into line groups.
pub fn transform(docs: &str, dialect: &Dialect) -> DocLines {
    let mut heads: Vec<String> = Vec::new();
    let mut outs: Vec<String> = Vec::new();
    let mut params: Vec<String> = Vec::new();
    let mut returns: Vec<String> = Vec::new();
    let mut versions: Vec<String> = Vec::new();
    let mut bugs: Vec<String> = Vec::new();
    let mut open: Option<Open> = None;

    for line in dialect.substitute(docs).lines() {
        if let Some((rule, rest)) = dialect.classify(line) {
            let text = format!("{}{}", rule.rewrite, rest);
            match rule.class {
                TagClass::Param if text.contains(OUT_MARKER) => {
                    let stripped = text
                        .replacen(rule.rewrite, "", 1)
                        .replace(OUT_PHRASE, "")
                        .replace(OUT_MARKER, "");
                    outs.push(stripped.split_whitespace().collect::<Vec<_>>().join(" "));
                    open = Some(Open::Discard);
                }
                TagClass::Param => {
                    params.push(dialect.param_line(&text));
                    open = Some(Open::Param);
                }
                TagClass::Return => {
                    returns.push(text);
                    open = Some(Open::Return);
                }
                TagClass::Version => {
                    versions.push(text);
                    open = Some(Open::Version);
                }
                TagClass::Bug => {
                    bugs.push(text);
                    open = Some(Open::Bug);
                }
            }
            continue;
        }

        let group = match open {
            None => {
                let head = dialect
                    .head_rewrites
                    .iter()
                    .fold(line.to_string(), |text, (from, to)| text.replace(from, to));
                heads.push(head);
                continue;
            }
            Some(Open::Discard) => continue,
            Some(Open::Param) => &mut params,
            Some(Open::Return) => &mut returns,
            Some(Open::Version) => &mut versions,
            Some(Open::Bug) => &mut bugs,
        };
        if let Some(last) = group.last_mut() {
            last.push(' ');
            last.push_str(line.trim());
        }
    }

    if let Some(last) = heads.last_mut() {
        *last = endot(last);
    }

    let out: Vec<String> = outs
        .iter()
        .filter_map(|o| o.split_whitespace().next())
        .map(str::to_string)
        .collect();
    if !outs.is_empty() {
        let rewrite = dialect
            .tags
            .iter()
            .find(|r| r.class == TagClass::Return)
            .map_or("@return:", |r| r.rewrite.trim_end());
        returns = vec![format!("{} {}", rewrite, outs.join(", "))];
    }

    DocLines {
        heads,
        params: params.iter().map(|p| endot(p)).collect(),
        out,
        tails: returns
            .iter()
            .chain(&versions)
            .chain(&bugs)
            .map(|t| endot(t))
            .collect(),
    }
}

/// Transform the documentation of every function in place.
pub fn transform_all(functions: &mut [Function], dialect: &Dialect) {
    for f in functions {
        f.docs = transform(&f.raw_docs, dialect);
    }
}

/// Number of documented parameters: transformed `@param` lines plus output
/// parameters, or the raw `\param` tags when nothing was transformed.
pub fn documented_params(f: &Function) -> usize {
    match f.docs.params.len() + f.docs.out.len() {
        0 => RE_DOC_PARAM.find_iter(&f.raw_docs).count(),
        n => n,
    }
}
