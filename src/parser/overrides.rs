//! Hand-written class overrides merged into generated wrapper classes.
//!
//! The override source is a sequence of `class Name:` blocks. Each block's
//! leading string literal becomes the class documentation; the rest of the
//! block replaces the default constructor, and every method it defines is
//! skipped by the generator.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static RE_CLASS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^class\s+(\S+):").unwrap());

static RE_DEF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s+def\s+(\w+)").unwrap());

/// Override data for one class.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OverrideClass {
    /// Block text with the documentation literal removed.
    pub code: String,
    pub doc: Option<String>,
    /// Names of the methods defined in `code`.
    pub methods: Vec<String>,
}

impl OverrideClass {
    pub fn defines(&self, method: &str) -> bool {
        self.methods.iter().any(|m| m == method)
    }
}

/// Overrides by class name.
#[derive(Debug, Default)]
pub struct Overrides {
    classes: BTreeMap<String, OverrideClass>,
}

impl Overrides {
    pub fn get(&self, class: &str) -> Option<&OverrideClass> {
        self.classes.get(class)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }
}

/// Split an override source into per-class blocks.
pub fn parse(input: &str) -> Overrides {
    let mut blocks: Vec<(String, String)> = Vec::new();
    for line in input.split_inclusive('\n') {
        if let Some(caps) = RE_CLASS.captures(line) {
            blocks.push((caps[1].to_string(), String::new()));
        } else if let Some((_, code)) = blocks.last_mut() {
            code.push_str(line);
        }
    }

    let classes = blocks
        .into_iter()
        .map(|(name, code)| (name, split_class(code)))
        .collect();
    Overrides { classes }
}

/// Extract the documentation literal and method names of one block.
fn split_class(code: String) -> OverrideClass {
    let (doc, code) = match take_doc_literal(&code) {
        Some((doc, rest)) => (Some(doc), rest),
        None => (None, code),
    };
    let methods = RE_DEF
        .captures_iter(&code)
        .map(|caps| caps[1].to_string())
        .collect();
    OverrideClass { code, doc, methods }
}

/// Split `"""doc""" rest` (or `'''`) into the doc text and the rest.
fn take_doc_literal(code: &str) -> Option<(String, String)> {
    let start = code.trim_start();
    let quote = ["\"\"\"", "'''"].into_iter().find(|q| start.starts_with(q))?;
    let offset = code.len() - start.len() + quote.len();
    let body = &code[offset..];
    let end = body.find(quote)?;
    let doc = body[..end].to_string();
    let rest = body[end + quote.len()..].to_string();
    Some((doc, rest))
}
