//! Declaration model parsed from the header, independent of any target.

use crate::error::GenerateError;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The only kind tag an [`Enum`] may carry.
pub const ENUM_KIND: &str = "enum";

/// Everything parsed from one or more headers.
#[derive(Debug, Default)]
pub struct Model {
    pub enums: Vec<Enum>,
    pub callbacks: Vec<Function>,
    pub functions: Vec<Function>,
    /// Version string for the generated version marker (may be empty).
    pub version: String,
    pub blacklist: Blacklist,
}

/// Where a declaration was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub line: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A C enum type.
#[derive(Debug)]
pub struct Enum {
    pub name: String,
    pub kind: String,
    pub values: Vec<Value>,
    /// Documentation as found in the header.
    pub raw_docs: String,
    /// Punctuated, capitalized documentation.
    pub docs: String,
    pub location: Location,
}

impl Enum {
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        values: Vec<Value>,
        raw_docs: impl Into<String>,
        location: Location,
    ) -> Result<Self, GenerateError> {
        let name = name.into();
        let kind = kind.into();
        if kind != ENUM_KIND {
            return Err(GenerateError::UnexpectedKind { kind, name });
        }
        Ok(Enum {
            name,
            kind,
            values,
            raw_docs: raw_docs.into(),
            docs: String::new(),
            location,
        })
    }
}

/// One enum constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    /// Full C name, e.g. `libvlc_foo_a`.
    pub enum_name: String,
    /// Short name used as the target constant, e.g. `a`.
    pub name: String,
    /// Literal as written in the header, or the decimal auto value.
    pub literal: String,
    /// Numeric value, `None` when the explicit literal is not a number.
    pub number: Option<i64>,
}

impl Value {
    pub fn new(enum_name: &str, literal: impl Into<String>, number: Option<i64>) -> Self {
        Value {
            enum_name: enum_name.to_string(),
            name: short_value_name(enum_name),
            literal: literal.into(),
            number,
        }
    }
}

/// Derive the short name of an enum constant.
///
/// The trailing `_` segment is used. A one-character segment next to a digit
/// borrows the segment before it (`..._5_1` → `5_1`), and a leading digit
/// gets a `_` prefix.
pub fn short_value_name(enum_name: &str) -> String {
    let parts: Vec<&str> = enum_name.split('_').collect();
    let last = parts.last().copied().unwrap_or_default();
    let digit_adjacent = parts.len() > 1 && last.chars().count() <= 1 && {
        let prev = parts[parts.len() - 2];
        last.chars().all(|c| c.is_ascii_digit())
            || prev.ends_with(|c: char| c.is_ascii_digit())
    };
    let mut name = if digit_adjacent {
        parts[parts.len() - 2..].join("_")
    } else {
        last.to_string()
    };
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

/// Parameter passing disposition. Values match ctypes' `paramflags`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Direction {
    In = 1,
    Out = 2,
    /// Only assigned through [`crate::classify::DirectionPolicy`] overrides.
    InOut = 3,
    /// Input defaulting to integer zero.
    InZero = 4,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "in" => Ok(Direction::In),
            "out" => Ok(Direction::Out),
            "inout" => Ok(Direction::InOut),
            "inzero" => Ok(Direction::InZero),
            _ => Err(format!("unknown direction: {} (in, out, inout or inzero)", s)),
        }
    }
}

impl Direction {
    pub fn flag(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::In => "",
            Direction::Out => "Out",
            Direction::InOut => "InOut",
            Direction::InZero => "InZero",
        }
    }
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    /// Canonical C type token, pointer depth as trailing `*`.
    pub ty: String,
    pub direction: Direction,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Parameter {
            name: name.into(),
            ty: ty.into(),
            direction: Direction::In,
        }
    }
}

/// Documentation split into emitted line groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocLines {
    /// Free-form lines before the first tag.
    pub heads: Vec<String>,
    /// `@param` lines, output parameters excluded.
    pub params: Vec<String>,
    /// Names of the `[OUT]` parameters.
    pub out: Vec<String>,
    /// `@return`, `@version` and `@bug` lines.
    pub tails: Vec<String>,
}

/// A C function or callback signature.
#[derive(Debug)]
pub struct Function {
    pub name: String,
    /// Return type token.
    pub ty: String,
    pub params: Vec<Parameter>,
    pub raw_docs: String,
    pub docs: DocLines,
    /// Times this function was folded into a class method.
    pub wrapped: usize,
    pub location: Location,
}

impl Function {
    pub fn new(
        name: impl Into<String>,
        ty: impl Into<String>,
        params: Vec<Parameter>,
        raw_docs: impl Into<String>,
        location: Location,
    ) -> Self {
        Function {
            name: name.into(),
            ty: ty.into(),
            params,
            raw_docs: raw_docs.into(),
            docs: DocLines::default(),
            wrapped: 0,
            location,
        }
    }

    /// Parameters from `first` on, output parameters excluded.
    pub fn in_params(&self, first: usize) -> impl Iterator<Item = &Parameter> {
        self.params
            .iter()
            .skip(first)
            .filter(|p| p.direction != Direction::Out)
    }

    /// Names of the parameters passed by the caller, from `first` on.
    pub fn args(&self, first: usize) -> Vec<&str> {
        self.in_params(first).map(|p| p.name.as_str()).collect()
    }

    /// Documentation lines joined with `indent` spaces, skipping the first
    /// `first` parameter lines.
    pub fn doc_text(&self, first: usize, indent: usize) -> String {
        let sep = format!("\n{}", " ".repeat(indent));
        self.docs
            .heads
            .iter()
            .chain(self.docs.params.iter().skip(first))
            .chain(self.docs.tails.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(&sep)
    }
}

/// Functions deliberately left out of the bindings.
///
/// Maps each name to the return type recorded when the header declared it.
#[derive(Debug, Clone)]
pub struct Blacklist {
    entries: BTreeMap<String, Option<String>>,
}

/// Deprecated or unsupported entry points.
const BLACKLISTED: &[&str] = &[
    "libvlc_audio_output_get_device_type",
    "libvlc_audio_output_set_device_type",
    "libvlc_printerr",
    "libvlc_set_exit_handler",
];

impl Default for Blacklist {
    fn default() -> Self {
        Blacklist::new(BLACKLISTED.iter().copied())
    }
}

impl Blacklist {
    pub fn new<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Blacklist {
            entries: names.into_iter().map(|n| (n.to_string(), None)).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Remember the declared type of a blacklisted function.
    pub fn record(&mut self, name: &str, ty: &str) {
        if let Some(slot) = self.entries.get_mut(name) {
            *slot = Some(ty.to_string());
        }
    }

    /// Blacklisted functions that were present in the header, by name.
    pub fn present(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(name, ty)| ty.as_deref().map(|ty| (name.as_str(), ty)))
    }
}
