//! Declaration parser for the libvlc public headers.
//!
//! Builds on [`Scanner`] with one candidate predicate and structural pattern
//! per declaration form:
//!
//! - `typedef enum name { ... } alias;` → [`Enum`]
//! - `LIBVLC_API type name( params );` → [`Function`]
//! - `typedef type (*name)( params );` → callback [`Function`]

use super::scanner::{RawGroup, Scanner};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::GenerateError;
use crate::model::*;
use regex::Regex;
use std::sync::LazyLock;

/// Token prefixing every exported function.
pub const PUBLIC_API: &str = "LIBVLC_API";

/// Macro wrapping forward-declared return types.
const FORWARD_MACRO: &str = "VLC_FORWARD";

/// Name given to enums declared without a tag.
const ANONYMOUS_ENUM: &str = "libvlc_enum_t";

// -- Regex patterns -----------------------------------------------------------

static RE_API: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^{}\s+(\S+\s+.+?)\s*\(\s*(.+?)\s*\)", PUBLIC_API)).unwrap()
});

static RE_ENUM_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:typedef\s+)?enum").unwrap());

static RE_ENUM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:typedef\s+)?(enum)\s*([^\s{]*)\s*\{\s*(.+)\s*\}\s*(?:\S+)?;").unwrap()
});

static RE_ENUM_PAIR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*=\s*").unwrap());

static RE_CALLBACK_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^typedef\s+\w+(\s+\*)?\s*\(\s*\*").unwrap());

static RE_CALLBACK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^typedef\s+\*?(\w+\s*\*?)\s*\(\s*\*\s*(\w+)\s*\)\s*\((.+)\);").unwrap()
});

static RE_CONST: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bconst\b").unwrap());

static RE_FORWARD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.+\(\s*(.+?)\s*\)(\s*\S+)").unwrap());

// (qualifier, type, name)
static RE_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*(const\s*|unsigned\s*|struct\s*)?(\S+\s*\**)\s+(.+)").unwrap()
});

static RE_PARAM_LIST: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*,\s*").unwrap());

/// `\param name` or `@param name` in a raw documentation block.
pub(crate) static RE_DOC_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\\@]param\s+(\S+)").unwrap());

/// Debug trace of one matched declaration: location, joined text and the
/// raw documentation block.
pub fn source_trace(file: &str, raw: &RawGroup) -> String {
    format!(
        "\n==== source ==== {}:{}\n{}\n\"\"\"{}\n\"\"\"",
        file, raw.line, raw.text, raw.doc
    )
}

// -- Public API ---------------------------------------------------------------

/// Parse every enum declaration in `text`.
pub fn parse_enums(
    text: &str,
    file: &str,
    diag: &mut Diagnostics,
) -> Result<Vec<Enum>, GenerateError> {
    let is_candidate = |line: &str| RE_ENUM_TYPE.is_match(line);
    let mut enums = Vec::new();
    for raw in Scanner::new(text, is_candidate, &RE_ENUM, ";") {
        diag.trace(|| source_trace(file, &raw));
        let [kind, name, body] = take_groups(raw.groups);
        let name = match name.trim() {
            "" => ANONYMOUS_ENUM.to_string(),
            name => name.to_string(),
        };
        let values = parse_enum_values(&body, &name, diag);
        let location = Location {
            file: file.to_string(),
            line: raw.line,
        };
        enums.push(Enum::new(name, kind, values, raw.doc, location)?);
    }
    Ok(enums)
}

/// Parse every `LIBVLC_API` function declaration in `text`.
///
/// Blacklisted functions are recorded in `blacklist` and skipped.
pub fn parse_functions(
    text: &str,
    file: &str,
    blacklist: &mut Blacklist,
    diag: &mut Diagnostics,
) -> Vec<Function> {
    let is_candidate = |line: &str| line.starts_with(PUBLIC_API);
    let mut functions = Vec::new();
    for raw in Scanner::new(text, is_candidate, &RE_API, ");") {
        diag.trace(|| source_trace(file, &raw));
        let [decl, params] = take_groups(raw.groups);
        let head = parse_param(&decl);
        if blacklist.contains(&head.name) {
            blacklist.record(&head.name, &head.ty);
            continue;
        }

        let mut params = parse_param_list(&params);
        if params.iter().any(|p| p.name.is_empty()) {
            recover_param_names(&mut params, &head.name, &raw.doc, diag);
        }

        let location = Location {
            file: file.to_string(),
            line: raw.line,
        };
        functions.push(Function::new(head.name, head.ty, params, raw.doc, location));
    }
    functions
}

/// Parse every callback typedef in `text`.
///
/// The callback's type is its return type with one extra pointer level.
pub fn parse_callbacks(text: &str, file: &str, diag: &Diagnostics) -> Vec<Function> {
    let is_candidate = |line: &str| RE_CALLBACK_TYPE.is_match(line);
    Scanner::new(text, is_candidate, &RE_CALLBACK, ");")
        .map(|raw| {
            diag.trace(|| source_trace(file, &raw));
            let [ty, name, params] = take_groups(raw.groups);
            let ty = format!("{}*", ty.replace(' ', ""));
            let location = Location {
                file: file.to_string(),
                line: raw.line,
            };
            Function::new(name, ty, parse_param_list(&params), raw.doc, location)
        })
        .collect()
}

/// Parse a C parameter or function head such as `const char *psz_name`.
///
/// Leading `*` on the name move to the type, so `int *x` and `int* x` give
/// the same token. A type without a name yields an empty name.
pub fn parse_param(param: &str) -> Parameter {
    let mut text = RE_CONST.replace_all(param, "").trim().to_string();
    if text.contains(FORWARD_MACRO) {
        if let Some(caps) = RE_FORWARD.captures(&text) {
            text = format!("{}{}", &caps[1], &caps[2]);
        }
    }

    let Some(caps) = RE_PARAM.captures(&text) else {
        return Parameter::new("", text.replace(' ', ""));
    };
    let mut ty = caps[2].to_string();
    let mut name = caps[3].trim();
    while let Some(rest) = name.strip_prefix('*') {
        name = rest.trim_start();
        ty.push('*');
    }
    Parameter::new(name, ty.replace(' ', ""))
}

/// Parse a comma separated parameter list. A lone `void` means no parameters.
pub fn parse_param_list(params: &str) -> Vec<Parameter> {
    let params: Vec<Parameter> = RE_PARAM_LIST.split(params).map(parse_param).collect();
    if params.len() == 1 && params[0].ty == "void" {
        return Vec::new();
    }
    params
}

// -- Helpers ------------------------------------------------------------------

/// Move the capture groups into a fixed-size array.
fn take_groups<const N: usize>(groups: Vec<String>) -> [String; N] {
    let mut iter = groups.into_iter();
    std::array::from_fn(|_| iter.next().unwrap_or_default())
}

/// Parse the body of an enum into values.
///
/// Entries without `=` continue from the previous value, starting at 0.
fn parse_enum_values(body: &str, enum_name: &str, diag: &mut Diagnostics) -> Vec<Value> {
    let mut values = Vec::new();
    let mut last: i64 = -1;
    for entry in RE_PARAM_LIST.split(body) {
        let entry = entry.trim();
        if entry.is_empty() || entry.starts_with("/*") {
            continue;
        }
        let mut pair = RE_ENUM_PAIR.splitn(entry, 2);
        let name = pair.next().unwrap_or_default();
        match pair.next() {
            Some(literal) => {
                let number = parse_int_literal(literal);
                match number {
                    Some(n) => last = n,
                    None => {
                        diag.record(
                            DiagnosticKind::InvalidEnumValue,
                            format!("invalid value {} for {} in enum {}", literal, name, enum_name),
                        );
                        last += 1;
                    }
                }
                values.push(Value::new(name, literal, number));
            }
            None => {
                last += 1;
                values.push(Value::new(name, last.to_string(), Some(last)));
            }
        }
    }
    values
}

/// Decimal or `0x` hexadecimal integer literal.
fn parse_int_literal(literal: &str) -> Option<i64> {
    let literal = literal.trim();
    let (negative, digits) = match literal.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, literal),
    };
    let value = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i64>().ok()?,
    };
    Some(if negative { -value } else { value })
}

/// Fill in missing parameter names from the documentation, in order.
///
/// Assumes the documented order matches the declaration order.
fn recover_param_names(params: &mut [Parameter], func: &str, doc: &str, diag: &mut Diagnostics) {
    let mut names: Vec<String> = RE_DOC_PARAM
        .captures_iter(doc)
        .map(|caps| caps[1].to_string())
        .collect();
    if names.len() < params.len() {
        let comment = if doc.is_empty() {
            "N/A".to_string()
        } else {
            doc.replace('\n', " ")
        };
        diag.record(
            DiagnosticKind::MissingParameterName,
            format!(
                "{} parameter(s) missing in function {} comment: {}",
                params.len() - names.len(),
                func,
                comment
            ),
        );
        names.extend((names.len()..params.len()).map(|i| format!("param{}", i)));
    }
    for (param, name) in params.iter_mut().zip(names) {
        param.name = name;
    }
}
