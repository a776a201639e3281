//! Type and direction classification.
//!
//! The [`TypeRegistry`] maps canonical C type tokens to target expressions.
//! It is built in two phases: a static seed table per target, then the enum
//! and callback declarations of the parsed model. Lookups are exhaustive: a
//! token missing from the registry is reported by [`TypeRegistry::check`].
//!
//! Parameter directions come from a [`DirectionPolicy`] table, extended from
//! the command line with output types and per-parameter overrides.

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::model::{Direction, Function, Model, Parameter};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

/// Prefix of the placeholder emitted for unresolved types.
pub const FIXME_PREFIX: &str = "FIXME_";

/// C type token → target type expression.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    classes: BTreeMap<String, String>,
}

impl TypeRegistry {
    /// Phase one: the target's static conversion table.
    pub fn seed(table: &[(&str, &str)]) -> Self {
        TypeRegistry {
            classes: table
                .iter()
                .map(|(ty, class)| (ty.to_string(), class.to_string()))
                .collect(),
        }
    }

    /// Phase two: install a class name for every enum and callback the seed
    /// table does not already name.
    pub fn register_declarations(&mut self, model: &Model, type_re: &Regex) {
        let names = model
            .enums
            .iter()
            .map(|e| e.name.as_str())
            .chain(model.callbacks.iter().map(|f| f.name.as_str()));
        for name in names {
            self.classes
                .entry(name.to_string())
                .or_insert_with(|| derive_class_name(name, type_re));
        }
    }

    pub fn register(&mut self, ty: impl Into<String>, class: impl Into<String>) {
        self.classes.insert(ty.into(), class.into());
    }

    pub fn resolve(&self, ty: &str) -> Option<&str> {
        self.classes.get(ty).map(String::as_str)
    }

    /// Target expression for `ty`, or a `FIXME_` placeholder.
    pub fn class_for(&self, ty: &str) -> String {
        match self.resolve(ty) {
            Some(class) if !class.is_empty() => class.to_string(),
            _ => format!("{}{}", FIXME_PREFIX, ty),
        }
    }

    /// All entries, sorted by C type.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.classes.iter().map(|(t, c)| (t.as_str(), c.as_str()))
    }

    /// Report every referenced type token that does not resolve.
    ///
    /// Function return and parameter types are always checked. Callbacks are
    /// checked when the target emits them, with their result token mapped
    /// the way the target declares it.
    pub fn check(&self, model: &Model, callbacks: Option<CallbackResult>, diag: &mut Diagnostics) {
        for f in &model.functions {
            self.check_result(&f.ty, f, diag);
            self.check_params(f, diag);
        }
        if let Some(result) = callbacks {
            for f in &model.callbacks {
                self.check_result(result.token(&f.ty), f, diag);
                self.check_params(f, diag);
            }
        }
    }

    fn check_result(&self, ty: &str, f: &Function, diag: &mut Diagnostics) {
        if self.resolve(ty).is_none() {
            diag.record(
                DiagnosticKind::UnresolvedType,
                format!("no type conversion for {} {}", ty, f.name),
            );
        }
    }

    fn check_params(&self, f: &Function, diag: &mut Diagnostics) {
        for p in &f.params {
            if self.resolve(&p.ty).is_none() {
                diag.record(
                    DiagnosticKind::UnresolvedType,
                    format!("no type conversion for {} {} in {}", p.ty, p.name, f.name),
                );
            }
        }
    }
}

/// How a target declares the result of a callback.
///
/// A callback's modeled type is its C return type plus one pointer level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackResult {
    /// The modeled type, except that `void**` becomes `void*`.
    Pointer,
    /// The C return type as declared.
    Declared,
}

impl CallbackResult {
    pub fn token(self, ty: &str) -> &str {
        match self {
            CallbackResult::Pointer if ty == "void**" => "void*",
            CallbackResult::Pointer => ty,
            CallbackResult::Declared => ty.strip_suffix('*').unwrap_or(ty),
        }
    }
}

/// Class name for a declaration: the part captured by `type_re` in
/// title case with underscores removed, or just capitalized when it has no
/// underscore.
pub fn derive_class_name(name: &str, type_re: &Regex) -> String {
    let base = type_re
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map_or(name, |m| m.as_str());
    if base.contains('_') {
        title_case(base).replace('_', "")
    } else {
        let mut chars = base.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// Upper-case every letter that follows a non-letter, lower-case the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut after_letter = false;
    for c in text.chars() {
        if after_letter {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        after_letter = c.is_alphabetic();
    }
    out
}

// -- Directions ---------------------------------------------------------------

/// Types passed by pointer so the callee can fill them in.
const OUT_TYPES: &[&str] = &["int*", "unsigned*", "libvlc_media_track_info_t**"];

/// Which parameters are inputs and which are outputs.
#[derive(Debug, Clone)]
pub struct DirectionPolicy {
    out_types: BTreeSet<String>,
    overrides: BTreeMap<(String, String), Direction>,
}

impl Default for DirectionPolicy {
    fn default() -> Self {
        DirectionPolicy {
            out_types: OUT_TYPES.iter().map(|t| t.to_string()).collect(),
            overrides: BTreeMap::new(),
        }
    }
}

impl DirectionPolicy {
    pub fn with_out_type(mut self, ty: &str) -> Self {
        self.out_types.insert(ty.to_string());
        self
    }

    /// Force the direction of one parameter of one function.
    pub fn with_override(mut self, function: &str, param: &str, direction: Direction) -> Self {
        self.overrides
            .insert((function.to_string(), param.to_string()), direction);
        self
    }

    /// Direction of `param` in `function`, given its documented output names.
    pub fn direction(&self, function: &str, param: &Parameter, documented_out: &[String]) -> Direction {
        if let Some(direction) = self
            .overrides
            .get(&(function.to_string(), param.name.clone()))
        {
            return *direction;
        }
        if documented_out.contains(&param.name) || self.out_types.contains(&param.ty) {
            Direction::Out
        } else {
            Direction::In
        }
    }
}

/// One `function:param=direction` override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionOverride {
    pub function: String,
    pub param: String,
    pub direction: Direction,
}

impl FromStr for DirectionOverride {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || format!("expected FUNCTION:PARAM=DIRECTION, got {}", s);
        let (target, direction) = s.split_once('=').ok_or_else(malformed)?;
        let (function, param) = target.split_once(':').ok_or_else(malformed)?;
        let (function, param) = (function.trim(), param.trim());
        if function.is_empty() || param.is_empty() {
            return Err(malformed());
        }
        Ok(DirectionOverride {
            function: function.to_string(),
            param: param.to_string(),
            direction: direction.trim().parse()?,
        })
    }
}

/// Set the direction of every function parameter.
///
/// Must run after the documentation transform, which provides the
/// documented output names.
pub fn assign_directions(functions: &mut [Function], policy: &DirectionPolicy) {
    for f in functions {
        for p in &mut f.params {
            p.direction = policy.direction(&f.name, p, &f.docs.out);
        }
    }
}
