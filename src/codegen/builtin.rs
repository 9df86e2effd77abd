//! Builtin Type Table
//!
//! Fixed mapping from scalar/format/collection names found in a document to
//! the canonical output types. Builtins never become models.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical builtin output type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Builtin {
    Void,
    Boolean,
    String,
    Number,
    Array,
    Record,
    Any,
    T,
    T1,
    T2,
    T3,
}

/// Every key the table recognises, with its canonical type
const TABLE: &[(&str, Builtin)] = &[
    ("void", Builtin::Void),
    ("boolean", Builtin::Boolean),
    ("string", Builtin::String),
    ("byte", Builtin::Number),
    ("integer", Builtin::Number),
    ("int", Builtin::Number),
    ("int32", Builtin::Number),
    ("int64", Builtin::Number),
    ("number", Builtin::Number),
    ("Number", Builtin::Number),
    ("date-time", Builtin::Number),
    ("Date", Builtin::Number),
    ("array", Builtin::Array),
    ("Array", Builtin::Array),
    ("List", Builtin::Array),
    ("Set", Builtin::Array),
    ("Map", Builtin::Record),
    ("any", Builtin::Any),
    ("object", Builtin::Any),
    ("Object", Builtin::Any),
    ("T", Builtin::T),
    ("T1", Builtin::T1),
    ("T2", Builtin::T2),
    ("T3", Builtin::T3),
];

impl Builtin {
    pub const CANONICAL: [Builtin; 11] = [
        Builtin::Void,
        Builtin::Boolean,
        Builtin::String,
        Builtin::Number,
        Builtin::Array,
        Builtin::Record,
        Builtin::Any,
        Builtin::T,
        Builtin::T1,
        Builtin::T2,
        Builtin::T3,
    ];

    /// Look a document type/format name up in the table
    pub fn lookup(key: &str) -> Option<Builtin> {
        TABLE.iter().find(|(k, _)| *k == key).map(|(_, b)| *b)
    }

    /// Parse an already-canonical name (as produced by [`Builtin::canonical`])
    pub fn from_canonical(name: &str) -> Option<Builtin> {
        Self::CANONICAL.iter().copied().find(|b| b.canonical() == name)
    }

    /// Lookup by table key first, then by canonical name
    pub fn recognize(name: &str) -> Option<Builtin> {
        Self::lookup(name).or_else(|| Self::from_canonical(name))
    }

    /// Whether `name` reads as a builtin anywhere a type name appears.
    ///
    /// Same predicate the type parser uses, so a definition is a model
    /// exactly when its references parse to a model.
    pub fn is_builtin(name: &str) -> bool {
        Self::recognize(name).is_some()
    }

    pub fn canonical(&self) -> &'static str {
        match self {
            Builtin::Void => "void",
            Builtin::Boolean => "boolean",
            Builtin::String => "string",
            Builtin::Number => "number",
            Builtin::Array => "Array",
            Builtin::Record => "Record",
            Builtin::Any => "any",
            Builtin::T => "T",
            Builtin::T1 => "T1",
            Builtin::T2 => "T2",
            Builtin::T3 => "T3",
        }
    }

    /// Generic placeholders pass through resolution untouched
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Builtin::T | Builtin::T1 | Builtin::T2 | Builtin::T3)
    }

    /// Collections take type arguments; everything else is a scalar
    pub fn is_collection(&self) -> bool {
        matches!(self, Builtin::Array | Builtin::Record)
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

/// Convert a declared `type`/`format` pair.
///
/// A format that maps to a builtin wins over the type (`string` +
/// `date-time` is a number); otherwise the type itself is looked up.
pub fn convert_builtin_type(type_name: Option<&str>, format: Option<&str>) -> Option<Builtin> {
    format
        .and_then(Builtin::lookup)
        .or_else(|| type_name.and_then(Builtin::lookup))
}

/// All table keys, for exhaustive checks
pub fn builtin_keys() -> impl Iterator<Item = &'static str> {
    TABLE.iter().map(|(k, _)| *k)
}
