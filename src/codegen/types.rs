//! Type Expressions
//!
//! Resolution builds a [`TypeExpr`] tree directly; text only appears when a
//! tree is rendered. Documents spell generics either as `Result«User»` or
//! `Result<User>`, so [`TypeExpr::parse`] accepts both and always renders
//! angle brackets.
//!
//! Because a rendered tree parses back to the same tree, [`fix_model_type`]
//! (parse, then render) is idempotent: feeding it its own output changes
//! nothing, including namespace qualification.

use std::collections::HashSet;
use std::fmt::{self, Write as _};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::builtin::Builtin;

/// Canonical, structured output type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    /// A non-collection builtin, including the `T`..`T3` placeholders
    Scalar(Builtin),
    /// `Array<T>`
    Array(Box<TypeExpr>),
    /// `Record<K, V>`
    Map(Box<TypeExpr>, Box<TypeExpr>),
    /// A model with substituted type arguments, `Base<P1, P2>`
    Generic { base: String, params: Vec<TypeExpr> },
    /// A registered model
    ModelRef(String),
    /// A `$ref` whose definition does not exist; renders empty
    Unresolved(String),
}

impl TypeExpr {
    /// The generic slot `T`
    pub fn placeholder() -> Self {
        TypeExpr::Scalar(Builtin::T)
    }

    pub fn any() -> Self {
        TypeExpr::Scalar(Builtin::Any)
    }

    pub fn void() -> Self {
        TypeExpr::Scalar(Builtin::Void)
    }

    /// Expression for a bare builtin; collections default to `any` elements
    pub fn from_builtin(builtin: Builtin) -> Self {
        match builtin {
            Builtin::Array => TypeExpr::Array(Box::new(Self::any())),
            Builtin::Record => TypeExpr::Map(
                Box::new(TypeExpr::Scalar(Builtin::String)),
                Box::new(Self::any()),
            ),
            other => TypeExpr::Scalar(other),
        }
    }

    /// Attach an `items` type to this expression.
    ///
    /// Collections take it as their element type and models become
    /// `Model<Items>`; scalars have nowhere to put it and are returned as is.
    pub fn with_items(self, items: TypeExpr) -> Self {
        match self {
            TypeExpr::Array(_) => TypeExpr::Array(Box::new(items)),
            TypeExpr::Map(key, _) => TypeExpr::Map(key, Box::new(items)),
            TypeExpr::ModelRef(base) => TypeExpr::Generic { base, params: vec![items] },
            TypeExpr::Generic { base, mut params } => {
                params.push(items);
                TypeExpr::Generic { base, params }
            }
            other @ (TypeExpr::Scalar(_) | TypeExpr::Unresolved(_)) => other,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeExpr::Scalar(Builtin::Void))
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, TypeExpr::Scalar(b) if b.is_placeholder())
    }

    /// True if any node of the tree is unresolved
    pub fn is_unresolved(&self) -> bool {
        match self {
            TypeExpr::Unresolved(_) => true,
            TypeExpr::Array(inner) => inner.is_unresolved(),
            TypeExpr::Map(k, v) => k.is_unresolved() || v.is_unresolved(),
            TypeExpr::Generic { params, .. } => params.iter().any(TypeExpr::is_unresolved),
            TypeExpr::Scalar(_) | TypeExpr::ModelRef(_) => false,
        }
    }

    /// Every model name referenced anywhere in the tree
    pub fn model_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_model_names(&mut out);
        out
    }

    fn collect_model_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TypeExpr::ModelRef(name) => out.push(name),
            TypeExpr::Generic { base, params } => {
                out.push(base);
                params.iter().for_each(|p| p.collect_model_names(out));
            }
            TypeExpr::Array(inner) => inner.collect_model_names(out),
            TypeExpr::Map(k, v) => {
                k.collect_model_names(out);
                v.collect_model_names(out);
            }
            TypeExpr::Scalar(_) | TypeExpr::Unresolved(_) => {}
        }
    }

    /// Replace generic arguments with the placeholder `T`.
    ///
    /// A subtree equal to one of `args`, or a model named in `names`, becomes
    /// `T`; everything else is rebuilt with its children substituted.
    pub fn substitute_placeholder(&self, args: &[TypeExpr], names: &HashSet<String>) -> TypeExpr {
        if args.contains(self) {
            return Self::placeholder();
        }
        match self {
            TypeExpr::ModelRef(name) if names.contains(name) => Self::placeholder(),
            TypeExpr::Array(inner) => {
                TypeExpr::Array(Box::new(inner.substitute_placeholder(args, names)))
            }
            TypeExpr::Map(k, v) => TypeExpr::Map(
                Box::new(k.substitute_placeholder(args, names)),
                Box::new(v.substitute_placeholder(args, names)),
            ),
            TypeExpr::Generic { base, params } => TypeExpr::Generic {
                base: base.clone(),
                params: params.iter().map(|p| p.substitute_placeholder(args, names)).collect(),
            },
            other => other.clone(),
        }
    }

    /// Render, qualifying model names with `namespace.` when given
    pub fn render(&self, namespace: Option<&str>) -> String {
        let mut out = String::new();
        self.write_to(&mut out, namespace);
        out
    }

    fn write_to(&self, out: &mut String, namespace: Option<&str>) {
        let qualify = |out: &mut String, name: &str| {
            if let Some(ns) = namespace.filter(|ns| !ns.is_empty()) {
                let _ = write!(out, "{}.", ns);
            }
            out.push_str(name);
        };
        match self {
            TypeExpr::Scalar(builtin) => out.push_str(builtin.canonical()),
            TypeExpr::Array(inner) => {
                out.push_str("Array<");
                inner.write_to(out, namespace);
                out.push('>');
            }
            TypeExpr::Map(key, value) => {
                out.push_str("Record<");
                key.write_to(out, namespace);
                out.push_str(", ");
                value.write_to(out, namespace);
                out.push('>');
            }
            TypeExpr::Generic { base, params } => {
                qualify(out, base);
                out.push('<');
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    param.write_to(out, namespace);
                }
                out.push('>');
            }
            TypeExpr::ModelRef(name) => qualify(out, name),
            TypeExpr::Unresolved(_) => {}
        }
    }

    /// Parse a textual type expression.
    ///
    /// Accepts `«»` and `<>` delimiters, comma-separated arguments, raw
    /// builtin keys (`List`, `int64`, `Map`) and names already qualified with
    /// `namespace.`. Parsing is lenient: missing closers are implied and
    /// trailing input is ignored.
    pub fn parse(text: &str, namespace: Option<&str>) -> TypeExpr {
        let tokens = tokenize(text);
        let mut parser = Parser { tokens: &tokens, pos: 0, namespace };
        parser.expr()
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(None))
    }
}

impl Serialize for TypeExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.render(None))
    }
}

impl<'de> Deserialize<'de> for TypeExpr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(TypeExpr::parse(&text, None))
    }
}

/// Canonicalize a textual type: builtin keys become canonical names, model
/// names get the namespace prefix, and generic markers become `<>`.
pub fn fix_model_type(text: &str, namespace: Option<&str>) -> String {
    TypeExpr::parse(text, namespace).render(namespace)
}

/// Open/close markers a definition key may use for generics
pub fn is_generic_key(key: &str) -> bool {
    (key.contains('«') && key.contains('»')) || (key.contains('<') && key.contains('>'))
}

/// Identifier tokens of a key, split on generic markers and commas, first
/// occurrence order, deduplicated
pub fn extract_generic_names(key: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    key.split(|c: char| matches!(c, '«' | '»' | '<' | '>' | ','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_string()))
        .map(str::to_string)
        .collect()
}

// =============================================================================
// Parsing
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Open,
    Close,
    Comma,
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut ident = String::new();
    let flush = |ident: &mut String, tokens: &mut Vec<Token>| {
        let trimmed = ident.trim();
        if !trimmed.is_empty() {
            tokens.push(Token::Ident(trimmed.to_string()));
        }
        ident.clear();
    };
    for c in text.chars() {
        let token = match c {
            '«' | '<' => Token::Open,
            '»' | '>' => Token::Close,
            ',' => Token::Comma,
            _ => {
                ident.push(c);
                continue;
            }
        };
        flush(&mut ident, &mut tokens);
        tokens.push(token);
    }
    flush(&mut ident, &mut tokens);
    tokens
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    namespace: Option<&'a str>,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn expr(&mut self) -> TypeExpr {
        let name = match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                name
            }
            _ => String::new(),
        };

        let mut params = Vec::new();
        if self.peek() == Some(&Token::Open) {
            self.pos += 1;
            // an empty slot (`Result<>`) is an unresolved argument, not "no arguments"
            loop {
                params.push(self.expr());
                match self.peek() {
                    Some(Token::Comma) => self.pos += 1,
                    Some(Token::Close) => {
                        self.pos += 1;
                        break;
                    }
                    _ => break,
                }
            }
        }

        self.build(&name, params)
    }

    fn build(&self, name: &str, mut params: Vec<TypeExpr>) -> TypeExpr {
        let name = match self.namespace.filter(|ns| !ns.is_empty()) {
            Some(ns) => name
                .strip_prefix(ns)
                .and_then(|rest| rest.strip_prefix('.'))
                .unwrap_or(name),
            None => name,
        };
        if name.is_empty() {
            return TypeExpr::Unresolved(String::new());
        }
        match Builtin::recognize(name) {
            Some(Builtin::Array) => match params.into_iter().next() {
                Some(items) => TypeExpr::Array(Box::new(items)),
                None => TypeExpr::from_builtin(Builtin::Array),
            },
            Some(Builtin::Record) => match params.len() {
                0 => TypeExpr::from_builtin(Builtin::Record),
                1 => TypeExpr::Map(
                    Box::new(TypeExpr::Scalar(Builtin::String)),
                    Box::new(params.remove(0)),
                ),
                _ => {
                    let key = params.remove(0);
                    let value = params.remove(0);
                    TypeExpr::Map(Box::new(key), Box::new(value))
                }
            },
            Some(builtin) => TypeExpr::Scalar(builtin),
            None if params.is_empty() => TypeExpr::ModelRef(name.to_string()),
            None => TypeExpr::Generic { base: name.to_string(), params },
        }
    }
}
