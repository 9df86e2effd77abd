//! Diagnostics
//!
//! Collects the recoverable conditions a generation run hits. None of them
//! stop resolution; they are logged as they happen and carried on the IR so
//! callers can decide whether to fail.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Diagnostic code for categorizing issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// $ref target not found in `definitions` or `parameters`
    UnresolvedRef,
    /// More than one `in: body` parameter; only the first is used
    MultipleBodyParams,
    /// No usable schema on the success response; operation becomes a download
    MissingResponseSchema,
    /// A synthesized model name is already taken by a different model
    ModelNameCollision,
    /// Definitions reference each other in a cycle
    ReferenceCycle,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnresolvedRef => "W001",
            Self::MultipleBodyParams => "W002",
            Self::MissingResponseSchema => "W003",
            Self::ModelNameCollision => "W004",
            Self::ReferenceCycle => "I001",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::UnresolvedRef
            | Self::MultipleBodyParams
            | Self::MissingResponseSchema
            | Self::ModelNameCollision => Severity::Warning,

            Self::ReferenceCycle => Severity::Info,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

// =============================================================================
// Diagnostic Item
// =============================================================================

/// A single diagnostic item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticItem {
    /// What the diagnostic is about: a request path or a definition key
    pub subject: String,
    pub code: DiagnosticCode,
    pub message: String,
}

impl DiagnosticItem {
    pub fn new(
        subject: impl Into<String>,
        code: DiagnosticCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            code,
            message: message.into(),
        }
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for DiagnosticItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} ({})",
            self.code,
            self.code.severity(),
            self.message,
            self.subject
        )
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

/// Diagnostics gathered over one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    items: Vec<DiagnosticItem>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: DiagnosticItem) {
        self.items.push(item);
    }

    pub fn unresolved_ref(&mut self, subject: impl Into<String>, reference: &str) {
        self.push(DiagnosticItem::new(
            subject,
            DiagnosticCode::UnresolvedRef,
            format!("$ref target '{}' not found", reference),
        ));
    }

    pub fn multiple_body_params(&mut self, path: &str, count: usize) {
        self.push(DiagnosticItem::new(
            path,
            DiagnosticCode::MultipleBodyParams,
            format!("{} body parameters declared, using the first", count),
        ));
    }

    pub fn missing_response_schema(&mut self, path: &str) {
        self.push(DiagnosticItem::new(
            path,
            DiagnosticCode::MissingResponseSchema,
            "success response has no resolvable type, treating as download",
        ));
    }

    pub fn model_name_collision(&mut self, path: &str, model: &str) {
        self.push(DiagnosticItem::new(
            path,
            DiagnosticCode::ModelNameCollision,
            format!(
                "model '{}' already registered with different properties, keeping the first",
                model
            ),
        ));
    }

    pub fn reference_cycle(&mut self, members: &[String]) {
        self.push(DiagnosticItem::new(
            members.first().cloned().unwrap_or_default(),
            DiagnosticCode::ReferenceCycle,
            format!("definitions reference each other: {}", members.join(" -> ")),
        ));
    }

    pub fn with_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(move |i| i.code == code)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Warning)
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn all(&self) -> &[DiagnosticItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            writeln!(f, "{}", item)?;
        }
        if !self.is_empty() {
            writeln!(f, "\n{} warning(s)", self.warning_count())?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a DiagnosticItem;
    type IntoIter = std::slice::Iter<'a, DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_severity() {
        assert_eq!(DiagnosticCode::UnresolvedRef.severity(), Severity::Warning);
        assert_eq!(DiagnosticCode::ReferenceCycle.severity(), Severity::Info);
    }

    #[test]
    fn test_diagnostics_collection() {
        let mut diags = Diagnostics::new();
        diags.unresolved_ref("User", "#/definitions/Missing");
        diags.multiple_body_params("/user/save", 2);
        diags.reference_cycle(&["A".to_string(), "B".to_string()]);

        assert_eq!(diags.len(), 3);
        assert_eq!(diags.warning_count(), 2);
        assert_eq!(diags.with_code(DiagnosticCode::MultipleBodyParams).count(), 1);
        assert!(diags.to_string().contains("[W001] warning"));
    }
}
