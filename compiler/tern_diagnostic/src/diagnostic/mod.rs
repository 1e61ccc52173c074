//! Core diagnostic types and the loader's diagnostic constructors.

use std::fmt;
use tern_ir::Span;

use crate::ErrorCode;

/// Severity level for diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    /// Informational; not counted against the error limit.
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A labeled span with a message.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Label {
    /// The source location to highlight.
    pub span: Span,
    /// The label text explaining this location.
    pub message: String,
}

impl Label {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Label {
            span,
            message: message.into(),
        }
    }
}

/// A diagnostic with everything needed to render it.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[must_use = "diagnostics should be reported or returned, not silently dropped"]
pub struct Diagnostic {
    /// Error code for searchability.
    pub code: ErrorCode,
    /// Severity level.
    pub severity: Severity,
    /// Main error message.
    pub message: String,
    /// Labeled spans showing where the error occurred.
    pub labels: Vec<Label>,
    /// Additional notes providing context.
    pub notes: Vec<String>,
}

impl Diagnostic {
    fn new_with_severity(code: ErrorCode, severity: Severity) -> Self {
        Diagnostic {
            code,
            severity,
            message: String::new(),
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Create a new error diagnostic.
    #[cold]
    pub fn error(code: ErrorCode) -> Self {
        Self::new_with_severity(code, Severity::Error)
    }

    /// Create a new informational diagnostic.
    #[cold]
    pub fn note(code: ErrorCode) -> Self {
        Self::new_with_severity(code, Severity::Note)
    }

    /// Set the main message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add a label at the error location.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::new(span, message));
        self
    }

    /// Add a label if a location is known.
    ///
    /// Imports synthesized by the compiler have no location; their
    /// diagnostics carry no labels at all.
    pub fn with_optional_label(self, span: Option<Span>, message: impl Into<String>) -> Self {
        match span {
            Some(span) => self.with_label(span, message),
            None => self,
        }
    }

    /// Add a note providing additional context.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Span of the first label.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels.first().map(|l| l.span)
    }

    /// Check if this is an error (vs note).
    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.severity, self.code, self.message)?;

        for label in &self.labels {
            write!(f, "\n  --> {:?}: {}", label.span, label.message)?;
        }

        for note in &self.notes {
            write!(f, "\n  = note: {note}")?;
        }

        Ok(())
    }
}

/// A module file was found but reading it failed for a reason other than
/// absence.
pub fn opening_import(loc: Option<Span>, module: &str, error: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E7001)
        .with_message(format!("cannot open module file for '{module}': {error}"))
        .with_optional_label(loc, "imported here")
}

/// The module file's format version is newer than this compiler supports.
pub fn module_too_new(loc: Option<Span>, module: &str, found: u16, supported: u16) -> Diagnostic {
    Diagnostic::error(ErrorCode::E7002)
        .with_message(format!(
            "module '{module}' was built by a newer compiler"
        ))
        .with_optional_label(loc, "imported here")
        .with_note(format!(
            "module format version {found} is newer than the supported version {supported}"
        ))
}

/// The module file is structurally corrupt.
pub fn malformed_module(loc: Option<Span>, module: &str, reason: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E7003)
        .with_message(format!("malformed module file for '{module}'"))
        .with_optional_label(loc, "imported here")
        .with_note(reason.to_owned())
}

/// Exactly one declared dependency of the module is not loaded.
pub fn missing_single_dependency(loc: Option<Span>, dependency: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E7004)
        .with_message(format!("missing required module '{dependency}'"))
        .with_optional_label(loc, "required by this import")
}

/// Several declared dependencies of the module are not loaded.
///
/// Names are quoted and joined in declaration order: `'B', 'C'`.
pub fn missing_dependencies<S: AsRef<str>>(loc: Option<Span>, dependencies: &[S]) -> Diagnostic {
    let joined = dependencies
        .iter()
        .map(|d| format!("'{}'", d.as_ref()))
        .collect::<Vec<_>>()
        .join(", ");
    Diagnostic::error(ErrorCode::E7005)
        .with_message(format!("missing required modules: {joined}"))
        .with_optional_label(loc, "required by this import")
}
