//! Error and diagnostic types
//!
//! Lexer and parser errors live next to their stages
//! ([`crate::parser::lexer::LexError`], [`crate::parser::ParseError`]). This
//! module holds the model-level types and the [`Report`] that collects every
//! diagnostic of a pipeline run.

use crate::parser::ast::SourceLocation;
use crate::parser::lexer::LexError;
use crate::parser::ParseError;
use std::fmt;
use thiserror::Error;

/// Degraded but non-fatal outcome of resolving a reference
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolutionWarning {
    #[error("unresolved base class '{base}' of '{entity}'")]
    UnresolvedBase {
        entity: String,
        base: String,
        file: String,
        location: SourceLocation,
    },

    #[error("ambiguous reference '{reference}' in '{entity}' (candidates: {})", .candidates.join(", "))]
    Ambiguous {
        entity: String,
        reference: String,
        candidates: Vec<String>,
        file: String,
        location: SourceLocation,
    },

    #[error("inheritance of '{derived}' from '{base}' would create a cycle; edge ignored")]
    InheritanceCycle {
        derived: String,
        base: String,
        file: String,
        location: SourceLocation,
    },

    #[error("unresolved type '{reference}' of member '{member}' in '{entity}'")]
    UnresolvedType {
        entity: String,
        member: String,
        reference: String,
        file: String,
        location: SourceLocation,
    },
}

impl ResolutionWarning {
    pub fn file(&self) -> &str {
        match self {
            ResolutionWarning::UnresolvedBase { file, .. }
            | ResolutionWarning::Ambiguous { file, .. }
            | ResolutionWarning::InheritanceCycle { file, .. }
            | ResolutionWarning::UnresolvedType { file, .. } => file,
        }
    }

    pub fn location(&self) -> SourceLocation {
        match self {
            ResolutionWarning::UnresolvedBase { location, .. }
            | ResolutionWarning::Ambiguous { location, .. }
            | ResolutionWarning::InheritanceCycle { location, .. }
            | ResolutionWarning::UnresolvedType { location, .. } => *location,
        }
    }
}

/// The model cannot be built consistently; always fatal
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelInvariantViolation {
    #[error("'{name}' is defined more than once ({first_file}:{first} and {second_file}:{second})")]
    DuplicateDefinition {
        name: String,
        first_file: String,
        first: SourceLocation,
        second_file: String,
        second: SourceLocation,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// One reported problem, attributed to an input
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub source: String,
    pub severity: Severity,
    pub location: SourceLocation,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}: {}",
            self.source, self.location, self.severity, self.message
        )
    }
}

/// Every diagnostic of a run, in input order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_lex_error(&mut self, source: &str, err: &LexError) {
        self.diagnostics.push(Diagnostic {
            source: source.to_string(),
            severity: Severity::Error,
            location: err.location,
            message: err.message.clone(),
        });
    }

    pub fn push_parse_error(&mut self, source: &str, err: &ParseError) {
        self.diagnostics.push(Diagnostic {
            source: source.to_string(),
            severity: Severity::Error,
            location: err.location,
            message: err.message.clone(),
        });
    }

    pub fn push_warning(&mut self, warning: &ResolutionWarning) {
        self.diagnostics.push(Diagnostic {
            source: warning.file().to_string(),
            severity: Severity::Warning,
            location: warning.location(),
            message: warning.to_string(),
        });
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.diagnostics {
            writeln!(f, "{}", diagnostic)?;
        }
        write!(
            f,
            "{} error(s), {} warning(s)",
            self.error_count(),
            self.warning_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_report_listing() {
        let mut report = Report::new();
        report.push_parse_error(
            "a.hpp",
            &ParseError {
                message: "Expected ';' after member 'x', found '}'".to_string(),
                location: SourceLocation::new(3, 9, 40),
            },
        );
        report.push_warning(&ResolutionWarning::UnresolvedBase {
            entity: "Derived".to_string(),
            base: "Missing".to_string(),
            file: "b.hpp".to_string(),
            location: SourceLocation::new(1, 1, 0),
        });

        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
        assert_eq!(
            report.to_string(),
            "a.hpp:3:9: error: Expected ';' after member 'x', found '}'\n\
             b.hpp:1:1: warning: unresolved base class 'Missing' of 'Derived'\n\
             1 error(s), 1 warning(s)"
        );
    }

    #[test]
    fn test_duplicate_definition_message() {
        let err = ModelInvariantViolation::DuplicateDefinition {
            name: "ns::A".to_string(),
            first_file: "a.hpp".to_string(),
            first: SourceLocation::new(2, 1, 10),
            second_file: "b.hpp".to_string(),
            second: SourceLocation::new(5, 3, 50),
        };
        assert_eq!(
            err.to_string(),
            "'ns::A' is defined more than once (a.hpp:2:1 and b.hpp:5:3)"
        );
    }
}
