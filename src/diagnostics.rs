//! Shared diagnostic and source-location types.
//!
//! `Level`'s ordering and `Display` impl follow the same shape as a
//! typical severity-ranked issue type, generalized here to the two
//! diagnostic phases this crate needs: extraction-time parse problems and
//! generation-time (resolver) problems.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A 1-based location in a single source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: usize, column: usize) -> Self {
        debug_assert!(line >= 1 && column >= 1);
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl Ord for SourceLocation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.file
            .cmp(&other.file)
            .then_with(|| self.line.cmp(&other.line))
            .then_with(|| self.column.cmp(&other.column))
    }
}

impl PartialOrd for SourceLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Warning,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
        }
    }
}

/// A single diagnostic, either from file extraction or from CSS generation
/// (resolution). The two phases carry different contextual fields, so this
/// is a tagged enum rather than one struct with optional fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "lowercase")]
pub enum Diagnostic {
    Extraction {
        level: Level,
        message: String,
        location: SourceLocation,
        #[serde(skip_serializing_if = "Option::is_none")]
        suggestion: Option<String>,
    },
    Generation {
        level: Level,
        message: String,
        class_name: String,
        /// `None` means "from additional_classes config, not from source".
        #[serde(skip_serializing_if = "Option::is_none")]
        locations: Option<Vec<SourceLocation>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        suggestion: Option<String>,
    },
}

impl Diagnostic {
    pub fn extraction(level: Level, message: impl Into<String>, location: SourceLocation) -> Self {
        Diagnostic::Extraction {
            level,
            message: message.into(),
            location,
            suggestion: None,
        }
    }

    pub fn parse_error(message: impl Into<String>, location: SourceLocation) -> Self {
        Diagnostic::Extraction {
            level: Level::Warning,
            message: format!("parse error: {}", message.into()),
            location,
            suggestion: None,
        }
    }

    pub fn generation(
        level: Level,
        message: impl Into<String>,
        class_name: impl Into<String>,
        locations: Option<Vec<SourceLocation>>,
    ) -> Self {
        Diagnostic::Generation {
            level,
            message: message.into(),
            class_name: class_name.into(),
            locations,
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        match &mut self {
            Diagnostic::Extraction { suggestion: s, .. } => *s = Some(suggestion.into()),
            Diagnostic::Generation { suggestion: s, .. } => *s = Some(suggestion.into()),
        }
        self
    }

    pub fn level(&self) -> Level {
        match self {
            Diagnostic::Extraction { level, .. } => *level,
            Diagnostic::Generation { level, .. } => *level,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Diagnostic::Extraction { message, .. } => message,
            Diagnostic::Generation { message, .. } => message,
        }
    }
}

/// How the embedding build layer should react to accumulated diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticPolicy {
    Log,
    Throw,
    /// Only valid for warnings.
    Ignore,
}

/// Raised when `apply_policy` finds diagnostics that the configured policy
/// says must fail the build.
#[derive(Debug, thiserror::Error)]
#[error("{} diagnostic(s) failed the build", .diagnostics.len())]
pub struct AggregateDiagnosticError {
    pub diagnostics: Vec<Diagnostic>,
}

/// Filter `diagnostics` by level and apply the configured policies.
///
/// Returns `Err` carrying every diagnostic whose level's policy is `Throw`
/// as one aggregate failure, after diagnostics whose policy is `Ignore`
/// have been dropped entirely.
pub fn apply_policy(
    diagnostics: &[Diagnostic],
    on_error: DiagnosticPolicy,
    on_warning: DiagnosticPolicy,
) -> Result<Vec<Diagnostic>, AggregateDiagnosticError> {
    let mut kept = Vec::new();
    let mut throwing = Vec::new();
    for d in diagnostics {
        let policy = match d.level() {
            Level::Error => on_error,
            Level::Warning => on_warning,
        };
        match policy {
            DiagnosticPolicy::Ignore => continue,
            DiagnosticPolicy::Log => kept.push(d.clone()),
            DiagnosticPolicy::Throw => {
                kept.push(d.clone());
                throwing.push(d.clone());
            }
        }
    }
    if throwing.is_empty() {
        Ok(kept)
    } else {
        Err(AggregateDiagnosticError {
            diagnostics: throwing,
        })
    }
}
