//! Collected load-time diagnostics.
//!
//! Parsing and validation never abort on the first problem; every detected
//! issue is appended to an [`ErrorLog`] so the caller sees the complete set.
//! After each import stage the caller inspects the log and decides whether to
//! keep the partially built database.

use std::fmt;

#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};

/// Classifies what went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
pub enum DiagnosticKind {
    /// A file could not be opened or another environment failure.
    System,
    /// An ill-formed GEDCOM line (bad level, bad key, missing tag).
    Syntax,
    /// Structurally parseable but violating record rules (missing key,
    /// duplicate key, invalid reference, duplicate REFN).
    Gedcom,
    /// Cross-record integrity failure (dangling or unreciprocated links).
    Linkage,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DiagnosticKind::System => write!(f, "system error"),
            DiagnosticKind::Syntax => write!(f, "syntax error"),
            DiagnosticKind::Gedcom => write!(f, "semantic error"),
            DiagnosticKind::Linkage => write!(f, "linkage error"),
        }
    }
}

/// Classifies how a diagnostic is handled after detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
pub enum Severity {
    /// Abort the whole load.
    Fatal,
    /// Abort construction of the specific database.
    Severe,
    /// The database may still be used.
    Warning,
    /// Informational only.
    Comment,
}

/// A single collected diagnostic.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
pub struct Diagnostic {
    /// What kind of problem this is.
    pub kind: DiagnosticKind,
    /// How the problem is handled after detection.
    pub severity: Severity,
    /// Name of the source file the problem was found in.
    pub file: String,
    /// Line number in the source file; 0 when no line applies.
    pub line: usize,
    /// Human-readable description.
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic with the default `Severe` severity.
    #[must_use]
    pub fn new(kind: DiagnosticKind, file: &str, line: usize, message: impl Into<String>) -> Self {
        Diagnostic {
            kind,
            severity: Severity::Severe,
            file: file.to_string(),
            line,
            message: message.into(),
        }
    }

    /// Returns the diagnostic with its severity replaced.
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} in {}", self.kind, self.file)?;
        if self.line > 0 {
            write!(f, " line {}: ", self.line)?;
        } else {
            write!(f, ": ")?;
        }
        write!(f, "{}", self.message)
    }
}

/// The list of diagnostics collected during a load.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
pub struct ErrorLog {
    entries: Vec<Diagnostic>,
}

impl ErrorLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        ErrorLog::default()
    }

    /// Appends a diagnostic to the log.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// Returns the number of collected diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates the diagnostics in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    /// Returns the diagnostics sorted by `(file, line)` for display.
    #[must_use]
    pub fn sorted(&self) -> Vec<&Diagnostic> {
        let mut refs: Vec<&Diagnostic> = self.entries.iter().collect();
        refs.sort_by(|a, b| a.file.cmp(&b.file).then(a.line.cmp(&b.line)));
        refs
    }
}

impl fmt::Display for ErrorLog {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for diagnostic in self.sorted() {
            writeln!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ErrorLog {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display_with_line() {
        let diagnostic = Diagnostic::new(DiagnosticKind::Syntax, "sample.ged", 3, "missing tag");
        assert_eq!(
            format!("{diagnostic}"),
            "syntax error in sample.ged line 3: missing tag"
        );
    }

    #[test]
    fn test_diagnostic_display_without_line() {
        let diagnostic = Diagnostic::new(DiagnosticKind::System, "sample.ged", 0, "cannot open");
        assert_eq!(
            format!("{diagnostic}"),
            "system error in sample.ged: cannot open"
        );
    }

    #[test]
    fn test_log_sorted_by_file_then_line() {
        let mut log = ErrorLog::new();
        log.add(Diagnostic::new(DiagnosticKind::Gedcom, "b.ged", 2, "two"));
        log.add(Diagnostic::new(DiagnosticKind::Gedcom, "a.ged", 9, "nine"));
        log.add(Diagnostic::new(DiagnosticKind::Gedcom, "a.ged", 1, "one"));

        let sorted = log.sorted();
        assert_eq!(sorted[0].message, "one");
        assert_eq!(sorted[1].message, "nine");
        assert_eq!(sorted[2].message, "two");
    }

    #[test]
    fn test_default_severity_is_severe() {
        let diagnostic = Diagnostic::new(DiagnosticKind::Linkage, "a.ged", 1, "msg");
        assert_eq!(diagnostic.severity, Severity::Severe);
    }
}
