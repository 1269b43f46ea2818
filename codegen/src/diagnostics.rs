//! Diagnostics reported while generating builders.
//!
//! A [`Diagnostic`] never aborts a pass on its own. An error abandons the one
//! builder it concerns (or skips one modifier transform); a note is purely
//! informational.

use std::fmt;
use std::path::PathBuf;

/// How serious a [`Diagnostic`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    /// Abandons a builder, or skips a modifier transform.
    Error,
    /// Informational only.
    Note,
}

/// A position in a scanned source file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    /// File the position belongs to.
    pub file:   PathBuf,
    /// 1-based line.
    pub line:   usize,
    /// 1-based column.
    pub column: usize,
}

impl Location {
    /// Location of `span` inside `file`.
    #[must_use]
    pub fn from_span(file: &std::path::Path, span: proc_macro2::Span) -> Self {
        let start = span.start();
        Self {
            file:   file.to_path_buf(),
            line:   start.line,
            column: start.column + 1,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// A message attached to an optional source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity of the message.
    pub severity: Severity,
    /// Human readable message.
    pub message:  String,
    /// Where the problem was found, when known.
    pub location: Option<Location>,
}

impl Diagnostic {
    /// An error diagnostic.
    pub fn error(message: impl Into<String>, location: impl Into<Option<Location>>) -> Self {
        Self {
            severity: Severity::Error,
            message:  message.into(),
            location: location.into(),
        }
    }

    /// An informational diagnostic.
    pub fn note(message: impl Into<String>, location: impl Into<Option<Location>>) -> Self {
        Self {
            severity: Severity::Note,
            message:  message.into(),
            location: location.into(),
        }
    }

    /// Whether this diagnostic is an error.
    #[must_use]
    pub fn is_error(&self) -> bool { self.severity == Severity::Error }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{location}: {}: {}", self.severity, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// An ordered collection of diagnostics.
///
/// Every diagnostic pushed here is mirrored as a `tracing` event.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// An empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => tracing::warn!("{diagnostic}"),
            Severity::Note => tracing::debug!("{diagnostic}"),
        }
        self.entries.push(diagnostic);
    }

    /// Record an error.
    pub fn error(&mut self, message: impl Into<String>, location: impl Into<Option<Location>>) {
        self.push(Diagnostic::error(message, location));
    }

    /// Record a note.
    pub fn note(&mut self, message: impl Into<String>, location: impl Into<Option<Location>>) {
        self.push(Diagnostic::note(message, location));
    }

    /// Append every diagnostic of `other`, keeping order.
    pub fn append(&mut self, other: Self) { self.entries.extend(other.entries); }

    /// Whether any error was recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool { self.entries.iter().any(Diagnostic::is_error) }

    /// Iterate in recording order.
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> { self.entries.iter() }

    /// Number of recorded diagnostics.
    #[must_use]
    pub const fn len(&self) -> usize { self.entries.len() }

    /// Whether nothing was recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// The recorded diagnostics as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Diagnostic] { &self.entries }

    /// The recorded diagnostics.
    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> { self.entries }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        for diagnostic in iter {
            self.push(diagnostic);
        }
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type IntoIter = std::slice::Iter<'a, Diagnostic>;
    type Item = &'a Diagnostic;

    fn into_iter(self) -> Self::IntoIter { self.entries.iter() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> Location {
        Location {
            file:   PathBuf::from("src/lib.rs"),
            line:   3,
            column: 5,
        }
    }

    #[test]
    fn display_includes_location_when_present() {
        let located = Diagnostic::error("no constructor", location());
        assert_eq!(located.to_string(), "src/lib.rs:3:5: error: no constructor");

        let bare = Diagnostic::note("nothing to do", None);
        assert_eq!(bare.to_string(), "note: nothing to do");
    }

    #[test]
    fn has_errors_ignores_notes() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.note("writing", None);
        assert!(!diagnostics.has_errors());

        diagnostics.error("broken", location());
        assert!(diagnostics.has_errors());
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn append_keeps_order() {
        let mut first = Diagnostics::new();
        first.note("one", None);
        let mut second = Diagnostics::new();
        second.error("two", None);
        second.note("three", None);

        first.append(second);
        let messages: Vec<_> = first.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, ["one", "two", "three"]);
    }
}
