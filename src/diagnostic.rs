//! Diagnostic types for linting results

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Severity level for failures
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Hint that something could be written better
    Suggestion,
    /// Warning - potential issue
    Warning,
    /// Error - definite problem
    #[default]
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Suggestion => write!(f, "suggestion"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "suggestion" | "hint" | "info" => Ok(Severity::Suggestion),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" | "err" => Ok(Severity::Error),
            _ => Err(()),
        }
    }
}

/// Delete the text in `start..end` and insert `text` in its place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Replacement {
    /// Replace a span with new text
    pub fn replace(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Delete a span
    pub fn delete(start: usize, end: usize) -> Self {
        Self::replace(start, end, "")
    }

    /// Insert text at a position without removing anything
    pub fn append(start: usize, text: impl Into<String>) -> Self {
        Self::replace(start, start, text)
    }

    /// Check whether two replacements touch the same text.
    ///
    /// Zero-width inserts at the same position don't overlap.
    pub fn overlaps(&self, other: &Replacement) -> bool {
        (self.start < other.end && other.start < self.end)
            || (self.start == other.start && (self.start != self.end || other.start != other.end))
    }
}

/// An auto-fix: non-overlapping replacements in one compilation unit.
///
/// An empty fix is a marker that carries no edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fix {
    pub replacements: Vec<Replacement>,
}

impl Fix {
    /// Create a fix from replacements
    pub fn new(replacements: Vec<Replacement>) -> Self {
        Self { replacements }
    }

    /// Create a fix from a single replacement
    pub fn single(replacement: Replacement) -> Self {
        Self {
            replacements: vec![replacement],
        }
    }

    /// Check if the fix carries no edits
    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }

    /// Smallest range covering all replacements
    pub fn span(&self) -> Option<Range<usize>> {
        let start = self.replacements.iter().map(|r| r.start).min()?;
        let end = self.replacements.iter().map(|r| r.end).max()?;
        Some(start..end)
    }

    /// Find the first pair of overlapping replacements, if any
    pub fn find_overlap(&self) -> Option<(&Replacement, &Replacement)> {
        let mut sorted: Vec<&Replacement> = self.replacements.iter().collect();
        sorted.sort_by_key(|r| (r.start, r.end));
        sorted
            .windows(2)
            .find(|pair| pair[0].overlaps(pair[1]))
            .map(|pair| (pair[0], pair[1]))
    }
}

/// A single reported problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    /// Start offset in the compilation unit
    pub start: usize,
    /// End offset in the compilation unit
    pub end: usize,
    /// Human-readable message
    pub message: String,
    /// Rule that reported this failure
    pub rule_name: String,
    /// Severity level
    pub severity: Severity,
    /// Suggested fix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<Fix>,
}

impl Failure {
    /// Check if this failure has a fix with at least one edit
    pub fn is_fixable(&self) -> bool {
        self.fix.as_ref().is_some_and(|f| !f.is_empty())
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Everything a formatter gets to know about one linted file
#[derive(Debug, Clone, Default)]
pub struct FileSummary {
    /// File name
    pub file_name: String,
    /// Full text content after fixing
    pub content: String,
    /// Remaining failures, ordered by position
    pub failures: Vec<Failure>,
    /// Number of fixes applied during this run
    pub fixes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Suggestion);
    }

    #[test]
    fn test_severity_from_str() {
        assert_eq!("error".parse::<Severity>(), Ok(Severity::Error));
        assert_eq!("warning".parse::<Severity>(), Ok(Severity::Warning));
        assert_eq!("suggestion".parse::<Severity>(), Ok(Severity::Suggestion));
        assert_eq!("warn".parse::<Severity>(), Ok(Severity::Warning));
        assert_eq!("hint".parse::<Severity>(), Ok(Severity::Suggestion));
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(format!("{}", Severity::Error), "error");
        assert_eq!(format!("{}", Severity::Warning), "warning");
        assert_eq!(format!("{}", Severity::Suggestion), "suggestion");
    }

    #[test]
    fn test_replacement_overlap() {
        let a = Replacement::delete(0, 5);
        assert!(a.overlaps(&Replacement::delete(4, 6)));
        assert!(!a.overlaps(&Replacement::delete(5, 6)));
        assert!(!Replacement::append(3, "x").overlaps(&Replacement::append(3, "y")));
        assert!(Replacement::append(3, "x").overlaps(&Replacement::delete(3, 4)));
    }

    #[test]
    fn test_fix_span_and_overlap() {
        let fix = Fix::new(vec![Replacement::delete(10, 12), Replacement::append(2, "a")]);
        assert_eq!(fix.span(), Some(2..12));
        assert!(fix.find_overlap().is_none());

        let bad = Fix::new(vec![Replacement::delete(0, 4), Replacement::delete(2, 6)]);
        assert!(bad.find_overlap().is_some());

        assert_eq!(Fix::default().span(), None);
        assert!(Fix::default().is_empty());
    }

    #[test]
    fn test_failure_fixable() {
        let mut failure = Failure {
            start: 0,
            end: 1,
            message: "msg".to_string(),
            rule_name: "rule".to_string(),
            severity: Severity::Warning,
            fix: None,
        };
        assert!(!failure.is_fixable());
        failure.fix = Some(Fix::default());
        assert!(!failure.is_fixable());
        failure.fix = Some(Fix::single(Replacement::delete(0, 1)));
        assert!(failure.is_fixable());
        assert!(!failure.is_error());
    }
}
