//! Auto-fix system for applying failure fixes to source text
//!
//! Fixes are taken in order of their span. A fix that overlaps one already
//! taken is skipped; it usually reappears after re-linting the fixed text, see
//! [`Linter::lint_and_fix`](crate::engine::Linter::lint_and_fix).

use crate::diagnostic::{Failure, Fix, Replacement};
use log::debug;
use std::ops::Range;

/// Result of applying fixes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixOutput {
    /// Text with all accepted fixes applied
    pub text: String,
    /// Number of fixes applied
    pub fixed: usize,
}

fn spans_overlap(a: &Range<usize>, b: &Range<usize>) -> bool {
    (a.start < b.end && b.start < a.end) || (a.start == b.start && !(a.is_empty() && b.is_empty()))
}

fn is_applicable(text: &str, fix: &Fix) -> bool {
    fix.replacements.iter().all(|r| {
        r.start <= r.end
            && r.end <= text.len()
            && text.is_char_boundary(r.start)
            && text.is_char_boundary(r.end)
    })
}

/// Apply the fixes of `failures` to `text`.
///
/// Failures without a fix and empty fixes are ignored.
pub fn apply_fixes(text: &str, failures: &[Failure]) -> FixOutput {
    let mut candidates: Vec<(Range<usize>, &Failure, &Fix)> = failures
        .iter()
        .filter_map(|f| {
            let fix = f.fix.as_ref()?;
            Some((fix.span()?, f, fix))
        })
        .collect();
    candidates.sort_by_key(|(span, _, _)| (span.start, span.end));

    let mut accepted: Vec<(Range<usize>, &Fix)> = Vec::new();
    for (span, failure, fix) in candidates {
        if !is_applicable(text, fix) {
            debug!(
                "Skipping fix of '{}' at {}..{}: not a valid range",
                failure.rule_name, span.start, span.end
            );
            continue;
        }
        if accepted.iter().any(|(taken, _)| spans_overlap(taken, &span)) {
            debug!(
                "Skipping fix of '{}' at {}..{}: overlaps a previous fix",
                failure.rule_name, span.start, span.end
            );
            continue;
        }
        accepted.push((span, fix));
    }

    // stable sort keeps inserts at the same offset in their original order
    let mut edits: Vec<&Replacement> = accepted
        .iter()
        .flat_map(|(_, fix)| fix.replacements.iter())
        .collect();
    edits.sort_by_key(|r| r.start);

    let mut output = text.to_string();
    for r in edits.iter().rev() {
        output.replace_range(r.start..r.end, &r.text);
    }

    FixOutput {
        text: output,
        fixed: accepted.len(),
    }
}
