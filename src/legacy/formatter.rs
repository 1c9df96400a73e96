//! Run a legacy formatter as a native [`Formatter`]

use super::{LegacyFailure, LegacyFix, LegacyFormatter, LegacyReplacement, LegacySeverity};
use crate::ast::SourceText;
use crate::diagnostic::{Failure, FileSummary, Severity};
use crate::output::Formatter;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

/// Collects the failures of a run and hands them to the legacy formatter on
/// flush. Serves a single run.
pub struct LegacyFormatterAdapter {
    delegate: Box<dyn LegacyFormatter>,
    failures: Vec<LegacyFailure>,
    fixed: Vec<LegacyFailure>,
    sources: HashMap<String, Arc<SourceText>>,
}

pub fn wrap_legacy_formatter(formatter: Box<dyn LegacyFormatter>) -> LegacyFormatterAdapter {
    LegacyFormatterAdapter {
        delegate: formatter,
        failures: Vec::new(),
        fixed: Vec::new(),
        sources: HashMap::new(),
    }
}

impl LegacyFormatterAdapter {
    /// Source the legacy failures of a file point into
    fn source(&mut self, file_name: &str, content: &str) -> Arc<SourceText> {
        match self.sources.get(file_name) {
            Some(source) if source.text() == content => source.clone(),
            _ => {
                let source = Arc::new(SourceText::new(file_name, content));
                self.sources.insert(file_name.to_string(), source.clone());
                source
            }
        }
    }
}

fn convert_severity(severity: Severity) -> LegacySeverity {
    match severity {
        Severity::Error => LegacySeverity::Error,
        Severity::Warning | Severity::Suggestion => LegacySeverity::Warning,
    }
}

fn convert_failure(source: Arc<SourceText>, failure: &Failure) -> LegacyFailure {
    let fix = failure.fix.as_ref().map(|fix| {
        LegacyFix::Multiple(
            fix.replacements
                .iter()
                .map(|r| LegacyReplacement::new(r.start, r.end - r.start, r.text.clone()))
                .collect(),
        )
    });
    let mut converted = LegacyFailure::new(
        source,
        failure.start,
        failure.end,
        failure.message.clone(),
        failure.rule_name.clone(),
        fix,
    );
    converted.set_severity(convert_severity(failure.severity));
    converted
}

impl Formatter for LegacyFormatterAdapter {
    fn format(&mut self, file_name: &str, summary: &FileSummary) -> Option<String> {
        if summary.fixes == 0 && summary.failures.is_empty() {
            return None;
        }
        let source = self.source(file_name, &summary.content);

        // the legacy API only learns how many fixes were applied, not which
        for _ in 0..summary.fixes {
            self.fixed.push(LegacyFailure::new(
                source.clone(),
                0,
                0,
                "",
                "",
                Some(LegacyFix::Single(LegacyReplacement::append_text(0, ""))),
            ));
        }

        self.failures.extend(
            summary
                .failures
                .iter()
                .map(|f| convert_failure(source.clone(), f)),
        );
        None
    }

    fn flush(&mut self) -> Option<String> {
        debug!(
            "Flushing {} failures and {} fixes to legacy formatter",
            self.failures.len(),
            self.fixed.len()
        );
        let output = self.delegate.format(&self.failures, &self.fixed);
        Some(output.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{Fix, Replacement};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Captured {
        calls: usize,
        failures: Vec<LegacyFailure>,
        fixes: Vec<LegacyFailure>,
    }

    struct Capture(Arc<Mutex<Captured>>);

    impl LegacyFormatter for Capture {
        fn format(&mut self, failures: &[LegacyFailure], fixes: &[LegacyFailure]) -> String {
            let mut captured = self.0.lock().unwrap();
            captured.calls += 1;
            captured.failures = failures.to_vec();
            captured.fixes = fixes.to_vec();
            format!("\n  {} failures  \n\n", failures.len())
        }
    }

    fn capture() -> (LegacyFormatterAdapter, Arc<Mutex<Captured>>) {
        let captured = Arc::new(Mutex::new(Captured::default()));
        (
            wrap_legacy_formatter(Box::new(Capture(captured.clone()))),
            captured,
        )
    }

    fn failure(start: usize, end: usize, severity: Severity, fix: Option<Fix>) -> Failure {
        Failure {
            start,
            end,
            message: "msg".to_string(),
            rule_name: "rule".to_string(),
            severity,
            fix,
        }
    }

    #[test]
    fn test_flush_calls_delegate_once_and_trims() {
        let (mut adapter, captured) = capture();
        let summary = FileSummary {
            file_name: "a.ts".to_string(),
            content: "await 5;".to_string(),
            failures: vec![failure(0, 7, Severity::Error, None)],
            fixes: 0,
        };
        assert_eq!(adapter.format("a.ts", &summary), None);
        assert_eq!(adapter.format("b.ts", &FileSummary::default()), None);
        assert_eq!(captured.lock().unwrap().calls, 0);

        assert_eq!(adapter.flush(), Some("1 failures".to_string()));
        assert_eq!(captured.lock().unwrap().calls, 1);
    }

    #[test]
    fn test_failures_are_translated() {
        let (mut adapter, captured) = capture();
        let fix = Fix::new(vec![
            Replacement::delete(9, 15),
            Replacement::replace(16, 17, "x"),
        ]);
        let summary = FileSummary {
            file_name: "a.ts".to_string(),
            content: "let a;\n  await 5;\n".to_string(),
            failures: vec![
                failure(9, 16, Severity::Error, Some(fix)),
                failure(0, 3, Severity::Suggestion, None),
            ],
            fixes: 0,
        };
        adapter.format("a.ts", &summary);
        adapter.flush();

        let captured = captured.lock().unwrap();
        let first = &captured.failures[0];
        assert_eq!(first.file_name(), "a.ts");
        assert_eq!(first.start_position().position, 9);
        assert_eq!(first.start_position().line, 1);
        assert_eq!(first.start_position().character, 2);
        assert_eq!(first.end_position().position, 16);
        assert_eq!(first.failure(), "msg");
        assert_eq!(first.rule_name(), "rule");
        assert_eq!(first.severity(), LegacySeverity::Error);
        assert_eq!(
            first.fix(),
            Some(&LegacyFix::Multiple(vec![
                LegacyReplacement::new(9, 6, ""),
                LegacyReplacement::new(16, 1, "x"),
            ]))
        );

        let second = &captured.failures[1];
        assert_eq!(second.severity(), LegacySeverity::Warning);
        assert!(second.fix().is_none());
    }

    #[test]
    fn test_fix_placeholders() {
        let (mut adapter, captured) = capture();
        let summary = FileSummary {
            file_name: "a.ts".to_string(),
            content: "5;".to_string(),
            failures: Vec::new(),
            fixes: 2,
        };
        adapter.format("a.ts", &summary);
        adapter.flush();

        let captured = captured.lock().unwrap();
        assert!(captured.failures.is_empty());
        assert_eq!(captured.fixes.len(), 2);
        let placeholder = &captured.fixes[0];
        assert_eq!(placeholder.file_name(), "a.ts");
        assert_eq!(placeholder.start_position().position, 0);
        assert_eq!(placeholder.end_position().position, 0);
        assert_eq!(placeholder.failure(), "");
        assert_eq!(placeholder.rule_name(), "");
        assert_eq!(
            placeholder.fix(),
            Some(&LegacyFix::Single(LegacyReplacement::append_text(0, "")))
        );
    }

    #[test]
    fn test_sources_are_shared_per_file() {
        let (mut adapter, captured) = capture();
        let summary = FileSummary {
            file_name: "a.ts".to_string(),
            content: "await 5;".to_string(),
            failures: vec![
                failure(0, 7, Severity::Error, None),
                failure(6, 7, Severity::Error, None),
            ],
            fixes: 1,
        };
        adapter.format("a.ts", &summary);
        adapter.flush();

        let captured = captured.lock().unwrap();
        assert!(Arc::ptr_eq(
            captured.failures[0].source(),
            captured.failures[1].source()
        ));
        assert!(Arc::ptr_eq(
            captured.failures[0].source(),
            captured.fixes[0].source()
        ));
    }
}
