//! Plain prose output in the legacy format

use super::{LegacyFailure, LegacyFormatter};

/// One line per failure, e.g. `ERROR: a.ts[2, 5]: message`, preceded by a
/// `Fixed N error(s) in a.ts` line per fixed file.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProseFormatter;

impl LegacyFormatter for ProseFormatter {
    fn format(&mut self, failures: &[LegacyFailure], fixes: &[LegacyFailure]) -> String {
        if failures.is_empty() && fixes.is_empty() {
            return "\n".to_string();
        }

        let mut per_file: Vec<(&str, usize)> = Vec::new();
        for fix in fixes {
            match per_file.iter_mut().find(|(name, _)| *name == fix.file_name()) {
                Some((_, count)) => *count += 1,
                None => per_file.push((fix.file_name(), 1)),
            }
        }

        let mut lines: Vec<String> = per_file
            .iter()
            .map(|(name, count)| format!("Fixed {} error(s) in {}", count, name))
            .collect();
        if !lines.is_empty() {
            lines.push(String::new());
        }

        lines.extend(failures.iter().map(|failure| {
            let start = failure.start_position();
            format!(
                "{}: {}[{}, {}]: {}",
                failure.severity().to_string().to_uppercase(),
                failure.file_name(),
                start.line + 1,
                start.character + 1,
                failure.failure()
            )
        }));

        let mut output = lines.join("\n");
        output.push('\n');
        output
    }
}
