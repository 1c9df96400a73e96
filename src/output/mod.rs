//! Output formatters for lint results

mod json;
mod stylish;

pub use json::JsonFormatter;
pub use stylish::StylishFormatter;

use crate::diagnostic::FileSummary;

/// Renders lint results file by file.
///
/// [`Formatter::format`] is called once per file in input order, then
/// [`Formatter::flush`] once at the end of the run.
pub trait Formatter {
    /// Format the results of one file
    fn format(&mut self, file_name: &str, summary: &FileSummary) -> Option<String>;

    /// Emit whatever was held back until the end of the run
    fn flush(&mut self) -> Option<String> {
        None
    }
}

/// Create a built-in formatter by name
pub fn formatter_by_name(name: &str) -> Option<Box<dyn Formatter>> {
    match name {
        "json" => Some(Box::new(JsonFormatter::new())),
        "stylish" => Some(Box::new(StylishFormatter::new())),
        "prose" => Some(Box::new(crate::legacy::wrap_legacy_formatter(Box::new(
            crate::legacy::ProseFormatter,
        )))),
        _ => None,
    }
}
