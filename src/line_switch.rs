//! Comments that turn rules off and on for parts of a file
//!
//! Supported forms, in line or block comments, optionally followed by a list
//! of rule names separated by commas or whitespace (no list means all rules):
//!
//! ```text
//! // skald-disable await-promise
//! // skald-enable
//! foo(); // skald-disable-line
//! // skald-disable-next-line await-promise, no-debugger
//! ```
//!
//! `-line` and `-next-line` variants also exist for `skald-enable`.

use crate::diagnostic::Failure;
use log::trace;
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

const SWITCH_PATTERN: &str = r"(?m)(?://|/\*)[ \t]*skald-(enable|disable)(-line|-next-line)?(?:[ \t]+([^\n]*?))?[ \t]*(?:\*/|$)";

fn switch_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(SWITCH_PATTERN).expect("line switch pattern is valid"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Scope {
    /// From the comment to the next switch
    Rest(usize),
    /// A single line
    Line(Range<usize>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Switch {
    enable: bool,
    scope: Scope,
    /// `None` switches all rules
    rules: Option<Vec<String>>,
}

impl Switch {
    fn applies_to(&self, rule_name: &str) -> bool {
        self.rules
            .as_ref()
            .is_none_or(|rules| rules.iter().any(|r| r == rule_name))
    }
}

/// All switches found in one file, in source order
#[derive(Debug, Clone, Default)]
pub struct LineSwitches {
    switches: Vec<Switch>,
}

impl LineSwitches {
    /// Find the switches in a file's text
    pub fn parse(text: &str) -> Self {
        let mut switches = Vec::new();
        for cap in switch_regex().captures_iter(text) {
            let Some(comment) = cap.get(0) else {
                continue;
            };
            let enable = &cap[1] == "enable";
            let rules = cap
                .get(3)
                .map(|m| {
                    m.as_str()
                        .split(|c: char| c == ',' || c.is_whitespace())
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect::<Vec<_>>()
                })
                .filter(|rules| !rules.is_empty());
            let scope = match cap.get(2).map(|m| m.as_str()) {
                Some("-line") => Scope::Line(line_range(text, comment.start())),
                Some(_) => Scope::Line(next_line_range(text, comment.start())),
                None => Scope::Rest(comment.start()),
            };
            trace!(
                "Line switch at {}: {} {:?}",
                comment.start(),
                if enable { "enable" } else { "disable" },
                rules
            );
            switches.push(Switch {
                enable,
                scope,
                rules,
            });
        }
        Self { switches }
    }

    pub fn is_empty(&self) -> bool {
        self.switches.is_empty()
    }

    /// Check whether `rule_name` is switched off at offset `pos`.
    ///
    /// Line-scoped switches take precedence over the state left by earlier
    /// `skald-disable` / `skald-enable` comments.
    pub fn is_disabled(&self, rule_name: &str, pos: usize) -> bool {
        let mut disabled = false;
        for switch in self.switches.iter().filter(|s| s.applies_to(rule_name)) {
            if let Scope::Rest(start) = switch.scope {
                if start <= pos {
                    disabled = !switch.enable;
                }
            }
        }
        let line_switch = self.switches.iter().rev().find(|s| {
            matches!(&s.scope, Scope::Line(range) if range.contains(&pos)) && s.applies_to(rule_name)
        });
        match line_switch {
            Some(switch) => !switch.enable,
            None => disabled,
        }
    }

    /// Drop the failures that are switched off
    pub fn filter(&self, failures: Vec<Failure>) -> Vec<Failure> {
        if self.is_empty() {
            return failures;
        }
        failures
            .into_iter()
            .filter(|f| !self.is_disabled(&f.rule_name, f.start))
            .collect()
    }
}

/// Range of the line containing `pos`, including its line break
fn line_range(text: &str, pos: usize) -> Range<usize> {
    let pos = pos.min(text.len());
    let start = text[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let end = text[pos..]
        .find('\n')
        .map(|i| pos + i + 1)
        .unwrap_or(text.len());
    start..end
}

/// Range of the line after the one containing `pos`, empty if there is none
fn next_line_range(text: &str, pos: usize) -> Range<usize> {
    let current = line_range(text, pos);
    if current.end == text.len() && !text.ends_with('\n') {
        return current.end..current.end;
    }
    line_range(text, current.end)
}
