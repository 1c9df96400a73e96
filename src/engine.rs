//! Core lint driver
//!
//! For every file, each enabled rule gets its own [`RuleContext`], is created
//! through its [`RuleConstructor`] and applied once. Failures are harvested from
//! the contexts, sorted, and filtered through the file's line switches.

use crate::ast::SourceFile;
use crate::config::Config;
use crate::diagnostic::{Failure, FileSummary};
use crate::fixer::apply_fixes;
use crate::legacy::LegacyRuleAdapter;
use crate::line_switch::LineSwitches;
use crate::output::Formatter;
use crate::rule::{RuleConstructor, RuleContext, RuleError};
use crate::rules::builtin_rules;
use crate::semantic::TypeChecker;
use log::{debug, trace, warn};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Error that stops the analysis of a file
#[derive(Debug, Error)]
pub enum LintError {
    #[error("Rule '{rule}' failed on '{file}': {source}")]
    Rule {
        rule: String,
        file: String,
        #[source]
        source: RuleError,
    },

    #[error("Failed to re-parse fixed source: {0}")]
    Reparse(String),
}

/// A parsed file, optionally with the semantic model of its program
#[derive(Clone)]
pub struct CompilationUnit {
    pub source_file: SourceFile,
    pub program: Option<Arc<dyn TypeChecker>>,
}

impl CompilationUnit {
    pub fn new(source_file: SourceFile) -> Self {
        Self {
            source_file,
            program: None,
        }
    }

    pub fn with_program(mut self, program: Arc<dyn TypeChecker>) -> Self {
        self.program = Some(program);
        self
    }

    pub fn file_name(&self) -> &str {
        self.source_file.file_name()
    }

    fn checker(&self) -> Option<&dyn TypeChecker> {
        self.program.as_deref()
    }
}

impl fmt::Debug for CompilationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilationUnit")
            .field("file_name", &self.file_name())
            .field("has_program", &self.program.is_some())
            .finish()
    }
}

/// Final state of a file after [`Linter::lint_and_fix`]
#[derive(Debug)]
pub struct FixedUnit {
    /// The unit as of the last re-parse
    pub unit: CompilationUnit,
    /// Failures remaining in it
    pub failures: Vec<Failure>,
    /// Number of fixes applied over all rounds
    pub fixes: usize,
}

impl FixedUnit {
    fn summary(&self) -> FileSummary {
        FileSummary {
            file_name: self.unit.file_name().to_string(),
            content: self.unit.source_file.text().to_string(),
            failures: self.failures.clone(),
            fixes: self.fixes,
        }
    }
}

/// The main lint driver
pub struct Linter {
    /// Configuration
    config: Config,

    /// Registered rules, by name
    rules: BTreeMap<String, Arc<dyn RuleConstructor>>,

    /// Rules that were already warned about
    warned: Mutex<HashSet<String>>,
}

impl Linter {
    /// Create a linter without any registered rules
    pub fn new(config: Config) -> Self {
        Self {
            config,
            rules: BTreeMap::new(),
            warned: Mutex::new(HashSet::new()),
        }
    }

    /// Register all built-in rules
    pub fn with_builtin_rules(mut self) -> Self {
        for (name, rule) in builtin_rules() {
            self.register(name, rule);
        }
        self
    }

    /// Register a rule under a name, replacing any rule of the same name
    pub fn register(&mut self, name: impl Into<String>, rule: Arc<dyn RuleConstructor>) {
        let name = name.into();
        debug!("Registering rule '{}'", name);
        if self.rules.insert(name.clone(), rule).is_some() {
            warn!("Rule '{}' was registered twice, keeping the last one", name);
        }
    }

    /// Register a wrapped legacy rule under its own name
    pub fn register_legacy(&mut self, rule: LegacyRuleAdapter) {
        let name = rule.name().to_string();
        self.register(name, Arc::new(rule));
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Names of all registered rules
    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Log a warning about a rule only the first time it comes up
    fn warn_once(&self, kind: &str, rule: &str, message: impl FnOnce() -> String) {
        let first = match self.warned.lock() {
            Ok(mut warned) => warned.insert(format!("{}:{}", kind, rule)),
            Err(_) => true,
        };
        if first {
            warn!("{}", message());
        }
    }

    /// Run all enabled rules on one file.
    ///
    /// Returns the failures ordered by position. A rule violating its contract
    /// aborts the file.
    pub fn lint_file(
        &self,
        file: &SourceFile,
        program: Option<&dyn TypeChecker>,
    ) -> Result<Vec<Failure>, LintError> {
        let file_name = file.file_name();
        let mut failures = Vec::new();

        for (name, rule_config) in self.config.effective_rules(file_name) {
            let Some(severity) = rule_config.severity.severity() else {
                continue;
            };
            let Some(constructor) = self.rules.get(&name) else {
                self.warn_once("unknown", &name, || format!("Could not find rule '{}'", name));
                continue;
            };

            let metadata = constructor.metadata();
            if let Some(message) = metadata.deprecated.warning(&name) {
                self.warn_once("deprecated", &name, || message);
            }
            if !metadata.supports_file(file) {
                trace!("Rule '{}' does not support '{}'", name, file_name);
                continue;
            }
            if metadata.requires_type_information && program.is_none() {
                self.warn_once("untyped", &name, || {
                    format!(
                        "Rule '{}' requires type information and is skipped without a program",
                        name
                    )
                });
                continue;
            }

            let error = |source: RuleError| LintError::Rule {
                rule: name.clone(),
                file: file_name.to_string(),
                source,
            };
            let mut ctx = RuleContext::new(file, &name, &rule_config.options, severity)
                .with_program(program);
            let mut rule = constructor.create(&ctx).map_err(error)?;
            if !rule.apply(&mut ctx).map_err(error)? {
                continue;
            }

            let found = ctx.into_failures();
            trace!("Rule '{}' found {} failures in '{}'", name, found.len(), file_name);
            failures.extend(found);
        }

        failures.sort_by_key(|f| (f.start, f.end));
        Ok(LineSwitches::parse(file.text()).filter(failures))
    }

    /// Lint a file and apply fixes until nothing is left to fix or
    /// `max_iterations` rounds have run.
    ///
    /// `reparse` turns the fixed text into a new unit; it gets the unit the
    /// text was derived from.
    pub fn lint_and_fix<F>(
        &self,
        unit: CompilationUnit,
        mut reparse: F,
        max_iterations: usize,
    ) -> Result<FixedUnit, LintError>
    where
        F: FnMut(&CompilationUnit, String) -> Result<CompilationUnit, String>,
    {
        let mut unit = unit;
        let mut fixes = 0;
        let mut failures = self.lint_file(&unit.source_file, unit.checker())?;

        for round in 0..max_iterations {
            if !failures.iter().any(Failure::is_fixable) {
                break;
            }
            let output = apply_fixes(unit.source_file.text(), &failures);
            if output.fixed == 0 {
                break;
            }
            debug!(
                "Applied {} fixes to '{}' in round {}",
                output.fixed,
                unit.file_name(),
                round + 1
            );
            fixes += output.fixed;
            unit = reparse(&unit, output.text).map_err(LintError::Reparse)?;
            failures = self.lint_file(&unit.source_file, unit.checker())?;
        }

        Ok(FixedUnit {
            unit,
            failures,
            fixes,
        })
    }

    /// Lint all units and report them through `formatter`.
    ///
    /// Units may be linted in parallel, but are always formatted in input
    /// order. Returns the non-empty formatter outputs joined by newlines.
    pub fn run(
        &self,
        units: &[CompilationUnit],
        formatter: &mut dyn Formatter,
    ) -> Result<Option<String>, LintError> {
        let results = self.map_units(units, |unit| {
            self.lint_file(&unit.source_file, unit.checker())
        });

        let mut summaries = Vec::with_capacity(units.len());
        for (unit, failures) in units.iter().zip(results) {
            summaries.push(FileSummary {
                file_name: unit.file_name().to_string(),
                content: unit.source_file.text().to_string(),
                failures: failures?,
                fixes: 0,
            });
        }
        Ok(report(&summaries, formatter))
    }

    /// Like [`Linter::run`], but fixes every unit first using the `fix`
    /// settings of the configuration. Returns the fixed units too.
    ///
    /// With `fix.enabled` off this is a plain [`Linter::run`] and the units
    /// come back unchanged.
    pub fn run_with_fixes<F>(
        &self,
        units: &[CompilationUnit],
        reparse: F,
        formatter: &mut dyn Formatter,
    ) -> Result<(Vec<CompilationUnit>, Option<String>), LintError>
    where
        F: Fn(&CompilationUnit, String) -> Result<CompilationUnit, String> + Sync,
    {
        if !self.config.fix.enabled {
            debug!("Fixing is disabled, linting {} units without fixes", units.len());
            let output = self.run(units, formatter)?;
            return Ok((units.to_vec(), output));
        }

        let max_iterations = self.config.fix.max_iterations;
        let results = self.map_units(units, |unit| {
            self.lint_and_fix(unit.clone(), &reparse, max_iterations)
        });

        let mut fixed = Vec::with_capacity(units.len());
        let mut summaries = Vec::with_capacity(units.len());
        for result in results {
            let result = result?;
            summaries.push(result.summary());
            fixed.push(result.unit);
        }
        Ok((fixed, report(&summaries, formatter)))
    }

    fn map_units<T, F>(&self, units: &[CompilationUnit], f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(&CompilationUnit) -> T + Sync,
    {
        if !self.config.engine.parallel || units.len() < 2 {
            return units.iter().map(f).collect();
        }

        let jobs = if self.config.engine.jobs > 0 {
            self.config.engine.jobs
        } else {
            num_cpus::get()
        };
        match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => pool.install(|| units.par_iter().map(&f).collect()),
            Err(e) => {
                warn!("Could not start {} lint threads, running sequentially: {}", jobs, e);
                units.iter().map(f).collect()
            }
        }
    }
}

fn report(summaries: &[FileSummary], formatter: &mut dyn Formatter) -> Option<String> {
    let mut outputs: Vec<String> = summaries
        .iter()
        .filter_map(|s| formatter.format(&s.file_name, s))
        .collect();
    outputs.extend(formatter.flush());
    outputs.retain(|o| !o.is_empty());
    if outputs.is_empty() {
        None
    } else {
        Some(outputs.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RuleConfig, RuleSeverity};
    use crate::diagnostic::Severity;
    use crate::legacy::{wrap_legacy_formatter, ProseFormatter};
    use crate::output::JsonFormatter;
    use crate::rule::{Deprecation, Rule, RuleInstance, RuleMetadata};
    use crate::test_util::{self, Fixture};
    use pretty_assertions::assert_eq;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn recommended() -> Linter {
        init_logger();
        Linter::new(Config::preset("recommended").unwrap()).with_builtin_rules()
    }

    fn unit(fixture: Fixture) -> CompilationUnit {
        CompilationUnit::new(fixture.file).with_program(Arc::new(fixture.types))
    }

    fn reparse(previous: &CompilationUnit, text: String) -> Result<CompilationUnit, String> {
        test_util::parse_named(previous.file_name(), &text)
            .map(unit)
            .ok_or_else(|| format!("cannot parse {:?}", text))
    }

    /// Reports the whole file, or an invalid range when configured with `true`
    struct WholeFile {
        metadata: RuleMetadata,
    }

    struct WholeFileRule {
        broken: bool,
    }

    impl Rule for WholeFileRule {
        fn apply(&mut self, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
            let len = ctx.source_file().text().len();
            let end = if self.broken { len + 100 } else { len };
            ctx.add_failure(0, end, "whole file", None)
        }
    }

    impl RuleConstructor for WholeFile {
        fn metadata(&self) -> &RuleMetadata {
            &self.metadata
        }

        fn create(&self, ctx: &RuleContext<'_>) -> Result<RuleInstance, RuleError> {
            Ok(RuleInstance::Syntactic(Box::new(WholeFileRule {
                broken: ctx.options().as_bool().unwrap_or(false),
            })))
        }
    }

    fn whole_file(metadata: RuleMetadata) -> Arc<dyn RuleConstructor> {
        Arc::new(WholeFile { metadata })
    }

    #[test]
    fn test_lint_file() {
        let linter = recommended();
        let fixture = test_util::await_literal();
        let failures = linter
            .lint_file(&fixture.file, Some(&fixture.types))
            .unwrap();

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].rule_name, "await-promise");
        assert_eq!(failures[0].severity, Severity::Error);
    }

    #[test]
    fn test_configured_severity() {
        init_logger();
        let mut config = Config::new();
        config.rules.insert(
            "await-promise".to_string(),
            RuleConfig::new(RuleSeverity::Suggestion),
        );
        let linter = Linter::new(config).with_builtin_rules();
        let fixture = test_util::await_literal();
        let failures = linter
            .lint_file(&fixture.file, Some(&fixture.types))
            .unwrap();
        assert_eq!(failures[0].severity, Severity::Suggestion);

        let mut config = Config::new();
        config
            .rules
            .insert("await-promise".to_string(), RuleConfig::new(RuleSeverity::Off));
        let linter = Linter::new(config).with_builtin_rules();
        assert!(linter
            .lint_file(&fixture.file, Some(&fixture.types))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_typed_rule_skipped_without_program() {
        let linter = recommended();
        let fixture = test_util::await_literal();
        assert!(linter.lint_file(&fixture.file, None).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_rule_is_skipped() {
        init_logger();
        let mut config = Config::preset("recommended").unwrap();
        config
            .rules
            .insert("no-such-rule".to_string(), RuleConfig::default());
        let linter = Linter::new(config).with_builtin_rules();
        let fixture = test_util::await_literal();
        let failures = linter
            .lint_file(&fixture.file, Some(&fixture.types))
            .unwrap();
        assert_eq!(failures.len(), 1);
    }

    #[test]
    fn test_unsupported_file_is_skipped() {
        let linter = recommended();
        let fixture = test_util::parse_named("types.d.ts", "await 5;").unwrap();
        assert!(linter
            .lint_file(&fixture.file, Some(&fixture.types))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_deprecated_rule_still_runs() {
        init_logger();
        let mut config = Config::new();
        config.rules.insert("old".to_string(), RuleConfig::default());
        let mut linter = Linter::new(config);
        linter.register(
            "old",
            whole_file(RuleMetadata::new().with_deprecation(Deprecation::Yes)),
        );

        let fixture = test_util::await_literal();
        let failures = linter.lint_file(&fixture.file, None).unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].end, 8);
    }

    #[test]
    fn test_failures_are_sorted_and_switched() {
        let linter = recommended();
        let text = "await 7;\n// skald-disable-next-line await-promise\nawait 5;\nawait 6;";
        let fixture = test_util::parse(text).unwrap();
        let failures = linter
            .lint_file(&fixture.file, Some(&fixture.types))
            .unwrap();

        let starts: Vec<usize> = failures.iter().map(|f| f.start).collect();
        assert_eq!(
            starts,
            vec![0, text.find("await 6").unwrap()]
        );
    }

    #[test]
    fn test_rule_error_aborts_file() {
        init_logger();
        let mut config = Config::new();
        config.rules.insert(
            "broken".to_string(),
            RuleConfig::default().with_options(serde_json::json!(true)),
        );
        let mut linter = Linter::new(config);
        linter.register("broken", whole_file(RuleMetadata::new()));

        let fixture = test_util::await_literal();
        let err = linter.lint_file(&fixture.file, None).unwrap_err();
        match err {
            LintError::Rule { rule, file, source } => {
                assert_eq!(rule, "broken");
                assert_eq!(file, "test.ts");
                assert!(matches!(source, RuleError::FailureOutOfRange { .. }));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_lint_and_fix() {
        let linter = recommended();
        let fixture = test_util::parse("await 5;\nawait 6;").unwrap();
        let result = linter.lint_and_fix(unit(fixture), reparse, 10).unwrap();

        assert_eq!(result.unit.source_file.text(), "5;\n6;");
        assert_eq!(result.fixes, 2);
        assert!(result.failures.is_empty());
    }

    #[test]
    fn test_lint_and_fix_respects_max_iterations() {
        let linter = recommended();
        let fixture = test_util::await_literal();
        let result = linter.lint_and_fix(unit(fixture), reparse, 0).unwrap();
        assert_eq!(result.fixes, 0);
        assert_eq!(result.failures.len(), 1);
    }

    #[test]
    fn test_lint_and_fix_reparse_error() {
        let linter = recommended();
        let err = linter
            .lint_and_fix(
                unit(test_util::await_literal()),
                |_, _| Err("syntax error".to_string()),
                10,
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to re-parse fixed source: syntax error");
    }

    #[test]
    fn test_run_keeps_file_order() {
        let linter = recommended();
        let units: Vec<CompilationUnit> = ["a.ts", "b.ts", "c.ts", "d.ts"]
            .iter()
            .map(|name| unit(test_util::parse_named(name, "await 5;").unwrap()))
            .collect();

        let mut formatter = wrap_legacy_formatter(Box::new(ProseFormatter));
        let output = linter.run(&units, &mut formatter).unwrap().unwrap();
        assert_eq!(
            output,
            "ERROR: a.ts[1, 1]: Unnecessary 'await' of a non-Promise value.\n\
             ERROR: b.ts[1, 1]: Unnecessary 'await' of a non-Promise value.\n\
             ERROR: c.ts[1, 1]: Unnecessary 'await' of a non-Promise value.\n\
             ERROR: d.ts[1, 1]: Unnecessary 'await' of a non-Promise value."
        );
    }

    #[test]
    fn test_run_propagates_rule_errors() {
        init_logger();
        let mut config = Config::new();
        config.rules.insert(
            "broken".to_string(),
            RuleConfig::default().with_options(serde_json::json!(true)),
        );
        let mut linter = Linter::new(config);
        linter.register("broken", whole_file(RuleMetadata::new()));

        let units = vec![CompilationUnit::new(test_util::await_literal().file)];
        let mut formatter = JsonFormatter::new();
        assert!(linter.run(&units, &mut formatter).is_err());
    }

    fn fixing() -> Linter {
        init_logger();
        let mut config = Config::preset("recommended").unwrap();
        config.fix.enabled = true;
        Linter::new(config).with_builtin_rules()
    }

    #[test]
    fn test_run_with_fixes() {
        let linter = fixing();
        let units: Vec<CompilationUnit> = [("a.ts", "await 5;"), ("b.ts", "5;")]
            .iter()
            .map(|(name, text)| unit(test_util::parse_named(name, text).unwrap()))
            .collect();

        let mut formatter = wrap_legacy_formatter(Box::new(ProseFormatter));
        let (fixed, output) = linter
            .run_with_fixes(&units, reparse, &mut formatter)
            .unwrap();

        assert_eq!(fixed[0].source_file.text(), "5;");
        assert_eq!(fixed[1].source_file.text(), "5;");
        assert_eq!(output.unwrap(), "Fixed 1 error(s) in a.ts");
    }

    #[test]
    fn test_run_with_fixes_disabled() {
        let linter = recommended();
        assert!(!linter.config().fix.enabled);
        let units = vec![unit(test_util::parse_named("a.ts", "await 5;").unwrap())];

        let mut formatter = wrap_legacy_formatter(Box::new(ProseFormatter));
        let (fixed, output) = linter
            .run_with_fixes(&units, reparse, &mut formatter)
            .unwrap();

        assert_eq!(fixed[0].source_file.text(), "await 5;");
        assert_eq!(
            output.unwrap(),
            "ERROR: a.ts[1, 1]: Unnecessary 'await' of a non-Promise value."
        );
    }

    #[test]
    fn test_clean_run_has_no_output() {
        let linter = recommended();
        let units = vec![unit(test_util::parse("5;").unwrap())];
        let mut formatter = crate::output::StylishFormatter::new().without_color();
        assert_eq!(linter.run(&units, &mut formatter).unwrap(), None);
    }
}
