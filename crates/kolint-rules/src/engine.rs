//! Rule engine implementation
//!
//! A [`RuleEngine`] owns the rules enabled by configuration, in registration
//! order. Linting a source parses it once, hands the tree to each rule and,
//! in fix mode, feeds the tree a rule rewrote into the next rule.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kolint_core::cst::ParseError;
use kolint_core::{
    Diagnostic, KolintConfiguration, KolintError, KtSyntaxNode, Result, Severity, parse_kotlin,
};
use serde::Serialize;
use tracing::{debug, trace};

use crate::builtin::builtin_rules;

/// Whether rules only report or also rewrite the tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LintMode {
    #[default]
    Check,
    Fix,
}

/// Everything a rule sees of one file
#[derive(Debug, Clone, Copy)]
pub struct LintContext<'a> {
    pub path: &'a Path,
    pub tree: &'a KtSyntaxNode,
    pub mode: LintMode,
}

impl<'a> LintContext<'a> {
    pub fn new(path: &'a Path, tree: &'a KtSyntaxNode, mode: LintMode) -> Self {
        Self { path, tree, mode }
    }

    pub fn is_fix_mode(&self) -> bool {
        self.mode == LintMode::Fix
    }

    /// File name without directories, as shown in messages
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Result of running one rule over one tree
#[derive(Debug, Default)]
pub struct RuleOutcome {
    pub diagnostics: Vec<Diagnostic>,
    /// Rewritten tree, present only in fix mode when something changed
    pub fixed_tree: Option<KtSyntaxNode>,
}

/// A lint rule
///
/// Rules are shared between worker threads, so they hold only immutable
/// configuration; all per-file state lives inside `check`.
pub trait Rule: Send + Sync {
    fn id(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, ctx: &LintContext<'_>) -> Result<RuleOutcome>;
}

/// Description of a built-in rule under a given configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleInfo {
    pub id: String,
    pub description: String,
    pub severity: Severity,
    pub enabled: bool,
}

/// Outcome of linting one file
#[derive(Debug, Clone)]
pub struct LintResult {
    pub path: PathBuf,
    /// Diagnostics of every rule, ordered by position
    pub diagnostics: Vec<Diagnostic>,
    /// Text of the final tree; equals the input in check mode
    pub output_text: String,
    pub parse_errors: Vec<ParseError>,
    /// Whether `output_text` differs from the input
    pub changed: bool,
}

impl LintResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

#[derive(Clone)]
struct ConfiguredRule {
    rule: Arc<dyn Rule>,
    severity: Severity,
}

/// Ordered set of enabled rules
#[derive(Clone, Default)]
pub struct RuleEngine {
    rules: Vec<ConfiguredRule>,
}

impl fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleEngine")
            .field("rules", &self.rule_ids())
            .finish()
    }
}

impl RuleEngine {
    /// Create an engine without rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the built-in rules from configuration
    ///
    /// Rules with severity `off` are left out. Invalid rule options fail the
    /// whole construction with a configuration error.
    pub fn with_builtin_rules(config: &KolintConfiguration) -> Result<Self> {
        let mut engine = Self::new();
        for builtin in builtin_rules() {
            if config.is_rule_disabled(builtin.id) {
                debug!("Rule '{}' is disabled", builtin.id);
                continue;
            }
            let rule_config = config.rule(builtin.id);
            let options = rule_config.and_then(|r| r.options.as_ref());
            let rule = (builtin.build)(options).map_err(|e| match e {
                KolintError::ConfigError { message } => {
                    KolintError::config_error(format!("rule '{}': {message}", builtin.id))
                }
                other => other,
            })?;
            let severity = rule_config
                .and_then(|r| r.severity)
                .and_then(|s| s.to_severity());
            engine.register(rule, severity);
        }
        debug!("Rule engine ready with {} rule(s)", engine.rules.len());
        Ok(engine)
    }

    /// Add a rule; `severity` overrides the rule's default
    pub fn register(&mut self, rule: Arc<dyn Rule>, severity: Option<Severity>) {
        let severity = severity.unwrap_or_else(|| rule.default_severity());
        self.rules.push(ConfiguredRule { rule, severity });
    }

    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.rule.id()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Describe every built-in rule as configured
    pub fn describe_builtin_rules(config: &KolintConfiguration) -> Vec<RuleInfo> {
        builtin_rules()
            .into_iter()
            .map(|builtin| {
                let configured = config
                    .rule(builtin.id)
                    .and_then(|r| r.severity)
                    .and_then(|s| s.to_severity());
                RuleInfo {
                    id: builtin.id.to_string(),
                    description: builtin.description.to_string(),
                    severity: configured.unwrap_or(builtin.default_severity),
                    enabled: !config.is_rule_disabled(builtin.id),
                }
            })
            .collect()
    }

    /// Lint source text
    ///
    /// Parse errors never stop linting; they are returned alongside the
    /// diagnostics.
    pub fn lint_source(&self, path: &Path, text: &str, mode: LintMode) -> Result<LintResult> {
        let (mut tree, parse_errors) = parse_kotlin(text);
        if !parse_errors.is_empty() {
            debug!(
                "{} parse error(s) in {}, linting anyway",
                parse_errors.len(),
                path.display()
            );
        }

        let mut diagnostics = Vec::new();
        for configured in &self.rules {
            let ctx = LintContext::new(path, &tree, mode);
            let outcome = configured
                .rule
                .check(&ctx)
                .map_err(|e| KolintError::rule_error(configured.rule.id(), e.to_string()))?;
            trace!(
                "Rule '{}' produced {} diagnostic(s) for {}",
                configured.rule.id(),
                outcome.diagnostics.len(),
                path.display()
            );
            diagnostics.extend(
                outcome
                    .diagnostics
                    .into_iter()
                    .map(|d| d.with_severity(configured.severity)),
            );
            if let Some(fixed) = outcome.fixed_tree {
                tree = fixed;
            }
        }

        diagnostics.sort_by_key(|d| (d.location.line, d.location.column));
        let output_text = tree.text().to_string();
        let changed = output_text != text;
        Ok(LintResult {
            path: path.to_path_buf(),
            diagnostics,
            output_text,
            parse_errors,
            changed,
        })
    }

    /// Read a file and lint its contents
    ///
    /// A file that is not UTF-8 fails with a parse error.
    pub fn lint_file(&self, path: &Path, mode: LintMode) -> Result<LintResult> {
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::InvalidData => {
                KolintError::parse_error(path, "source is not valid UTF-8")
            }
            _ => KolintError::io_error(path, e),
        })?;
        self.lint_source(path, &text, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kolint_core::{ErrorKind, Location, RuleConfig, RuleSeverity};
    use serde_json::json;

    struct CountFiles;

    impl Rule for CountFiles {
        fn id(&self) -> &'static str {
            "test/count"
        }

        fn description(&self) -> &'static str {
            "Reports every file once"
        }

        fn check(&self, ctx: &LintContext<'_>) -> Result<RuleOutcome> {
            Ok(RuleOutcome {
                diagnostics: vec![Diagnostic::new(
                    self.id(),
                    self.default_severity(),
                    format!("seen {}", ctx.file_name()),
                    Location::new(ctx.path.to_path_buf(), 1, 1, 0, 0),
                )],
                fixed_tree: None,
            })
        }
    }

    struct FailingRule;

    impl Rule for FailingRule {
        fn id(&self) -> &'static str {
            "test/failing"
        }

        fn description(&self) -> &'static str {
            "Cannot rewrite its tree"
        }

        fn check(&self, _ctx: &LintContext<'_>) -> Result<RuleOutcome> {
            Err(KolintError::fix_error("token range out of bounds"))
        }
    }

    fn config_with(rule_id: &str, rule: RuleConfig) -> KolintConfiguration {
        let mut config = KolintConfiguration::default();
        config.rules.insert(rule_id.to_string(), rule);
        config
    }

    #[test]
    fn test_builtin_rules_enabled_by_default() {
        let engine = RuleEngine::with_builtin_rules(&KolintConfiguration::default()).unwrap();
        assert_eq!(engine.rule_ids(), vec!["style/indentation"]);
    }

    #[test]
    fn test_disabled_rule_is_skipped() {
        let config = config_with(
            "style/indentation",
            RuleConfig {
                severity: Some(RuleSeverity::Off),
                options: None,
            },
        );
        let engine = RuleEngine::with_builtin_rules(&config).unwrap();
        assert!(engine.is_empty());
        let infos = RuleEngine::describe_builtin_rules(&config);
        assert!(!infos[0].enabled);
    }

    #[test]
    fn test_invalid_options_are_config_errors() {
        let config = config_with(
            "style/indentation",
            RuleConfig {
                severity: None,
                options: Some(json!({ "indentationSize": 0 })),
            },
        );
        let err = RuleEngine::with_builtin_rules(&config).unwrap_err();
        assert!(matches!(err, KolintError::ConfigError { .. }));
        assert!(err.to_string().contains("style/indentation"));
    }

    #[test]
    fn test_configured_severity_overrides_default() {
        let config = config_with(
            "style/indentation",
            RuleConfig {
                severity: Some(RuleSeverity::Error),
                options: None,
            },
        );
        let engine = RuleEngine::with_builtin_rules(&config).unwrap();
        let result = engine
            .lint_source(Path::new("A.kt"), "fun f() {\nval a = 1\n}\n", LintMode::Check)
            .unwrap();
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].severity, Severity::Error);
        assert!(result.has_errors());
    }

    #[test]
    fn test_custom_rule_registration() {
        let mut engine = RuleEngine::new();
        engine.register(Arc::new(CountFiles), Some(Severity::Info));
        let result = engine
            .lint_source(Path::new("src/Main.kt"), "val a = 1\n", LintMode::Check)
            .unwrap();
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].message, "seen Main.kt");
        assert_eq!(result.diagnostics[0].severity, Severity::Info);
        assert!(!result.changed);
    }

    #[test]
    fn test_fix_mode_returns_rewritten_text() {
        let engine = RuleEngine::with_builtin_rules(&KolintConfiguration::default()).unwrap();
        let result = engine
            .lint_source(Path::new("A.kt"), "fun f() {\nval a = 1\n}", LintMode::Fix)
            .unwrap();
        assert_eq!(result.output_text, "fun f() {\n    val a = 1\n}\n");
        assert!(result.changed);
        assert_eq!(result.diagnostics.len(), 2);
    }

    #[test]
    fn test_parse_errors_do_not_stop_linting() {
        let engine = RuleEngine::with_builtin_rules(&KolintConfiguration::default()).unwrap();
        let result = engine
            .lint_source(Path::new("A.kt"), "fun f( {\n", LintMode::Check)
            .unwrap();
        assert!(!result.parse_errors.is_empty());
    }

    #[test]
    fn test_rule_failure_names_the_rule() {
        let mut engine = RuleEngine::new();
        engine.register(Arc::new(FailingRule), None);
        let err = engine
            .lint_source(Path::new("A.kt"), "val a = 1\n", LintMode::Fix)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Rule);
        assert!(err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "Rule error in 'test/failing': Autofix error: token range out of bounds"
        );
    }

    #[test]
    fn test_non_utf8_file_is_a_parse_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("Latin1.kt");
        fs::write(&path, b"val s = \"caf\xe9\"\n").unwrap();

        let engine = RuleEngine::with_builtin_rules(&KolintConfiguration::default()).unwrap();
        let err = engine.lint_file(&path, LintMode::Check).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("Latin1.kt"));

        let missing = engine
            .lint_file(&temp.path().join("Missing.kt"), LintMode::Check)
            .unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::Io);
    }
}
