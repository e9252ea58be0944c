//! Indentation check and auto-fix
//!
//! Computes the expected leading whitespace of every line and compares it
//! with the source.
//!
//! This rule detects:
//! - Lines indented differently from what their syntactic position requires
//! - Tab characters in whitespace
//! - A missing line break, or several, at the end of the file
//!
//! The rule runs three phases, each on the tree the previous phase left
//! behind: tab normalization, the indentation pass, and the end-of-file
//! check. In check mode a file containing tabs skips the indentation pass,
//! since widths cannot be measured reliably; the end-of-file check still
//! runs.
//!
//! Fixes only ever rewrite leading whitespace: the text of whitespace
//! tokens, the line starts inside a `trimIndent()`/`trimMargin()` raw string
//! whose opening line moves, and the line break appended at the end of a
//! file.

mod checkers;
mod config;
mod context;
mod newline;
mod tabs;
mod traversal;
mod tree;

use std::ops::Range;

use kolint_core::{
    CodeSuggestion, Diagnostic, KtSyntaxKind, KtSyntaxNode, Location, Result, Severity,
    SourceMap, TextEdit, append_token, apply_token_edits,
};
use tracing::{debug, warn};

use crate::engine::{LintContext, Rule, RuleOutcome};

use checkers::{IndentationChecker, checker_chain};
use traversal::IndentationVisitor;

pub use config::IndentationConfig;

/// Rule ID for indentation
pub const RULE_ID: &str = "style/indentation";

pub const DESCRIPTION: &str =
    "Checks that every line is indented by the width its syntactic position requires";

/// How a violation changes the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TreeFix {
    /// Rewrite one token
    Token(TextEdit),
    /// Rewrite a line's indent together with the string lines moving with it
    Tokens(Vec<TextEdit>),
    /// Append a whitespace token to the file
    AppendWhitespace(&'static str),
}

/// A problem found by one phase
#[derive(Debug, Clone)]
pub(crate) struct Violation {
    pub message: String,
    /// Where the diagnostic points
    pub span: Range<usize>,
    /// Source range the suggestion replaces
    pub replacement_span: Range<usize>,
    pub replacement: String,
    pub fix_message: &'static str,
    pub fix: TreeFix,
}

/// The indentation rule with its configuration
pub struct IndentationRule {
    config: IndentationConfig,
    checkers: Vec<Box<dyn IndentationChecker>>,
}

impl std::fmt::Debug for IndentationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndentationRule")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for IndentationRule {
    fn default() -> Self {
        Self::new(IndentationConfig::default())
    }
}

impl IndentationRule {
    pub fn new(config: IndentationConfig) -> Self {
        Self {
            config,
            checkers: checker_chain(),
        }
    }

    /// Build the rule from the `options` table of its configuration
    pub fn from_options(options: Option<&serde_json::Value>) -> Result<Self> {
        Ok(Self::new(IndentationConfig::from_options(options)?))
    }

    pub fn config(&self) -> &IndentationConfig {
        &self.config
    }

    fn to_diagnostics(
        &self,
        ctx: &LintContext<'_>,
        tree: &KtSyntaxNode,
        violations: &[Violation],
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        if violations.is_empty() {
            return;
        }
        let source = tree.text().to_string();
        let source_map = SourceMap::new(&source);
        let location = |span: &Range<usize>| {
            Location::from_span(
                ctx.path.to_path_buf(),
                &source_map,
                &source,
                span.start,
                span.len(),
            )
        };
        diagnostics.extend(violations.iter().map(|v| {
            Diagnostic::new(RULE_ID, Severity::Warning, &v.message, location(&v.span))
                .with_suggestion(CodeSuggestion::safe(
                    v.fix_message,
                    &v.replacement,
                    location(&v.replacement_span),
                ))
        }));
    }

    /// Apply the fixes of one phase, producing the tree for the next
    fn apply(tree: &KtSyntaxNode, violations: Vec<Violation>) -> Result<KtSyntaxNode> {
        let mut edits = Vec::new();
        let mut appended = Vec::new();
        for violation in violations {
            match violation.fix {
                TreeFix::Token(edit) => edits.push(edit),
                TreeFix::Tokens(list) => edits.extend(list),
                TreeFix::AppendWhitespace(text) => appended.push(text),
            }
        }
        let mut fixed = apply_token_edits(tree, &edits)?;
        for text in appended {
            fixed = append_token(&fixed, KtSyntaxKind::WhiteSpace, text);
        }
        Ok(fixed)
    }
}

impl Rule for IndentationRule {
    fn id(&self) -> &'static str {
        RULE_ID
    }

    fn description(&self) -> &'static str {
        DESCRIPTION
    }

    fn check(&self, ctx: &LintContext<'_>) -> Result<RuleOutcome> {
        let fix = ctx.is_fix_mode();
        let mut tree = ctx.tree.clone();
        let mut diagnostics = Vec::new();
        let mut changed = false;

        debug!("Checking tabs in {}", ctx.path.display());
        let tabs = tabs::find_tabs(&tree, &self.config);
        let has_tabs = !tabs.is_empty();
        self.to_diagnostics(ctx, &tree, &tabs, &mut diagnostics);
        if fix && has_tabs {
            tree = Self::apply(&tree, tabs)?;
            changed = true;
        }

        if has_tabs && !fix {
            warn!("Not going to check indentation because there are tabs");
        } else {
            debug!("Checking indentation of {}", ctx.path.display());
            let mismatches = IndentationVisitor::new(&tree, &self.config, &self.checkers, fix).run();
            self.to_diagnostics(ctx, &tree, &mismatches, &mut diagnostics);
            if fix && !mismatches.is_empty() {
                tree = Self::apply(&tree, mismatches)?;
                changed = true;
            }
        }

        if self.config.newline_at_end {
            debug!("Checking end of file {}", ctx.path.display());
            if let Some(violation) = newline::check_newline_at_end(&tree, &ctx.file_name()) {
                let violations = vec![violation];
                self.to_diagnostics(ctx, &tree, &violations, &mut diagnostics);
                if fix {
                    tree = Self::apply(&tree, violations)?;
                    changed = true;
                }
            }
        }

        Ok(RuleOutcome {
            diagnostics,
            fixed_tree: changed.then_some(tree),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::LintMode;
    use kolint_core::parse_kotlin;
    use std::path::Path;

    fn run(source: &str, mode: LintMode) -> RuleOutcome {
        let (tree, _) = parse_kotlin(source);
        let ctx = LintContext::new(Path::new("src/Main.kt"), &tree, mode);
        IndentationRule::default().check(&ctx).unwrap()
    }

    #[test]
    fn test_clean_file_has_no_output() {
        let outcome = run("fun f() {\n    g()\n}\n", LintMode::Fix);
        assert!(outcome.diagnostics.is_empty());
        assert!(outcome.fixed_tree.is_none());
    }

    #[test]
    fn test_diagnostic_shape() {
        let outcome = run("fun f() {\n  g()\n}\n", LintMode::Check);
        assert_eq!(outcome.diagnostics.len(), 1);
        let diagnostic = &outcome.diagnostics[0];
        assert_eq!(diagnostic.rule_id, RULE_ID);
        assert_eq!(diagnostic.severity, Severity::Warning);
        assert_eq!(diagnostic.message, "expected 4 but was 2");
        assert_eq!((diagnostic.location.line, diagnostic.location.column), (2, 1));
        assert!(diagnostic.auto_fixable);
        assert_eq!(diagnostic.suggestions[0].replacement, "    ");
        assert!(outcome.fixed_tree.is_none());
    }

    #[test]
    fn test_eof_uses_file_name() {
        let outcome = run("val a = 1", LintMode::Check);
        assert_eq!(
            outcome.diagnostics[0].message,
            "no newline at the end of file Main.kt"
        );
    }

    #[test]
    fn test_newline_at_end_can_be_disabled() {
        let (tree, _) = parse_kotlin("val a = 1");
        let ctx = LintContext::new(Path::new("Main.kt"), &tree, LintMode::Check);
        let rule = IndentationRule::new(IndentationConfig {
            newline_at_end: false,
            ..IndentationConfig::default()
        });
        assert!(rule.check(&ctx).unwrap().diagnostics.is_empty());
    }

    #[test]
    fn test_fix_runs_phases_in_order() {
        let outcome = run("fun f() {\n\tif (a)\n\tb()\n}", LintMode::Fix);
        let fixed = outcome.fixed_tree.unwrap().text().to_string();
        assert_eq!(fixed, "fun f() {\n    if (a)\n        b()\n}\n");
        let messages: Vec<_> = outcome.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "tabs are not allowed for indentation",
                "tabs are not allowed for indentation",
                "expected 8 but was 4",
                "no newline at the end of file Main.kt",
            ]
        );
    }
}
