//! Helpers shared by the indentation integration tests

#![allow(dead_code)]

use std::path::Path;

use kolint_core::{Diagnostic, KolintConfiguration, RuleConfig};
use kolint_rules::{LintMode, LintResult, RuleEngine};
use serde_json::{Value, json};

pub const RULE_ID: &str = "style/indentation";

pub fn engine(options: Value) -> RuleEngine {
    let mut config = KolintConfiguration::default();
    config.rules.insert(
        RULE_ID.to_string(),
        RuleConfig {
            severity: None,
            options: Some(options),
        },
    );
    RuleEngine::with_builtin_rules(&config).expect("valid indentation options")
}

pub fn lint(source: &str, options: Value, mode: LintMode) -> LintResult {
    engine(options)
        .lint_source(Path::new("Test.kt"), source, mode)
        .expect("lint succeeds")
}

pub fn check_with(source: &str, options: Value) -> Vec<Diagnostic> {
    lint(source, options, LintMode::Check).diagnostics
}

/// Messages reported in check mode with default options
pub fn messages(source: &str) -> Vec<String> {
    messages_with(source, json!({}))
}

pub fn messages_with(source: &str, options: Value) -> Vec<String> {
    check_with(source, options)
        .into_iter()
        .map(|d| d.message)
        .collect()
}

pub fn fix(source: &str) -> String {
    fix_with(source, json!({}))
}

pub fn fix_with(source: &str, options: Value) -> String {
    lint(source, options, LintMode::Fix).output_text
}

pub fn is_mismatch(diagnostic: &Diagnostic) -> bool {
    diagnostic.message.starts_with("expected ")
}
