//! Built-in rules
//!
//! Each rule lives in its own module exposing `RULE_ID` and a rule type
//! implementing [`Rule`](crate::engine::Rule). [`builtin_rules`] lists them in
//! the order the engine runs them.

pub mod indentation;

use std::sync::Arc;

use kolint_core::{Result, Severity};

use crate::engine::Rule;

pub use indentation::{IndentationConfig, IndentationRule};

/// Constructor of a rule from its configured options
pub type RuleFactory = fn(Option<&serde_json::Value>) -> Result<Arc<dyn Rule>>;

/// A built-in rule before configuration is applied
#[derive(Debug, Clone, Copy)]
pub struct BuiltinRule {
    pub id: &'static str,
    pub description: &'static str,
    pub default_severity: Severity,
    pub build: RuleFactory,
}

fn build_indentation(options: Option<&serde_json::Value>) -> Result<Arc<dyn Rule>> {
    Ok(Arc::new(IndentationRule::from_options(options)?))
}

/// All built-in rules in execution order
pub fn builtin_rules() -> Vec<BuiltinRule> {
    vec![BuiltinRule {
        id: indentation::RULE_ID,
        description: indentation::DESCRIPTION,
        default_severity: Severity::Warning,
        build: build_indentation,
    }]
}
