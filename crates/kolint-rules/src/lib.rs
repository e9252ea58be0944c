//! Kolint Rules
//!
//! Rule engine and built-in rules for kolint. The engine parses a Kotlin
//! source, runs every enabled rule over the tree in a fixed order and, in fix
//! mode, threads each rule's rewritten tree into the next one.

pub mod builtin;
pub mod engine;

pub use builtin::{BuiltinRule, IndentationConfig, IndentationRule, builtin_rules};
pub use engine::{LintContext, LintMode, LintResult, Rule, RuleEngine, RuleInfo, RuleOutcome};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
