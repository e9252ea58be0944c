//! Configuration types

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::diagnostics::Severity;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct KolintConfiguration {
    /// Stop config discovery at this directory
    #[schemars(description = "Stop config file discovery at this directory")]
    pub root: bool,

    #[schemars(description = "File inclusion/exclusion patterns")]
    pub files: FilesConfiguration,

    /// Per-rule settings keyed by rule id
    #[schemars(description = "Rule configuration keyed by rule id, e.g. \"style/indentation\"")]
    pub rules: IndexMap<String, RuleConfig>,
}

/// Files configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct FilesConfiguration {
    #[schemars(description = "Glob patterns for files to include")]
    pub include: Vec<String>,

    #[schemars(description = "Glob patterns for files to exclude")]
    pub exclude: Vec<String>,
}

impl Default for FilesConfiguration {
    fn default() -> Self {
        Self {
            include: vec!["**/*.kt".to_string(), "**/*.kts".to_string()],
            exclude: Vec::new(),
        }
    }
}

/// Rule severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    /// Disable the rule
    Off,
    Info,
    /// Warning (doesn't fail `check` on its own severity)
    Warn,
    Error,
}

impl RuleSeverity {
    /// Diagnostic severity for an enabled rule, `None` when switched off
    pub fn to_severity(self) -> Option<Severity> {
        match self {
            RuleSeverity::Off => None,
            RuleSeverity::Info => Some(Severity::Info),
            RuleSeverity::Warn => Some(Severity::Warning),
            RuleSeverity::Error => Some(Severity::Error),
        }
    }
}

/// Rule-specific configuration with options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RuleConfig {
    #[schemars(description = "Override the default severity for this rule")]
    pub severity: Option<RuleSeverity>,

    #[schemars(description = "Options understood by this rule")]
    pub options: Option<serde_json::Value>,
}

impl KolintConfiguration {
    /// Settings for one rule, if configured
    pub fn rule(&self, rule_id: &str) -> Option<&RuleConfig> {
        self.rules.get(rule_id)
    }

    /// Whether a rule is switched off explicitly
    pub fn is_rule_disabled(&self, rule_id: &str) -> bool {
        self.rule(rule_id)
            .and_then(|r| r.severity)
            .is_some_and(|s| s == RuleSeverity::Off)
    }

    /// Merge a farther (parent directory) config underneath this one
    ///
    /// Values set here win; rule options are merged key by key.
    pub fn merge_with(&mut self, base: KolintConfiguration) {
        if self.files == FilesConfiguration::default() {
            self.files = base.files;
        }
        for (rule_id, base_rule) in base.rules {
            match self.rules.get_mut(&rule_id) {
                Some(rule) => {
                    if rule.severity.is_none() {
                        rule.severity = base_rule.severity;
                    }
                    rule.options = merge_options(base_rule.options, rule.options.take());
                }
                None => {
                    self.rules.insert(rule_id, base_rule);
                }
            }
        }
    }

    /// JSON Schema for configuration files
    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(KolintConfiguration))
            .unwrap_or(serde_json::Value::Null)
    }
}

fn merge_options(
    base: Option<serde_json::Value>,
    overlay: Option<serde_json::Value>,
) -> Option<serde_json::Value> {
    match (base, overlay) {
        (Some(serde_json::Value::Object(mut base)), Some(serde_json::Value::Object(overlay))) => {
            base.extend(overlay);
            Some(serde_json::Value::Object(base))
        }
        (base, None) => base,
        (_, overlay) => overlay,
    }
}
