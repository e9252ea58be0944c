//! Options of the indentation rule

use kolint_core::{KolintError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Option keys understood by the rule
const KNOWN_OPTIONS: &[&str] = &[
    "indentationSize",
    "newlineAtEnd",
    "alignedParameters",
    "extendedIndentOfParameters",
    "extendedIndentForExpressionBodies",
    "extendedIndentAfterOperators",
    "extendedIndentBeforeDot",
];

/// Indentation settings, built once per run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct IndentationConfig {
    /// Spaces per indentation step
    #[schemars(description = "Number of spaces in one indentation step")]
    pub indentation_size: u32,

    #[schemars(description = "Require exactly one line break at the end of the file")]
    pub newline_at_end: bool,

    /// Align a parameter continuation with the first parameter
    #[schemars(description = "Align wrapped function parameters with the first one")]
    pub aligned_parameters: bool,

    #[schemars(description = "Indent wrapped parameters and arguments by two steps")]
    pub extended_indent_of_parameters: bool,

    #[schemars(description = "Indent an expression body after `=` by two steps")]
    pub extended_indent_for_expression_bodies: bool,

    #[schemars(description = "Indent the operand after a binary operator by two steps")]
    pub extended_indent_after_operators: bool,

    #[schemars(description = "Indent a wrapped `.`, `?.` or `?:` by two steps")]
    pub extended_indent_before_dot: bool,
}

impl Default for IndentationConfig {
    fn default() -> Self {
        Self {
            indentation_size: 4,
            newline_at_end: true,
            aligned_parameters: true,
            extended_indent_of_parameters: false,
            extended_indent_for_expression_bodies: false,
            extended_indent_after_operators: true,
            extended_indent_before_dot: false,
        }
    }
}

impl IndentationConfig {
    /// Build from the `options` table of the rule configuration
    ///
    /// Unknown keys are ignored with a warning.
    pub fn from_options(options: Option<&serde_json::Value>) -> Result<Self> {
        let Some(options) = options else {
            return Ok(Self::default());
        };
        let Some(table) = options.as_object() else {
            return Err(KolintError::config_error(
                "indentation options must be a table",
            ));
        };
        for key in table.keys() {
            if !KNOWN_OPTIONS.contains(&key.as_str()) {
                warn!("Ignoring unknown indentation option '{}'", key);
            }
        }

        let config: Self = serde_json::from_value(options.clone())
            .map_err(|e| KolintError::config_error(format!("invalid indentation options: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.indentation_size == 0 {
            return Err(KolintError::config_error(
                "indentationSize must be greater than zero",
            ));
        }
        Ok(())
    }

    pub(crate) fn indent_size(&self) -> i64 {
        i64::from(self.indentation_size)
    }

    /// One step, or two when `extended` is set
    pub(crate) fn step(&self, extended: bool) -> i64 {
        if extended {
            2 * self.indent_size()
        } else {
            self.indent_size()
        }
    }

    pub(crate) fn spaces(&self) -> String {
        " ".repeat(self.indentation_size as usize)
    }
}
