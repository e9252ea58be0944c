//! Error types and handling for kolint operations

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for kolint operations
#[derive(Debug, Error)]
pub enum KolintError {
    /// Source text could not be turned into a usable syntax tree
    #[error("Parse error in '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Rule construction or execution errors
    #[error("Rule error in '{rule_id}': {message}")]
    RuleError { rule_id: String, message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Autofix engine errors
    #[error("Autofix error: {message}")]
    FixError { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Config,
    Rule,
    Io,
    Fix,
}

impl KolintError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            KolintError::ParseError { .. } => ErrorKind::Parse,
            KolintError::ConfigError { .. } => ErrorKind::Config,
            KolintError::RuleError { .. } => ErrorKind::Rule,
            KolintError::IoError { .. } => ErrorKind::Io,
            KolintError::FixError { .. } => ErrorKind::Fix,
        }
    }

    /// Check if this error is recoverable (can continue processing other files)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Parse | ErrorKind::Rule | ErrorKind::Io | ErrorKind::Fix
        )
    }

    /// Create a parse error
    pub fn parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a rule error
    pub fn rule_error(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RuleError {
            rule_id: rule_id.into(),
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    /// Create an autofix error
    pub fn fix_error(message: impl Into<String>) -> Self {
        Self::FixError {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for KolintError {
    fn from(source: std::io::Error) -> Self {
        Self::IoError {
            path: PathBuf::new(),
            source,
        }
    }
}
