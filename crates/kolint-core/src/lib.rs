//! Kolint Core
//!
//! Core engine for linting Kotlin sources: a lossless Rowan syntax tree,
//! diagnostics, configuration loading, file discovery and whitespace autofix.

pub mod autofix;
pub mod config;
pub mod cst; // Concrete Syntax Tree (lossless, Rowan-based)
pub mod diagnostics;
pub mod discovery;
pub mod error;
pub mod result;

pub use autofix::{TextEdit, append_token, apply_token_edits, unified_diff};
pub use config::{
    ConfigLoader, FilesConfiguration, KolintConfiguration, RuleConfig, RuleSeverity,
};
pub use cst::{
    KindCategory, KotlinLanguage, KtSyntaxElement, KtSyntaxKind, KtSyntaxNode, KtSyntaxToken,
    parse_kotlin,
};
pub use diagnostics::{Applicability, CodeSuggestion, Diagnostic, Location, Severity, SourceMap};
pub use discovery::discover_files;
pub use error::{ErrorKind, KolintError};
pub use result::{Result, ResultExt};

/// Initialize the tracing subscriber for logging
///
/// `RUST_LOG` takes precedence over `default_directive`.
pub fn init_tracing(default_directive: &str) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // A second initialization (e.g. from tests) is not an error worth reporting.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .try_init();
}

/// Default log filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "kolint=info";

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
