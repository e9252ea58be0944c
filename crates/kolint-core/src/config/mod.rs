//! Configuration system for kolint
//!
//! - TOML, YAML and JSON configuration files
//! - Auto-discovery by walking up directories
//! - Strong typing with serde and JSON Schema generation via schemars
//!
//! ## Configuration Files
//!
//! Looked up in each directory, first match wins:
//! `kolint.toml`, `.kolint.toml`, `kolint.yaml`, `.kolint.yaml`,
//! `kolint.json`, `.kolint.json`.
//!
//! ## Configuration Discovery
//!
//! Starting from the linted directory, every config found on the way up is
//! merged, nearer files taking precedence. A config with `root = true` ends
//! the walk.
//!
//! ## Example Configuration
//!
//! ```toml
//! root = true
//!
//! [files]
//! include = ["**/*.kt", "**/*.kts"]
//! exclude = ["**/generated/**"]
//!
//! [rules."style/indentation"]
//! severity = "error"
//!
//! [rules."style/indentation".options]
//! indentationSize = 4
//! extendedIndentBeforeDot = true
//! ```

mod kolint_config;
mod loader;

pub use kolint_config::{FilesConfiguration, KolintConfiguration, RuleConfig, RuleSeverity};
pub use loader::{CONFIG_FILE_NAMES, ConfigLoader};
