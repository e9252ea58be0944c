//! Configuration file discovery and loading

use std::fs;
use std::path::{Path, PathBuf};

use super::kolint_config::KolintConfiguration;
use crate::error::KolintError;
use crate::result::Result;

/// File names tried in each directory, in order
pub const CONFIG_FILE_NAMES: &[&str] = &[
    "kolint.toml",
    ".kolint.toml",
    "kolint.yaml",
    ".kolint.yaml",
    "kolint.json",
    ".kolint.json",
];

/// Configuration loader for discovering and loading config files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Find every config file from `start_path` upwards, nearest first
    ///
    /// The walk ends at a config with `root = true` or at the filesystem root.
    pub fn auto_discover(start_path: &Path) -> Result<Vec<PathBuf>> {
        let mut current = start_path
            .canonicalize()
            .map_err(|e| KolintError::config_error(format!("Invalid path '{}': {e}", start_path.display())))?;
        if current.is_file()
            && let Some(parent) = current.parent()
        {
            current = parent.to_path_buf();
        }

        let mut found = Vec::new();
        loop {
            if let Some(config_path) = Self::config_in_dir(&current) {
                tracing::debug!("Found config: {}", config_path.display());
                let is_root = Self::load_from_file(&config_path)?.root;
                found.push(config_path);
                if is_root {
                    tracing::debug!("Config has root = true, stopping search");
                    break;
                }
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(found)
    }

    fn config_in_dir(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Load configuration from a specific file, format chosen by extension
    pub fn load_from_file(path: &Path) -> Result<KolintConfiguration> {
        let content = fs::read_to_string(path).map_err(|e| {
            KolintError::config_error(format!("Cannot read config file '{}': {e}", path.display()))
        })?;
        Self::parse_config_content(&content, path)
    }

    fn parse_config_content(content: &str, path: &Path) -> Result<KolintConfiguration> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let invalid = |format: &str, e: &dyn std::fmt::Display| {
            KolintError::config_error(format!("Invalid {format} in '{}': {e}", path.display()))
        };
        match extension {
            "toml" => toml::from_str(content).map_err(|e| invalid("TOML", &e)),
            "yaml" | "yml" => serde_yaml::from_str(content).map_err(|e| invalid("YAML", &e)),
            "json" => serde_json::from_str(content).map_err(|e| invalid("JSON", &e)),
            other => Err(KolintError::config_error(format!(
                "Unsupported config format '.{other}' for '{}'",
                path.display()
            ))),
        }
    }

    /// Load the explicit config, or merge everything discovered from `start_dir`
    ///
    /// Falls back to defaults when nothing is found.
    pub fn load(explicit: Option<&Path>, start_dir: &Path) -> Result<KolintConfiguration> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(KolintError::config_error(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            let config = Self::load_from_file(path)?;
            tracing::info!("Loaded config from: {}", path.display());
            return Ok(config);
        }

        let discovered = Self::auto_discover(start_dir)?;
        let mut files = discovered.iter();
        let Some(nearest) = files.next() else {
            tracing::debug!("No config file found, using defaults");
            return Ok(KolintConfiguration::default());
        };

        let mut config = Self::load_from_file(nearest)?;
        tracing::info!("Loaded config from: {}", nearest.display());
        for path in files {
            config.merge_with(Self::load_from_file(path)?);
            tracing::debug!("Merged parent config: {}", path.display());
        }
        Ok(config)
    }
}
