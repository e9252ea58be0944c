//! Kotlin source discovery
//!
//! Walks a directory tree and keeps the files matching the configured
//! include patterns and none of the exclude patterns.

use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::FilesConfiguration;
use crate::error::KolintError;
use crate::result::Result;

/// Directories never descended into
const SKIPPED_DIRS: &[&str] = &["target", "build", "node_modules"];

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| {
                KolintError::config_error(format!("Invalid glob pattern '{p}': {e}"))
            })
        })
        .collect()
}

fn matches_any(patterns: &[Pattern], relative: &str) -> bool {
    patterns.iter().any(|pattern| {
        pattern.matches(relative)
            // `**/` also matches files at the walk root
            || pattern
                .as_str()
                .strip_prefix("**/")
                .and_then(|rest| Pattern::new(rest).ok())
                .is_some_and(|rest| rest.matches(relative))
    })
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
}

/// Discover Kotlin files under `root`, sorted by path
///
/// A file given directly as `root` is returned as is, whatever the patterns say.
pub fn discover_files(root: &Path, files: &FilesConfiguration) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    if !root.exists() {
        return Err(KolintError::io_error(
            root,
            std::io::Error::new(std::io::ErrorKind::NotFound, "path does not exist"),
        ));
    }

    let include = compile_patterns(&files.include)?;
    let exclude = compile_patterns(&files.exclude)?;

    let mut found = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        if matches_any(&include, &relative) && !matches_any(&exclude, &relative) {
            found.push(path.to_path_buf());
        }
    }

    found.sort();
    debug!("Discovered {} file(s) under {}", found.len(), root.display());
    Ok(found)
}
