//! CLI command implementations

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use kolint_core::{
    ConfigLoader, KolintConfiguration, KolintError, ResultExt, discover_files, unified_diff,
};
use kolint_rules::{LintMode, LintResult, RuleEngine};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::output::{FixedFile, LintSummary, OutputFormatter};
use crate::{OutputFormat, Status};

/// Settings shared by every command
pub struct Options {
    pub config: Option<PathBuf>,
    pub format: OutputFormat,
    pub verbose: bool,
}

/// Directory config discovery starts from
fn config_start_dir(paths: &[PathBuf]) -> PathBuf {
    match paths.first() {
        Some(path) if path.is_file() => path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
        Some(path) => path.clone(),
        None => PathBuf::from("."),
    }
}

fn load_config(options: &Options, paths: &[PathBuf]) -> anyhow::Result<KolintConfiguration> {
    let start = config_start_dir(paths);
    let config = ConfigLoader::load(options.config.as_deref(), &start)?;
    debug!("Loaded configuration with {} rule entries", config.rules.len());
    Ok(config)
}

/// Expand the given paths into the Kotlin files to lint, without duplicates
fn collect_files(paths: &[PathBuf], config: &KolintConfiguration) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        files.extend(discover_files(path, &config.files)?);
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Lint every file in parallel; failures are logged and counted
fn lint_all(engine: &RuleEngine, files: &[PathBuf], mode: LintMode) -> (Vec<LintResult>, usize) {
    let outcomes: Vec<_> = files
        .par_iter()
        .map_init(|| engine.clone(), |engine, path| engine.lint_file(path, mode))
        .collect();

    let mut results = Vec::with_capacity(outcomes.len());
    let mut failed = 0;
    for outcome in outcomes {
        match outcome.log_and_continue() {
            Some(result) => results.push(result),
            None => failed += 1,
        }
    }
    (results, failed)
}

fn prepare(
    paths: &[PathBuf],
    options: &Options,
) -> anyhow::Result<Option<(RuleEngine, Vec<PathBuf>)>> {
    let config = load_config(options, paths)?;
    let engine = RuleEngine::with_builtin_rules(&config)?;
    let files = collect_files(paths, &config)?;
    if files.is_empty() {
        if options.format == OutputFormat::Human {
            println!("No Kotlin files found");
        } else {
            println!("[]");
        }
        return Ok(None);
    }
    info!("Linting {} file(s) with rules {:?}", files.len(), engine.rule_ids());
    Ok(Some((engine, files)))
}

/// `kolint check`
pub fn check_command(paths: Vec<PathBuf>, options: &Options) -> anyhow::Result<Status> {
    let Some((engine, files)) = prepare(&paths, options)? else {
        return Ok(Status::Clean);
    };

    let started = Instant::now();
    let (results, failed) = lint_all(&engine, &files, LintMode::Check);
    let summary = LintSummary::from_results(&results, failed, started.elapsed());

    let formatter = OutputFormatter::new(options.format);
    formatter
        .print_check(&results, &summary)
        .context("Failed to write report")?;
    if options.verbose {
        formatter.print_parse_errors(&results);
    }

    Ok(if failed > 0 {
        Status::Failed
    } else if summary.has_issues() {
        Status::ViolationsFound
    } else {
        Status::Clean
    })
}

/// `kolint fix`
pub fn fix_command(paths: Vec<PathBuf>, dry_run: bool, options: &Options) -> anyhow::Result<Status> {
    let Some((engine, files)) = prepare(&paths, options)? else {
        return Ok(Status::Clean);
    };

    let started = Instant::now();
    let (results, mut failed) = lint_all(&engine, &files, LintMode::Fix);

    let mut fixed = Vec::with_capacity(results.len());
    for result in results {
        let outcome = if !result.changed {
            Ok(None)
        } else if dry_run {
            fs::read_to_string(&result.path)
                .map(|original| Some(unified_diff(&result.path, &original, &result.output_text)))
                .map_err(|e| KolintError::io_error(&result.path, e))
        } else {
            debug!("Writing {}", result.path.display());
            fs::write(&result.path, &result.output_text)
                .map(|()| None)
                .map_err(|e| KolintError::io_error(&result.path, e))
        };
        match outcome.log_and_continue() {
            Some(diff) => fixed.push(FixedFile { result, diff }),
            None => failed += 1,
        }
    }

    let checked: Vec<LintResult> = fixed.iter().map(|f| f.result.clone()).collect();
    let summary = LintSummary::from_results(&checked, failed, started.elapsed());
    OutputFormatter::new(options.format)
        .print_fix(&fixed, &summary, dry_run)
        .context("Failed to write report")?;

    Ok(if failed > 0 {
        Status::Failed
    } else {
        Status::Clean
    })
}

/// `kolint rules`
pub fn rules_command(options: &Options) -> anyhow::Result<Status> {
    let config = load_config(options, &[])?;
    let rules = RuleEngine::describe_builtin_rules(&config);
    OutputFormatter::new(options.format)
        .print_rules(&rules)
        .context("Failed to write rule list")?;
    Ok(Status::Clean)
}
