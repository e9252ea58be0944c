//! Output formatting and reporting
//!
//! Human output goes to stdout as one `path:line:column: severity[rule] message`
//! line per diagnostic followed by a summary. JSON output is a single
//! document per command.

use std::io::{self, Write};
use std::time::Duration;

use colored::Colorize;
use kolint_core::{Diagnostic, Severity, SourceMap};
use kolint_rules::{LintResult, RuleInfo};
use serde::Serialize;

use crate::OutputFormat;

/// Totals over one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LintSummary {
    pub files_checked: usize,
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
    pub hints: usize,
    pub files_changed: usize,
    /// Files that could not be read, linted or written
    pub failed: usize,
    pub elapsed: Duration,
}

impl LintSummary {
    pub fn from_results(results: &[LintResult], failed: usize, elapsed: Duration) -> Self {
        let mut summary = Self {
            files_checked: results.len(),
            failed,
            elapsed,
            ..Self::default()
        };
        for result in results {
            if result.changed {
                summary.files_changed += 1;
            }
            for diagnostic in &result.diagnostics {
                match diagnostic.severity {
                    Severity::Error => summary.errors += 1,
                    Severity::Warning => summary.warnings += 1,
                    Severity::Info => summary.info += 1,
                    Severity::Hint => summary.hints += 1,
                }
            }
        }
        summary
    }

    pub fn total_issues(&self) -> usize {
        self.errors + self.warnings + self.info + self.hints
    }

    pub fn has_issues(&self) -> bool {
        self.total_issues() > 0
    }
}

/// A file handled by `fix`, with its diff when nothing was written
#[derive(Debug)]
pub struct FixedFile {
    pub result: LintResult,
    pub diff: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportedDiagnostic<'a> {
    line: usize,
    column: usize,
    rule_id: &'a str,
    severity: Severity,
    message: &'a str,
    auto_fixable: bool,
}

impl<'a> From<&'a Diagnostic> for ReportedDiagnostic<'a> {
    fn from(diagnostic: &'a Diagnostic) -> Self {
        Self {
            line: diagnostic.location.line,
            column: diagnostic.location.column,
            rule_id: &diagnostic.rule_id,
            severity: diagnostic.severity,
            message: &diagnostic.message,
            auto_fixable: diagnostic.auto_fixable,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileReport<'a> {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    changed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diff: Option<&'a str>,
    diagnostics: Vec<ReportedDiagnostic<'a>>,
}

impl<'a> FileReport<'a> {
    fn checked(result: &'a LintResult) -> Self {
        Self {
            path: result.path.display().to_string(),
            changed: None,
            diff: None,
            diagnostics: result.diagnostics.iter().map(Into::into).collect(),
        }
    }

    fn fixed(file: &'a FixedFile) -> Self {
        Self {
            changed: Some(file.result.changed),
            diff: file.diff.as_deref(),
            ..Self::checked(&file.result)
        }
    }
}

/// Render one diagnostic as a human-readable line
pub fn render_diagnostic(diagnostic: &Diagnostic) -> String {
    let severity = diagnostic.severity.to_string();
    let severity = match diagnostic.severity {
        Severity::Error => severity.red().bold(),
        Severity::Warning => severity.yellow().bold(),
        Severity::Info => severity.blue(),
        Severity::Hint => severity.cyan(),
    };
    format!(
        "{}: {}{} {}",
        diagnostic.location.to_string().bold(),
        severity,
        format!("[{}]", diagnostic.rule_id).dimmed(),
        diagnostic.message
    )
}

/// Format a duration for the summary line
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();
    if total_ms < 1000 {
        format!("{total_ms}ms")
    } else {
        format!("{:.1}s", total_ms as f64 / 1000.0)
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// Output formatter for the selected format
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print the results of `check`
    pub fn print_check(&self, results: &[LintResult], summary: &LintSummary) -> io::Result<()> {
        let mut out = io::stdout().lock();
        match self.format {
            OutputFormat::Human => {
                for diagnostic in results.iter().flat_map(|r| &r.diagnostics) {
                    writeln!(out, "{}", render_diagnostic(diagnostic))?;
                }
                self.write_check_summary(&mut out, summary)
            }
            OutputFormat::Json => {
                let reports: Vec<_> = results.iter().map(FileReport::checked).collect();
                write_json(&mut out, &reports)
            }
        }
    }

    fn write_check_summary(&self, out: &mut impl Write, summary: &LintSummary) -> io::Result<()> {
        let checked = format!(
            "Checked {} in {}",
            plural(summary.files_checked, "file"),
            format_duration(summary.elapsed)
        );
        if summary.has_issues() {
            let mut counts = Vec::new();
            if summary.errors > 0 {
                counts.push(plural(summary.errors, "error").red().to_string());
            }
            if summary.warnings > 0 {
                counts.push(plural(summary.warnings, "warning").yellow().to_string());
            }
            if summary.info > 0 {
                counts.push(summary.info.to_string().blue().to_string() + " info");
            }
            if summary.hints > 0 {
                counts.push(plural(summary.hints, "hint").cyan().to_string());
            }
            writeln!(out, "\n{}: {}", checked, counts.join(", "))?;
        } else {
            writeln!(out, "{}: {}", checked, "no issues found".green())?;
        }
        self.write_failures(out, summary)
    }

    fn write_failures(&self, out: &mut impl Write, summary: &LintSummary) -> io::Result<()> {
        if summary.failed > 0 {
            writeln!(
                out,
                "{}",
                format!("{} could not be processed", plural(summary.failed, "file")).red()
            )?;
        }
        Ok(())
    }

    /// Print the results of `fix`
    pub fn print_fix(
        &self,
        files: &[FixedFile],
        summary: &LintSummary,
        dry_run: bool,
    ) -> io::Result<()> {
        let mut out = io::stdout().lock();
        match self.format {
            OutputFormat::Human => {
                for file in files.iter().filter(|f| f.result.changed) {
                    if let Some(diff) = &file.diff {
                        write!(out, "{diff}")?;
                    }
                    let verb = if dry_run { "Would fix" } else { "Fixed" };
                    writeln!(
                        out,
                        "{} {} ({})",
                        verb.green(),
                        file.result.path.display().to_string().bold(),
                        plural(file.result.diagnostics.len(), "issue")
                    )?;
                }
                let outcome = if dry_run { "would change" } else { "changed" };
                writeln!(
                    out,
                    "{} of {} {} in {}",
                    summary.files_changed,
                    plural(summary.files_checked, "file"),
                    outcome,
                    format_duration(summary.elapsed)
                )?;
                self.write_failures(&mut out, summary)
            }
            OutputFormat::Json => {
                let reports: Vec<_> = files.iter().map(FileReport::fixed).collect();
                write_json(&mut out, &reports)
            }
        }
    }

    /// Print the built-in rules
    pub fn print_rules(&self, rules: &[RuleInfo]) -> io::Result<()> {
        let mut out = io::stdout().lock();
        match self.format {
            OutputFormat::Human => {
                for rule in rules {
                    let id = format!("{:<24}", rule.id).bold();
                    let state = if rule.enabled {
                        format!("{:<8}", rule.severity.to_string()).normal()
                    } else {
                        format!("{:<8}", "off").dimmed()
                    };
                    writeln!(out, "{id} {state} {}", rule.description)?;
                }
                Ok(())
            }
            OutputFormat::Json => write_json(&mut out, rules),
        }
    }

    /// Report parse errors on stderr
    pub fn print_parse_errors(&self, results: &[LintResult]) {
        for result in results.iter().filter(|r| !r.parse_errors.is_empty()) {
            let source_map = SourceMap::new(&result.output_text);
            for error in &result.parse_errors {
                let (line, column) =
                    source_map.offset_to_position(error.span.start, &result.output_text);
                eprintln!(
                    "{}:{}:{}: {} {}",
                    result.path.display(),
                    line,
                    column,
                    "parse error:".yellow(),
                    error.message
                );
            }
        }
    }
}

fn write_json<T: Serialize + ?Sized>(out: &mut impl Write, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}
