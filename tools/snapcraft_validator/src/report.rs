use std::fmt::Write as _;
use std::path::Path;

use crate::ConfigError;
use crate::validation::{Note, ValidationIssue, ValidationReport};

/// Renders the full human-readable report for a completed validation pass.
pub fn render_report(path: &Path, report: &ValidationReport) -> String {
    let mut out = header(path);

    for note in &report.notes {
        let _ = match note {
            Note::Check(text) => writeln!(out, "✓ {text}"),
            Note::Label(text) => writeln!(out, "  {text}"),
            Note::Item { indent, value } => writeln!(out, "{}- {value}", "  ".repeat(*indent)),
        };
    }
    out.push('\n');

    let errors: Vec<_> = report.errors().collect();
    let warnings: Vec<_> = report.warnings().collect();

    if !errors.is_empty() {
        out.push_str("❌ Validation FAILED:\n\n");
        write_issues(&mut out, "❌", &errors);
    }
    if !warnings.is_empty() {
        out.push_str("⚠️  Warnings:\n\n");
        write_issues(&mut out, "⚠️ ", &warnings);
    }

    if errors.is_empty() && warnings.is_empty() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        let _ = writeln!(out, "✅ Validation PASSED - {name} is properly configured!\n");
    } else if errors.is_empty() {
        out.push_str("✅ Validation PASSED with warnings\n\n");
    }
    out
}

/// Renders the report for a manifest that could not be loaded.
pub fn render_load_error(path: &Path, err: &ConfigError) -> String {
    let mut out = header(path);
    let _ = match err {
        ConfigError::NotAMapping => writeln!(
            out,
            "❌ Error: {} does not contain a YAML mapping at the top level",
            path.display()
        ),
        other => writeln!(out, "❌ Error: {other}"),
    };
    out
}

fn header(path: &Path) -> String {
    format!("Validating {}...\n\n", path.display())
}

fn write_issues(out: &mut String, marker: &str, issues: &[&ValidationIssue]) {
    for issue in issues {
        let _ = match issue.location {
            Some(loc) => writeln!(
                out,
                "  {marker} {} (line {}, column {})",
                issue.message, loc.line, loc.column
            ),
            None => writeln!(out, "  {marker} {}", issue.message),
        };
    }
    out.push('\n');
}
