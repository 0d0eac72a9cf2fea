//! Shared output formatting for lint results.

use std::path::Path;

use anyhow::Result;
use coro_lint_core::{LintResult, Severity, Violation, ViolationDiagnostic};
use miette::{NamedSource, Report};

use crate::OutputFormat;

/// Print lint results in the specified format. `root` is the analyzed path
/// that violation locations are relative to.
pub fn print(result: &LintResult, format: OutputFormat, root: &Path) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(result),
        OutputFormat::Json => return print_json(result),
        OutputFormat::Compact => print_compact(result),
        OutputFormat::Pretty => print_pretty(result, root),
    }
    Ok(())
}

fn print_text(result: &LintResult) {
    let (errors, warnings, infos) = result.count_by_severity();

    for violation in &result.violations {
        let severity_indicator = match violation.severity {
            Severity::Error => "\x1b[31merror\x1b[0m",
            Severity::Warning => "\x1b[33mwarning\x1b[0m",
            Severity::Info => "\x1b[34minfo\x1b[0m",
        };

        println!(
            "{} {} at {}:{}:{}",
            violation.code,
            violation.rule,
            violation.location.file.display(),
            violation.location.line,
            violation.location.column,
        );
        println!("  {}: {}", severity_indicator, violation.message);
        if let Some(fix) = &violation.fix {
            println!("  = help: {}", fix.name);
        }
        println!();
    }

    let summary_color = if errors > 0 {
        "\x1b[31m"
    } else if warnings > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };

    println!(
        "{}Found {} error(s), {} warning(s), {} info(s) in {} file(s), {} fixable\x1b[0m",
        summary_color,
        errors,
        warnings,
        infos,
        result.files_checked,
        result.fixable_count()
    );
}

fn print_json(result: &LintResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    println!("{json}");
    Ok(())
}

fn print_compact(result: &LintResult) {
    for violation in &result.violations {
        println!("{}", compact_line(violation));
    }
}

fn compact_line(violation: &Violation) -> String {
    format!(
        "{}:{}:{}: {} [{}] {}",
        violation.location.file.display(),
        violation.location.line,
        violation.location.column,
        violation.severity,
        violation.code,
        violation.message,
    )
}

fn print_pretty(result: &LintResult, root: &Path) {
    for violation in &result.violations {
        let file = &violation.location.file;
        let path = if file.as_os_str().is_empty() {
            root.to_path_buf()
        } else {
            root.join(file)
        };
        let report = Report::new(ViolationDiagnostic::from(violation));
        match std::fs::read_to_string(&path) {
            Ok(source) => {
                let named = NamedSource::new(path.display().to_string(), source);
                eprintln!("{:?}", report.with_source_code(named));
            }
            Err(e) => {
                tracing::debug!("Cannot read {} for snippet: {e}", path.display());
                eprintln!("{report:?}");
            }
        }
    }
    let (errors, warnings, infos) = result.count_by_severity();
    eprintln!(
        "Found {errors} error(s), {warnings} warning(s), {infos} info(s) in {} file(s)",
        result.files_checked
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use coro_lint_core::Location;
    use std::path::PathBuf;

    #[test]
    fn compact_line_format() {
        let violation = Violation::new(
            "GlobalScopeUsage",
            "global-scope-usage",
            Severity::Warning,
            Location::new(PathBuf::from("app/Main.kt"), 9, 9),
            "GlobalScope should not use",
        );
        assert_eq!(
            compact_line(&violation),
            "app/Main.kt:9:9: warning [GlobalScopeUsage] GlobalScope should not use"
        );
    }
}
