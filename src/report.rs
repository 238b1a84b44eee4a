//! Report output
//!
//! Text reports print one line per diagnostic followed by a summary line;
//! JSON reports print a single object.

use std::fmt::Write as _;
use std::io::{self, Write};
use std::str::FromStr;

use serde::Serialize;

use crate::config::ConfigError;
use crate::core::{Diagnostic, RunResult, SeverityCounts};

/// Report format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "plain" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(ConfigError::InvalidFormat(other.to_string())),
        }
    }
}

/// One report line for a diagnostic
pub fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    format!(
        "{}: {} [{}] {}",
        diagnostic.location, diagnostic.severity, diagnostic.rule, diagnostic.message
    )
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    format!("{} {}", count, if count == 1 { singular } else { plural })
}

/// Summary line, e.g. `0 errors, 1 warning, 0 infos in 2 documents: PASS`
pub fn format_summary(result: &RunResult) -> String {
    let counts = result.counts();
    format!(
        "{}, {}, {} in {}: {}",
        plural(counts.errors, "error", "errors"),
        plural(counts.warnings, "warning", "warnings"),
        plural(counts.infos, "info", "infos"),
        plural(result.documents, "document", "documents"),
        if result.passed() { "PASS" } else { "FAIL" }
    )
}

pub fn format_text(result: &RunResult) -> String {
    let mut out = String::new();
    for diagnostic in &result.diagnostics {
        let _ = writeln!(out, "{}", format_diagnostic(diagnostic));
    }
    let _ = writeln!(out, "{}", format_summary(result));
    out
}

#[derive(Serialize)]
struct JsonSummary {
    #[serde(flatten)]
    counts: SeverityCounts,
    documents: usize,
    threshold: String,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    diagnostics: &'a [Diagnostic],
    summary: JsonSummary,
    passed: bool,
}

pub fn format_json(result: &RunResult) -> serde_json::Result<String> {
    let report = JsonReport {
        diagnostics: &result.diagnostics,
        summary: JsonSummary {
            counts: result.counts(),
            documents: result.documents,
            threshold: result.threshold.to_string(),
        },
        passed: result.passed(),
    };
    serde_json::to_string_pretty(&report)
}

/// Write the report for `result` in `format`
pub fn write_report<W: Write>(
    writer: &mut W,
    result: &RunResult,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Text => writer.write_all(format_text(result).as_bytes())?,
        OutputFormat::Json => {
            let json = format_json(result).map_err(io::Error::other)?;
            writeln!(writer, "{}", json)?;
        }
    }
    writer.flush()
}
