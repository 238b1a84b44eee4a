//! Engine output parsing
//!
//! Reads the JSON findings list printed by the engine. Field names have
//! drifted between engine releases, so every field is looked up under several
//! spellings, case-insensitively, and unknown fields are ignored.

use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::core::{Diagnostic, Location, Severity};

const RULE_ID_FALLBACK: &str = "unknown";

/// Parse engine stdout into diagnostics, preserving order
///
/// `resolve` maps the file name reported by the engine back to the path the
/// user knows; it receives `None` when a finding names no file.
pub fn parse_findings<F>(stdout: &str, resolve: F) -> Result<Vec<Diagnostic>, String>
where
    F: Fn(Option<&str>) -> PathBuf,
{
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let root: Value = serde_json::from_str(trimmed).map_err(|e| e.to_string())?;
    let findings = match &root {
        Value::Array(items) => items,
        Value::Object(obj) => ["matches", "results", "diagnostics", "findings"]
            .iter()
            .find_map(|key| field(obj, &[*key]).and_then(Value::as_array))
            .ok_or_else(|| "expected a JSON array of findings".to_string())?,
        _ => return Err("expected a JSON array of findings".to_string()),
    };

    findings
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let obj = item
                .as_object()
                .ok_or_else(|| format!("finding #{} is not an object", index))?;
            Ok(parse_finding(obj, &resolve))
        })
        .collect()
}

fn parse_finding<F>(obj: &Map<String, Value>, resolve: &F) -> Diagnostic
where
    F: Fn(Option<&str>) -> PathBuf,
{
    let rule = rule_id(obj).unwrap_or_else(|| RULE_ID_FALLBACK.to_string());
    let severity = field(obj, &["Level", "Severity"])
        .and_then(Value::as_str)
        .map(parse_severity)
        .unwrap_or(Severity::Error);
    let message = field(obj, &["Message", "Description"])
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let location = field(obj, &["Location"]).and_then(Value::as_object);
    let filename = field(obj, &["Filename", "File", "Path"])
        .and_then(Value::as_str)
        .or_else(|| location.and_then(|l| field(l, &["Filename", "File"])?.as_str()));

    let start = location.and_then(|l| field(l, &["Start"])?.as_object());
    let line = start
        .and_then(|s| number(s, &["LineNumber", "Line"]))
        .or_else(|| number(obj, &["LineNumber", "Line"]));
    let column = start
        .and_then(|s| number(s, &["ColumnNumber", "Column"]))
        .or_else(|| number(obj, &["ColumnNumber", "Column"]));

    Diagnostic {
        rule,
        severity,
        location: Location {
            path: resolve(filename),
            line,
            column,
        },
        message,
    }
}

fn rule_id(obj: &Map<String, Value>) -> Option<String> {
    match field(obj, &["Rule", "RuleId", "Check"])? {
        Value::String(id) => Some(id.clone()),
        Value::Object(rule) => field(rule, &["Id", "RuleId"])
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

/// Unknown levels count as errors so nothing is silently downgraded
fn parse_severity(level: &str) -> Severity {
    level.parse().unwrap_or(Severity::Error)
}

fn field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| {
        obj.get(*name).or_else(|| {
            obj.iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value)
        })
    })
}

fn number(obj: &Map<String, Value>, names: &[&str]) -> Option<usize> {
    let value = field(obj, names)?;
    value
        .as_u64()
        .map(|n| n as usize)
        .or_else(|| value.as_str()?.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn resolve(name: Option<&str>) -> PathBuf {
        PathBuf::from(name.unwrap_or("<none>"))
    }

    #[test]
    fn empty_output_means_no_findings() {
        assert!(parse_findings("", resolve).unwrap().is_empty());
        assert!(parse_findings("  \n", resolve).unwrap().is_empty());
        assert!(parse_findings("[]", resolve).unwrap().is_empty());
    }

    #[test]
    fn current_format() {
        let stdout = r#"[
          {
            "Filename": "templates/app.yaml",
            "Level": "Warning",
            "Location": {
              "Start": {"ColumnNumber": 5, "LineNumber": 12},
              "End": {"ColumnNumber": 9, "LineNumber": 12},
              "Path": ["Resources", "Bucket"]
            },
            "Message": "Unused parameter",
            "Rule": {"Id": "W2001", "ShortDescription": "Check if Parameters are Used"}
          },
          {
            "Filename": "templates/app.yaml",
            "Level": "Error",
            "Location": {"Start": {"ColumnNumber": 1, "LineNumber": 3}},
            "Message": "Invalid resource type",
            "Rule": {"Id": "E3001"}
          }
        ]"#;
        let diagnostics = parse_findings(stdout, resolve).unwrap();
        assert_eq!(diagnostics.len(), 2);

        assert_eq!(diagnostics[0].rule, "W2001");
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert_eq!(diagnostics[0].location.line, Some(12));
        assert_eq!(diagnostics[0].location.column, Some(5));
        assert_eq!(diagnostics[0].path(), Path::new("templates/app.yaml"));

        assert_eq!(diagnostics[1].rule, "E3001");
        assert_eq!(diagnostics[1].severity, Severity::Error);
    }

    #[test]
    fn drifted_field_names() {
        let stdout = r#"{"matches": [
          {"rule": "I3042", "severity": "informational", "message": "Hardcoded partition",
           "filename": "a.yaml", "line": "7", "column": 2, "extra": true},
          {"Rule": "E0000", "Level": "Fatal", "Message": "Null value"}
        ]}"#;
        let diagnostics = parse_findings(stdout, resolve).unwrap();
        assert_eq!(diagnostics.len(), 2);

        assert_eq!(diagnostics[0].rule, "I3042");
        assert_eq!(diagnostics[0].severity, Severity::Informational);
        assert_eq!(diagnostics[0].location.line, Some(7));
        assert_eq!(diagnostics[0].location.column, Some(2));

        // Unknown level falls back to error, missing file goes through resolve
        assert_eq!(diagnostics[1].severity, Severity::Error);
        assert_eq!(diagnostics[1].path(), Path::new("<none>"));
        assert_eq!(diagnostics[1].location.line, None);
    }

    #[test]
    fn malformed_output() {
        assert!(parse_findings("Traceback (most recent call last):", resolve).is_err());
        assert!(parse_findings("42", resolve).is_err());
        assert!(parse_findings("[1, 2]", resolve).is_err());
        assert!(parse_findings(r#"{"unexpected": []}"#, resolve).is_err());
    }
}
