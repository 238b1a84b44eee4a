//! Subprocess adapter for `cfn-lint` style engines
//!
//! Rendered documents are staged in a private temporary directory, the engine
//! is run once over all of them with JSON output, and reported file names are
//! mapped back to the documents' original paths.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use super::engine::{EngineInvocationError, LintEngine, RuleConfig};
use super::output::parse_findings;
use crate::core::{Diagnostic, RenderedDocument};

pub const DEFAULT_PROGRAM: &str = "cfn-lint";

/// Highest exit status that is still a combination of finding bits
const MAX_FINDINGS_STATUS: i32 = 15;

/// Runs an external engine that speaks the `cfn-lint` command line
#[derive(Debug, Clone)]
pub struct CfnLintEngine {
    program: String,
}

impl Default for CfnLintEngine {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl CfnLintEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Command-line arguments for one invocation
    pub fn command_args(&self, rules: &RuleConfig, files: &[PathBuf]) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["--format".into(), "json".into()];
        for (flag, values) in [
            ("--ignore-checks", &rules.ignore_checks),
            ("--include-checks", &rules.include_checks),
            ("--regions", &rules.regions),
        ] {
            if !values.is_empty() {
                args.push(flag.into());
                args.extend(values.iter().map(OsString::from));
            }
        }
        args.push("--".into());
        args.extend(files.iter().map(|f| f.as_os_str().to_owned()));
        args
    }

    fn classify(&self, output: &Output) -> Result<(), EngineInvocationError> {
        let unexpected = |status: String| EngineInvocationError::UnexpectedStatus {
            program: self.program.clone(),
            status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        };
        match output.status.code() {
            Some(code) if is_findings_status(code) => Ok(()),
            Some(code) => Err(unexpected(code.to_string())),
            None => Err(unexpected("(terminated by signal)".to_string())),
        }
    }
}

/// 0 is clean; bits 2/4/8 flag error/warning/informational findings.
/// Bit 1 means the engine itself failed.
pub fn is_findings_status(code: i32) -> bool {
    (0..=MAX_FINDINGS_STATUS).contains(&code) && code & 1 == 0
}

/// A rendered document written to the staging directory
struct Staged {
    file: PathBuf,
    original: PathBuf,
}

fn stage(dir: &Path, documents: &[RenderedDocument]) -> std::io::Result<Vec<Staged>> {
    documents
        .iter()
        .enumerate()
        .map(|(index, doc)| {
            let name = match doc.path.file_name().and_then(|n| n.to_str()) {
                Some(name) if doc.path.extension().is_some() => name.to_string(),
                _ => format!("document.{}", doc.extension()),
            };
            // Index prefix keeps documents with equal file names apart
            let file = dir.join(format!("{:04}-{}", index, name));
            fs::write(&file, &doc.content)?;
            Ok(Staged {
                file,
                original: doc.path.clone(),
            })
        })
        .collect()
}

fn resolve_original(staged: &[Staged], reported: Option<&str>) -> PathBuf {
    let Some(reported) = reported else {
        return match staged {
            [only] => only.original.clone(),
            _ => PathBuf::from("<unknown>"),
        };
    };
    let reported_path = Path::new(reported);
    staged
        .iter()
        .find(|s| {
            s.file == reported_path
                || (reported_path.file_name().is_some()
                    && s.file.file_name() == reported_path.file_name())
        })
        .map(|s| s.original.clone())
        .unwrap_or_else(|| reported_path.to_path_buf())
}

impl LintEngine for CfnLintEngine {
    fn name(&self) -> &str {
        &self.program
    }

    fn lint(
        &self,
        documents: &[RenderedDocument],
        rules: &RuleConfig,
    ) -> Result<Vec<Diagnostic>, EngineInvocationError> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let staging_error = |source| EngineInvocationError::Staging {
            program: self.program.clone(),
            source,
        };
        let dir = tempfile::Builder::new()
            .prefix("stacklint-")
            .tempdir()
            .map_err(staging_error)?;
        let staged = stage(dir.path(), documents).map_err(staging_error)?;
        let files: Vec<PathBuf> = staged.iter().map(|s| s.file.clone()).collect();

        let args = self.command_args(rules, &files);
        log::debug!("Running {} {:?}", self.program, args);

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| EngineInvocationError::Unreachable {
                program: self.program.clone(),
                source,
            })?;
        log::debug!("{} exited with {}", self.program, output.status);
        self.classify(&output)?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_findings(&stdout, |reported| resolve_original(&staged, reported)).map_err(
            |message| EngineInvocationError::MalformedOutput {
                program: self.program.clone(),
                message,
            },
        )
    }
}
