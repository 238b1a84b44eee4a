//! Entrypoint Orchestrator
//!
//! Resolves the working set of documents, then renders and lints them one at
//! a time. A failure in one document becomes an error diagnostic for that
//! document and processing continues with the next.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::config::{Config, ConfigError};
use crate::core::{Diagnostic, Location, RenderedDocument, RunResult, TemplateDocument};
use crate::stack::{self, StackConfig, StackError};
use crate::template::{self, RenderError};
use crate::validation::{EngineInvocationError, LintEngine};

/// File extensions picked up by directory scans
pub const DOCUMENT_EXTENSIONS: &[&str] = &["yaml", "yml", "json", "template"];
/// Directory holding stack configs; scanned instead of the root when present
pub const CONFIG_DIR: &str = "config";
/// Skipped in directory scans
pub const DEFAULT_SKIP: &str = "config.yaml";

pub const RULE_IO: &str = "io";
pub const RULE_RENDER: &str = "render";
pub const RULE_ENGINE: &str = "engine";
pub const RULE_STACK: &str = "stack";

/// Why a single document could not be validated
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read document: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Engine(#[from] EngineInvocationError),

    #[error(transparent)]
    Stack(#[from] StackError),
}

impl DocumentError {
    pub fn rule(&self) -> &'static str {
        match self {
            DocumentError::Io(_) => RULE_IO,
            DocumentError::Render(_) => RULE_RENDER,
            DocumentError::Engine(_) => RULE_ENGINE,
            DocumentError::Stack(_) => RULE_STACK,
        }
    }

    /// Error-severity diagnostic standing in for the document's findings
    pub fn into_diagnostic(self, path: &Path) -> Diagnostic {
        let location = match &self {
            DocumentError::Render(err) => {
                let (line, column) = err.position();
                Location::at(path, line, column)
            }
            _ => Location::file(path),
        };
        Diagnostic::error(self.rule(), location, self.to_string())
    }
}

/// Resolve documents and lint them all
pub fn run(config: &Config, engine: &dyn LintEngine) -> Result<RunResult, ConfigError> {
    let documents = resolve_documents(config)?;
    if documents.is_empty() {
        log::warn!("No documents to validate under {}", config.root.display());
    }
    Ok(lint_documents(config, engine, &documents))
}

/// Render and lint `documents` in order
pub fn lint_documents(
    config: &Config,
    engine: &dyn LintEngine,
    documents: &[PathBuf],
) -> RunResult {
    let mut result = RunResult::new(config.threshold);
    log::info!("Linting {} documents with {}", documents.len(), engine.name());

    for path in documents {
        log::info!("Validating {}", path.display());
        result.documents += 1;
        match validate_document(config, engine, path) {
            Ok(diagnostics) => result.extend(diagnostics),
            Err(err) => {
                log::warn!("{}: {}", path.display(), err);
                result.push(err.into_diagnostic(path));
            }
        }
    }

    result
}

/// Render one document and lint it, or the template it configures
pub fn validate_document(
    config: &Config,
    engine: &dyn LintEngine,
    path: &Path,
) -> Result<Vec<Diagnostic>, DocumentError> {
    let template = TemplateDocument::load(path)?;
    let rendered = template::render(&template, &config.variables)?;

    match StackConfig::detect(&rendered.content) {
        Some(stack_config) => validate_stack(config, engine, &rendered, &stack_config),
        None => Ok(engine.lint(std::slice::from_ref(&rendered), &config.rules)?),
    }
}

fn validate_stack(
    config: &Config,
    engine: &dyn LintEngine,
    rendered: &RenderedDocument,
    stack_config: &StackConfig,
) -> Result<Vec<Diagnostic>, DocumentError> {
    let template_file = stack::resolve_template(&config.root, &stack_config.template_path)?;
    log::debug!(
        "{} configures template {}",
        rendered.path.display(),
        template_file.display()
    );
    let content = stack::read_template(&template_file)?;
    let declared = stack::template_parameters(&template_file, &content);

    let template = RenderedDocument::verbatim(&template_file, content);
    let mut diagnostics = engine.lint(std::slice::from_ref(&template), &config.rules)?;

    match declared {
        Ok(declared) => diagnostics.extend(stack::cross_check(
            &rendered.path,
            &template_file,
            &stack_config.parameters,
            &declared,
        )),
        Err(err) => diagnostics.push(DocumentError::from(err).into_diagnostic(&rendered.path)),
    }
    Ok(diagnostics)
}

/// The ordered working set of documents
///
/// Explicit paths are taken as given, directories among them are scanned.
/// Without explicit paths the `config/` directory under the root is scanned
/// if it exists, else the root itself.
pub fn resolve_documents(config: &Config) -> Result<Vec<PathBuf>, ConfigError> {
    let mut documents = Vec::new();

    if config.paths.is_empty() {
        let config_dir = config.root.join(CONFIG_DIR);
        let scan_root = if config_dir.is_dir() {
            config_dir
        } else {
            config.root.clone()
        };
        documents.extend(scan_directory(&scan_root, config));
    } else {
        for path in &config.paths {
            let path = locate(path, &config.root)?;
            if path.is_dir() {
                documents.extend(scan_directory(&path, config));
            } else {
                documents.push(path);
            }
        }
    }

    let documents: Vec<PathBuf> = documents
        .into_iter()
        .filter(|path| match &config.only {
            Some(only) => has_suffix(path, only),
            None => true,
        })
        .filter(|path| !config.skip.iter().any(|skip| has_suffix(path, skip)))
        .collect();

    log::debug!("Resolved {} documents", documents.len());
    Ok(documents)
}

/// Relative explicit paths are tried against the working directory, then the root
fn locate(path: &Path, root: &Path) -> Result<PathBuf, ConfigError> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    let under_root = root.join(path);
    if path.is_relative() && under_root.exists() {
        return Ok(under_root);
    }
    Err(ConfigError::MissingPath(path.to_path_buf()))
}

fn scan_directory(dir: &Path, config: &Config) -> Vec<PathBuf> {
    let variables_file = config.root.join(crate::config::DEFAULT_VARIABLES_FILE);

    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::warn!("Skipping unreadable entry: {}", err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_document_extension(path))
        .filter(|path| !path.ends_with(DEFAULT_SKIP))
        .filter(|path| *path != variables_file)
        .map(|path| match path.strip_prefix(".") {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => path,
        })
        .collect()
}

/// Plain text suffix, so `prod.yaml` also matches `eu-prod.yaml`
fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.to_string_lossy().ends_with(suffix)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|s| s.starts_with('.'))
}

fn has_document_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext))
}
