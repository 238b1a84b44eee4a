//! Stack configs
//!
//! A stack config is a YAML document that names a template through
//! `template_path` and supplies values for its `parameters`. Instead of
//! linting the config itself, the referenced template is linted and its
//! declared parameters are cross-checked against the config.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use thiserror::Error;

use crate::core::{Diagnostic, Location};

pub const TEMPLATE_PATH_KEY: &str = "template_path";
/// Fallback directory for templates, relative to the project root
pub const TEMPLATES_DIR: &str = "templates";

/// Rule id for config parameters the template does not declare
pub const RULE_UNDECLARED_PARAMETER: &str = "SC001";
/// Rule id for template parameters without default and without value
pub const RULE_MISSING_PARAMETER: &str = "SC002";

/// Failure to resolve or read the template behind a stack config
#[derive(Debug, Error)]
pub enum StackError {
    #[error("template '{template_path}' not found (looked in {})", display_paths(.searched))]
    TemplateNotFound {
        template_path: String,
        searched: Vec<PathBuf>,
    },

    #[error("failed to read template {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("template {} is not valid YAML or JSON: {message}", .path.display())]
    InvalidTemplate { path: PathBuf, message: String },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A rendered document recognised as a stack config
#[derive(Debug, Clone, PartialEq)]
pub struct StackConfig {
    pub template_path: String,
    pub parameters: Mapping,
}

impl StackConfig {
    /// Recognise a stack config; anything else is linted as a template
    pub fn detect(content: &str) -> Option<Self> {
        let Value::Mapping(root) = serde_yaml::from_str::<Value>(content).ok()? else {
            return None;
        };
        let template_path = root.get(TEMPLATE_PATH_KEY)?.as_str()?.to_string();
        let parameters = ["parameters", "Parameters"]
            .iter()
            .find_map(|key| root.get(*key)?.as_mapping().cloned())
            .unwrap_or_default();

        Some(Self {
            template_path,
            parameters,
        })
    }
}

/// Find the template file, trying `<root>/<path>` then `<root>/templates/<path>`
pub fn resolve_template(root: &Path, template_path: &str) -> Result<PathBuf, StackError> {
    let candidates = vec![
        root.join(template_path),
        root.join(TEMPLATES_DIR).join(template_path),
    ];
    candidates
        .iter()
        .find(|candidate| candidate.is_file())
        .cloned()
        .ok_or_else(|| StackError::TemplateNotFound {
            template_path: template_path.to_string(),
            searched: candidates,
        })
}

/// Read a template from disk
pub fn read_template(path: &Path) -> Result<String, StackError> {
    fs::read_to_string(path).map_err(|source| StackError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// The template's `Parameters` section; a template without one declares none
pub fn template_parameters(path: &Path, content: &str) -> Result<Mapping, StackError> {
    let root: Value =
        serde_yaml::from_str(content).map_err(|e| StackError::InvalidTemplate {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(root
        .get("Parameters")
        .and_then(Value::as_mapping)
        .cloned()
        .unwrap_or_default())
}

/// Compare config parameters with the template's declarations
pub fn cross_check(
    config_path: &Path,
    template_path: &Path,
    config_params: &Mapping,
    template_params: &Mapping,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for name in config_params.keys() {
        if !template_params.contains_key(name) {
            diagnostics.push(Diagnostic::error(
                RULE_UNDECLARED_PARAMETER,
                Location::file(config_path),
                format!(
                    "Config parameter '{}' is not declared by template {}",
                    key_text(name),
                    template_path.display()
                ),
            ));
        }
    }

    for (name, declaration) in template_params {
        let has_default = declaration
            .as_mapping()
            .is_some_and(|decl| decl.contains_key("Default"));
        if !has_default && !config_params.contains_key(name) {
            diagnostics.push(Diagnostic::error(
                RULE_MISSING_PARAMETER,
                Location::file(config_path),
                format!(
                    "Template parameter '{}' has no Default and no value in the config",
                    key_text(name)
                ),
            ));
        }
    }

    diagnostics
}

fn key_text(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}
