//! Validation Engine
//!
//! The capability interface every lint engine implements, plus the rule
//! configuration passed through to it.

use std::io;

use thiserror::Error;

use crate::core::{Diagnostic, RenderedDocument};

/// Rule selection forwarded to the engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleConfig {
    pub ignore_checks: Vec<String>,
    pub include_checks: Vec<String>,
    pub regions: Vec<String>,
}

/// The engine could not be run or did not behave like a lint engine
#[derive(Debug, Error)]
pub enum EngineInvocationError {
    #[error("failed to launch '{program}': {source}")]
    Unreachable {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("'{program}' exited with unexpected status {status}: {stderr}")]
    UnexpectedStatus {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("could not parse output of '{program}': {message}")]
    MalformedOutput { program: String, message: String },

    #[error("failed to stage documents for '{program}': {source}")]
    Staging {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// lint(documents, rules) -> diagnostics
///
/// Implementations return diagnostics in the engine's native order and must
/// be deterministic for identical input.
pub trait LintEngine {
    /// Short name used in logs
    fn name(&self) -> &str;

    fn lint(
        &self,
        documents: &[RenderedDocument],
        rules: &RuleConfig,
    ) -> Result<Vec<Diagnostic>, EngineInvocationError>;
}
