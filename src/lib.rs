//! stacklint
//!
//! Renders infrastructure-as-code templates and validates them with an
//! external lint engine.
//!
//! This library provides:
//! - Jinja template rendering on top of `minijinja`
//! - A lint engine capability with a `cfn-lint` subprocess adapter
//! - Stack config parameter cross-checks
//! - Orchestration, reporting and configuration for the CLI

pub mod config;
pub mod core;
pub mod orchestrator;
pub mod report;
pub mod stack;
pub mod template;
pub mod validation;
pub mod variables;

// Re-exports for a compact public API
pub use config::{Config, ConfigError};
pub use crate::core::{
    Diagnostic, Location, RenderedDocument, RunResult, Severity, TemplateDocument,
};
pub use orchestrator::run;
pub use template::{RenderError, render};
pub use validation::{CfnLintEngine, EngineInvocationError, LintEngine, RuleConfig};
pub use variables::Variables;

/// Process exit status when the verdict is pass
pub const EXIT_PASS: u8 = 0;
/// Process exit status when at least one diagnostic meets the threshold
pub const EXIT_FINDINGS: u8 = 1;
/// Process exit status for configuration errors
pub const EXIT_CONFIG: u8 = 2;
