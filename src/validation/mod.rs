//! Validation Engine Adapter
//!
//! Separates the lint-engine capability from the concrete subprocess engine
//! and from output parsing.

pub mod cfn_lint;
pub mod engine;
pub mod output;

pub use cfn_lint::CfnLintEngine;
pub use engine::{EngineInvocationError, LintEngine, RuleConfig};
