//! Core Types
//!
//! Documents and diagnostics shared by every pipeline stage.

pub mod diagnostics;
pub mod document;

pub use diagnostics::{Diagnostic, Location, RunResult, Severity, SeverityCounts};
pub use document::{RenderedDocument, TemplateDocument};
