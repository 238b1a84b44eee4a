//! Documents
//!
//! Template documents as read from disk and their rendered counterparts.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Raw template text before rendering
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDocument {
    pub path: PathBuf,
    pub content: String,
}

impl TemplateDocument {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::new(path, content))
    }
}

/// Concrete text produced by the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub path: PathBuf,
    pub content: String,
    /// Defined variable paths the template refers to, sorted
    pub substitutions: Vec<String>,
}

impl RenderedDocument {
    /// A document that goes to the engine as-is
    pub fn verbatim(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            substitutions: Vec::new(),
        }
    }

    /// File extension used when staging the document for the engine
    pub fn extension(&self) -> &str {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("yaml")
    }
}
