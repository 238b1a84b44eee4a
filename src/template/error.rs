use minijinja::ErrorKind;
use thiserror::Error;

/// Failure to render a template document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("syntax error at {line}:{column}: {message}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("undefined variable '{name}' at {line}:{column}")]
    UndefinedVariable {
        name: String,
        line: usize,
        column: usize,
    },

    #[error("unterminated block at {line}:{column}: {message}")]
    Unterminated {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("evaluation failed at {line}:{column}: {message}")]
    Evaluation {
        message: String,
        line: usize,
        column: usize,
    },
}

impl RenderError {
    /// 1-based line and column the error points at
    pub fn position(&self) -> (usize, usize) {
        match self {
            RenderError::Syntax { line, column, .. }
            | RenderError::UndefinedVariable { line, column, .. }
            | RenderError::Unterminated { line, column, .. }
            | RenderError::Evaluation { line, column, .. } => (*line, *column),
        }
    }

    /// Translate a template engine error raised while compiling or rendering `source`
    pub(crate) fn from_engine(err: &minijinja::Error, source: &str) -> Self {
        let span = err
            .range()
            .and_then(|range| Some((range.start, source.get(range)?)));
        let (line, column) = match span {
            Some((offset, _)) => line_column(source, offset),
            None => (err.line().unwrap_or(1), 1),
        };
        let message = err
            .detail()
            .map(str::to_string)
            .unwrap_or_else(|| err.kind().to_string());

        match err.kind() {
            ErrorKind::UndefinedError => RenderError::UndefinedVariable {
                name: span
                    .map(|(_, text)| text.trim_matches(|c: char| c == '{' || c == '}').trim())
                    .filter(|text| !text.is_empty())
                    .unwrap_or("value")
                    .to_string(),
                line,
                column,
            },
            ErrorKind::SyntaxError if is_unterminated(&message) => RenderError::Unterminated {
                message,
                line,
                column,
            },
            ErrorKind::SyntaxError
            | ErrorKind::UnknownFilter
            | ErrorKind::UnknownTest
            | ErrorKind::UnknownFunction => RenderError::Syntax {
                message,
                line,
                column,
            },
            _ => RenderError::Evaluation {
                message,
                line,
                column,
            },
        }
    }
}

/// The source ran out before a tag or block was closed
fn is_unterminated(message: &str) -> bool {
    message.contains("end of input") || message.contains("end of comment")
}

/// 1-based line and column of a byte offset
fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..offset.min(source.len())];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    (line, before[line_start..].chars().count() + 1)
}
