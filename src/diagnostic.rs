use std::fmt::Write as _;
use std::path::PathBuf;

use crate::interpreter::RuntimeError;
use crate::parser::ParseError;
use crate::resolver::ResolveError;

/// A user-facing error report. Positions are 1-based `(line, column)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: &'static str,
    pub message: String,
    pub file: Option<PathBuf>,
    pub position: Option<(usize, usize)>,
}

impl Diagnostic {
    pub fn new(category: &'static str, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            file: None,
            position: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn from_parse_error(error: &ParseError) -> Self {
        Self {
            position: Some(error.position()),
            ..Self::new(error.category(), error.to_string())
        }
    }

    pub fn from_runtime_error(error: &RuntimeError) -> Self {
        Self::new("RuntimeError", error.to_string())
    }

    /// Parse failures inside an imported module point at that module's file.
    pub fn from_resolve_error(error: &ResolveError) -> Self {
        match error {
            ResolveError::Parse { path, error } => {
                Self::from_parse_error(error).with_file(path.clone())
            }
            other => Self::new("ImportError", other.to_string()),
        }
    }

    /// Picks the most specific rendering for an error coming out of the
    /// driver's `anyhow` plumbing.
    pub fn from_error(error: &anyhow::Error) -> Self {
        if let Some(parse) = error.downcast_ref::<ParseError>() {
            Self::from_parse_error(parse)
        } else if let Some(runtime) = error.downcast_ref::<RuntimeError>() {
            Self::from_runtime_error(runtime)
        } else if let Some(resolve) = error.downcast_ref::<ResolveError>() {
            Self::from_resolve_error(resolve)
        } else {
            Self::new("error", format!("{error:#}"))
        }
    }

    /// Renders the report. The offending line and a caret are shown only
    /// when both a position and the file's `source` are available.
    pub fn render(&self, source: Option<&str>) -> String {
        let mut out = format!("{}: {}\n", self.category, self.message);
        let Some(file) = &self.file else {
            return out;
        };
        let Some((line, column)) = self.position else {
            let _ = writeln!(out, " --> {}", file.display());
            return out;
        };
        let _ = writeln!(out, " --> {}:{line}:{column}", file.display());

        let Some(text) = source.and_then(|source| source.lines().nth(line.saturating_sub(1)))
        else {
            return out;
        };
        let gutter = " ".repeat(line.to_string().len());
        let _ = writeln!(out, "{gutter} |");
        let _ = writeln!(out, "{line} | {text}");
        let _ = writeln!(out, "{gutter} | {}^", caret_indent(text, column));
        out
    }
}

/// Whitespace that lines the caret up under `column`, keeping tabs so the
/// alignment survives the terminal's tab stops.
fn caret_indent(text: &str, column: usize) -> String {
    text.chars()
        .take(column.saturating_sub(1))
        .map(|c| if c == '\t' { '\t' } else { ' ' })
        .collect()
}
