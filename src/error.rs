//! Errors that abort a compile
use crate::source_files::Origin;
use std::path::PathBuf;
use thiserror::Error;

fn did_you_mean_note(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!(" (did you mean `{}`?)", s))
        .unwrap_or_default()
}

/// A line of a configuration passage that could not be applied
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DirectiveError {
    #[error("expected `key = value`, found `{0}`")]
    Malformed(String),
    #[error("unknown configuration key `{key}`{}", did_you_mean_note(.suggestion))]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
    },
    #[error("configuration key `{0}` has an empty value")]
    EmptyValue(String),
}

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("story file '{}' not found", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read story file '{}'", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration in passage '{passage}': {source}")]
    Directive {
        passage: String,
        origin: Option<Origin>,
        #[source]
        source: DirectiveError,
    },
}

impl CompileError {
    /// A short stable name for the error
    pub fn get_name(&self) -> &'static str {
        match self {
            CompileError::NotFound(_) => "FileNotFound",
            CompileError::Io { .. } => "FileUnreadable",
            CompileError::Directive { .. } => "ConfigurationDirective",
        }
    }

    /// The source line the error points at, if any
    pub fn origin(&self) -> Option<Origin> {
        match self {
            CompileError::Directive { origin, .. } => *origin,
            _ => None,
        }
    }
}
