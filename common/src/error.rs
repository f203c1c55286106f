use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating a workflow definition.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read workflow file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed workflow YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("workflow '{0}' declares no steps")]
    Empty(String),

    #[error("step #{index} has an invalid name '{name}' (must be non-empty, not '.' or '..', without '/' or '\\')")]
    InvalidStepName { index: usize, name: String },

    #[error("step name '{0}' is declared more than once")]
    DuplicateStep(String),

    #[error("step '{0}' has an empty command")]
    EmptyCommand(String),
}

/// Errors raised while parsing targets or the target list file.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("target is empty")]
    Empty,

    #[error("target '{0}' contains whitespace")]
    Whitespace(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid run date '{0}', expected YYYY-MM-DD")]
pub struct RunDateError(pub String);
