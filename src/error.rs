use std::path::PathBuf;

use thiserror::Error;

use crate::predictor::PredictionError;

/// Why an upload was turned away. All of these collapse into a redirect back
/// to the form; the variant only shows up in logs and tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    #[error("no file part in request")]
    MissingFile,
    #[error("no selected file")]
    EmptyFilename,
    #[error("file type not allowed: {0}")]
    DisallowedExtension(String),
    #[error("filename has no safe characters: {0}")]
    UnsafeFilename(String),
}

/// Every way the upload → report pipeline can fail.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    #[error("{}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Parse(String),

    #[error("column '{0}' not found")]
    MissingColumn(String),

    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

impl PipelineError {
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Storage {
            path: path.into(),
            source,
        }
    }

    /// Short machine-readable name of the failure class, used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "validation",
            PipelineError::Storage { .. } => "storage",
            PipelineError::Parse(_) => "parse",
            PipelineError::MissingColumn(_) => "missing-column",
            PipelineError::Prediction(_) => "prediction",
        }
    }
}

impl From<csv::Error> for PipelineError {
    fn from(e: csv::Error) -> Self {
        PipelineError::Parse(e.to_string())
    }
}
