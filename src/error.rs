use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop a pipeline run.
///
/// None of these are recovered from: the first error aborts the run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot open {}: {source}", .path.display())]
    MissingFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("missing required column `{column}`")]
    MissingColumn { column: String },

    #[error("line {line}: field `{field}` is not a number: {value:?}")]
    Parse {
        line: u64,
        field: String,
        value: String,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
