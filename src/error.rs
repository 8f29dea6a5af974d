//! Fatal pipeline errors. Row-level defects are not errors; see
//! [`RejectReason`](crate::models::RejectReason).

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cannot read source {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("source has no header row")]
    EmptySource,
}

pub type Result<T> = std::result::Result<T, PipelineError>;
