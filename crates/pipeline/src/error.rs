use std::path::PathBuf;

use poseaxis_core::error::CoreError;
use poseaxis_db::StoreError;

use crate::orchestrator::Stage;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stage needs an input it was not given, such as a detector.
    #[error("Missing input: {0}")]
    MissingInput(String),
}

impl From<sqlx::Error> for PipelineError {
    fn from(e: sqlx::Error) -> Self {
        Self::Store(StoreError::Database(e))
    }
}

/// The orchestrator's error: which stage failed, and why.
#[derive(Debug, thiserror::Error)]
#[error("Stage '{stage}' failed: {source}")]
pub struct StageFailed {
    pub stage: Stage,
    #[source]
    pub source: PipelineError,
}
