use std::path::PathBuf;
use thiserror::Error;

use crate::ir::HdlLanguage;

/// Failures surfaced by the extraction pipeline.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("{language} grammar is not available: {reason}")]
    GrammarUnavailable {
        language: HdlLanguage,
        reason: String,
    },

    #[error("source contains neither an entity nor a package")]
    NoParseableUnit,

    #[error("could not locate the {region} region")]
    MalformedRegion { region: &'static str },

    #[error("no case dispatch on a state register was found")]
    FsmPatternNotFound,

    #[error("source is {size} bytes, above the {limit} byte limit")]
    SourceTooLarge { size: usize, limit: usize },

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("extraction worker failed: {0}")]
    WorkerFailed(String),
}

impl ExtractionError {
    /// True for errors that leave an empty but valid sub-model behind.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ExtractionError::MalformedRegion { .. } | ExtractionError::FsmPatternNotFound
        )
    }
}

pub type Result<T> = std::result::Result<T, ExtractionError>;
