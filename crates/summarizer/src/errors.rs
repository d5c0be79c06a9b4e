//! Summarization pipeline error types

use paperdigest_common::errors::AppError;
use std::fmt;
use thiserror::Error;

/// Why a summarization run failed.
///
/// Every variant is terminal for the current request; nothing in the
/// pipeline retries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SummarizeError {
    /// Missing or unusable file reference or owner
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The document bytes could not be parsed
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Blob fetch or LLM call did not complete
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Model output broke the fenced-JSON contract
    #[error("Malformed summary response: {0}")]
    MalformedSummaryResponse(String),

    /// Store write failed
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl SummarizeError {
    /// Stable label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            SummarizeError::InvalidInput(_) => "invalid_input",
            SummarizeError::Extraction(_) => "extraction",
            SummarizeError::UpstreamUnavailable(_) => "upstream_unavailable",
            SummarizeError::MalformedSummaryResponse(_) => "malformed_summary_response",
            SummarizeError::Persistence(_) => "persistence",
        }
    }
}

impl From<SummarizeError> for AppError {
    fn from(e: SummarizeError) -> Self {
        match e {
            SummarizeError::InvalidInput(message) => AppError::Validation {
                message,
                field: Some("fileUrl".to_string()),
            },
            SummarizeError::Extraction(message) => AppError::Extraction { message },
            SummarizeError::UpstreamUnavailable(message) => {
                AppError::UpstreamUnavailable { message }
            }
            SummarizeError::MalformedSummaryResponse(message) => {
                AppError::MalformedSummaryResponse { message }
            }
            SummarizeError::Persistence(message) => AppError::Persistence { message },
        }
    }
}

/// Pipeline stage, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Fetching,
    Extracting,
    Requesting,
    Parsing,
    Persisting,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validating => "validating",
            Stage::Fetching => "fetching",
            Stage::Extracting => "extracting",
            Stage::Requesting => "requesting",
            Stage::Parsing => "parsing",
            Stage::Persisting => "persisting",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// A failed run: the stage that failed and why
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("summarization failed while {stage}: {error}")]
pub struct PipelineFailure {
    pub stage: Stage,
    #[source]
    pub error: SummarizeError,
}

impl PipelineFailure {
    pub fn new(stage: Stage, error: SummarizeError) -> Self {
        Self { stage, error }
    }
}

impl From<PipelineFailure> for AppError {
    fn from(failure: PipelineFailure) -> Self {
        failure.error.into()
    }
}
