use std::{fmt, path::PathBuf};

use thiserror::Error;

use crate::publisher::PageRef;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Not a YouTube video reference: {input} ({reason})")]
    InvalidReference { input: String, reason: String },

    #[error("No transcript available for video {video_id}. Only videos with captions are supported")]
    TranscriptNotFound { video_id: String },

    #[error("Transcript fetch failed for {video_id}: {reason}")]
    TranscriptFailed { video_id: String, reason: String },

    #[error("Metadata unavailable for {video_id}: {reason}")]
    MetadataUnavailable { video_id: String, reason: String },
}

#[derive(Error, Debug)]
pub enum SummarizationError {
    #[error("Transcript too short to summarize: {chars} chars (minimum {min})")]
    TranscriptTooShort { chars: usize, min: usize },

    #[error("Model unavailable: {model}")]
    ModelUnavailable { model: String },

    #[error("Summarization backend failed: {reason}")]
    Upstream { reason: String },

    #[error("Malformed summary response: {reason}")]
    MalformedResponse { reason: String },

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },
}

impl From<reqwest::Error> for SummarizationError {
    fn from(err: reqwest::Error) -> Self {
        SummarizationError::Upstream {
            reason: err.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Database schema incompatible: {reason}")]
    SchemaIncompatible { reason: String },

    #[error("Document store unavailable: {reason}")]
    RemoteUnavailable { reason: String },

    #[error("Document store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Page {} was created but its content is incomplete: {reason}", page.url)]
    Incomplete { page: PageRef, reason: String },

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },
}

impl From<reqwest::Error> for PublishError {
    fn from(err: reqwest::Error) -> Self {
        PublishError::RemoteUnavailable {
            reason: err.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingVars(Vec<&'static str>),
}

/// Pipeline stage of a single video run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Extracting,
    Summarizing,
    Converting,
    Publishing,
    Done,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Extracting => "extracting",
            Stage::Summarizing => "summarizing",
            Stage::Converting => "converting",
            Stage::Publishing => "publishing",
            Stage::Done => "done",
        }
    }

    pub fn next(&self) -> Stage {
        match self {
            Stage::Extracting => Stage::Summarizing,
            Stage::Summarizing => Stage::Converting,
            Stage::Converting => Stage::Publishing,
            Stage::Publishing | Stage::Done => Stage::Done,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error raised by one pipeline stage. Conversion never fails, so it has no variant.
#[derive(Error, Debug)]
pub enum StageError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Summarization(#[from] SummarizationError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl StageError {
    pub fn kind(&self) -> &'static str {
        match self {
            StageError::Extraction(_) => "ExtractionError",
            StageError::Summarization(_) => "SummarizationError",
            StageError::Publish(_) => "PublishError",
        }
    }
}

#[derive(Error, Debug)]
#[error("{stage} failed: {error}")]
pub struct StageFailure {
    pub stage: Stage,
    pub error: StageError,
}

impl StageFailure {
    pub fn new(stage: Stage, error: impl Into<StageError>) -> Self {
        Self {
            stage,
            error: error.into(),
        }
    }
}
