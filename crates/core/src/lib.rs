pub mod config;
pub mod error;
pub mod extractor;
pub mod fallback;
pub mod format;
pub mod markdown;
pub mod pipeline;
pub mod provider;
pub mod publisher;
pub mod summarizer;
pub mod types;

pub use config::Config;
pub use error::{
    ConfigError, ExtractionError, PublishError, Stage, StageError, StageFailure,
    SummarizationError,
};
pub use extractor::{MetadataSource, TranscriptSource, VideoReference, YtDlp};
pub use markdown::{ContentBlock, TextSpan, convert_markdown, render_markdown};
pub use pipeline::{BatchReport, NoopObserver, Pipeline, PipelineObserver, VideoOutcome};
pub use provider::{Model, ModelConfig};
pub use publisher::{DocumentStore, NotionStore, PageRef, PublishResult, Publisher};
pub use summarizer::{OpenAiBackend, SummarizationBackend, Summarizer, SummaryDocument};
pub use types::{Segment, Transcript, VideoMetadata};
