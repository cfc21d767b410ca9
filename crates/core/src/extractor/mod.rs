//! Transcript and metadata retrieval for a video reference.

mod reference;
pub mod ytdlp;

use async_trait::async_trait;

pub use reference::VideoReference;
pub use ytdlp::YtDlp;

use crate::{
    error::ExtractionError,
    types::{Transcript, VideoMetadata},
};

#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch_transcript(&self, video: &VideoReference) -> Result<Transcript, ExtractionError>;
}

#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch_metadata(&self, video: &VideoReference) -> Result<VideoMetadata, ExtractionError>;
}
