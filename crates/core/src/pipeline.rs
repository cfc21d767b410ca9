//! Sequential per-video orchestration and batch reporting.

use std::sync::Arc;

use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::{
    error::{Stage, StageFailure},
    extractor::{MetadataSource, TranscriptSource, VideoReference},
    fallback::{capitalize_title, needs_capitalization, title_from_summary},
    format::preview,
    markdown::convert_markdown,
    publisher::{PageFields, PublishResult, Publisher},
    summarizer::{Section, Summarizer, SummaryDocument},
    types::VideoMetadata,
};

/// Characters of the overview copied into a summary property.
pub const SUMMARY_PREVIEW_CHARS: usize = 100;

/// Progress callbacks. Every method defaults to doing nothing.
pub trait PipelineObserver: Send + Sync {
    fn video_started(&self, _position: usize, _total: usize, _input: &str) {}

    fn stage_started(&self, _stage: Stage) {}

    fn video_finished(&self, _outcome: &VideoOutcome) {}
}

pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

#[derive(Debug)]
pub struct VideoOutcome {
    pub input: String,
    pub video_id: Option<String>,
    pub run_id: Uuid,
    pub result: Result<PublishResult, StageFailure>,
}

impl VideoOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcomes of a batch, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<VideoOutcome>,
}

impl BatchReport {
    pub fn succeeded_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.succeeded_count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed_count() == 0
    }
}

pub struct Pipeline {
    transcripts: Arc<dyn TranscriptSource>,
    metadata: Arc<dyn MetadataSource>,
    summarizer: Summarizer,
    publisher: Publisher,
    model: String,
}

impl Pipeline {
    pub fn new(
        transcripts: Arc<dyn TranscriptSource>,
        metadata: Arc<dyn MetadataSource>,
        summarizer: Summarizer,
        publisher: Publisher,
        model: impl Into<String>,
    ) -> Self {
        Self {
            transcripts,
            metadata,
            summarizer,
            publisher,
            model: model.into(),
        }
    }

    /// Process every input in order. A failed video never stops the batch.
    pub async fn run_batch(&self, inputs: &[String], observer: &dyn PipelineObserver) -> BatchReport {
        let mut report = BatchReport::default();
        for (i, input) in inputs.iter().enumerate() {
            observer.video_started(i + 1, inputs.len(), input);
            let outcome = self.run_one(input, observer).await;
            observer.video_finished(&outcome);
            report.outcomes.push(outcome);
        }
        info!(
            total = report.outcomes.len(),
            failed = report.failed_count(),
            "batch finished"
        );
        report
    }

    pub async fn run_one(&self, input: &str, observer: &dyn PipelineObserver) -> VideoOutcome {
        let run_id = Uuid::new_v4();
        let span = info_span!("video", %run_id, input);
        let mut video_id = None;

        let result = self
            .process(input, &mut video_id, observer)
            .instrument(span.clone())
            .await;

        span.in_scope(|| match &result {
            Ok(published) => info!(url = %published.page.url, "video published"),
            Err(failure) => warn!(stage = %failure.stage, error = %failure.error, "video failed"),
        });

        VideoOutcome {
            input: input.to_string(),
            video_id,
            run_id,
            result,
        }
    }

    async fn process(
        &self,
        input: &str,
        video_id: &mut Option<String>,
        observer: &dyn PipelineObserver,
    ) -> Result<PublishResult, StageFailure> {
        let mut stage = Stage::Extracting;
        observer.stage_started(stage);

        let video = VideoReference::parse(input).map_err(|e| StageFailure::new(stage, e))?;
        *video_id = Some(video.id().to_string());

        let transcript = self
            .transcripts
            .fetch_transcript(&video)
            .await
            .map_err(|e| StageFailure::new(stage, e))?;
        info!(
            segments = transcript.segments.len(),
            duration_secs = transcript.duration_seconds(),
            "transcript fetched"
        );

        let metadata = match self.metadata.fetch_metadata(&video).await {
            Ok(metadata) => Some(metadata),
            Err(err) => {
                warn!(error = %err, "metadata unavailable, continuing without it");
                None
            }
        };

        stage = stage.next();
        observer.stage_started(stage);
        let summary = self
            .summarizer
            .summarize(&transcript.text(), &self.model)
            .await
            .map_err(|e| StageFailure::new(stage, e))?;

        stage = stage.next();
        observer.stage_started(stage);
        let blocks = convert_markdown(&summary.to_markdown());

        stage = stage.next();
        observer.stage_started(stage);
        let title = resolve_title(metadata.as_ref(), &summary, video.id());
        let metadata = metadata.unwrap_or_else(|| VideoMetadata::titled(title.clone()));
        let url = video.canonical_url();
        let summary_preview = preview(summary.section(Section::Overview), SUMMARY_PREVIEW_CHARS);
        let fields = PageFields {
            title: &title,
            url: &url,
            summary_preview: &summary_preview,
            metadata: &metadata,
        };

        self.publisher
            .publish(&fields, blocks)
            .await
            .map_err(|e| StageFailure::new(stage, e))
    }
}

/// Page title: the video's own title (title-cased when it is all lower
/// case), else one recovered from the summary, else a generic one.
pub fn resolve_title(
    metadata: Option<&VideoMetadata>,
    summary: &SummaryDocument,
    video_id: &str,
) -> String {
    match metadata.map(|m| m.title.trim()).filter(|t| !t.is_empty()) {
        Some(title) if needs_capitalization(title) => capitalize_title(title),
        Some(title) => title.to_string(),
        None => title_from_summary(summary).unwrap_or_else(|| format!("YouTube Summary - {video_id}")),
    }
}
