use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use tubenotes_core::{
    ContentBlock, DocumentStore, ExtractionError, MetadataSource, NoopObserver, PageRef, Pipeline,
    PublishError, Publisher, Segment, Stage, StageError, SummarizationBackend,
    SummarizationError, Summarizer, Transcript, TranscriptSource, VideoMetadata, VideoReference,
    config::SummarizerConfig,
    publisher::{DatabaseSchema, PageDraft, PropertyDescriptor, PropertyKind, PropertyValue},
    summarizer::{CompletionRequest, Section},
};

const SUMMARY: &str = "## Overview\n\nA walkthrough of \"practical rust\" for backend teams.\n\n## Key Insights\n\n### Ownership\n- **Borrowing** avoids copies\n- Lifetimes are *inferred*\n\n## Detailed Information\n\n1. Install the toolchain\n2. Run the tests\n\n## Summary\n\nRust is worth it.";

fn sentence_text(chars: usize) -> String {
    let sentence = "The speaker explains one more idea about building reliable services. ";
    sentence.repeat(chars / sentence.len() + 1)
}

struct FakeTranscripts {
    failing: HashSet<String>,
    text: String,
}

impl FakeTranscripts {
    fn new(text: String) -> Self {
        Self {
            failing: HashSet::new(),
            text,
        }
    }

    fn failing_for(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }
}

#[async_trait]
impl TranscriptSource for FakeTranscripts {
    async fn fetch_transcript(&self, video: &VideoReference) -> Result<Transcript, ExtractionError> {
        if self.failing.contains(video.id()) {
            return Err(ExtractionError::TranscriptNotFound {
                video_id: video.id().to_string(),
            });
        }
        Ok(Transcript {
            segments: vec![Segment {
                start: 0.0,
                end: 60.0,
                text: self.text.clone(),
            }],
            language: "en".to_string(),
        })
    }
}

struct FakeMetadata {
    available: bool,
}

#[async_trait]
impl MetadataSource for FakeMetadata {
    async fn fetch_metadata(&self, video: &VideoReference) -> Result<VideoMetadata, ExtractionError> {
        if !self.available {
            return Err(ExtractionError::MetadataUnavailable {
                video_id: video.id().to_string(),
                reason: "HTTP 429".to_string(),
            });
        }
        Ok(VideoMetadata {
            title: format!("Video {} Notes", video.id()),
            author: Some("Channel".to_string()),
            duration_seconds: Some(600),
            ..VideoMetadata::default()
        })
    }
}

#[derive(Default)]
struct FakeBackend {
    requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeBackend {
    fn calls(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SummarizationBackend for FakeBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, SummarizationError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(SUMMARY.to_string())
    }
}

struct FakeStore {
    schema: DatabaseSchema,
    created: Mutex<Vec<PageDraft>>,
}

impl FakeStore {
    fn new(props: &[(&str, PropertyKind)]) -> Self {
        Self {
            schema: DatabaseSchema::new(
                props
                    .iter()
                    .map(|(name, kind)| PropertyDescriptor::new(*name, kind.clone()))
                    .collect(),
            ),
            created: Mutex::new(Vec::new()),
        }
    }

    fn standard() -> Self {
        Self::new(&[
            ("Name", PropertyKind::Title),
            ("URL", PropertyKind::Url),
            ("Summary", PropertyKind::RichText),
            ("Duration", PropertyKind::Number),
        ])
    }

    fn drafts(&self) -> Vec<PageDraft> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentStore for FakeStore {
    async fn get_schema(&self, _database_id: &str) -> Result<DatabaseSchema, PublishError> {
        Ok(self.schema.clone())
    }

    async fn create_page(&self, _database_id: &str, draft: &PageDraft) -> Result<PageRef, PublishError> {
        let mut created = self.created.lock().unwrap();
        created.push(draft.clone());
        let id = format!("page-{}", created.len());
        Ok(PageRef {
            url: format!("https://www.notion.so/{id}"),
            id,
        })
    }
}

fn summarizer_config() -> SummarizerConfig {
    SummarizerConfig {
        chunk_threshold_chars: 1000,
        min_transcript_chars: 100,
        ..SummarizerConfig::default()
    }
}

struct Harness {
    backend: Arc<FakeBackend>,
    store: Arc<FakeStore>,
    pipeline: Pipeline,
}

fn harness(transcripts: FakeTranscripts, metadata_available: bool, store: FakeStore, model: &str) -> Harness {
    let backend = Arc::new(FakeBackend::default());
    let store = Arc::new(store);
    let pipeline = Pipeline::new(
        Arc::new(transcripts),
        Arc::new(FakeMetadata {
            available: metadata_available,
        }),
        Summarizer::new(backend.clone(), summarizer_config()),
        Publisher::new(store.clone(), "db"),
        model,
    );
    Harness {
        backend,
        store,
        pipeline,
    }
}

fn title_of(draft: &PageDraft) -> Option<&str> {
    draft.properties.iter().find_map(|(_, value)| match value {
        PropertyValue::Title(title) => Some(title.as_str()),
        _ => None,
    })
}

#[tokio::test]
async fn batch_isolates_extraction_failure() {
    let transcripts = FakeTranscripts::new(sentence_text(300)).failing_for("bbbbbbbbbbb");
    let h = harness(transcripts, true, FakeStore::standard(), "gpt-4o-mini");

    let inputs = vec![
        "https://youtu.be/aaaaaaaaaaa".to_string(),
        "https://www.youtube.com/watch?v=bbbbbbbbbbb".to_string(),
        "https://youtu.be/ccccccccccc".to_string(),
    ];
    let report = h.pipeline.run_batch(&inputs, &NoopObserver).await;

    assert_eq!(report.outcomes.len(), 3);
    assert!(report.outcomes[0].is_success());
    assert!(report.outcomes[2].is_success());
    let failure = report.outcomes[1].result.as_ref().unwrap_err();
    assert_eq!(failure.stage, Stage::Extracting);
    assert_eq!(failure.error.kind(), "ExtractionError");
    assert_eq!(report.outcomes[1].video_id.as_deref(), Some("bbbbbbbbbbb"));

    assert_eq!(report.failed_count(), 1);
    assert!(!report.all_succeeded());
    assert_eq!(h.store.drafts().len(), 2);
    assert_eq!(h.backend.calls().len(), 2);
}

#[tokio::test]
async fn invalid_reference_fails_extraction_without_calls() {
    let h = harness(FakeTranscripts::new(sentence_text(300)), true, FakeStore::standard(), "gpt-4o-mini");
    let outcome = h.pipeline.run_one("https://vimeo.com/12345", &NoopObserver).await;

    let failure = outcome.result.unwrap_err();
    assert_eq!(failure.stage, Stage::Extracting);
    assert!(matches!(
        failure.error,
        StageError::Extraction(ExtractionError::InvalidReference { .. })
    ));
    assert!(outcome.video_id.is_none());
    assert!(h.backend.calls().is_empty());
}

#[tokio::test]
async fn published_page_has_heading_and_mapped_properties() {
    let h = harness(FakeTranscripts::new(sentence_text(300)), true, FakeStore::standard(), "gpt-4o");
    let outcome = h.pipeline.run_one("https://youtu.be/aaaaaaaaaaa", &NoopObserver).await;

    let published = outcome.result.unwrap();
    assert_eq!(published.page.url, "https://www.notion.so/page-1");
    assert_eq!(published.title, "Video aaaaaaaaaaa Notes");

    let drafts = h.store.drafts();
    let draft = &drafts[0];
    assert_eq!(draft.blocks[0], ContentBlock::heading(1, "Video Summary"));
    assert!(matches!(draft.blocks[1], ContentBlock::Heading { level: 2, .. }));
    assert!(draft.blocks.iter().any(|b| matches!(b, ContentBlock::NumberedItem { index: 2, .. })));
    assert!(draft.properties.contains(&(
        "URL".to_string(),
        PropertyValue::Url("https://www.youtube.com/watch?v=aaaaaaaaaaa".to_string())
    )));
    assert!(draft.properties.contains(&("Duration".to_string(), PropertyValue::Number(600.0))));
}

#[tokio::test]
async fn degraded_metadata_recovers_title_from_summary() {
    let h = harness(FakeTranscripts::new(sentence_text(300)), false, FakeStore::standard(), "gpt-4o-mini");
    let outcome = h.pipeline.run_one("aaaaaaaaaaa", &NoopObserver).await;

    assert!(outcome.is_success());
    let drafts = h.store.drafts();
    assert_eq!(title_of(&drafts[0]), Some("Practical Rust"));
}

#[tokio::test]
async fn schema_without_title_fails_before_any_write() {
    let store = FakeStore::new(&[("URL", PropertyKind::Url), ("Notes", PropertyKind::RichText)]);
    let h = harness(FakeTranscripts::new(sentence_text(300)), true, store, "gpt-4o-mini");
    let outcome = h.pipeline.run_one("https://youtu.be/aaaaaaaaaaa", &NoopObserver).await;

    let failure = outcome.result.unwrap_err();
    assert_eq!(failure.stage, Stage::Publishing);
    assert!(matches!(
        failure.error,
        StageError::Publish(PublishError::SchemaIncompatible { .. })
    ));
    assert!(h.store.drafts().is_empty());
}

#[tokio::test]
async fn unknown_model_fails_before_any_backend_call() {
    let h = harness(FakeTranscripts::new(sentence_text(300)), true, FakeStore::standard(), "gpt-2");
    let outcome = h.pipeline.run_one("https://youtu.be/aaaaaaaaaaa", &NoopObserver).await;

    let failure = outcome.result.unwrap_err();
    assert_eq!(failure.stage, Stage::Summarizing);
    assert!(matches!(
        failure.error,
        StageError::Summarization(SummarizationError::ModelUnavailable { .. })
    ));
    assert!(h.backend.calls().is_empty());
    assert!(h.store.drafts().is_empty());
}

#[tokio::test]
async fn short_transcript_is_rejected() {
    let h = harness(FakeTranscripts::new("Too short.".to_string()), true, FakeStore::standard(), "gpt-4o-mini");
    let outcome = h.pipeline.run_one("https://youtu.be/aaaaaaaaaaa", &NoopObserver).await;

    let failure = outcome.result.unwrap_err();
    assert!(matches!(
        failure.error,
        StageError::Summarization(SummarizationError::TranscriptTooShort { chars: 10, min: 100 })
    ));
    assert!(h.backend.calls().is_empty());
}

#[tokio::test]
async fn short_transcript_takes_one_call() {
    let backend = Arc::new(FakeBackend::default());
    let summarizer = Summarizer::new(backend.clone(), summarizer_config());

    let summary = summarizer.summarize(&sentence_text(500), "gpt-4o-mini").await.unwrap();

    assert_eq!(backend.calls().len(), 1);
    assert_eq!(summary.section(Section::Summary), "Rust is worth it.");
}

#[tokio::test]
async fn long_transcript_is_chunked_then_consolidated() {
    let backend = Arc::new(FakeBackend::default());
    let summarizer = Summarizer::new(backend.clone(), summarizer_config());

    let transcript = sentence_text(2000);
    let summary = summarizer.summarize(&transcript, "o3-mini").await.unwrap();

    let calls = backend.calls();
    assert!(calls.len() >= 3, "expected chunk calls plus consolidation, got {}", calls.len());
    for call in &calls[..calls.len() - 1] {
        assert!(call.user.contains("Transcript:"));
        assert!(call.user.chars().count() < 1000 + 300);
    }
    let last = calls.last().unwrap();
    assert!(last.user.contains("Consolidate"));

    let markdown = summary.to_markdown();
    for section in Section::ALL {
        let header = format!("## {}", section.title());
        assert_eq!(markdown.lines().filter(|l| *l == header).count(), 1, "{header}");
    }
}
