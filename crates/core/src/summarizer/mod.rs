//! Chunked transcript summarization into the four-section template.

pub mod backend;
pub mod chunk;
pub mod template;

use std::sync::Arc;

use tracing::{debug, info, warn};

pub use backend::{CompletionRequest, OpenAiBackend, SummarizationBackend};
pub use chunk::split_into_chunks;
pub use template::{Section, SummaryDocument, TemplateIssue};

use crate::{config::SummarizerConfig, error::SummarizationError, provider::Model};

pub struct Summarizer {
    backend: Arc<dyn SummarizationBackend>,
    config: SummarizerConfig,
}

impl Summarizer {
    pub fn new(backend: Arc<dyn SummarizationBackend>, config: SummarizerConfig) -> Self {
        Self { backend, config }
    }

    /// Summarize `transcript` with `model`.
    ///
    /// Transcripts over the chunk threshold are summarized part by part, the
    /// partial summaries merged section-wise and then consolidated by one more
    /// call. An unknown model fails before any backend call.
    pub async fn summarize(
        &self,
        transcript: &str,
        model: &str,
    ) -> Result<SummaryDocument, SummarizationError> {
        let model: Model = model.parse()?;

        let text = transcript.trim();
        let chars = text.chars().count();
        if chars < self.config.min_transcript_chars {
            return Err(SummarizationError::TranscriptTooShort {
                chars,
                min: self.config.min_transcript_chars,
            });
        }

        if chars <= self.config.chunk_threshold_chars {
            debug!(%model, chars, "summarizing in a single pass");
            let raw = self
                .call(model, template::SYSTEM_PROMPT, template::chunk_prompt(text, None))
                .await?;
            report_template_issues(&raw, "single pass");
            return SummaryDocument::parse(&raw);
        }

        let chunks = split_into_chunks(text, self.config.chunk_threshold_chars);
        let total = chunks.len();
        info!(%model, chars, chunks = total, "summarizing transcript in chunks");

        let mut parts = Vec::with_capacity(total);
        for (i, chunk) in chunks.iter().enumerate() {
            debug!(part = i + 1, total, chars = chunk.chars().count(), "summarizing chunk");
            let raw = self
                .call(
                    model,
                    template::SYSTEM_PROMPT,
                    template::chunk_prompt(chunk, Some((i + 1, total))),
                )
                .await?;
            report_template_issues(&raw, &format!("part {} of {total}", i + 1));
            parts.push(SummaryDocument::parse(&raw)?);
        }

        if parts.len() == 1 {
            return Ok(parts.remove(0));
        }

        let merged = SummaryDocument::merge(&parts);
        let raw = self
            .call(
                model,
                template::system_prompt(true),
                template::consolidation_prompt(&merged, total),
            )
            .await?;
        report_template_issues(&raw, "consolidation");
        SummaryDocument::parse(&raw)
    }

    async fn call(
        &self,
        model: Model,
        system: &str,
        user: String,
    ) -> Result<String, SummarizationError> {
        let request = CompletionRequest {
            model,
            system: system.to_string(),
            user,
            max_tokens: self.config.max_output_tokens.min(model.config().max_tokens),
            temperature: self.config.temperature,
        };
        self.backend.complete(&request).await
    }
}

/// Log each way a raw response strays from the template. Parsing repairs
/// these afterwards, so they are warnings rather than errors.
fn report_template_issues(raw: &str, response: &str) -> Vec<TemplateIssue> {
    let issues = SummaryDocument::validate(raw);
    for issue in &issues {
        warn!(response, ?issue, "summary response deviates from template");
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messy_response_is_reported() {
        let raw = "Intro line.\n\n## Summary\nEnd.\n\n## Overview\nStart.\n\n## Overview\nAgain.";
        let issues = report_template_issues(raw, "single pass");
        assert!(issues.contains(&TemplateIssue::Preamble));
        assert!(issues.contains(&TemplateIssue::OutOfOrder(Section::Overview)));
        assert!(issues.contains(&TemplateIssue::Duplicate(Section::Overview)));
        assert!(issues.contains(&TemplateIssue::Missing(Section::KeyInsights)));
    }

    #[test]
    fn test_well_formed_response_reports_nothing() {
        let raw = "## Overview\na\n\n## Key Insights\nb\n\n## Detailed Information\nc\n\n## Summary\nd";
        assert!(report_template_issues(raw, "consolidation").is_empty());
    }
}
