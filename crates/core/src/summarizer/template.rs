//! The four-section summary template: prompts, validation and merging.

use std::fmt;

use crate::error::SummarizationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Overview,
    KeyInsights,
    DetailedInformation,
    Summary,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Overview,
        Section::KeyInsights,
        Section::DetailedInformation,
        Section::Summary,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Section::Overview => "Overview",
            Section::KeyInsights => "Key Insights",
            Section::DetailedInformation => "Detailed Information",
            Section::Summary => "Summary",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Section::Overview => &["overview"],
            Section::KeyInsights => &[
                "key insights",
                "innovative ideas / key insights",
                "innovative ideas/key insights",
                "innovative ideas",
                "key takeaways",
            ],
            Section::DetailedInformation => &["detailed information", "details"],
            Section::Summary => &["summary", "conclusion"],
        }
    }

    fn position(&self) -> usize {
        match self {
            Section::Overview => 0,
            Section::KeyInsights => 1,
            Section::DetailedInformation => 2,
            Section::Summary => 3,
        }
    }

    /// Match a level-1 or level-2 heading line against the section names.
    pub fn from_heading_line(line: &str) -> Option<Section> {
        let trimmed = line.trim();
        let markers = trimmed.bytes().take_while(|b| *b == b'#').count();
        if !(1..=2).contains(&markers) {
            return None;
        }
        let text = trimmed[markers..].strip_prefix(' ')?;
        let normalized = text
            .trim()
            .trim_matches('*')
            .trim_end_matches(':')
            .trim()
            .to_lowercase();
        Section::ALL
            .into_iter()
            .find(|section| section.aliases().contains(&normalized.as_str()))
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateIssue {
    Missing(Section),
    Duplicate(Section),
    OutOfOrder(Section),
    Preamble,
}

pub const SYSTEM_PROMPT: &str = r#"You are an expert summarization assistant. You summarize YouTube video transcripts in a consistent, well-structured Markdown format suitable for Notion. Your response must strictly adhere to the following format:

## Overview
A high-level overview of the video's content in 1-2 concise paragraphs.

## Key Insights
### [Insight Title]
- Supporting detail or bullet point
(Repeat the heading with bullet points as needed)

## Detailed Information
Additional context, supporting details, and in-depth notes.

## Summary
A brief final recap.

Use each of the four section headings exactly once, in this order. Do not add extra text or commentary outside this structure."#;

const CONSOLIDATION_SYSTEM_PROMPT: &str = r#"You merge partial summaries of consecutive parts of one YouTube video into a single summary. Keep the exact Markdown structure below, with each heading exactly once and in this order:

## Overview
## Key Insights
## Detailed Information
## Summary

Remove repetition across parts, keep the strongest insights, and keep the result concise. Do not add commentary outside this structure."#;

pub fn system_prompt(consolidation: bool) -> &'static str {
    if consolidation {
        CONSOLIDATION_SYSTEM_PROMPT
    } else {
        SYSTEM_PROMPT
    }
}

/// User prompt for one transcript chunk. `part` is `(number, total)` when the
/// transcript was split.
pub fn chunk_prompt(text: &str, part: Option<(usize, usize)>) -> String {
    let scope = match part {
        Some((number, total)) => format!(
            "This is part {} of {} of the transcript; summarize only this part.",
            number, total
        ),
        None => "Summarize the following YouTube video transcript.".to_string(),
    };
    format!(
        "{} Use the exact Markdown structure provided, with each section clearly labeled.\n\nTranscript:\n{}",
        scope, text
    )
}

pub fn consolidation_prompt(merged: &SummaryDocument, parts: usize) -> String {
    format!(
        "The following sections combine summaries of {} consecutive parts of the same video. Consolidate them into one summary.\n\n{}",
        parts,
        merged.to_markdown()
    )
}

/// A summary with each of the four sections present exactly once, in order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SummaryDocument {
    bodies: [String; 4],
}

impl SummaryDocument {
    pub fn from_sections(sections: [(Section, &str); 4]) -> Self {
        let mut doc = SummaryDocument::default();
        for (section, body) in sections {
            doc.bodies[section.position()] = body.trim().to_string();
        }
        doc
    }

    pub fn section(&self, section: Section) -> &str {
        &self.bodies[section.position()]
    }

    /// Report every way `markdown` deviates from the template.
    pub fn validate(markdown: &str) -> Vec<TemplateIssue> {
        let mut issues = Vec::new();
        let mut seen: Vec<Section> = Vec::new();
        let mut content_before_first = false;

        for line in SectionLines::new(markdown) {
            match line {
                SectionLine::Heading(section) => {
                    if seen.contains(&section) {
                        issues.push(TemplateIssue::Duplicate(section));
                    } else if seen.last().is_some_and(|last| last.position() > section.position()) {
                        issues.push(TemplateIssue::OutOfOrder(section));
                    }
                    seen.push(section);
                }
                SectionLine::Body(text) => {
                    if seen.is_empty() && !text.trim().is_empty() {
                        content_before_first = true;
                    }
                }
            }
        }

        if content_before_first {
            issues.push(TemplateIssue::Preamble);
        }
        for section in Section::ALL {
            if !seen.contains(&section) {
                issues.push(TemplateIssue::Missing(section));
            }
        }
        issues
    }

    /// Parse model output into the canonical layout. Repeated sections are
    /// merged, sections are reordered, text before the first heading joins the
    /// overview and absent sections stay empty. Output without any section
    /// heading is rejected.
    pub fn parse(markdown: &str) -> Result<Self, SummarizationError> {
        let mut bodies: [Vec<&str>; 4] = Default::default();
        let mut current = Section::Overview;
        let mut found_heading = false;

        for line in SectionLines::new(markdown) {
            match line {
                SectionLine::Heading(section) => {
                    found_heading = true;
                    current = section;
                    let body = &mut bodies[section.position()];
                    if body.iter().any(|l| !l.trim().is_empty()) {
                        body.push("");
                    }
                }
                SectionLine::Body(text) => bodies[current.position()].push(text),
            }
        }

        if !found_heading {
            return Err(SummarizationError::MalformedResponse {
                reason: "response contains none of the summary section headings".to_string(),
            });
        }

        let mut doc = SummaryDocument::default();
        for (slot, lines) in doc.bodies.iter_mut().zip(bodies) {
            *slot = lines.join("\n").trim().to_string();
        }
        Ok(doc)
    }

    /// Concatenate corresponding sections of each part, in part order.
    pub fn merge(parts: &[SummaryDocument]) -> SummaryDocument {
        let mut merged = SummaryDocument::default();
        for section in Section::ALL {
            let joined = parts
                .iter()
                .map(|part| part.section(section))
                .filter(|body| !body.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n");
            merged.bodies[section.position()] = joined;
        }
        merged
    }

    pub fn to_markdown(&self) -> String {
        Section::ALL
            .iter()
            .map(|section| {
                let body = self.section(*section);
                if body.is_empty() {
                    format!("## {}", section.title())
                } else {
                    format!("## {}\n\n{}", section.title(), body)
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

enum SectionLine<'a> {
    Heading(Section),
    Body(&'a str),
}

/// Lines of a summary, with section headings recognised outside code fences.
struct SectionLines<'a> {
    lines: std::str::Lines<'a>,
    in_fence: bool,
}

impl<'a> SectionLines<'a> {
    fn new(markdown: &'a str) -> Self {
        Self {
            lines: markdown.lines(),
            in_fence: false,
        }
    }
}

impl<'a> Iterator for SectionLines<'a> {
    type Item = SectionLine<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.next()?;
        if line.trim_start().starts_with("```") {
            self.in_fence = !self.in_fence;
            return Some(SectionLine::Body(line));
        }
        if !self.in_fence {
            if let Some(section) = Section::from_heading_line(line) {
                return Some(SectionLine::Heading(section));
            }
        }
        Some(SectionLine::Body(line))
    }
}
