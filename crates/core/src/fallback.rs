//! Best-effort page titles when video metadata is missing.

use std::sync::LazyLock;

use regex::Regex;

use crate::summarizer::{Section, SummaryDocument};

const MAX_TITLE_WORDS: usize = 7;

const SMALL_WORDS: [&str; 17] = [
    "a", "an", "the", "and", "but", "or", "for", "nor", "on", "at", "to", "from", "by", "in",
    "of", "with", "as",
];

/// Phrasings models use when they name the video.
static TITLE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r#"(?i)summary of ["'](.+?)["']"#).unwrap(),
        Regex::new(r"(?i)^(.+?) video summary").unwrap(),
        Regex::new(r#"(?i)["'](.+?)["'] video"#).unwrap(),
        Regex::new(r#"(?i)overview of (?:the )?["'](.+?)["']"#).unwrap(),
        Regex::new(r#"(?i)from ["'](.+?)["']"#).unwrap(),
        Regex::new(r#"(?i)titled ["'](.+?)["']"#).unwrap(),
        Regex::new(r#"(?i)called ["'](.+?)["']"#).unwrap(),
    ]
});

static QUOTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"["“](.+?)["”]"#).unwrap());

static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]\s+").unwrap());

/// Lead-ins that make a first sentence read like prose rather than a title.
static LEAD_INS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    const VERBS: &str = "discusses|explores|presents|is about|covers|focuses on|examines|talks about|provides|offers";
    vec![
        Regex::new(&format!(r"(?i)^this video (?:{VERBS})\s*")).unwrap(),
        Regex::new(r"(?i)^in this video,?\s*").unwrap(),
        Regex::new(&format!(r"(?i)^the video (?:{VERBS})\s*")).unwrap(),
        Regex::new(&format!(r"(?i)^the speaker (?:{VERBS})\s*")).unwrap(),
    ]
});

/// Recover a title from the summary text, or `None` if nothing usable is found.
///
/// The overview is tried first: quoted-title phrasings, then a quoted phrase
/// in its first sentence, then the first sentence itself with lead-ins removed
/// and cut to seven words. Failing that, the phrasings are searched across the
/// whole summary, and last comes the first `##` heading that is not one of the
/// template sections.
pub fn title_from_summary(summary: &SummaryDocument) -> Option<String> {
    let overview = summary.section(Section::Overview).trim();
    if let Some(title) = title_from_overview(overview) {
        return Some(title);
    }

    let markdown = summary.to_markdown();
    match_title_pattern(&markdown).or_else(|| first_topic_heading(&markdown))
}

fn match_title_pattern(text: &str) -> Option<String> {
    TITLE_PATTERNS.iter().find_map(|pattern| {
        let found = pattern.captures(text)?.get(1)?;
        non_empty(capitalize_title(found.as_str().trim()))
    })
}

fn title_from_overview(overview: &str) -> Option<String> {
    if overview.is_empty() {
        return None;
    }
    if let Some(title) = match_title_pattern(overview) {
        return Some(title);
    }

    let first_line = overview.lines().find(|l| !l.trim().is_empty())?;
    let first_sentence = SENTENCE_END
        .find(first_line)
        .map(|m| &first_line[..m.start() + 1])
        .unwrap_or(first_line)
        .trim();

    if let Some(quoted) = QUOTED.captures(first_sentence).and_then(|c| c.get(1)) {
        return non_empty(capitalize_title(quoted.as_str().trim()));
    }

    let mut cleaned = first_sentence.to_string();
    for lead_in in LEAD_INS.iter() {
        cleaned = lead_in.replace(&cleaned, "").trim().to_string();
    }
    let cleaned = cleaned.trim_end_matches(['.', '!', '?']).trim();

    let words: Vec<&str> = cleaned.split_whitespace().collect();
    let title = if words.len() > MAX_TITLE_WORDS {
        format!("{}...", words[..MAX_TITLE_WORDS].join(" "))
    } else {
        words.join(" ")
    };
    non_empty(capitalize_title(&title))
}

/// First level-2 heading outside code fences that names no template section.
fn first_topic_heading(markdown: &str) -> Option<String> {
    let mut in_fence = false;
    for line in markdown.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence || Section::from_heading_line(trimmed).is_some() {
            continue;
        }
        if let Some(text) = trimmed.strip_prefix("## ") {
            if let Some(title) = non_empty(capitalize_title(text.trim())) {
                return Some(title);
            }
        }
    }
    None
}

fn non_empty(title: String) -> Option<String> {
    let stripped = title.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if stripped.is_empty() { None } else { Some(title) }
}

/// Title-case `title`: every word capitalized except small words that are
/// neither first nor last. A trailing ellipsis is preserved.
pub fn capitalize_title(title: &str) -> String {
    let words: Vec<&str> = title.split_whitespace().collect();
    let last = words.len().saturating_sub(1);

    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let lower = word.to_lowercase();
            if i != 0 && i != last && SMALL_WORDS.contains(&lower.as_str()) {
                lower
            } else {
                capitalize_word(word)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Upper-case the first letter, keeping the rest as written so acronyms survive.
fn capitalize_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Whether a title has no upper-case letters past its first character.
pub fn needs_capitalization(title: &str) -> bool {
    !title.chars().skip(1).any(char::is_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(overview: &str) -> SummaryDocument {
        SummaryDocument::from_sections([
            (Section::Overview, overview),
            (Section::KeyInsights, "- point"),
            (Section::DetailedInformation, ""),
            (Section::Summary, "done"),
        ])
    }

    #[test]
    fn test_capitalize_title() {
        assert_eq!(
            capitalize_title("the art of war in the modern age"),
            "The Art of War in the Modern Age"
        );
        assert_eq!(capitalize_title("what to look for"), "What to Look For");
        assert_eq!(capitalize_title("intro to LLMs..."), "Intro to LLMs...");
        assert_eq!(capitalize_title(""), "");
    }

    #[test]
    fn test_quoted_title_pattern() {
        let doc = summary("This is a summary of \"rust for beginners\" by a popular channel.");
        assert_eq!(title_from_summary(&doc).as_deref(), Some("Rust for Beginners"));

        let doc = summary("The talk, titled 'scaling postgres', covers sharding.");
        assert_eq!(title_from_summary(&doc).as_deref(), Some("Scaling Postgres"));
    }

    #[test]
    fn test_first_sentence_with_lead_in_removed() {
        let doc = summary(
            "This video discusses how modern compilers optimize tail calls across many languages. It also covers more.",
        );
        assert_eq!(
            title_from_summary(&doc).as_deref(),
            Some("How Modern Compilers Optimize Tail Calls Across...")
        );
    }

    #[test]
    fn test_short_first_sentence_is_kept_whole() {
        let doc = summary("In this video, building a shed. Then more.");
        assert_eq!(title_from_summary(&doc).as_deref(), Some("Building a Shed"));
    }

    #[test]
    fn test_empty_overview_has_no_title() {
        assert_eq!(title_from_summary(&summary("")), None);
        assert_eq!(title_from_summary(&summary("...")), None);
    }

    #[test]
    fn test_pattern_found_outside_overview() {
        let doc = SummaryDocument::from_sections([
            (Section::Overview, ""),
            (Section::KeyInsights, "- The talk titled \"zero copy parsing\" shows the tradeoffs."),
            (Section::DetailedInformation, ""),
            (Section::Summary, ""),
        ]);
        assert_eq!(title_from_summary(&doc).as_deref(), Some("Zero Copy Parsing"));
    }

    #[test]
    fn test_falls_back_to_topic_heading() {
        let doc = SummaryDocument::from_sections([
            (Section::Overview, "..."),
            (Section::KeyInsights, "- point"),
            (
                Section::DetailedInformation,
                "```\n## not this\n```\n\n## memory safety in practice\n\nBody.",
            ),
            (Section::Summary, "done"),
        ]);
        assert_eq!(
            title_from_summary(&doc).as_deref(),
            Some("Memory Safety in Practice")
        );
    }

    #[test]
    fn test_needs_capitalization() {
        assert!(needs_capitalization("my lowercase video"));
        assert!(needs_capitalization("My lowercase video"));
        assert!(!needs_capitalization("My Video"));
    }
}
