use crate::markdown::{
    convert::{ContentBlock, INDENT_WIDTH},
    inline::TextSpan,
};

/// Render blocks back to Markdown that converts to the same block sequence.
pub fn render_markdown(blocks: &[ContentBlock]) -> String {
    let mut out = String::new();
    let mut previous_run: Option<usize> = None;

    for (i, block) in blocks.iter().enumerate() {
        let run = block.list_run();
        if i > 0 {
            // Adjacent list items from different runs need a blank line between them.
            if previous_run.is_some() && run.is_some() && previous_run != run {
                out.push('\n');
            }
            out.push('\n');
        }
        render_block(block, &mut out);
        previous_run = run;
    }

    out
}

fn render_block(block: &ContentBlock, out: &mut String) {
    match block {
        ContentBlock::Heading { level, spans } => {
            out.push_str(&"#".repeat(*level as usize));
            out.push(' ');
            render_spans(spans, out);
        }
        ContentBlock::Paragraph { spans } => render_spans(spans, out),
        ContentBlock::BulletItem { spans, depth, .. } => {
            out.push_str(&" ".repeat(depth * INDENT_WIDTH));
            out.push_str("- ");
            render_spans(spans, out);
        }
        ContentBlock::NumberedItem {
            spans,
            index,
            depth,
            ..
        } => {
            out.push_str(&" ".repeat(depth * INDENT_WIDTH));
            out.push_str(&format!("{}. ", index));
            render_spans(spans, out);
        }
        ContentBlock::Quote { spans } => {
            out.push_str("> ");
            render_spans(spans, out);
        }
        ContentBlock::CodeBlock { text, language } => {
            out.push_str("```");
            if let Some(language) = language {
                out.push_str(language);
            }
            out.push('\n');
            if !text.is_empty() {
                out.push_str(text);
                out.push('\n');
            }
            out.push_str("```");
        }
    }
}

fn render_spans(spans: &[TextSpan], out: &mut String) {
    for span in spans {
        let style = span.style;
        let delim = if style.code {
            "`"
        } else if style.bold {
            "**"
        } else if style.italic {
            // Content with a star only parsed as italic between underscores.
            if span.content.contains('*') { "_" } else { "*" }
        } else {
            ""
        };
        out.push_str(delim);
        out.push_str(&span.content);
        out.push_str(delim);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::convert::convert_markdown;

    #[test]
    fn test_round_trip_preserves_structure() {
        let source = "# Title\n\
                      Intro with **bold**, _italic_ and `code`.\n\
                      - first\n\
                      \x20\x20- nested\n\
                      - second\n\
                      \n\
                      - other run\n\
                      3. three\n\
                      7. four\n\
                      > quoted *words*\n\
                      ```rust\n\
                      fn main() {}\n\
                      \n\
                      ```\n\
                      #### deep";
        let blocks = convert_markdown(source);
        let rendered = render_markdown(&blocks);
        assert_eq!(convert_markdown(&rendered), blocks, "rendered:\n{rendered}");
    }

    #[test]
    fn test_round_trip_keeps_italic_with_inner_delimiters() {
        for source in ["see _a*b_ here", "_a*b_c_ end", "*a_*b*", "**bold** then _x * y_"] {
            let blocks = convert_markdown(source);
            let rendered = render_markdown(&blocks);
            assert_eq!(convert_markdown(&rendered), blocks, "source: {source}\nrendered: {rendered}");
        }
        let blocks = convert_markdown("see _a*b_ here");
        assert_eq!(render_markdown(&blocks), "see _a*b_ here");
    }

    #[test]
    fn test_runs_are_separated_by_blank_line() {
        let blocks = convert_markdown("- a\n- b\n\n- c");
        assert_eq!(render_markdown(&blocks), "- a\n- b\n\n- c");
    }

    #[test]
    fn test_numbered_items_render_normalized_indices() {
        let blocks = convert_markdown("1. a\n1. b\n1. c");
        assert_eq!(render_markdown(&blocks), "1. a\n2. b\n3. c");
    }

    #[test]
    fn test_empty_code_block() {
        let blocks = convert_markdown("```\n```");
        assert_eq!(render_markdown(&blocks), "```\n```");
        assert_eq!(convert_markdown(&render_markdown(&blocks)), blocks);
    }
}
