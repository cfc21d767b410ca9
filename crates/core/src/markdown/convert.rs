//! Line-oriented Markdown to [`ContentBlock`] conversion.
//!
//! Each input line is classified once ([`Line`]) and fed through a small
//! state machine. Conversion never fails: any line the classifier does not
//! recognise becomes a paragraph carrying the line text.

use crate::markdown::inline::{TextSpan, parse_inline, plain_text};

/// Spaces per list nesting level. A tab counts as one level.
pub const INDENT_WIDTH: usize = 2;
/// Deepest list nesting kept; deeper items clamp to it.
pub const MAX_LIST_DEPTH: usize = 2;
pub const MAX_HEADING_LEVEL: u8 = 3;

/// Markdown allows six heading markers; anything longer is plain text.
const MAX_HEADING_MARKERS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    Heading {
        level: u8,
        spans: Vec<TextSpan>,
    },
    Paragraph {
        spans: Vec<TextSpan>,
    },
    /// `run` numbers consecutive list lines; a blank line starts a new run.
    BulletItem {
        spans: Vec<TextSpan>,
        depth: usize,
        run: usize,
    },
    NumberedItem {
        spans: Vec<TextSpan>,
        index: u32,
        depth: usize,
        run: usize,
    },
    Quote {
        spans: Vec<TextSpan>,
    },
    CodeBlock {
        text: String,
        language: Option<String>,
    },
}

impl ContentBlock {
    pub fn paragraph(text: &str) -> Self {
        ContentBlock::Paragraph {
            spans: vec![TextSpan::plain(text)],
        }
    }

    pub fn heading(level: u8, text: &str) -> Self {
        ContentBlock::Heading {
            level: level.clamp(1, MAX_HEADING_LEVEL),
            spans: vec![TextSpan::plain(text)],
        }
    }

    pub fn spans(&self) -> Option<&[TextSpan]> {
        match self {
            ContentBlock::Heading { spans, .. }
            | ContentBlock::Paragraph { spans }
            | ContentBlock::BulletItem { spans, .. }
            | ContentBlock::NumberedItem { spans, .. }
            | ContentBlock::Quote { spans } => Some(spans),
            ContentBlock::CodeBlock { .. } => None,
        }
    }

    pub fn plain_text(&self) -> String {
        match self {
            ContentBlock::CodeBlock { text, .. } => text.clone(),
            other => other.spans().map(plain_text).unwrap_or_default(),
        }
    }

    pub fn list_depth(&self) -> Option<usize> {
        match self {
            ContentBlock::BulletItem { depth, .. } | ContentBlock::NumberedItem { depth, .. } => {
                Some(*depth)
            }
            _ => None,
        }
    }

    pub fn list_run(&self) -> Option<usize> {
        match self {
            ContentBlock::BulletItem { run, .. } | ContentBlock::NumberedItem { run, .. } => {
                Some(*run)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bullet,
    Numbered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Default,
    InCodeBlock {
        language: Option<String>,
        lines: Vec<String>,
    },
    /// `kind` is the kind of the run's top-level items.
    InList { kind: ListKind, depth: usize },
}

#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Blank,
    Fence { language: Option<&'a str> },
    Heading { level: u8, text: &'a str },
    Bullet { depth: usize, text: &'a str },
    Numbered { depth: usize, number: u32, text: &'a str },
    Quote { text: &'a str },
    Text(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Line::Blank;
    }

    if let Some(rest) = trimmed.strip_prefix("```") {
        let language = rest.split_whitespace().next();
        return Line::Fence { language };
    }

    if let Some(heading) = classify_heading(trimmed) {
        return heading;
    }

    if let Some(rest) = trimmed.strip_prefix("> ") {
        let text = rest.trim();
        if !text.is_empty() {
            return Line::Quote { text };
        }
    }

    let (indent, body) = split_indent(line);
    let depth = (indent / INDENT_WIDTH).min(MAX_LIST_DEPTH);

    if let Some(rest) = body.strip_prefix("- ").or_else(|| body.strip_prefix("* ")) {
        let text = rest.trim();
        if !text.is_empty() {
            return Line::Bullet { depth, text };
        }
    }

    if let Some((number, text)) = split_numbered(body) {
        return Line::Numbered {
            depth,
            number,
            text,
        };
    }

    Line::Text(trimmed)
}

fn classify_heading(trimmed: &str) -> Option<Line<'_>> {
    let markers = trimmed.bytes().take_while(|b| *b == b'#').count();
    if markers == 0 || markers > MAX_HEADING_MARKERS {
        return None;
    }
    let rest = &trimmed[markers..];
    if !rest.starts_with([' ', '\t']) {
        return None;
    }
    let text = rest.trim();
    if text.is_empty() {
        return None;
    }
    let level = (markers as u8).min(MAX_HEADING_LEVEL);
    Some(Line::Heading { level, text })
}

/// Leading indentation width in spaces and the remainder of the line.
fn split_indent(line: &str) -> (usize, &str) {
    let mut width = 0;
    for (pos, ch) in line.char_indices() {
        match ch {
            ' ' => width += 1,
            '\t' => width += INDENT_WIDTH,
            _ => return (width, line[pos..].trim_end()),
        }
    }
    (width, "")
}

fn split_numbered(body: &str) -> Option<(u32, &str)> {
    let digits = body.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = body[digits..].strip_prefix(". ")?;
    let number = body[..digits].parse().ok()?;
    let text = rest.trim();
    if text.is_empty() {
        return None;
    }
    Some((number, text))
}

struct Converter {
    state: State,
    blocks: Vec<ContentBlock>,
    runs: usize,
    next_index: [Option<u32>; MAX_LIST_DEPTH + 1],
}

impl Converter {
    fn new() -> Self {
        Self {
            state: State::Default,
            blocks: Vec::new(),
            runs: 0,
            next_index: [None; MAX_LIST_DEPTH + 1],
        }
    }

    fn feed(&mut self, raw: &str) {
        if let State::InCodeBlock { lines, .. } = &mut self.state {
            if raw.trim_start().starts_with("```") {
                self.close_code_block();
            } else {
                lines.push(raw.to_string());
            }
            return;
        }

        match classify(raw) {
            Line::Blank => self.state = State::Default,
            Line::Fence { language } => {
                self.state = State::InCodeBlock {
                    language: language.map(str::to_string),
                    lines: Vec::new(),
                };
            }
            Line::Heading { level, text } => {
                self.state = State::Default;
                self.blocks.push(ContentBlock::Heading {
                    level,
                    spans: parse_inline(text),
                });
            }
            Line::Quote { text } => {
                self.state = State::Default;
                self.blocks.push(ContentBlock::Quote {
                    spans: parse_inline(text),
                });
            }
            Line::Bullet { depth, text } => {
                let run = self.enter_list(ListKind::Bullet, depth);
                self.next_index[depth..].fill(None);
                self.blocks.push(ContentBlock::BulletItem {
                    spans: parse_inline(text),
                    depth,
                    run,
                });
            }
            Line::Numbered {
                depth,
                number,
                text,
            } => {
                let run = self.enter_list(ListKind::Numbered, depth);
                let index = self.next_index[depth].unwrap_or(number);
                self.next_index[depth] = Some(index.saturating_add(1));
                self.next_index[depth + 1..].fill(None);
                self.blocks.push(ContentBlock::NumberedItem {
                    spans: parse_inline(text),
                    index,
                    depth,
                    run,
                });
            }
            Line::Text(text) => {
                self.state = State::Default;
                self.blocks.push(ContentBlock::Paragraph {
                    spans: parse_inline(text),
                });
            }
        }
    }

    /// Moves into `InList`, opening a new run unless the line continues the
    /// current one. Returns the run ordinal.
    fn enter_list(&mut self, kind: ListKind, depth: usize) -> usize {
        let continues = match self.state {
            State::InList { kind: root, .. } => depth > 0 || root == kind,
            _ => false,
        };

        if !continues {
            self.runs += 1;
            self.next_index = [None; MAX_LIST_DEPTH + 1];
        }

        let root = match self.state {
            State::InList { kind: root, .. } if continues && depth > 0 => root,
            _ => kind,
        };
        self.state = State::InList { kind: root, depth };
        self.runs - 1
    }

    fn close_code_block(&mut self) {
        let state = std::mem::replace(&mut self.state, State::Default);
        if let State::InCodeBlock { language, lines } = state {
            self.blocks.push(ContentBlock::CodeBlock {
                text: lines.join("\n"),
                language,
            });
        }
    }

    fn finish(mut self) -> Vec<ContentBlock> {
        if matches!(self.state, State::InCodeBlock { .. }) {
            self.close_code_block();
        }
        self.blocks
    }
}

/// Convert a Markdown document into an ordered sequence of content blocks.
pub fn convert_markdown(markdown: &str) -> Vec<ContentBlock> {
    let mut converter = Converter::new();
    for line in markdown.lines() {
        converter.feed(line);
    }
    converter.finish()
}
