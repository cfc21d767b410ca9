//! Inline span parsing shared by every text-bearing block.
//!
//! Parsing runs in two passes over the line: the first pass collects
//! non-overlapping delimiter pairs scanning left to right (a `**` opener is
//! tried as bold before falling back to a single `*`), the second pass slices
//! the line into styled and literal spans. Delimiters without a partner stay
//! in the output as literal characters.

use std::ops::Range;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SpanStyle {
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
}

impl SpanStyle {
    pub const PLAIN: SpanStyle = SpanStyle {
        bold: false,
        italic: false,
        code: false,
    };
    pub const BOLD: SpanStyle = SpanStyle {
        bold: true,
        italic: false,
        code: false,
    };
    pub const ITALIC: SpanStyle = SpanStyle {
        bold: false,
        italic: true,
        code: false,
    };
    pub const CODE: SpanStyle = SpanStyle {
        bold: false,
        italic: false,
        code: true,
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    pub content: String,
    pub style: SpanStyle,
}

impl TextSpan {
    pub fn plain(content: impl Into<String>) -> Self {
        Self::styled(content, SpanStyle::PLAIN)
    }

    pub fn styled(content: impl Into<String>, style: SpanStyle) -> Self {
        Self {
            content: content.into(),
            style,
        }
    }
}

/// Concatenated content of the spans with all styling dropped.
pub fn plain_text(spans: &[TextSpan]) -> String {
    spans.iter().map(|span| span.content.as_str()).collect()
}

struct Delimited {
    outer: Range<usize>,
    inner: Range<usize>,
    style: SpanStyle,
}

pub fn parse_inline(text: &str) -> Vec<TextSpan> {
    let pairs = find_delimited(text);
    build_spans(text, &pairs)
}

fn find_delimited(text: &str) -> Vec<Delimited> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let candidate = match bytes[i] {
            b'`' => match_code(text, i),
            b'*' if bytes.get(i + 1) == Some(&b'*') => match_bold(text, i),
            b'*' | b'_' => match_single(text, i),
            _ => None,
        };

        match candidate {
            Some(pair) => {
                i = pair.outer.end;
                found.push(pair);
            }
            None => i += 1,
        }
    }

    found
}

fn match_code(text: &str, start: usize) -> Option<Delimited> {
    let close = start + 1 + text[start + 1..].find('`')?;
    if close == start + 1 {
        return None;
    }
    Some(Delimited {
        outer: start..close + 1,
        inner: start + 1..close,
        style: SpanStyle::CODE,
    })
}

fn match_bold(text: &str, start: usize) -> Option<Delimited> {
    let open_end = start + 2;
    let close = open_end + text[open_end..].find("**")?;
    let inner = &text[open_end..close];
    if inner.trim().is_empty() || inner.starts_with(char::is_whitespace) {
        return None;
    }
    Some(Delimited {
        outer: start..close + 2,
        inner: open_end..close,
        style: SpanStyle::BOLD,
    })
}

/// `*italic*` or `_italic_`. Doubled delimiters never open or close, and
/// underscores inside words (`snake_case`) are literal.
fn match_single(text: &str, start: usize) -> Option<Delimited> {
    let bytes = text.as_bytes();
    let delim = bytes[start];

    let before = start.checked_sub(1).map(|p| bytes[p]);
    let after = *bytes.get(start + 1)?;
    if after == delim || after.is_ascii_whitespace() || before == Some(delim) {
        return None;
    }
    if delim == b'_' && before.is_some_and(|b| b.is_ascii_alphanumeric()) {
        return None;
    }

    let mut k = start + 1;
    while k < bytes.len() {
        if bytes[k] != delim {
            k += 1;
            continue;
        }
        if bytes.get(k + 1) == Some(&delim) {
            k += 2;
            continue;
        }
        let prev = bytes[k - 1];
        let next = bytes.get(k + 1).copied();
        let closes = !prev.is_ascii_whitespace()
            && !(delim == b'_' && next.is_some_and(|b| b.is_ascii_alphanumeric()));
        if closes {
            return Some(Delimited {
                outer: start..k + 1,
                inner: start + 1..k,
                style: SpanStyle::ITALIC,
            });
        }
        k += 1;
    }

    None
}

fn build_spans(text: &str, pairs: &[Delimited]) -> Vec<TextSpan> {
    let mut spans = Vec::with_capacity(pairs.len() * 2 + 1);
    let mut last = 0;

    for pair in pairs {
        if pair.outer.start > last {
            spans.push(TextSpan::plain(&text[last..pair.outer.start]));
        }
        spans.push(TextSpan::styled(&text[pair.inner.clone()], pair.style));
        last = pair.outer.end;
    }

    if last < text.len() {
        spans.push(TextSpan::plain(&text[last..]));
    }

    spans
}
