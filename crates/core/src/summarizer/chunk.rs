//! Sentence-boundary transcript chunker.
//!
//! Text is split into paragraphs (`\n\n`), then sentences, and sentences are
//! packed greedily into chunks of at most `max_chars` characters. A sentence
//! is only ever cut when it alone exceeds the limit; then it is split at word
//! boundaries, and a single oversized word is split on char boundaries.

/// Split `text` into ordered chunks of at most `max_chars` characters.
///
/// Returns an empty vector for blank text. Sizes are counted in chars, not
/// bytes, so multibyte transcripts are bounded the same way.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut buf = String::new();
    let mut buf_chars = 0;

    for paragraph in text.split("\n\n") {
        let mut first_in_paragraph = true;
        for sentence in split_sentences(paragraph) {
            for piece in fit_sentence(sentence, max_chars) {
                let piece_chars = piece.chars().count();
                let sep = if buf.is_empty() {
                    ""
                } else if first_in_paragraph {
                    "\n\n"
                } else {
                    " "
                };

                if buf_chars + sep.len() + piece_chars > max_chars && !buf.is_empty() {
                    chunks.push(std::mem::take(&mut buf));
                    buf_chars = 0;
                    buf.push_str(piece);
                } else {
                    buf.push_str(sep);
                    buf.push_str(piece);
                    buf_chars += sep.len();
                }
                buf_chars += piece_chars;
                first_in_paragraph = false;
            }
        }
    }

    if !buf.is_empty() {
        chunks.push(buf);
    }
    chunks
}

/// Sentences end at `.`, `!` or `?` followed by whitespace or end of text.
fn split_sentences(paragraph: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = paragraph.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let at_boundary = match chars.peek() {
            Some((_, next)) => next.is_whitespace(),
            None => true,
        };
        if at_boundary {
            let end = i + c.len_utf8();
            push_trimmed(&mut sentences, &paragraph[start..end]);
            start = end;
        }
    }

    push_trimmed(&mut sentences, &paragraph[start..]);
    sentences
}

fn push_trimmed<'a>(out: &mut Vec<&'a str>, s: &'a str) {
    let s = s.trim();
    if !s.is_empty() {
        out.push(s);
    }
}

/// Return the sentence as-is when it fits, otherwise word-bounded pieces.
fn fit_sentence(sentence: &str, max_chars: usize) -> Vec<&str> {
    if sentence.chars().count() <= max_chars {
        return vec![sentence];
    }

    let mut pieces = Vec::new();
    let mut remaining = sentence;
    while !remaining.is_empty() {
        let limit = byte_offset_of_char(remaining, max_chars);
        if limit >= remaining.len() {
            pieces.push(remaining);
            break;
        }
        // Prefer the last space within the limit, else cut the word.
        let split_at = match remaining[..limit].rfind(' ') {
            Some(pos) if pos > 0 => pos,
            _ => limit,
        };
        pieces.push(remaining[..split_at].trim_end());
        remaining = remaining[split_at..].trim_start();
    }
    pieces
}

fn byte_offset_of_char(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}
