//! Markdown summary to typed content blocks, and back.

pub mod convert;
pub mod inline;
pub mod render;

pub use convert::{
    ContentBlock, INDENT_WIDTH, ListKind, MAX_HEADING_LEVEL, MAX_LIST_DEPTH, convert_markdown,
};
pub use inline::{SpanStyle, TextSpan, parse_inline, plain_text};
pub use render::render_markdown;
