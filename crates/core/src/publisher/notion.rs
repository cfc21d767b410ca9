//! Notion REST backend: schema discovery, page creation and block encoding.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use super::{DatabaseSchema, DocumentStore, PageDraft, PageRef, PropertyDescriptor, PropertyKind, PropertyValue};
use crate::{
    config::NotionConfig,
    error::PublishError,
    markdown::{ContentBlock, TextSpan},
};

/// Longest `text.content` Notion accepts in one rich text object.
pub const MAX_RICH_TEXT_CHARS: usize = 2000;
/// Most children accepted by one create or append request.
pub const MAX_BLOCKS_PER_REQUEST: usize = 100;

pub struct NotionStore {
    client: Client,
    api_key: String,
    base_url: String,
    version: String,
}

impl NotionStore {
    pub fn new(config: &NotionConfig) -> Result<Self, PublishError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| PublishError::MissingApiKey {
                env_var: "NOTION_API_KEY".to_string(),
            })?;
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            version: config.version.clone(),
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Notion-Version", &self.version)
            .header("Content-Type", "application/json")
    }

    async fn append_children(&self, block_id: &str, children: &[Value]) -> Result<(), PublishError> {
        let response = self
            .authorized(
                self.client
                    .patch(format!("{}/blocks/{}/children", self.base_url, block_id)),
            )
            .json(&json!({ "children": children }))
            .send()
            .await?;
        read_json(response).await.map(|_| ())
    }
}

/// Body of a successful response, or [`PublishError::Rejected`] with Notion's message.
async fn read_json(response: Response) -> Result<Value, PublishError> {
    let status = response.status();
    let text = response.text().await?;
    let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

    if status.is_success() {
        Ok(body)
    } else {
        Err(PublishError::Rejected {
            status: status.as_u16(),
            message: body["message"].as_str().unwrap_or(text.as_str()).to_string(),
        })
    }
}

#[async_trait]
impl DocumentStore for NotionStore {
    async fn get_schema(&self, database_id: &str) -> Result<DatabaseSchema, PublishError> {
        let response = self
            .authorized(
                self.client
                    .get(format!("{}/databases/{}", self.base_url, database_id)),
            )
            .send()
            .await?;
        let body = read_json(response).await?;
        parse_schema(&body)
    }

    async fn create_page(&self, database_id: &str, draft: &PageDraft) -> Result<PageRef, PublishError> {
        let blocks = encode_blocks(&draft.blocks);
        let (first, rest) = blocks.split_at(blocks.len().min(MAX_BLOCKS_PER_REQUEST));

        let response = self
            .authorized(self.client.post(format!("{}/pages", self.base_url)))
            .json(&json!({
                "parent": { "database_id": database_id },
                "properties": encode_properties(&draft.properties),
                "children": first,
            }))
            .send()
            .await?;
        let body = read_json(response).await?;

        let page = PageRef {
            id: body["id"].as_str().unwrap_or_default().to_string(),
            url: body["url"].as_str().unwrap_or_default().to_string(),
        };
        if page.id.is_empty() {
            return Err(PublishError::RemoteUnavailable {
                reason: format!("page response has no id: {}", body),
            });
        }
        debug!(page_id = %page.id, blocks = first.len(), "created page");

        for batch in rest.chunks(MAX_BLOCKS_PER_REQUEST) {
            if let Err(err) = self.append_children(&page.id, batch).await {
                warn!(page_id = %page.id, error = %err, "appending blocks failed after page creation");
                return Err(PublishError::Incomplete {
                    page,
                    reason: err.to_string(),
                });
            }
            debug!(page_id = %page.id, blocks = batch.len(), "appended blocks");
        }

        Ok(page)
    }
}

/// Read `properties` of a database object into a schema.
pub fn parse_schema(database: &Value) -> Result<DatabaseSchema, PublishError> {
    let properties = database["properties"]
        .as_object()
        .ok_or_else(|| PublishError::SchemaIncompatible {
            reason: "database response has no properties".to_string(),
        })?;

    Ok(DatabaseSchema::new(
        properties
            .iter()
            .map(|(name, property)| {
                let kind = property["type"].as_str().unwrap_or_default();
                PropertyDescriptor::new(name.clone(), PropertyKind::from_type_name(kind))
            })
            .collect(),
    ))
}

pub fn encode_properties(properties: &[(String, PropertyValue)]) -> Value {
    let mut out = Map::new();
    for (name, value) in properties {
        let encoded = match value {
            PropertyValue::Title(text) => json!({ "title": plain_rich_text(text) }),
            PropertyValue::RichText(text) => json!({ "rich_text": plain_rich_text(text) }),
            PropertyValue::Url(url) => json!({ "url": url }),
            PropertyValue::Number(n) => json!({ "number": n }),
            PropertyValue::Date(date) => {
                json!({ "date": { "start": date.format("%Y-%m-%d").to_string() } })
            }
        };
        out.insert(name.clone(), encoded);
    }
    Value::Object(out)
}

fn plain_rich_text(text: &str) -> Vec<Value> {
    rich_text(&[TextSpan::plain(text)])
}

/// Rich text objects for `spans`, splitting long content into pieces Notion accepts.
pub fn rich_text(spans: &[TextSpan]) -> Vec<Value> {
    spans
        .iter()
        .filter(|span| !span.content.is_empty())
        .flat_map(|span| {
            split_chars(&span.content, MAX_RICH_TEXT_CHARS)
                .into_iter()
                .map(move |piece| {
                    json!({
                        "type": "text",
                        "text": { "content": piece },
                        "annotations": {
                            "bold": span.style.bold,
                            "italic": span.style.italic,
                            "code": span.style.code,
                        },
                    })
                })
        })
        .collect()
}

fn split_chars(text: &str, max_chars: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let cut = rest
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        pieces.push(&rest[..cut]);
        rest = &rest[cut..];
    }
    pieces
}

struct Node {
    block: Value,
    kind: &'static str,
    depth: usize,
    run: usize,
    children: Vec<Node>,
}

impl Node {
    fn into_value(self) -> Value {
        let mut block = self.block;
        if !self.children.is_empty() {
            let children: Vec<Value> = self.children.into_iter().map(Node::into_value).collect();
            block[self.kind]["children"] = Value::Array(children);
        }
        block
    }
}

/// Encode blocks as Notion block objects. Deeper list items become
/// `children` of the preceding shallower item of the same run.
pub fn encode_blocks(blocks: &[ContentBlock]) -> Vec<Value> {
    let mut out = Vec::new();
    let mut open: Vec<Node> = Vec::new();

    for block in blocks {
        let (kind, body) = encode_block(block);
        let block_json = json!({ "object": "block", "type": kind, kind: body });

        match (block.list_depth(), block.list_run()) {
            (Some(depth), Some(run)) => {
                if open.last().is_some_and(|top| top.run != run) {
                    close_all(&mut open, &mut out);
                }
                while open.last().is_some_and(|top| top.depth >= depth) {
                    close_top(&mut open, &mut out);
                }
                open.push(Node {
                    block: block_json,
                    kind,
                    depth,
                    run,
                    children: Vec::new(),
                });
            }
            _ => {
                close_all(&mut open, &mut out);
                out.push(block_json);
            }
        }
    }

    close_all(&mut open, &mut out);
    out
}

fn close_top(open: &mut Vec<Node>, out: &mut Vec<Value>) {
    if let Some(node) = open.pop() {
        match open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => out.push(node.into_value()),
        }
    }
}

fn close_all(open: &mut Vec<Node>, out: &mut Vec<Value>) {
    while !open.is_empty() {
        close_top(open, out);
    }
}

fn encode_block(block: &ContentBlock) -> (&'static str, Value) {
    match block {
        ContentBlock::Heading { level, spans } => {
            let kind = match level {
                1 => "heading_1",
                2 => "heading_2",
                _ => "heading_3",
            };
            (kind, json!({ "rich_text": rich_text(spans) }))
        }
        ContentBlock::Paragraph { spans } => ("paragraph", json!({ "rich_text": rich_text(spans) })),
        ContentBlock::BulletItem { spans, .. } => (
            "bulleted_list_item",
            json!({ "rich_text": rich_text(spans) }),
        ),
        ContentBlock::NumberedItem { spans, .. } => (
            "numbered_list_item",
            json!({ "rich_text": rich_text(spans) }),
        ),
        ContentBlock::Quote { spans } => ("quote", json!({ "rich_text": rich_text(spans) })),
        ContentBlock::CodeBlock { text, language } => (
            "code",
            json!({
                "rich_text": plain_rich_text(text),
                "language": code_language(language.as_deref()),
            }),
        ),
    }
}

/// Map a fence language tag onto Notion's code language names.
pub fn code_language(tag: Option<&str>) -> &'static str {
    let tag = tag.unwrap_or_default().trim().to_lowercase();
    match tag.as_str() {
        "bash" => "bash",
        "sh" | "shell" | "zsh" | "console" => "shell",
        "c" => "c",
        "cpp" | "c++" | "cc" | "hpp" => "c++",
        "cs" | "csharp" | "c#" => "c#",
        "css" => "css",
        "diff" | "patch" => "diff",
        "docker" | "dockerfile" => "docker",
        "go" | "golang" => "go",
        "graphql" | "gql" => "graphql",
        "haskell" | "hs" => "haskell",
        "html" => "html",
        "java" => "java",
        "js" | "javascript" | "jsx" | "node" => "javascript",
        "json" => "json",
        "kotlin" | "kt" => "kotlin",
        "lua" => "lua",
        "makefile" | "make" => "makefile",
        "markdown" | "md" => "markdown",
        "mermaid" => "mermaid",
        "php" => "php",
        "powershell" | "ps1" => "powershell",
        "python" | "py" | "python3" => "python",
        "r" => "r",
        "ruby" | "rb" => "ruby",
        "rust" | "rs" => "rust",
        "scala" => "scala",
        "sql" => "sql",
        "swift" => "swift",
        "ts" | "typescript" | "tsx" => "typescript",
        "xml" => "xml",
        "yaml" | "yml" => "yaml",
        _ => "plain text",
    }
}
