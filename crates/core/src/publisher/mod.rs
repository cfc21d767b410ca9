//! Schema-adaptive page creation in the target document store.

pub mod notion;
pub mod schema;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

pub use notion::NotionStore;
pub use schema::{
    DatabaseSchema, PageFields, PropertyDescriptor, PropertyKind, PropertyValue, SemanticField,
    map_properties,
};

use crate::{error::PublishError, markdown::ContentBlock};

/// Heading placed above the converted summary on every page.
pub const PAGE_HEADING: &str = "Video Summary";

/// Reference to a created page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    pub id: String,
    pub url: String,
}

/// A page ready to be written: mapped properties plus its body blocks.
#[derive(Debug, Clone)]
pub struct PageDraft {
    pub properties: Vec<(String, PropertyValue)>,
    pub blocks: Vec<ContentBlock>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_schema(&self, database_id: &str) -> Result<DatabaseSchema, PublishError>;

    /// Create exactly one page. Implementations that must split the body
    /// across several requests report a failure after creation as
    /// [`PublishError::Incomplete`].
    async fn create_page(&self, database_id: &str, draft: &PageDraft) -> Result<PageRef, PublishError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishResult {
    pub page: PageRef,
    pub title: String,
}

pub struct Publisher {
    store: Arc<dyn DocumentStore>,
    database_id: String,
}

impl Publisher {
    pub fn new(store: Arc<dyn DocumentStore>, database_id: impl Into<String>) -> Self {
        Self {
            store,
            database_id: database_id.into(),
        }
    }

    /// Discover the schema, map `fields` onto it and create the page.
    ///
    /// Schema problems surface before anything is written.
    pub async fn publish(
        &self,
        fields: &PageFields<'_>,
        blocks: Vec<ContentBlock>,
    ) -> Result<PublishResult, PublishError> {
        let schema = self.store.get_schema(&self.database_id).await?;
        debug!(properties = schema.properties.len(), "discovered database schema");

        let properties = map_properties(&schema, fields)?;

        let mut page_blocks = Vec::with_capacity(blocks.len() + 1);
        page_blocks.push(ContentBlock::heading(1, PAGE_HEADING));
        page_blocks.extend(blocks);

        let draft = PageDraft {
            properties,
            blocks: page_blocks,
        };
        let page = self.store.create_page(&self.database_id, &draft).await?;
        info!(page_id = %page.id, url = %page.url, "page created");

        Ok(PublishResult {
            page,
            title: fields.title.to_string(),
        })
    }
}

